//! Street-level image candidates returned by the external image service

use chrono::{DateTime, Utc};
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::geo::GeoPoint;

/// One geolocated image record.
///
/// Immutable once fetched; `distance_m` is only filled in on the copy
/// returned by a nearest-match query.
#[derive(Debug, Clone)]
pub struct GeoSearchCandidate {
    pub id: String,
    pub location: GeoPoint,
    pub captured_at: Option<DateTime<Utc>>,
    pub compass_angle: f64,
    pub thumb_1024_url: Option<String>,
    pub thumb_original_url: Option<String>,
    pub image: Option<Arc<RgbImage>>,
    pub distance_m: Option<f64>,
}

impl GeoSearchCandidate {
    pub fn new<S: Into<String>>(id: S, location: GeoPoint) -> Self {
        Self {
            id: id.into(),
            location,
            captured_at: None,
            compass_angle: 0.0,
            thumb_1024_url: None,
            thumb_original_url: None,
            image: None,
            distance_m: None,
        }
    }

    pub fn with_distance(mut self, distance_m: f64) -> Self {
        self.distance_m = Some(distance_m);
        self
    }

    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }
}

/// Serializable view of a candidate; pixel data is reduced to its dimensions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateMetadata {
    pub id: String,
    pub lat: f64,
    pub lon: f64,
    pub captured_at: Option<DateTime<Utc>>,
    pub compass_angle: f64,
    pub thumb_1024_url: Option<String>,
    pub thumb_original_url: Option<String>,
    pub has_image: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_m: Option<f64>,
}

impl From<&GeoSearchCandidate> for CandidateMetadata {
    fn from(candidate: &GeoSearchCandidate) -> Self {
        Self {
            id: candidate.id.clone(),
            lat: candidate.location.lat,
            lon: candidate.location.lon,
            captured_at: candidate.captured_at,
            compass_angle: candidate.compass_angle,
            thumb_1024_url: candidate.thumb_1024_url.clone(),
            thumb_original_url: candidate.thumb_original_url.clone(),
            has_image: candidate.has_image(),
            width: candidate.image.as_ref().map(|img| img.width()),
            height: candidate.image.as_ref().map(|img| img.height()),
            distance_m: candidate.distance_m,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_reports_image_dimensions() {
        let mut candidate = GeoSearchCandidate::new("abc", GeoPoint::new(57.7, 11.9));
        candidate.image = Some(Arc::new(RgbImage::new(4, 3)));

        let metadata = CandidateMetadata::from(&candidate.with_distance(12.5));
        assert!(metadata.has_image);
        assert_eq!(metadata.width, Some(4));
        assert_eq!(metadata.height, Some(3));
        assert_eq!(metadata.distance_m, Some(12.5));
    }

    #[test]
    fn test_metadata_without_image_omits_dimensions() {
        let candidate = GeoSearchCandidate::new("abc", GeoPoint::new(57.7, 11.9));
        let json = serde_json::to_value(CandidateMetadata::from(&candidate)).unwrap();
        assert_eq!(json["has_image"], false);
        assert!(json.get("width").is_none());
        assert!(json.get("distance_m").is_none());
    }
}
