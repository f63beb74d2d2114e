//! HTTP client for the street-level image service

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use image::RgbImage;
use reqwest::Client;
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::GeoImageSearch;
use crate::config::ImageryConfig;
use crate::errors::{AppError, AppResult};
use crate::models::{BoundingBox, GeoPoint, GeoSearchCandidate, Trajectory};
use crate::services::compute_bounds;
use crate::utils::geo::meters_to_degrees;

const SERVICE_NAME: &str = "imagery";
const IMAGE_FIELDS: &str = "id,geometry,compass_angle,captured_at,thumb_1024_url,thumb_original_url";

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    #[serde(default)]
    data: Vec<RawImage>,
}

#[derive(Debug, Deserialize)]
struct RawGeometry {
    /// GeoJSON order: `[lon, lat]`
    coordinates: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct RawImage {
    id: String,
    geometry: RawGeometry,
    #[serde(default)]
    compass_angle: Option<f64>,
    #[serde(default)]
    captured_at: Option<serde_json::Value>,
    #[serde(default)]
    thumb_1024_url: Option<String>,
    #[serde(default)]
    thumb_original_url: Option<String>,
}

impl RawImage {
    fn into_candidate(self) -> Option<GeoSearchCandidate> {
        let (lon, lat) = match self.geometry.coordinates.as_slice() {
            [lon, lat, ..] => (*lon, *lat),
            _ => {
                warn!("Image {} has no usable coordinates, skipping", self.id);
                return None;
            }
        };
        let location = GeoPoint::new(lat, lon);
        if !location.is_valid() {
            warn!("Image {} has out-of-range coordinates ({}, {}), skipping", self.id, lat, lon);
            return None;
        }

        let mut candidate = GeoSearchCandidate::new(self.id, location);
        candidate.captured_at = self.captured_at.as_ref().and_then(parse_captured_at);
        candidate.compass_angle = self.compass_angle.unwrap_or(0.0);
        candidate.thumb_1024_url = self.thumb_1024_url.filter(|u| !u.is_empty());
        candidate.thumb_original_url = self.thumb_original_url.filter(|u| !u.is_empty());
        Some(candidate)
    }
}

/// Capture time as epoch milliseconds or an RFC 3339 string
fn parse_captured_at(value: &serde_json::Value) -> Option<DateTime<Utc>> {
    match value {
        serde_json::Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        serde_json::Value::String(s) => s
            .parse::<i64>()
            .ok()
            .and_then(DateTime::from_timestamp_millis)
            .or_else(|| {
                DateTime::parse_from_rfc3339(s)
                    .ok()
                    .map(|dt| dt.with_timezone(&Utc))
            }),
        _ => None,
    }
}

/// Image service client querying by bounding box
pub struct GeoImageClient {
    client: Client,
    config: ImageryConfig,
}

impl GeoImageClient {
    pub fn new(config: ImageryConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to create imagery HTTP client: {e}")))?;

        if config.access_token.is_empty() {
            warn!("No imagery access token configured; image searches will likely be rejected");
        }

        Ok(Self { client, config })
    }

    fn images_url(&self) -> String {
        format!("{}/images", self.config.base_url.trim_end_matches('/'))
    }

    /// Run a box query bounded by the configured timeout, then attach
    /// thumbnails. A failed query collapses to an empty result; a failed
    /// thumbnail only leaves that candidate's `image` empty.
    async fn search_bbox(&self, bbox: BoundingBox, limit: usize) -> Vec<GeoSearchCandidate> {
        let timeout = self.config.request_timeout;
        let candidates = match tokio::time::timeout(timeout, self.query_bbox(&bbox, limit)).await {
            Ok(Ok(candidates)) => candidates,
            Ok(Err(e)) => {
                error!("Image search failed for bbox {}: {}", bbox.to_query_value(), e);
                return Vec::new();
            }
            Err(_) => {
                error!(
                    "Image search for bbox {} timed out after {}",
                    bbox.to_query_value(),
                    humantime::format_duration(timeout)
                );
                return Vec::new();
            }
        };

        if self.config.download_images {
            self.attach_images(candidates).await
        } else {
            candidates
        }
    }

    async fn query_bbox(
        &self,
        bbox: &BoundingBox,
        limit: usize,
    ) -> AppResult<Vec<GeoSearchCandidate>> {
        let bbox_value = bbox.to_query_value();
        let limit_value = limit.to_string();
        debug!("Issuing image search request: bbox={} limit={}", bbox_value, limit);

        let response = self
            .client
            .get(self.images_url())
            .query(&[
                ("fields", IMAGE_FIELDS),
                ("bbox", bbox_value.as_str()),
                ("limit", limit_value.as_str()),
                ("access_token", self.config.access_token.as_str()),
            ])
            .header(AUTHORIZATION, format!("OAuth {}", self.config.access_token))
            .send()
            .await
            .map_err(|e| AppError::external_service(SERVICE_NAME, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::external_service(
                SERVICE_NAME,
                format!(
                    "HTTP error: {} {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("Unknown")
                ),
            ));
        }

        let body: ImagesResponse = response.json().await.map_err(|e| {
            AppError::external_service(SERVICE_NAME, format!("Malformed response body: {e}"))
        })?;
        info!("Image service returned {} candidate images", body.data.len());

        Ok(body
            .data
            .into_iter()
            .filter_map(RawImage::into_candidate)
            .collect())
    }

    /// Download and decode thumbnails with bounded concurrency, keeping the
    /// candidate order. Each download is bounded by `request_timeout` on its
    /// own; failed or slow downloads leave `image` empty.
    async fn attach_images(&self, candidates: Vec<GeoSearchCandidate>) -> Vec<GeoSearchCandidate> {
        let concurrency = self.config.download_concurrency.max(1);
        let timeout = self.config.request_timeout;
        stream::iter(candidates)
            .map(|mut candidate| async move {
                if let Some(url) = candidate.thumb_1024_url.clone() {
                    match tokio::time::timeout(timeout, self.fetch_thumbnail(&url)).await {
                        Ok(Ok(image)) => candidate.image = Some(Arc::new(image)),
                        Ok(Err(e)) => {
                            warn!("Failed to load thumbnail for image {}: {}", candidate.id, e)
                        }
                        Err(_) => warn!(
                            "Thumbnail for image {} timed out after {}",
                            candidate.id,
                            humantime::format_duration(timeout)
                        ),
                    }
                }
                candidate
            })
            .buffered(concurrency)
            .collect::<Vec<_>>()
            .await
    }

    async fn fetch_thumbnail(&self, url: &str) -> AppResult<RgbImage> {
        let bytes: Bytes = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        let image = tokio::task::spawn_blocking(move || {
            image::load_from_memory(&bytes).map(|decoded| decoded.to_rgb8())
        })
        .await
        .map_err(|e| AppError::internal(format!("Thumbnail decode task failed: {e}")))??;

        Ok(image)
    }
}

#[async_trait]
impl GeoImageSearch for GeoImageClient {
    async fn search_near(
        &self,
        point: GeoPoint,
        radius_m: f64,
        limit: usize,
    ) -> Vec<GeoSearchCandidate> {
        let bbox = BoundingBox::around(point, meters_to_degrees(radius_m));
        info!(
            "Searching images near location: lat={:.6} lon={:.6} radius={}m limit={}",
            point.lat, point.lon, radius_m, limit
        );
        self.search_bbox(bbox, limit).await
    }

    async fn search_along(
        &self,
        trajectory: &Trajectory,
        radius_m: f64,
    ) -> Vec<GeoSearchCandidate> {
        let bounds = match compute_bounds(trajectory) {
            Ok(bounds) => bounds,
            Err(e) => {
                warn!("Cannot search along trajectory: {}", e);
                return Vec::new();
            }
        };

        let bbox = bounds.expand(meters_to_degrees(radius_m));
        info!(
            "Searching images along trajectory: points={} bbox={}",
            trajectory.len(),
            bbox.to_query_value()
        );
        let images = self.search_bbox(bbox, self.config.max_results).await;
        info!("Found {} images inside trajectory bounding box", images.len());
        images
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_raw_image_maps_geojson_order() {
        let raw: RawImage = serde_json::from_value(json!({
            "id": "123",
            "geometry": {"type": "Point", "coordinates": [11.97, 57.70]},
            "compass_angle": 181.5,
            "captured_at": 1_600_000_000_000_i64,
            "thumb_1024_url": "https://example.test/t.jpg"
        }))
        .unwrap();

        let candidate = raw.into_candidate().unwrap();
        assert_eq!(candidate.location, GeoPoint::new(57.70, 11.97));
        assert_eq!(candidate.compass_angle, 181.5);
        assert_eq!(
            candidate.captured_at,
            DateTime::from_timestamp_millis(1_600_000_000_000)
        );
        assert_eq!(candidate.thumb_original_url, None);
        assert!(!candidate.has_image());
    }

    #[test]
    fn test_raw_image_without_coordinates_is_dropped() {
        let raw: RawImage = serde_json::from_value(json!({
            "id": "x",
            "geometry": {"coordinates": [11.97]}
        }))
        .unwrap();
        assert!(raw.into_candidate().is_none());
    }

    #[test]
    fn test_captured_at_formats() {
        let expected = DateTime::from_timestamp_millis(1_600_000_000_000);
        assert_eq!(parse_captured_at(&json!("1600000000000")), expected);
        assert_eq!(parse_captured_at(&json!("2020-09-13T12:26:40Z")), expected);
        assert_eq!(parse_captured_at(&json!(null)), None);
        assert_eq!(parse_captured_at(&json!("yesterday")), None);
    }

    #[test]
    fn test_images_url_trims_trailing_slash() {
        let client = GeoImageClient::new(ImageryConfig {
            base_url: "https://graph.example.test/".to_string(),
            ..ImageryConfig::default()
        })
        .unwrap();
        assert_eq!(client.images_url(), "https://graph.example.test/images");
    }
}
