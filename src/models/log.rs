//! Driving log identifiers and the raw records read from the dataset

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::geo::GeoPoint;

/// Opaque identifier of a recorded session, e.g. `"007674"`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogId(String);

impl LogId {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LogId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for LogId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for LogId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Homogeneous 4x4 pose transform, row-major. The translation sits in the
/// last column: `pose[0][3]` is east (m), `pose[1][3]` is north (m).
pub type Pose = [[f64; 4]; 4];

/// Positional data of one log, resolved once when the records are read
#[derive(Debug, Clone, PartialEq)]
pub enum PositionRecords {
    /// Explicit latitude/longitude per frame
    DirectFix(Vec<GeoPoint>),
    /// One origin coordinate plus per-frame offsets relative to it
    RelativePose { origin: GeoPoint, poses: Vec<Pose> },
}

impl PositionRecords {
    pub fn len(&self) -> usize {
        match self {
            Self::DirectFix(fixes) => fixes.len(),
            Self::RelativePose { poses, .. } => poses.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::DirectFix(_) => "direct_fix",
            Self::RelativePose { .. } => "relative_pose",
        }
    }
}

/// Annotation projects shipped with each log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationCategory {
    ObjectDetection,
    TrafficSigns,
    LaneMarkings,
}

impl AnnotationCategory {
    pub const ALL: [AnnotationCategory; 3] = [
        AnnotationCategory::ObjectDetection,
        AnnotationCategory::TrafficSigns,
        AnnotationCategory::LaneMarkings,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ObjectDetection => "object_detection",
            Self::TrafficSigns => "traffic_signs",
            Self::LaneMarkings => "lane_markings",
        }
    }
}

impl fmt::Display for AnnotationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnnotationCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| format!("Unknown annotation category: {s}"))
    }
}

/// Whether an annotation list is trustworthy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AnnotationStatus {
    /// Loaded in full
    Complete,
    /// The log carries no annotations of this category
    Missing,
    /// Annotations exist but could not be read; `items` is empty
    Failed { reason: String },
}

/// Annotations of one category for one log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationSet {
    pub category: AnnotationCategory,
    pub status: AnnotationStatus,
    pub items: Vec<serde_json::Value>,
}

impl AnnotationSet {
    pub fn complete(category: AnnotationCategory, items: Vec<serde_json::Value>) -> Self {
        Self {
            category,
            status: AnnotationStatus::Complete,
            items,
        }
    }

    pub fn missing(category: AnnotationCategory) -> Self {
        Self {
            category,
            status: AnnotationStatus::Missing,
            items: Vec::new(),
        }
    }

    pub fn failed<S: Into<String>>(category: AnnotationCategory, reason: S) -> Self {
        Self {
            category,
            status: AnnotationStatus::Failed {
                reason: reason.into(),
            },
            items: Vec::new(),
        }
    }

    /// True when the empty list means "failed to load", not "none present"
    pub fn is_partial(&self) -> bool {
        matches!(self.status, AnnotationStatus::Failed { .. })
    }
}

/// JPEG-encoded representative frame of a log
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub mime_type: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_round_trip_through_str() {
        for category in AnnotationCategory::ALL {
            assert_eq!(category.as_str().parse::<AnnotationCategory>(), Ok(category));
        }
        assert!("weather".parse::<AnnotationCategory>().is_err());
    }

    #[test]
    fn test_partial_flag() {
        let failed = AnnotationSet::failed(AnnotationCategory::TrafficSigns, "bad json");
        assert!(failed.is_partial());
        assert!(failed.items.is_empty());

        let missing = AnnotationSet::missing(AnnotationCategory::TrafficSigns);
        assert!(!missing.is_partial());
    }

    #[test]
    fn test_position_records_len() {
        let records = PositionRecords::RelativePose {
            origin: GeoPoint::new(0.0, 0.0),
            poses: vec![[[0.0; 4]; 4]; 3],
        };
        assert_eq!(records.len(), 3);
        assert_eq!(records.kind(), "relative_pose");
        assert!(PositionRecords::DirectFix(Vec::new()).is_empty());
    }
}
