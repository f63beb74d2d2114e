//! Domain types shared across the dataset, cache, imagery and web layers

pub mod candidate;
pub mod geo;
pub mod listing;
pub mod log;

pub use candidate::{CandidateMetadata, GeoSearchCandidate};
pub use geo::{BoundingBox, GeoPoint, Trajectory};
pub use listing::{LogDetail, LogListing, LogSummary};
pub use log::{
    AnnotationCategory, AnnotationSet, AnnotationStatus, LogId, Pose, PositionRecords,
    PreviewImage,
};
