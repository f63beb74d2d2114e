//! Access to the on-disk driving log dataset
//!
//! The dataset is an immutable, read-only collaborator. Implementations do
//! plain (blocking) reads with no caching of their own; memoization lives in
//! [`crate::services`].

pub mod filesystem;

pub use filesystem::FsDataset;

use crate::errors::LoadResult;
use crate::models::{AnnotationCategory, AnnotationSet, LogId, PositionRecords};

/// Raw record access for driving logs
pub trait DatasetSource: Send + Sync + 'static {
    /// All log ids present in the dataset, sorted. A missing dataset root
    /// yields an empty list.
    fn list_log_ids(&self) -> Vec<LogId>;

    /// Per-frame positional records of a log
    fn read_positions(&self, log_id: &LogId) -> LoadResult<PositionRecords>;

    /// Encoded bytes of the log's representative camera frame, if it has one
    fn read_representative_image(&self, log_id: &LogId) -> LoadResult<Option<Vec<u8>>>;

    /// Annotations of one category. Never fails: read problems are reported
    /// through the returned set's status.
    fn read_annotations(&self, log_id: &LogId, category: AnnotationCategory) -> AnnotationSet;
}
