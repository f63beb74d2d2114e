//! Filesystem-backed dataset
//!
//! Layout under the dataset root:
//!
//! ```text
//! <root>/<frames_dir>/<log_id>/
//!     oxts.json                      positions (fixes or origin + poses)
//!     camera_front_blur/*.jpg        representative frame (or *.jpg in the log dir)
//!     annotations/<category>.json    JSON array per annotation project
//! ```

use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};

use super::DatasetSource;
use crate::errors::{LoadError, LoadResult};
use crate::models::{AnnotationCategory, AnnotationSet, GeoPoint, LogId, Pose, PositionRecords};

const POSITIONS_FILE: &str = "oxts.json";
const CAMERA_DIR: &str = "camera_front_blur";
const ANNOTATIONS_DIR: &str = "annotations";
const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// On-disk shape of `oxts.json`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PositionsFile {
    Fixes { fixes: Vec<GeoPoint> },
    Poses { origin: GeoPoint, poses: Vec<Pose> },
}

#[derive(Debug, Clone)]
pub struct FsDataset {
    logs_dir: PathBuf,
}

impl FsDataset {
    pub fn new<P: AsRef<Path>>(root: P, frames_dir: &str) -> Self {
        Self {
            logs_dir: root.as_ref().join(frames_dir),
        }
    }

    pub fn logs_dir(&self) -> &Path {
        &self.logs_dir
    }

    /// Directory of a log, or `NotFound` if the id does not name one.
    /// Ids containing path separators are never valid.
    fn log_dir(&self, log_id: &LogId) -> LoadResult<PathBuf> {
        let id = log_id.as_str();
        if id.is_empty() || id.contains(['/', '\\']) || id == "." || id == ".." {
            return Err(LoadError::not_found(id));
        }

        let dir = self.logs_dir.join(id);
        if dir.is_dir() {
            Ok(dir)
        } else {
            Err(LoadError::not_found(id))
        }
    }

    fn first_image_in(dir: &Path) -> Option<PathBuf> {
        let entries = fs::read_dir(dir).ok()?;
        let mut images: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && Self::is_image_file(path))
            .collect();
        images.sort();
        images.into_iter().next()
    }

    fn is_image_file(path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
            .unwrap_or(false)
    }

    fn parse_positions(log_id: &LogId, contents: &str) -> LoadResult<PositionRecords> {
        let parsed: PositionsFile = serde_json::from_str(contents)
            .map_err(|e| LoadError::corrupt(log_id.as_str(), format!("invalid {POSITIONS_FILE}: {e}")))?;

        let records = match parsed {
            PositionsFile::Fixes { fixes } => {
                if let Some(bad) = fixes.iter().find(|p| !p.is_valid()) {
                    return Err(LoadError::corrupt(
                        log_id.as_str(),
                        format!("fix out of range: ({}, {})", bad.lat, bad.lon),
                    ));
                }
                PositionRecords::DirectFix(fixes)
            }
            PositionsFile::Poses { origin, poses } => {
                if !origin.is_valid() {
                    return Err(LoadError::corrupt(
                        log_id.as_str(),
                        format!("origin out of range: ({}, {})", origin.lat, origin.lon),
                    ));
                }
                PositionRecords::RelativePose { origin, poses }
            }
        };

        Ok(records)
    }
}

impl DatasetSource for FsDataset {
    fn list_log_ids(&self) -> Vec<LogId> {
        let entries = match fs::read_dir(&self.logs_dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(
                    "Dataset directory {} is not readable: {}",
                    self.logs_dir.display(),
                    e
                );
                return Vec::new();
            }
        };

        let mut ids: Vec<LogId> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_dir())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .map(LogId::from)
            .collect();
        ids.sort();

        debug!("Found {} log directories under {}", ids.len(), self.logs_dir.display());
        ids
    }

    fn read_positions(&self, log_id: &LogId) -> LoadResult<PositionRecords> {
        let path = self.log_dir(log_id)?.join(POSITIONS_FILE);
        let contents = fs::read_to_string(&path).map_err(|e| {
            LoadError::corrupt(
                log_id.as_str(),
                format!("cannot read {}: {}", path.display(), e),
            )
        })?;

        let records = Self::parse_positions(log_id, &contents)?;
        debug!(
            "Read {} position records ({}) for log {}",
            records.len(),
            records.kind(),
            log_id
        );
        Ok(records)
    }

    fn read_representative_image(&self, log_id: &LogId) -> LoadResult<Option<Vec<u8>>> {
        let dir = self.log_dir(log_id)?;
        let image_path = Self::first_image_in(&dir.join(CAMERA_DIR)).or_else(|| Self::first_image_in(&dir));

        let Some(image_path) = image_path else {
            return Ok(None);
        };

        let bytes = fs::read(&image_path).map_err(|e| {
            LoadError::corrupt(
                log_id.as_str(),
                format!("cannot read {}: {}", image_path.display(), e),
            )
        })?;
        Ok(Some(bytes))
    }

    fn read_annotations(&self, log_id: &LogId, category: AnnotationCategory) -> AnnotationSet {
        let dir = match self.log_dir(log_id) {
            Ok(dir) => dir,
            Err(e) => return AnnotationSet::failed(category, e.to_string()),
        };
        let path = dir.join(ANNOTATIONS_DIR).join(format!("{}.json", category.as_str()));

        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return AnnotationSet::missing(category),
            Err(e) => {
                error!("Failed to load {} annotations for {}: {}", category, log_id, e);
                return AnnotationSet::failed(category, e.to_string());
            }
        };

        match serde_json::from_str::<Vec<serde_json::Value>>(&contents) {
            Ok(items) => AnnotationSet::complete(category, items),
            Err(e) => {
                error!("Failed to parse {} annotations for {}: {}", category, log_id, e);
                AnnotationSet::failed(category, e.to_string())
            }
        }
    }
}
