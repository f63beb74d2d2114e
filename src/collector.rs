//! Batch collection of street-level imagery along each log's trajectory
//!
//! Output layout:
//!
//! ```text
//! <output>/<log_id>/<log_id>.json    candidate metadata
//! <output>/<log_id>/<image_id>.jpg   decoded thumbnails
//! <output>/failed_logs.txt           ids that could not be processed
//! ```

use image::ImageFormat;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

use crate::errors::{AppError, AppResult};
use crate::imagery::GeoImageSearch;
use crate::models::{CandidateMetadata, GeoSearchCandidate, LogId};
use crate::services::LogService;
use crate::utils::time::{estimate_remaining, format_elapsed};

pub const FAILED_LOGS_FILE: &str = "failed_logs.txt";

#[derive(Debug, Clone)]
pub struct CollectOptions {
    /// Logs to process; the whole catalog when empty
    pub log_ids: Vec<LogId>,
    pub radius_m: f64,
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone, Default)]
pub struct CollectSummary {
    pub processed: usize,
    pub failed: Vec<LogId>,
    pub images_saved: usize,
    pub elapsed: Duration,
}

pub struct Collector {
    logs: LogService,
    imagery: Arc<dyn GeoImageSearch>,
}

impl Collector {
    pub fn new(logs: LogService, imagery: Arc<dyn GeoImageSearch>) -> Self {
        Self { logs, imagery }
    }

    pub async fn run(&self, options: &CollectOptions) -> AppResult<CollectSummary> {
        let log_ids = if options.log_ids.is_empty() {
            self.logs.catalog().list().await?.to_vec()
        } else {
            options.log_ids.clone()
        };
        info!("Discovered {} driving logs to process", log_ids.len());

        tokio::fs::create_dir_all(&options.output_dir).await?;

        let started = Instant::now();
        let total = log_ids.len();
        let mut summary = CollectSummary::default();

        for (index, log_id) in log_ids.iter().enumerate() {
            match self.collect_log(log_id, options).await {
                Ok(saved) => {
                    summary.processed += 1;
                    summary.images_saved += saved;
                }
                Err(e) => {
                    error!("Failed to process log {}: {}", log_id, e);
                    summary.failed.push(log_id.clone());
                }
            }

            let elapsed = started.elapsed();
            info!(
                "Progress {}/{} | Elapsed {} | ETA ~ {}",
                index + 1,
                total,
                format_elapsed(elapsed),
                format_elapsed(estimate_remaining(elapsed, index + 1, total))
            );
        }

        summary.elapsed = started.elapsed();

        if summary.failed.is_empty() {
            info!("All logs processed successfully");
        } else {
            let path = options.output_dir.join(FAILED_LOGS_FILE);
            let contents: String = summary
                .failed
                .iter()
                .map(|id| format!("{id}\n"))
                .collect();
            tokio::fs::write(&path, contents).await?;
            warn!("{} logs failed, ids saved to {}", summary.failed.len(), path.display());
        }

        info!(
            "Collection finished: processed={} failed={} images_saved={} elapsed={}",
            summary.processed,
            summary.failed.len(),
            summary.images_saved,
            format_elapsed(summary.elapsed)
        );
        Ok(summary)
    }

    async fn collect_log(&self, log_id: &LogId, options: &CollectOptions) -> AppResult<usize> {
        info!("Processing log {}", log_id);
        let trajectory = self.logs.get_trajectory(log_id).await?;
        let candidates = self
            .imagery
            .search_along(&trajectory, options.radius_m)
            .await;
        info!("Found {} images along the trajectory of {}", candidates.len(), log_id);

        let log_dir = options.output_dir.join(log_id.as_str());
        save_results(&log_dir, log_id, candidates).await
    }
}

/// Write the metadata file and one JPEG per candidate with pixels.
/// Returns the number of images written.
pub async fn save_results(
    log_dir: &Path,
    log_id: &LogId,
    candidates: Vec<GeoSearchCandidate>,
) -> AppResult<usize> {
    tokio::fs::create_dir_all(log_dir).await?;

    let metadata: Vec<CandidateMetadata> = candidates.iter().map(CandidateMetadata::from).collect();
    let metadata_path = log_dir.join(format!("{log_id}.json"));
    tokio::fs::write(&metadata_path, serde_json::to_vec_pretty(&metadata)?).await?;

    let dir = log_dir.to_path_buf();
    let saved = tokio::task::spawn_blocking(move || save_images(&dir, &candidates))
        .await
        .map_err(|e| AppError::internal(format!("image save task failed: {e}")))??;

    info!(
        "Persisted metadata to {} and saved {} images to {}",
        metadata_path.display(),
        saved,
        log_dir.display()
    );
    Ok(saved)
}

fn save_images(dir: &Path, candidates: &[GeoSearchCandidate]) -> AppResult<usize> {
    let mut saved = 0;
    let mut used = HashSet::new();
    for candidate in candidates {
        let Some(image) = &candidate.image else {
            warn!("Skipping image {} due to missing pixel data", candidate.id);
            continue;
        };

        let mut stem = image_file_stem(&candidate.id, saved);
        if !used.insert(stem.clone()) {
            stem = format!("image_{saved:04}");
            warn!(
                "Duplicate image id {} in results, saving it as {}.jpg",
                candidate.id, stem
            );
            used.insert(stem.clone());
        }

        let path = dir.join(format!("{stem}.jpg"));
        image.save_with_format(&path, ImageFormat::Jpeg)?;
        saved += 1;
    }
    Ok(saved)
}

/// Candidate ids come from a remote service; anything that is not a plain
/// file name falls back to a positional name.
fn image_file_stem(id: &str, index: usize) -> String {
    let plain = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if plain {
        id.to_string()
    } else {
        format!("image_{index:04}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GeoPoint;
    use image::RgbImage;

    #[test]
    fn test_image_file_stem() {
        assert_eq!(image_file_stem("1234567890", 0), "1234567890");
        assert_eq!(image_file_stem("", 3), "image_0003");
        assert_eq!(image_file_stem("../etc/passwd", 1), "image_0001");
    }

    #[tokio::test]
    async fn test_save_results_writes_metadata_and_images() {
        let dir = tempfile::tempdir().unwrap();
        let log_id = LogId::from("000123");
        let log_dir = dir.path().join(log_id.as_str());

        let mut with_pixels = GeoSearchCandidate::new("111", GeoPoint::new(57.7, 11.9));
        with_pixels.image = Some(Arc::new(RgbImage::new(8, 8)));
        let without_pixels = GeoSearchCandidate::new("222", GeoPoint::new(57.7, 11.9));

        let saved = save_results(&log_dir, &log_id, vec![with_pixels, without_pixels])
            .await
            .unwrap();
        assert_eq!(saved, 1);
        assert!(log_dir.join("111.jpg").exists());
        assert!(!log_dir.join("222.jpg").exists());

        let metadata: Vec<CandidateMetadata> =
            serde_json::from_slice(&std::fs::read(log_dir.join("000123.json")).unwrap()).unwrap();
        assert_eq!(metadata.len(), 2);
        assert!(metadata[0].has_image);
        assert!(!metadata[1].has_image);
    }

    #[tokio::test]
    async fn test_duplicate_ids_do_not_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let log_id = LogId::from("000124");

        let candidates: Vec<GeoSearchCandidate> = (0..2)
            .map(|_| {
                let mut candidate = GeoSearchCandidate::new("333", GeoPoint::new(57.7, 11.9));
                candidate.image = Some(Arc::new(RgbImage::new(4, 4)));
                candidate
            })
            .collect();

        let saved = save_results(dir.path(), &log_id, candidates).await.unwrap();
        assert_eq!(saved, 2);
        assert!(dir.path().join("333.jpg").exists());
        assert!(dir.path().join("image_0001.jpg").exists());
    }
}
