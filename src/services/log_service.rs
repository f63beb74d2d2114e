//! Read-side facade over the dataset: catalog, trajectories, previews and
//! annotations, with per-log results memoized in bounded LRU caches.

use futures::future::join_all;
use serde::Serialize;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::bounds::compute_bounds;
use super::catalog::{LogCatalog, PageRequest};
use super::memo_cache::{CacheStats, MemoCache, run_blocking};
use super::preview::encode_preview;
use super::trajectory::TrajectoryReconstructor;
use crate::config::CacheConfig;
use crate::dataset::DatasetSource;
use crate::errors::{AppError, AppResult, LoadError};
use crate::models::{
    AnnotationCategory, AnnotationSet, BoundingBox, LogDetail, LogId, LogListing, LogSummary,
    PreviewImage, Trajectory,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LogCacheStats {
    pub catalog_size: usize,
    pub trajectories: CacheStats,
    pub previews: CacheStats,
}

#[derive(Clone)]
pub struct LogService {
    dataset: Arc<dyn DatasetSource>,
    catalog: LogCatalog,
    trajectories: MemoCache<LogId, Arc<Trajectory>>,
    previews: MemoCache<LogId, Arc<PreviewImage>>,
    preview_quality: u8,
    show_trajectory: bool,
}

impl LogService {
    pub fn new(
        dataset: Arc<dyn DatasetSource>,
        cache: &CacheConfig,
        show_trajectory: bool,
    ) -> AppResult<Self> {
        let capacity = |name: &str, value: usize| {
            NonZeroUsize::new(value).ok_or_else(|| {
                AppError::configuration(format!("cache.{name} must be greater than zero"))
            })
        };

        Ok(Self {
            catalog: LogCatalog::new(Arc::clone(&dataset)),
            trajectories: MemoCache::new(
                "trajectory",
                capacity("trajectory_capacity", cache.trajectory_capacity)?,
            ),
            previews: MemoCache::new(
                "preview",
                capacity("preview_capacity", cache.preview_capacity)?,
            ),
            preview_quality: cache.preview_jpeg_quality,
            show_trajectory,
            dataset,
        })
    }

    pub fn catalog(&self) -> &LogCatalog {
        &self.catalog
    }

    pub fn show_trajectory(&self) -> bool {
        self.show_trajectory
    }

    async fn ensure_known(&self, log_id: &LogId) -> AppResult<()> {
        if self.catalog.contains(log_id).await? {
            Ok(())
        } else {
            Err(AppError::not_found("log", log_id.as_str()))
        }
    }

    /// Reconstructed path of a log, loaded at most once while cached
    pub async fn get_trajectory(&self, log_id: &LogId) -> AppResult<Arc<Trajectory>> {
        self.ensure_known(log_id).await?;

        let dataset = Arc::clone(&self.dataset);
        let id = log_id.clone();
        let trajectory = self
            .trajectories
            .get_or_load(log_id.clone(), || async move {
                run_blocking(move || {
                    info!("Loading trajectory for log {}", id);
                    let records = dataset.read_positions(&id)?;
                    let trajectory = TrajectoryReconstructor::reconstruct(&id, &records)?;
                    debug!(
                        "Reconstructed {} points for log {} from {} records",
                        trajectory.len(),
                        id,
                        records.kind()
                    );
                    Ok(Arc::new(trajectory))
                })
                .await
            })
            .await?;

        Ok(trajectory)
    }

    async fn non_empty_trajectory(&self, log_id: &LogId) -> AppResult<Arc<Trajectory>> {
        let trajectory = self.get_trajectory(log_id).await?;
        if trajectory.is_empty() {
            return Err(AppError::not_found("trajectory data", log_id.as_str()));
        }
        Ok(trajectory)
    }

    pub async fn get_bounds(&self, log_id: &LogId) -> AppResult<BoundingBox> {
        let trajectory = self.non_empty_trajectory(log_id).await?;
        compute_bounds(&trajectory)
    }

    /// Trajectory detail, reduced to the first point when full paths are
    /// disabled
    pub async fn get_log_detail(&self, log_id: &LogId) -> AppResult<LogDetail> {
        let trajectory = self.non_empty_trajectory(log_id).await?;
        let num_points = trajectory.len();

        let (bounds, path) = if self.show_trajectory {
            (compute_bounds(&trajectory)?, Trajectory::clone(&trajectory))
        } else {
            let first = trajectory
                .first()
                .ok_or_else(|| AppError::not_found("trajectory data", log_id.as_str()))?;
            (BoundingBox::at_point(first), Trajectory::new(vec![first]))
        };

        Ok(LogDetail {
            log_id: log_id.clone(),
            num_points,
            bounds,
            trajectory: path,
        })
    }

    /// One page of the catalog. With `include_details`, logs whose
    /// trajectory fails to load are logged and left out of `items`.
    pub async fn list_logs(
        &self,
        request: PageRequest,
        include_details: bool,
    ) -> AppResult<LogListing> {
        let page = self.catalog.page(request).await?;

        let items = if include_details {
            let summaries = join_all(page.ids.iter().map(|id| self.summarize(id))).await;
            page.ids
                .iter()
                .zip(summaries)
                .filter_map(|(id, summary)| match summary {
                    Ok(summary) => Some(summary),
                    Err(e) => {
                        warn!("Skipping log {} in listing: {}", id, e);
                        None
                    }
                })
                .collect()
        } else {
            page.ids.iter().cloned().map(LogSummary::id_only).collect()
        };

        Ok(LogListing {
            total: page.total,
            items,
            next_offset: page.next_offset,
            show_traj: self.show_trajectory,
        })
    }

    async fn summarize(&self, log_id: &LogId) -> AppResult<LogSummary> {
        let trajectory = self.non_empty_trajectory(log_id).await?;
        Ok(LogSummary {
            log_id: log_id.clone(),
            num_points: Some(trajectory.len()),
            bounds: Some(compute_bounds(&trajectory)?),
        })
    }

    /// JPEG preview of the log's representative frame
    pub async fn get_preview_image(&self, log_id: &LogId) -> AppResult<Arc<PreviewImage>> {
        self.ensure_known(log_id).await?;

        let dataset = Arc::clone(&self.dataset);
        let id = log_id.clone();
        let quality = self.preview_quality;
        let preview = self
            .previews
            .get_or_load(log_id.clone(), || async move {
                run_blocking(move || {
                    info!("Loading preview image for log {}", id);
                    let raw = dataset
                        .read_representative_image(&id)?
                        .ok_or_else(|| LoadError::missing(id.as_str(), "preview image"))?;
                    encode_preview(&id, &raw, quality).map(Arc::new)
                })
                .await
            })
            .await?;

        Ok(preview)
    }

    pub async fn get_annotations(
        &self,
        log_id: &LogId,
        category: AnnotationCategory,
    ) -> AppResult<AnnotationSet> {
        self.ensure_known(log_id).await?;

        let dataset = Arc::clone(&self.dataset);
        let id = log_id.clone();
        tokio::task::spawn_blocking(move || dataset.read_annotations(&id, category))
            .await
            .map_err(|e| AppError::internal(format!("annotation load task failed: {e}")))
    }

    pub async fn cache_stats(&self) -> AppResult<LogCacheStats> {
        Ok(LogCacheStats {
            catalog_size: self.catalog.list().await?.len(),
            trajectories: self.trajectories.stats(),
            previews: self.previews.stats(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::LoadResult;
    use crate::models::{GeoPoint, PositionRecords};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct MemoryDataset {
        logs: HashMap<String, LoadResult<PositionRecords>>,
        reads: AtomicUsize,
    }

    impl MemoryDataset {
        fn with_log(mut self, id: &str, points: usize) -> Self {
            let fixes = (0..points)
                .map(|i| GeoPoint::new(57.7 + i as f64 * 1e-4, 11.9 + i as f64 * 1e-4))
                .collect();
            self.logs
                .insert(id.to_string(), Ok(PositionRecords::DirectFix(fixes)));
            self
        }

        fn with_broken_log(mut self, id: &str) -> Self {
            self.logs
                .insert(id.to_string(), Err(LoadError::corrupt(id, "oxts.json missing")));
            self
        }
    }

    impl DatasetSource for MemoryDataset {
        fn list_log_ids(&self) -> Vec<LogId> {
            let mut ids: Vec<LogId> = self.logs.keys().map(|k| LogId::new(k.as_str())).collect();
            ids.sort();
            ids
        }

        fn read_positions(&self, log_id: &LogId) -> LoadResult<PositionRecords> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.logs
                .get(log_id.as_str())
                .cloned()
                .unwrap_or_else(|| Err(LoadError::not_found(log_id.as_str())))
        }

        fn read_representative_image(&self, _log_id: &LogId) -> LoadResult<Option<Vec<u8>>> {
            Ok(None)
        }

        fn read_annotations(&self, _log_id: &LogId, category: AnnotationCategory) -> AnnotationSet {
            AnnotationSet::missing(category)
        }
    }

    fn service(dataset: Arc<MemoryDataset>, show_trajectory: bool) -> LogService {
        LogService::new(dataset, &CacheConfig::default(), show_trajectory).unwrap()
    }

    #[tokio::test]
    async fn test_trajectory_is_reconstructed_once() {
        let dataset = Arc::new(MemoryDataset::default().with_log("000001", 10));
        let service = service(dataset.clone(), true);
        let id = LogId::from("000001");

        let first = service.get_trajectory(&id).await.unwrap();
        let second = service.get_trajectory(&id).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 10);
        assert_eq!(dataset.reads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unknown_log_is_not_found() {
        let service = service(Arc::new(MemoryDataset::default().with_log("a", 2)), true);
        let err = service.get_trajectory(&"zzz".into()).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_low_detail_mode_returns_first_point() {
        let service = service(Arc::new(MemoryDataset::default().with_log("big", 500)), false);
        let detail = service.get_log_detail(&"big".into()).await.unwrap();

        assert_eq!(detail.num_points, 500);
        assert_eq!(detail.trajectory.len(), 1);
        assert!(detail.bounds.is_degenerate());
        let first = detail.trajectory.first().unwrap();
        assert_eq!(detail.bounds, BoundingBox::at_point(first));
    }

    #[tokio::test]
    async fn test_full_detail_mode_returns_whole_path() {
        let service = service(Arc::new(MemoryDataset::default().with_log("big", 500)), true);
        let detail = service.get_log_detail(&"big".into()).await.unwrap();

        assert_eq!(detail.trajectory.len(), 500);
        assert!(detail.trajectory.iter().all(|p| detail.bounds.contains(p)));
    }

    #[tokio::test]
    async fn test_listing_skips_broken_logs() {
        let dataset = MemoryDataset::default()
            .with_log("a", 3)
            .with_broken_log("b")
            .with_log("c", 4);
        let service = service(Arc::new(dataset), true);

        let listing = service
            .list_logs(PageRequest::new(0, 10).unwrap(), true)
            .await
            .unwrap();
        assert_eq!(listing.total, 3);
        let ids: Vec<_> = listing.items.iter().map(|s| s.log_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(listing.items[1].num_points, Some(4));
        assert_eq!(listing.next_offset, None);
    }

    #[tokio::test]
    async fn test_listing_without_details_has_ids_only() {
        let service = service(Arc::new(MemoryDataset::default().with_broken_log("b")), true);
        let listing = service
            .list_logs(PageRequest::default(), false)
            .await
            .unwrap();
        assert_eq!(listing.items, vec![LogSummary::id_only("b".into())]);
        assert!(listing.show_traj);
    }

    #[tokio::test]
    async fn test_missing_preview_is_not_found() {
        let service = service(Arc::new(MemoryDataset::default().with_log("a", 1)), true);
        let err = service.get_preview_image(&"a".into()).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_zero_capacity_is_rejected() {
        let cache = CacheConfig {
            trajectory_capacity: 0,
            ..CacheConfig::default()
        };
        let result = LogService::new(Arc::new(MemoryDataset::default()), &cache, true);
        assert!(matches!(result, Err(AppError::Configuration { .. })));
    }
}
