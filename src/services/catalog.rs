//! Log catalog snapshot and pagination over it

use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::dataset::DatasetSource;
use crate::errors::{AppError, AppResult};
use crate::models::LogId;

pub const MAX_PAGE_LIMIT: usize = 500;
pub const DEFAULT_PAGE_LIMIT: usize = 50;

/// Validated window into the sorted catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    offset: usize,
    limit: usize,
}

impl PageRequest {
    pub fn new(offset: usize, limit: usize) -> AppResult<Self> {
        if !(1..=MAX_PAGE_LIMIT).contains(&limit) {
            return Err(AppError::invalid_input(format!(
                "limit must be between 1 and {MAX_PAGE_LIMIT}, got {limit}"
            )));
        }
        Ok(Self { offset, limit })
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogPage {
    pub total: usize,
    pub ids: Vec<LogId>,
    /// `offset + returned`, absent once the end of the catalog is reached
    pub next_offset: Option<usize>,
}

/// Sorted list of dataset log ids, enumerated once per process
#[derive(Clone)]
pub struct LogCatalog {
    dataset: Arc<dyn DatasetSource>,
    snapshot: Arc<OnceCell<Arc<Vec<LogId>>>>,
}

impl LogCatalog {
    pub fn new(dataset: Arc<dyn DatasetSource>) -> Self {
        Self {
            dataset,
            snapshot: Arc::new(OnceCell::new()),
        }
    }

    /// The catalog snapshot, enumerating the dataset on first access
    pub async fn list(&self) -> AppResult<Arc<Vec<LogId>>> {
        let ids = self
            .snapshot
            .get_or_try_init(|| async {
                let dataset = Arc::clone(&self.dataset);
                let mut ids = tokio::task::spawn_blocking(move || dataset.list_log_ids())
                    .await
                    .map_err(|e| AppError::internal(format!("catalog scan failed: {e}")))?;
                ids.sort();
                ids.dedup();

                if ids.is_empty() {
                    warn!("Dataset contains no logs");
                } else {
                    info!("Log catalog loaded: {} logs", ids.len());
                }
                Ok::<_, AppError>(Arc::new(ids))
            })
            .await?;
        Ok(Arc::clone(ids))
    }

    pub async fn contains(&self, log_id: &LogId) -> AppResult<bool> {
        Ok(self.list().await?.binary_search(log_id).is_ok())
    }

    pub async fn page(&self, request: PageRequest) -> AppResult<CatalogPage> {
        let ids = self.list().await?;
        Ok(paginate(&ids, request))
    }
}

fn paginate(ids: &[LogId], request: PageRequest) -> CatalogPage {
    let total = ids.len();
    let start = request.offset.min(total);
    let end = start.saturating_add(request.limit).min(total);
    let page: Vec<LogId> = ids[start..end].to_vec();

    let next = request.offset.saturating_add(page.len());
    CatalogPage {
        total,
        next_offset: (next < total).then_some(next),
        ids: page,
    }
}
