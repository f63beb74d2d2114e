//! Per-log summary export: start position and traffic sign coverage

use serde::Serialize;
use std::path::Path;
use tracing::{info, warn};

use crate::errors::{AppError, AppResult};
use crate::models::{AnnotationCategory, LogId};
use crate::services::LogService;

pub const DEFAULT_STATS_FILE: &str = "log_stats.csv";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogStatsRow {
    pub log_id: LogId,
    pub lat: f64,
    pub lon: f64,
    /// 1 when the log carries at least one traffic sign annotation
    pub has_ts_anno: u8,
}

#[derive(Debug, Clone, Default)]
pub struct StatsReport {
    pub rows: Vec<LogStatsRow>,
    pub failed: Vec<(LogId, String)>,
}

/// Summarize every log in the catalog. Logs that fail to load are recorded
/// in `failed` and left out of `rows`.
pub async fn collect_stats(logs: &LogService) -> AppResult<StatsReport> {
    let log_ids = logs.catalog().list().await?;
    info!("Discovered {} driving logs to summarize", log_ids.len());

    let mut report = StatsReport::default();
    for log_id in log_ids.iter() {
        match summarize_log(logs, log_id).await {
            Ok(row) => report.rows.push(row),
            Err(e) => {
                warn!("Failed to process log {}: {}", log_id, e);
                report.failed.push((log_id.clone(), e.to_string()));
            }
        }
    }

    info!(
        "Summarized {} logs, {} failed",
        report.rows.len(),
        report.failed.len()
    );
    Ok(report)
}

async fn summarize_log(logs: &LogService, log_id: &LogId) -> AppResult<LogStatsRow> {
    let trajectory = logs.get_trajectory(log_id).await?;
    let start = trajectory
        .first()
        .ok_or_else(|| AppError::not_found("trajectory data", log_id.as_str()))?;

    let signs = logs
        .get_annotations(log_id, AnnotationCategory::TrafficSigns)
        .await?;
    if signs.is_partial() {
        warn!("Traffic sign annotations of {} could not be read", log_id);
    }

    Ok(LogStatsRow {
        log_id: log_id.clone(),
        lat: start.lat,
        lon: start.lon,
        has_ts_anno: u8::from(!signs.items.is_empty()),
    })
}

/// Write `rows` as CSV with a header line
pub async fn write_csv(path: &Path, rows: &[LogStatsRow]) -> AppResult<()> {
    let mut out = Vec::new();
    {
        let mut writer = csv::Writer::from_writer(&mut out);
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
    }
    tokio::fs::write(path, out).await?;
    info!("Saved per-log results to {}", path.display());
    Ok(())
}
