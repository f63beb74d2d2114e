//! Response shapes for log listing and detail queries

use serde::{Deserialize, Serialize};

use super::geo::{BoundingBox, Trajectory};
use super::log::LogId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogSummary {
    pub log_id: LogId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_points: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounds: Option<BoundingBox>,
}

impl LogSummary {
    pub fn id_only(log_id: LogId) -> Self {
        Self {
            log_id,
            num_points: None,
            bounds: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogListing {
    pub total: usize,
    pub items: Vec<LogSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_offset: Option<usize>,
    pub show_traj: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogDetail {
    pub log_id: LogId,
    /// Point count of the full reconstruction, even in low-detail mode
    pub num_points: usize,
    pub bounds: BoundingBox,
    pub trajectory: Trajectory,
}
