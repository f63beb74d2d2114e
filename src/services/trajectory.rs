//! Trajectory reconstruction from raw positional records

use tracing::debug;

use crate::errors::{LoadError, LoadResult};
use crate::models::{GeoPoint, LogId, Pose, PositionRecords, Trajectory};
use crate::utils::geo::offset_point;

/// Converts a log's position records into an ordered lat/lon path.
///
/// Relative poses are projected with the flat-Earth approximation from
/// [`crate::utils::geo`], which is only meaningful over the few kilometers a
/// single recording spans.
pub struct TrajectoryReconstructor;

impl TrajectoryReconstructor {
    pub fn reconstruct(log_id: &LogId, records: &PositionRecords) -> LoadResult<Trajectory> {
        if records.is_empty() {
            return Err(LoadError::corrupt(log_id.as_str(), "no position records"));
        }

        let trajectory: Trajectory = match records {
            PositionRecords::DirectFix(fixes) => fixes.iter().copied().collect(),
            PositionRecords::RelativePose { origin, poses } => poses
                .iter()
                .map(|pose| Self::project_pose(*origin, pose))
                .collect(),
        };

        if let Some((index, point)) = trajectory
            .iter()
            .enumerate()
            .find(|(_, point)| !point.is_valid())
        {
            return Err(LoadError::corrupt(
                log_id.as_str(),
                format!("point {index} out of range: ({}, {})", point.lat, point.lon),
            ));
        }

        debug!(
            "Reconstructed {} points for log {} from {} records",
            trajectory.len(),
            log_id,
            records.kind()
        );
        Ok(trajectory)
    }

    /// Translation column of the pose: x is east, y is north, in meters
    fn project_pose(origin: GeoPoint, pose: &Pose) -> GeoPoint {
        let east = pose[0][3];
        let north = pose[1][3];
        offset_point(origin, east, north)
    }
}
