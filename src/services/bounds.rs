//! Bounding boxes over trajectories

use crate::errors::{AppError, AppResult};
use crate::models::{BoundingBox, Trajectory};

/// Tightest box enclosing every point of `trajectory`.
///
/// Callers must not pass an empty trajectory; the API layer reports those
/// as "no data" before getting here.
pub fn compute_bounds(trajectory: &Trajectory) -> AppResult<BoundingBox> {
    let first = trajectory
        .first()
        .ok_or_else(|| AppError::invalid_input("cannot compute bounds of an empty trajectory"))?;

    let bounds = trajectory
        .iter()
        .skip(1)
        .fold(BoundingBox::at_point(first), |acc, point| BoundingBox {
            min_lat: acc.min_lat.min(point.lat),
            min_lon: acc.min_lon.min(point.lon),
            max_lat: acc.max_lat.max(point.lat),
            max_lon: acc.max_lon.max(point.lon),
        });

    Ok(bounds)
}
