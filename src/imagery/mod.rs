//! Street-level imagery search and nearest-match selection

pub mod client;
pub mod nearest;

pub use client::GeoImageClient;
pub use nearest::nearest;

use async_trait::async_trait;

use crate::models::{GeoPoint, GeoSearchCandidate, Trajectory};

/// Bounding-box image search against an external image service.
///
/// Implementations never fail: transport or parsing problems are logged and
/// reported as an empty result, the same as "no images found".
#[async_trait]
pub trait GeoImageSearch: Send + Sync {
    /// Images inside a square box of `radius_m` around `point`
    async fn search_near(
        &self,
        point: GeoPoint,
        radius_m: f64,
        limit: usize,
    ) -> Vec<GeoSearchCandidate>;

    /// Images inside the trajectory's bounding box grown by `radius_m`
    async fn search_along(&self, trajectory: &Trajectory, radius_m: f64)
    -> Vec<GeoSearchCandidate>;

    /// Closest image to `point` among a near search, with its distance
    async fn find_closest(
        &self,
        point: GeoPoint,
        radius_m: f64,
        limit: usize,
    ) -> Option<GeoSearchCandidate> {
        let candidates = self.search_near(point, radius_m, limit).await;
        nearest(point, &candidates)
    }
}
