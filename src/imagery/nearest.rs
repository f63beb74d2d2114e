//! Nearest-candidate selection by great-circle distance

use crate::models::{GeoPoint, GeoSearchCandidate};
use crate::utils::geo::haversine_distance;

/// The candidate closest to `target`, annotated with its distance in meters.
///
/// Scans in input order and keeps the first strict minimum, so ties go to
/// the earliest candidate. Candidates whose distance is not finite are
/// never selected.
pub fn nearest(target: GeoPoint, candidates: &[GeoSearchCandidate]) -> Option<GeoSearchCandidate> {
    let mut best: Option<(usize, f64)> = None;

    for (index, candidate) in candidates.iter().enumerate() {
        let distance = haversine_distance(&target, &candidate.location);
        if !distance.is_finite() {
            continue;
        }
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((index, distance)),
        }
    }

    best.map(|(index, distance)| candidates[index].clone().with_distance(distance))
}
