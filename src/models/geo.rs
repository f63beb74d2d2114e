//! Geographic primitives: points, trajectories and bounding boxes

use serde::{Deserialize, Serialize};

/// A WGS84 coordinate in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Latitude within [-90, 90] and longitude within [-180, 180]
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }
}

impl From<(f64, f64)> for GeoPoint {
    fn from((lat, lon): (f64, f64)) -> Self {
        Self { lat, lon }
    }
}

/// Ordered path of a log, index order is capture order.
///
/// Built once by the reconstructor and never mutated afterwards; the cache
/// hands out shared references to it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Trajectory(Vec<GeoPoint>);

impl Trajectory {
    pub fn new(points: Vec<GeoPoint>) -> Self {
        Self(points)
    }

    pub fn points(&self) -> &[GeoPoint] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first(&self) -> Option<GeoPoint> {
        self.0.first().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GeoPoint> {
        self.0.iter()
    }
}

impl FromIterator<GeoPoint> for Trajectory {
    fn from_iter<I: IntoIterator<Item = GeoPoint>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Axis-aligned rectangle in lat/lon space, `min <= max` on both axes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    /// Zero-area box sitting on a single point
    pub fn at_point(point: GeoPoint) -> Self {
        Self {
            min_lat: point.lat,
            min_lon: point.lon,
            max_lat: point.lat,
            max_lon: point.lon,
        }
    }

    /// Square box of `margin_deg` degrees on every side of `center`
    pub fn around(center: GeoPoint, margin_deg: f64) -> Self {
        Self::at_point(center).expand(margin_deg)
    }

    /// Grow the box by `margin_deg` degrees on all four sides
    pub fn expand(&self, margin_deg: f64) -> Self {
        Self {
            min_lat: self.min_lat - margin_deg,
            min_lon: self.min_lon - margin_deg,
            max_lat: self.max_lat + margin_deg,
            max_lon: self.max_lon + margin_deg,
        }
    }

    pub fn contains(&self, point: &GeoPoint) -> bool {
        (self.min_lat..=self.max_lat).contains(&point.lat)
            && (self.min_lon..=self.max_lon).contains(&point.lon)
    }

    pub fn is_degenerate(&self) -> bool {
        self.min_lat == self.max_lat && self.min_lon == self.max_lon
    }

    /// `min_lon,min_lat,max_lon,max_lat`, the order image services expect
    pub fn to_query_value(&self) -> String {
        format!(
            "{},{},{},{}",
            self.min_lon, self.min_lat, self.max_lon, self.max_lat
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_validity() {
        assert!(GeoPoint::new(57.7, 11.9).is_valid());
        assert!(GeoPoint::new(-90.0, 180.0).is_valid());
        assert!(!GeoPoint::new(90.5, 0.0).is_valid());
        assert!(!GeoPoint::new(0.0, -181.0).is_valid());
        assert!(!GeoPoint::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn test_expand_and_contains() {
        let bbox = BoundingBox::around(GeoPoint::new(52.0, 13.0), 0.5);
        assert_eq!(bbox.min_lat, 51.5);
        assert_eq!(bbox.max_lon, 13.5);
        assert!(bbox.contains(&GeoPoint::new(52.4, 12.6)));
        assert!(!bbox.contains(&GeoPoint::new(52.6, 13.0)));
    }

    #[test]
    fn test_query_value_is_lon_first() {
        let bbox = BoundingBox {
            min_lat: 1.0,
            min_lon: 2.0,
            max_lat: 3.0,
            max_lon: 4.0,
        };
        assert_eq!(bbox.to_query_value(), "2,1,4,3");
    }

    #[test]
    fn test_trajectory_serializes_as_point_list() {
        let trajectory: Trajectory = vec![GeoPoint::new(1.0, 2.0)].into_iter().collect();
        let json = serde_json::to_value(&trajectory).unwrap();
        assert_eq!(json, serde_json::json!([{ "lat": 1.0, "lon": 2.0 }]));
    }
}
