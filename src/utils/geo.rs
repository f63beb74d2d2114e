//! Distance and angle conversions
//!
//! The meter/degree conversions are a local flat-Earth approximation. They
//! hold over the extent of a single recording (a few kilometers) at moderate
//! latitudes; the longitude term divides by `cos(lat)` and degrades towards
//! the poles. Search-radius conversion applies the latitude factor to both
//! axes, which makes longitude margins too narrow away from the equator.
//! Do not use these helpers for spans crossing large latitude ranges.

use crate::models::GeoPoint;

/// Meters per degree of latitude
pub const METERS_PER_DEGREE_LAT: f64 = 111_320.0;

/// Equatorial circumference used for longitude scaling, meters
pub const EARTH_CIRCUMFERENCE_M: f64 = 40_075_000.0;

/// Mean Earth radius for great-circle distances, meters
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Convert a metric distance to an angular margin in degrees
pub fn meters_to_degrees(meters: f64) -> f64 {
    meters / METERS_PER_DEGREE_LAT
}

/// Meters covered by one degree of longitude at `lat_deg`
pub fn meters_per_degree_lon(lat_deg: f64) -> f64 {
    EARTH_CIRCUMFERENCE_M * lat_deg.to_radians().cos() / 360.0
}

/// Apply an east/north offset in meters to `origin`
pub fn offset_point(origin: GeoPoint, east_m: f64, north_m: f64) -> GeoPoint {
    let dlat = north_m / METERS_PER_DEGREE_LAT;
    let dlon = east_m / meters_per_degree_lon(origin.lat);
    GeoPoint::new(origin.lat + dlat, origin.lon + dlon)
}

/// Great-circle distance in meters (Haversine)
pub fn haversine_distance(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lon = (b.lon - a.lon).to_radians();

    // Rounding can push h just outside [0, 1] for near-antipodal points
    let h = ((delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2))
    .clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_M * c
}
