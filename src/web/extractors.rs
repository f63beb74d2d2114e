//! Request extractors and validation
//!
//! Query parameters are validated at the boundary; rejections use the
//! standard JSON error envelope instead of axum's plain-text bodies.

use axum::{
    extract::{FromRequestParts, Query},
    http::request::Parts,
    response::Response,
};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::responses::bad_request;
use crate::errors::{AppError, AppResult};
use crate::models::GeoPoint;
use crate::services::PageRequest;
use crate::services::catalog::DEFAULT_PAGE_LIMIT;

/// Upper bound on search radii; the flat-Earth box conversion is only
/// meaningful over short distances
pub const MAX_SEARCH_RADIUS_M: f64 = 10_000.0;

/// Query string extractor answering malformed input with a JSON 400
#[derive(Debug, Clone)]
pub struct ApiQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| bad_request(&format!("Invalid query parameters: {}", e.body_text())))?;
        Ok(Self(value))
    }
}

/// `GET /api/logs` parameters
#[derive(Debug, Clone, Deserialize)]
pub struct LogListParams {
    #[serde(default)]
    pub include_details: bool,
    #[serde(default)]
    pub offset: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    DEFAULT_PAGE_LIMIT
}

impl LogListParams {
    pub fn page_request(&self) -> AppResult<PageRequest> {
        PageRequest::new(self.offset, self.limit)
    }
}

impl<S> FromRequestParts<S> for LogListParams
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(params) = Query::<LogListParams>::from_request_parts(parts, state)
            .await
            .map_err(|_| bad_request("Invalid pagination parameters"))?;

        if let Err(AppError::InvalidInput { message }) = params.page_request() {
            return Err(bad_request(&message));
        }

        Ok(params)
    }
}

/// Optional search radius, e.g. `?radius=25`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RadiusParams {
    pub radius: Option<f64>,
}

/// `GET /api/imagery/near` parameters
#[derive(Debug, Clone, Deserialize)]
pub struct NearParams {
    pub lat: f64,
    pub lon: f64,
    pub radius: Option<f64>,
    pub limit: Option<usize>,
}

/// `GET /api/imagery/closest` parameters
#[derive(Debug, Clone, Deserialize)]
pub struct ClosestParams {
    pub lat: f64,
    pub lon: f64,
    pub radius: Option<f64>,
}

pub fn validate_point(lat: f64, lon: f64) -> AppResult<GeoPoint> {
    let point = GeoPoint::new(lat, lon);
    if point.is_valid() {
        Ok(point)
    } else {
        Err(AppError::invalid_input(format!(
            "Coordinates out of range: lat={lat}, lon={lon}"
        )))
    }
}

/// Requested radius or `default`, which must be positive and at most
/// [`MAX_SEARCH_RADIUS_M`]
pub fn validate_radius(radius: Option<f64>, default: f64) -> AppResult<f64> {
    let radius = radius.unwrap_or(default);
    if radius.is_finite() && radius > 0.0 && radius <= MAX_SEARCH_RADIUS_M {
        Ok(radius)
    } else {
        Err(AppError::invalid_input(format!(
            "radius must be greater than 0 and at most {MAX_SEARCH_RADIUS_M} meters, got {radius}"
        )))
    }
}

pub fn validate_limit(limit: Option<usize>, default: usize, max: usize) -> AppResult<usize> {
    let limit = limit.unwrap_or(default);
    if (1..=max).contains(&limit) {
        Ok(limit)
    } else {
        Err(AppError::invalid_input(format!(
            "limit must be between 1 and {max}, got {limit}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_radius() {
        assert_eq!(validate_radius(None, 10.0).unwrap(), 10.0);
        assert_eq!(validate_radius(Some(250.0), 10.0).unwrap(), 250.0);
        assert!(validate_radius(Some(0.0), 10.0).is_err());
        assert!(validate_radius(Some(-5.0), 10.0).is_err());
        assert!(validate_radius(Some(f64::NAN), 10.0).is_err());
        assert!(validate_radius(Some(MAX_SEARCH_RADIUS_M + 1.0), 10.0).is_err());
    }

    #[test]
    fn test_validate_point_and_limit() {
        assert!(validate_point(57.7, 11.9).is_ok());
        assert!(validate_point(91.0, 0.0).is_err());
        assert_eq!(validate_limit(None, 20, 2000).unwrap(), 20);
        assert!(validate_limit(Some(0), 20, 2000).is_err());
        assert!(validate_limit(Some(2001), 20, 2000).is_err());
    }

    #[test]
    fn test_list_params_page_request() {
        let params = LogListParams {
            include_details: false,
            offset: 100,
            limit: 501,
        };
        assert!(params.page_request().is_err());
    }
}
