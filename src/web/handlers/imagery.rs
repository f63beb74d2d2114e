//! Street-level imagery HTTP handlers

use axum::{extract::State, response::Response};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::{CandidateMetadata, GeoSearchCandidate};
use crate::web::{
    AppState,
    extractors::{
        ApiQuery, ClosestParams, NearParams, validate_limit, validate_point, validate_radius,
    },
    responses::handle_result,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImagerySearchResponse {
    pub radius_m: f64,
    pub count: usize,
    pub candidates: Vec<CandidateMetadata>,
}

impl ImagerySearchResponse {
    pub fn new(radius_m: f64, candidates: &[GeoSearchCandidate]) -> Self {
        Self {
            radius_m,
            count: candidates.len(),
            candidates: candidates.iter().map(CandidateMetadata::from).collect(),
        }
    }
}

/// `GET /api/imagery/near?lat=&lon=&radius=&limit=`
pub async fn search_near(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<NearParams>,
) -> Response {
    let imagery = &state.config.imagery;
    let result = async {
        let point = validate_point(params.lat, params.lon)?;
        let radius = validate_radius(params.radius, imagery.default_radius_m)?;
        let limit = validate_limit(params.limit, imagery.closest_limit, imagery.max_results)?;
        let candidates = state.imagery.search_near(point, radius, limit).await;
        Ok::<_, AppError>(ImagerySearchResponse::new(radius, &candidates))
    }
    .await;
    handle_result(result)
}

/// `GET /api/imagery/closest?lat=&lon=&radius=`
pub async fn closest(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ClosestParams>,
) -> Response {
    let imagery = &state.config.imagery;
    let result = async {
        let point = validate_point(params.lat, params.lon)?;
        let radius = validate_radius(params.radius, imagery.closest_radius_m)?;
        state
            .imagery
            .find_closest(point, radius, imagery.closest_limit)
            .await
            .map(|candidate| CandidateMetadata::from(&candidate))
            .ok_or_else(|| {
                AppError::not_found("image near location", format!("{},{}", point.lat, point.lon))
            })
    }
    .await;
    handle_result(result)
}
