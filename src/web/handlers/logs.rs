//! Driving log HTTP handlers

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use tracing::debug;

use super::imagery::ImagerySearchResponse;
use crate::errors::{AppError, AppResult};
use crate::models::{AnnotationCategory, AnnotationSet, LogId};
use crate::web::{
    AppState,
    extractors::{ApiQuery, LogListParams, RadiusParams, validate_radius},
    responses::{handle_error, handle_result},
};

/// `GET /api/logs`
pub async fn list_logs(State(state): State<AppState>, params: LogListParams) -> Response {
    debug!(
        "Listing logs offset={} limit={} include_details={}",
        params.offset, params.limit, params.include_details
    );
    let result = async {
        let request = params.page_request()?;
        state.logs.list_logs(request, params.include_details).await
    }
    .await;
    handle_result(result)
}

/// `GET /api/logs/{log_id}`
pub async fn get_log(State(state): State<AppState>, Path(log_id): Path<String>) -> Response {
    handle_result(state.logs.get_log_detail(&LogId::from(log_id)).await)
}

/// `GET /api/logs/{log_id}/bounds`
pub async fn get_log_bounds(State(state): State<AppState>, Path(log_id): Path<String>) -> Response {
    handle_result(state.logs.get_bounds(&LogId::from(log_id)).await)
}

/// `GET /api/logs/{log_id}/image`, the JPEG preview
pub async fn get_log_image(State(state): State<AppState>, Path(log_id): Path<String>) -> Response {
    match state.logs.get_preview_image(&LogId::from(log_id)).await {
        Ok(preview) => (
            [
                (header::CONTENT_TYPE, preview.mime_type),
                (header::CACHE_CONTROL, "public, max-age=3600"),
            ],
            preview.bytes.clone(),
        )
            .into_response(),
        Err(e) => handle_error(e),
    }
}

/// `GET /api/logs/{log_id}/annotations/{category}`
pub async fn get_log_annotations(
    State(state): State<AppState>,
    Path((log_id, category)): Path<(String, String)>,
) -> Response {
    let result: AppResult<AnnotationSet> = async {
        let category: AnnotationCategory = category
            .parse()
            .map_err(AppError::invalid_input)?;
        state.logs.get_annotations(&LogId::from(log_id), category).await
    }
    .await;
    handle_result(result)
}

/// `GET /api/logs/{log_id}/imagery?radius=`, images along the trajectory
pub async fn get_log_imagery(
    State(state): State<AppState>,
    Path(log_id): Path<String>,
    ApiQuery(params): ApiQuery<RadiusParams>,
) -> Response {
    let result = async {
        let radius = validate_radius(params.radius, state.config.imagery.default_radius_m)?;
        let trajectory = state.logs.get_trajectory(&LogId::from(log_id)).await?;
        let candidates = state.imagery.search_along(&trajectory, radius).await;
        Ok::<_, AppError>(ImagerySearchResponse::new(radius, &candidates))
    }
    .await;
    handle_result(result)
}
