//! HTTP response types and error mapping
//!
//! Every JSON endpoint answers with the same [`ApiResponse`] envelope so
//! clients can check `success` before looking at `data` or `error`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::errors::{AppError, AppResult};

/// Standard API response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl<T> ApiResponse<T>
where
    T: Serialize,
{
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn error(message: String) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(message),
            timestamp: chrono::Utc::now(),
        }
    }
}

impl<T> IntoResponse for ApiResponse<T>
where
    T: Serialize,
{
    fn into_response(self) -> Response {
        let status = if self.success {
            StatusCode::OK
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        (status, Json(self)).into_response()
    }
}

/// Convert an AppResult into a JSON response
pub fn handle_result<T>(result: AppResult<T>) -> Response
where
    T: Serialize,
{
    match result {
        Ok(data) => ok(data).into_response(),
        Err(error) => handle_error(error),
    }
}

/// Map an AppError to a status code and client-facing message.
///
/// Server-side failures get a generic message; their detail only goes to
/// the log.
pub fn handle_error(error: AppError) -> Response {
    let (status, message) = match &error {
        AppError::NotFound { resource, id } => (
            StatusCode::NOT_FOUND,
            format!("{resource} with id '{id}' not found"),
        ),
        AppError::InvalidInput { message } => (StatusCode::BAD_REQUEST, message.clone()),
        AppError::DataCorruption { resource, id, .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to load data for {resource} '{id}'"),
        ),
        AppError::ExternalService { service, .. } => (
            StatusCode::BAD_GATEWAY,
            format!("External service error ({service})"),
        ),
        AppError::Http(_) => (
            StatusCode::BAD_GATEWAY,
            "External service communication failed".to_string(),
        ),
        AppError::Configuration { .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Server configuration error".to_string(),
        ),
        AppError::Internal { .. }
        | AppError::Io(_)
        | AppError::Json(_)
        | AppError::Csv(_)
        | AppError::Image(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error".to_string(),
        ),
    };

    if status.is_server_error() {
        error!("Request failed with {}: {}", status, error);
    }

    (status, Json(ApiResponse::<()>::error(message))).into_response()
}

pub fn ok<T: Serialize>(data: T) -> impl IntoResponse {
    (StatusCode::OK, Json(ApiResponse::success(data)))
}

pub fn bad_request(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiResponse::<()>::error(message.to_string())),
    )
        .into_response()
}
