//! Error type definitions for the trajectory service

use thiserror::Error;

/// Top-level application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Unknown log id or missing derived resource
    #[error("Not found: {resource} with id {id}")]
    NotFound { resource: String, id: String },

    /// Dataset present but unreadable or empty
    #[error("Data corruption in {resource} {id}: {message}")]
    DataCorruption {
        resource: String,
        id: String,
        message: String,
    },

    /// A caller violated a precondition
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// External image service failures
    #[error("External service error: {service} - {message}")]
    ExternalService { service: String, message: String },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Generic internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },

    /// Filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Image decoding/encoding errors
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// CSV export errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Failures while loading per-log derived data.
///
/// Cloneable so one result can be handed to every request waiting on the
/// same cache key.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoadError {
    #[error("Unknown log id: {log_id}")]
    NotFound { log_id: String },

    #[error("Log {log_id} has unusable data: {message}")]
    DataCorruption { log_id: String, message: String },

    #[error("No {what} available for log {log_id}")]
    Missing { log_id: String, what: String },

    #[error("Load task failed: {message}")]
    Internal { message: String },
}

impl AppError {
    /// Create a not found error for a specific resource
    pub fn not_found<R: Into<String>, I: Into<String>>(resource: R, id: I) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: id.into(),
        }
    }

    /// Create a data corruption error for a specific resource
    pub fn data_corruption<R, I, M>(resource: R, id: I, message: M) -> Self
    where
        R: Into<String>,
        I: Into<String>,
        M: Into<String>,
    {
        Self::DataCorruption {
            resource: resource.into(),
            id: id.into(),
            message: message.into(),
        }
    }

    /// Create an invalid input error with a custom message
    pub fn invalid_input<S: Into<String>>(message: S) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create an external service error
    pub fn external_service<S: Into<String>, M: Into<String>>(service: S, message: M) -> Self {
        Self::ExternalService {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl LoadError {
    pub fn not_found<I: Into<String>>(log_id: I) -> Self {
        Self::NotFound {
            log_id: log_id.into(),
        }
    }

    pub fn corrupt<I: Into<String>, M: Into<String>>(log_id: I, message: M) -> Self {
        Self::DataCorruption {
            log_id: log_id.into(),
            message: message.into(),
        }
    }

    pub fn missing<I: Into<String>, W: Into<String>>(log_id: I, what: W) -> Self {
        Self::Missing {
            log_id: log_id.into(),
            what: what.into(),
        }
    }

    pub fn internal<M: Into<String>>(message: M) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl From<LoadError> for AppError {
    fn from(err: LoadError) -> Self {
        match err {
            LoadError::NotFound { log_id } => AppError::not_found("log", log_id),
            LoadError::DataCorruption { log_id, message } => {
                AppError::data_corruption("log", log_id, message)
            }
            LoadError::Missing { log_id, what } => AppError::not_found(what, log_id),
            LoadError::Internal { message } => AppError::Internal { message },
        }
    }
}
