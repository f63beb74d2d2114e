//! Centralized error handling for the trajectory service
//!
//! Two layers of errors are used:
//!
//! - [`LoadError`]: cloneable failures produced while loading derived data for
//!   a log. These travel through the memo caches, where a single load result
//!   may be fanned out to several waiting requests.
//! - [`AppError`]: the top-level error returned by services and mapped onto
//!   HTTP responses by the web layer.
//!
//! # Usage
//!
//! ```rust
//! use zodmap::errors::{AppError, AppResult};
//!
//! fn lookup(known: bool) -> AppResult<()> {
//!     if known {
//!         Ok(())
//!     } else {
//!         Err(AppError::not_found("log", "000001"))
//!     }
//! }
//! ```

pub mod types;

pub use types::*;

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Convenience type alias for cache load results
pub type LoadResult<T> = Result<T, LoadError>;
