//! Configuration default values
//!
//! All defaults live here so they can be changed in one place.

// Web server defaults
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;

// Dataset defaults
pub const DEFAULT_DATASET_ROOT: &str = "./data/zod";
pub const DEFAULT_FRAMES_DIR: &str = "single_frames";
pub const DEFAULT_SHOW_TRAJECTORY: bool = true;

// Cache defaults
pub const DEFAULT_TRAJECTORY_CAPACITY: usize = 64;
pub const DEFAULT_PREVIEW_CAPACITY: usize = 64;
pub const DEFAULT_PREVIEW_JPEG_QUALITY: u8 = 85;

// Street-level imagery defaults
pub const DEFAULT_IMAGERY_BASE_URL: &str = "https://graph.mapillary.com";
pub const DEFAULT_IMAGERY_TIMEOUT: &str = "30s";
pub const DEFAULT_SEARCH_RADIUS_M: f64 = 10.0;
pub const DEFAULT_CLOSEST_RADIUS_M: f64 = 100.0;
pub const DEFAULT_CLOSEST_LIMIT: usize = 20;
pub const DEFAULT_MAX_RESULTS: usize = 2000;
pub const DEFAULT_DOWNLOAD_IMAGES: bool = true;
pub const DEFAULT_DOWNLOAD_CONCURRENCY: usize = 8;

// Logging defaults
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_LOG_DIR: &str = "logs";

/// Environment variable overriding `imagery.access_token`
pub const IMAGERY_TOKEN_ENV: &str = "ZODMAP_IMAGERY_TOKEN";
