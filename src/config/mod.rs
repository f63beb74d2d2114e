use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

pub mod defaults;
pub mod duration_serde;

use defaults::*;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub dataset: DatasetConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub imagery: ImageryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Allowed CORS origins; empty allows any origin
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    #[serde(default = "default_dataset_root")]
    pub root: PathBuf,
    /// Sub-directory of `root` holding one directory per log
    #[serde(default = "default_frames_dir")]
    pub frames_dir: String,
    /// When false, log detail responses carry only the first point
    #[serde(default = "default_show_trajectory")]
    pub show_trajectory: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_trajectory_capacity")]
    pub trajectory_capacity: usize,
    #[serde(default = "default_preview_capacity")]
    pub preview_capacity: usize,
    #[serde(default = "default_preview_jpeg_quality")]
    pub preview_jpeg_quality: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageryConfig {
    #[serde(default = "default_imagery_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub access_token: String,
    /// Upper bound for the box query, and separately for each thumbnail
    /// download
    #[serde(
        default = "default_imagery_timeout",
        with = "duration_serde::duration"
    )]
    pub request_timeout: Duration,
    #[serde(default = "default_search_radius_m")]
    pub default_radius_m: f64,
    #[serde(default = "default_closest_radius_m")]
    pub closest_radius_m: f64,
    #[serde(default = "default_closest_limit")]
    pub closest_limit: usize,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    #[serde(default = "default_download_images")]
    pub download_images: bool,
    #[serde(default = "default_download_concurrency")]
    pub download_concurrency: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Directory for timestamped log files; stdout only when unset
    #[serde(default = "default_log_dir")]
    pub log_dir: Option<PathBuf>,
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_dataset_root() -> PathBuf {
    PathBuf::from(DEFAULT_DATASET_ROOT)
}

fn default_frames_dir() -> String {
    DEFAULT_FRAMES_DIR.to_string()
}

fn default_show_trajectory() -> bool {
    DEFAULT_SHOW_TRAJECTORY
}

fn default_trajectory_capacity() -> usize {
    DEFAULT_TRAJECTORY_CAPACITY
}

fn default_preview_capacity() -> usize {
    DEFAULT_PREVIEW_CAPACITY
}

fn default_preview_jpeg_quality() -> u8 {
    DEFAULT_PREVIEW_JPEG_QUALITY
}

fn default_imagery_base_url() -> String {
    DEFAULT_IMAGERY_BASE_URL.to_string()
}

fn default_imagery_timeout() -> Duration {
    humantime::parse_duration(DEFAULT_IMAGERY_TIMEOUT).unwrap_or(Duration::from_secs(30))
}

fn default_search_radius_m() -> f64 {
    DEFAULT_SEARCH_RADIUS_M
}

fn default_closest_radius_m() -> f64 {
    DEFAULT_CLOSEST_RADIUS_M
}

fn default_closest_limit() -> usize {
    DEFAULT_CLOSEST_LIMIT
}

fn default_max_results() -> usize {
    DEFAULT_MAX_RESULTS
}

fn default_download_images() -> bool {
    DEFAULT_DOWNLOAD_IMAGES
}

fn default_download_concurrency() -> usize {
    DEFAULT_DOWNLOAD_CONCURRENCY
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_log_dir() -> Option<PathBuf> {
    Some(PathBuf::from(DEFAULT_LOG_DIR))
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
        }
    }
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            root: default_dataset_root(),
            frames_dir: default_frames_dir(),
            show_trajectory: default_show_trajectory(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            trajectory_capacity: default_trajectory_capacity(),
            preview_capacity: default_preview_capacity(),
            preview_jpeg_quality: default_preview_jpeg_quality(),
        }
    }
}

impl Default for ImageryConfig {
    fn default() -> Self {
        Self {
            base_url: default_imagery_base_url(),
            access_token: String::new(),
            request_timeout: default_imagery_timeout(),
            default_radius_m: default_search_radius_m(),
            closest_radius_m: default_closest_radius_m(),
            closest_limit: default_closest_limit(),
            max_results: default_max_results(),
            download_images: default_download_images(),
            download_concurrency: default_download_concurrency(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            log_dir: default_log_dir(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file, writing the defaults there if it
    /// does not exist yet
    pub fn load_from_file(config_file: &str) -> Result<Self> {
        let mut config = if std::path::Path::new(&config_file).exists() {
            let contents = std::fs::read_to_string(config_file)?;
            toml::from_str(&contents)?
        } else {
            let default_config = Self::default();
            let contents = toml::to_string_pretty(&default_config)?;
            std::fs::write(config_file, contents)?;
            info!("Created default config file: {}", config_file);
            default_config
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Secrets are usually injected through the environment
    pub fn apply_env_overrides(&mut self) {
        if let Ok(token) = std::env::var(IMAGERY_TOKEN_ENV) {
            if !token.trim().is_empty() {
                self.imagery.access_token = token.trim().to_string();
            }
        }
    }
}
