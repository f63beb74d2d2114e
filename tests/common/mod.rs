#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Json, Router,
    body::Body,
    extract::{Path, Query, State},
    http::{HeaderMap, Request, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use bytes::Bytes;
use image::{ImageFormat, Rgb, RgbImage};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::io::Cursor;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

use zodmap::{
    config::{Config, ImageryConfig},
    dataset::FsDataset,
    imagery::GeoImageSearch,
    models::{GeoPoint, GeoSearchCandidate, Trajectory},
    services::LogService,
    web::{AppState, create_router},
};

pub const FRAMES_DIR: &str = "single_frames";

/// Dataset laid out on disk in a temporary directory
pub struct TestDataset {
    pub root: TempDir,
}

impl TestDataset {
    pub fn new() -> Self {
        let root = TempDir::new().unwrap();
        std::fs::create_dir_all(root.path().join(FRAMES_DIR)).unwrap();
        Self { root }
    }

    pub fn log_dir(&self, log_id: &str) -> std::path::PathBuf {
        self.root.path().join(FRAMES_DIR).join(log_id)
    }

    /// A log whose `oxts.json` holds `points` direct fixes heading north-east
    pub fn add_log(&self, log_id: &str, points: usize) {
        let fixes: Vec<Value> = (0..points)
            .map(|i| json!({"lat": 57.70 + i as f64 * 1e-5, "lon": 11.90 + i as f64 * 2e-5}))
            .collect();
        self.write_positions(log_id, &json!({ "fixes": fixes }).to_string());
    }

    /// A log recorded as relative poses around `origin`
    pub fn add_pose_log(&self, log_id: &str, origin: GeoPoint, offsets: &[(f64, f64)]) {
        let poses: Vec<Value> = offsets
            .iter()
            .map(|(east, north)| {
                json!([[1.0, 0.0, 0.0, east], [0.0, 1.0, 0.0, north], [0.0, 0.0, 1.0, 0.0], [0.0, 0.0, 0.0, 1.0]])
            })
            .collect();
        let body = json!({"origin": {"lat": origin.lat, "lon": origin.lon}, "poses": poses});
        self.write_positions(log_id, &body.to_string());
    }

    pub fn add_broken_log(&self, log_id: &str) {
        self.write_positions(log_id, "{ this is not json");
    }

    pub fn write_positions(&self, log_id: &str, contents: &str) {
        let dir = self.log_dir(log_id);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("oxts.json"), contents).unwrap();
    }

    pub fn add_preview(&self, log_id: &str, width: u32, height: u32) {
        let dir = self.log_dir(log_id).join("camera_front_blur");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("frame_000.png"), png_bytes(width, height)).unwrap();
    }

    pub fn add_annotations(&self, log_id: &str, category: &str, contents: &str) {
        let dir = self.log_dir(log_id).join("annotations");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(format!("{category}.json")), contents).unwrap();
    }

    pub fn source(&self) -> Arc<FsDataset> {
        Arc::new(FsDataset::new(self.root.path(), FRAMES_DIR))
    }

    pub fn config(&self) -> Config {
        let mut config = Config::default();
        config.dataset.root = self.root.path().to_path_buf();
        config.logging.log_dir = None;
        config
    }
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([30, 120, 200]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

/// In-memory image search returning a fixed candidate list
#[derive(Default)]
pub struct StaticImagery {
    pub candidates: Vec<GeoSearchCandidate>,
    pub calls: AtomicUsize,
    pub last_radius: Mutex<Option<f64>>,
}

impl StaticImagery {
    pub fn with_candidates(candidates: Vec<GeoSearchCandidate>) -> Self {
        Self {
            candidates,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GeoImageSearch for StaticImagery {
    async fn search_near(
        &self,
        _point: GeoPoint,
        radius_m: f64,
        limit: usize,
    ) -> Vec<GeoSearchCandidate> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_radius.lock().unwrap() = Some(radius_m);
        self.candidates.iter().take(limit).cloned().collect()
    }

    async fn search_along(&self, _trajectory: &Trajectory, radius_m: f64) -> Vec<GeoSearchCandidate> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_radius.lock().unwrap() = Some(radius_m);
        self.candidates.clone()
    }
}

pub fn build_app(config: Config, dataset: Arc<FsDataset>, imagery: Arc<dyn GeoImageSearch>) -> Router {
    let logs = LogService::new(dataset, &config.cache, config.dataset.show_trajectory).unwrap();
    create_router(AppState {
        config: Arc::new(config),
        logs,
        imagery,
    })
}

/// GET `uri` and parse the JSON body
pub async fn send_get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let (status, _, body) = send_get_raw(app, uri).await;
    let json = if body.is_empty() {
        json!({})
    } else {
        serde_json::from_slice(&body).unwrap_or(json!({}))
    };
    (status, json)
}

pub async fn send_get_raw(app: &Router, uri: &str) -> (StatusCode, HeaderMap, Bytes) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, headers, body)
}

/// How the fake image service answers `/images`
#[derive(Debug, Clone)]
pub enum FakeMode {
    /// Images at the given (lat, lon); thumbnails served by this server
    Images(Vec<(String, f64, f64)>),
    Status(StatusCode),
    Malformed,
    Slow(Duration),
}

#[derive(Clone)]
struct FakeState {
    mode: FakeMode,
    base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub params: HashMap<String, String>,
    pub authorization: Option<String>,
}

/// Image service stand-in listening on 127.0.0.1
pub struct FakeImageService {
    pub base_url: String,
    pub requests: Arc<Mutex<Vec<RecordedRequest>>>,
    handle: tokio::task::JoinHandle<()>,
}

impl FakeImageService {
    pub async fn start(mode: FakeMode) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr: SocketAddr = listener.local_addr().unwrap();
        let base_url = format!("http://{addr}");
        let requests = Arc::new(Mutex::new(Vec::new()));

        let state = FakeState {
            mode,
            base_url: base_url.clone(),
            requests: requests.clone(),
        };
        let app = Router::new()
            .route("/images", get(fake_images))
            .route("/thumbs/{id}", get(fake_thumbnail))
            .with_state(state);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            requests,
            handle,
        }
    }

    pub fn imagery_config(&self) -> ImageryConfig {
        ImageryConfig {
            base_url: self.base_url.clone(),
            access_token: "test-token".to_string(),
            request_timeout: Duration::from_secs(5),
            ..ImageryConfig::default()
        }
    }

    pub fn recorded(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Drop for FakeImageService {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn fake_images(
    State(state): State<FakeState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    state.requests.lock().unwrap().push(RecordedRequest {
        params,
        authorization: headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    });

    match state.mode {
        FakeMode::Images(images) => {
            let data: Vec<Value> = images
                .iter()
                .map(|(id, lat, lon)| {
                    json!({
                        "id": id,
                        "geometry": {"type": "Point", "coordinates": [lon, lat]},
                        "compass_angle": 90.0,
                        "captured_at": 1_600_000_000_000_i64,
                        "thumb_1024_url": format!("{}/thumbs/{}", state.base_url, id),
                        "thumb_original_url": format!("{}/thumbs/{}?size=original", state.base_url, id),
                    })
                })
                .collect();
            Json(json!({ "data": data })).into_response()
        }
        FakeMode::Status(status) => (status, "upstream failure").into_response(),
        FakeMode::Malformed => (
            [(header::CONTENT_TYPE, "application/json")],
            "{\"data\": [ truncated",
        )
            .into_response(),
        FakeMode::Slow(delay) => {
            tokio::time::sleep(delay).await;
            Json(json!({ "data": [] })).into_response()
        }
    }
}

/// Ids starting with `broken` get undecodable bytes, ids starting with
/// `slow` answer after three seconds
async fn fake_thumbnail(Path(id): Path<String>) -> Response {
    if id.starts_with("slow") {
        tokio::time::sleep(Duration::from_secs(3)).await;
    }
    if id.starts_with("broken") {
        return ([(header::CONTENT_TYPE, "image/jpeg")], b"not an image".to_vec()).into_response();
    }
    ([(header::CONTENT_TYPE, "image/png")], png_bytes(6, 4)).into_response()
}
