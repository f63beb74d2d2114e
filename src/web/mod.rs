//! Web layer module
//!
//! Thin axum handlers over [`LogService`] and the imagery search client.
//! Handlers validate parameters, delegate, and map errors through
//! [`responses::handle_error`].

use anyhow::Result;
use axum::{
    Router,
    http::{HeaderValue, Method},
    routing::get,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::{config::Config, imagery::GeoImageSearch, services::LogService};

pub mod extractors;
pub mod handlers;
pub mod responses;

pub use extractors::{ApiQuery, LogListParams};
pub use responses::{ApiResponse, handle_error, handle_result};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub logs: LogService,
    pub imagery: Arc<dyn GeoImageSearch>,
}

/// Web server configuration and setup
pub struct WebServer {
    app: Router,
    addr: SocketAddr,
}

impl WebServer {
    pub fn new(state: AppState) -> Result<Self> {
        let addr: SocketAddr =
            format!("{}:{}", state.config.web.host, state.config.web.port).parse()?;
        let app = create_router(state);
        Ok(Self { app, addr })
    }

    /// Serve until SIGINT/SIGTERM
    pub async fn serve(self) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(&self.addr).await?;
        info!("Web server listening on http://{}", self.addr);
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        info!("Web server stopped");
        Ok(())
    }
}

/// Build the router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.web.cors_origins);

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .nest("/api", api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        // Driving logs
        .route("/logs", get(handlers::logs::list_logs))
        .route("/logs/{log_id}", get(handlers::logs::get_log))
        .route("/logs/{log_id}/bounds", get(handlers::logs::get_log_bounds))
        .route("/logs/{log_id}/image", get(handlers::logs::get_log_image))
        .route(
            "/logs/{log_id}/annotations/{category}",
            get(handlers::logs::get_log_annotations),
        )
        .route("/logs/{log_id}/imagery", get(handlers::logs::get_log_imagery))
        // Street-level imagery
        .route("/imagery/near", get(handlers::imagery::search_near))
        .route("/imagery/closest", get(handlers::imagery::closest))
}

/// Permissive when no origins are configured
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring invalid CORS origin '{}': {}", origin, e);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers(Any)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT (Ctrl+C), shutting down gracefully"),
        _ = terminate => info!("Received SIGTERM, shutting down gracefully"),
    }
}
