//! HTTP route definitions

use axum::{
    extract::State,
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde::Serialize;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::warn;

use crate::app::AppState;
use crate::http::assets::asset_routes;
use crate::util::time::uptime_secs;
use crate::ws::handler::ws_handler;

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_handler))
        .route("/ws", get(ws_handler));

    let router = Router::new()
        .merge(api_routes)
        .merge(asset_routes(&state.config.asset_root))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http());

    // CORS only when origins are configured (comma-separated CLIENT_ORIGIN)
    let router = match cors_layer(&state.config.client_origins) {
        Some(cors) => router.layer(cors),
        None => router,
    };

    router.with_state(state)
}

fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    let allowed_origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Skipping invalid CORS origin");
                None
            }
        })
        .collect();

    if allowed_origins.is_empty() {
        return None;
    }

    Some(
        CorsLayer::new()
            .allow_origin(allowed_origins)
            .allow_methods([Method::GET, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE]),
    )
}

// ============================================================================
// Health endpoint
// ============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    connections: usize,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: uptime_secs(),
        connections: state.hub.registered_connections(),
    })
}

// ============================================================================
// Error handling
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            AppError::NotFound(path) => (StatusCode::NOT_FOUND, format!("{} not found", path)),
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, Json(body)).into_response()
    }
}
