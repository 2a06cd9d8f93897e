//! Static asset serving (HTML, scripts, sounds)

use std::path::Path;

use axum::{
    handler::HandlerWithoutStateExt,
    http::Uri,
    response::{IntoResponse, Response},
    Router,
};
use tower_http::services::ServeDir;

use crate::http::routes::AppError;

/// Fallback routes resolving request paths to files under `root`.
/// `/` and other directories resolve to their `index.html`.
/// Traversal outside `root` is rejected by `ServeDir`.
pub fn asset_routes<S>(root: &Path) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let files = ServeDir::new(root)
        .append_index_html_on_directories(true)
        .not_found_service(asset_not_found.into_service());

    Router::new().fallback_service(files)
}

async fn asset_not_found(uri: Uri) -> Response {
    AppError::NotFound(uri.path().to_string()).into_response()
}
