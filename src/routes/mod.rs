pub mod api;

use std::sync::Arc;

use axum::{Router, extract::DefaultBodyLimit};
use tower_http::services::ServeDir;

use crate::config::STATIC_URL_PREFIX;
use crate::state::AppState;

/// Room for multipart boundaries and the `voice_id` part on top of the file limit
const MULTIPART_OVERHEAD_BYTES: u64 = 1024 * 1024;

/// Assemble the application: endpoints, static files and the request body limit
///
/// Cross-cutting layers (CORS, rate limiting, security headers) are added by the binary.
pub fn create_app(state: Arc<AppState>) -> Router {
    let body_limit = state
        .config
        .max_upload_bytes()
        .saturating_add(MULTIPART_OVERHEAD_BYTES);
    let body_limit = usize::try_from(body_limit).unwrap_or(usize::MAX);

    let static_files = ServeDir::new(&state.config.static_dir);

    api::create_api_router()
        .nest_service(STATIC_URL_PREFIX, static_files)
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
