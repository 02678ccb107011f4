use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers::{api, convert, home};
use crate::state::AppState;
use std::sync::Arc;

/// Create the router for the page and API endpoints
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(home::get_home))
        .route("/convert", post(convert::convert_voice))
        .route("/health", get(api::health_check))
        .layer(TraceLayer::new_for_http())
}
