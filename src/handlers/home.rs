use std::sync::Arc;

use axum::{extract::State, response::Html};
use minijinja::{Environment, context};

use crate::core::Voice;
use crate::errors::{AppError, AppResult};
use crate::state::AppState;
use crate::templates::INDEX_TEMPLATE;

/// Render the upload page for the given voice list and optional startup error
pub fn render_index(
    env: &Environment<'_>,
    voices: &[Voice],
    error: Option<&str>,
) -> Result<String, minijinja::Error> {
    env.get_template(INDEX_TEMPLATE)?
        .render(context! { voices => voices, error => error })
}

/// Home page with the upload form
pub async fn get_home(State(state): State<Arc<AppState>>) -> AppResult<Html<String>> {
    let cache = &state.cache;
    let error = if cache.voices.is_empty() {
        cache.startup_error.as_deref()
    } else {
        None
    };

    render_index(&state.templates, &cache.voices, error)
        .map(Html)
        .map_err(|e| AppError::InternalError(format!("Failed to render home page: {e}")))
}
