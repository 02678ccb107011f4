//! Server Startup Tests
//!
//! Tests for startup cache initialization and degraded-mode behavior.
//! The server must come up and serve the home page whether or not the voice
//! provider is configured or reachable.

use std::net::TcpListener;
use std::path::Path;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use tempfile::TempDir;
use tower::util::ServiceExt;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use voice_converter::{ServerConfig, core::cache::MISSING_API_KEY_MESSAGE, routes, state::AppState};

/// Helper function to create a minimal test configuration
fn create_minimal_config(port: u16, root: &Path) -> ServerConfig {
    let mut config = ServerConfig::default();
    config.host = "127.0.0.1".to_string();
    config.port = port;
    config.static_dir = root.join("static");
    config.staging_dir = Some(root.to_path_buf());
    config
}

/// Find an available port for testing
fn find_available_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind to random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Test that the server can start with minimal configuration (no API key)
#[tokio::test]
async fn test_minimal_config_boot() {
    let root = TempDir::new().unwrap();
    let config = create_minimal_config(find_available_port(), root.path());

    // Create app state - this should succeed even without an API key
    let app_state = AppState::new(config).await;

    assert!(app_state.cache.voices.is_empty());
    assert!(!app_state.cache.has_client());
    assert_eq!(
        app_state.cache.startup_error.as_deref(),
        Some(MISSING_API_KEY_MESSAGE)
    );

    let app = routes::create_app(app_state);

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Home page still renders in degraded mode
    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_string(response).await;
    assert!(html.contains("upload-form"));
    assert!(html.contains(MISSING_API_KEY_MESSAGE));
}

/// Test that voices are loaded from the provider at startup
#[tokio::test]
async fn test_boot_loads_voice_catalog() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/voices"))
        .and(header("xi-api-key", "startup-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "voices": [
                {"voice_id": "21m00Tcm4TlvDq8ikWAM", "name": "Rachel", "category": "premade"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let root = TempDir::new().unwrap();
    let mut config = create_minimal_config(find_available_port(), root.path());
    config.elevenlabs_api_key = Some("startup-key".to_string());
    config.elevenlabs_base_url = server.uri();

    let app_state = AppState::new(config).await;
    assert!(app_state.cache.has_client());
    assert_eq!(app_state.cache.voices.len(), 1);
    assert!(app_state.cache.startup_error.is_none());

    let app = routes::create_app(app_state);
    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_string(response).await;
    assert!(html.contains(r#"<option value="21m00Tcm4TlvDq8ikWAM">Rachel (premade)</option>"#));
    assert!(!html.contains("error-banner"));
}

/// Test that a failing provider leaves the server degraded instead of crashing
#[tokio::test]
async fn test_boot_with_provider_error_is_degraded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/voices"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream failure"))
        .mount(&server)
        .await;

    let root = TempDir::new().unwrap();
    let mut config = create_minimal_config(find_available_port(), root.path());
    config.elevenlabs_api_key = Some("startup-key".to_string());
    config.elevenlabs_base_url = server.uri();

    let app_state = AppState::new(config).await;
    assert!(!app_state.cache.has_client());
    assert!(app_state.cache.voices.is_empty());

    let app = routes::create_app(app_state);
    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_string(response).await;
    assert!(html.contains("Could not load voices from elevenlabs"));
}

/// Test that the server correctly parses addresses
#[tokio::test]
async fn test_address_parsing() {
    let root = TempDir::new().unwrap();
    let port = find_available_port();
    let config = create_minimal_config(port, root.path());

    let addr: std::net::SocketAddr = config.address().parse().unwrap();
    assert_eq!(addr.port(), port);
    assert!(addr.ip().is_loopback());
}
