use std::sync::Arc;

use minijinja::Environment;

use crate::config::ServerConfig;
use crate::core::{CacheState, ConversionService};
use crate::templates;

/// Application state that can be shared across handlers
///
/// Built once before the listener starts and never mutated afterwards.
#[derive(Clone, Debug)]
pub struct AppState {
    pub config: ServerConfig,
    /// Provider client and voice catalog loaded at startup
    pub cache: Arc<CacheState>,
    /// Upload-and-conversion pipeline
    pub conversion: ConversionService,
    /// Compiled page templates
    pub templates: Arc<Environment<'static>>,
}

impl AppState {
    /// Initialize the startup cache from configuration and build the state
    pub async fn new(config: ServerConfig) -> Arc<Self> {
        let cache = CacheState::initialize(&config).await;

        if let Some(reason) = &cache.startup_error {
            tracing::warn!("Starting in degraded mode: {}", reason);
        }

        Self::with_cache(config, cache)
    }

    /// Build the state around an already initialized cache
    pub fn with_cache(config: ServerConfig, cache: CacheState) -> Arc<Self> {
        let cache = Arc::new(cache);
        let conversion = ConversionService::from_config(&config, cache.clone());

        // An empty environment makes page renders fail with a 500
        let templates = templates::create_environment().unwrap_or_else(|e| {
            tracing::error!("Failed to compile page templates: {}", e);
            Environment::new()
        });

        Arc::new(Self {
            config,
            cache,
            conversion,
            templates: Arc::new(templates),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_does_not_leak_api_key() {
        let mut config = ServerConfig::default();
        config.elevenlabs_api_key = Some("sk-live-secret".to_string());

        let state = AppState::with_cache(config, CacheState::degraded("offline"));
        assert!(!format!("{state:?}").contains("sk-live-secret"));
    }
}
