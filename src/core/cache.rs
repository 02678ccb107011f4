//! Startup cache of the provider client and voice catalog
//!
//! Built once when the server starts and shared read-only afterwards. A
//! missing credential or an unreachable provider never aborts startup: the
//! cache is left in a degraded state with an empty voice list and a reason
//! that the home page displays.

use tracing::{info, warn};

use super::converter::{DEFAULT_PROVIDER, SharedConverter, Voice, create_voice_converter};
use crate::config::ServerConfig;

pub const MISSING_API_KEY_MESSAGE: &str = "Voice provider API key is not configured.";

#[derive(Clone, Default)]
pub struct CacheState {
    pub voices: Vec<Voice>,
    pub client: Option<SharedConverter>,
    pub startup_error: Option<String>,
}

impl std::fmt::Debug for CacheState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheState")
            .field("voices", &self.voices.len())
            .field(
                "client",
                &self.client.as_ref().map(|c| c.provider_name()),
            )
            .field("startup_error", &self.startup_error)
            .finish()
    }
}

impl CacheState {
    /// Degraded cache: no client, no voices, with the reason shown to users
    pub fn degraded(reason: impl Into<String>) -> Self {
        Self {
            voices: Vec::new(),
            client: None,
            startup_error: Some(reason.into()),
        }
    }

    /// Build the cache from server configuration
    pub async fn initialize(config: &ServerConfig) -> Self {
        if config.get_api_key(DEFAULT_PROVIDER).is_err() {
            warn!("ELEVENLABS_API_KEY is not set; voice conversion is unavailable");
            return Self::degraded(MISSING_API_KEY_MESSAGE);
        }

        match create_voice_converter(DEFAULT_PROVIDER, config) {
            Ok(client) => Self::from_provider(client).await,
            Err(e) => {
                warn!(error = %e, "Failed to create voice conversion client");
                Self::degraded(format!("Voice provider client could not be created: {e}"))
            }
        }
    }

    /// Populate the cache from an already constructed provider
    ///
    /// If the catalog cannot be fetched the client is discarded as well.
    pub async fn from_provider(client: SharedConverter) -> Self {
        let provider = client.provider_name();

        match client.list_voices().await {
            Ok(voices) => {
                info!(provider, count = voices.len(), "Voice catalog loaded");
                Self {
                    voices,
                    client: Some(client),
                    startup_error: None,
                }
            }
            Err(e) => {
                warn!(provider, error = %e, "Failed to load voice catalog");
                Self::degraded(format!(
                    "Could not load voices from {provider}. Please check API key and connectivity."
                ))
            }
        }
    }

    pub fn has_client(&self) -> bool {
        self.client.is_some()
    }

    pub fn client(&self) -> Option<SharedConverter> {
        self.client.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use crate::core::converter::{AudioInput, ConverterError, ConverterResult, VoiceConverter};
    use async_trait::async_trait;
    use bytes::Bytes;

    struct StaticCatalog(ConverterResult<Vec<Voice>>);

    #[async_trait]
    impl VoiceConverter for StaticCatalog {
        fn provider_name(&self) -> &'static str {
            "static"
        }

        async fn list_voices(&self) -> ConverterResult<Vec<Voice>> {
            self.0.clone()
        }

        async fn convert(&self, _audio: AudioInput, _voice_id: &str) -> ConverterResult<Bytes> {
            Err(ConverterError::Unsupported("convert".to_string()))
        }
    }

    #[tokio::test]
    async fn test_initialize_without_key_is_degraded() {
        let cache = CacheState::initialize(&ServerConfig::default()).await;

        assert!(!cache.has_client());
        assert!(cache.voices.is_empty());
        assert_eq!(cache.startup_error.as_deref(), Some(MISSING_API_KEY_MESSAGE));
    }

    #[tokio::test]
    async fn test_from_provider_loads_voices() {
        let voices = vec![Voice {
            id: "v1".to_string(),
            name: "Rachel".to_string(),
            category: None,
            preview_url: None,
        }];
        let cache = CacheState::from_provider(Arc::new(StaticCatalog(Ok(voices.clone())))).await;

        assert!(cache.has_client());
        assert_eq!(cache.voices, voices);
        assert!(cache.startup_error.is_none());
    }

    #[tokio::test]
    async fn test_from_provider_catalog_failure_drops_client() {
        let failing = StaticCatalog(Err(ConverterError::Request("connection refused".into())));
        let cache = CacheState::from_provider(Arc::new(failing)).await;

        assert!(!cache.has_client());
        assert!(cache.voices.is_empty());
        assert!(
            cache
                .startup_error
                .unwrap()
                .contains("Could not load voices from static")
        );
    }
}
