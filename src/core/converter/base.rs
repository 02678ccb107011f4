use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Voice descriptor as reported by a provider catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    /// Provider voice identifier, sent back as `voice_id` on conversion
    pub id: String,
    /// Display name of the voice
    pub name: String,
    /// Provider category (e.g. "premade", "cloned")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// URL to a sample of the voice
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
}

/// Audio handed to a provider for conversion
#[derive(Debug, Clone)]
pub struct AudioInput {
    /// Raw audio bytes read back from the staging file
    pub data: Bytes,
    /// MIME type declared by the uploader (always `audio/*`)
    pub content_type: String,
}

/// Voice conversion error types
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConverterError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Provider returned HTTP {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),
}

impl From<reqwest::Error> for ConverterError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ConverterError::Request(format!("request timed out: {err}"))
        } else if err.is_decode() {
            ConverterError::InvalidResponse(err.to_string())
        } else {
            ConverterError::Request(err.to_string())
        }
    }
}

/// Result type for voice conversion operations
pub type ConverterResult<T> = Result<T, ConverterError>;

/// Narrow interface to an external speech-to-speech provider
///
/// Implementations own their HTTP client and credentials. The request pipeline
/// only ever talks to this trait, so tests can substitute an in-process fake.
#[async_trait]
pub trait VoiceConverter: Send + Sync {
    /// Short provider name used in logs and messages
    fn provider_name(&self) -> &'static str;

    /// Fetch the voice catalog
    async fn list_voices(&self) -> ConverterResult<Vec<Voice>>;

    /// Convert `audio` into the voice identified by `voice_id`
    ///
    /// Returns the converted audio bytes in the provider's configured output format.
    async fn convert(&self, audio: AudioInput, voice_id: &str) -> ConverterResult<Bytes>;
}

/// Shared handle to a provider
pub type SharedConverter = Arc<dyn VoiceConverter>;
