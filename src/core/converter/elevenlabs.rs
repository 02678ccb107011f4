//! ElevenLabs speech-to-speech provider
//!
//! Talks to two REST endpoints:
//! - `GET  {base}/v1/voices` for the voice catalog
//! - `POST {base}/v1/speech-to-speech/{voice_id}` for conversion (multipart `audio` + `model_id`)

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use super::base::{AudioInput, ConverterError, ConverterResult, Voice, VoiceConverter};
use crate::config::ServerConfig;

const API_KEY_HEADER: &str = "xi-api-key";
const PROVIDER_NAME: &str = "elevenlabs";

/// ElevenLabs client settings
#[derive(Clone)]
pub struct ElevenLabsConfig {
    pub api_key: String,
    pub base_url: String,
    pub model_id: String,
    pub output_format: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for ElevenLabsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElevenLabsConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model_id", &self.model_id)
            .field("output_format", &self.output_format)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Drop for ElevenLabsConfig {
    fn drop(&mut self) {
        use zeroize::Zeroize;
        self.api_key.zeroize();
    }
}

impl ElevenLabsConfig {
    /// Build client settings from the server configuration
    pub fn from_server_config(config: &ServerConfig) -> ConverterResult<Self> {
        let api_key = config
            .get_api_key(PROVIDER_NAME)
            .map_err(ConverterError::InvalidConfiguration)?;

        Ok(Self {
            api_key,
            base_url: config.elevenlabs_base_url.clone(),
            model_id: config.conversion_model_id.clone(),
            output_format: config.conversion_output_format.clone(),
            timeout: Duration::from_secs(config.provider_timeout_seconds),
        })
    }
}

#[derive(Debug, Deserialize)]
struct VoicesResponse {
    #[serde(default)]
    voices: Vec<VoiceEntry>,
}

#[derive(Debug, Deserialize)]
struct VoiceEntry {
    voice_id: String,
    name: String,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    preview_url: Option<String>,
}

impl From<VoiceEntry> for Voice {
    fn from(entry: VoiceEntry) -> Self {
        Voice {
            id: entry.voice_id,
            name: entry.name,
            category: entry.category,
            preview_url: entry.preview_url,
        }
    }
}

/// ElevenLabs HTTP client
#[derive(Debug)]
pub struct ElevenLabsClient {
    config: ElevenLabsConfig,
    http_client: reqwest::Client,
}

impl ElevenLabsClient {
    /// Create a client; fails when the API key is blank or the HTTP client cannot be built
    pub fn new(config: ElevenLabsConfig) -> ConverterResult<Self> {
        if config.api_key.trim().is_empty() {
            return Err(ConverterError::InvalidConfiguration(
                "ElevenLabs API key is empty".to_string(),
            ));
        }

        // Reject a malformed base URL up front rather than on first request
        Url::parse(&config.base_url).map_err(|e| {
            ConverterError::InvalidConfiguration(format!(
                "Invalid ElevenLabs base URL '{}': {e}",
                config.base_url
            ))
        })?;

        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                ConverterError::InvalidConfiguration(format!("Failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Build `{base}/seg1/seg2/...` with each segment percent-encoded
    fn endpoint(&self, segments: &[&str]) -> ConverterResult<Url> {
        let mut url = Url::parse(&self.config.base_url).map_err(|e| {
            ConverterError::InvalidConfiguration(format!("Invalid ElevenLabs base URL: {e}"))
        })?;

        {
            let mut path = url.path_segments_mut().map_err(|_| {
                ConverterError::InvalidConfiguration(
                    "ElevenLabs base URL cannot be a base".to_string(),
                )
            })?;
            path.pop_if_empty().extend(segments);
        }

        Ok(url)
    }

    async fn error_from_response(response: reqwest::Response) -> ConverterError {
        let status = response.status().as_u16();
        let message = response.text().await.unwrap_or_default();
        ConverterError::Api { status, message }
    }
}

#[async_trait]
impl VoiceConverter for ElevenLabsClient {
    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }

    async fn list_voices(&self) -> ConverterResult<Vec<Voice>> {
        let url = self.endpoint(&["v1", "voices"])?;
        debug!(%url, "Fetching ElevenLabs voice catalog");

        let response = self
            .http_client
            .get(url)
            .header(API_KEY_HEADER, &self.config.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let body: VoicesResponse = response
            .json()
            .await
            .map_err(|e| ConverterError::InvalidResponse(format!("voices payload: {e}")))?;

        let voices: Vec<Voice> = body.voices.into_iter().map(Voice::from).collect();
        info!(count = voices.len(), "Loaded ElevenLabs voices");
        Ok(voices)
    }

    async fn convert(&self, audio: AudioInput, voice_id: &str) -> ConverterResult<Bytes> {
        let url = self.endpoint(&["v1", "speech-to-speech", voice_id])?;

        debug!(
            voice_id,
            bytes = audio.data.len(),
            content_type = %audio.content_type,
            model = %self.config.model_id,
            "ElevenLabs speech-to-speech request"
        );

        let part = Part::bytes(audio.data.to_vec())
            .file_name("audio")
            .mime_str(&audio.content_type)
            .map_err(|e| {
                ConverterError::InvalidConfiguration(format!(
                    "Invalid audio content type '{}': {e}",
                    audio.content_type
                ))
            })?;

        let form = Form::new()
            .part("audio", part)
            .text("model_id", self.config.model_id.clone());

        let response = self
            .http_client
            .post(url)
            .query(&[("output_format", self.config.output_format.as_str())])
            .header(API_KEY_HEADER, &self.config.api_key)
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let data = response.bytes().await?;
        if data.is_empty() {
            return Err(ConverterError::InvalidResponse(
                "provider returned empty audio".to_string(),
            ));
        }

        Ok(data)
    }
}
