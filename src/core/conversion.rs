//! Upload-and-conversion pipeline
//!
//! `validate -> stage -> (enabled?) -> resolve client -> convert -> publish`.
//! The staging file is owned by the pipeline and released on every path.

use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use futures::Stream;
use tracing::{info, warn};

use super::cache::CacheState;
use super::converter::{AudioInput, ConverterError};
use super::output::OutputStore;
use super::staging::StagingFile;
use crate::config::ServerConfig;
use crate::errors::{AppError, AppResult};

pub const INVALID_FILE_TYPE_MESSAGE: &str = "Invalid file type. Please upload an audio file.";
pub const NOT_IMPLEMENTED_MESSAGE: &str =
    "Voice conversion service is currently not implemented. Please check back later.";
pub const CLIENT_UNAVAILABLE_MESSAGE: &str =
    "Voice conversion provider is not available. Please check the API key configuration.";

/// Incoming audio upload: declared type, caller file name and byte stream
pub struct Upload<S> {
    pub content_type: Option<String>,
    pub original_filename: Option<String>,
    pub stream: S,
}

/// Upload that passed validation and sits in a staging file
#[derive(Debug)]
pub struct StagedUpload {
    pub file: StagingFile,
    pub content_type: String,
    pub original_filename: Option<String>,
}

/// Successful conversion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedAudio {
    pub url: String,
    pub file_name: String,
}

pub type ConversionResult = AppResult<ConvertedAudio>;

/// Check the declared MIME type of an upload
///
/// Returns the normalized type (trimmed, lowercase) when it is `audio/*`.
pub fn validate_content_type(content_type: Option<&str>) -> AppResult<String> {
    let normalized = content_type
        .map(|ct| ct.trim().to_ascii_lowercase())
        .unwrap_or_default();

    if normalized.starts_with("audio/") {
        Ok(normalized)
    } else {
        Err(AppError::InvalidInput(INVALID_FILE_TYPE_MESSAGE.to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct ConversionSettings {
    pub enabled: bool,
    pub staging_dir: PathBuf,
    pub max_upload_bytes: u64,
    pub output_extension: String,
}

impl ConversionSettings {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            enabled: config.conversion_enabled,
            staging_dir: config.staging_dir(),
            max_upload_bytes: config.max_upload_bytes(),
            output_extension: config.output_extension(),
        }
    }
}

/// Runs conversions against the provider held in the startup cache
#[derive(Debug, Clone)]
pub struct ConversionService {
    settings: ConversionSettings,
    cache: Arc<CacheState>,
    output: OutputStore,
}

impl ConversionService {
    pub fn new(settings: ConversionSettings, cache: Arc<CacheState>, output: OutputStore) -> Self {
        Self {
            settings,
            cache,
            output,
        }
    }

    pub fn from_config(config: &ServerConfig, cache: Arc<CacheState>) -> Self {
        Self::new(
            ConversionSettings::from_config(config),
            cache,
            OutputStore::new(config.output_dir(), config.output_url_prefix()),
        )
    }

    pub fn settings(&self) -> &ConversionSettings {
        &self.settings
    }

    pub fn output(&self) -> &OutputStore {
        &self.output
    }

    /// Validate an upload and copy it into a private staging file
    ///
    /// Rejects non-audio types before anything touches the disk.
    pub async fn stage<S, E>(&self, upload: Upload<S>) -> AppResult<StagedUpload>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: std::fmt::Display,
    {
        let content_type = validate_content_type(upload.content_type.as_deref())?;

        let file = StagingFile::create_from_stream(
            &self.settings.staging_dir,
            upload.stream,
            self.settings.max_upload_bytes,
        )
        .await?;

        Ok(StagedUpload {
            file,
            content_type,
            original_filename: upload.original_filename,
        })
    }

    /// Convert a staged upload and release its staging file afterwards
    pub async fn convert(&self, staged: StagedUpload, voice_id: &str) -> ConversionResult {
        let StagedUpload {
            file,
            content_type,
            original_filename,
        } = staged;

        let result = self
            .convert_staged(&file, content_type, original_filename.as_deref(), voice_id)
            .await;

        if let Err(e) = file.close() {
            warn!(error = %e, "Failed to remove staging file");
        }

        result
    }

    /// Full pipeline for one request
    pub async fn handle<S, E>(&self, upload: Upload<S>, voice_id: &str) -> ConversionResult
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: std::fmt::Display,
    {
        let staged = self.stage(upload).await?;
        self.convert(staged, voice_id).await
    }

    async fn convert_staged(
        &self,
        file: &StagingFile,
        content_type: String,
        original_filename: Option<&str>,
        voice_id: &str,
    ) -> ConversionResult {
        if !self.settings.enabled {
            return Err(AppError::NotImplemented(NOT_IMPLEMENTED_MESSAGE.to_string()));
        }

        let client = self
            .cache
            .client()
            .ok_or_else(|| AppError::ServiceUnavailable(CLIENT_UNAVAILABLE_MESSAGE.to_string()))?;

        let data = file
            .read_all()
            .await
            .map_err(|e| AppError::InternalError(format!("Failed to read staging file: {e}")))?;

        let audio = AudioInput { data, content_type };
        let converted = client
            .convert(audio, voice_id)
            .await
            .map_err(|e| match e {
                ConverterError::Unsupported(_) => {
                    AppError::NotImplemented(NOT_IMPLEMENTED_MESSAGE.to_string())
                }
                other => AppError::InternalError(format!(
                    "{} conversion failed: {other}",
                    client.provider_name()
                )),
            })?;

        let published = self
            .output
            .publish(converted, &self.settings.output_extension)
            .await
            .map_err(|e| AppError::InternalError(format!("Failed to write converted audio: {e}")))?;

        info!(
            voice_id,
            upload = original_filename.unwrap_or("<unnamed>"),
            bytes_in = file.len(),
            output = %published.file_name,
            "Voice conversion completed"
        );

        Ok(ConvertedAudio {
            url: published.url,
            file_name: published.file_name,
        })
    }
}
