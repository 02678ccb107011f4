//! Configuration module for the Voice Converter server
//!
//! This module handles server configuration from various sources: .env files, YAML files,
//! and environment variables. Priority: YAML > ENV vars > .env values > defaults.
//!
//! # Modules
//! - `yaml`: YAML configuration file loading
//! - `merge`: Merging YAML and environment configurations
//! - `validation`: Configuration validation logic
//! - `utils`: Utility functions for configuration parsing
//!
//! # Example
//! ```rust,no_run
//! use voice_converter::config::ServerConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = ServerConfig::from_env()?;
//!
//! // Load from YAML file with environment variable overrides
//! let config_path = PathBuf::from("config.yaml");
//! let config = ServerConfig::from_file(&config_path)?;
//!
//! println!("Server listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;

mod merge;
mod utils;
mod validation;
mod yaml;

pub use utils::parse_bool;
pub use yaml::YamlConfig;

/// Default ElevenLabs API base URL
pub const DEFAULT_ELEVENLABS_BASE_URL: &str = "https://api.elevenlabs.io";
/// Default speech-to-speech model
pub const DEFAULT_CONVERSION_MODEL_ID: &str = "eleven_multilingual_sts_v2";
/// Default provider output format (`codec_samplerate_bitrate`)
pub const DEFAULT_CONVERSION_OUTPUT_FORMAT: &str = "mp3_44100_128";

/// Public URL prefix under which the static directory is mounted
pub const STATIC_URL_PREFIX: &str = "/static";
/// Subdirectory of the static directory that receives converted audio
pub const OUTPUT_SUBDIR: &str = "audio";

/// Server configuration
///
/// Contains everything needed to run the server:
/// - Listener settings (host, port)
/// - Voice provider credential and endpoint
/// - Conversion settings (enabled flag, model, output format, timeout)
/// - Storage locations (static directory, staging directory, upload limit)
/// - Security settings (CORS, rate limiting)
#[derive(Clone)]
pub struct ServerConfig {
    // Server settings
    pub host: String,
    pub port: u16,

    // Provider settings
    /// ElevenLabs API key. Absence leaves the server in degraded mode
    /// (empty voice list, conversions rejected).
    pub elevenlabs_api_key: Option<String>,
    /// Base URL of the ElevenLabs API (overridable for proxies and tests)
    pub elevenlabs_base_url: String,

    // Conversion settings
    /// Whether the speech-to-speech capability is enabled in this deployment
    pub conversion_enabled: bool,
    pub conversion_model_id: String,
    pub conversion_output_format: String,
    /// Request timeout for provider calls
    pub provider_timeout_seconds: u64,

    // Storage settings
    /// Directory served under `/static`; converted audio lands in `<static_dir>/audio`
    pub static_dir: PathBuf,
    /// Directory for private staging files. `None` uses the OS temp directory.
    pub staging_dir: Option<PathBuf>,
    /// Maximum accepted upload size in megabytes
    pub max_upload_size_mb: u64,

    // Security configuration
    /// CORS allowed origins (comma-separated list or "*" for all)
    /// Default: None (CORS disabled, same-origin only)
    pub cors_allowed_origins: Option<String>,
    /// Maximum requests per second per IP address
    /// Default: 60
    pub rate_limit_requests_per_second: u32,
    /// Maximum burst size for rate limiting
    /// Default: 10
    pub rate_limit_burst_size: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            elevenlabs_api_key: None,
            elevenlabs_base_url: DEFAULT_ELEVENLABS_BASE_URL.to_string(),
            conversion_enabled: false,
            conversion_model_id: DEFAULT_CONVERSION_MODEL_ID.to_string(),
            conversion_output_format: DEFAULT_CONVERSION_OUTPUT_FORMAT.to_string(),
            provider_timeout_seconds: 120,
            static_dir: PathBuf::from("static"),
            staging_dir: None,
            max_upload_size_mb: 25,
            cors_allowed_origins: None,
            rate_limit_requests_per_second: 60,
            rate_limit_burst_size: 10,
        }
    }
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field(
                "elevenlabs_api_key",
                &self.elevenlabs_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("elevenlabs_base_url", &self.elevenlabs_base_url)
            .field("conversion_enabled", &self.conversion_enabled)
            .field("conversion_model_id", &self.conversion_model_id)
            .field("conversion_output_format", &self.conversion_output_format)
            .field("provider_timeout_seconds", &self.provider_timeout_seconds)
            .field("static_dir", &self.static_dir)
            .field("staging_dir", &self.staging_dir)
            .field("max_upload_size_mb", &self.max_upload_size_mb)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field(
                "rate_limit_requests_per_second",
                &self.rate_limit_requests_per_second,
            )
            .field("rate_limit_burst_size", &self.rate_limit_burst_size)
            .finish()
    }
}

/// Zeroize the provider credential when the configuration is dropped.
impl Drop for ServerConfig {
    fn drop(&mut self) {
        use zeroize::Zeroize;

        if let Some(ref mut key) = self.elevenlabs_api_key {
            key.zeroize();
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// Loads the .env file (if present), then reads environment variables with
    /// defaults for everything that is not set.
    ///
    /// # Errors
    /// Returns an error if a variable has an invalid format or validation fails.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let _ = dotenvy::dotenv();

        let config = merge::merge_config(None)?;
        validation::validate_server_config(&config)?;

        Ok(config)
    }

    /// Load configuration from a YAML file with environment variable base
    ///
    /// Priority order (highest to lowest):
    /// 1. YAML file values
    /// 2. Environment variables (actual ENV vars override .env values)
    /// 3. .env file values
    /// 4. Default values
    ///
    /// # Errors
    /// Returns an error if:
    /// - The YAML file cannot be read or is malformed
    /// - Environment variables have invalid formats
    /// - Configuration validation fails
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        // .env is loaded in main.rs at application startup
        let yaml_config = yaml::YamlConfig::from_file(path)?;

        let config = merge::merge_config(Some(yaml_config))?;
        validation::validate_server_config(&config)?;

        Ok(config)
    }

    /// Get the server address as "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get an API key for a provider
    ///
    /// Returns an error message when the key is missing or blank.
    pub fn get_api_key(&self, provider: &str) -> Result<String, String> {
        match provider.to_lowercase().as_str() {
            "elevenlabs" => self
                .elevenlabs_api_key
                .as_ref()
                .filter(|key| !key.trim().is_empty())
                .cloned()
                .ok_or_else(|| {
                    "ElevenLabs API key not configured in server environment".to_string()
                }),
            _ => Err(format!("Unsupported provider: {provider}")),
        }
    }

    /// Directory receiving converted audio files
    pub fn output_dir(&self) -> PathBuf {
        self.static_dir.join(OUTPUT_SUBDIR)
    }

    /// Public URL prefix of the output directory
    pub fn output_url_prefix(&self) -> String {
        format!("{STATIC_URL_PREFIX}/{OUTPUT_SUBDIR}")
    }

    /// Directory receiving staging files
    pub fn staging_dir(&self) -> PathBuf {
        self.staging_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    /// Upload limit in bytes
    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_size_mb.saturating_mul(1024 * 1024)
    }

    /// File extension of converted audio, derived from the codec prefix of
    /// the output format (`mp3_44100_128` -> `mp3`).
    pub fn output_extension(&self) -> String {
        let codec = self
            .conversion_output_format
            .split('_')
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();

        if codec.is_empty() || !codec.chars().all(|c| c.is_ascii_alphanumeric()) {
            "mp3".to_string()
        } else {
            codec
        }
    }

    /// One-line summary with secrets redacted, used by `check-config`
    pub fn redacted_summary(&self) -> String {
        format!(
            "address={} elevenlabs_api_key={} elevenlabs_base_url={} conversion_enabled={} \
             model={} output_format={} timeout={}s static_dir={} staging_dir={} \
             max_upload={}MB cors={} rate_limit={}/s burst={}",
            self.address(),
            if self.elevenlabs_api_key.is_some() {
                "<set>"
            } else {
                "<unset>"
            },
            self.elevenlabs_base_url,
            self.conversion_enabled,
            self.conversion_model_id,
            self.conversion_output_format,
            self.provider_timeout_seconds,
            self.static_dir.display(),
            self.staging_dir().display(),
            self.max_upload_size_mb,
            self.cors_allowed_origins.as_deref().unwrap_or("<same-origin>"),
            self.rate_limit_requests_per_second,
            self.rate_limit_burst_size,
        )
    }
}
