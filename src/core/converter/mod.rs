pub mod base;
pub mod elevenlabs;

use std::sync::Arc;

pub use base::{
    AudioInput, ConverterError, ConverterResult, SharedConverter, Voice, VoiceConverter,
};
pub use elevenlabs::{ElevenLabsClient, ElevenLabsConfig};

use crate::config::ServerConfig;

/// Default voice conversion provider
pub const DEFAULT_PROVIDER: &str = "elevenlabs";

/// Factory function to create a voice conversion provider from server configuration
///
/// # Errors
/// Returns `InvalidConfiguration` when the provider is unknown or its credential is missing.
pub fn create_voice_converter(
    provider_type: &str,
    config: &ServerConfig,
) -> ConverterResult<SharedConverter> {
    match provider_type.to_lowercase().as_str() {
        "elevenlabs" | "eleven-labs" | "eleven_labs" => {
            let el_config = ElevenLabsConfig::from_server_config(config)?;
            Ok(Arc::new(ElevenLabsClient::new(el_config)?))
        }
        _ => Err(ConverterError::InvalidConfiguration(format!(
            "Unsupported voice conversion provider: {provider_type}. Supported providers: elevenlabs"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_unknown_provider() {
        let mut config = ServerConfig::default();
        config.elevenlabs_api_key = Some("key".to_string());
        let err = create_voice_converter("acme", &config).err().unwrap();
        assert!(err.to_string().contains("Unsupported voice conversion provider"));
    }

    #[test]
    fn test_create_elevenlabs() {
        let mut config = ServerConfig::default();
        assert!(create_voice_converter(DEFAULT_PROVIDER, &config).is_err());

        config.elevenlabs_api_key = Some("key".to_string());
        let converter = create_voice_converter("ElevenLabs", &config).unwrap();
        assert_eq!(converter.provider_name(), "elevenlabs");
    }
}
