use std::env;
use std::path::PathBuf;

use super::ServerConfig;
use super::utils::{parse_bool, parse_number};
use super::yaml::YamlConfig;
use super::{
    DEFAULT_CONVERSION_MODEL_ID, DEFAULT_CONVERSION_OUTPUT_FORMAT, DEFAULT_ELEVENLABS_BASE_URL,
};

/// Merge YAML configuration with environment variables
///
/// Priority order (highest to lowest):
/// 1. YAML configuration values
/// 2. Environment variables
/// 3. Default values
///
/// # Arguments
/// * `yaml_config` - Optional YAML configuration to use as overrides
pub fn merge_config(
    yaml_config: Option<YamlConfig>,
) -> Result<ServerConfig, Box<dyn std::error::Error>> {
    let yaml = yaml_config.unwrap_or_default();

    // YAML > ENV > Default
    macro_rules! get_value {
        ($env_var:expr, $yaml_value:expr, $default:expr) => {
            $yaml_value
                .or_else(|| env::var($env_var).ok())
                .unwrap_or_else(|| $default.to_string())
        };
    }

    // YAML > ENV
    macro_rules! get_optional {
        ($env_var:expr, $yaml_value:expr) => {
            $yaml_value.or_else(|| env::var($env_var).ok())
        };
    }

    // YAML > parsed ENV > Default
    macro_rules! get_number {
        ($env_var:expr, $yaml_value:expr, $default:expr) => {
            match $yaml_value {
                Some(value) => value,
                None => match env::var($env_var) {
                    Ok(raw) => parse_number($env_var, &raw)?,
                    Err(_) => $default,
                },
            }
        };
    }

    let server = yaml.server.as_ref();
    let providers = yaml.providers.as_ref();
    let conversion = yaml.conversion.as_ref();
    let storage = yaml.storage.as_ref();
    let security = yaml.security.as_ref();

    // Server configuration
    let host = get_value!("HOST", server.and_then(|s| s.host.clone()), "0.0.0.0");
    let port: u16 = get_number!("PORT", server.and_then(|s| s.port), 8000);

    // Provider configuration
    let elevenlabs_api_key = get_optional!(
        "ELEVENLABS_API_KEY",
        providers.and_then(|p| p.elevenlabs_api_key.clone())
    )
    .filter(|key| !key.trim().is_empty());
    let elevenlabs_base_url = get_value!(
        "ELEVENLABS_BASE_URL",
        providers.and_then(|p| p.elevenlabs_base_url.clone()),
        DEFAULT_ELEVENLABS_BASE_URL
    );

    // Conversion configuration
    let conversion_enabled = match conversion.and_then(|c| c.enabled) {
        Some(enabled) => enabled,
        None => match env::var("CONVERSION_ENABLED") {
            Ok(raw) => parse_bool(&raw)
                .ok_or_else(|| format!("Invalid CONVERSION_ENABLED value '{raw}'"))?,
            Err(_) => false,
        },
    };
    let conversion_model_id = get_value!(
        "CONVERSION_MODEL_ID",
        conversion.and_then(|c| c.model_id.clone()),
        DEFAULT_CONVERSION_MODEL_ID
    );
    let conversion_output_format = get_value!(
        "CONVERSION_OUTPUT_FORMAT",
        conversion.and_then(|c| c.output_format.clone()),
        DEFAULT_CONVERSION_OUTPUT_FORMAT
    );
    let provider_timeout_seconds: u64 = get_number!(
        "PROVIDER_TIMEOUT_SECONDS",
        conversion.and_then(|c| c.timeout_seconds),
        120
    );

    // Storage configuration
    let static_dir = PathBuf::from(get_value!(
        "STATIC_DIR",
        storage.and_then(|s| s.static_dir.clone()),
        "static"
    ));
    let staging_dir = get_optional!(
        "STAGING_DIR",
        storage.and_then(|s| s.staging_dir.clone())
    )
    .map(PathBuf::from);
    let max_upload_size_mb: u64 = get_number!(
        "MAX_UPLOAD_SIZE_MB",
        storage.and_then(|s| s.max_upload_size_mb),
        25
    );

    // Security configuration
    let cors_allowed_origins = get_optional!(
        "CORS_ALLOWED_ORIGINS",
        security.and_then(|s| s.cors_allowed_origins.clone())
    );
    let rate_limit_requests_per_second: u32 = get_number!(
        "RATE_LIMIT_REQUESTS_PER_SECOND",
        security.and_then(|s| s.rate_limit_requests_per_second),
        60
    );
    let rate_limit_burst_size: u32 = get_number!(
        "RATE_LIMIT_BURST_SIZE",
        security.and_then(|s| s.rate_limit_burst_size),
        10
    );

    Ok(ServerConfig {
        host,
        port,
        elevenlabs_api_key,
        elevenlabs_base_url,
        conversion_enabled,
        conversion_model_id,
        conversion_output_format,
        provider_timeout_seconds,
        static_dir,
        staging_dir,
        max_upload_size_mb,
        cors_allowed_origins,
        rate_limit_requests_per_second,
        rate_limit_burst_size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::yaml::{ConversionYaml, ProvidersYaml, ServerYaml};
    use serial_test::serial;

    const ENV_VARS: &[&str] = &[
        "HOST",
        "PORT",
        "ELEVENLABS_API_KEY",
        "ELEVENLABS_BASE_URL",
        "CONVERSION_ENABLED",
        "CONVERSION_MODEL_ID",
        "CONVERSION_OUTPUT_FORMAT",
        "PROVIDER_TIMEOUT_SECONDS",
        "STATIC_DIR",
        "STAGING_DIR",
        "MAX_UPLOAD_SIZE_MB",
        "CORS_ALLOWED_ORIGINS",
        "RATE_LIMIT_REQUESTS_PER_SECOND",
        "RATE_LIMIT_BURST_SIZE",
    ];

    // Helper to clean up environment variables after tests
    fn cleanup_env_vars() {
        for var in ENV_VARS {
            unsafe {
                env::remove_var(var);
            }
        }
    }

    #[test]
    #[serial]
    fn test_merge_defaults() {
        cleanup_env_vars();

        let config = merge_config(None).expect("Should load config");
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8000);
        assert!(config.elevenlabs_api_key.is_none());
        assert_eq!(config.elevenlabs_base_url, DEFAULT_ELEVENLABS_BASE_URL);
        assert!(!config.conversion_enabled);
        assert_eq!(config.conversion_model_id, DEFAULT_CONVERSION_MODEL_ID);
        assert_eq!(config.provider_timeout_seconds, 120);
        assert_eq!(config.static_dir, PathBuf::from("static"));
        assert!(config.staging_dir.is_none());
        assert_eq!(config.max_upload_size_mb, 25);
        assert_eq!(config.rate_limit_requests_per_second, 60);
        assert_eq!(config.rate_limit_burst_size, 10);

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_merge_env_values() {
        cleanup_env_vars();

        unsafe {
            env::set_var("PORT", "9100");
            env::set_var("ELEVENLABS_API_KEY", "env-key");
            env::set_var("CONVERSION_ENABLED", "yes");
            env::set_var("STAGING_DIR", "/tmp/staging");
            env::set_var("MAX_UPLOAD_SIZE_MB", "5");
        }

        let config = merge_config(None).expect("Should load config");
        assert_eq!(config.port, 9100);
        assert_eq!(config.elevenlabs_api_key.as_deref(), Some("env-key"));
        assert!(config.conversion_enabled);
        assert_eq!(config.staging_dir, Some(PathBuf::from("/tmp/staging")));
        assert_eq!(config.max_upload_size_mb, 5);

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_merge_yaml_overrides_env() {
        cleanup_env_vars();

        unsafe {
            env::set_var("PORT", "9100");
            env::set_var("ELEVENLABS_API_KEY", "env-key");
            env::set_var("CONVERSION_ENABLED", "true");
        }

        let yaml = YamlConfig {
            server: Some(ServerYaml {
                host: None,
                port: Some(7000),
            }),
            providers: Some(ProvidersYaml {
                elevenlabs_api_key: Some("yaml-key".to_string()),
                elevenlabs_base_url: None,
            }),
            conversion: Some(ConversionYaml {
                enabled: Some(false),
                ..Default::default()
            }),
            ..Default::default()
        };

        let config = merge_config(Some(yaml)).expect("Should load config");
        assert_eq!(config.port, 7000);
        assert_eq!(config.elevenlabs_api_key.as_deref(), Some("yaml-key"));
        assert!(!config.conversion_enabled);

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_merge_blank_api_key_is_absent() {
        cleanup_env_vars();

        unsafe {
            env::set_var("ELEVENLABS_API_KEY", "  ");
        }

        let config = merge_config(None).expect("Should load config");
        assert!(config.elevenlabs_api_key.is_none());

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_merge_invalid_values() {
        cleanup_env_vars();

        unsafe {
            env::set_var("PORT", "not-a-port");
        }
        let err = merge_config(None).unwrap_err();
        assert!(err.to_string().contains("PORT"));
        cleanup_env_vars();

        unsafe {
            env::set_var("CONVERSION_ENABLED", "maybe");
        }
        let err = merge_config(None).unwrap_err();
        assert!(err.to_string().contains("CONVERSION_ENABLED"));

        cleanup_env_vars();
    }
}
