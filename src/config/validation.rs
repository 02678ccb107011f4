use super::ServerConfig;

/// Validate a merged server configuration
///
/// Rejects values that would make the server unusable at runtime: a zero upload
/// limit, a zero provider timeout, a zero rate-limit burst and a provider base
/// URL that is not http(s).
pub fn validate_server_config(config: &ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    if config.max_upload_size_mb == 0 {
        return Err("MAX_UPLOAD_SIZE_MB must be greater than zero".into());
    }

    if config.provider_timeout_seconds == 0 {
        return Err("PROVIDER_TIMEOUT_SECONDS must be greater than zero".into());
    }

    if config.rate_limit_burst_size == 0 {
        return Err("RATE_LIMIT_BURST_SIZE must be at least 1".into());
    }

    validate_base_url(&config.elevenlabs_base_url)?;

    Ok(())
}

/// Ensure the provider base URL is an absolute http(s) URL
fn validate_base_url(base_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let parsed = url::Url::parse(base_url)
        .map_err(|e| format!("ELEVENLABS_BASE_URL is not a valid URL '{base_url}': {e}"))?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(format!("ELEVENLABS_BASE_URL must use http or https, got '{scheme}'").into()),
    }
}
