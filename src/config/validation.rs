use super::ConfigError;
use crate::core::realtime::VadTuning;
use crate::utils::url_validation::validate_backend_url;

/// Validate the backend base URL.
pub fn validate_backend(url: &str) -> Result<(), ConfigError> {
    validate_backend_url(url)
        .map(|_| ())
        .map_err(|e| ConfigError::Invalid(format!("BACKEND_URL '{}': {}", url, e)))
}

/// Endpoint paths are joined onto the base URL and must be absolute.
pub fn validate_endpoint_path(name: &str, path: &str) -> Result<(), ConfigError> {
    if !path.starts_with('/') {
        return Err(ConfigError::Invalid(format!(
            "{} must start with '/', got '{}'",
            name, path
        )));
    }
    Ok(())
}

pub fn validate_channel_label(label: &str) -> Result<(), ConfigError> {
    if label.trim().is_empty() {
        return Err(ConfigError::Invalid(
            "Data channel label must not be empty".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_vad(vad: &VadTuning) -> Result<(), ConfigError> {
    if let Some(threshold) = vad.threshold
        && !(0.0..=1.0).contains(&threshold)
    {
        return Err(ConfigError::Invalid(format!(
            "VAD threshold must be between 0.0 and 1.0, got {}",
            threshold
        )));
    }
    Ok(())
}
