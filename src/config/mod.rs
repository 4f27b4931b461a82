//! Configuration module for the voice client
//!
//! This module handles client configuration from various sources: .env files, YAML files,
//! and environment variables. Priority: YAML > ENV vars > .env values > defaults.
//!
//! # Modules
//! - `yaml`: YAML configuration file loading
//! - `env`: Environment variable loading
//! - `merge`: Merging YAML and environment configurations
//! - `validation`: Configuration validation logic
//!
//! # Example
//! ```rust,no_run
//! use waav_voice_client::config::ClientConfig;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = ClientConfig::from_env()?;
//!
//! // Load from YAML file with environment variable overrides
//! let config = ClientConfig::from_file(Path::new("client.yaml"))?;
//!
//! println!("Backend at {}", config.backend_url);
//! # Ok(())
//! # }
//! ```

use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub mod env;
mod merge;
mod validation;
mod yaml;

pub use yaml::{BackendYaml, SessionYaml, TransportYaml, VadYaml, YamlConfig};

use crate::core::realtime::{DEFAULT_CHANNEL_LABEL, SessionSettings};
use crate::core::session::SessionOptions;
use crate::utils::url_validation::{endpoint_url, validate_backend_url};

/// Backend used when nothing else is configured.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8813";
pub const DEFAULT_SEARCH_PATH: &str = "/api/search";
pub const DEFAULT_RTC_CONNECT_PATH: &str = "/api/rtc-connect";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse YAML config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Client configuration
///
/// Contains everything needed to run a session against the backend:
/// - Backend base URL and endpoint paths
/// - Settings sent in the initial `session.update`
/// - Transport settings (data channel label, ICE servers)
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL
    pub backend_url: String,
    /// Path of the knowledge-base search endpoint
    pub search_path: String,
    /// Path of the SDP offer/answer endpoint
    pub rtc_connect_path: String,
    /// Timeout for backend HTTP requests (none when unset)
    pub request_timeout_seconds: Option<u64>,
    /// Control channel label
    pub data_channel_label: String,
    pub session: SessionSettings,
    /// ICE server URLs, e.g. `stun:stun.l.google.com:19302`
    pub ice_servers: Vec<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            search_path: DEFAULT_SEARCH_PATH.to_string(),
            rtc_connect_path: DEFAULT_RTC_CONNECT_PATH.to_string(),
            request_timeout_seconds: None,
            data_channel_label: DEFAULT_CHANNEL_LABEL.to_string(),
            session: SessionSettings::default(),
            ice_servers: Vec::new(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = merge::merge_config(None)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file, with environment variables
    /// filling the fields the file leaves out
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        // .env values are loaded into the environment in main.rs, so the
        // environment layer already includes them here
        let yaml_config = YamlConfig::from_file(path)?;
        let config = merge::merge_config(Some(yaml_config))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validation::validate_backend(&self.backend_url)?;
        validation::validate_endpoint_path("SEARCH_PATH", &self.search_path)?;
        validation::validate_endpoint_path("RTC_CONNECT_PATH", &self.rtc_connect_path)?;
        validation::validate_channel_label(&self.data_channel_label)?;
        validation::validate_vad(&self.session.vad)?;
        Ok(())
    }

    fn base_url(&self) -> Result<Url, ConfigError> {
        validate_backend_url(&self.backend_url).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Full URL of the search endpoint
    pub fn search_url(&self) -> Result<Url, ConfigError> {
        endpoint_url(&self.base_url()?, &self.search_path)
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Full URL of the SDP offer/answer endpoint
    pub fn rtc_connect_url(&self) -> Result<Url, ConfigError> {
        endpoint_url(&self.base_url()?, &self.rtc_connect_path)
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// HTTP client shared by signaling and tools
    pub fn http_client(&self) -> Result<reqwest::Client, ConfigError> {
        let mut builder = reqwest::Client::builder();
        if let Some(seconds) = self.request_timeout_seconds {
            builder = builder.timeout(Duration::from_secs(seconds));
        }
        Ok(builder.build()?)
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            settings: self.session.clone(),
            channel_label: self.data_channel_label.clone(),
            declared_tools: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::realtime::InitialTurnDetection;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    fn cleanup_env_vars() {
        unsafe {
            for name in env::ALL_VARS {
                std::env::remove_var(name);
            }
        }
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        cleanup_env_vars();

        let config = ClientConfig::from_env().unwrap();

        assert_eq!(config.backend_url, "http://localhost:8813");
        assert_eq!(config.search_path, "/api/search");
        assert_eq!(config.rtc_connect_path, "/api/rtc-connect");
        assert_eq!(config.data_channel_label, "response");
        assert!(config.ice_servers.is_empty());
        assert!(config.request_timeout_seconds.is_none());
        assert_eq!(config.session, SessionSettings::default());

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        cleanup_env_vars();
        unsafe {
            std::env::set_var(env::BACKEND_URL, "https://assistant.example.com");
            std::env::set_var(env::TURN_DETECTION, "server_vad");
            std::env::set_var(env::ASSISTANT_VOICE, "alloy");
            std::env::set_var(env::DATA_CHANNEL_LABEL, "oai-events");
        }

        let config = ClientConfig::from_env().unwrap();

        assert_eq!(config.backend_url, "https://assistant.example.com");
        assert_eq!(
            config.session.initial_turn_detection,
            InitialTurnDetection::ServerVad
        );
        assert_eq!(config.session.voice, Some("alloy".to_string()));
        assert_eq!(config.data_channel_label, "oai-events");

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_env_invalid_backend() {
        cleanup_env_vars();
        unsafe {
            std::env::set_var(env::BACKEND_URL, "localhost:8813");
        }

        let result = ClientConfig::from_env();
        assert!(result.unwrap_err().to_string().contains("BACKEND_URL"));

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_file_yaml_overrides_env() {
        cleanup_env_vars();

        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("client.yaml");
        let yaml_content = r#"
backend:
  url: "http://127.0.0.1:9000"

session:
  vad:
    threshold: 0.7
"#;
        fs::write(&config_path, yaml_content).unwrap();

        unsafe {
            std::env::set_var(env::BACKEND_URL, "http://env-host:8813");
            std::env::set_var(env::SEARCH_PATH, "/env/search");
            std::env::set_var(env::VAD_THRESHOLD, "0.2");
        }

        let config = ClientConfig::from_file(&config_path).unwrap();

        // YAML overrides ENV
        assert_eq!(config.backend_url, "http://127.0.0.1:9000");
        assert_eq!(config.session.vad.threshold, Some(0.7));
        // ENV fills what YAML leaves out
        assert_eq!(config.search_path, "/env/search");

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_file_missing_file() {
        cleanup_env_vars();

        let result = ClientConfig::from_file(Path::new("/nonexistent/client.yaml"));
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to read config file")
        );
    }

    #[test]
    #[serial]
    fn test_from_file_rejects_bad_vad_threshold() {
        cleanup_env_vars();

        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("client.yaml");
        fs::write(&config_path, "session:\n  vad:\n    threshold: 2.0\n").unwrap();

        let result = ClientConfig::from_file(&config_path);
        assert!(result.unwrap_err().to_string().contains("VAD threshold"));
    }

    #[test]
    fn test_endpoint_urls() {
        let config = ClientConfig {
            backend_url: "https://example.com/assistant".to_string(),
            ..Default::default()
        };

        assert_eq!(
            config.search_url().unwrap().as_str(),
            "https://example.com/assistant/api/search"
        );
        assert_eq!(
            config.rtc_connect_url().unwrap().as_str(),
            "https://example.com/assistant/api/rtc-connect"
        );
    }

    #[test]
    fn test_session_options() {
        let config = ClientConfig {
            data_channel_label: "ctl".to_string(),
            ..Default::default()
        };
        let options = config.session_options();
        assert_eq!(options.channel_label, "ctl");
        assert!(options.declared_tools.is_none());
    }
}
