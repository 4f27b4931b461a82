use serde::Deserialize;
use std::path::Path;

use super::ConfigError;

/// Complete YAML configuration structure
///
/// All fields are optional to allow partial configuration. Values present in
/// the file override environment variables.
///
/// # Example YAML structure
/// ```yaml
/// backend:
///   url: "http://localhost:8813"
///   search_path: "/api/search"
///   rtc_connect_path: "/api/rtc-connect"
///   request_timeout_seconds: 30
///
/// session:
///   instructions: "You are a helpful hospital assistant."
///   voice: "alloy"
///   transcription_model: "whisper-1"
///   turn_detection: "disabled"
///   vad:
///     threshold: 0.5
///     prefix_padding_ms: 300
///     silence_duration_ms: 500
///
/// transport:
///   data_channel_label: "response"
///   ice_servers:
///     - "stun:stun.l.google.com:19302"
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub backend: Option<BackendYaml>,
    pub session: Option<SessionYaml>,
    pub transport: Option<TransportYaml>,
}

/// Backend endpoints from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct BackendYaml {
    pub url: Option<String>,
    pub search_path: Option<String>,
    pub rtc_connect_path: Option<String>,
    pub request_timeout_seconds: Option<u64>,
}

/// Session settings from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SessionYaml {
    pub instructions: Option<String>,
    pub voice: Option<String>,
    pub transcription_model: Option<String>,
    /// "disabled", "unset" or "server_vad"
    pub turn_detection: Option<String>,
    pub vad: Option<VadYaml>,
}

/// Server VAD tuning from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct VadYaml {
    /// Activation threshold (0.0 - 1.0)
    pub threshold: Option<f32>,
    pub prefix_padding_ms: Option<u32>,
    pub silence_duration_ms: Option<u32>,
}

/// Transport settings from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TransportYaml {
    pub data_channel_label: Option<String>,
    pub ice_servers: Option<Vec<String>>,
}

impl YamlConfig {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or the YAML is malformed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;

        serde_yaml::from_str(&contents).map_err(ConfigError::Parse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_yaml_config_full() {
        let yaml = r#"
backend:
  url: "https://assistant.example.com"
  search_path: "/v2/search"
  rtc_connect_path: "/v2/rtc-connect"
  request_timeout_seconds: 15

session:
  instructions: "Be brief."
  voice: "alloy"
  transcription_model: "whisper-2"
  turn_detection: "server_vad"
  vad:
    threshold: 0.6
    silence_duration_ms: 700

transport:
  data_channel_label: "events"
  ice_servers:
    - "stun:stun.example.com:3478"
"#;

        let config: YamlConfig = serde_yaml::from_str(yaml).unwrap();

        let backend = config.backend.as_ref().unwrap();
        assert_eq!(
            backend.url,
            Some("https://assistant.example.com".to_string())
        );
        assert_eq!(backend.search_path, Some("/v2/search".to_string()));
        assert_eq!(backend.request_timeout_seconds, Some(15));

        let session = config.session.as_ref().unwrap();
        assert_eq!(session.voice, Some("alloy".to_string()));
        assert_eq!(session.turn_detection, Some("server_vad".to_string()));
        let vad = session.vad.as_ref().unwrap();
        assert_eq!(vad.threshold, Some(0.6));
        assert_eq!(vad.prefix_padding_ms, None);
        assert_eq!(vad.silence_duration_ms, Some(700));

        let transport = config.transport.as_ref().unwrap();
        assert_eq!(transport.data_channel_label, Some("events".to_string()));
        assert_eq!(
            transport.ice_servers,
            Some(vec!["stun:stun.example.com:3478".to_string()])
        );
    }

    #[test]
    fn test_yaml_config_partial() {
        let yaml = r#"
backend:
  url: "http://localhost:9000"
"#;

        let config: YamlConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            config.backend.as_ref().unwrap().url,
            Some("http://localhost:9000".to_string())
        );
        assert!(config.backend.as_ref().unwrap().search_path.is_none());
        assert!(config.session.is_none());
        assert!(config.transport.is_none());
    }

    #[test]
    fn test_yaml_config_empty() {
        let config: YamlConfig = serde_yaml::from_str("{}").unwrap();
        assert!(config.backend.is_none());
        assert!(config.session.is_none());
    }

    #[test]
    fn test_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("client.yaml");
        fs::write(&path, "transport:\n  data_channel_label: \"ctl\"\n").unwrap();

        let config = YamlConfig::from_file(&path).unwrap();
        assert_eq!(
            config.transport.unwrap().data_channel_label,
            Some("ctl".to_string())
        );
    }

    #[test]
    fn test_from_file_not_found() {
        let result = YamlConfig::from_file(Path::new("/nonexistent/client.yaml"));
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to read config file")
        );
    }

    #[test]
    fn test_from_file_invalid_yaml() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("client.yaml");
        fs::write(&path, "backend: [unclosed").unwrap();

        let result = YamlConfig::from_file(&path);
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to parse YAML config")
        );
    }
}
