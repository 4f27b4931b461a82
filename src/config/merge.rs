use super::env::EnvConfig;
use super::yaml::YamlConfig;
use super::{ClientConfig, ConfigError, DEFAULT_BACKEND_URL};
use crate::core::realtime::InitialTurnDetection;

/// Build the configuration from defaults, then environment variables, then
/// YAML values. Later layers win field by field.
pub fn merge_config(yaml: Option<YamlConfig>) -> Result<ClientConfig, ConfigError> {
    let env = EnvConfig::load()?;
    let yaml = yaml.unwrap_or_default();
    let mut config = ClientConfig::default();

    // Backend
    let backend = yaml.backend.unwrap_or_default();
    config.backend_url = backend
        .url
        .or(env.backend_url)
        .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());
    if let Some(path) = backend.search_path.or(env.search_path) {
        config.search_path = path;
    }
    if let Some(path) = backend.rtc_connect_path.or(env.rtc_connect_path) {
        config.rtc_connect_path = path;
    }
    config.request_timeout_seconds = backend
        .request_timeout_seconds
        .or(env.request_timeout_seconds);

    // Session
    let session = yaml.session.unwrap_or_default();
    if let Some(instructions) = session.instructions.or(env.instructions) {
        config.session.instructions = instructions;
    }
    if let Some(model) = session.transcription_model.or(env.transcription_model) {
        config.session.transcription_model = model;
    }
    config.session.voice = session.voice.or(env.voice);
    if let Some(mode) = session.turn_detection.or(env.turn_detection) {
        config.session.initial_turn_detection = InitialTurnDetection::from_str_or_default(&mode);
    }

    let vad = session.vad.unwrap_or_default();
    config.session.vad.threshold = vad.threshold.or(env.vad_threshold);
    config.session.vad.prefix_padding_ms = vad.prefix_padding_ms.or(env.vad_prefix_padding_ms);
    config.session.vad.silence_duration_ms =
        vad.silence_duration_ms.or(env.vad_silence_duration_ms);

    // Transport
    let transport = yaml.transport.unwrap_or_default();
    if let Some(label) = transport.data_channel_label.or(env.data_channel_label) {
        config.data_channel_label = label;
    }
    if let Some(servers) = transport.ice_servers.or(env.ice_servers) {
        config.ice_servers = servers;
    }

    Ok(config)
}
