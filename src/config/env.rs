//! Environment variable loading.
//!
//! `.env` values are loaded into the process environment by the binary before
//! any of this runs, so real environment variables win over `.env`.

use std::env;

use super::ConfigError;

pub const BACKEND_URL: &str = "BACKEND_URL";
pub const SEARCH_PATH: &str = "SEARCH_PATH";
pub const RTC_CONNECT_PATH: &str = "RTC_CONNECT_PATH";
pub const REQUEST_TIMEOUT_SECONDS: &str = "REQUEST_TIMEOUT_SECONDS";
pub const DATA_CHANNEL_LABEL: &str = "DATA_CHANNEL_LABEL";
pub const ASSISTANT_INSTRUCTIONS: &str = "ASSISTANT_INSTRUCTIONS";
pub const ASSISTANT_VOICE: &str = "ASSISTANT_VOICE";
pub const TRANSCRIPTION_MODEL: &str = "TRANSCRIPTION_MODEL";
pub const TURN_DETECTION: &str = "TURN_DETECTION";
pub const VAD_THRESHOLD: &str = "VAD_THRESHOLD";
pub const VAD_PREFIX_PADDING_MS: &str = "VAD_PREFIX_PADDING_MS";
pub const VAD_SILENCE_DURATION_MS: &str = "VAD_SILENCE_DURATION_MS";
pub const ICE_SERVERS: &str = "ICE_SERVERS";

/// Every variable read by [`EnvConfig::load`].
pub const ALL_VARS: &[&str] = &[
    BACKEND_URL,
    SEARCH_PATH,
    RTC_CONNECT_PATH,
    REQUEST_TIMEOUT_SECONDS,
    DATA_CHANNEL_LABEL,
    ASSISTANT_INSTRUCTIONS,
    ASSISTANT_VOICE,
    TRANSCRIPTION_MODEL,
    TURN_DETECTION,
    VAD_THRESHOLD,
    VAD_PREFIX_PADDING_MS,
    VAD_SILENCE_DURATION_MS,
    ICE_SERVERS,
];

/// Values found in the environment. Unset or blank variables are `None`.
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub backend_url: Option<String>,
    pub search_path: Option<String>,
    pub rtc_connect_path: Option<String>,
    pub request_timeout_seconds: Option<u64>,
    pub data_channel_label: Option<String>,
    pub instructions: Option<String>,
    pub voice: Option<String>,
    pub transcription_model: Option<String>,
    pub turn_detection: Option<String>,
    pub vad_threshold: Option<f32>,
    pub vad_prefix_padding_ms: Option<u32>,
    pub vad_silence_duration_ms: Option<u32>,
    pub ice_servers: Option<Vec<String>>,
}

impl EnvConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Ok(Self {
            backend_url: var(BACKEND_URL),
            search_path: var(SEARCH_PATH),
            rtc_connect_path: var(RTC_CONNECT_PATH),
            request_timeout_seconds: parsed(REQUEST_TIMEOUT_SECONDS)?,
            data_channel_label: var(DATA_CHANNEL_LABEL),
            instructions: var(ASSISTANT_INSTRUCTIONS),
            voice: var(ASSISTANT_VOICE),
            transcription_model: var(TRANSCRIPTION_MODEL),
            turn_detection: var(TURN_DETECTION),
            vad_threshold: parsed(VAD_THRESHOLD)?,
            vad_prefix_padding_ms: parsed(VAD_PREFIX_PADDING_MS)?,
            vad_silence_duration_ms: parsed(VAD_SILENCE_DURATION_MS)?,
            ice_servers: var(ICE_SERVERS).map(|raw| split_list(&raw)),
        })
    }
}

fn var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn parsed<T: std::str::FromStr>(name: &str) -> Result<Option<T>, ConfigError> {
    match var(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                key: name.to_string(),
                value: raw,
            }),
        None => Ok(None),
    }
}

/// Split a comma-separated list, dropping blank entries.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}
