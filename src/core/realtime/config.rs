//! Session-level settings for the realtime control channel.
//!
//! This module contains the values that go into the `session.update` sent when
//! the control channel opens:
//! - Response modalities
//! - Assistant instructions
//! - Input audio transcription model
//! - Turn detection (voice-activity detection) settings

use serde::{Deserialize, Serialize};

/// Default label of the control channel.
pub const DEFAULT_CHANNEL_LABEL: &str = "response";

/// Default model used for input audio transcription.
pub const DEFAULT_TRANSCRIPTION_MODEL: &str = "whisper-1";

/// Default assistant instructions.
pub const DEFAULT_INSTRUCTIONS: &str = "You are a Patient Virtual Assistant for Doctor Samir Abbas Hospital in Jeddah. In the tools you have the search tool to search through the knowledge base of hospital to find relevant information. Respond to the user in a friendly and helpful manner.";

// =============================================================================
// Modalities
// =============================================================================

/// Response modality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    /// Text output
    Text,
    /// Audio output
    Audio,
}

impl Modality {
    /// Text and audio, the modalities requested for every response.
    pub const TEXT_AND_AUDIO: [Modality; 2] = [Modality::Text, Modality::Audio];

    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Audio => "audio",
        }
    }
}

impl std::fmt::Display for Modality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Turn Detection
// =============================================================================

/// Turn detection sent with the initial session configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitialTurnDetection {
    /// Send `turn_detection: null` (client-driven turns)
    #[default]
    Disabled,
    /// Leave `turn_detection` out and keep the backend default
    Unset,
    /// Enable server-side VAD from the start
    ServerVad,
}

impl InitialTurnDetection {
    /// Parse from string, with fallback to default.
    pub fn from_str_or_default(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "unset" | "default" => Self::Unset,
            "server_vad" | "server-vad" | "vad" | "enabled" => Self::ServerVad,
            _ => Self::Disabled,
        }
    }
}

/// Optional tuning for server-side VAD.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VadTuning {
    /// Activation threshold (0.0 to 1.0)
    pub threshold: Option<f32>,
    /// Audio included before detected speech (ms)
    pub prefix_padding_ms: Option<u32>,
    /// Silence that ends a turn (ms)
    pub silence_duration_ms: Option<u32>,
}

// =============================================================================
// Session Settings
// =============================================================================

/// Settings used to build the session configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    /// System instructions for the assistant
    pub instructions: String,
    /// Response modalities
    pub modalities: Vec<Modality>,
    /// Model for input audio transcription
    pub transcription_model: String,
    /// Voice for audio output (backend default when `None`)
    pub voice: Option<String>,
    /// Turn detection in the initial configuration
    pub initial_turn_detection: InitialTurnDetection,
    /// Server VAD tuning used whenever VAD is enabled
    pub vad: VadTuning,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            instructions: DEFAULT_INSTRUCTIONS.to_string(),
            modalities: Modality::TEXT_AND_AUDIO.to_vec(),
            transcription_model: DEFAULT_TRANSCRIPTION_MODEL.to_string(),
            voice: None,
            initial_turn_detection: InitialTurnDetection::default(),
            vad: VadTuning::default(),
        }
    }
}
