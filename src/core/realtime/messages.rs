//! Control-channel message types.
//!
//! This module defines the client and server events exchanged over the
//! control channel. All events are JSON-encoded text frames tagged by `type`.
//!
//! # Protocol Overview
//!
//! Client events (sent to the backend):
//! - session.update - Update session configuration
//! - conversation.item.create - Add a user message or a function call output
//! - response.create - Ask for a response
//!
//! Server events (received from the backend):
//! - session.created / session.updated - Session lifecycle
//! - conversation.item.input_audio_transcription.completed - User speech transcript
//! - response.function_call_arguments.done - Function call request
//! - response.text.delta - Incremental text
//! - response.done - Response complete
//! - error - Error occurred
//!
//! Any other server event type decodes to [`ServerEvent::Unknown`].

use serde::{Deserialize, Serialize};

use super::config::{InitialTurnDetection, Modality, SessionSettings, VadTuning};

// =============================================================================
// Session Configuration
// =============================================================================

/// Session configuration carried by `session.update`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionConfig {
    /// System instructions for the assistant
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,

    /// Response modalities (text, audio)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modalities: Option<Vec<Modality>>,

    /// Voice for audio output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,

    /// Turn detection. `Some(None)` serializes as an explicit `null`, which
    /// disables server VAD; `None` leaves the field out.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turn_detection: Option<Option<TurnDetection>>,

    /// Input audio transcription configuration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_audio_transcription: Option<InputAudioTranscription>,

    /// Tool definitions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolDef>>,
}

impl SessionConfig {
    /// Build the configuration sent when the control channel opens.
    pub fn initial(settings: &SessionSettings, tools: Vec<ToolDef>) -> Self {
        let turn_detection = match settings.initial_turn_detection {
            InitialTurnDetection::Disabled => Some(None),
            InitialTurnDetection::Unset => None,
            InitialTurnDetection::ServerVad => Some(Some(TurnDetection::server_vad(&settings.vad))),
        };

        Self {
            instructions: Some(settings.instructions.clone()),
            modalities: Some(settings.modalities.clone()),
            voice: settings.voice.clone(),
            turn_detection,
            input_audio_transcription: Some(InputAudioTranscription {
                model: settings.transcription_model.clone(),
            }),
            tools: Some(tools),
        }
    }

    /// Configuration update that only switches server VAD on or off.
    pub fn turn_detection_only(turn_detection: Option<TurnDetection>) -> Self {
        Self {
            turn_detection: Some(turn_detection),
            ..Default::default()
        }
    }
}

/// Input audio transcription configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputAudioTranscription {
    /// Transcription model (e.g., "whisper-1")
    pub model: String,
}

/// Turn detection configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TurnDetection {
    /// Server-side VAD
    #[serde(rename = "server_vad")]
    ServerVad {
        /// Activation threshold
        #[serde(skip_serializing_if = "Option::is_none")]
        threshold: Option<f32>,
        /// Audio prefix padding in ms
        #[serde(skip_serializing_if = "Option::is_none")]
        prefix_padding_ms: Option<u32>,
        /// Silence duration in ms
        #[serde(skip_serializing_if = "Option::is_none")]
        silence_duration_ms: Option<u32>,
    },
}

impl TurnDetection {
    pub fn server_vad(tuning: &VadTuning) -> Self {
        TurnDetection::ServerVad {
            threshold: tuning.threshold,
            prefix_padding_ms: tuning.prefix_padding_ms,
            silence_duration_ms: tuning.silence_duration_ms,
        }
    }
}

/// Tool declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDef {
    /// Tool type (always "function")
    #[serde(rename = "type")]
    pub tool_type: String,
    /// Function name
    pub name: String,
    /// Function description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Function parameters JSON schema
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<serde_json::Value>,
}

impl ToolDef {
    /// Declare a function tool.
    pub fn function(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            tool_type: "function".to_string(),
            name: name.into(),
            description: Some(description.into()),
            parameters: Some(parameters),
        }
    }
}

// =============================================================================
// Conversation Items
// =============================================================================

/// Conversation item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationItem {
    /// Item ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Item type (message, function_call, function_call_output)
    #[serde(rename = "type", default)]
    pub item_type: String,
    /// Item role (user, assistant, system)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Content parts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Vec<ContentPart>>,
    /// Call ID for function call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_id: Option<String>,
    /// Function output for function call result
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

impl ConversationItem {
    /// A user message carrying one text part.
    pub fn user_text(text: &str) -> Self {
        Self {
            item_type: "message".to_string(),
            role: Some("user".to_string()),
            content: Some(vec![ContentPart {
                content_type: "input_text".to_string(),
                text: Some(text.to_string()),
                transcript: None,
            }]),
            ..Default::default()
        }
    }

    /// The result of a function call, keyed to its call ID.
    pub fn function_call_output(call_id: &str, output: String) -> Self {
        Self {
            item_type: "function_call_output".to_string(),
            call_id: Some(call_id.to_string()),
            output: Some(output),
            ..Default::default()
        }
    }
}

/// Content part within a conversation item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentPart {
    /// Content type (input_text, text, audio)
    #[serde(rename = "type")]
    pub content_type: String,
    /// Text content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Transcript of audio content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
}

impl ContentPart {
    /// The displayable text of this part: the text of a text part, or the
    /// transcript of an audio part.
    pub fn display_text(&self) -> Option<&str> {
        match self.content_type.as_str() {
            "text" => self.text.as_deref(),
            "audio" => self.transcript.as_deref(),
            _ => None,
        }
    }
}

// =============================================================================
// Response Configuration
// =============================================================================

/// Response configuration for `response.create`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResponseConfig {
    /// Response modalities
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modalities: Option<Vec<Modality>>,
}

// =============================================================================
// Client Events (sent to server)
// =============================================================================

/// Client events sent over the control channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    /// Update session configuration
    #[serde(rename = "session.update")]
    SessionUpdate {
        /// Session configuration
        session: SessionConfig,
    },

    /// Create a conversation item
    #[serde(rename = "conversation.item.create")]
    ConversationItemCreate {
        /// Item to create
        item: ConversationItem,
    },

    /// Create a response
    #[serde(rename = "response.create")]
    ResponseCreate {
        /// Response configuration
        #[serde(skip_serializing_if = "Option::is_none")]
        response: Option<ResponseConfig>,
    },
}

impl ClientEvent {
    /// `response.create` asking for text and audio.
    pub fn response_create() -> Self {
        ClientEvent::ResponseCreate {
            response: Some(ResponseConfig {
                modalities: Some(Modality::TEXT_AND_AUDIO.to_vec()),
            }),
        }
    }

    /// Encode as a JSON text frame.
    pub fn to_frame(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// =============================================================================
// Server Events (received from server)
// =============================================================================

/// Server events received over the control channel.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// Error occurred
    #[serde(rename = "error")]
    Error {
        /// Error details
        error: ApiError,
    },

    /// Session created
    #[serde(rename = "session.created")]
    SessionCreated {
        /// Session information
        #[serde(default)]
        session: serde_json::Value,
    },

    /// Session updated
    #[serde(rename = "session.updated")]
    SessionUpdated {
        /// Session information
        #[serde(default)]
        session: serde_json::Value,
    },

    /// Input audio transcription completed
    #[serde(rename = "conversation.item.input_audio_transcription.completed")]
    TranscriptionCompleted {
        /// Item ID
        #[serde(default)]
        item_id: Option<String>,
        /// Transcript text
        transcript: String,
    },

    /// Function call arguments done
    #[serde(rename = "response.function_call_arguments.done")]
    FunctionCallArgumentsDone {
        /// Call ID
        call_id: String,
        /// Function name
        name: String,
        /// Full arguments as a JSON string
        arguments: String,
        /// Item ID
        #[serde(default)]
        item_id: Option<String>,
    },

    /// Text delta
    #[serde(rename = "response.text.delta")]
    TextDelta {
        /// Item ID
        #[serde(default)]
        item_id: Option<String>,
        /// Text delta
        delta: String,
    },

    /// Response done
    #[serde(rename = "response.done")]
    ResponseDone {
        /// Response information
        response: Response,
    },

    /// Any event type this client does not interpret
    #[serde(other)]
    Unknown,
}

impl ServerEvent {
    /// Decode one JSON text frame.
    pub fn decode(frame: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(frame)
    }

    /// Event type name, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            ServerEvent::Error { .. } => "error",
            ServerEvent::SessionCreated { .. } => "session.created",
            ServerEvent::SessionUpdated { .. } => "session.updated",
            ServerEvent::TranscriptionCompleted { .. } => {
                "conversation.item.input_audio_transcription.completed"
            }
            ServerEvent::FunctionCallArgumentsDone { .. } => {
                "response.function_call_arguments.done"
            }
            ServerEvent::TextDelta { .. } => "response.text.delta",
            ServerEvent::ResponseDone { .. } => "response.done",
            ServerEvent::Unknown => "unknown",
        }
    }
}

// =============================================================================
// Supporting Types
// =============================================================================

/// API error information.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ApiError {
    /// Error type
    #[serde(rename = "type", default)]
    pub error_type: String,
    /// Error code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Error message
    #[serde(default)]
    pub message: String,
}

/// Response information.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Response {
    /// Response ID
    #[serde(default)]
    pub id: Option<String>,
    /// Response status
    #[serde(default)]
    pub status: Option<String>,
    /// Output items
    #[serde(default)]
    pub output: Vec<ConversationItem>,
}

impl Response {
    /// Displayable lines of the first output item, in content order.
    pub fn first_output_lines(&self) -> Vec<String> {
        self.output
            .first()
            .and_then(|item| item.content.as_ref())
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(ContentPart::display_text)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

// =============================================================================
// Tests
// =============================================================================
