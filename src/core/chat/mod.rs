//! Chat transcript and the UI surface the session controller renders into.
//!
//! [`SessionView`] is the seam between the session controller and whatever
//! displays the conversation. Two views ship with the crate:
//!
//! - [`Transcript`] records everything in memory
//! - [`ConsoleView`] prints to the terminal

mod console;

pub use console::ConsoleView;

use parking_lot::Mutex;
use std::fmt;

use crate::core::realtime::RemoteTrack;

/// Author of a chat line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

impl fmt::Display for ChatRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One line of the chat transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            text: text.into(),
        }
    }
}

/// Label of the connection toggle control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleLabel {
    /// Shown while no session is active
    Start,
    /// Shown while a session is active
    Stop,
}

impl ToggleLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToggleLabel::Start => "start",
            ToggleLabel::Stop => "stop",
        }
    }
}

impl fmt::Display for ToggleLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// UI surface driven by the session controller.
///
/// Methods are called from the controller's tasks and must not block.
pub trait SessionView: Send + Sync {
    /// Append a chat line. Lines are never removed.
    fn append_message(&self, message: ChatMessage);

    /// Scroll the transcript to its newest line.
    fn scroll_to_bottom(&self);

    /// Show a user-facing alert.
    fn alert(&self, message: &str);

    fn set_toggle_label(&self, label: ToggleLabel);

    /// Show whether the microphone is streaming to server VAD.
    fn set_recording_indicator(&self, recording: bool);

    /// Play an inbound audio track.
    fn attach_remote_audio(&self, track: RemoteTrack);
}

#[derive(Debug, Default)]
struct TranscriptState {
    messages: Vec<ChatMessage>,
    scrolls: usize,
    alerts: Vec<String>,
    toggle_label: Option<ToggleLabel>,
    recording: bool,
    remote_tracks: Vec<String>,
}

/// In-memory [`SessionView`].
///
/// Keeps the chat lines plus every other view update so callers (and tests)
/// can inspect what the controller rendered. Remote tracks are recorded by
/// ID and dropped.
#[derive(Debug, Default)]
pub struct Transcript {
    state: Mutex<TranscriptState>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.state.lock().messages.clone()
    }

    pub fn last_message(&self) -> Option<ChatMessage> {
        self.state.lock().messages.last().cloned()
    }

    pub fn len(&self) -> usize {
        self.state.lock().messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().messages.is_empty()
    }

    /// Number of scroll-to-bottom requests so far.
    pub fn scroll_count(&self) -> usize {
        self.state.lock().scrolls
    }

    pub fn alerts(&self) -> Vec<String> {
        self.state.lock().alerts.clone()
    }

    pub fn toggle_label(&self) -> Option<ToggleLabel> {
        self.state.lock().toggle_label
    }

    pub fn is_recording(&self) -> bool {
        self.state.lock().recording
    }

    pub fn remote_track_ids(&self) -> Vec<String> {
        self.state.lock().remote_tracks.clone()
    }
}

impl SessionView for Transcript {
    fn append_message(&self, message: ChatMessage) {
        self.state.lock().messages.push(message);
    }

    fn scroll_to_bottom(&self) {
        self.state.lock().scrolls += 1;
    }

    fn alert(&self, message: &str) {
        self.state.lock().alerts.push(message.to_string());
    }

    fn set_toggle_label(&self, label: ToggleLabel) {
        self.state.lock().toggle_label = Some(label);
    }

    fn set_recording_indicator(&self, recording: bool) {
        self.state.lock().recording = recording;
    }

    fn attach_remote_audio(&self, track: RemoteTrack) {
        self.state.lock().remote_tracks.push(track.id);
    }
}
