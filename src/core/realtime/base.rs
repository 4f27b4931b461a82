//! Base traits and types for the realtime transport.
//!
//! This module defines the seams between the session controller and the
//! peer-to-peer transport that carries microphone audio, remote audio and the
//! control channel.
//!
//! # Lifecycle
//!
//! A [`TransportFactory`] creates one [`PeerTransport`] per session. The
//! transport opens a single [`ControlChannel`] and negotiates through an
//! offer/answer exchange driven by the session controller.

use async_trait::async_trait;
use bytes::Bytes;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during realtime operations.
#[derive(Debug, Error)]
pub enum RealtimeError {
    /// Creating the transport connection failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Transport-level error (peer connection, media, data channel)
    #[error("Transport error: {0}")]
    TransportError(String),

    /// Offer/answer exchange with the signaling endpoint failed
    #[error("Signaling failed: {0}")]
    SignalingFailed(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// No active session or the control channel is not open
    #[error("Not connected")]
    NotConnected,

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<serde_json::Error> for RealtimeError {
    fn from(err: serde_json::Error) -> Self {
        RealtimeError::SerializationError(err.to_string())
    }
}

/// Result type for realtime operations.
pub type RealtimeResult<T> = Result<T, RealtimeError>;

// =============================================================================
// Connection State
// =============================================================================

/// Ready state of a control channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelState {
    /// Created, transport not yet negotiated
    #[default]
    Connecting,
    /// Open and able to carry messages
    Open,
    /// Closing handshake in progress
    Closing,
    /// Closed
    Closed,
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelState::Connecting => write!(f, "connecting"),
            ChannelState::Open => write!(f, "open"),
            ChannelState::Closing => write!(f, "closing"),
            ChannelState::Closed => write!(f, "closed"),
        }
    }
}

/// Events raised by a control channel, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// The channel became open
    Open,
    /// A text frame arrived
    Message(String),
    /// The channel closed
    Closed,
}

// =============================================================================
// Media
// =============================================================================

/// An inbound media track delivered by the remote peer.
#[derive(Debug)]
pub struct RemoteTrack {
    /// Track identifier
    pub id: String,
    /// Identifier of the stream the track belongs to
    pub stream_id: String,
    /// Media kind ("audio" or "video")
    pub kind: String,
    /// Encoded media payloads as they arrive
    pub payloads: mpsc::Receiver<Bytes>,
}

/// Callback type for inbound media tracks.
pub type RemoteTrackCallback =
    Arc<dyn Fn(RemoteTrack) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

// =============================================================================
// Transport Traits
// =============================================================================

/// Ordered, reliable text channel layered over the transport connection.
#[async_trait]
pub trait ControlChannel: Send + Sync {
    /// Channel label.
    fn label(&self) -> &str;

    /// Current ready state.
    fn state(&self) -> ChannelState;

    /// Whether messages can be sent right now.
    fn is_open(&self) -> bool {
        self.state() == ChannelState::Open
    }

    /// Send one text frame.
    async fn send_text(&self, text: String) -> RealtimeResult<()>;

    /// Close the channel.
    async fn close(&self) -> RealtimeResult<()>;
}

/// A peer-to-peer transport connection.
///
/// Implementations own the underlying connection object. The session
/// controller drives negotiation in this order: [`attach_microphone`],
/// [`create_offer`], signaling exchange, [`apply_answer`].
///
/// [`attach_microphone`]: PeerTransport::attach_microphone
/// [`create_offer`]: PeerTransport::create_offer
/// [`apply_answer`]: PeerTransport::apply_answer
#[async_trait]
pub trait PeerTransport: Send + Sync {
    /// Register the callback invoked for every inbound media track.
    fn on_remote_track(&self, callback: RemoteTrackCallback);

    /// Open the control channel. Events for the channel are delivered on the
    /// returned receiver.
    async fn open_control_channel(
        &self,
        label: &str,
    ) -> RealtimeResult<(Arc<dyn ControlChannel>, mpsc::UnboundedReceiver<ChannelEvent>)>;

    /// Acquire the microphone and attach its audio track(s) for send/receive.
    async fn attach_microphone(&self) -> RealtimeResult<()>;

    /// Create the local offer, apply it as the local description and return
    /// its SDP text.
    async fn create_offer(&self) -> RealtimeResult<String>;

    /// Apply the answer SDP text as the remote description.
    async fn apply_answer(&self, sdp: String) -> RealtimeResult<()>;

    /// Stop every inbound media track.
    async fn stop_remote_tracks(&self) -> RealtimeResult<()>;

    /// Close the connection.
    async fn close(&self) -> RealtimeResult<()>;
}

/// Creates a fresh transport connection for each session.
#[async_trait]
pub trait TransportFactory: Send + Sync {
    /// Create a new, unnegotiated connection.
    async fn create(&self) -> RealtimeResult<Arc<dyn PeerTransport>>;
}
