//! Realtime session plumbing.
//!
//! This module provides the transport abstraction and the control-channel
//! protocol used by the session controller.
//!
//! # Architecture
//!
//! - `PeerTransport` / `ControlChannel` traits for the peer-to-peer transport
//! - `TransportFactory` to create one connection per session
//! - Typed `ClientEvent` / `ServerEvent` for the control channel
//! - `SessionSettings` for the configuration sent when the channel opens
//!
//! # Example
//!
//! ```rust,ignore
//! use waav_voice_client::core::realtime::{ServerEvent, ClientEvent};
//!
//! let event = ServerEvent::decode(r#"{"type":"response.text.delta","delta":"Hi"}"#)?;
//! channel.send_text(ClientEvent::response_create().to_frame()?).await?;
//! ```

mod base;
mod config;
pub mod messages;

pub use base::{
    ChannelEvent, ChannelState, ControlChannel, PeerTransport, RealtimeError, RealtimeResult,
    RemoteTrack, RemoteTrackCallback, TransportFactory,
};
pub use config::{
    DEFAULT_CHANNEL_LABEL, DEFAULT_INSTRUCTIONS, DEFAULT_TRANSCRIPTION_MODEL,
    InitialTurnDetection, Modality, SessionSettings, VadTuning,
};
pub use messages::{
    ClientEvent, ContentPart, ConversationItem, Response, ServerEvent, SessionConfig, ToolDef,
    TurnDetection,
};
