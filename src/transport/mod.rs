//! Concrete transports.
//!
//! The WebRTC transport is only built with the `webrtc` feature.

#[cfg(feature = "webrtc")]
pub mod webrtc;

#[cfg(feature = "webrtc")]
pub use self::webrtc::{WebRtcControlChannel, WebRtcTransport, WebRtcTransportFactory};
