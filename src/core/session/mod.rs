//! Realtime session lifecycle and control-channel dispatch.

mod controller;

pub use controller::{NOT_CONNECTED_ALERT, SessionController, SessionOptions};
