pub mod chat;
pub mod realtime;
pub mod session;
pub mod signaling;
pub mod tools;

// Re-export commonly used types for convenience
pub use chat::{ChatMessage, ChatRole, ConsoleView, SessionView, ToggleLabel, Transcript};

pub use realtime::{
    ChannelEvent, ChannelState, ClientEvent, ControlChannel, PeerTransport, RealtimeError,
    RealtimeResult, RemoteTrack, ServerEvent, SessionSettings, TransportFactory,
};

pub use session::{NOT_CONNECTED_ALERT, SessionController, SessionOptions};
pub use signaling::SignalingClient;
pub use tools::{SEARCH_HOSPITAL, SearchHospitalTool, ToolHandler, ToolOutcome, ToolRegistry};
