use std::io::Write;

use super::{ChatMessage, SessionView, ToggleLabel};
use crate::core::realtime::RemoteTrack;

/// Terminal [`SessionView`].
///
/// Chat lines go to stdout, alerts to stderr. Terminal output has no audio
/// sink, so inbound tracks are drained and their volume is logged.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleView;

impl ConsoleView {
    pub fn new() -> Self {
        Self
    }
}

impl SessionView for ConsoleView {
    fn append_message(&self, message: ChatMessage) {
        println!("[{}] {}", message.role, message.text);
    }

    fn scroll_to_bottom(&self) {
        let _ = std::io::stdout().flush();
    }

    fn alert(&self, message: &str) {
        eprintln!("! {}", message);
    }

    fn set_toggle_label(&self, label: ToggleLabel) {
        match label {
            ToggleLabel::Stop => println!("-- connected (/stop to disconnect)"),
            ToggleLabel::Start => println!("-- disconnected (/start to connect)"),
        }
    }

    fn set_recording_indicator(&self, recording: bool) {
        if recording {
            println!("-- microphone on");
        } else {
            println!("-- microphone off");
        }
    }

    fn attach_remote_audio(&self, track: RemoteTrack) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("No runtime to drain remote track {}", track.id);
            return;
        };

        tracing::info!(
            "Remote {} track {} (stream {}) attached",
            track.kind,
            track.id,
            track.stream_id
        );

        let RemoteTrack { id, mut payloads, .. } = track;
        handle.spawn(async move {
            let mut packets = 0usize;
            let mut bytes = 0usize;
            while let Some(payload) = payloads.recv().await {
                packets += 1;
                bytes += payload.len();
            }
            tracing::debug!(
                "Remote track {} ended after {} packets ({} bytes)",
                id,
                packets,
                bytes
            );
        });
    }
}
