//! In-memory transport for session controller tests
//!
//! Stands in for the peer connection and its control channel:
//! - Counts connections created by the factory
//! - Records every frame sent on the control channel
//! - Lets tests open, close and deliver frames on the channel
//! - Records offer/answer negotiation and teardown calls

// Allow dead code in test infrastructure - not every test binary uses every helper
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::mpsc;

use waav_voice_client::core::realtime::{
    ChannelEvent, ChannelState, ControlChannel, PeerTransport, RealtimeError, RealtimeResult,
    RemoteTrack, RemoteTrackCallback, TransportFactory,
};

/// Offer text produced by every [`MockTransport`].
pub const MOCK_OFFER: &str = "v=0\r\no=- 0 0 IN IP4 127.0.0.1\r\ns=mock-offer\r\n";

// =============================================================================
// Control Channel
// =============================================================================

pub struct MockChannel {
    label: String,
    state: Mutex<ChannelState>,
    sent: Mutex<Vec<String>>,
    events: mpsc::UnboundedSender<ChannelEvent>,
    close_calls: AtomicUsize,
}

impl MockChannel {
    /// Mark the channel open and raise the open event.
    pub fn open(&self) {
        *self.state.lock() = ChannelState::Open;
        let _ = self.events.send(ChannelEvent::Open);
    }

    /// Deliver one inbound text frame.
    pub fn deliver(&self, frame: &str) {
        let _ = self.events.send(ChannelEvent::Message(frame.to_string()));
    }

    /// Close from the remote side.
    pub fn remote_close(&self) {
        *self.state.lock() = ChannelState::Closed;
        let _ = self.events.send(ChannelEvent::Closed);
    }

    /// Every sent frame, decoded.
    pub fn sent(&self) -> Vec<Value> {
        self.sent
            .lock()
            .iter()
            .map(|frame| serde_json::from_str(frame).expect("sent frame is JSON"))
            .collect()
    }

    /// `type` of every sent frame.
    pub fn sent_types(&self) -> Vec<String> {
        self.sent()
            .iter()
            .map(|frame| frame["type"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().len()
    }

    pub fn close_calls(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ControlChannel for MockChannel {
    fn label(&self) -> &str {
        &self.label
    }

    fn state(&self) -> ChannelState {
        *self.state.lock()
    }

    async fn send_text(&self, text: String) -> RealtimeResult<()> {
        if self.state() != ChannelState::Open {
            return Err(RealtimeError::NotConnected);
        }
        self.sent.lock().push(text);
        Ok(())
    }

    async fn close(&self) -> RealtimeResult<()> {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        *self.state.lock() = ChannelState::Closed;
        Ok(())
    }
}

// =============================================================================
// Transport
// =============================================================================

#[derive(Default)]
pub struct MockTransport {
    channel: Mutex<Option<Arc<MockChannel>>>,
    callback: Mutex<Option<RemoteTrackCallback>>,
    microphone_attached: AtomicBool,
    answer: Mutex<Option<String>>,
    remote_tracks_stopped: AtomicBool,
    closed: AtomicBool,
    fail_channel: bool,
}

impl MockTransport {
    /// The control channel, once opened.
    pub fn channel(&self) -> Arc<MockChannel> {
        self.channel
            .lock()
            .clone()
            .expect("control channel was opened")
    }

    /// Deliver an inbound audio track through the registered callback.
    pub async fn emit_remote_track(&self, id: &str) -> mpsc::Sender<Bytes> {
        let callback = self
            .callback
            .lock()
            .clone()
            .expect("remote track callback registered");
        let (tx, payloads) = mpsc::channel(8);
        callback(RemoteTrack {
            id: id.to_string(),
            stream_id: "stream-0".to_string(),
            kind: "audio".to_string(),
            payloads,
        })
        .await;
        tx
    }

    pub fn microphone_attached(&self) -> bool {
        self.microphone_attached.load(Ordering::SeqCst)
    }

    pub fn applied_answer(&self) -> Option<String> {
        self.answer.lock().clone()
    }

    pub fn remote_tracks_stopped(&self) -> bool {
        self.remote_tracks_stopped.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PeerTransport for MockTransport {
    fn on_remote_track(&self, callback: RemoteTrackCallback) {
        *self.callback.lock() = Some(callback);
    }

    async fn open_control_channel(
        &self,
        label: &str,
    ) -> RealtimeResult<(Arc<dyn ControlChannel>, mpsc::UnboundedReceiver<ChannelEvent>)> {
        if self.fail_channel {
            return Err(RealtimeError::TransportError(
                "data channel refused".to_string(),
            ));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let channel = Arc::new(MockChannel {
            label: label.to_string(),
            state: Mutex::new(ChannelState::Connecting),
            sent: Mutex::new(Vec::new()),
            events: tx,
            close_calls: AtomicUsize::new(0),
        });
        *self.channel.lock() = Some(channel.clone());
        Ok((channel as Arc<dyn ControlChannel>, rx))
    }

    async fn attach_microphone(&self) -> RealtimeResult<()> {
        self.microphone_attached.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn create_offer(&self) -> RealtimeResult<String> {
        Ok(MOCK_OFFER.to_string())
    }

    async fn apply_answer(&self, sdp: String) -> RealtimeResult<()> {
        *self.answer.lock() = Some(sdp);
        Ok(())
    }

    async fn stop_remote_tracks(&self) -> RealtimeResult<()> {
        self.remote_tracks_stopped.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn close(&self) -> RealtimeResult<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

// =============================================================================
// Factory
// =============================================================================

#[derive(Default)]
pub struct MockFactory {
    created: Mutex<Vec<Arc<MockTransport>>>,
    fail_channel: bool,
}

impl MockFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Factory whose transports refuse to open a control channel.
    pub fn failing_channel() -> Arc<Self> {
        Arc::new(Self {
            created: Mutex::new(Vec::new()),
            fail_channel: true,
        })
    }

    pub fn created(&self) -> usize {
        self.created.lock().len()
    }

    pub fn transport(&self, index: usize) -> Arc<MockTransport> {
        self.created.lock()[index].clone()
    }

    pub fn last(&self) -> Arc<MockTransport> {
        self.created
            .lock()
            .last()
            .cloned()
            .expect("a transport was created")
    }
}

#[async_trait]
impl TransportFactory for MockFactory {
    async fn create(&self) -> RealtimeResult<Arc<dyn PeerTransport>> {
        let transport = Arc::new(MockTransport {
            fail_channel: self.fail_channel,
            ..Default::default()
        });
        self.created.lock().push(transport.clone());
        Ok(transport)
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Poll `condition` until it holds, panicking after two seconds.
pub async fn eventually(description: &str, condition: impl Fn() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !condition() {
        if tokio::time::Instant::now() > deadline {
            panic!("Timed out waiting for: {}", description);
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
