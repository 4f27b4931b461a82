//! Session controller.
//!
//! Owns the lifecycle of one realtime session at a time: creating the
//! transport connection, opening the control channel, negotiating with the
//! backend, pumping control-channel events and tearing everything down again.
//!
//! # Event flow
//!
//! ```text
//! ControlChannel ──ChannelEvent──▶ pump task ──▶ handle_event ──▶ SessionView
//!                                                   │
//!                                                   └─▶ function call task ──▶ ToolRegistry
//! ```
//!
//! Events are handled in arrival order. Function calls run on their own task
//! so a slow tool does not hold up transcript rendering.

use serde_json::Value;
use std::sync::{Arc, Weak};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;

use crate::core::chat::{ChatMessage, SessionView, ToggleLabel};
use crate::core::realtime::{
    ChannelEvent, ClientEvent, ControlChannel, ConversationItem, DEFAULT_CHANNEL_LABEL,
    PeerTransport, RealtimeError, RealtimeResult, RemoteTrackCallback, ServerEvent,
    SessionConfig, SessionSettings, ToolDef, TransportFactory, TurnDetection,
};
use crate::core::signaling::SignalingClient;
use crate::core::tools::ToolRegistry;

/// Alert shown when an action needs an open control channel.
pub const NOT_CONNECTED_ALERT: &str = "Please start the connection first";

/// Options for [`SessionController::new`].
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Configuration sent in the initial `session.update`
    pub settings: SessionSettings,
    /// Control channel label
    pub channel_label: String,
    /// Tools declared to the backend. `None` declares every registered tool.
    pub declared_tools: Option<Vec<ToolDef>>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            settings: SessionSettings::default(),
            channel_label: DEFAULT_CHANNEL_LABEL.to_string(),
            declared_tools: None,
        }
    }
}

/// Handles belonging to one live session. Created and dropped as a unit.
struct ActiveSession {
    transport: Arc<dyn PeerTransport>,
    channel: Arc<dyn ControlChannel>,
    pump: JoinHandle<()>,
    negotiation: Option<JoinHandle<RealtimeResult<()>>>,
}

#[derive(Default)]
struct SessionState {
    active: Option<ActiveSession>,
    recording: bool,
}

struct Inner {
    factory: Arc<dyn TransportFactory>,
    signaling: SignalingClient,
    tools: Arc<ToolRegistry>,
    declared_tools: Vec<ToolDef>,
    view: Arc<dyn SessionView>,
    settings: SessionSettings,
    channel_label: String,
    state: Mutex<SessionState>,
}

/// Drives a realtime voice session against the backend.
///
/// Cheap to clone; clones share the same session.
#[derive(Clone)]
pub struct SessionController {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("channel_label", &self.inner.channel_label)
            .field("tools", &self.inner.tools)
            .finish()
    }
}

impl SessionController {
    /// Create a controller.
    ///
    /// Fails with [`RealtimeError::InvalidConfiguration`] when a declared tool
    /// has no registered handler.
    pub fn new(
        factory: Arc<dyn TransportFactory>,
        signaling: SignalingClient,
        tools: ToolRegistry,
        view: Arc<dyn SessionView>,
        options: SessionOptions,
    ) -> RealtimeResult<Self> {
        let declared_tools = options
            .declared_tools
            .unwrap_or_else(|| tools.definitions());
        tools.validate_declarations(&declared_tools)?;

        if options.channel_label.is_empty() {
            return Err(RealtimeError::InvalidConfiguration(
                "Control channel label must not be empty".to_string(),
            ));
        }

        Ok(Self {
            inner: Arc::new(Inner {
                factory,
                signaling,
                tools: Arc::new(tools),
                declared_tools,
                view,
                settings: options.settings,
                channel_label: options.channel_label,
                state: Mutex::new(SessionState::default()),
            }),
        })
    }

    pub async fn is_active(&self) -> bool {
        self.inner.state.lock().await.active.is_some()
    }

    pub async fn is_recording(&self) -> bool {
        self.inner.state.lock().await.recording
    }

    /// Tools declared to the backend.
    pub fn declared_tools(&self) -> &[ToolDef] {
        &self.inner.declared_tools
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Start a session. Does nothing if one is already active.
    ///
    /// Returns once the connection and control channel exist; negotiation
    /// with the backend continues in the background (see
    /// [`negotiation_finished`](Self::negotiation_finished)).
    pub async fn start(&self) -> RealtimeResult<()> {
        let mut state = self.inner.state.lock().await;
        if state.active.is_some() {
            tracing::debug!("Session already active, ignoring start");
            return Ok(());
        }

        tracing::info!("Starting realtime session");

        let transport = self.inner.factory.create().await?;
        transport.on_remote_track(self.remote_track_callback());

        let (channel, events) = match transport
            .open_control_channel(&self.inner.channel_label)
            .await
        {
            Ok(opened) => opened,
            Err(e) => {
                if let Err(close_err) = transport.close().await {
                    tracing::warn!("Failed to close transport after channel error: {}", close_err);
                }
                return Err(e);
            }
        };

        let pump = tokio::spawn(run_pump(
            Arc::downgrade(&self.inner),
            channel.clone(),
            events,
        ));
        let negotiation = tokio::spawn(negotiate(
            transport.clone(),
            self.inner.signaling.clone(),
        ));

        state.active = Some(ActiveSession {
            transport,
            channel,
            pump,
            negotiation: Some(negotiation),
        });
        state.recording = false;

        Ok(())
    }

    /// Stop the active session. Does nothing if none is active.
    pub async fn stop(&self) -> RealtimeResult<()> {
        let session = {
            let mut state = self.inner.state.lock().await;
            state.recording = false;
            state.active.take()
        };

        let Some(session) = session else {
            tracing::debug!("No active session, ignoring stop");
            return Ok(());
        };

        tracing::info!("Stopping realtime session");

        if let Err(e) = session.transport.stop_remote_tracks().await {
            tracing::warn!("Failed to stop remote tracks: {}", e);
        }
        if let Err(e) = session.channel.close().await {
            tracing::warn!("Failed to close control channel: {}", e);
        }
        if let Err(e) = session.transport.close().await {
            tracing::warn!("Failed to close transport: {}", e);
        }

        session.pump.abort();
        if let Some(negotiation) = session.negotiation {
            negotiation.abort();
        }

        tracing::info!("Realtime session stopped");
        Ok(())
    }

    /// Start or stop depending on the current state and update the toggle
    /// label. Returns the new label.
    pub async fn toggle(&self) -> RealtimeResult<ToggleLabel> {
        if self.is_active().await {
            self.stop().await?;
        } else {
            self.start().await?;
        }

        let label = if self.is_active().await {
            ToggleLabel::Stop
        } else {
            ToggleLabel::Start
        };
        self.inner.view.set_toggle_label(label);
        Ok(label)
    }

    /// Wait for the current session's negotiation and return its result.
    ///
    /// Returns `Ok(())` if the result was already collected, and
    /// [`RealtimeError::NotConnected`] when no session is active.
    pub async fn negotiation_finished(&self) -> RealtimeResult<()> {
        let negotiation = {
            let mut state = self.inner.state.lock().await;
            match state.active.as_mut() {
                Some(session) => session.negotiation.take(),
                None => return Err(RealtimeError::NotConnected),
            }
        };

        match negotiation {
            Some(handle) => handle
                .await
                .map_err(|e| RealtimeError::InternalError(format!("Negotiation task failed: {}", e)))?,
            None => Ok(()),
        }
    }

    // =========================================================================
    // Outbound
    // =========================================================================

    /// Send a user text message and ask for a response.
    ///
    /// Alerts the view and returns [`RealtimeError::NotConnected`] unless the
    /// control channel is open.
    pub async fn send_text_message(&self, text: &str) -> RealtimeResult<()> {
        let Some(channel) = self.open_channel().await else {
            self.inner.view.alert(NOT_CONNECTED_ALERT);
            return Err(RealtimeError::NotConnected);
        };

        self.render(ChatMessage::user(text));

        send_event(
            channel.as_ref(),
            &ClientEvent::ConversationItemCreate {
                item: ConversationItem::user_text(text),
            },
        )
        .await?;
        send_event(channel.as_ref(), &ClientEvent::response_create()).await
    }

    /// Send a line of user input. Surrounding whitespace is trimmed and empty
    /// input is ignored.
    pub async fn submit_input(&self, raw: &str) -> RealtimeResult<()> {
        let text = raw.trim();
        if text.is_empty() {
            return Ok(());
        }
        self.send_text_message(text).await
    }

    /// Flip microphone streaming by switching server VAD on or off.
    pub async fn toggle_microphone(&self) -> RealtimeResult<bool> {
        let (channel, recording) = {
            let mut state = self.inner.state.lock().await;
            let channel = state
                .active
                .as_ref()
                .map(|session| session.channel.clone())
                .filter(|channel| channel.is_open());

            let Some(channel) = channel else {
                drop(state);
                self.inner.view.alert(NOT_CONNECTED_ALERT);
                return Err(RealtimeError::NotConnected);
            };

            state.recording = !state.recording;
            (channel, state.recording)
        };

        tracing::info!("Microphone {}", if recording { "on" } else { "off" });
        self.inner.view.set_recording_indicator(recording);

        let turn_detection =
            recording.then(|| TurnDetection::server_vad(&self.inner.settings.vad));
        send_event(
            channel.as_ref(),
            &ClientEvent::SessionUpdate {
                session: SessionConfig::turn_detection_only(turn_detection),
            },
        )
        .await?;

        Ok(recording)
    }

    // =========================================================================
    // Inbound
    // =========================================================================

    /// Decode and handle one control-channel frame on the active session,
    /// waiting for any function call it triggers to finish.
    pub async fn handle_server_message(&self, raw: &str) -> RealtimeResult<()> {
        let channel = self
            .current_channel()
            .await
            .ok_or(RealtimeError::NotConnected)?;
        let event = ServerEvent::decode(raw)?;

        if let Some(call) = self.handle_event(&channel, event)
            && let Err(e) = call.await
        {
            return Err(RealtimeError::InternalError(format!(
                "Function call task failed: {}",
                e
            )));
        }
        Ok(())
    }

    /// Handle one decoded server event. Returns the task running a function
    /// call, if the event started one.
    fn handle_event(
        &self,
        channel: &Arc<dyn ControlChannel>,
        event: ServerEvent,
    ) -> Option<JoinHandle<()>> {
        tracing::debug!("Server event: {}", event.kind());

        match event {
            ServerEvent::TranscriptionCompleted { transcript, .. } => {
                tracing::debug!("User transcript: {}", transcript);
                self.render(ChatMessage::user(transcript));
            }

            ServerEvent::FunctionCallArgumentsDone {
                call_id,
                name,
                arguments,
                ..
            } => {
                return Some(self.dispatch_function_call(channel.clone(), call_id, name, arguments));
            }

            ServerEvent::TextDelta { delta, .. } => {
                self.render(ChatMessage::assistant(delta));
            }

            ServerEvent::ResponseDone { response } => {
                tracing::debug!(
                    "Response done: {}",
                    response.id.as_deref().unwrap_or("<none>")
                );
                for line in response.first_output_lines() {
                    self.render(ChatMessage::assistant(line));
                }
            }

            ServerEvent::SessionCreated { .. } => {
                tracing::info!("Realtime session created");
            }

            ServerEvent::SessionUpdated { .. } => {
                tracing::debug!("Realtime session updated");
            }

            ServerEvent::Error { error } => {
                tracing::error!(
                    "Backend error: {} - {}",
                    error.error_type,
                    error.message
                );
            }

            ServerEvent::Unknown => {
                tracing::trace!("Unhandled server event");
            }
        }

        None
    }

    /// Run a function call on its own task: invoke the handler, return its
    /// output and ask for a follow-up response.
    fn dispatch_function_call(
        &self,
        channel: Arc<dyn ControlChannel>,
        call_id: String,
        name: String,
        arguments: String,
    ) -> JoinHandle<()> {
        let tools = self.inner.tools.clone();

        tokio::spawn(async move {
            tracing::debug!("Function call: call_id={}, name={}", call_id, name);

            match tools.get(&name) {
                Some(handler) => {
                    let args: Value = match serde_json::from_str(&arguments) {
                        Ok(args) => args,
                        Err(e) => {
                            tracing::error!(
                                "Malformed arguments for function {}: {} - {}",
                                name,
                                e,
                                arguments
                            );
                            return;
                        }
                    };

                    let outcome = handler.call(args).await;
                    let output = match outcome.to_output() {
                        Ok(output) => output,
                        Err(e) => {
                            tracing::error!("Failed to encode output of {}: {}", name, e);
                            return;
                        }
                    };

                    let event = ClientEvent::ConversationItemCreate {
                        item: ConversationItem::function_call_output(&call_id, output),
                    };
                    if let Err(e) = send_event(channel.as_ref(), &event).await {
                        tracing::error!("Failed to send output of {}: {}", name, e);
                    }
                }
                None => {
                    tracing::warn!("No handler registered for function: {}", name);
                }
            }

            if let Err(e) = send_event(channel.as_ref(), &ClientEvent::response_create()).await {
                tracing::error!("Failed to request response after {}: {}", name, e);
            }
        })
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn render(&self, message: ChatMessage) {
        self.inner.view.append_message(message);
        self.inner.view.scroll_to_bottom();
    }

    async fn current_channel(&self) -> Option<Arc<dyn ControlChannel>> {
        self.inner
            .state
            .lock()
            .await
            .active
            .as_ref()
            .map(|session| session.channel.clone())
    }

    async fn open_channel(&self) -> Option<Arc<dyn ControlChannel>> {
        self.current_channel()
            .await
            .filter(|channel| channel.is_open())
    }

    fn remote_track_callback(&self) -> RemoteTrackCallback {
        let view = self.inner.view.clone();
        Arc::new(move |track| {
            let view = view.clone();
            Box::pin(async move {
                tracing::info!("Remote {} track received: {}", track.kind, track.id);
                view.attach_remote_audio(track);
            })
        })
    }

    async fn send_initial_config(&self, channel: &dyn ControlChannel) -> RealtimeResult<()> {
        let session = SessionConfig::initial(&self.inner.settings, self.inner.declared_tools.clone());
        send_event(channel, &ClientEvent::SessionUpdate { session }).await
    }
}

/// Send one client event. The channel must be open.
async fn send_event(channel: &dyn ControlChannel, event: &ClientEvent) -> RealtimeResult<()> {
    if !channel.is_open() {
        return Err(RealtimeError::NotConnected);
    }
    let frame = event.to_frame()?;
    tracing::debug!("Sending control frame: {}", frame);
    channel.send_text(frame).await
}

/// Offer/answer handshake for a freshly created transport.
async fn negotiate(
    transport: Arc<dyn PeerTransport>,
    signaling: SignalingClient,
) -> RealtimeResult<()> {
    let result = async {
        transport.attach_microphone().await?;
        let offer = transport.create_offer().await?;
        let answer = signaling.exchange(offer).await?;
        transport.apply_answer(answer).await
    }
    .await;

    match &result {
        Ok(()) => tracing::info!("Session negotiation complete"),
        Err(e) => tracing::error!("Session negotiation failed: {}", e),
    }
    result
}

/// Control-channel event loop for one session.
async fn run_pump(
    inner: Weak<Inner>,
    channel: Arc<dyn ControlChannel>,
    mut events: mpsc::UnboundedReceiver<ChannelEvent>,
) {
    while let Some(event) = events.recv().await {
        let Some(inner) = inner.upgrade() else {
            break;
        };
        let controller = SessionController { inner };

        match event {
            ChannelEvent::Open => {
                tracing::info!("Control channel '{}' open", channel.label());
                if let Err(e) = controller.send_initial_config(channel.as_ref()).await {
                    tracing::error!("Failed to send session configuration: {}", e);
                }
            }
            ChannelEvent::Message(text) => match ServerEvent::decode(&text) {
                Ok(event) => {
                    let _ = controller.handle_event(&channel, event);
                }
                Err(e) => {
                    tracing::warn!("Failed to parse server event: {} - {}", e, text);
                }
            },
            ChannelEvent::Closed => {
                tracing::info!("Control channel '{}' closed", channel.label());
                break;
            }
        }
    }

    tracing::debug!("Control channel event pump ended");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = SessionOptions::default();
        assert_eq!(options.channel_label, "response");
        assert!(options.declared_tools.is_none());
        assert_eq!(options.settings, SessionSettings::default());
    }

    #[test]
    fn test_not_connected_alert_text() {
        assert_eq!(NOT_CONNECTED_ALERT, "Please start the connection first");
    }
}
