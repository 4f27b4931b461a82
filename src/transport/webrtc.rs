//! WebRTC transport built on the `webrtc` crate.
//!
//! One [`WebRtcTransport`] wraps one `RTCPeerConnection`:
//!
//! - Opus audio, default codecs and interceptors
//! - A local Opus track sent with `sendrecv` direction for the microphone
//! - Remote tracks forwarded as RTP payload streams
//! - An ordered, reliable data channel for the control protocol
//!
//! Audio capture is left to the caller: encoded Opus frames are written to
//! the track returned by [`WebRtcTransport::microphone_track`].

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;

use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MediaEngine};
use webrtc::data_channel::RTCDataChannel;
use webrtc::data_channel::data_channel_message::DataChannelMessage;
use webrtc::data_channel::data_channel_state::RTCDataChannelState;
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::RTCRtpTransceiverInit;
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::rtp_transceiver::rtp_transceiver_direction::RTCRtpTransceiverDirection;
use webrtc::rtp_transceiver::RTCRtpTransceiver;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;
use webrtc::track::track_remote::TrackRemote;

use crate::core::realtime::{
    ChannelEvent, ChannelState, ControlChannel, PeerTransport, RealtimeError, RealtimeResult,
    RemoteTrack, RemoteTrackCallback, TransportFactory,
};

/// Buffered RTP payloads per remote track.
const REMOTE_TRACK_BUFFER: usize = 256;

fn transport_error(e: webrtc::Error) -> RealtimeError {
    RealtimeError::TransportError(e.to_string())
}

// =============================================================================
// Factory
// =============================================================================

/// Creates a fresh peer connection per session.
#[derive(Debug, Clone, Default)]
pub struct WebRtcTransportFactory {
    ice_servers: Vec<String>,
}

impl WebRtcTransportFactory {
    pub fn new(ice_servers: Vec<String>) -> Self {
        Self { ice_servers }
    }
}

#[async_trait]
impl TransportFactory for WebRtcTransportFactory {
    async fn create(&self) -> RealtimeResult<Arc<dyn PeerTransport>> {
        let transport = WebRtcTransport::connect(&self.ice_servers).await?;
        Ok(Arc::new(transport))
    }
}

// =============================================================================
// Transport
// =============================================================================

/// [`PeerTransport`] over an `RTCPeerConnection`.
pub struct WebRtcTransport {
    peer: Arc<RTCPeerConnection>,
    microphone: Mutex<Option<Arc<TrackLocalStaticSample>>>,
}

impl WebRtcTransport {
    /// Create an unnegotiated peer connection.
    pub async fn connect(ice_servers: &[String]) -> RealtimeResult<Self> {
        let mut media_engine = MediaEngine::default();
        media_engine
            .register_default_codecs()
            .map_err(transport_error)?;

        let mut registry = Registry::new();
        registry =
            register_default_interceptors(registry, &mut media_engine).map_err(transport_error)?;

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .build();

        let config = RTCConfiguration {
            ice_servers: if ice_servers.is_empty() {
                Vec::new()
            } else {
                vec![RTCIceServer {
                    urls: ice_servers.to_vec(),
                    ..Default::default()
                }]
            },
            ..Default::default()
        };

        let peer = api
            .new_peer_connection(config)
            .await
            .map_err(|e| RealtimeError::ConnectionFailed(e.to_string()))?;

        peer.on_peer_connection_state_change(Box::new(|state| {
            tracing::info!("Peer connection state: {}", state);
            Box::pin(async {})
        }));

        Ok(Self {
            peer: Arc::new(peer),
            microphone: Mutex::new(None),
        })
    }

    /// The local Opus track sending microphone audio, once attached.
    pub fn microphone_track(&self) -> Option<Arc<TrackLocalStaticSample>> {
        self.microphone.lock().clone()
    }
}

#[async_trait]
impl PeerTransport for WebRtcTransport {
    fn on_remote_track(&self, callback: RemoteTrackCallback) {
        self.peer.on_track(Box::new(
            move |track: Arc<TrackRemote>,
                  _receiver: Arc<RTCRtpReceiver>,
                  _transceiver: Arc<RTCRtpTransceiver>| {
                let callback = callback.clone();
                Box::pin(async move {
                    let (tx, payloads) = mpsc::channel(REMOTE_TRACK_BUFFER);
                    let remote = RemoteTrack {
                        id: track.id(),
                        stream_id: track.stream_id(),
                        kind: track.kind().to_string(),
                        payloads,
                    };

                    tokio::spawn(async move {
                        while let Ok((packet, _)) = track.read_rtp().await {
                            if tx.send(packet.payload).await.is_err() {
                                break;
                            }
                        }
                        tracing::debug!("Remote track {} finished", track.id());
                    });

                    callback(remote).await;
                })
            },
        ));
    }

    async fn open_control_channel(
        &self,
        label: &str,
    ) -> RealtimeResult<(Arc<dyn ControlChannel>, mpsc::UnboundedReceiver<ChannelEvent>)> {
        let channel = self
            .peer
            .create_data_channel(label, None)
            .await
            .map_err(transport_error)?;

        let (tx, events) = mpsc::unbounded_channel();

        let open_tx = tx.clone();
        channel.on_open(Box::new(move || {
            let _ = open_tx.send(ChannelEvent::Open);
            Box::pin(async {})
        }));

        let message_tx = tx.clone();
        channel.on_message(Box::new(move |message: DataChannelMessage| {
            if message.is_string {
                let text = String::from_utf8_lossy(&message.data).into_owned();
                let _ = message_tx.send(ChannelEvent::Message(text));
            } else {
                tracing::debug!("Ignoring binary control frame ({} bytes)", message.data.len());
            }
            Box::pin(async {})
        }));

        channel.on_close(Box::new(move || {
            let _ = tx.send(ChannelEvent::Closed);
            Box::pin(async {})
        }));

        let control: Arc<dyn ControlChannel> = Arc::new(WebRtcControlChannel { channel });
        Ok((control, events))
    }

    async fn attach_microphone(&self) -> RealtimeResult<()> {
        let track = Arc::new(TrackLocalStaticSample::new(
            RTCRtpCodecCapability {
                mime_type: MIME_TYPE_OPUS.to_owned(),
                clock_rate: 48000,
                channels: 2,
                ..Default::default()
            },
            "microphone".to_owned(),
            "waav-voice-client".to_owned(),
        ));

        self.peer
            .add_transceiver_from_track(
                Arc::clone(&track) as Arc<dyn TrackLocal + Send + Sync>,
                Some(RTCRtpTransceiverInit {
                    direction: RTCRtpTransceiverDirection::Sendrecv,
                    send_encodings: Vec::new(),
                }),
            )
            .await
            .map_err(transport_error)?;

        *self.microphone.lock() = Some(track);
        tracing::debug!("Microphone track attached");
        Ok(())
    }

    async fn create_offer(&self) -> RealtimeResult<String> {
        let offer = self.peer.create_offer(None).await.map_err(transport_error)?;

        // Non-trickle: the offer posted to the backend carries every candidate
        let mut gathering_complete = self.peer.gathering_complete_promise().await;
        self.peer
            .set_local_description(offer)
            .await
            .map_err(transport_error)?;
        let _ = gathering_complete.recv().await;

        self.peer
            .local_description()
            .await
            .map(|description| description.sdp)
            .ok_or_else(|| {
                RealtimeError::TransportError("Local description missing after offer".to_string())
            })
    }

    async fn apply_answer(&self, sdp: String) -> RealtimeResult<()> {
        let answer = RTCSessionDescription::answer(sdp).map_err(transport_error)?;
        self.peer
            .set_remote_description(answer)
            .await
            .map_err(transport_error)
    }

    async fn stop_remote_tracks(&self) -> RealtimeResult<()> {
        for receiver in self.peer.get_receivers().await {
            receiver.stop().await.map_err(transport_error)?;
        }
        Ok(())
    }

    async fn close(&self) -> RealtimeResult<()> {
        self.microphone.lock().take();
        self.peer.close().await.map_err(transport_error)
    }
}

// =============================================================================
// Control Channel
// =============================================================================

/// [`ControlChannel`] over an `RTCDataChannel`.
pub struct WebRtcControlChannel {
    channel: Arc<RTCDataChannel>,
}

#[async_trait]
impl ControlChannel for WebRtcControlChannel {
    fn label(&self) -> &str {
        self.channel.label()
    }

    fn state(&self) -> ChannelState {
        match self.channel.ready_state() {
            RTCDataChannelState::Open => ChannelState::Open,
            RTCDataChannelState::Closing => ChannelState::Closing,
            RTCDataChannelState::Closed => ChannelState::Closed,
            _ => ChannelState::Connecting,
        }
    }

    async fn send_text(&self, text: String) -> RealtimeResult<()> {
        self.channel
            .send_text(text)
            .await
            .map(|_| ())
            .map_err(transport_error)
    }

    async fn close(&self) -> RealtimeResult<()> {
        self.channel.close().await.map_err(transport_error)
    }
}
