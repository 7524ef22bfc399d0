//! Native peer connections over webrtc-rs.
//!
//! Negotiation payloads use the browser-side simple-peer format so a native
//! client can pair with a web client:
//! `{"type":"offer"|"answer","sdp":...}` and
//! `{"type":"candidate","candidate":{"candidate","sdpMid","sdpMLineIndex"}}`.

use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::api::{APIBuilder, API};
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::rtp_transceiver::rtp_transceiver_direction::RTCRtpTransceiverDirection;
use webrtc::rtp_transceiver::RTCRtpTransceiverInit;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_remote::TrackRemote;

use crate::media::{
    MediaKind, MediaStream, MediaTrack, PeerConfig, PeerConnector, PeerError, PeerEvent,
    PeerHandle, PeerLink,
};

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum SignalBlob {
    Offer { sdp: String },
    Answer { sdp: String },
    Candidate { candidate: CandidateBlob },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CandidateBlob {
    candidate: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sdp_mid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sdp_m_line_index: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    username_fragment: Option<String>,
}

impl From<RTCIceCandidateInit> for CandidateBlob {
    fn from(init: RTCIceCandidateInit) -> Self {
        Self {
            candidate: init.candidate,
            sdp_mid: init.sdp_mid,
            sdp_m_line_index: init.sdp_mline_index,
            username_fragment: init.username_fragment,
        }
    }
}

impl From<CandidateBlob> for RTCIceCandidateInit {
    fn from(blob: CandidateBlob) -> Self {
        RTCIceCandidateInit {
            candidate: blob.candidate,
            sdp_mid: blob.sdp_mid,
            sdp_mline_index: blob.sdp_m_line_index,
            username_fragment: blob.username_fragment,
        }
    }
}

fn emit_blob(event_tx: &mpsc::UnboundedSender<PeerEvent>, blob: &SignalBlob) {
    match serde_json::to_value(blob) {
        Ok(value) => {
            let _ = event_tx.send(PeerEvent::NegotiationData(value));
        }
        Err(e) => warn!(error = %e, "Failed to encode negotiation data"),
    }
}

// ---------------------------------------------------------------------------
// Tracks
// ---------------------------------------------------------------------------

fn media_kind(kind: RTPCodecType) -> MediaKind {
    match kind {
        RTPCodecType::Audio => MediaKind::Audio,
        _ => MediaKind::Video,
    }
}

/// A locally produced track the application writes samples into.
pub struct RtcLocalTrack {
    track: Arc<TrackLocalStaticSample>,
    stopped: AtomicBool,
}

impl RtcLocalTrack {
    pub fn new(track: Arc<TrackLocalStaticSample>) -> Self {
        Self {
            track,
            stopped: AtomicBool::new(false),
        }
    }

    pub fn track(&self) -> &Arc<TrackLocalStaticSample> {
        &self.track
    }
}

impl fmt::Debug for RtcLocalTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RtcLocalTrack")
            .field("id", &self.track.id())
            .field("kind", &self.kind())
            .finish()
    }
}

impl MediaTrack for RtcLocalTrack {
    fn id(&self) -> &str {
        self.track.id()
    }

    fn kind(&self) -> MediaKind {
        media_kind(self.track.kind())
    }

    fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A track received from the peer. Read RTP from [`RtcRemoteTrack::track`].
pub struct RtcRemoteTrack {
    id: String,
    kind: MediaKind,
    track: Arc<TrackRemote>,
    stopped: AtomicBool,
}

impl RtcRemoteTrack {
    pub fn track(&self) -> &Arc<TrackRemote> {
        &self.track
    }
}

impl fmt::Debug for RtcRemoteTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RtcRemoteTrack")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .finish()
    }
}

impl MediaTrack for RtcRemoteTrack {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> MediaKind {
        self.kind
    }

    fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ---------------------------------------------------------------------------
// Connector
// ---------------------------------------------------------------------------

/// Builds webrtc-rs peer connections with the default codecs and
/// interceptors.
pub struct WebRtcConnector {
    api: Arc<API>,
}

impl WebRtcConnector {
    pub fn new() -> Result<Self, PeerError> {
        let mut media_engine = MediaEngine::default();
        media_engine
            .register_default_codecs()
            .map_err(|e| PeerError::Setup(e.to_string()))?;
        let registry = register_default_interceptors(Registry::new(), &mut media_engine)
            .map_err(|e| PeerError::Setup(e.to_string()))?;

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .build();

        Ok(Self { api: Arc::new(api) })
    }
}

impl PeerConnector for WebRtcConnector {
    fn create(&self, config: PeerConfig) -> Result<PeerLink, PeerError> {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        tokio::spawn(drive_peer(
            Arc::clone(&self.api),
            config,
            event_tx,
            command_rx,
        ));

        Ok(PeerLink {
            handle: Box::new(WebRtcPeer {
                command_tx,
                destroyed: false,
            }),
            events: event_rx,
        })
    }
}

enum PeerCommand {
    Signal(SignalBlob),
    Destroy,
}

struct WebRtcPeer {
    command_tx: mpsc::UnboundedSender<PeerCommand>,
    destroyed: bool,
}

impl PeerHandle for WebRtcPeer {
    fn feed_negotiation_data(&mut self, data: serde_json::Value) -> Result<(), PeerError> {
        let blob: SignalBlob =
            serde_json::from_value(data).map_err(|e| PeerError::InvalidData(e.to_string()))?;
        self.command_tx
            .send(PeerCommand::Signal(blob))
            .map_err(|_| PeerError::Closed)
    }

    fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        let _ = self.command_tx.send(PeerCommand::Destroy);
    }
}

// ---------------------------------------------------------------------------
// Driver task
// ---------------------------------------------------------------------------

/// Owns one `RTCPeerConnection` for its whole life. Fed data is queued in
/// the command channel while the connection is still being built.
async fn drive_peer(
    api: Arc<API>,
    config: PeerConfig,
    event_tx: mpsc::UnboundedSender<PeerEvent>,
    mut command_rx: mpsc::UnboundedReceiver<PeerCommand>,
) {
    let pc = match build_connection(&api, &config, &event_tx).await {
        Ok(pc) => pc,
        Err(message) => {
            let _ = event_tx.send(PeerEvent::Error(message));
            return;
        }
    };

    if config.role.is_initiator() {
        if let Err(message) = send_offer(&pc, config.options.trickle, &event_tx).await {
            let _ = event_tx.send(PeerEvent::Error(message));
            let _ = pc.close().await;
            return;
        }
    }

    let mut early_candidates: Vec<RTCIceCandidateInit> = Vec::new();
    while let Some(command) = command_rx.recv().await {
        match command {
            PeerCommand::Signal(blob) => {
                let result = apply_blob(
                    &pc,
                    blob,
                    config.options.trickle,
                    &event_tx,
                    &mut early_candidates,
                )
                .await;
                if let Err(message) = result {
                    let _ = event_tx.send(PeerEvent::Error(message));
                }
            }
            PeerCommand::Destroy => break,
        }
    }

    if let Err(e) = pc.close().await {
        debug!(error = %e, "Error closing peer connection");
    }
    debug!("Peer connection driver finished");
}

async fn build_connection(
    api: &API,
    config: &PeerConfig,
    event_tx: &mpsc::UnboundedSender<PeerEvent>,
) -> Result<Arc<RTCPeerConnection>, String> {
    let ice_servers = if config.options.ice_servers.is_empty() {
        Vec::new()
    } else {
        vec![RTCIceServer {
            urls: config.options.ice_servers.clone(),
            ..Default::default()
        }]
    };
    let rtc_config = RTCConfiguration {
        ice_servers,
        ..Default::default()
    };

    let pc = Arc::new(
        api.new_peer_connection(rtc_config)
            .await
            .map_err(|e| format!("failed to create peer connection: {e}"))?,
    );

    let state_tx = event_tx.clone();
    pc.on_peer_connection_state_change(Box::new(move |state: RTCPeerConnectionState| {
        let tx = state_tx.clone();
        Box::pin(async move {
            debug!(state = ?state, "Peer connection state changed");
            let event = match state {
                RTCPeerConnectionState::Connected => PeerEvent::Connected,
                RTCPeerConnectionState::Failed => {
                    PeerEvent::Error("peer connection failed".to_string())
                }
                RTCPeerConnectionState::Closed => PeerEvent::Closed,
                _ => return,
            };
            let _ = tx.send(event);
        })
    }));

    let trickle = config.options.trickle;
    let ice_tx = event_tx.clone();
    pc.on_ice_candidate(Box::new(move |candidate: Option<RTCIceCandidate>| {
        let tx = ice_tx.clone();
        Box::pin(async move {
            if !trickle {
                return;
            }
            let Some(candidate) = candidate else { return };
            match candidate.to_json() {
                Ok(init) => emit_blob(
                    &tx,
                    &SignalBlob::Candidate {
                        candidate: init.into(),
                    },
                ),
                Err(e) => warn!(error = %e, "Failed to encode ICE candidate"),
            }
        })
    }));

    let track_tx = event_tx.clone();
    pc.on_track(Box::new(move |track: Arc<TrackRemote>, _receiver, _transceiver| {
        let tx = track_tx.clone();
        Box::pin(async move {
            let remote = RtcRemoteTrack {
                id: track.id(),
                kind: media_kind(track.kind()),
                track: Arc::clone(&track),
                stopped: AtomicBool::new(false),
            };
            info!(track = %remote.id, kind = %remote.kind, "Remote track received");
            let stream = MediaStream::new(track.stream_id(), vec![Arc::new(remote)]);
            let _ = tx.send(PeerEvent::RemoteStream(stream));
        })
    }));

    let mut sending = Vec::new();
    for track in config.local_stream.tracks() {
        let Some(local) = track.as_any().downcast_ref::<RtcLocalTrack>() else {
            debug!(track = %track.id(), "Local track has no RTP sink, not sending it");
            continue;
        };
        let rtp: Arc<dyn TrackLocal + Send + Sync> = Arc::clone(local.track()) as _;
        pc.add_track(rtp)
            .await
            .map_err(|e| format!("failed to add local track: {e}"))?;
        sending.push(local.kind());
    }

    // An offer without tracks still has to ask for the peer's media.
    if config.role.is_initiator() {
        for (codec, kind) in [
            (RTPCodecType::Audio, MediaKind::Audio),
            (RTPCodecType::Video, MediaKind::Video),
        ] {
            if sending.contains(&kind) {
                continue;
            }
            pc.add_transceiver_from_kind(
                codec,
                Some(RTCRtpTransceiverInit {
                    direction: RTCRtpTransceiverDirection::Recvonly,
                    send_encodings: vec![],
                }),
            )
            .await
            .map_err(|e| format!("failed to add {kind} transceiver: {e}"))?;
        }
    }

    Ok(pc)
}

async fn send_offer(
    pc: &RTCPeerConnection,
    trickle: bool,
    event_tx: &mpsc::UnboundedSender<PeerEvent>,
) -> Result<(), String> {
    let offer = pc
        .create_offer(None)
        .await
        .map_err(|e| format!("failed to create offer: {e}"))?;
    let sdp = set_local_and_wait(pc, offer, trickle).await?;
    emit_blob(event_tx, &SignalBlob::Offer { sdp });
    Ok(())
}

async fn send_answer(
    pc: &RTCPeerConnection,
    trickle: bool,
    event_tx: &mpsc::UnboundedSender<PeerEvent>,
) -> Result<(), String> {
    let answer = pc
        .create_answer(None)
        .await
        .map_err(|e| format!("failed to create answer: {e}"))?;
    let sdp = set_local_and_wait(pc, answer, trickle).await?;
    emit_blob(event_tx, &SignalBlob::Answer { sdp });
    Ok(())
}

/// Apply a local description. Without trickle, wait for gathering so the
/// returned SDP carries every candidate.
async fn set_local_and_wait(
    pc: &RTCPeerConnection,
    description: RTCSessionDescription,
    trickle: bool,
) -> Result<String, String> {
    if trickle {
        let sdp = description.sdp.clone();
        pc.set_local_description(description)
            .await
            .map_err(|e| format!("failed to set local description: {e}"))?;
        return Ok(sdp);
    }

    let mut gathered = pc.gathering_complete_promise().await;
    pc.set_local_description(description)
        .await
        .map_err(|e| format!("failed to set local description: {e}"))?;
    let _ = gathered.recv().await;
    pc.local_description()
        .await
        .map(|d| d.sdp)
        .ok_or_else(|| "local description missing after gathering".to_string())
}

async fn apply_blob(
    pc: &RTCPeerConnection,
    blob: SignalBlob,
    trickle: bool,
    event_tx: &mpsc::UnboundedSender<PeerEvent>,
    early_candidates: &mut Vec<RTCIceCandidateInit>,
) -> Result<(), String> {
    match blob {
        SignalBlob::Offer { sdp } => {
            let offer = RTCSessionDescription::offer(sdp)
                .map_err(|e| format!("invalid offer: {e}"))?;
            pc.set_remote_description(offer)
                .await
                .map_err(|e| format!("failed to apply offer: {e}"))?;
            flush_candidates(pc, early_candidates).await;
            send_answer(pc, trickle, event_tx).await
        }
        SignalBlob::Answer { sdp } => {
            let answer = RTCSessionDescription::answer(sdp)
                .map_err(|e| format!("invalid answer: {e}"))?;
            pc.set_remote_description(answer)
                .await
                .map_err(|e| format!("failed to apply answer: {e}"))?;
            flush_candidates(pc, early_candidates).await;
            Ok(())
        }
        SignalBlob::Candidate { candidate } => {
            let init: RTCIceCandidateInit = candidate.into();
            if pc.remote_description().await.is_none() {
                early_candidates.push(init);
                return Ok(());
            }
            if let Err(e) = pc.add_ice_candidate(init).await {
                warn!(error = %e, "Rejected remote ICE candidate");
            }
            Ok(())
        }
    }
}

async fn flush_candidates(pc: &RTCPeerConnection, early_candidates: &mut Vec<RTCIceCandidateInit>) {
    for init in early_candidates.drain(..) {
        if let Err(e) = pc.add_ice_candidate(init).await {
            warn!(error = %e, "Rejected queued ICE candidate");
        }
    }
}
