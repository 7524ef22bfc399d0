//! Local capture plus at most one peer connection per round.

use std::sync::Arc;

use roulette_common::{Role, RoomCode, SessionError, UserName};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::devices::MediaDevices;
use super::peer::{PeerConfig, PeerConnector, PeerEvent, PeerHandle, PeerOptions};
use super::types::{LocalStream, MediaConstraints, MediaError, RemoteStream};
use crate::protocol::SignalEnvelope;
use crate::signaling::EnvelopeSink;

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Internal completion posted back to the owner of a [`MediaSession`].
///
/// Feed every event received on the session's channel to
/// [`MediaSession::handle_event`]; events from earlier rounds are discarded
/// there.
#[derive(Debug)]
pub struct MediaEvent {
    generation: u64,
    body: MediaEventBody,
}

#[derive(Debug)]
enum MediaEventBody {
    Captured(Result<LocalStream, MediaError>),
    Peer(PeerEvent),
}

/// Round-level outcome the owner has to act on.
#[derive(Debug, Clone)]
pub enum MediaUpdate {
    Connected,
    RemoteStream(RemoteStream),
    /// The peer connection closed; the session has already stopped.
    Closed,
    /// Capture or negotiation failed; the session has already stopped.
    Failed(SessionError),
}

// ---------------------------------------------------------------------------
// Round state
// ---------------------------------------------------------------------------

enum LocalMedia {
    Pending,
    Ready(LocalStream),
}

struct ActivePeer {
    handle: Box<dyn PeerHandle>,
    forwarder: JoinHandle<()>,
}

struct Round {
    generation: u64,
    role: Role,
    room_code: RoomCode,
    peer_id: UserName,
    outbound: Arc<dyn EnvelopeSink>,
    local: LocalMedia,
    peer: Option<ActivePeer>,
    /// Inbound payloads that arrived before a peer connection existed.
    pending_signals: Vec<serde_json::Value>,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

pub struct MediaSession {
    devices: Arc<dyn MediaDevices>,
    connector: Arc<dyn PeerConnector>,
    constraints: MediaConstraints,
    options: PeerOptions,
    event_tx: mpsc::UnboundedSender<MediaEvent>,
    generation: u64,
    round: Option<Round>,
}

impl MediaSession {
    /// Returns `(session, event_receiver)`.
    pub fn new(
        devices: Arc<dyn MediaDevices>,
        connector: Arc<dyn PeerConnector>,
        constraints: MediaConstraints,
        options: PeerOptions,
    ) -> (Self, mpsc::UnboundedReceiver<MediaEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let session = Self {
            devices,
            connector,
            constraints,
            options,
            event_tx,
            generation: 0,
            round: None,
        };
        (session, event_rx)
    }

    /// Begin a round: capture starts in the background. Once it resolves an
    /// initiator creates its peer connection right away; a responder waits
    /// for the first inbound payload.
    pub fn start(
        &mut self,
        role: Role,
        room_code: RoomCode,
        peer_id: UserName,
        outbound: Arc<dyn EnvelopeSink>,
    ) {
        self.stop();
        self.generation += 1;
        let generation = self.generation;

        info!(room = %room_code, role = %role, peer = %peer_id, "Starting media session");

        let devices = Arc::clone(&self.devices);
        let constraints = self.constraints;
        let event_tx = self.event_tx.clone();
        tokio::spawn(async move {
            let result = devices.get_user_media(constraints).await;
            let event = MediaEvent {
                generation,
                body: MediaEventBody::Captured(result),
            };
            if let Err(mpsc::error::SendError(event)) = event_tx.send(event) {
                // Owner is gone; release the devices ourselves.
                if let MediaEventBody::Captured(Ok(stream)) = event.body {
                    stream.stop();
                }
            }
        });

        self.round = Some(Round {
            generation,
            role,
            room_code,
            peer_id,
            outbound,
            local: LocalMedia::Pending,
            peer: None,
            pending_signals: Vec::new(),
        });
    }

    /// Route a relayed negotiation payload to the peer connection, creating
    /// the responder's connection on first use.
    pub fn on_inbound_signal(&mut self, data: serde_json::Value) -> Option<MediaUpdate> {
        let Some(round) = self.round.as_mut() else {
            debug!("No active media round, dropping inbound signal");
            return None;
        };

        if let Some(peer) = round.peer.as_mut() {
            feed(peer.handle.as_mut(), data);
            return None;
        }

        round.pending_signals.push(data);
        let captured = matches!(round.local, LocalMedia::Ready(_));
        if captured && round.role == Role::Responder {
            return self.create_peer();
        }

        debug!(
            queued = round.pending_signals.len(),
            "Queued inbound signal until the peer connection exists"
        );
        None
    }

    /// Apply a completion from the session's event channel.
    pub fn handle_event(&mut self, event: MediaEvent) -> Option<MediaUpdate> {
        match event.body {
            MediaEventBody::Captured(result) => self.on_captured(event.generation, result),
            MediaEventBody::Peer(peer_event) => {
                if self.is_current(event.generation) {
                    self.on_peer_event(peer_event)
                } else {
                    debug!(generation = event.generation, "Dropping event from a finished peer");
                    None
                }
            }
        }
    }

    /// Destroy the peer connection and release local capture. Safe from any
    /// state and on repeat.
    pub fn stop(&mut self) {
        let Some(round) = self.round.take() else {
            return;
        };

        if let Some(mut peer) = round.peer {
            peer.handle.destroy();
            peer.forwarder.abort();
        }
        if let LocalMedia::Ready(stream) = round.local {
            stream.stop();
        }
        info!(room = %round.room_code, "Media session stopped");
    }

    pub fn is_active(&self) -> bool {
        self.round.is_some()
    }

    pub fn has_peer(&self) -> bool {
        self.round.as_ref().is_some_and(|r| r.peer.is_some())
    }

    /// The local stream of the current round, once captured.
    pub fn local_stream(&self) -> Option<&LocalStream> {
        match self.round.as_ref().map(|r| &r.local) {
            Some(LocalMedia::Ready(stream)) => Some(stream),
            _ => None,
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.round.as_ref().is_some_and(|r| r.generation == generation)
    }

    fn on_captured(
        &mut self,
        generation: u64,
        result: Result<LocalStream, MediaError>,
    ) -> Option<MediaUpdate> {
        if !self.is_current(generation) {
            if let Ok(stream) = result {
                info!(stream = %stream.id(), "Capture finished after its round ended, stopping it");
                stream.stop();
            }
            return None;
        }

        let stream = match result {
            Ok(stream) => stream,
            Err(e) => {
                warn!(error = %e, "Local media capture failed");
                self.stop();
                return Some(MediaUpdate::Failed(SessionError::MediaAcquisitionFailed(
                    e.to_string(),
                )));
            }
        };

        let round = self.round.as_mut()?;
        debug!(stream = %stream.id(), tracks = stream.tracks().len(), "Local media captured");
        round.local = LocalMedia::Ready(stream);

        if round.role.is_initiator() || !round.pending_signals.is_empty() {
            self.create_peer()
        } else {
            None
        }
    }

    fn create_peer(&mut self) -> Option<MediaUpdate> {
        let round = self.round.as_mut()?;
        if round.peer.is_some() {
            return None;
        }
        let LocalMedia::Ready(stream) = &round.local else {
            return None;
        };

        let config = PeerConfig {
            role: round.role,
            local_stream: stream.clone(),
            options: self.options.clone(),
        };

        let link = match self.connector.create(config) {
            Ok(link) => link,
            Err(e) => {
                warn!(error = %e, "Failed to create peer connection");
                self.stop();
                return Some(MediaUpdate::Failed(SessionError::PeerNegotiationError(
                    e.to_string(),
                )));
            }
        };

        info!(role = %round.role, room = %round.room_code, "Peer connection created");

        let forwarder = tokio::spawn(forward_peer_events(
            link.events,
            self.event_tx.clone(),
            round.generation,
        ));
        let mut peer = ActivePeer {
            handle: link.handle,
            forwarder,
        };
        for data in round.pending_signals.drain(..) {
            feed(peer.handle.as_mut(), data);
        }
        round.peer = Some(peer);
        None
    }

    fn on_peer_event(&mut self, event: PeerEvent) -> Option<MediaUpdate> {
        match event {
            PeerEvent::NegotiationData(data) => {
                let round = self.round.as_ref()?;
                round.outbound.send(SignalEnvelope::signal(
                    round.room_code.clone(),
                    round.peer_id.clone(),
                    data,
                ));
                None
            }
            PeerEvent::RemoteStream(stream) => {
                info!(stream = %stream.id(), "Remote stream received");
                Some(MediaUpdate::RemoteStream(stream))
            }
            PeerEvent::Connected => {
                info!("Peer connection established");
                Some(MediaUpdate::Connected)
            }
            PeerEvent::Error(message) => {
                warn!(error = %message, "Peer connection error");
                self.stop();
                Some(MediaUpdate::Failed(SessionError::PeerNegotiationError(
                    message,
                )))
            }
            PeerEvent::Closed => {
                info!("Peer connection closed");
                self.stop();
                Some(MediaUpdate::Closed)
            }
        }
    }
}

impl Drop for MediaSession {
    fn drop(&mut self) {
        self.stop();
    }
}

fn feed(handle: &mut dyn PeerHandle, data: serde_json::Value) {
    if let Err(e) = handle.feed_negotiation_data(data) {
        warn!(error = %e, "Peer rejected negotiation data");
    }
}

async fn forward_peer_events(
    mut events: mpsc::UnboundedReceiver<PeerEvent>,
    event_tx: mpsc::UnboundedSender<MediaEvent>,
    generation: u64,
) {
    while let Some(event) = events.recv().await {
        let event = MediaEvent {
            generation,
            body: MediaEventBody::Peer(event),
        };
        if event_tx.send(event).is_err() {
            break;
        }
    }
}
