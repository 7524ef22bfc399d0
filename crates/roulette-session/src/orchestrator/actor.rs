//! The orchestrator actor: one task, one owner of all session state.

use std::sync::Arc;

use roulette_common::{Role, RoomCode, SessionError, SessionState, UserName};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use super::handle::SessionHandle;
use super::types::{
    Internal, SessionCommand, SessionConfig, SessionDeps, SessionEvent, SessionSnapshot,
};
use crate::matching::{MatchingChannel, MatchingEvent};
use crate::media::{MediaEvent, MediaSession, MediaUpdate};
use crate::protocol::SignalEnvelope;
use crate::signaling::{SignalingChannel, SignalingEvent};

pub struct Orchestrator {
    config: SessionConfig,
    snapshot: watch::Sender<SessionSnapshot>,
    events_tx: mpsc::Sender<SessionEvent>,

    matching: MatchingChannel,
    matching_rx: mpsc::Receiver<MatchingEvent>,

    signaling: Option<SignalingChannel>,
    signaling_rx: Option<mpsc::Receiver<SignalingEvent>>,

    media: MediaSession,
    media_rx: mpsc::UnboundedReceiver<MediaEvent>,

    internal_tx: mpsc::UnboundedSender<Internal>,
    internal_rx: mpsc::UnboundedReceiver<Internal>,

    /// Bumped on every match; readiness completions carry it.
    round: u64,
    /// Bumped on every registration request; only the latest reply counts.
    registration: u64,
}

impl Orchestrator {
    /// Start the actor on the current runtime.
    /// Returns `(handle, event_receiver)`.
    pub fn spawn(
        config: SessionConfig,
        deps: SessionDeps,
    ) -> (SessionHandle, mpsc::Receiver<SessionEvent>) {
        let (command_tx, command_rx) = mpsc::channel(32);
        let (events_tx, events_rx) = mpsc::channel(256);
        let (actor, snapshot_rx) = Self::new(config, deps, events_tx);
        tokio::spawn(actor.run(command_rx));

        (SessionHandle::new(command_tx, snapshot_rx), events_rx)
    }

    fn new(
        config: SessionConfig,
        deps: SessionDeps,
        events_tx: mpsc::Sender<SessionEvent>,
    ) -> (Self, watch::Receiver<SessionSnapshot>) {
        let (snapshot_tx, snapshot_rx) = watch::channel(SessionSnapshot::default());
        let (internal_tx, internal_rx) = mpsc::unbounded_channel();

        let (matching, matching_rx) =
            MatchingChannel::new(config.matching.clone(), deps.registrar);
        let (media, media_rx) = MediaSession::new(
            deps.devices,
            deps.connector,
            config.media,
            config.peer.clone(),
        );

        let actor = Self {
            config,
            snapshot: snapshot_tx,
            events_tx,
            matching,
            matching_rx,
            signaling: None,
            signaling_rx: None,
            media,
            media_rx,
            internal_tx,
            internal_rx,
            round: 0,
            registration: 0,
        };
        (actor, snapshot_rx)
    }

    async fn run(mut self, mut command_rx: mpsc::Receiver<SessionCommand>) {
        loop {
            tokio::select! {
                command = command_rx.recv() => match command {
                    Some(SessionCommand::Register { name, reply }) => {
                        let _ = reply.send(self.register(name));
                    }
                    Some(SessionCommand::FindNext { reply }) => {
                        let _ = reply.send(self.find_next());
                    }
                    Some(SessionCommand::Shutdown { reply }) => {
                        self.shutdown();
                        let _ = reply.send(Ok(()));
                        return;
                    }
                    None => break,
                },
                Some(event) = self.matching_rx.recv() => self.on_matching_event(event),
                Some(event) = recv_opt(&mut self.signaling_rx) => self.on_signaling_event(event),
                Some(event) = self.media_rx.recv() => {
                    if let Some(update) = self.media.handle_event(event) {
                        self.on_media_update(update);
                    }
                }
                Some(internal) = self.internal_rx.recv() => self.on_internal(internal),
            }
        }

        self.shutdown();
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    fn register(&mut self, name: UserName) -> Result<(), SessionError> {
        if name.is_empty() {
            return Err(SessionError::RegistrationFailed(
                "name must not be empty".into(),
            ));
        }

        let state = self.state();
        if !state.is_registered() {
            info!(user = %name, "Registering");
            self.matching.connect(&name);
            self.publish(|s| s.user = Some(name));
            self.transition(SessionState::Registered);
            self.request_registration();
            return Ok(());
        }

        match self.user() {
            Some(current) if current == name => {}
            Some(current) => {
                return Err(SessionError::RegistrationFailed(format!(
                    "already registered as {current}"
                )));
            }
            None => return Err(SessionError::NotRegistered),
        }

        match state {
            SessionState::Registered | SessionState::Queued => {
                debug!(user = %name, "Re-issuing registration");
                self.request_registration();
                Ok(())
            }
            _ => self.find_next(),
        }
    }

    fn find_next(&mut self) -> Result<(), SessionError> {
        let Some(user) = self.user() else {
            return Err(SessionError::NotRegistered);
        };

        info!(user = %user, from = %self.state(), "Finding next stranger");
        self.teardown();
        self.publish(|s| s.last_error = None);

        if !self.matching.is_alive() {
            info!("Matching channel is down, reconnecting");
            self.matching.connect(&user);
        }

        self.transition(SessionState::Queued);
        self.request_registration();
        Ok(())
    }

    /// Full teardown: media, signaling, and the matching channel.
    fn shutdown(&mut self) {
        info!("Shutting down session");
        self.teardown();
        self.matching.close();
    }

    // -----------------------------------------------------------------------
    // Matching
    // -----------------------------------------------------------------------

    fn request_registration(&mut self) {
        let Some(user) = self.user() else {
            return;
        };
        self.registration += 1;
        let ticket = self.registration;
        let request = self.matching.registration(&user);
        let internal_tx = self.internal_tx.clone();
        tokio::spawn(async move {
            let result = request.await;
            let _ = internal_tx.send(Internal::Registration { ticket, result });
        });
    }

    fn on_matching_event(&mut self, event: MatchingEvent) {
        match event {
            MatchingEvent::Matched { room_code, role } => self.on_matched(room_code, role),
            MatchingEvent::Unavailable { reason } => {
                if self.matching.is_alive() {
                    debug!("Ignoring drop notice from a replaced matching connection");
                    return;
                }
                warn!(reason = %reason, "Matching service unavailable");
                self.record_error(SessionError::MatchingUnavailable(reason));
                if matches!(
                    self.state(),
                    SessionState::Registered | SessionState::Queued
                ) {
                    self.transition(SessionState::Errored);
                }
            }
        }
    }

    fn on_matched(&mut self, room_code: RoomCode, role: Role) {
        let Some(user) = self.user() else {
            warn!(room = %room_code, "Match received before registration, ignoring");
            return;
        };

        if self.state().in_round() {
            warn!(room = %room_code, "New match while a round is active, replacing it");
            self.teardown();
        }

        let Some(peer) = room_code.peer_of(&user) else {
            self.record_error(SessionError::MalformedMatch(format!(
                "room code {room_code} does not include {user}"
            )));
            self.transition(SessionState::Errored);
            return;
        };

        self.round += 1;
        let round = self.round;
        info!(room = %room_code, role = %role, peer = %peer, round, "Matched with a stranger");

        self.publish(|s| {
            s.room_code = Some(room_code);
            s.peer_id = Some(peer);
            s.role = Some(role);
            s.verified = false;
            s.last_error = None;
            s.round = round;
        });
        self.transition(SessionState::Matched);

        if self.signaling.is_none() {
            let (channel, rx) = SignalingChannel::connect(&self.config.signaling, &user);
            self.signaling = Some(channel);
            self.signaling_rx = Some(rx);
        }
        let Some(readiness) = self.signaling.as_ref().map(SignalingChannel::readiness) else {
            return;
        };

        let internal_tx = self.internal_tx.clone();
        tokio::spawn(async move {
            let result = readiness.wait().await;
            let _ = internal_tx.send(Internal::SignalingReady { round, result });
        });
    }

    fn on_internal(&mut self, internal: Internal) {
        match internal {
            Internal::Registration { ticket, result } => {
                if ticket != self.registration {
                    debug!(ticket, "Ignoring superseded registration reply");
                    return;
                }
                match result {
                    Ok(_) => {
                        if self.state() == SessionState::Registered {
                            self.transition(SessionState::Queued);
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "Registration failed");
                        self.record_error(e);
                        if !self.state().in_round() {
                            self.transition(SessionState::Errored);
                        }
                    }
                }
            }
            Internal::SignalingReady { round, result } => {
                if round != self.round || self.state() != SessionState::Matched {
                    debug!(round, "Ignoring readiness for a round that moved on");
                    return;
                }
                match result {
                    Ok(()) => self.begin_negotiation(),
                    Err(e) => {
                        warn!(error = %e, "Signaling channel never became ready");
                        self.end_round(SessionState::Errored, Some(e));
                    }
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Signaling
    // -----------------------------------------------------------------------

    /// Send the join and start media. Runs once per round, on `Matched`.
    fn begin_negotiation(&mut self) {
        let snapshot = self.snapshot.borrow().clone();
        let (Some(room_code), Some(peer), Some(role)) =
            (snapshot.room_code, snapshot.peer_id, snapshot.role)
        else {
            return;
        };
        let Some(signaling) = self.signaling.as_ref() else {
            warn!(room = %room_code, "Signaling channel gone before negotiation");
            self.end_round(
                SessionState::Errored,
                Some(SessionError::SignalingChannelError(
                    "signaling channel closed before negotiation".into(),
                )),
            );
            return;
        };

        signaling.send(SignalEnvelope::join(room_code.clone(), peer.clone(), role));
        self.media
            .start(role, room_code, peer, Arc::new(signaling.sender()));
        self.transition(SessionState::Negotiating);
    }

    fn on_signaling_event(&mut self, event: SignalingEvent) {
        match event {
            SignalingEvent::Verified { room_code, .. } => {
                if self.state().in_round() {
                    info!(room = ?room_code, "Relay verified our room");
                    self.publish(|s| s.verified = true);
                }
            }
            SignalingEvent::Signal {
                from,
                room_code,
                data,
            } => {
                if !self.state().in_round() {
                    debug!("Dropping signal received outside a round");
                    return;
                }
                if self.snapshot.borrow().room_code.as_ref() != Some(&room_code) {
                    warn!(room = %room_code, "Dropping signal for another room");
                    return;
                }
                // A relayed frame proves the channel is open even if the
                // readiness completion has not been processed yet.
                if self.state() == SessionState::Matched {
                    self.begin_negotiation();
                }
                debug!(from = ?from, "Inbound negotiation data");
                if let Some(update) = self.media.on_inbound_signal(data) {
                    self.on_media_update(update);
                }
            }
            SignalingEvent::PeerDisconnected { message } => {
                if self.state().in_round() {
                    info!(message = %message, "Peer left the room");
                    self.end_round(
                        SessionState::PeerDisconnected,
                        Some(SessionError::PeerDisconnected(message)),
                    );
                }
            }
            SignalingEvent::ChannelError { message } => {
                warn!(error = %message, "Signaling channel error");
                self.record_error(SessionError::SignalingChannelError(message));
            }
            SignalingEvent::Closed => {
                info!("Signaling channel closed");
                self.signaling = None;
                self.signaling_rx = None;
                // A live peer connection no longer needs the relay.
                let state = self.state();
                if matches!(state, SessionState::Matched | SessionState::Negotiating) {
                    self.end_round(
                        SessionState::Errored,
                        Some(SessionError::SignalingChannelError(format!(
                            "signaling channel closed while {state}"
                        ))),
                    );
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Media
    // -----------------------------------------------------------------------

    fn on_media_update(&mut self, update: MediaUpdate) {
        match update {
            MediaUpdate::Connected => {
                if self.state() == SessionState::Negotiating {
                    self.transition(SessionState::Connected);
                }
            }
            MediaUpdate::RemoteStream(stream) => {
                let id = stream.id().to_string();
                self.publish(|s| s.remote_stream = Some(id));
                self.emit(SessionEvent::RemoteStream(stream));
            }
            MediaUpdate::Closed => {
                self.end_round(
                    SessionState::PeerDisconnected,
                    Some(SessionError::PeerDisconnected(
                        "peer connection closed".into(),
                    )),
                );
            }
            MediaUpdate::Failed(e) => self.end_round(SessionState::Errored, Some(e)),
        }
    }

    // -----------------------------------------------------------------------
    // Teardown & state
    // -----------------------------------------------------------------------

    /// Release everything scoped to the current round. The matching channel
    /// stays up. Idempotent.
    fn teardown(&mut self) {
        self.media.stop();
        if let Some(mut channel) = self.signaling.take() {
            channel.close();
        }
        self.signaling_rx = None;

        let had_remote = self.snapshot.borrow().remote_stream.is_some();
        self.publish(|s| {
            s.room_code = None;
            s.peer_id = None;
            s.role = None;
            s.verified = false;
            s.remote_stream = None;
        });
        if had_remote {
            self.emit(SessionEvent::RemoteStreamEnded);
        }
    }

    fn end_round(&mut self, next: SessionState, error: Option<SessionError>) {
        self.teardown();
        if let Some(e) = error {
            self.record_error(e);
        }
        self.transition(next);
    }

    fn state(&self) -> SessionState {
        self.snapshot.borrow().state
    }

    fn user(&self) -> Option<UserName> {
        self.snapshot.borrow().user.clone()
    }

    fn transition(&mut self, next: SessionState) {
        let current = self.state();
        if current == next {
            return;
        }
        if !current.can_transition_to(next) {
            warn!(from = %current, to = %next, "Unexpected session transition");
        }
        info!(from = %current, to = %next, "Session state changed");
        self.publish(|s| s.state = next);
    }

    fn record_error(&mut self, error: SessionError) {
        let reported = error.clone();
        self.publish(|s| s.last_error = Some(error));
        self.emit(SessionEvent::Error(reported));
    }

    fn publish(&self, update: impl FnOnce(&mut SessionSnapshot)) {
        self.snapshot.send_modify(update);
        let snapshot = self.snapshot.borrow().clone();
        self.emit(SessionEvent::StateChanged(snapshot));
    }

    fn emit(&self, event: SessionEvent) {
        if let Err(e) = self.events_tx.try_send(event) {
            debug!(error = %e, "Session event not delivered");
        }
    }
}

async fn recv_opt<T>(rx: &mut Option<mpsc::Receiver<T>>) -> Option<T> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
