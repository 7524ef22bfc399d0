//! Public handle for one signaling relay connection.

use roulette_common::{SessionError, UserName};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

use super::connection::connection_task;
use super::types::{
    ChannelState, EnvelopeSink, SignalingCommand, SignalingConfig, SignalingEvent,
};
use crate::protocol::SignalEnvelope;
use crate::ws;

// ---------------------------------------------------------------------------
// Sender
// ---------------------------------------------------------------------------

/// Cloneable send half of a [`SignalingChannel`].
///
/// Envelopes sent while the channel is not open are dropped.
#[derive(Clone)]
pub struct SignalingSender {
    command_tx: mpsc::UnboundedSender<SignalingCommand>,
    state_rx: watch::Receiver<ChannelState>,
}

impl SignalingSender {
    pub fn send(&self, envelope: SignalEnvelope) {
        if !self.is_open() {
            debug!(
                event = envelope.event_name(),
                "Signaling channel not open, dropping envelope"
            );
            return;
        }
        if self
            .command_tx
            .send(SignalingCommand::Send(envelope))
            .is_err()
        {
            debug!("Signaling connection task gone, dropping envelope");
        }
    }

    pub fn is_open(&self) -> bool {
        *self.state_rx.borrow() == ChannelState::Open
    }
}

impl EnvelopeSink for SignalingSender {
    fn send(&self, envelope: SignalEnvelope) {
        SignalingSender::send(self, envelope);
    }
}

// ---------------------------------------------------------------------------
// Readiness
// ---------------------------------------------------------------------------

/// Resolves once the channel leaves `Connecting`.
pub struct Readiness {
    state_rx: watch::Receiver<ChannelState>,
}

impl Readiness {
    /// `Ok` when the channel opened, `SignalingChannelError` if it closed first.
    pub async fn wait(mut self) -> Result<(), SessionError> {
        let state = match self
            .state_rx
            .wait_for(|state| *state != ChannelState::Connecting)
            .await
        {
            Ok(state) => *state,
            Err(_) => ChannelState::Closed,
        };

        match state {
            ChannelState::Open => Ok(()),
            _ => Err(SessionError::SignalingChannelError(
                "channel closed before it was ready".into(),
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Channel
// ---------------------------------------------------------------------------

/// A connection to the signaling relay for one user.
///
/// Dropping the channel closes it.
pub struct SignalingChannel {
    user: UserName,
    sender: SignalingSender,
    closed: bool,
}

impl SignalingChannel {
    /// Start connecting in the background.
    /// Returns `(channel, event_receiver)`.
    pub fn connect(
        config: &SignalingConfig,
        user: &UserName,
    ) -> (Self, mpsc::Receiver<SignalingEvent>) {
        let (event_tx, event_rx) = mpsc::channel(256);
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ChannelState::Connecting);

        let url = ws::user_socket_url(&config.ws_url, user.as_str());
        tokio::spawn(connection_task(
            url,
            config.connect_timeout,
            state_tx,
            event_tx,
            command_rx,
        ));

        let channel = Self {
            user: user.clone(),
            sender: SignalingSender {
                command_tx,
                state_rx,
            },
            closed: false,
        };
        (channel, event_rx)
    }

    pub fn state(&self) -> ChannelState {
        *self.sender.state_rx.borrow()
    }

    pub fn is_open(&self) -> bool {
        self.sender.is_open()
    }

    /// Fire-and-forget send; dropped unless the channel is open.
    pub fn send(&self, envelope: SignalEnvelope) {
        self.sender.send(envelope);
    }

    pub fn sender(&self) -> SignalingSender {
        self.sender.clone()
    }

    pub fn readiness(&self) -> Readiness {
        Readiness {
            state_rx: self.sender.state_rx.clone(),
        }
    }

    /// Wait until the channel is open.
    pub async fn ready(&self) -> Result<(), SessionError> {
        self.readiness().wait().await
    }

    /// Close the connection. Safe to call repeatedly.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        info!(user = %self.user, "Closing signaling channel");
        let _ = self.sender.command_tx.send(SignalingCommand::Close);
    }
}

impl Drop for SignalingChannel {
    fn drop(&mut self) {
        self.close();
    }
}
