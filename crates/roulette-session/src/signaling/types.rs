//! Configuration and event types for the signaling channel.

use std::time::Duration;

use roulette_common::{RoomCode, UserName};

use crate::protocol::SignalEnvelope;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SignalingConfig {
    /// Relay base URL; `/ws/{name}` is appended per user.
    pub ws_url: String,
    pub connect_timeout: Duration,
}

impl Default for SignalingConfig {
    fn default() -> Self {
        Self {
            ws_url: "ws://localhost:4000".to_string(),
            connect_timeout: Duration::from_secs(15),
        }
    }
}

// ---------------------------------------------------------------------------
// State & Events
// ---------------------------------------------------------------------------

/// Transport state of a signaling channel. Moves forward only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Connecting,
    Open,
    Closed,
}

/// Events surfaced by the signaling channel.
#[derive(Debug, Clone, PartialEq)]
pub enum SignalingEvent {
    /// The relay accepted our join for a room.
    Verified {
        room_code: Option<RoomCode>,
        role: Option<String>,
    },
    /// A negotiation payload relayed from the peer.
    Signal {
        from: Option<UserName>,
        room_code: RoomCode,
        data: serde_json::Value,
    },
    /// The peer's relay connection went away.
    PeerDisconnected { message: String },
    /// The relay reported an error or the connection failed to open.
    ChannelError { message: String },
    /// The transport is gone; no further events follow.
    Closed,
}

pub(crate) enum SignalingCommand {
    Send(SignalEnvelope),
    Close,
}

/// Anything that can carry an outbound envelope to the relay.
pub trait EnvelopeSink: Send + Sync {
    fn send(&self, envelope: SignalEnvelope);
}

impl EnvelopeSink for tokio::sync::mpsc::UnboundedSender<SignalEnvelope> {
    fn send(&self, envelope: SignalEnvelope) {
        let _ = tokio::sync::mpsc::UnboundedSender::send(self, envelope);
    }
}
