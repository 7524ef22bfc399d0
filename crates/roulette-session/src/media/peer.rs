//! The seam between the media session and a peer-connection backend.

use roulette_common::Role;
use tokio::sync::mpsc;

use super::types::{LocalStream, RemoteStream};

/// Transport settings shared by every peer connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerOptions {
    /// Emit candidates as they are gathered.
    pub trickle: bool,
    pub ice_servers: Vec<String>,
}

impl Default for PeerOptions {
    fn default() -> Self {
        Self {
            trickle: true,
            ice_servers: vec!["stun:stun.l.google.com:19302".to_string()],
        }
    }
}

/// Everything needed to construct one peer connection.
#[derive(Debug, Clone)]
pub struct PeerConfig {
    pub role: Role,
    pub local_stream: LocalStream,
    pub options: PeerOptions,
}

/// Output of a peer connection.
#[derive(Debug, Clone)]
pub enum PeerEvent {
    /// Negotiation output to relay to the other side unchanged.
    NegotiationData(serde_json::Value),
    RemoteStream(RemoteStream),
    Connected,
    Error(String),
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PeerError {
    #[error("peer connection setup failed: {0}")]
    Setup(String),

    #[error("invalid negotiation data: {0}")]
    InvalidData(String),

    #[error("peer connection is closed")]
    Closed,
}

/// Control half of a live peer connection.
pub trait PeerHandle: Send {
    /// Apply a payload produced by the remote side's `NegotiationData`.
    fn feed_negotiation_data(&mut self, data: serde_json::Value) -> Result<(), PeerError>;
    /// Tear the connection down. Idempotent.
    fn destroy(&mut self);
}

/// A freshly created peer connection and its event stream.
pub struct PeerLink {
    pub handle: Box<dyn PeerHandle>,
    pub events: mpsc::UnboundedReceiver<PeerEvent>,
}

/// Factory for peer connections.
///
/// `create` must not block; backends that set up asynchronously buffer fed
/// data until ready. An initiator starts negotiating on its own.
pub trait PeerConnector: Send + Sync {
    fn create(&self, config: PeerConfig) -> Result<PeerLink, PeerError>;
}
