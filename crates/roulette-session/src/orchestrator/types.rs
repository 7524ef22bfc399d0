//! Configuration, dependencies, and observable state of a session.

use std::sync::Arc;

use roulette_common::{Role, RoomCode, SessionError, SessionState, UserName};
use tokio::sync::oneshot;

use crate::matching::{MatchingConfig, Registrar};
use crate::media::{MediaConstraints, MediaDevices, PeerConnector, PeerOptions, RemoteStream};
use crate::protocol::RegisterResponse;
use crate::signaling::SignalingConfig;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    pub matching: MatchingConfig,
    pub signaling: SignalingConfig,
    pub media: MediaConstraints,
    pub peer: PeerOptions,
}

/// External collaborators the orchestrator drives.
#[derive(Clone)]
pub struct SessionDeps {
    pub registrar: Arc<dyn Registrar>,
    pub devices: Arc<dyn MediaDevices>,
    pub connector: Arc<dyn PeerConnector>,
}

// ---------------------------------------------------------------------------
// Observable state
// ---------------------------------------------------------------------------

/// Everything a renderer needs to draw the session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub user: Option<UserName>,
    pub room_code: Option<RoomCode>,
    pub peer_id: Option<UserName>,
    pub role: Option<Role>,
    /// The relay accepted our join for the current room.
    pub verified: bool,
    /// Id of the stream currently received from the peer.
    pub remote_stream: Option<String>,
    pub last_error: Option<SessionError>,
    /// Number of matches so far.
    pub round: u64,
}

/// Notifications for the rendering layer.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    StateChanged(SessionSnapshot),
    RemoteStream(RemoteStream),
    RemoteStreamEnded,
    Error(SessionError),
}

// ---------------------------------------------------------------------------
// Actor messages
// ---------------------------------------------------------------------------

pub(crate) type Reply = oneshot::Sender<Result<(), SessionError>>;

pub(crate) enum SessionCommand {
    Register { name: UserName, reply: Reply },
    FindNext { reply: Reply },
    Shutdown { reply: Reply },
}

/// Completions of work the actor spawned, tagged so stale ones can be
/// recognised.
pub(crate) enum Internal {
    Registration {
        ticket: u64,
        result: Result<RegisterResponse, SessionError>,
    },
    SignalingReady {
        round: u64,
        result: Result<(), SessionError>,
    },
}
