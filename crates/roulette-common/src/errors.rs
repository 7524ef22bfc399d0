use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),
}

/// Failures of a chat round or of the channels feeding it.
///
/// Every variant is local to the current round: the orchestrator records it
/// in the session snapshot, tears the round down, and `find_next` recovers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("registration failed: {0}")]
    RegistrationFailed(String),

    #[error("matching service unavailable: {0}")]
    MatchingUnavailable(String),

    #[error("media acquisition failed: {0}")]
    MediaAcquisitionFailed(String),

    #[error("signaling channel error: {0}")]
    SignalingChannelError(String),

    #[error("peer negotiation error: {0}")]
    PeerNegotiationError(String),

    #[error("peer disconnected: {0}")]
    PeerDisconnected(String),

    #[error("malformed match: {0}")]
    MalformedMatch(String),

    #[error("not registered for matching")]
    NotRegistered,

    #[error("session orchestrator has stopped")]
    OrchestratorStopped,
}

#[derive(Debug, thiserror::Error)]
pub enum RouletteError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}
