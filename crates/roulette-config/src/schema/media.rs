//! Local capture and peer-connection settings.

use serde::{Deserialize, Serialize};

/// Which local tracks to capture each round.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    pub audio: bool,
    pub video: bool,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            audio: true,
            video: true,
        }
    }
}

/// Peer-connection transport settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PeerConnectionConfig {
    /// Send ICE candidates as they are gathered instead of waiting for the full set.
    pub trickle: bool,
    /// STUN/TURN server URLs.
    pub ice_servers: Vec<String>,
}

impl Default for PeerConnectionConfig {
    fn default() -> Self {
        Self {
            trickle: true,
            ice_servers: vec!["stun:stun.l.google.com:19302".into()],
        }
    }
}
