use serde::{Deserialize, Serialize};
use std::fmt;

/// Display name a user registers under. Doubles as the user's identifier on
/// both the matching service and the signaling relay.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserName(String);

impl UserName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for UserName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UserName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Identifier of one matched pair for one round, `"<initiator>_<responder>"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomCode(String);

impl RoomCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Recover the other participant by removing our own name from the code.
    ///
    /// Returns `None` when the code does not contain `me` as either side.
    pub fn peer_of(&self, me: &UserName) -> Option<UserName> {
        let me = me.as_str();
        let peer = self
            .0
            .strip_prefix(me)
            .and_then(|rest| rest.strip_prefix('_'))
            .or_else(|| {
                self.0
                    .strip_suffix(me)
                    .and_then(|rest| rest.strip_suffix('_'))
            })?;

        if peer.is_empty() {
            None
        } else {
            Some(UserName::new(peer))
        }
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which side of the pair starts media negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Initiator,
    Responder,
}

impl Role {
    pub fn from_initiator_flag(initiator: bool) -> Self {
        if initiator {
            Role::Initiator
        } else {
            Role::Responder
        }
    }

    pub fn is_initiator(self) -> bool {
        matches!(self, Role::Initiator)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Initiator => write!(f, "initiator"),
            Role::Responder => write!(f, "responder"),
        }
    }
}
