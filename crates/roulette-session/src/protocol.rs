//! Wire types for the matching service and the signaling relay.

use roulette_common::{Role, RoomCode, UserName};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Signaling relay
// ---------------------------------------------------------------------------

/// The `type` field of a relay envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PayloadType {
    Offer,
    Answer,
    #[default]
    Signal,
}

impl PayloadType {
    /// Join type announced to the relay for a role.
    pub fn for_role(role: Role) -> Self {
        match role {
            Role::Initiator => PayloadType::Offer,
            Role::Responder => PayloadType::Answer,
        }
    }
}

/// A JSON message exchanged with the signaling relay, tagged by `event`.
///
/// Only `signal` envelopes carry negotiation `data`, which is kept as an
/// opaque JSON value and relayed untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum SignalEnvelope {
    /// Announce ourselves in a room; answered with `verified` or `error`.
    Join {
        room_code: RoomCode,
        target: UserName,
        #[serde(rename = "type")]
        payload_type: PayloadType,
    },
    /// Negotiation payload. Outbound carries `target`, relayed inbound carries `from`.
    Signal {
        room_code: RoomCode,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target: Option<UserName>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<UserName>,
        #[serde(rename = "type", default)]
        payload_type: PayloadType,
        data: serde_json::Value,
    },
    Verified {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        room_code: Option<RoomCode>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        role: Option<String>,
    },
    Error {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    PeerDisconnected {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
}

impl SignalEnvelope {
    pub fn join(room_code: RoomCode, target: UserName, role: Role) -> Self {
        SignalEnvelope::Join {
            room_code,
            target,
            payload_type: PayloadType::for_role(role),
        }
    }

    pub fn signal(room_code: RoomCode, target: UserName, data: serde_json::Value) -> Self {
        SignalEnvelope::Signal {
            room_code,
            target: Some(target),
            from: None,
            payload_type: PayloadType::Signal,
            data,
        }
    }

    /// The `event` name as it appears on the wire.
    pub fn event_name(&self) -> &'static str {
        match self {
            SignalEnvelope::Join { .. } => "join",
            SignalEnvelope::Signal { .. } => "signal",
            SignalEnvelope::Verified { .. } => "verified",
            SignalEnvelope::Error { .. } => "error",
            SignalEnvelope::PeerDisconnected { .. } => "peer-disconnected",
        }
    }
}

// ---------------------------------------------------------------------------
// Matching service
// ---------------------------------------------------------------------------

/// Body of `POST /registerForMatching`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: UserName,
}

/// Reply to a registration request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// A push from the matching service socket.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MatchingMessage {
    Matched {
        room_code: RoomCode,
        #[serde(default)]
        initiator: bool,
    },
    /// Anything else the service sends; logged and ignored.
    #[serde(other)]
    Unrecognized,
}
