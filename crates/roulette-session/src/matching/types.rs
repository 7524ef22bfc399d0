//! Configuration and event types for the matching channel.

use std::time::Duration;

use roulette_common::{Role, RoomCode};

#[derive(Debug, Clone)]
pub struct MatchingConfig {
    /// Base URL for `POST /registerForMatching`.
    pub http_url: String,
    /// Base URL for the notification socket; `/ws/{name}` is appended.
    pub ws_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            http_url: "http://localhost:8000".to_string(),
            ws_url: "ws://localhost:8000".to_string(),
            connect_timeout: Duration::from_secs(15),
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl MatchingConfig {
    pub(crate) fn register_url(&self) -> String {
        format!("{}/registerForMatching", self.http_url.trim_end_matches('/'))
    }
}

/// Events surfaced by the matching channel.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchingEvent {
    /// We were paired; `role` says whether we start negotiation.
    Matched { room_code: RoomCode, role: Role },
    /// The notification socket failed to open or dropped.
    Unavailable { reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_url_joins_path() {
        let config = MatchingConfig {
            http_url: "https://match.example.com/".into(),
            ..Default::default()
        };
        assert_eq!(
            config.register_url(),
            "https://match.example.com/registerForMatching"
        );
    }
}
