//! Remote service endpoints: matching service and signaling relay.

use serde::{Deserialize, Serialize};

/// Matching service endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingServiceConfig {
    /// Base URL for `POST /registerForMatching`.
    pub http_url: String,
    /// Base URL for the match notification socket (`/ws/{name}` is appended).
    pub ws_url: String,
    /// WebSocket connect timeout in seconds (valid range: 1-120).
    pub connect_timeout_secs: u32,
    /// Registration request timeout in seconds (valid range: 1-120).
    pub request_timeout_secs: u32,
}

impl Default for MatchingServiceConfig {
    fn default() -> Self {
        Self {
            http_url: "http://localhost:8000".into(),
            ws_url: "ws://localhost:8000".into(),
            connect_timeout_secs: 15,
            request_timeout_secs: 10,
        }
    }
}

/// Signaling relay endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalingServiceConfig {
    /// Base URL for the relay socket (`/ws/{name}` is appended).
    pub ws_url: String,
    /// WebSocket connect timeout in seconds (valid range: 1-120).
    pub connect_timeout_secs: u32,
}

impl Default for SignalingServiceConfig {
    fn default() -> Self {
        Self {
            ws_url: "ws://localhost:4000".into(),
            connect_timeout_secs: 15,
        }
    }
}
