//! Turns the loaded config into a running session.

use std::sync::Arc;
use std::time::Duration;

use roulette_common::RouletteError;
use roulette_config::RouletteConfig;
use roulette_session::transport::WebRtcConnector;
use roulette_session::{
    HttpRegistrar, MatchingConfig, MediaConstraints, NullDevices, PeerOptions, SessionConfig,
    SessionDeps, SignalingConfig,
};

pub fn session_config(config: &RouletteConfig) -> SessionConfig {
    SessionConfig {
        matching: MatchingConfig {
            http_url: config.matching.http_url.clone(),
            ws_url: config.matching.ws_url.clone(),
            connect_timeout: secs(config.matching.connect_timeout_secs),
            request_timeout: secs(config.matching.request_timeout_secs),
        },
        signaling: SignalingConfig {
            ws_url: config.signaling.ws_url.clone(),
            connect_timeout: secs(config.signaling.connect_timeout_secs),
        },
        media: MediaConstraints {
            audio: config.media.audio,
            video: config.media.video,
        },
        peer: PeerOptions {
            trickle: config.peer.trickle,
            ice_servers: config.peer.ice_servers.clone(),
        },
    }
}

/// HTTP registration, webrtc-rs peer connections, and no local capture
/// devices: a terminal client receives only.
pub fn session_deps(config: &SessionConfig) -> Result<SessionDeps, RouletteError> {
    let registrar = HttpRegistrar::new(&config.matching)?;
    let connector = WebRtcConnector::new()
        .map_err(|e| RouletteError::Other(format!("peer connection setup: {e}")))?;

    Ok(SessionDeps {
        registrar: Arc::new(registrar),
        devices: Arc::new(NullDevices),
        connector: Arc::new(connector),
    })
}

fn secs(value: u32) -> Duration {
    Duration::from_secs(u64::from(value))
}
