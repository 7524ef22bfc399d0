//! Capture and peer-connection settings.

use crate::schema::RouletteConfig;

pub(crate) fn validate_media(errors: &mut Vec<String>, config: &RouletteConfig) {
    if !config.media.audio && !config.media.video {
        errors.push("media: at least one of audio or video must be enabled".into());
    }
}

pub(crate) fn validate_peer(errors: &mut Vec<String>, config: &RouletteConfig) {
    for (i, server) in config.peer.ice_servers.iter().enumerate() {
        let known = ["stun:", "stuns:", "turn:", "turns:"]
            .iter()
            .any(|scheme| server.starts_with(scheme));
        if !known {
            errors.push(format!(
                "peer.ice_servers[{i}] = \"{server}\" must use stun:, stuns:, turn: or turns:"
            ));
        }
    }
}
