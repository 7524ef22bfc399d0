//! Matching service and signaling relay endpoints.

use crate::schema::RouletteConfig;

use super::helpers::{validate_range, validate_url};

pub(crate) fn validate_matching(errors: &mut Vec<String>, config: &RouletteConfig) {
    let matching = &config.matching;
    validate_url(errors, "matching.http_url", &matching.http_url, &["http", "https"]);
    validate_url(errors, "matching.ws_url", &matching.ws_url, &["ws", "wss"]);
    validate_range(
        errors,
        "matching.connect_timeout_secs",
        matching.connect_timeout_secs,
        1,
        120,
    );
    validate_range(
        errors,
        "matching.request_timeout_secs",
        matching.request_timeout_secs,
        1,
        120,
    );
}

pub(crate) fn validate_signaling(errors: &mut Vec<String>, config: &RouletteConfig) {
    let signaling = &config.signaling;
    validate_url(errors, "signaling.ws_url", &signaling.ws_url, &["ws", "wss"]);
    validate_range(
        errors,
        "signaling.connect_timeout_secs",
        signaling.connect_timeout_secs,
        1,
        120,
    );
}
