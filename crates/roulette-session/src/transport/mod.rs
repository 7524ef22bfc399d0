//! Peer-connection backends.
//!
//! The orchestrator only sees [`PeerConnector`](crate::media::PeerConnector);
//! this module provides the native one behind the `webrtc` feature.

#[cfg(feature = "webrtc")]
mod webrtc_peer;

#[cfg(feature = "webrtc")]
pub use webrtc_peer::{RtcLocalTrack, RtcRemoteTrack, WebRtcConnector};
