//! Local capture and the peer connection for one round.

mod devices;
mod peer;
mod session;
mod types;

pub use devices::{MediaDevices, NullDevices};
pub use peer::{
    PeerConfig, PeerConnector, PeerError, PeerEvent, PeerHandle, PeerLink, PeerOptions,
};
pub use session::{MediaEvent, MediaSession, MediaUpdate};
pub use types::{
    LocalStream, MediaConstraints, MediaError, MediaKind, MediaStream, MediaTrack, RemoteStream,
};
