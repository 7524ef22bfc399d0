//! Session orchestration for anonymous one-to-one video chat.
//!
//! The [`Orchestrator`] drives a user from registration to a matched room,
//! negotiates a peer connection over the signaling relay, and tears the
//! round down again on disconnect, error, or find-next. Matching, signaling
//! and media each live in their own module and talk to the orchestrator
//! only through channels.

pub mod matching;
pub mod media;
pub mod orchestrator;
pub mod protocol;
pub mod signaling;
pub mod transport;
mod ws;

pub use matching::{HttpRegistrar, MatchingChannel, MatchingConfig, MatchingEvent, Registrar};
pub use media::{
    LocalStream, MediaConstraints, MediaDevices, MediaError, MediaEvent, MediaKind, MediaSession,
    MediaStream, MediaTrack, MediaUpdate, NullDevices, PeerConfig, PeerConnector, PeerError,
    PeerEvent, PeerHandle, PeerLink, PeerOptions, RemoteStream,
};
pub use orchestrator::{
    Orchestrator, SessionConfig, SessionDeps, SessionEvent, SessionHandle, SessionSnapshot,
};
pub use protocol::{PayloadType, SignalEnvelope};
pub use signaling::{
    ChannelState, EnvelopeSink, Readiness, SignalingChannel, SignalingConfig, SignalingEvent,
    SignalingSender,
};
