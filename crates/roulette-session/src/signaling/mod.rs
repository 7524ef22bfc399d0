//! Client for the signaling relay.
//!
//! One WebSocket per round carries the join handshake, relayed negotiation
//! payloads, and the relay's `peer-disconnected` notice. Outbound sends are
//! fire-and-forget; readiness is awaited through a [`Readiness`] future
//! instead of polling the socket state.

mod client;
mod connection;
mod types;

pub use client::{Readiness, SignalingChannel, SignalingSender};
pub use types::{ChannelState, EnvelopeSink, SignalingConfig, SignalingEvent};
