//! Client for the matching service.
//!
//! Registration is a plain HTTP request; matches arrive later on a
//! long-lived WebSocket keyed by the user's name.

mod client;
mod connection;
mod registrar;
mod types;

pub use client::MatchingChannel;
pub use registrar::{HttpRegistrar, Registrar};
pub use types::{MatchingConfig, MatchingEvent};
