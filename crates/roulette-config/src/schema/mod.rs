//! Configuration schema types.
//!
//! All structs use `serde(default)` so partial configs work correctly.

mod media;
mod services;
mod system;

pub use media::*;
pub use services::*;
pub use system::*;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RouletteConfig {
    pub matching: MatchingServiceConfig,
    pub signaling: SignalingServiceConfig,
    pub media: MediaConfig,
    pub peer: PeerConnectionConfig,
    pub logging: LoggingConfig,
}
