//! The session state machine.
//!
//! A single actor task owns the matching channel, the per-round signaling
//! channel, and the media session. Every state change happens inside its
//! event loop; callers interact through a cloneable [`SessionHandle`] and
//! observe a read-only [`SessionSnapshot`].

mod actor;
mod handle;
mod types;

pub use actor::Orchestrator;
pub use handle::SessionHandle;
pub use types::{SessionConfig, SessionDeps, SessionEvent, SessionSnapshot};
