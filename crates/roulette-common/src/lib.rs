pub mod errors;
pub mod id;
pub mod state;

pub use errors::{ConfigError, RouletteError, SessionError};
pub use id::{Role, RoomCode, UserName};
pub use state::SessionState;

pub type Result<T> = std::result::Result<T, RouletteError>;
