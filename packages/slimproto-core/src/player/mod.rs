//! Player identity, dynamic status, and the per-connection session entity.

pub mod info;
pub mod session;
pub mod status;

pub use info::PlayerInfo;
pub use session::{PlayerSession, StatEffect};
pub use status::{PlayerState, PlayerStatus};
