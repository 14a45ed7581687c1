//! castbar-mpris - MPRIS player discovery over D-Bus
//!
//! Features:
//! - Single session-bus connection shared by every player handle
//! - Player snapshots read properties live, so a player that quit is
//!   noticed on the next snapshot
//! - Metadata flattened into plain strings for template rendering

pub mod client;
pub mod error;
pub mod sources;
pub mod types;

pub use client::{MprisClient, PlayerHandle};
pub use error::MprisError;
pub use sources::PlayerSource;
pub use types::{PlaybackStatus, PlayerSnapshot};
