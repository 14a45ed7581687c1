//! Core types for castbar-mpris

/// Playback status from MPRIS player
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum PlaybackStatus {
    Playing,
    Paused,
    #[default]
    Stopped,
    /// Non-standard status string reported by a misbehaving player
    Other(String),
}

impl PlaybackStatus {
    pub fn from_str(s: &str) -> Self {
        match s {
            "Playing" => PlaybackStatus::Playing,
            "Paused" => PlaybackStatus::Paused,
            "Stopped" => PlaybackStatus::Stopped,
            other => PlaybackStatus::Other(other.to_string()),
        }
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self, PlaybackStatus::Stopped)
    }
}

/// Point-in-time view of one player, read fresh from the bus.
#[derive(Clone, Debug, Default)]
pub struct PlayerSnapshot {
    /// Identity from MPRIS, e.g. "Spotify"
    pub identity: String,
    /// Short name, e.g. "spotify", "firefox"
    pub short_name: String,
    pub title: String,
    /// Artists joined with ", "
    pub artist: String,
    pub album: String,
    /// `None` when the player did not answer the PlaybackStatus read
    pub status: Option<PlaybackStatus>,
}

impl PlayerSnapshot {
    /// A player counts as active while it has a track loaded or is not stopped.
    pub fn is_active(&self) -> bool {
        match &self.status {
            Some(status) => !self.title.is_empty() || !status.is_stopped(),
            None => !self.title.is_empty(),
        }
    }
}
