//! Discovered player descriptors

/// A discovered MPRIS player source
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayerSource {
    /// Full D-Bus name, e.g. "org.mpris.MediaPlayer2.spotify"
    pub bus_name: String,
    /// Identity from MPRIS, e.g. "Spotify"
    pub identity: String,
    /// Short name extracted from bus name, e.g. "spotify"
    pub short_name: String,
}

impl PlayerSource {
    /// Build a source from its bus name, falling back to the short name
    /// when the player does not report an identity.
    pub fn new(bus_name: String, identity: Option<String>) -> Self {
        let short_name = Self::extract_short_name(&bus_name);
        let identity = identity
            .filter(|identity| !identity.is_empty())
            .unwrap_or_else(|| short_name.clone());
        Self {
            bus_name,
            identity,
            short_name,
        }
    }

    /// Extract short name from full bus name
    /// "org.mpris.MediaPlayer2.spotify" -> "spotify"
    /// "org.mpris.MediaPlayer2.firefox.instance_1_234" -> "firefox"
    pub fn extract_short_name(bus_name: &str) -> String {
        bus_name
            .strip_prefix("org.mpris.MediaPlayer2.")
            .unwrap_or(bus_name)
            .split('.')
            .next()
            .unwrap_or(bus_name)
            .to_string()
    }
}
