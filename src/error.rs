//! Error types for castbar

use std::path::PathBuf;
use std::time::Duration;

/// Top-level error returned from startup and the render loop.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Output error: {0}")]
    Io(#[from] std::io::Error),
}

/// Source registry enumeration or query failed
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("Discovery failed: {0}")]
    Registry(String),

    #[error("Discovery timed out after {0:?}")]
    Timeout(Duration),
}

impl From<castbar_mpris::MprisError> for DiscoveryError {
    fn from(e: castbar_mpris::MprisError) -> Self {
        DiscoveryError::Registry(e.to_string())
    }
}

/// Format template or blacklist pattern is invalid
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("Unknown placeholder {{{0}}} in format")]
    UnknownPlaceholder(String),

    #[error("Unbalanced brace at byte {0} in format")]
    UnbalancedBrace(usize),

    #[error("Invalid blacklist regex: {0}")]
    Blacklist(#[from] regex::Error),
}

/// Config file could not be loaded
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}
