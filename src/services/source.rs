//! Playback source abstraction.
//!
//! The core never talks to a device protocol directly. A `SourceRegistry`
//! reports what is reachable and opens long-lived `MediaSource` handles; the
//! device cache decides when to call it.

use crate::error::DiscoveryError;
use async_trait::async_trait;

/// Abstract playback state shared by every registry backend.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum PlaybackState {
    Playing,
    Paused,
    Idle,
    Buffering,
    #[default]
    Unknown,
    Other(String),
}

/// Attributes of one source as last observed by its registry.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SourceSnapshot {
    pub name: String,
    pub app: String,
    pub album: String,
    pub artist: String,
    pub title: String,
    pub is_active: bool,
    pub state: PlaybackState,
}

impl SourceSnapshot {
    /// Active sources take part in rotation.
    pub fn is_displayable(&self) -> bool {
        self.is_active && self.state != PlaybackState::Unknown
    }
}

/// Stable identity of something the registry reported.
pub trait Discovered {
    /// Opaque id, unique within one registry.
    fn id(&self) -> &str;

    /// Human-readable name used for ordering.
    fn label(&self) -> &str;
}

/// A connected playback source.
#[async_trait]
pub trait MediaSource: Discovered + Send + Sync {
    /// Fetch the current attributes.
    async fn snapshot(&self) -> Result<SourceSnapshot, DiscoveryError>;
}

/// Discovery backend.
#[async_trait]
pub trait SourceRegistry: Send + Sync {
    /// What discovery returns before a source is opened.
    type Found: Discovered + Send;
    type Source: MediaSource;

    /// List reachable sources. `pinned` carries the ids already known, so a
    /// backend can re-validate them instead of running a full scan.
    async fn discover(&self, pinned: Option<&[String]>)
    -> Result<Vec<Self::Found>, DiscoveryError>;

    /// Open a source that was not known before. Called once per id while the
    /// id stays in the cache.
    async fn open(&self, found: Self::Found) -> Result<Self::Source, DiscoveryError>;
}
