//! MPRIS-backed source registry.
//!
//! Uses castbar-mpris for D-Bus communication (single connection). Each
//! registered player keeps its proxy for as long as the device cache holds
//! it; snapshots are live reads.

use crate::error::DiscoveryError;
use crate::services::source::{
    Discovered, MediaSource, PlaybackState, SourceRegistry, SourceSnapshot,
};
use async_trait::async_trait;
use castbar_mpris::{MprisClient, PlaybackStatus, PlayerHandle, PlayerSnapshot, PlayerSource};
use log::debug;

pub struct MprisRegistry {
    client: MprisClient,
}

impl MprisRegistry {
    pub fn new(client: MprisClient) -> Self {
        Self { client }
    }
}

pub struct MprisSource {
    handle: PlayerHandle,
}

impl Discovered for PlayerSource {
    fn id(&self) -> &str {
        &self.bus_name
    }

    fn label(&self) -> &str {
        &self.identity
    }
}

impl Discovered for MprisSource {
    fn id(&self) -> &str {
        &self.handle.source().bus_name
    }

    fn label(&self) -> &str {
        &self.handle.source().identity
    }
}

#[async_trait]
impl MediaSource for MprisSource {
    async fn snapshot(&self) -> Result<SourceSnapshot, DiscoveryError> {
        let snapshot = self.handle.snapshot().await?;
        Ok(to_source_snapshot(snapshot))
    }
}

#[async_trait]
impl SourceRegistry for MprisRegistry {
    type Found = PlayerSource;
    type Source = MprisSource;

    /// Listing bus names is one round trip, so pinned ids are re-validated
    /// by the same call that picks up newly started players.
    async fn discover(
        &self,
        pinned: Option<&[String]>,
    ) -> Result<Vec<PlayerSource>, DiscoveryError> {
        let sources = self.client.discover_sources().await?;
        if let Some(pinned) = pinned {
            let gone = pinned
                .iter()
                .filter(|id| !sources.iter().any(|s| &s.bus_name == *id))
                .count();
            debug!("{} of {} known players left the bus", gone, pinned.len());
        }
        Ok(sources)
    }

    async fn open(&self, found: PlayerSource) -> Result<MprisSource, DiscoveryError> {
        let handle = self.client.open(found).await?;
        Ok(MprisSource { handle })
    }
}

fn to_source_snapshot(snapshot: PlayerSnapshot) -> SourceSnapshot {
    let is_active = snapshot.is_active();
    let state = match snapshot.status {
        Some(PlaybackStatus::Playing) => PlaybackState::Playing,
        Some(PlaybackStatus::Paused) => PlaybackState::Paused,
        Some(PlaybackStatus::Stopped) => PlaybackState::Idle,
        Some(PlaybackStatus::Other(raw)) => PlaybackState::Other(raw),
        None => PlaybackState::Unknown,
    };

    SourceSnapshot {
        name: snapshot.identity,
        app: snapshot.short_name,
        album: snapshot.album,
        artist: snapshot.artist,
        title: snapshot.title,
        is_active,
        state,
    }
}
