//! MPRIS client implementation
//!
//! One session-bus connection for the whole process:
//! - Discovery lists `org.mpris.MediaPlayer2.*` names and reads each identity
//! - A `PlayerHandle` owns an uncached player proxy, so every snapshot is a
//!   live read and a player that left the bus fails its next snapshot

use crate::error::MprisError;
use crate::sources::PlayerSource;
use crate::types::{PlaybackStatus, PlayerSnapshot};
use futures_util::future::join_all;
use log::{debug, info};
use std::collections::HashMap;
use zbus::Connection;
use zbus::proxy::CacheProperties;
use zbus::zvariant::OwnedValue;

const MPRIS_PREFIX: &str = "org.mpris.MediaPlayer2.";

/// Player properties are never served from a local cache.
const PLAYER_PROPERTY_CACHE: CacheProperties = CacheProperties::No;

/// D-Bus proxy for MPRIS player interface
#[zbus::proxy(
    interface = "org.mpris.MediaPlayer2.Player",
    default_path = "/org/mpris/MediaPlayer2"
)]
trait MprisPlayer {
    #[zbus(property)]
    fn metadata(&self) -> zbus::Result<HashMap<String, OwnedValue>>;

    #[zbus(property)]
    fn playback_status(&self) -> zbus::Result<String>;
}

/// D-Bus proxy for MPRIS root interface
#[zbus::proxy(
    interface = "org.mpris.MediaPlayer2",
    default_path = "/org/mpris/MediaPlayer2"
)]
trait MprisRoot {
    #[zbus(property)]
    fn identity(&self) -> zbus::Result<String>;
}

/// MPRIS client bound to the session bus
#[derive(Clone)]
pub struct MprisClient {
    connection: Connection,
}

impl MprisClient {
    /// Connect to the session bus.
    pub async fn connect() -> Result<Self, MprisError> {
        let connection = Connection::session().await?;
        info!("Connected to D-Bus session bus");
        Ok(Self { connection })
    }

    /// Discover all MPRIS players currently owning a name on the bus.
    pub async fn discover_sources(&self) -> Result<Vec<PlayerSource>, MprisError> {
        let dbus_proxy = zbus::fdo::DBusProxy::new(&self.connection).await?;
        let names = dbus_proxy.list_names().await?;

        let bus_names: Vec<String> = names
            .iter()
            .map(|name| name.to_string())
            .filter(|name| name.starts_with(MPRIS_PREFIX))
            .collect();

        debug!("Found {} MPRIS names on the bus", bus_names.len());

        let lookups = bus_names.into_iter().map(|bus_name| async move {
            let identity = self.identity(&bus_name).await;
            PlayerSource::new(bus_name, identity)
        });

        Ok(join_all(lookups).await)
    }

    /// Open a long-lived handle to one player.
    pub async fn open(&self, source: PlayerSource) -> Result<PlayerHandle, MprisError> {
        let proxy = MprisPlayerProxy::builder(&self.connection)
            .destination(source.bus_name.clone())?
            .cache_properties(PLAYER_PROPERTY_CACHE)
            .build()
            .await?;
        debug!("Opened player proxy for {}", source.bus_name);
        Ok(PlayerHandle { source, proxy })
    }

    async fn identity(&self, bus_name: &str) -> Option<String> {
        let proxy = MprisRootProxy::builder(&self.connection)
            .destination(bus_name.to_string())
            .ok()?
            .cache_properties(CacheProperties::No)
            .build()
            .await
            .ok()?;
        match proxy.identity().await {
            Ok(identity) => Some(identity),
            Err(e) => {
                debug!("No identity for {}: {}", bus_name, e);
                None
            }
        }
    }
}

/// A registered player.
pub struct PlayerHandle {
    source: PlayerSource,
    proxy: MprisPlayerProxy<'static>,
}

impl PlayerHandle {
    pub fn source(&self) -> &PlayerSource {
        &self.source
    }

    /// Read the current metadata and playback status from the bus.
    ///
    /// A failed metadata read means the player is gone. A failed status read
    /// is reported as `status: None` so callers can treat it as unknown.
    pub async fn snapshot(&self) -> Result<PlayerSnapshot, MprisError> {
        let metadata = self.proxy.metadata().await;
        let status = self.proxy.playback_status().await;
        to_snapshot(&self.source, metadata, status)
    }
}

fn to_snapshot(
    source: &PlayerSource,
    metadata: zbus::Result<HashMap<String, OwnedValue>>,
    status: zbus::Result<String>,
) -> Result<PlayerSnapshot, MprisError> {
    let metadata = metadata.map_err(|e| {
        debug!("Metadata read failed for {}: {}", source.bus_name, e);
        MprisError::Disconnected(source.bus_name.clone())
    })?;

    let status = match status {
        Ok(status) => Some(PlaybackStatus::from_str(&status)),
        Err(e) => {
            debug!("PlaybackStatus read failed for {}: {}", source.bus_name, e);
            None
        }
    };

    Ok(PlayerSnapshot {
        identity: source.identity.clone(),
        short_name: source.short_name.clone(),
        title: extract_string(&metadata, "xesam:title").unwrap_or_default(),
        artist: extract_str_array(&metadata, "xesam:artist").unwrap_or_default(),
        album: extract_string(&metadata, "xesam:album").unwrap_or_default(),
        status,
    })
}

// ============ Metadata extraction helpers ============

fn extract_string(map: &HashMap<String, OwnedValue>, key: &str) -> Option<String> {
    use std::ops::Deref;
    use zbus::zvariant::Value;

    map.get(key).and_then(|v| match v.deref() {
        Value::Str(s) => Some(s.to_string()),
        _ => None,
    })
}

/// xesam:artist should be a string list, but some players send a plain string.
fn extract_str_array(map: &HashMap<String, OwnedValue>, key: &str) -> Option<String> {
    use std::ops::Deref;
    use zbus::zvariant::Value;

    map.get(key).and_then(|v| match v.deref() {
        Value::Str(s) => Some(s.to_string()),
        Value::Array(arr) => {
            let strings: Vec<String> = arr
                .iter()
                .filter_map(|item| match item {
                    Value::Str(s) => Some(s.to_string()),
                    _ => None,
                })
                .collect();
            if strings.is_empty() {
                None
            } else {
                Some(strings.join(", "))
            }
        }
        _ => None,
    })
}
