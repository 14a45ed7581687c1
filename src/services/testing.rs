//! In-memory registry for tests.

use crate::error::DiscoveryError;
use crate::services::source::{
    Discovered, MediaSource, PlaybackState, SourceRegistry, SourceSnapshot,
};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct FakeState {
    sources: Vec<SourceSnapshot>,
    /// Extra `(id, label)` entries reported after the regular sources.
    duplicates: Vec<(String, String)>,
    unopenable: HashSet<String>,
    failing: bool,
    delay: Option<Duration>,
    discover_calls: usize,
    open_calls: usize,
    last_pinned: Option<Vec<String>>,
}

/// Registry whose sources are keyed by `SourceSnapshot::name`.
#[derive(Clone, Default)]
pub struct FakeRegistry {
    state: Arc<Mutex<FakeState>>,
}

impl FakeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the reachable sources with idle, inactive ones.
    pub fn set_sources(&self, names: &[&str]) {
        let snapshots = names
            .iter()
            .map(|name| SourceSnapshot {
                name: name.to_string(),
                state: PlaybackState::Idle,
                ..Default::default()
            })
            .collect();
        self.state.lock().unwrap().sources = snapshots;
    }

    /// Add or replace one source by name.
    pub fn upsert(&self, snapshot: SourceSnapshot) {
        let mut state = self.state.lock().unwrap();
        match state.sources.iter_mut().find(|s| s.name == snapshot.name) {
            Some(existing) => *existing = snapshot,
            None => state.sources.push(snapshot),
        }
    }

    pub fn remove(&self, name: &str) {
        self.state.lock().unwrap().sources.retain(|s| s.name != name);
    }

    pub fn add_duplicate(&self, id: &str, label: &str) {
        self.state
            .lock()
            .unwrap()
            .duplicates
            .push((id.to_string(), label.to_string()));
    }

    pub fn set_failing(&self, failing: bool) {
        self.state.lock().unwrap().failing = failing;
    }

    pub fn set_delay(&self, delay: Option<Duration>) {
        self.state.lock().unwrap().delay = delay;
    }

    pub fn set_unopenable(&self, name: &str) {
        self.state.lock().unwrap().unopenable.insert(name.to_string());
    }

    pub fn discover_calls(&self) -> usize {
        self.state.lock().unwrap().discover_calls
    }

    pub fn open_calls(&self) -> usize {
        self.state.lock().unwrap().open_calls
    }

    pub fn last_pinned(&self) -> Option<Vec<String>> {
        self.state.lock().unwrap().last_pinned.clone()
    }
}

/// Playing source with the given attributes.
pub fn playing(name: &str, artist: &str, title: &str) -> SourceSnapshot {
    SourceSnapshot {
        name: name.to_string(),
        app: "Default Media Receiver".to_string(),
        artist: artist.to_string(),
        title: title.to_string(),
        is_active: true,
        state: PlaybackState::Playing,
        ..Default::default()
    }
}

pub struct FakeFound {
    id: String,
    label: String,
}

impl Discovered for FakeFound {
    fn id(&self) -> &str {
        &self.id
    }

    fn label(&self) -> &str {
        &self.label
    }
}

pub struct FakeSource {
    name: String,
    state: Arc<Mutex<FakeState>>,
}

impl Discovered for FakeSource {
    fn id(&self) -> &str {
        &self.name
    }

    fn label(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl MediaSource for FakeSource {
    async fn snapshot(&self) -> Result<SourceSnapshot, DiscoveryError> {
        let state = self.state.lock().unwrap();
        state
            .sources
            .iter()
            .find(|s| s.name == self.name)
            .cloned()
            .ok_or_else(|| DiscoveryError::Registry(format!("{} is gone", self.name)))
    }
}

#[async_trait]
impl SourceRegistry for FakeRegistry {
    type Found = FakeFound;
    type Source = FakeSource;

    async fn discover(
        &self,
        pinned: Option<&[String]>,
    ) -> Result<Vec<FakeFound>, DiscoveryError> {
        let delay = {
            let mut state = self.state.lock().unwrap();
            state.discover_calls += 1;
            state.last_pinned = pinned.map(|ids| ids.to_vec());
            state.delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let state = self.state.lock().unwrap();
        if state.failing {
            return Err(DiscoveryError::Registry("network unreachable".to_string()));
        }
        let regular = state.sources.iter().map(|s| FakeFound {
            id: s.name.clone(),
            label: s.name.clone(),
        });
        let duplicates = state.duplicates.iter().map(|(id, label)| FakeFound {
            id: id.clone(),
            label: label.clone(),
        });
        Ok(regular.chain(duplicates).collect())
    }

    async fn open(&self, found: FakeFound) -> Result<FakeSource, DiscoveryError> {
        let mut state = self.state.lock().unwrap();
        state.open_calls += 1;
        if state.unopenable.contains(&found.id) {
            return Err(DiscoveryError::Registry(format!("{} refused", found.id)));
        }
        Ok(FakeSource {
            name: found.id,
            state: Arc::clone(&self.state),
        })
    }
}
