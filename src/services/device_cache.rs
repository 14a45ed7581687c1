//! Cached view of the sources a registry reports.
//!
//! Sources are re-discovered once the TTL expires. A source whose id survives
//! a refresh keeps the same `Arc`, so its registry handle (and whatever
//! listeners it registered) is not rebuilt.

use crate::error::DiscoveryError;
use crate::services::source::{Discovered, SourceRegistry};
use log::{debug, info, warn};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

pub struct DeviceCache<R: SourceRegistry> {
    registry: R,
    sources: Vec<Arc<R::Source>>,
    /// `None` until the first discovery, which forces an immediate refresh.
    last_refresh: Option<Instant>,
    ttl: Duration,
    discovery_timeout: Duration,
}

impl<R: SourceRegistry> DeviceCache<R> {
    pub fn new(registry: R, ttl: Duration, discovery_timeout: Duration) -> Self {
        Self {
            registry,
            sources: Vec::new(),
            last_refresh: None,
            ttl,
            discovery_timeout,
        }
    }

    pub fn should_refresh(&self) -> bool {
        match self.last_refresh {
            Some(at) => at.elapsed() > self.ttl,
            None => true,
        }
    }

    /// Ids of the cached sources, in rotation order.
    pub fn ids(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.id().to_string()).collect()
    }

    /// Cached sources, refreshed first when stale.
    ///
    /// Discovery failures are logged and the previous list is kept until the
    /// next TTL expiry.
    pub async fn current_sources(&mut self) -> Vec<Arc<R::Source>> {
        if self.should_refresh() {
            info!("Source list expired, refreshing...");
            let known = self.ids();
            let pinned = (!known.is_empty()).then_some(known);
            match self.refresh(pinned.as_deref()).await {
                Ok(_) => info!("Next refresh in {}s", self.ttl.as_secs()),
                Err(e) => {
                    warn!(
                        "{}; keeping {} cached sources, retrying in {}s",
                        e,
                        self.sources.len(),
                        self.ttl.as_secs()
                    );
                    self.last_refresh = Some(Instant::now());
                }
            }
        }
        self.sources.clone()
    }

    /// Re-run discovery and merge the result into the cache.
    pub async fn refresh(
        &mut self,
        pinned: Option<&[String]>,
    ) -> Result<Vec<Arc<R::Source>>, DiscoveryError> {
        let limit = self.discovery_timeout;
        let merged = tokio::time::timeout(limit, self.discover_and_merge(pinned))
            .await
            .map_err(|_| DiscoveryError::Timeout(limit))??;

        for old in &self.sources {
            if !merged.iter().any(|s| s.id() == old.id()) {
                info!("Dropping source: {}", old.id());
            }
        }

        self.sources = merged;
        self.last_refresh = Some(Instant::now());

        let labels: Vec<&str> = self.sources.iter().map(|s| s.label()).collect();
        info!("Found {} sources: {}", labels.len(), labels.join(", "));

        Ok(self.sources.clone())
    }

    async fn discover_and_merge(
        &self,
        pinned: Option<&[String]>,
    ) -> Result<Vec<Arc<R::Source>>, DiscoveryError> {
        match pinned {
            Some(ids) => debug!("Revalidating {} known sources", ids.len()),
            None => info!("Searching for media sources"),
        }

        let mut found = self.registry.discover(pinned).await?;
        let mut seen = HashSet::new();
        found.retain(|entry| seen.insert(entry.id().to_string()));
        found.sort_by(|a, b| a.label().cmp(b.label()).then_with(|| a.id().cmp(b.id())));

        let mut merged = Vec::with_capacity(found.len());
        for entry in found {
            if let Some(existing) = self.sources.iter().find(|s| s.id() == entry.id()) {
                debug!("Keeping existing source: {}", entry.id());
                merged.push(Arc::clone(existing));
                continue;
            }

            let id = entry.id().to_string();
            match self.registry.open(entry).await {
                Ok(source) => {
                    info!("Registered source: {}", id);
                    merged.push(Arc::new(source));
                }
                Err(e) => warn!("Failed to register source {}: {}", id, e),
            }
        }

        Ok(merged)
    }
}
