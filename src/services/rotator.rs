//! Status rotation across active sources.
//!
//! Each pass walks the cached sources in order, snapshots them lazily and
//! yields one rendered status per call. A pass that yields nothing produces a
//! single empty status, and the following call waits before the next pass.

use crate::error::FormatError;
use crate::functions::formatting::{GlyphSet, Template};
use crate::services::device_cache::DeviceCache;
use crate::services::source::{Discovered, MediaSource, SourceRegistry};
use async_trait::async_trait;
use log::debug;
use regex::Regex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

/// Wait between passes when nothing is active.
pub const IDLE_PAUSE: Duration = Duration::from_secs(1);

/// Pull-based source of rendered statuses for the output driver.
#[async_trait]
pub trait StatusFeed: Send {
    /// Next status in rotation. Empty when nothing is active.
    async fn next_status(&mut self) -> String;

    /// Fresh rendering of the status last returned by `next_status`, or
    /// `None` when it should be replaced by the next one in rotation.
    async fn current_status(&mut self) -> Option<String>;
}

/// Compile blacklist patterns into one matcher.
///
/// Empty patterns are ignored; no patterns at all disables the blacklist.
pub fn build_blacklist(patterns: &[String]) -> Result<Option<Regex>, FormatError> {
    let patterns: Vec<&str> = patterns
        .iter()
        .map(String::as_str)
        .filter(|p| !p.is_empty())
        .collect();

    match patterns.as_slice() {
        [] => Ok(None),
        [single] => Ok(Some(Regex::new(single)?)),
        many => {
            let joined = many
                .iter()
                .map(|p| format!("(?:{p})"))
                .collect::<Vec<_>>()
                .join("|");
            Ok(Some(Regex::new(&joined)?))
        }
    }
}

pub struct StatusRotator<R: SourceRegistry> {
    cache: DeviceCache<R>,
    template: Template,
    glyphs: GlyphSet,
    blacklist: Option<Regex>,
    queue: VecDeque<Arc<R::Source>>,
    /// Source behind the last non-empty status.
    current: Option<Arc<R::Source>>,
    in_pass: bool,
    pass_yielded: bool,
    pause_pending: bool,
}

impl<R: SourceRegistry> StatusRotator<R> {
    pub fn new(
        cache: DeviceCache<R>,
        template: Template,
        glyphs: GlyphSet,
        blacklist: Option<Regex>,
    ) -> Self {
        Self {
            cache,
            template,
            glyphs,
            blacklist,
            queue: VecDeque::new(),
            current: None,
            in_pass: false,
            pass_yielded: false,
            pause_pending: false,
        }
    }

    fn is_blacklisted(&self, status: &str) -> bool {
        self.blacklist
            .as_ref()
            .is_some_and(|blacklist| blacklist.is_match(status))
    }

    /// Render one source if it is active and not blacklisted.
    async fn render(&self, source: &R::Source) -> Option<String> {
        let snapshot = match source.snapshot().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                debug!("Skipping {}: {}", source.id(), e);
                return None;
            }
        };

        if !snapshot.is_displayable() {
            return None;
        }

        let status = self.template.render(&snapshot, self.glyphs);
        if self.is_blacklisted(&status) {
            debug!("Blacklisted status from {}: {:?}", source.label(), status);
            return None;
        }
        Some(status)
    }
}

#[async_trait]
impl<R: SourceRegistry> StatusFeed for StatusRotator<R> {
    async fn next_status(&mut self) -> String {
        loop {
            if let Some(source) = self.queue.pop_front() {
                if let Some(status) = self.render(&source).await {
                    self.pass_yielded = true;
                    self.current = Some(source);
                    return status;
                }
                continue;
            }

            if self.in_pass {
                self.in_pass = false;
                if !self.pass_yielded {
                    self.current = None;
                    self.pause_pending = true;
                    return String::new();
                }
            }

            if self.pause_pending {
                self.pause_pending = false;
                tokio::time::sleep(IDLE_PAUSE).await;
            }

            self.queue = self.cache.current_sources().await.into();
            self.in_pass = true;
            self.pass_yielded = false;
        }
    }

    async fn current_status(&mut self) -> Option<String> {
        if let Some(source) = self.current.clone() {
            return self.render(&source).await;
        }

        // Idle: stay blank until any source becomes displayable
        let sources = self.cache.current_sources().await;
        for source in &sources {
            if self.render(source).await.is_some() {
                self.pause_pending = false;
                return None;
            }
        }
        Some(String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::source::{PlaybackState, SourceSnapshot};
    use crate::services::testing::{FakeRegistry, playing};
    use tokio::time::Instant;

    const FORMAT: &str = "{name}: {artist} - {title}";

    fn rotator(registry: &FakeRegistry, blacklist: &[&str]) -> StatusRotator<FakeRegistry> {
        let cache = DeviceCache::new(
            registry.clone(),
            Duration::from_secs(180),
            Duration::from_secs(10),
        );
        let patterns: Vec<String> = blacklist.iter().map(|p| p.to_string()).collect();
        StatusRotator::new(
            cache,
            Template::parse(FORMAT).unwrap(),
            GlyphSet::Ascii,
            build_blacklist(&patterns).unwrap(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_rotates_in_source_order() {
        let registry = FakeRegistry::new();
        registry.upsert(playing("Kitchen", "Eno", "An Ending"));
        registry.upsert(playing("Den", "Bowie", "Heroes"));
        let mut rotator = rotator(&registry, &[]);

        assert_eq!(rotator.next_status().await, "Den: Bowie - Heroes");
        assert_eq!(rotator.next_status().await, "Kitchen: Eno - An Ending");
        assert_eq!(rotator.next_status().await, "Den: Bowie - Heroes");
        assert_eq!(rotator.next_status().await, "Kitchen: Eno - An Ending");
    }

    #[tokio::test(start_paused = true)]
    async fn test_blacklisted_status_never_yielded() {
        let registry = FakeRegistry::new();
        registry.upsert(playing("Den", "Bowie", "Heroes"));
        registry.upsert(playing("Hall", "Nobody", "Advertisement"));
        registry.upsert(playing("Kitchen", "Eno", "An Ending"));
        let mut rotator = rotator(&registry, &["Advert"]);

        let statuses = [
            rotator.next_status().await,
            rotator.next_status().await,
            rotator.next_status().await,
            rotator.next_status().await,
        ];
        assert_eq!(
            statuses,
            [
                "Den: Bowie - Heroes",
                "Kitchen: Eno - An Ending",
                "Den: Bowie - Heroes",
                "Kitchen: Eno - An Ending",
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_multiple_blacklist_patterns() {
        let registry = FakeRegistry::new();
        registry.upsert(playing("Den", "Bowie", "Heroes"));
        registry.upsert(playing("Hall", "Nobody", "Advertisement"));
        registry.upsert(playing("Kitchen", "Eno", "An Ending"));
        let mut rotator = rotator(&registry, &["Advert", "^Den"]);

        assert_eq!(rotator.next_status().await, "Kitchen: Eno - An Ending");
        assert_eq!(rotator.next_status().await, "Kitchen: Eno - An Ending");
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_active_sources_yields_empty_with_pause() {
        let registry = FakeRegistry::new();
        registry.set_sources(&["Den", "Kitchen"]);
        let mut rotator = rotator(&registry, &[]);

        let start = Instant::now();
        assert_eq!(rotator.next_status().await, "");
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(rotator.next_status().await, "");
        assert_eq!(start.elapsed(), IDLE_PAUSE);
        assert_eq!(rotator.next_status().await, "");
        assert_eq!(start.elapsed(), IDLE_PAUSE * 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_blacklisted_does_not_spin() {
        let registry = FakeRegistry::new();
        registry.upsert(playing("Hall", "Nobody", "Advertisement"));
        let mut rotator = rotator(&registry, &["Advert"]);

        let start = Instant::now();
        assert_eq!(rotator.next_status().await, "");
        assert_eq!(rotator.next_status().await, "");
        assert_eq!(start.elapsed(), IDLE_PAUSE);
    }

    #[tokio::test(start_paused = true)]
    async fn test_inactive_and_unknown_sources_skipped() {
        let registry = FakeRegistry::new();
        registry.upsert(playing("Den", "Bowie", "Heroes"));
        registry.upsert(SourceSnapshot {
            is_active: false,
            ..playing("Hall", "Nobody", "Silence")
        });
        registry.upsert(SourceSnapshot {
            state: PlaybackState::Unknown,
            ..playing("Kitchen", "Eno", "An Ending")
        });
        let mut rotator = rotator(&registry, &[]);

        assert_eq!(rotator.next_status().await, "Den: Bowie - Heroes");
        assert_eq!(rotator.next_status().await, "Den: Bowie - Heroes");
    }

    #[tokio::test(start_paused = true)]
    async fn test_current_status_follows_track_changes() {
        let registry = FakeRegistry::new();
        registry.upsert(playing("Den", "Bowie", "Heroes"));
        let mut rotator = rotator(&registry, &[]);

        assert_eq!(rotator.next_status().await, "Den: Bowie - Heroes");
        assert_eq!(
            rotator.current_status().await.as_deref(),
            Some("Den: Bowie - Heroes")
        );

        registry.upsert(playing("Den", "Bowie", "Sound and Vision"));
        assert_eq!(
            rotator.current_status().await.as_deref(),
            Some("Den: Bowie - Sound and Vision")
        );

        registry.upsert(SourceSnapshot {
            state: PlaybackState::Unknown,
            ..playing("Den", "Bowie", "Sound and Vision")
        });
        assert_eq!(rotator.current_status().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_current_status_when_idle() {
        let registry = FakeRegistry::new();
        registry.set_sources(&["Den"]);
        let mut rotator = rotator(&registry, &[]);

        assert_eq!(rotator.next_status().await, "");
        assert_eq!(rotator.current_status().await.as_deref(), Some(""));

        registry.upsert(playing("Den", "Bowie", "Heroes"));
        assert_eq!(rotator.current_status().await, None);

        // Something is playing again, so the idle pause is skipped
        let start = Instant::now();
        assert_eq!(rotator.next_status().await, "Den: Bowie - Heroes");
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_vanished_source_is_skipped() {
        let registry = FakeRegistry::new();
        registry.upsert(playing("Den", "Bowie", "Heroes"));
        registry.upsert(playing("Kitchen", "Eno", "An Ending"));
        let mut rotator = rotator(&registry, &[]);

        assert_eq!(rotator.next_status().await, "Den: Bowie - Heroes");
        registry.remove("Kitchen");
        assert_eq!(rotator.next_status().await, "Den: Bowie - Heroes");
    }

    #[test]
    fn test_build_blacklist() {
        assert!(build_blacklist(&[]).unwrap().is_none());
        assert!(build_blacklist(&[String::new()]).unwrap().is_none());

        let single = build_blacklist(&["^Den".to_string()]).unwrap().unwrap();
        assert!(single.is_match("Den: Bowie - Heroes"));
        assert!(!single.is_match("Kitchen: Den"));

        let joined = build_blacklist(&["a|b".to_string(), "^c$".to_string()])
            .unwrap()
            .unwrap();
        assert!(joined.is_match("xbx"));
        assert!(joined.is_match("c"));
        assert!(!joined.is_match("xcx"));

        assert!(matches!(
            build_blacklist(&["(".to_string()]),
            Err(FormatError::Blacklist(_))
        ));
    }
}
