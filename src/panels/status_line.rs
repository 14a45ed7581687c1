//! Single-line status output.
//!
//! Drives the rotation: pulls a status, scrolls it through a marquee, writes
//! each changed frame as one flushed line and decides when to move on. Every
//! exit from `run`, including a panic below it, leaves a blank line behind so
//! the bar does not keep showing stale text after the process stops.

use crate::config::DisplayConfig;
use crate::functions::marquee::Marquee;
use crate::services::rotator::StatusFeed;
use futures_util::FutureExt;
use log::debug;
use std::io::{self, Write};
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

pub struct StatusLine<W: Write> {
    out: W,
    period: Duration,
    width: usize,
    scroll_step: Duration,
    edge_pause: Duration,
    last_written: Option<String>,
}

impl<W: Write> StatusLine<W> {
    pub fn new(config: &DisplayConfig, out: W) -> Self {
        Self {
            out,
            period: config.period,
            width: config.width,
            scroll_step: config.scroll_step(),
            edge_pause: config.marquee_pause,
            last_written: None,
        }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Run until cancelled or until output fails, then write the final
    /// blank line. A panic in the feed still blanks the line before it
    /// propagates.
    pub async fn run<F: StatusFeed>(
        &mut self,
        feed: &mut F,
        cancel: &CancellationToken,
    ) -> io::Result<()> {
        let result = AssertUnwindSafe(self.drive(feed, cancel))
            .catch_unwind()
            .await;
        let cleared = self.write_line("");
        match result {
            Ok(result) => result.and(cleared),
            Err(payload) => panic::resume_unwind(payload),
        }
    }

    async fn drive<F: StatusFeed>(
        &mut self,
        feed: &mut F,
        cancel: &CancellationToken,
    ) -> io::Result<()> {
        let mut shown: Option<String> = None;
        let mut marquee: Option<Marquee> = None;

        loop {
            let Some(status) = cancel.run_until_cancelled(feed.next_status()).await else {
                return Ok(());
            };
            let selected_at = Instant::now();

            if shown.as_ref() != Some(&status) {
                debug!("Showing {:?}", status);
                marquee = None;
                shown = Some(status);
            }

            loop {
                let frames = marquee.get_or_insert_with(|| {
                    Marquee::new(shown.as_deref().unwrap_or_default(), self.width)
                });
                let Some((at_extreme, window)) = frames.next() else {
                    break;
                };

                self.write_if_changed(window)?;

                let delay = if at_extreme {
                    self.edge_pause
                } else {
                    self.scroll_step
                };
                if cancel
                    .run_until_cancelled(tokio::time::sleep(delay))
                    .await
                    .is_none()
                {
                    return Ok(());
                }

                if !at_extreme {
                    continue;
                }
                if selected_at.elapsed() > self.period {
                    break;
                }

                // Between rotations, follow changes of the status on screen
                let Some(current) = cancel.run_until_cancelled(feed.current_status()).await
                else {
                    return Ok(());
                };
                match current {
                    Some(text) if shown.as_ref() == Some(&text) => {}
                    Some(text) => {
                        debug!("Status changed to {:?}", text);
                        marquee = None;
                        shown = Some(text);
                    }
                    None => {
                        debug!("Status no longer available, rotating");
                        break;
                    }
                }
            }
        }
    }

    fn write_if_changed(&mut self, window: String) -> io::Result<()> {
        if self.last_written.as_ref() == Some(&window) {
            return Ok(());
        }
        self.write_line(&window)?;
        self.last_written = Some(window);
        Ok(())
    }

    fn write_line(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.out, "{line}")?;
        self.out.flush()
    }
}
