//! castbar - media player status for status bars
//!
//! Prints one line per frame to stdout. Discovery, rotation and output all
//! run on a single current-thread runtime.

mod config;
mod error;
mod functions;
mod panels;
mod services;

use clap::Parser;
use config::{Cli, DisplayConfig};
use error::{DiscoveryError, Error};
use functions::formatting::{GlyphSet, Template};
use log::{error, info, warn};
use panels::status_line::StatusLine;
use services::device_cache::DeviceCache;
use services::mpris::MprisRegistry;
use services::rotator::{StatusRotator, build_blacklist};
use std::io::{self, Write};
use std::process::ExitCode;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG overrides -v/-q
    env_logger::Builder::new()
        .filter_level(cli.verbose.log_level_filter())
        .parse_default_env()
        .init();

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            clear_line();
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(&cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(Error::Io(e)) => {
            // The driver already tried to blank the line
            error!("{}", e);
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("{}", e);
            clear_line();
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> Result<(), Error> {
    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        wait_for_shutdown().await;
        shutdown.cancel();
    });

    let config = DisplayConfig::resolve(cli)?;
    let template = Template::from_option(config.format.as_deref())?;
    let blacklist = build_blacklist(&config.blacklist)?;
    let glyphs = GlyphSet::from_unicode_flag(config.unicode);

    let connect = castbar_mpris::MprisClient::connect();
    let Some(client) = connect_until_cancelled(connect, config.discovery_timeout, &cancel).await?
    else {
        info!("Stopped before connecting");
        clear_line();
        return Ok(());
    };

    let cache = DeviceCache::new(
        MprisRegistry::new(client),
        config.ttl,
        config.discovery_timeout,
    );
    let mut rotator = StatusRotator::new(cache, template, glyphs, blacklist);

    info!("Starting castbar v{}", env!("CARGO_PKG_VERSION"));
    let mut line = StatusLine::new(&config, io::stdout());
    line.run(&mut rotator, &cancel).await?;
    info!("Stopped");
    Ok(())
}

/// Bounded connect that gives way to shutdown. `Ok(None)` means cancelled.
async fn connect_until_cancelled<T, E>(
    connect: impl Future<Output = Result<T, E>>,
    limit: Duration,
    cancel: &CancellationToken,
) -> Result<Option<T>, DiscoveryError>
where
    DiscoveryError: From<E>,
{
    match cancel
        .run_until_cancelled(tokio::time::timeout(limit, connect))
        .await
    {
        None => Ok(None),
        Some(Err(_)) => Err(DiscoveryError::Timeout(limit)),
        Some(Ok(connected)) => Ok(Some(connected?)),
    }
}

/// Resolves on the first SIGINT or SIGTERM. A listener that cannot be
/// installed never fires.
#[cfg(unix)]
async fn wait_for_shutdown() {
    use tokio::signal::unix::{SignalKind, signal};

    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
            }
            Err(e) => {
                warn!("Cannot listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        _ = interrupt() => info!("Interrupted"),
        _ = terminate => info!("Terminated"),
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown() {
    interrupt().await;
    info!("Interrupted");
}

async fn interrupt() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Cannot listen for SIGINT: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Leave an empty line so the bar stops showing stale text.
fn clear_line() {
    let mut stdout = io::stdout();
    let _ = writeln!(stdout);
    let _ = stdout.flush();
}
