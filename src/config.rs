//! Command line and config file handling.
//!
//! Values come from built-in defaults, then the JSON config file, then the
//! command line. Out-of-range numbers are clamped rather than rejected.

use crate::error::ConfigError;
use clap::Parser;
use clap_verbosity_flag::{Verbosity, WarnLevel};
use log::debug;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_DIR: &str = "castbar";
const CONFIG_FILE: &str = "config.json";

pub const DEFAULT_PERIOD_SECS: f64 = 10.0;
pub const DEFAULT_WIDTH: i64 = 85;
pub const DEFAULT_MARQUEE_SPEED: f64 = 5.0;
pub const DEFAULT_MARQUEE_PAUSE_SECS: f64 = 2.0;
pub const DEFAULT_TTL_SECS: f64 = 180.0;
pub const DEFAULT_DISCOVERY_TIMEOUT_SECS: f64 = 10.0;
/// Slowest accepted scroll speed, in characters per second.
pub const MIN_MARQUEE_SPEED: f64 = 0.1;

/// Show media player status in a format suitable for status bars.
#[derive(Parser, Debug)]
#[command(name = "castbar", version, about)]
pub struct Cli {
    #[command(flatten)]
    pub verbose: Verbosity<WarnLevel>,

    /// Duration to display the status before cycling to the next active source
    #[arg(long, value_name = "SECONDS")]
    pub period: Option<f64>,

    /// Format string for status: {name} {app} {album} {artist} {title} {status}
    #[arg(long, short, value_name = "FORMAT")]
    pub format: Option<String>,

    /// Use unicode glyphs for {status} in format
    #[arg(long, short)]
    pub unicode: bool,

    /// Output at most `width` unicode codepoints per line
    #[arg(long, value_name = "N", allow_negative_numbers = true)]
    pub width: Option<i64>,

    /// Number of characters to scroll per second
    #[arg(
        long = "marquee_speed",
        visible_alias = "marquee-speed",
        value_name = "CHARACTERS_PER_SECOND",
        allow_negative_numbers = true
    )]
    pub marquee_speed: Option<f64>,

    /// Seconds to hold the text at either end of the scroll
    #[arg(
        long = "marquee_pause",
        visible_alias = "marquee-pause",
        value_name = "SECONDS",
        allow_negative_numbers = true
    )]
    pub marquee_pause: Option<f64>,

    /// Ignore statuses matching this regex (repeatable)
    #[arg(long = "blacklist-regex", value_name = "REGEX", num_args = 1..)]
    pub blacklist_regex: Vec<String>,

    /// Seconds between source re-discovery
    #[arg(long, value_name = "SECONDS")]
    pub ttl: Option<f64>,

    /// Give up on a discovery attempt after this many seconds
    #[arg(long, value_name = "SECONDS")]
    pub discovery_timeout: Option<f64>,

    /// Config file (default: $XDG_CONFIG_HOME/castbar/config.json)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Optional settings file. Every key may be omitted.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub period: Option<f64>,
    pub format: Option<String>,
    pub unicode: Option<bool>,
    pub width: Option<i64>,
    pub marquee_speed: Option<f64>,
    pub marquee_pause: Option<f64>,
    pub blacklist_regex: Vec<String>,
    pub ttl: Option<f64>,
    pub discovery_timeout: Option<f64>,
}

impl FileConfig {
    /// Load from config file.
    ///
    /// A missing file is only an error when `required` is set.
    pub fn load(path: &Path, required: bool) -> Result<Self, ConfigError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if !required && e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No config file at {}", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Values set in `top` win.
    pub fn overlay(self, top: FileConfig) -> FileConfig {
        FileConfig {
            period: top.period.or(self.period),
            format: top.format.or(self.format),
            unicode: top.unicode.or(self.unicode),
            width: top.width.or(self.width),
            marquee_speed: top.marquee_speed.or(self.marquee_speed),
            marquee_pause: top.marquee_pause.or(self.marquee_pause),
            blacklist_regex: if top.blacklist_regex.is_empty() {
                self.blacklist_regex
            } else {
                top.blacklist_regex
            },
            ttl: top.ttl.or(self.ttl),
            discovery_timeout: top.discovery_timeout.or(self.discovery_timeout),
        }
    }
}

impl Cli {
    /// Settings given on the command line, in config file shape.
    fn overrides(&self) -> FileConfig {
        FileConfig {
            period: self.period,
            format: self.format.clone(),
            unicode: self.unicode.then_some(true),
            width: self.width,
            marquee_speed: self.marquee_speed,
            marquee_pause: self.marquee_pause,
            blacklist_regex: self.blacklist_regex.clone(),
            ttl: self.ttl,
            discovery_timeout: self.discovery_timeout,
        }
    }
}

/// Settings for one run, passed explicitly to the rotator and output driver.
#[derive(Clone, Debug, PartialEq)]
pub struct DisplayConfig {
    pub period: Duration,
    pub format: Option<String>,
    pub unicode: bool,
    pub width: usize,
    /// Characters per second, at least `MIN_MARQUEE_SPEED`.
    pub marquee_speed: f64,
    pub marquee_pause: Duration,
    pub blacklist: Vec<String>,
    pub ttl: Duration,
    pub discovery_timeout: Duration,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self::from(FileConfig::default())
    }
}

impl From<FileConfig> for DisplayConfig {
    fn from(values: FileConfig) -> Self {
        let speed = values.marquee_speed.unwrap_or(DEFAULT_MARQUEE_SPEED);
        Self {
            period: seconds(values.period.unwrap_or(DEFAULT_PERIOD_SECS)),
            format: values.format,
            unicode: values.unicode.unwrap_or(false),
            width: clamp_width(values.width.unwrap_or(DEFAULT_WIDTH)),
            marquee_speed: speed.max(MIN_MARQUEE_SPEED),
            marquee_pause: seconds(values.marquee_pause.unwrap_or(DEFAULT_MARQUEE_PAUSE_SECS)),
            blacklist: values.blacklist_regex,
            ttl: seconds(values.ttl.unwrap_or(DEFAULT_TTL_SECS)),
            discovery_timeout: seconds(
                values
                    .discovery_timeout
                    .unwrap_or(DEFAULT_DISCOVERY_TIMEOUT_SECS),
            ),
        }
    }
}

impl DisplayConfig {
    /// Load the config file named by the CLI (or the default one) and apply
    /// the CLI on top.
    pub fn resolve(cli: &Cli) -> Result<Self, ConfigError> {
        let file = match &cli.config {
            Some(path) => FileConfig::load(path, true)?,
            None => match FileConfig::default_path() {
                Some(path) => FileConfig::load(&path, false)?,
                None => FileConfig::default(),
            },
        };
        Ok(Self::merge(file, cli))
    }

    pub fn merge(file: FileConfig, cli: &Cli) -> Self {
        Self::from(file.overlay(cli.overrides()))
    }

    /// Delay between two scroll steps.
    pub fn scroll_step(&self) -> Duration {
        seconds(1.0 / self.marquee_speed)
    }
}

/// Negative and NaN become zero; overflow saturates.
fn seconds(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs.max(0.0)).unwrap_or(Duration::MAX)
}

fn clamp_width(width: i64) -> usize {
    usize::try_from(width.max(0)).unwrap_or(usize::MAX)
}
