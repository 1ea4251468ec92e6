//! Logging configuration and initialization.
//!
//! Presets pick a base set of `EnvFilter` directives for the `studio::*` targets;
//! `--log target=level` overrides are layered on top. `RUST_LOG`, when set,
//! replaces the whole filter.

use clap::ValueEnum;
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

const TARGET_PREFIX: &str = "studio";

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging preset levels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogPreset {
    /// Lifecycle events and generation outcomes
    #[default]
    Production,
    Verbose,
    Debug,
    Trace,
    /// Warnings and errors only
    Quiet,
}

impl LogPreset {
    /// Pick a preset from CLI flags. The quietest explicit flag wins.
    pub fn from_flags(verbose: bool, debug: bool, trace: bool, quiet: bool) -> Self {
        if quiet {
            LogPreset::Quiet
        } else if trace {
            LogPreset::Trace
        } else if debug {
            LogPreset::Debug
        } else if verbose {
            LogPreset::Verbose
        } else {
            LogPreset::Production
        }
    }

    fn directives(self) -> &'static [&'static str] {
        match self {
            LogPreset::Production => &[
                "studio::startup=info",
                "studio::api=info",
                "studio::ws=info",
                "studio::project=info",
                "studio::generation=info",
                "studio::config=warn",
                "tower_http=warn",
            ],
            LogPreset::Verbose => &["studio=info", "tower_http=info"],
            LogPreset::Debug => &["studio=debug", "tower_http=debug"],
            LogPreset::Trace => &["studio=trace", "tower_http=trace"],
            LogPreset::Quiet => &["studio=warn", "tower_http=error"],
        }
    }
}

/// Logging configuration built from CLI arguments.
#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    pub preset: LogPreset,
    /// Full target name -> level, e.g. "studio::generation" -> DEBUG
    pub overrides: BTreeMap<String, Level>,
    pub format: LogFormat,
}

impl LogConfig {
    pub fn new(preset: LogPreset, log_overrides: &[String], format: LogFormat) -> Self {
        Self {
            preset,
            overrides: parse_overrides(log_overrides),
            format,
        }
    }

    /// Build an EnvFilter from this configuration.
    pub fn build_filter(&self) -> EnvFilter {
        if let Ok(env_filter) = EnvFilter::try_from_default_env() {
            return env_filter;
        }

        let directives: Vec<String> = self
            .preset
            .directives()
            .iter()
            .map(|d| d.to_string())
            .chain(
                self.overrides
                    .iter()
                    .map(|(target, level)| format!("{}={}", target, level.as_str().to_lowercase())),
            )
            .collect();

        EnvFilter::try_new(directives.join(",")).unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// Parse `target=level` pairs; entries may also be comma-separated.
/// Bare targets get the `studio::` prefix. Malformed entries are skipped.
fn parse_overrides(raw: &[String]) -> BTreeMap<String, Level> {
    raw.iter()
        .flat_map(|entry| entry.split(','))
        .filter_map(|part| {
            let (target, level) = part.split_once('=')?;
            let level = Level::from_str(level.trim()).ok()?;
            let target = target.trim();
            let full_target = if target == TARGET_PREFIX
                || target.starts_with("studio::")
                || target == "tower_http"
            {
                target.to_string()
            } else {
                format!("{}::{}", TARGET_PREFIX, target)
            };
            Some((full_target, level))
        })
        .collect()
}

/// Install the global tracing subscriber.
pub fn init(config: &LogConfig) {
    let filter = config.build_filter();

    match config.format {
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_target(true).with_thread_ids(false))
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_target(true)
                        .with_span_events(FmtSpan::CLOSE),
                )
                .init();
        }
    }
}
