// Logging sinks
//
// Console output plus rotating files:
//   bot.*.log       everything that passes the filter
//   commands.*.log  events with target "commands"
//   events.*.log    events with target "events"
//   errors.*.log    ERROR level only

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{anyhow, Context as _, Result};
use chrono::{DateTime, Utc};
use tokio::fs;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::{filter_fn, LevelFilter};
use tracing_subscriber::{fmt as tfmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// `tracing` target for command invocations
pub const COMMAND_TARGET: &str = "commands";
/// `tracing` target for mirrored gateway events
pub const EVENT_TARGET: &str = "events";

const SINKS: [&str; 4] = ["bot", "commands", "events", "errors"];

/// How often log files roll over
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogRotation {
    Minutely,
    Hourly,
    Daily,
    Never,
}

impl FromStr for LogRotation {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "minutely" => Ok(LogRotation::Minutely),
            "hourly" => Ok(LogRotation::Hourly),
            "daily" => Ok(LogRotation::Daily),
            "never" => Ok(LogRotation::Never),
            other => Err(anyhow!("unknown log rotation {other:?}")),
        }
    }
}

impl fmt::Display for LogRotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogRotation::Minutely => "minutely",
            LogRotation::Hourly => "hourly",
            LogRotation::Daily => "daily",
            LogRotation::Never => "never",
        };
        f.write_str(name)
    }
}

impl From<LogRotation> for Rotation {
    fn from(rotation: LogRotation) -> Self {
        match rotation {
            LogRotation::Minutely => Rotation::MINUTELY,
            LogRotation::Hourly => Rotation::HOURLY,
            LogRotation::Daily => Rotation::DAILY,
            LogRotation::Never => Rotation::NEVER,
        }
    }
}

/// Where and how logs are written
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub directory: PathBuf,
    pub rotation: LogRotation,
    /// `EnvFilter` directive applied to every sink
    pub filter: String,
    /// Also print to stdout
    pub console: bool,
    /// Rotated files kept per sink; older ones are pruned at rollover
    pub max_files: usize,
}

/// Keeps the background writers alive; dropping it flushes the files
pub struct LogGuards {
    _guards: Vec<WorkerGuard>,
}

fn appender(config: &LoggingConfig, name: &str) -> Result<RollingFileAppender> {
    RollingFileAppender::builder()
        .rotation(config.rotation.into())
        .filename_prefix(name)
        .filename_suffix("log")
        .max_log_files(config.max_files)
        .build(&config.directory)
        .with_context(|| format!("failed to open {} log in {}", name, config.directory.display()))
}

fn file_sink(config: &LoggingConfig, name: &str) -> Result<(NonBlocking, WorkerGuard)> {
    Ok(tracing_appender::non_blocking(appender(config, name)?))
}

/// Install the global subscriber
pub fn init(config: &LoggingConfig) -> Result<LogGuards> {
    std::fs::create_dir_all(&config.directory)
        .with_context(|| format!("failed to create {}", config.directory.display()))?;

    let filter = EnvFilter::try_new(&config.filter)
        .with_context(|| format!("invalid log filter {:?}", config.filter))?;

    let (bot, bot_guard) = file_sink(config, "bot")?;
    let (commands, commands_guard) = file_sink(config, "commands")?;
    let (events, events_guard) = file_sink(config, "events")?;
    let (errors, errors_guard) = file_sink(config, "errors")?;

    let console = config.console.then(|| tfmt::layer());

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(tfmt::layer().with_ansi(false).with_writer(bot))
        .with(
            tfmt::layer()
                .with_ansi(false)
                .with_writer(commands)
                .with_filter(filter_fn(|meta| meta.target() == COMMAND_TARGET)),
        )
        .with(
            tfmt::layer()
                .with_ansi(false)
                .with_writer(events)
                .with_filter(filter_fn(|meta| meta.target() == EVENT_TARGET)),
        )
        .with(
            tfmt::layer()
                .with_ansi(false)
                .with_writer(errors)
                .with_filter(LevelFilter::ERROR),
        )
        .try_init()
        .context("a global subscriber is already installed")?;

    Ok(LogGuards {
        _guards: vec![bot_guard, commands_guard, events_guard, errors_guard],
    })
}

/// Size and age of one log file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFileStat {
    pub name: String,
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
}

fn is_log_file(name: &str) -> bool {
    name.ends_with(".log") && SINKS.iter().any(|sink| name.starts_with(sink))
}

/// Stats for every log file in `dir`, sorted by name
pub async fn log_file_stats(dir: &Path) -> Result<Vec<LogFileStat>> {
    let mut entries = fs::read_dir(dir)
        .await
        .with_context(|| format!("failed to read {}", dir.display()))?;

    let mut stats = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if !is_log_file(&name) {
            continue;
        }

        let metadata = entry.metadata().await?;
        stats.push(LogFileStat {
            name,
            size: metadata.len(),
            modified: metadata.modified().ok().map(DateTime::<Utc>::from),
        });
    }

    stats.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(stats)
}

/// Truncate every log file in `dir`, returning how many were cleared
pub async fn clear_logs(dir: &Path) -> Result<usize> {
    let stats = log_file_stats(dir).await?;
    for stat in &stats {
        fs::write(dir.join(&stat.name), b"")
            .await
            .with_context(|| format!("failed to clear {}", stat.name))?;
    }
    Ok(stats.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_parse() {
        assert_eq!("Daily".parse::<LogRotation>().unwrap(), LogRotation::Daily);
        assert_eq!(" never ".parse::<LogRotation>().unwrap(), LogRotation::Never);
        assert!("weekly".parse::<LogRotation>().is_err());
        assert_eq!(LogRotation::Hourly.to_string(), "hourly");
    }

    #[test]
    fn test_is_log_file() {
        assert!(is_log_file("bot.2026-10-19.log"));
        assert!(is_log_file("errors.log"));
        assert!(!is_log_file("notes.log"));
        assert!(!is_log_file("bot.txt"));
    }

    #[test]
    fn test_appender_opens_sink_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = LoggingConfig {
            directory: dir.path().to_path_buf(),
            rotation: LogRotation::Never,
            filter: "info".to_string(),
            console: false,
            max_files: 2,
        };

        let _appender = appender(&config, "errors").unwrap();
        assert!(dir.path().join("errors.log").exists());
    }

    #[tokio::test]
    async fn test_stats_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bot.2026-10-19.log"), "hello\n").unwrap();
        std::fs::write(dir.path().join("events.2026-10-19.log"), "").unwrap();
        std::fs::write(dir.path().join("readme.md"), "keep").unwrap();

        let stats = log_file_stats(dir.path()).await.unwrap();
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].name, "bot.2026-10-19.log");
        assert_eq!(stats[0].size, 6);
        assert!(stats[0].modified.is_some());

        assert_eq!(clear_logs(dir.path()).await.unwrap(), 2);
        let stats = log_file_stats(dir.path()).await.unwrap();
        assert!(stats.iter().all(|s| s.size == 0));
        assert_eq!(std::fs::read_to_string(dir.path().join("readme.md")).unwrap(), "keep");
    }
}
