use std::{fmt::Display, fs::File, str::FromStr, sync::Mutex};

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::config::GeneralConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" | "trc" => Ok(LogLevel::Trace),
            "debug" | "dbg" => Ok(LogLevel::Debug),
            "info" | "inf" => Ok(LogLevel::Info),
            "warn" | "warning" | "war" => Ok(LogLevel::Warn),
            "error" | "err" => Ok(LogLevel::Error),
            _ => Err(format!("Invalid log level: {}", s)),
        }
    }
}

impl Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "Trace"),
            LogLevel::Debug => write!(f, "Debug"),
            LogLevel::Info => write!(f, "Info"),
            LogLevel::Warn => write!(f, "Warn"),
            LogLevel::Error => write!(f, "Error"),
        }
    }
}

/// Installs a global `tracing` subscriber according to the logger settings
/// of `config`.
///
/// Does nothing if logging is disabled. When `log_file` is set, events go to
/// `./logs/coverability_run_<timestamp>.txt` instead of stderr. Fails if a
/// global subscriber has already been installed.
pub fn init_tracing(config: &impl GeneralConfig) -> anyhow::Result<()> {
    let config = config.logger();
    if !*config.get_enabled() {
        return Ok(());
    }

    let level: tracing::Level = (*config.get_log_level()).into();
    let builder = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false);

    let result = if *config.get_log_file() {
        std::fs::create_dir_all("./logs")?;
        let path = format!(
            "./logs/coverability_run_{}.txt",
            Local::now().format("%Y-%m-%d_%H-%M-%S")
        );
        let file = File::create(path)?;

        builder
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .try_init()
    } else {
        builder.with_writer(std::io::stderr).try_init()
    };

    result.map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {}", e))
}

#[test]
fn test_log_level_from_str() {
    assert_eq!("dbg".parse::<LogLevel>(), Ok(LogLevel::Debug));
    assert_eq!("Warning".parse::<LogLevel>(), Ok(LogLevel::Warn));
    assert_eq!("TRACE".parse::<LogLevel>(), Ok(LogLevel::Trace));
    assert!("loud".parse::<LogLevel>().is_err());
}

#[test]
fn test_disabled_logger_installs_nothing() {
    assert!(init_tracing(&crate::config::CoverabilityConfig::default()).is_ok());
}
