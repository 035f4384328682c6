use std::{env, str::FromStr};

/// Log level, read from the `QRTR_NS_LOG` environment variable. The daemon
/// takes no command-line arguments: the fabric is a fixed local bus with
/// nothing to configure beyond verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(match value.to_ascii_lowercase().as_str() {
            "trace" => Self::Trace,
            "debug" => Self::Debug,
            "info" => Self::Info,
            "warn" => Self::Warn,
            "error" => Self::Error,
            _ => return Err(format!("unknown log level: {value}")),
        })
    }
}

impl Default for LogLevel {
    fn default() -> Self {
        Self::Info
    }
}

impl LogLevel {
    pub fn as_level(&self) -> log::Level {
        match *self {
            Self::Error => log::Level::Error,
            Self::Debug => log::Level::Debug,
            Self::Trace => log::Level::Trace,
            Self::Warn => log::Level::Warn,
            Self::Info => log::Level::Info,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Log {
    pub level: LogLevel,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Config {
    pub log: Log,
}

impl Config {
    /// Reads the log level from `QRTR_NS_LOG`, falling back to `info` if
    /// unset or unrecognised.
    pub fn load() -> Self {
        let level = env::var("QRTR_NS_LOG")
            .ok()
            .and_then(|v| LogLevel::from_str(&v).ok())
            .unwrap_or_default();

        Self { log: Log { level } }
    }
}
