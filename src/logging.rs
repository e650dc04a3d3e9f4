//! Logger injected into the migration engine.
//!
//! The engine never reaches for global logging state. Every skip, collision and
//! failure decision is reported through a [`MigrationLogger`] handed to it at
//! construction time. [`LogFacade`] forwards to the `log` crate, so whatever
//! logger the host application installed (e.g. `env_logger`) receives the
//! entries; [`MemoryLogger`] keeps them in memory for inspection.

use std::error::Error;
use std::sync::{Mutex, PoisonError};

use strum::{Display, EnumIter};

/// Target used for entries forwarded to the `log` crate.
pub const LOG_TARGET: &str = "config_migrate";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter)]
#[strum(serialize_all = "UPPERCASE")]
pub enum LogLevel {
    Trace,
    Debug,
    Warn,
    Error,
    Fatal,
}

/// Structured sink for migration diagnostics.
///
/// No engine behaviour depends on what a logger does with an entry.
pub trait MigrationLogger {
    fn log(&self, level: LogLevel, message: &str, cause: Option<&dyn Error>);

    fn trace(&self, message: &str) {
        self.log(LogLevel::Trace, message, None);
    }

    fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message, None);
    }

    fn warn(&self, message: &str, cause: Option<&dyn Error>) {
        self.log(LogLevel::Warn, message, cause);
    }

    fn error(&self, message: &str, cause: Option<&dyn Error>) {
        self.log(LogLevel::Error, message, cause);
    }

    fn fatal(&self, message: &str, cause: Option<&dyn Error>) {
        self.log(LogLevel::Fatal, message, cause);
    }
}

impl<L: MigrationLogger + ?Sized> MigrationLogger for &L {
    fn log(&self, level: LogLevel, message: &str, cause: Option<&dyn Error>) {
        (**self).log(level, message, cause);
    }
}

/// Forwards entries to the `log` facade. `Fatal` maps to `log::Level::Error`
/// with a `FATAL` prefix since `log` has no higher level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogFacade;

impl MigrationLogger for LogFacade {
    fn log(&self, level: LogLevel, message: &str, cause: Option<&dyn Error>) {
        let cause = cause.map(|c| format!(": {c}")).unwrap_or_default();
        match level {
            LogLevel::Trace => log::trace!(target: LOG_TARGET, "{message}{cause}"),
            LogLevel::Debug => log::debug!(target: LOG_TARGET, "{message}{cause}"),
            LogLevel::Warn => log::warn!(target: LOG_TARGET, "{message}{cause}"),
            LogLevel::Error => log::error!(target: LOG_TARGET, "{message}{cause}"),
            LogLevel::Fatal => log::error!(target: LOG_TARGET, "FATAL {message}{cause}"),
        }
    }
}

/// One entry captured by a [`MemoryLogger`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    pub cause: Option<String>,
}

/// Logger that records every entry.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn at_level(&self, level: LogLevel) -> Vec<LogEntry> {
        self.entries()
            .into_iter()
            .filter(|e| e.level == level)
            .collect()
    }

    /// Whether any entry at `level` mentions `needle`.
    pub fn contains(&self, level: LogLevel, needle: &str) -> bool {
        self.at_level(level)
            .iter()
            .any(|e| e.message.contains(needle))
    }
}

impl MigrationLogger for MemoryLogger {
    fn log(&self, level: LogLevel, message: &str, cause: Option<&dyn Error>) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(LogEntry {
                level,
                message: message.to_string(),
                cause: cause.map(|c| c.to_string()),
            });
    }
}
