//! Verbosity-gated diagnostics.
//!
//! Every call can be traced at a chosen verbosity without affecting what it resolves to. The
//! default sink forwards to `tracing`; tests and embedders can inject their own [`LogSink`].

use crate::{CclError, CclResult};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Severity of a single diagnostic message, most severe first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Error,
    Warning,
    Info,
    Debug,
}

/// Threshold controlling which messages reach the sink.
///
/// `None` silences everything; `Debug` lets every message through.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Verbosity {
    #[default]
    None,
    Error,
    Warning,
    Info,
    Debug,
}

impl Verbosity {
    /// Returns true if a message at `level` should be emitted.
    pub fn allows(self, level: LogLevel) -> bool {
        let max = match self {
            Verbosity::None => return false,
            Verbosity::Error => LogLevel::Error,
            Verbosity::Warning => LogLevel::Warning,
            Verbosity::Info => LogLevel::Info,
            Verbosity::Debug => LogLevel::Debug,
        };
        level <= max
    }
}

impl FromStr for Verbosity {
    type Err = CclError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Verbosity::None),
            "error" => Ok(Verbosity::Error),
            "warning" | "warn" => Ok(Verbosity::Warning),
            "info" => Ok(Verbosity::Info),
            "debug" => Ok(Verbosity::Debug),
            other => Err(CclError::InvalidInput(format!(
                "unknown verbosity '{other}' (expected none, error, warning, info or debug)"
            ))),
        }
    }
}

impl fmt::Display for Verbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Verbosity::None => "none",
            Verbosity::Error => "error",
            Verbosity::Warning => "warning",
            Verbosity::Info => "info",
            Verbosity::Debug => "debug",
        };
        f.write_str(label)
    }
}

/// Destination for diagnostic messages.
pub trait LogSink: Send + Sync {
    fn emit(&self, level: LogLevel, program: &str, message: &str);
}

/// Forwards messages to the `tracing` macros.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn emit(&self, level: LogLevel, program: &str, message: &str) {
        match level {
            LogLevel::Error => tracing::error!(program, "{}", message),
            LogLevel::Warning => tracing::warn!(program, "{}", message),
            LogLevel::Info => tracing::info!(program, "{}", message),
            LogLevel::Debug => tracing::debug!(program, "{}", message),
        }
    }
}

/// A sink paired with a verbosity threshold.
#[derive(Clone)]
pub struct Logger {
    verbosity: Verbosity,
    sink: Arc<dyn LogSink>,
}

impl Logger {
    pub fn new(verbosity: Verbosity) -> Self {
        Self::with_sink(verbosity, Arc::new(TracingSink))
    }

    pub fn with_sink(verbosity: Verbosity, sink: Arc<dyn LogSink>) -> Self {
        Self { verbosity, sink }
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    /// Emits `message` if the threshold allows `level`.
    ///
    /// The message is built lazily so a silenced logger costs nothing.
    pub fn log(&self, level: LogLevel, program: &str, message: impl FnOnce() -> String) {
        if self.verbosity.allows(level) {
            self.sink.emit(level, program, &message());
        }
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(Verbosity::None)
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("verbosity", &self.verbosity)
            .finish_non_exhaustive()
    }
}

/// Collects emitted messages, for tests in this crate.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct RecordingSink {
    pub(crate) entries: std::sync::Mutex<Vec<(LogLevel, String)>>,
}

#[cfg(test)]
impl LogSink for RecordingSink {
    fn emit(&self, level: LogLevel, _program: &str, message: &str) {
        self.entries.lock().unwrap().push((level, message.to_string()));
    }
}
