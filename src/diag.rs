//! Diagnostics seam.
//!
//! Every phase of the engine reports through a caller-supplied [`DiagSink`]
//! rather than an ambient logger, so callers decide where messages go and
//! tests can assert on what was reported.

use serde::{Deserialize, Serialize};

/// Severity of a diagnostic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagLevel {
    Debug,
    Info,
    Warning,
    Critical,
}

impl std::fmt::Display for DiagLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// A sink for structured engine diagnostics.
pub trait DiagSink {
    fn emit(&self, level: DiagLevel, message: &str);

    fn debug(&self, message: &str) {
        self.emit(DiagLevel::Debug, message);
    }

    fn info(&self, message: &str) {
        self.emit(DiagLevel::Info, message);
    }

    fn warning(&self, message: &str) {
        self.emit(DiagLevel::Warning, message);
    }

    fn critical(&self, message: &str) {
        self.emit(DiagLevel::Critical, message);
    }
}

/// Default sink that forwards to `tracing`.
pub struct TracingSink;

impl DiagSink for TracingSink {
    fn emit(&self, level: DiagLevel, message: &str) {
        match level {
            DiagLevel::Debug => tracing::debug!("{message}"),
            DiagLevel::Info => tracing::info!("{message}"),
            DiagLevel::Warning => tracing::warn!("{message}"),
            DiagLevel::Critical => tracing::error!("{message}"),
        }
    }
}

/// Test sink that records every message for assertions.
#[cfg(test)]
pub struct RecordingSink {
    messages: std::sync::Mutex<Vec<(DiagLevel, String)>>,
}

#[cfg(test)]
impl RecordingSink {
    pub fn new() -> Self {
        Self {
            messages: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn messages(&self) -> Vec<(DiagLevel, String)> {
        self.messages.lock().unwrap().clone()
    }

    pub fn at_level(&self, level: DiagLevel) -> Vec<String> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }
}

#[cfg(test)]
impl DiagSink for RecordingSink {
    fn emit(&self, level: DiagLevel, message: &str) {
        self.messages
            .lock()
            .unwrap()
            .push((level, message.to_string()));
    }
}
