//! Reporting hook for failures the client absorbs.
//!
//! The controller never shows errors to the user; it degrades to silence or a
//! fallback bubble. Every such failure is handed to an [`ErrorReporter`] so
//! that it stays observable and testable.

use std::fmt;
use std::sync::Mutex;

use crate::error::Error;

/// Which operation absorbed a failure.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Session identifier storage was unavailable.
    Storage,
    /// Replaying history failed; the view stays empty.
    History,
    /// Sending a message failed; a fallback reply was shown.
    Send,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Storage => f.write_str("storage"),
            FailureKind::History => f.write_str("history"),
            FailureKind::Send => f.write_str("send"),
        }
    }
}

/// A failure that was absorbed rather than surfaced.
#[derive(Debug, Clone)]
pub struct Failure {
    /// Which operation failed.
    pub kind: FailureKind,
    /// The underlying error.
    pub error: Error,
}

impl Failure {
    /// Creates a new failure record.
    pub fn new(kind: FailureKind, error: Error) -> Self {
        Self { kind, error }
    }
}

/// A sink for absorbed failures.
///
/// # Example
///
/// ```rust,ignore
/// use chatline::{ErrorReporter, Failure};
///
/// struct StderrReporter;
///
/// impl ErrorReporter for StderrReporter {
///     fn report(&self, failure: &Failure) {
///         eprintln!("{} failed: {}", failure.kind, failure.error);
///     }
/// }
/// ```
pub trait ErrorReporter: Send + Sync {
    /// Record one absorbed failure.
    fn report(&self, failure: &Failure);
}

/// Reports through the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl ErrorReporter for LogReporter {
    fn report(&self, failure: &Failure) {
        match failure.kind {
            FailureKind::Storage => {
                log::warn!("session storage unavailable: {}", failure.error)
            }
            FailureKind::History => log::warn!("no history loaded: {}", failure.error),
            FailureKind::Send => log::error!("chat error: {}", failure.error),
        }
    }
}

/// Collects failures in memory.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    failures: Mutex<Vec<Failure>>,
}

impl RecordingReporter {
    /// Creates an empty reporter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything reported so far, oldest first.
    pub fn failures(&self) -> Vec<Failure> {
        match self.failures.lock() {
            Ok(failures) => failures.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Kinds of everything reported so far, oldest first.
    pub fn kinds(&self) -> Vec<FailureKind> {
        self.failures().into_iter().map(|f| f.kind).collect()
    }
}

impl ErrorReporter for RecordingReporter {
    fn report(&self, failure: &Failure) {
        match self.failures.lock() {
            Ok(mut failures) => failures.push(failure.clone()),
            Err(poisoned) => poisoned.into_inner().push(failure.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_reporter_keeps_order() {
        let reporter = RecordingReporter::new();
        reporter.report(&Failure::new(
            FailureKind::History,
            Error::api(500, "boom"),
        ));
        reporter.report(&Failure::new(
            FailureKind::Send,
            Error::connection("refused", None),
        ));
        assert_eq!(reporter.kinds(), vec![FailureKind::History, FailureKind::Send]);
        assert_eq!(reporter.failures()[0].error.status_code(), Some(500));
    }

    #[test]
    fn log_reporter_does_not_panic_without_logger() {
        LogReporter.report(&Failure::new(
            FailureKind::Storage,
            Error::storage("read-only", None),
        ));
    }

    #[test]
    fn kind_display() {
        assert_eq!(FailureKind::Send.to_string(), "send");
        assert_eq!(FailureKind::History.to_string(), "history");
    }
}
