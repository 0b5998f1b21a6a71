//! Reporter - Evidence Logging and Fatal-Failure Signaling
//!
//! Both the wait engine and the action layer narrate every decision point
//! through a [`Reporter`]: attempts, recoveries, successes, and terminal
//! failures. The reporter is also the only channel for fatal signaling.
//! The core itself never panics on a timeout; when a caller opted into
//! throw-on-timeout, the engine calls [`Reporter::fail`] before handing the
//! outcome back, and the reporter implementation decides whether that
//! aborts the test unit or is merely collected.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::result::EsperarError;

/// Severity of a recorded message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReportLevel {
    /// Narration of what is about to be attempted
    Debug,
    /// Neutral progress information
    Info,
    /// A condition or interaction that held
    Success,
    /// A recoverable anomaly (stale handle, intercepted click)
    Warn,
    /// A terminal failure of one operation
    Error,
}

impl ReportLevel {
    /// Uppercase tag used in rendered log lines
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Success => "SUCCESS",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }
}

impl std::fmt::Display for ReportLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Sink for structured evidence and terminal-failure signals
pub trait Reporter {
    /// Record one decision point.
    ///
    /// `evidence` is an opaque reference to a captured artifact (a
    /// screenshot path, an attachment id) when the implementation took one.
    fn record(&self, level: ReportLevel, message: &str, evidence: Option<&str>);

    /// Signal a terminal, caller-visible failure.
    ///
    /// Implementations may abort the calling test unit, capture a snapshot
    /// of the remote surface, or simply collect the failure; the engine
    /// guarantees only that this is called before a failed outcome with
    /// throw-on-timeout returns control.
    fn fail(&self, message: &str, fault: Option<&EsperarError>);
}

/// Reporter that forwards everything onto the `tracing` subscriber.
///
/// `fail` records an error event and continues; pair it with a stricter
/// reporter in harnesses that must stop the line on first failure.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl TracingReporter {
    /// Create a tracing-backed reporter
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reporter for TracingReporter {
    fn record(&self, level: ReportLevel, message: &str, evidence: Option<&str>) {
        match level {
            ReportLevel::Debug => tracing::debug!(evidence, "{message}"),
            ReportLevel::Info => tracing::info!(evidence, "{message}"),
            ReportLevel::Success => tracing::info!(evidence, outcome = "success", "{message}"),
            ReportLevel::Warn => tracing::warn!(evidence, "{message}"),
            ReportLevel::Error => tracing::error!(evidence, "{message}"),
        }
    }

    fn fail(&self, message: &str, fault: Option<&EsperarError>) {
        match fault {
            Some(fault) => tracing::error!(fault = %fault, "FAILED: {message}"),
            None => tracing::error!("FAILED: {message}"),
        }
    }
}

/// Install a default `tracing` fmt subscriber for ad-hoc runs.
///
/// Honors `RUST_LOG`; does nothing if a subscriber is already installed.
#[cfg(not(target_arch = "wasm32"))]
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}

/// One message captured by a [`RecordingReporter`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedEvent {
    /// Severity
    pub level: ReportLevel,
    /// Message text
    pub message: String,
    /// Evidence reference, if any
    pub evidence: Option<String>,
}

#[derive(Debug, Default)]
struct Recording {
    events: Vec<RecordedEvent>,
    failures: Vec<String>,
}

/// Reporter that captures everything for later assertions.
///
/// Clones share the same recording, so a test can keep one clone and move
/// the other into the layer under test.
#[derive(Debug, Clone, Default)]
pub struct RecordingReporter {
    inner: Rc<RefCell<Recording>>,
}

impl RecordingReporter {
    /// Create an empty recording reporter
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All captured events, in order
    #[must_use]
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.inner.borrow().events.clone()
    }

    /// All captured fatal-failure messages, in order
    #[must_use]
    pub fn failures(&self) -> Vec<String> {
        self.inner.borrow().failures.clone()
    }

    /// Number of captured fatal failures
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.inner.borrow().failures.len()
    }

    /// Whether any captured event carries the given level
    #[must_use]
    pub fn has_level(&self, level: ReportLevel) -> bool {
        self.inner.borrow().events.iter().any(|e| e.level == level)
    }

    /// Whether any captured event message contains the fragment
    #[must_use]
    pub fn has_message(&self, fragment: &str) -> bool {
        self.inner
            .borrow()
            .events
            .iter()
            .any(|e| e.message.contains(fragment))
    }

    /// Drop everything captured so far
    pub fn clear(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.events.clear();
        inner.failures.clear();
    }
}

impl Reporter for RecordingReporter {
    fn record(&self, level: ReportLevel, message: &str, evidence: Option<&str>) {
        self.inner.borrow_mut().events.push(RecordedEvent {
            level,
            message: message.to_string(),
            evidence: evidence.map(ToString::to_string),
        });
    }

    fn fail(&self, message: &str, fault: Option<&EsperarError>) {
        let rendered = match fault {
            Some(fault) => format!("{message} ({fault})"),
            None => message.to_string(),
        };
        self.inner.borrow_mut().failures.push(rendered);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod report_level_tests {
        use super::*;

        #[test]
        fn test_as_str() {
            assert_eq!(ReportLevel::Debug.as_str(), "DEBUG");
            assert_eq!(ReportLevel::Success.as_str(), "SUCCESS");
            assert_eq!(ReportLevel::Error.as_str(), "ERROR");
        }

        #[test]
        fn test_display() {
            assert_eq!(format!("{}", ReportLevel::Warn), "WARN");
        }
    }

    mod recording_reporter_tests {
        use super::*;

        #[test]
        fn test_records_in_order() {
            let reporter = RecordingReporter::new();
            reporter.record(ReportLevel::Debug, "first", None);
            reporter.record(ReportLevel::Success, "second", Some("shot-1.png"));

            let events = reporter.events();
            assert_eq!(events.len(), 2);
            assert_eq!(events[0].message, "first");
            assert_eq!(events[1].level, ReportLevel::Success);
            assert_eq!(events[1].evidence.as_deref(), Some("shot-1.png"));
        }

        #[test]
        fn test_captures_failures_with_fault() {
            let reporter = RecordingReporter::new();
            let fault = EsperarError::Timeout { ms: 1000, attempts: 2 };
            reporter.fail("text never matched", Some(&fault));

            assert_eq!(reporter.failure_count(), 1);
            assert!(reporter.failures()[0].contains("text never matched"));
            assert!(reporter.failures()[0].contains("1000ms"));
        }

        #[test]
        fn test_clones_share_recording() {
            let reporter = RecordingReporter::new();
            let observer = reporter.clone();
            reporter.record(ReportLevel::Info, "shared", None);

            assert!(observer.has_message("shared"));
            assert!(observer.has_level(ReportLevel::Info));
            assert!(!observer.has_level(ReportLevel::Error));
        }

        #[test]
        fn test_clear() {
            let reporter = RecordingReporter::new();
            reporter.record(ReportLevel::Info, "one", None);
            reporter.fail("bad", None);
            reporter.clear();
            assert!(reporter.events().is_empty());
            assert_eq!(reporter.failure_count(), 0);
        }
    }

    mod tracing_reporter_tests {
        use super::*;

        #[test]
        fn test_does_not_panic_without_subscriber() {
            let reporter = TracingReporter::new();
            reporter.record(ReportLevel::Debug, "quiet", None);
            reporter.record(ReportLevel::Success, "done", Some("ref"));
            reporter.fail("terminal", None);
        }
    }
}
