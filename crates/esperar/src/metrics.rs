//! Elapsed-Time Bookkeeping per Test Unit
//!
//! Pure instrumentation: a registry of named stopwatches that log lines
//! and reports can read for "how long since the unit started" and "how
//! long since the previous mark". Never an input to wait decisions.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Placeholder rendered when a stopwatch was never started
const NO_WATCH: &str = "--:--";

/// A single named stopwatch
#[derive(Debug)]
pub struct Stopwatch {
    started: Instant,
    stopped: Option<Duration>,
    previous_elapsed: Duration,
    since_last: Duration,
}

impl Stopwatch {
    /// Start a stopwatch now
    #[must_use]
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
            stopped: None,
            previous_elapsed: Duration::ZERO,
            since_last: Duration::ZERO,
        }
    }

    /// Total elapsed time; frozen once stopped
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.stopped.unwrap_or_else(|| self.started.elapsed())
    }

    /// Elapsed time since the previous mark
    #[must_use]
    pub fn since_last(&self) -> Duration {
        self.since_last
    }

    /// Record a mark: updates the since-last window and returns the total
    pub fn mark(&mut self) -> Duration {
        let elapsed = self.elapsed();
        self.since_last = elapsed.saturating_sub(self.previous_elapsed);
        self.previous_elapsed = elapsed;
        elapsed
    }

    /// Freeze the stopwatch at its current elapsed time
    pub fn stop(&mut self) {
        if self.stopped.is_none() {
            self.stopped = Some(self.started.elapsed());
        }
    }
}

/// Registry of stopwatches keyed by test-unit name
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    watches: HashMap<String, Stopwatch>,
}

impl MetricsRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) the stopwatch for a test unit
    pub fn start(&mut self, name: impl Into<String>) {
        self.watches.insert(name.into(), Stopwatch::start());
    }

    /// Freeze the stopwatch for a test unit; returns false if unknown
    pub fn stop(&mut self, name: &str) -> bool {
        match self.watches.get_mut(name) {
            Some(watch) => {
                watch.stop();
                true
            }
            None => false,
        }
    }

    /// Whether a stopwatch exists for the test unit
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.watches.contains_key(name)
    }

    /// Total elapsed for a test unit, formatted `mm:ss`.
    ///
    /// Also records a mark, so a following [`Self::elapsed_since_last`]
    /// reports the window since this call. Unknown units render `--:--`.
    pub fn elapsed_since_start(&mut self, name: &str) -> String {
        match self.watches.get_mut(name) {
            Some(watch) => format_mm_ss(watch.mark()),
            None => NO_WATCH.to_string(),
        }
    }

    /// Window since the previous mark, formatted `ss.ff`
    #[must_use]
    pub fn elapsed_since_last(&self, name: &str) -> String {
        match self.watches.get(name) {
            Some(watch) => format_ss_ff(watch.since_last()),
            None => NO_WATCH.to_string(),
        }
    }

    /// Raw elapsed duration for a test unit
    #[must_use]
    pub fn elapsed(&self, name: &str) -> Option<Duration> {
        self.watches.get(name).map(Stopwatch::elapsed)
    }
}

fn format_mm_ss(duration: Duration) -> String {
    let total = duration.as_secs();
    format!("{:02}:{:02}", total / 60, total % 60)
}

fn format_ss_ff(duration: Duration) -> String {
    let hundredths = duration.subsec_millis() / 10;
    format!("{:02}.{:02}", duration.as_secs(), hundredths)
}

#[cfg(test)]
mod tests {
    use super::*;

    mod formatting_tests {
        use super::*;

        #[test]
        fn test_mm_ss() {
            assert_eq!(format_mm_ss(Duration::from_secs(0)), "00:00");
            assert_eq!(format_mm_ss(Duration::from_secs(59)), "00:59");
            assert_eq!(format_mm_ss(Duration::from_secs(61)), "01:01");
            assert_eq!(format_mm_ss(Duration::from_secs(600)), "10:00");
        }

        #[test]
        fn test_ss_ff() {
            assert_eq!(format_ss_ff(Duration::from_millis(0)), "00.00");
            assert_eq!(format_ss_ff(Duration::from_millis(1230)), "01.23");
            assert_eq!(format_ss_ff(Duration::from_millis(45)), "00.04");
        }
    }

    mod registry_tests {
        use super::*;

        #[test]
        fn test_unknown_unit_renders_placeholder() {
            let mut registry = MetricsRegistry::new();
            assert_eq!(registry.elapsed_since_start("nope"), "--:--");
            assert_eq!(registry.elapsed_since_last("nope"), "--:--");
            assert!(!registry.stop("nope"));
        }

        #[test]
        fn test_start_and_read() {
            let mut registry = MetricsRegistry::new();
            registry.start("login_test");
            assert!(registry.contains("login_test"));
            let rendered = registry.elapsed_since_start("login_test");
            assert_eq!(rendered.len(), 5);
            assert!(registry.elapsed("login_test").is_some());
        }

        #[test]
        fn test_stop_freezes_elapsed() {
            let mut registry = MetricsRegistry::new();
            registry.start("unit");
            assert!(registry.stop("unit"));
            let first = registry.elapsed("unit").unwrap();
            std::thread::sleep(Duration::from_millis(20));
            let second = registry.elapsed("unit").unwrap();
            assert_eq!(first, second);
        }

        #[test]
        fn test_since_last_tracks_marks() {
            let mut registry = MetricsRegistry::new();
            registry.start("unit");
            let _ = registry.elapsed_since_start("unit");
            std::thread::sleep(Duration::from_millis(30));
            let _ = registry.elapsed_since_start("unit");
            // the second mark opened a ~30ms window
            assert_ne!(registry.elapsed_since_last("unit"), "00.00");
        }

        #[test]
        fn test_restart_resets() {
            let mut registry = MetricsRegistry::new();
            registry.start("unit");
            registry.stop("unit");
            registry.start("unit");
            let elapsed = registry.elapsed("unit").unwrap();
            assert!(elapsed < Duration::from_secs(1));
        }
    }
}
