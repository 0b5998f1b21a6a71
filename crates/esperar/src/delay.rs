//! Blocking Delay Primitive with a Process-Wide Speed Factor
//!
//! Every pause in the crate funnels through [`Delay`]: the settle delay
//! before mutating actions, the sleep between polling iterations, and any
//! explicit pause a harness asks for. All of them scale by the factor held
//! in [`DelaySettings`], so a whole test run can be sped up or slowed down
//! with one configuration call (0.5 halves every pause, 2.0 doubles it).

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Default delay factor (pauses run at face value)
pub const DEFAULT_DELAY_FACTOR: f32 = 1.0;

/// Scaled pauses longer than this get a warning; a condition wait is
/// almost always the better tool at that magnitude.
const LONG_DELAY_WARN: Duration = Duration::from_secs(10);

/// Process-wide delay configuration.
///
/// The factor is read on every pause and written only by an explicit
/// setter, expected between test units rather than concurrently with
/// active polling. Stored as atomic bits so handles can be shared freely.
#[derive(Debug)]
pub struct DelaySettings {
    factor_bits: AtomicU32,
}

impl DelaySettings {
    /// Create settings with the default factor
    #[must_use]
    pub fn new() -> Self {
        Self::with_factor(DEFAULT_DELAY_FACTOR)
    }

    /// Create settings with an explicit factor
    #[must_use]
    pub fn with_factor(factor: f32) -> Self {
        Self {
            factor_bits: AtomicU32::new(Self::sanitize(factor).to_bits()),
        }
    }

    /// Current factor
    #[must_use]
    pub fn factor(&self) -> f32 {
        f32::from_bits(self.factor_bits.load(Ordering::Relaxed))
    }

    /// Replace the factor.
    ///
    /// Non-finite values fall back to the default; negatives clamp to zero
    /// (a zero factor suppresses every scaled pause, useful in tests).
    pub fn set_factor(&self, factor: f32) {
        let factor = Self::sanitize(factor);
        let previous = f32::from_bits(self.factor_bits.swap(factor.to_bits(), Ordering::Relaxed));
        tracing::debug!("delay factor now {factor} (was {previous})");
    }

    fn sanitize(factor: f32) -> f32 {
        if factor.is_finite() {
            factor.max(0.0)
        } else {
            DEFAULT_DELAY_FACTOR
        }
    }
}

impl Default for DelaySettings {
    fn default() -> Self {
        Self::new()
    }
}

/// Blocking pause primitive bound to a shared [`DelaySettings`]
#[derive(Debug, Clone)]
pub struct Delay {
    settings: Arc<DelaySettings>,
}

impl Delay {
    /// Create a delay primitive reading the given settings
    #[must_use]
    pub fn new(settings: Arc<DelaySettings>) -> Self {
        Self { settings }
    }

    /// The settings handle this primitive reads
    #[must_use]
    pub fn settings(&self) -> &Arc<DelaySettings> {
        &self.settings
    }

    /// Pause for the duration scaled by the delay factor
    pub fn pause(&self, duration: Duration) {
        self.sleep(duration.mul_f32(self.settings.factor()));
    }

    /// Pause for the duration exactly, ignoring the delay factor
    pub fn pause_exact(&self, duration: Duration) {
        self.sleep(duration);
    }

    /// Scaled pause in milliseconds
    pub fn millis(&self, milliseconds: u64) {
        self.pause(Duration::from_millis(milliseconds));
    }

    /// Scaled pause in seconds
    pub fn secs(&self, seconds: u64) {
        self.pause(Duration::from_secs(seconds));
    }

    /// Scaled pause in minutes
    pub fn minutes(&self, minutes: u64) {
        self.pause(Duration::from_secs(minutes * 60));
    }

    fn sleep(&self, duration: Duration) {
        if duration.is_zero() {
            return;
        }
        if duration > LONG_DELAY_WARN {
            tracing::warn!(
                "pausing {}ms, consider a condition wait instead",
                duration.as_millis()
            );
        }
        std::thread::sleep(duration);
    }
}

impl Default for Delay {
    fn default() -> Self {
        Self::new(Arc::new(DelaySettings::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    mod settings_tests {
        use super::*;

        #[test]
        fn test_default_factor() {
            let settings = DelaySettings::new();
            assert_eq!(settings.factor(), DEFAULT_DELAY_FACTOR);
        }

        #[test]
        fn test_set_factor() {
            let settings = DelaySettings::new();
            settings.set_factor(0.5);
            assert_eq!(settings.factor(), 0.5);
        }

        #[test]
        fn test_negative_factor_clamps_to_zero() {
            let settings = DelaySettings::with_factor(-2.0);
            assert_eq!(settings.factor(), 0.0);
        }

        #[test]
        fn test_non_finite_factor_falls_back() {
            let settings = DelaySettings::new();
            settings.set_factor(f32::NAN);
            assert_eq!(settings.factor(), DEFAULT_DELAY_FACTOR);
            settings.set_factor(f32::INFINITY);
            assert_eq!(settings.factor(), DEFAULT_DELAY_FACTOR);
        }

        #[test]
        fn test_shared_across_handles() {
            let settings = Arc::new(DelaySettings::new());
            let a = Delay::new(settings.clone());
            let b = Delay::new(settings.clone());
            settings.set_factor(0.25);
            assert_eq!(a.settings().factor(), 0.25);
            assert_eq!(b.settings().factor(), 0.25);
        }
    }

    mod delay_tests {
        use super::*;

        #[test]
        fn test_zero_factor_skips_scaled_pause() {
            let delay = Delay::new(Arc::new(DelaySettings::with_factor(0.0)));
            let start = Instant::now();
            delay.secs(30);
            assert!(start.elapsed() < Duration::from_millis(50));
        }

        #[test]
        fn test_pause_exact_ignores_factor() {
            let delay = Delay::new(Arc::new(DelaySettings::with_factor(0.0)));
            let start = Instant::now();
            delay.pause_exact(Duration::from_millis(30));
            assert!(start.elapsed() >= Duration::from_millis(30));
        }

        #[test]
        fn test_pause_scales_down() {
            let delay = Delay::new(Arc::new(DelaySettings::with_factor(0.1)));
            let start = Instant::now();
            delay.pause(Duration::from_millis(200));
            let elapsed = start.elapsed();
            assert!(elapsed >= Duration::from_millis(20));
            assert!(elapsed < Duration::from_millis(150));
        }

        #[test]
        fn test_millis_waits() {
            let delay = Delay::default();
            let start = Instant::now();
            delay.millis(25);
            assert!(start.elapsed() >= Duration::from_millis(25));
        }
    }
}
