//! Condition-Poll Engine
//!
//! One generic loop: sample the remote surface through the resilient
//! action layer, evaluate a predicate, early-exit on success, sleep one
//! interval otherwise, and report deterministically when the budget runs
//! out. Every public wait is a thin specialization that fixes the sampler
//! and predicate.
//!
//! The engine is observe-poll-decide only. There is no push notification
//! from the surface and no cancellation beyond the timeout: once a wait
//! begins it runs to success, exhaustion, or a propagated fault.

use std::path::Path;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::action::Actions;
use crate::file_check;
use crate::locator::{Locator, Target};
use crate::reporter::{ReportLevel, Reporter};
use crate::result::{EsperarError, EsperarResult};
use crate::surface::RemoteSurface;

// =============================================================================
// CONSTANTS
// =============================================================================

/// Default budget for a wait operation (120 seconds)
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(120);

/// Default pause between evaluations (1 second)
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Interval used by high-frequency checks such as URL matching (500 ms)
pub const HIGH_FREQUENCY_POLL_INTERVAL: Duration = Duration::from_millis(500);

// =============================================================================
// POLL POLICY
// =============================================================================

/// Timeout, polling granularity, and failure-mode configuration for one
/// wait call. Immutable per invocation; never shared or mutated across
/// calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollPolicy {
    /// Total budget for the wait
    pub timeout: Duration,
    /// Pause between evaluations
    pub poll_interval: Duration,
    /// Signal a terminal failure through the reporter on exhaustion
    pub throw_on_timeout: bool,
    /// Compare strings exactly instead of case-folded
    pub case_sensitive: bool,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_WAIT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            throw_on_timeout: true,
            case_sensitive: false,
        }
    }
}

impl PollPolicy {
    /// Create a policy with the given timeout and default granularity
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Self::default()
        }
    }

    /// Preset for sub-second-granularity checks (500 ms interval)
    #[must_use]
    pub fn high_frequency() -> Self {
        Self {
            poll_interval: HIGH_FREQUENCY_POLL_INTERVAL,
            ..Self::default()
        }
    }

    /// Set the timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the polling interval
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set whether exhaustion raises a terminal failure signal
    #[must_use]
    pub const fn with_throw_on_timeout(mut self, throw: bool) -> Self {
        self.throw_on_timeout = throw;
        self
    }

    /// Set case-sensitive string comparison (default is case-folded)
    #[must_use]
    pub const fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    /// Timeout with the unset/zero value resolved to the default
    #[must_use]
    pub fn effective_timeout(&self) -> Duration {
        if self.timeout.is_zero() {
            DEFAULT_WAIT_TIMEOUT
        } else {
            self.timeout
        }
    }

    /// Interval with the unset/zero value resolved to the default
    #[must_use]
    pub fn effective_interval(&self) -> Duration {
        if self.poll_interval.is_zero() {
            DEFAULT_POLL_INTERVAL
        } else {
            self.poll_interval
        }
    }

    /// Number of evaluations the loop performs: `ceil(timeout / interval)`,
    /// and always at least one even when the timeout is under one interval.
    #[must_use]
    pub fn iterations(&self) -> usize {
        let timeout = self.effective_timeout().as_nanos();
        let interval = self.effective_interval().as_nanos();
        (timeout.div_ceil(interval)).max(1) as usize
    }
}

// =============================================================================
// OBSERVED VALUES AND OUTCOMES
// =============================================================================

/// Last value sampled from the surface, kept for diagnostics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObservedValue {
    /// A sampled string (text, attribute, CSS value, URL)
    Text(String),
    /// A sampled count (element matches, files on disk)
    Count(usize),
}

impl std::fmt::Display for ObservedValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(text) => write!(f, "'{text}'"),
            Self::Count(count) => write!(f, "{count}"),
        }
    }
}

/// Structured result of one wait call.
///
/// The boolean is authoritative; the observed value, attempt count, and
/// elapsed time are diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitOutcome {
    /// Whether the condition held within the budget
    pub succeeded: bool,
    /// Last value observed before returning
    pub observed: Option<ObservedValue>,
    /// Evaluations performed
    pub attempts: usize,
    /// Wall time spent in the loop
    pub elapsed: Duration,
}

/// One evaluation of a wait condition
#[derive(Debug, Clone)]
pub struct ConditionSample {
    /// Whether the condition held for this sample
    pub satisfied: bool,
    /// What was observed, when the condition has an observable value
    pub observed: Option<ObservedValue>,
}

impl ConditionSample {
    /// A sample with no observable value, only a verdict
    #[must_use]
    pub const fn flag(satisfied: bool) -> Self {
        Self {
            satisfied,
            observed: None,
        }
    }

    /// A sample that observed a string
    #[must_use]
    pub fn text(satisfied: bool, observed: impl Into<String>) -> Self {
        Self {
            satisfied,
            observed: Some(ObservedValue::Text(observed.into())),
        }
    }

    /// A sample that observed a count
    #[must_use]
    pub const fn count(satisfied: bool, observed: usize) -> Self {
        Self {
            satisfied,
            observed: Some(ObservedValue::Count(observed)),
        }
    }

    /// The value was unavailable this round; not satisfied, keep polling
    #[must_use]
    pub const fn pending() -> Self {
        Self {
            satisfied: false,
            observed: None,
        }
    }
}

/// Fold both operands of a string comparison with the same rule.
///
/// Folding is symmetric by construction; case-sensitive comparisons pass
/// through untouched.
fn fold(value: &str, case_sensitive: bool) -> String {
    if case_sensitive {
        value.to_string()
    } else {
        value.to_lowercase()
    }
}

/// String predicate shapes shared by the text/attribute/CSS/URL waits
#[derive(Debug, Clone, Copy)]
enum StringCheck {
    Equals,
    NotEquals,
    Contains,
    NotContains,
}

impl StringCheck {
    fn holds(self, current: &str, needle: &str) -> bool {
        match self {
            Self::Equals => current == needle,
            Self::NotEquals => current != needle,
            Self::Contains => current.contains(needle),
            Self::NotContains => !current.contains(needle),
        }
    }
}

// =============================================================================
// WAIT ENGINE
// =============================================================================

/// Condition-poll engine bound to an action layer.
///
/// Borrowed from [`Actions::wait`]; each wait call owns the driving thread
/// until it returns.
#[derive(Debug)]
pub struct Wait<'a, S, R> {
    actions: &'a Actions<S, R>,
}

impl<'a, S: RemoteSurface, R: Reporter> Wait<'a, S, R> {
    /// Create an engine driving the given action layer
    pub fn new(actions: &'a Actions<S, R>) -> Self {
        Self { actions }
    }

    /// Poll a condition until it holds or the policy's budget runs out.
    ///
    /// The condition is evaluated once per iteration. A satisfied sample
    /// returns immediately with success evidence; exhaustion records
    /// failure evidence with the last observed and expected values and,
    /// when the policy says so, signals a terminal failure through the
    /// reporter before returning. Faults outside the action layer's
    /// recovery taxonomy propagate as errors.
    pub fn until<F>(
        &self,
        what: &str,
        expected: &str,
        policy: &PollPolicy,
        mut condition: F,
    ) -> EsperarResult<WaitOutcome>
    where
        F: FnMut() -> EsperarResult<ConditionSample>,
    {
        let timeout = policy.effective_timeout();
        let interval = policy.effective_interval();
        let iterations = policy.iterations();

        self.actions.reporter().record(
            ReportLevel::Debug,
            &format!(
                "Waiting for {what} (timeout: {}s, interval: {}ms)",
                timeout.as_secs_f64(),
                interval.as_millis()
            ),
            None,
        );

        let start = Instant::now();
        let mut last_observed: Option<ObservedValue> = None;

        for attempt in 1..=iterations {
            let sample = condition()?;
            if sample.observed.is_some() {
                last_observed.clone_from(&sample.observed);
            }
            if sample.satisfied {
                let elapsed = start.elapsed();
                let observed_note = sample
                    .observed
                    .as_ref()
                    .map_or_else(String::new, |value| format!(" (observed: {value})"));
                self.actions.reporter().record(
                    ReportLevel::Success,
                    &format!("{what} satisfied after {attempt} attempt(s){observed_note}"),
                    None,
                );
                return Ok(WaitOutcome {
                    succeeded: true,
                    observed: sample.observed,
                    attempts: attempt,
                    elapsed,
                });
            }
            self.actions.delay().pause(interval);
        }

        let elapsed = start.elapsed();
        let observed_note = last_observed
            .as_ref()
            .map_or_else(|| "<none>".to_string(), ToString::to_string);
        let message = format!(
            "{what} not satisfied after {iterations} attempt(s) in {:.1}s (expected: {expected}, last observed: {observed_note})",
            elapsed.as_secs_f64()
        );
        self.actions
            .reporter()
            .record(ReportLevel::Error, &message, None);
        if policy.throw_on_timeout {
            let fault = EsperarError::Timeout {
                ms: timeout.as_millis() as u64,
                attempts: iterations,
            };
            self.actions.reporter().fail(&message, Some(&fault));
        }
        Ok(WaitOutcome {
            succeeded: false,
            observed: last_observed,
            attempts: iterations,
            elapsed,
        })
    }

    fn string_wait(
        &self,
        what: String,
        policy: &PollPolicy,
        needle: &str,
        check: StringCheck,
        mut read: impl FnMut() -> EsperarResult<Option<String>>,
    ) -> EsperarResult<WaitOutcome> {
        let folded_needle = fold(needle, policy.case_sensitive);
        self.until(&what, &format!("'{needle}'"), policy, || {
            match read()? {
                Some(current) => {
                    let satisfied = check.holds(&fold(&current, policy.case_sensitive), &folded_needle);
                    Ok(ConditionSample::text(satisfied, current))
                }
                // value unavailable this round: not yet satisfied, keep polling
                None => Ok(ConditionSample::pending()),
            }
        })
    }

    // =========================================================================
    // EXISTENCE AND COUNT
    // =========================================================================

    /// Wait until the locator matches at least one element
    pub fn exists(&self, locator: &Locator, policy: &PollPolicy) -> EsperarResult<WaitOutcome> {
        self.until(
            &format!("'{locator}' to exist"),
            "at least one match",
            policy,
            || Ok(ConditionSample::flag(self.actions.exists(locator)?)),
        )
    }

    /// Wait until the locator matches nothing.
    ///
    /// Succeeds as soon as absence is observed, symmetric to the presence
    /// check's early exit.
    pub fn not_exists(&self, locator: &Locator, policy: &PollPolicy) -> EsperarResult<WaitOutcome> {
        self.until(
            &format!("'{locator}' to no longer exist"),
            "no matches",
            policy,
            || Ok(ConditionSample::flag(!self.actions.exists(locator)?)),
        )
    }

    /// Wait until the locator matches exactly `count` elements
    pub fn element_count_equal(
        &self,
        locator: &Locator,
        count: usize,
        policy: &PollPolicy,
    ) -> EsperarResult<WaitOutcome> {
        self.until(
            &format!("'{locator}' to return {count} element(s)"),
            &format!("{count}"),
            policy,
            || {
                let current = self.actions.count(locator)?;
                Ok(ConditionSample::count(current == count, current))
            },
        )
    }

    /// Wait until the locator's match count differs from `count`
    pub fn element_count_not_equal(
        &self,
        locator: &Locator,
        count: usize,
        policy: &PollPolicy,
    ) -> EsperarResult<WaitOutcome> {
        self.until(
            &format!("'{locator}' to return != {count} element(s)"),
            &format!("!= {count}"),
            policy,
            || {
                let current = self.actions.count(locator)?;
                Ok(ConditionSample::count(current != count, current))
            },
        )
    }

    // =========================================================================
    // ATTRIBUTES AND STYLE
    // =========================================================================

    /// Wait until an attribute equals the value
    pub fn attribute_equal(
        &self,
        target: &Target,
        name: &str,
        value: &str,
        policy: &PollPolicy,
    ) -> EsperarResult<WaitOutcome> {
        self.string_wait(
            format!("attribute '{name}' of '{target}' to equal '{value}'"),
            policy,
            value,
            StringCheck::Equals,
            || self.actions.attribute(target, name),
        )
    }

    /// Wait until an attribute no longer equals the value
    pub fn attribute_not_equal(
        &self,
        target: &Target,
        name: &str,
        value: &str,
        policy: &PollPolicy,
    ) -> EsperarResult<WaitOutcome> {
        self.string_wait(
            format!("attribute '{name}' of '{target}' to not equal '{value}'"),
            policy,
            value,
            StringCheck::NotEquals,
            || self.actions.attribute(target, name),
        )
    }

    /// Wait until an attribute contains the value
    pub fn attribute_contains(
        &self,
        target: &Target,
        name: &str,
        value: &str,
        policy: &PollPolicy,
    ) -> EsperarResult<WaitOutcome> {
        self.string_wait(
            format!("attribute '{name}' of '{target}' to contain '{value}'"),
            policy,
            value,
            StringCheck::Contains,
            || self.actions.attribute(target, name),
        )
    }

    /// Wait until an attribute no longer contains the value
    pub fn attribute_not_contains(
        &self,
        target: &Target,
        name: &str,
        value: &str,
        policy: &PollPolicy,
    ) -> EsperarResult<WaitOutcome> {
        self.string_wait(
            format!("attribute '{name}' of '{target}' to not contain '{value}'"),
            policy,
            value,
            StringCheck::NotContains,
            || self.actions.attribute(target, name),
        )
    }

    /// Wait until a computed CSS value contains the fragment
    pub fn css_value_contains(
        &self,
        target: &Target,
        name: &str,
        value: &str,
        policy: &PollPolicy,
    ) -> EsperarResult<WaitOutcome> {
        self.string_wait(
            format!("style '{name}' of '{target}' to contain '{value}'"),
            policy,
            value,
            StringCheck::Contains,
            || self.actions.css_value(target, name),
        )
    }

    // =========================================================================
    // VISIBILITY AND ENABLEMENT
    // =========================================================================

    /// Wait until the target is visible
    pub fn displayed(&self, target: &Target, policy: &PollPolicy) -> EsperarResult<WaitOutcome> {
        self.until(
            &format!("'{target}' to be visible"),
            "visible",
            policy,
            || Ok(ConditionSample::flag(self.actions.is_displayed(target)?)),
        )
    }

    /// Wait until the target is not visible
    pub fn not_displayed(&self, target: &Target, policy: &PollPolicy) -> EsperarResult<WaitOutcome> {
        self.until(
            &format!("'{target}' to not be visible"),
            "not visible",
            policy,
            || Ok(ConditionSample::flag(!self.actions.is_displayed(target)?)),
        )
    }

    /// Wait until the target accepts interaction
    pub fn enabled(&self, target: &Target, policy: &PollPolicy) -> EsperarResult<WaitOutcome> {
        self.until(
            &format!("'{target}' to be enabled"),
            "enabled",
            policy,
            || Ok(ConditionSample::flag(self.actions.is_enabled(target)?)),
        )
    }

    /// Wait until the target no longer accepts interaction
    pub fn not_enabled(&self, target: &Target, policy: &PollPolicy) -> EsperarResult<WaitOutcome> {
        self.until(
            &format!("'{target}' to not be enabled"),
            "not enabled",
            policy,
            || Ok(ConditionSample::flag(!self.actions.is_enabled(target)?)),
        )
    }

    // =========================================================================
    // TEXT
    // =========================================================================

    /// Wait until the target's text equals the value
    pub fn text_equal(
        &self,
        target: &Target,
        text: &str,
        policy: &PollPolicy,
    ) -> EsperarResult<WaitOutcome> {
        self.string_wait(
            format!("'{target}' text to equal '{text}'"),
            policy,
            text,
            StringCheck::Equals,
            || self.actions.text(target),
        )
    }

    /// Wait until the target's text no longer equals the value
    pub fn text_not_equal(
        &self,
        target: &Target,
        text: &str,
        policy: &PollPolicy,
    ) -> EsperarResult<WaitOutcome> {
        self.string_wait(
            format!("'{target}' text to not equal '{text}'"),
            policy,
            text,
            StringCheck::NotEquals,
            || self.actions.text(target),
        )
    }

    /// Wait until the target's text contains the fragment
    pub fn text_contains(
        &self,
        target: &Target,
        text: &str,
        policy: &PollPolicy,
    ) -> EsperarResult<WaitOutcome> {
        self.string_wait(
            format!("'{target}' text to contain '{text}'"),
            policy,
            text,
            StringCheck::Contains,
            || self.actions.text(target),
        )
    }

    /// Wait until the target's text no longer contains the fragment
    pub fn text_not_contains(
        &self,
        target: &Target,
        text: &str,
        policy: &PollPolicy,
    ) -> EsperarResult<WaitOutcome> {
        self.string_wait(
            format!("'{target}' text to not contain '{text}'"),
            policy,
            text,
            StringCheck::NotContains,
            || self.actions.text(target),
        )
    }

    /// Wait until the most recent message under the locator contains the
    /// fragment. Samples the text of the LAST matching element.
    pub fn last_text_contains(
        &self,
        locator: &Locator,
        text: &str,
        policy: &PollPolicy,
    ) -> EsperarResult<WaitOutcome> {
        self.string_wait(
            format!("last message under '{locator}' to contain '{text}'"),
            policy,
            text,
            StringCheck::Contains,
            || self.actions.last_message_text(locator),
        )
    }

    /// Wait until the most recent message under the locator no longer
    /// contains the fragment.
    pub fn last_text_not_contains(
        &self,
        locator: &Locator,
        text: &str,
        policy: &PollPolicy,
    ) -> EsperarResult<WaitOutcome> {
        self.string_wait(
            format!("last message under '{locator}' to not contain '{text}'"),
            policy,
            text,
            StringCheck::NotContains,
            || self.actions.last_message_text(locator),
        )
    }

    /// Wait until a message differing from `last_seen` appears as the most
    /// recent match. Comparison is exact: a new message differs however
    /// slightly, and case folding would mask real changes.
    pub fn new_message(
        &self,
        locator: &Locator,
        last_seen: &str,
        policy: &PollPolicy,
    ) -> EsperarResult<WaitOutcome> {
        self.until(
            &format!("a new message under '{locator}'"),
            &format!("anything but '{last_seen}'"),
            policy,
            || match self.actions.last_message_text(locator)? {
                Some(current) => Ok(ConditionSample::text(current != last_seen, current)),
                None => Ok(ConditionSample::pending()),
            },
        )
    }

    // =========================================================================
    // SURFACE-WIDE CONDITIONS
    // =========================================================================

    /// Wait until the surface's URL contains the fragment.
    ///
    /// A high-frequency check: the effective interval is clamped to at
    /// most 500 ms so navigation is confirmed promptly.
    pub fn url_contains(&self, fragment: &str, policy: &PollPolicy) -> EsperarResult<WaitOutcome> {
        let policy = policy.with_poll_interval(
            policy.effective_interval().min(HIGH_FREQUENCY_POLL_INTERVAL),
        );
        self.string_wait(
            format!("URL to contain '{fragment}'"),
            &policy,
            fragment,
            StringCheck::Contains,
            || self.actions.current_url().map(Some),
        )
    }

    /// Poll the locator until a click lands on it.
    ///
    /// Each iteration clicks the element if it currently exists; success
    /// is the first landed click.
    pub fn click(&self, locator: &Locator, policy: &PollPolicy) -> EsperarResult<WaitOutcome> {
        self.until(
            &format!("'{locator}' to be clicked"),
            "a landed click",
            policy,
            || Ok(ConditionSample::flag(self.actions.click_if_exists(locator)?)),
        )
    }

    /// Wait until a file matching the glob pattern exists in the directory
    pub fn file_exists(
        &self,
        dir: &Path,
        pattern: &str,
        policy: &PollPolicy,
    ) -> EsperarResult<WaitOutcome> {
        self.until(
            &format!("file '{pattern}' to exist in '{}'", dir.display()),
            "at least one matching file",
            policy,
            || {
                let files = file_check::list_files(dir, pattern)?;
                Ok(ConditionSample::count(!files.is_empty(), files.len()))
            },
        )
    }
}
