//! Resilient Action Layer
//!
//! Wraps single interactions with the remote surface in the recovery
//! policies that make polling loops trustworthy:
//!
//! - reads and visibility probes retry up to three times on a stale
//!   handle, re-resolving through the locator each attempt, and degrade to
//!   a neutral value (`None`/`false`) instead of propagating;
//! - an intercepted click replays the previously successful click, pauses,
//!   and retries the requested click exactly once;
//! - every mutating action is preceded by a short settle delay to absorb
//!   in-flight UI transitions before acting.
//!
//! Anything outside that taxonomy surfaces immediately with its context.

use std::cell::RefCell;
use std::time::Duration;

use crate::delay::Delay;
use crate::locator::{Locator, Target, MAX_CHILD_LOCATORS};
use crate::reporter::{ReportLevel, Reporter};
use crate::result::{EsperarError, EsperarResult};
use crate::surface::{ElementHandle, RemoteSurface, ScriptArg};
use crate::wait::Wait;

/// Settle pause before every mutating action, scaled by the delay factor
pub const ACTION_SETTLE_DELAY: Duration = Duration::from_millis(250);

/// Attempts for reads that hit a stale handle
pub const STALE_RETRY_ATTEMPTS: usize = 3;

/// Pause between the replayed click and the retried click
pub const BLOCKED_RETRY_PAUSE: Duration = Duration::from_secs(3);

const SCROLL_INTO_VIEW_JS: &str = "arguments[0].scrollIntoView();";
const SCROLL_TO_BOTTOM_JS: &str = "window.scrollTo(0, document.body.scrollHeight);";

// Walks up from the element under the element's center point; true when the
// element is the hit target, i.e. actually visible inside the viewport.
const VIEWPORT_PROBE_JS: &str = "var elem = arguments[0], \
     box = elem.getBoundingClientRect(), \
     cx = box.left + box.width / 2, \
     cy = box.top + box.height / 2, \
     e = document.elementFromPoint(cx, cy); \
     for (; e; e = e.parentElement) { if (e === elem) return true; } \
     return false;";

/// Which match to take when a locator resolves to several elements
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pick {
    /// First match in surface order
    First,
    /// Last match in surface order
    Last,
}

/// Resilient interaction layer over a [`RemoteSurface`].
///
/// Owns the surface and reporter handles plus the one piece of mutable
/// state the recovery heuristics need: a non-owning reference to the most
/// recently clicked element. Single logical thread of control per test
/// execution; the interior mutability is deliberately not `Sync`.
#[derive(Debug)]
pub struct Actions<S, R> {
    surface: S,
    reporter: R,
    delay: Delay,
    last_clicked: RefCell<Option<ElementHandle>>,
}

impl<S: RemoteSurface, R: Reporter> Actions<S, R> {
    /// Create an action layer with default delay settings
    pub fn new(surface: S, reporter: R) -> Self {
        Self::with_delay(surface, reporter, Delay::default())
    }

    /// Create an action layer sharing an existing delay primitive
    pub fn with_delay(surface: S, reporter: R, delay: Delay) -> Self {
        Self {
            surface,
            reporter,
            delay,
            last_clicked: RefCell::new(None),
        }
    }

    /// The underlying surface
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// The evidence reporter
    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    /// The delay primitive
    pub fn delay(&self) -> &Delay {
        &self.delay
    }

    /// The condition-wait engine driving this layer
    pub fn wait(&self) -> Wait<'_, S, R> {
        Wait::new(self)
    }

    // =========================================================================
    // RESOLUTION
    // =========================================================================

    /// Resolve a locator to all matching elements.
    ///
    /// Zero matches is a `NotFound` failure: recorded as evidence, signaled
    /// fatally when `fatal` is set, and never papered over with a
    /// placeholder element.
    pub fn find_elements(
        &self,
        locator: &Locator,
        fatal: bool,
    ) -> EsperarResult<Vec<ElementHandle>> {
        self.find_elements_within(locator, &[], fatal)
    }

    /// Resolve a locator, then narrow through up to five child locators.
    ///
    /// Each nesting step re-queries within the first element of the prior
    /// step's result set, discarding siblings. A miss at any step aborts
    /// the whole resolution.
    pub fn find_elements_within(
        &self,
        root: &Locator,
        children: &[Locator],
        fatal: bool,
    ) -> EsperarResult<Vec<ElementHandle>> {
        if children.len() > MAX_CHILD_LOCATORS {
            return Err(EsperarError::ChildDepthExceeded {
                given: children.len(),
                max: MAX_CHILD_LOCATORS,
            });
        }

        self.record(ReportLevel::Debug, format!("Searching for '{root}'"));
        let mut elements = self.surface.locate(root)?;

        for (step, child) in children.iter().enumerate() {
            if elements.is_empty() {
                break;
            }
            self.record(
                ReportLevel::Debug,
                format!("{}> Searching for child element '{child}'", "=".repeat(step + 1)),
            );
            elements = self.surface.locate_within(&elements[0], child)?;
        }

        if elements.is_empty() {
            let message = format!("no elements found for '{root}'");
            self.record(ReportLevel::Error, message.clone());
            let fault = EsperarError::NotFound {
                locator: root.to_string(),
            };
            if fatal {
                self.reporter.fail(&message, Some(&fault));
            }
            return Err(fault);
        }

        self.record(ReportLevel::Debug, format!("{} element(s) found", elements.len()));
        Ok(elements)
    }

    /// Resolve a target to exactly one element.
    ///
    /// An already-resolved handle is used as-is; a locator takes the first
    /// (or last) of its ordered matches.
    pub fn resolve(&self, target: &Target, pick: Pick, fatal: bool) -> EsperarResult<ElementHandle> {
        match target {
            Target::Resolved(handle) => Ok(handle.clone()),
            Target::Locator(locator) => {
                let elements = self.find_elements(locator, fatal)?;
                let handle = match pick {
                    Pick::First => elements.first(),
                    Pick::Last => elements.last(),
                };
                // find_elements never returns an empty Ok
                match handle {
                    Some(handle) => Ok(handle.clone()),
                    None => Err(EsperarError::NotFound {
                        locator: locator.to_string(),
                    }),
                }
            }
        }
    }

    /// Whether the locator currently matches at least one element
    pub fn exists(&self, locator: &Locator) -> EsperarResult<bool> {
        self.record(ReportLevel::Debug, format!("Checking existence of '{locator}'"));
        match self.find_elements(locator, false) {
            Ok(_) => Ok(true),
            Err(fault) if fault.is_not_found() => Ok(false),
            Err(fault) => Err(fault),
        }
    }

    /// How many elements the locator currently matches
    pub fn count(&self, locator: &Locator) -> EsperarResult<usize> {
        let count = self.surface.locate(locator)?.len();
        self.record(
            ReportLevel::Debug,
            format!("'{locator}' matches {count} element(s)"),
        );
        Ok(count)
    }

    // =========================================================================
    // READS (stale-handle retry, neutral fallback)
    // =========================================================================

    /// Current text of the element, `None` when unavailable
    pub fn text(&self, target: &Target) -> EsperarResult<Option<String>> {
        self.record(ReportLevel::Debug, format!("Getting text of '{target}'"));
        self.read_with_retry(target, Pick::First, |surface, el| surface.text(el))
    }

    /// Current value of an attribute, `None` when unavailable
    pub fn attribute(&self, target: &Target, name: &str) -> EsperarResult<Option<String>> {
        self.record(
            ReportLevel::Debug,
            format!("Getting attribute '{name}' of '{target}'"),
        );
        self.read_with_retry(target, Pick::First, |surface, el| surface.attribute(el, name))
    }

    /// Current computed CSS value, `None` when unavailable
    pub fn css_value(&self, target: &Target, name: &str) -> EsperarResult<Option<String>> {
        self.record(
            ReportLevel::Debug,
            format!("Getting CSS value '{name}' of '{target}'"),
        );
        self.read_with_retry(target, Pick::First, |surface, el| surface.css_value(el, name))
    }

    /// Whether the element is currently visible; unavailable reads as false
    pub fn is_displayed(&self, target: &Target) -> EsperarResult<bool> {
        self.record(ReportLevel::Debug, format!("Checking visibility of '{target}'"));
        Ok(self
            .read_with_retry(target, Pick::First, |surface, el| surface.is_displayed(el))?
            .unwrap_or(false))
    }

    /// Whether the element currently accepts interaction
    pub fn is_enabled(&self, target: &Target) -> EsperarResult<bool> {
        self.record(ReportLevel::Debug, format!("Checking enablement of '{target}'"));
        Ok(self
            .read_with_retry(target, Pick::First, |surface, el| surface.is_enabled(el))?
            .unwrap_or(false))
    }

    /// Whether the element's center point is the hit target in the viewport
    pub fn is_in_viewport(&self, target: &Target) -> EsperarResult<bool> {
        self.record(
            ReportLevel::Debug,
            format!("Checking if '{target}' is within the viewport"),
        );
        Ok(self
            .read_with_retry(target, Pick::First, |surface, el| {
                surface
                    .execute_script(VIEWPORT_PROBE_JS, &[ScriptArg::Element(el.clone())])
                    .map(|value| value.as_bool().unwrap_or(false))
            })?
            .unwrap_or(false))
    }

    /// Text of the LAST element matching the locator.
    ///
    /// The "most recent message" read for feeds that append at the end.
    pub fn last_message_text(&self, locator: &Locator) -> EsperarResult<Option<String>> {
        self.record(
            ReportLevel::Debug,
            format!("Reading most recent message text of '{locator}'"),
        );
        self.delay.pause(ACTION_SETTLE_DELAY);
        self.read_with_retry(&Target::from(locator), Pick::Last, |surface, el| {
            surface.text(el)
        })
    }

    /// Run a read against a freshly resolved handle, retrying on stale.
    ///
    /// Re-resolves through the locator on every attempt. After the retry
    /// budget, or when the locator matches nothing, the read degrades to
    /// `None`; any fault outside the retry taxonomy propagates untouched.
    fn read_with_retry<T>(
        &self,
        target: &Target,
        pick: Pick,
        op: impl Fn(&S, &ElementHandle) -> EsperarResult<T>,
    ) -> EsperarResult<Option<T>> {
        for attempt in 1..=STALE_RETRY_ATTEMPTS {
            let handle = match self.resolve(target, pick, false) {
                Ok(handle) => handle,
                Err(fault) if fault.is_not_found() => return Ok(None),
                Err(fault) => return Err(fault),
            };
            match op(&self.surface, &handle) {
                Ok(value) => return Ok(Some(value)),
                Err(fault) if fault.is_stale() => {
                    self.record(
                        ReportLevel::Warn,
                        format!(
                            "stale element reference, trying again ({attempt}/{STALE_RETRY_ATTEMPTS})"
                        ),
                    );
                }
                Err(fault) => return Err(fault),
            }
        }
        Ok(None)
    }

    // =========================================================================
    // MUTATIONS (settle delay, blocked-click recovery)
    // =========================================================================

    /// Click the target.
    ///
    /// When the click is intercepted by an obstruction, the previously
    /// successful click (if any) is replayed to dismiss it, then the
    /// requested click is retried once; a second interception is fatal.
    pub fn click(&self, target: &Target) -> EsperarResult<()> {
        self.record(ReportLevel::Debug, format!("Clicking '{target}'"));
        self.settle();

        let handle = self.resolve(target, Pick::First, false)?;
        match self.surface.click(&handle) {
            Ok(()) => {}
            Err(fault) if fault.is_blocked() => {
                self.record(
                    ReportLevel::Warn,
                    "click intercepted, replaying the previous click before retrying".to_string(),
                );
                let previous = self.last_clicked.borrow().clone();
                if let Some(previous) = previous {
                    if let Err(replay_fault) = self.surface.click(&previous) {
                        self.record(
                            ReportLevel::Warn,
                            format!("replayed click failed: {replay_fault}"),
                        );
                    }
                }
                self.delay.pause(BLOCKED_RETRY_PAUSE);
                if let Err(fault) = self.surface.click(&handle) {
                    let message = format!("click on '{target}' still blocked after replay");
                    self.reporter.fail(&message, Some(&fault));
                    return Err(fault);
                }
            }
            Err(fault) => return Err(fault),
        }

        self.record(ReportLevel::Success, format!("Clicked '{target}'"));
        *self.last_clicked.borrow_mut() = Some(handle);
        Ok(())
    }

    /// Click the locator if it currently matches; returns whether it did
    pub fn click_if_exists(&self, locator: &Locator) -> EsperarResult<bool> {
        self.record(ReportLevel::Debug, format!("Clicking '{locator}' if it exists"));
        if !self.exists(locator)? {
            return Ok(false);
        }
        self.click(&Target::from(locator))?;
        Ok(true)
    }

    /// Type text into the target
    pub fn type_text(&self, target: &Target, text: &str) -> EsperarResult<()> {
        self.type_inner(target, text, false)
    }

    /// Type a secret into the target; evidence shows a mask, never the text
    pub fn type_masked(&self, target: &Target, text: &str) -> EsperarResult<()> {
        self.type_inner(target, text, true)
    }

    fn type_inner(&self, target: &Target, text: &str, mask: bool) -> EsperarResult<()> {
        let shown = if mask { "*********" } else { text };
        self.record(ReportLevel::Debug, format!("Typing '{shown}' in '{target}'"));
        self.settle();
        let handle = self.resolve(target, Pick::First, false)?;
        self.surface.send_keys(&handle, text)
    }

    /// Clear the target's editable content
    pub fn clear(&self, target: &Target) -> EsperarResult<()> {
        self.record(ReportLevel::Debug, format!("Clearing '{target}'"));
        self.settle();
        let handle = self.resolve(target, Pick::First, false)?;
        self.surface.clear(&handle)
    }

    /// Clear (optionally), focus, then type: the full field-input gesture
    pub fn input(&self, target: &Target, text: &str, clear_first: bool) -> EsperarResult<()> {
        if clear_first {
            self.clear(target)?;
        }
        self.click(target)?;
        self.type_text(target, text)
    }

    /// Select an option of the target by its visible text
    pub fn select_by_text(&self, target: &Target, option_text: &str) -> EsperarResult<()> {
        self.record(
            ReportLevel::Debug,
            format!("Selecting option '{option_text}' in '{target}'"),
        );
        self.settle();
        let handle = self.resolve(target, Pick::First, false)?;
        self.surface.select_option(&handle, option_text)
    }

    /// Drag the first element onto the second
    pub fn drag_and_drop(&self, from: &Locator, to: &Locator) -> EsperarResult<()> {
        self.record(ReportLevel::Debug, format!("Dragging '{from}' onto '{to}'"));
        self.settle();
        let from_handle = self.resolve(&Target::from(from), Pick::First, false)?;
        let to_handle = self.resolve(&Target::from(to), Pick::First, false)?;
        self.surface.drag_and_drop(&from_handle, &to_handle)
    }

    /// Scroll the target into the viewport
    pub fn scroll_into_view(&self, target: &Target) -> EsperarResult<()> {
        self.record(ReportLevel::Debug, format!("Scrolling to '{target}'"));
        self.settle();
        let handle = self.resolve(target, Pick::First, false)?;
        self.surface
            .execute_script(SCROLL_INTO_VIEW_JS, &[ScriptArg::Element(handle)])
            .map(|_| ())
    }

    /// Scroll to the bottom of the page regardless of its height
    pub fn scroll_to_bottom(&self) -> EsperarResult<()> {
        self.record(ReportLevel::Debug, "Scrolling to bottom of page".to_string());
        self.settle();
        self.surface.execute_script(SCROLL_TO_BOTTOM_JS, &[]).map(|_| ())
    }

    /// Scroll the target into view only when it is not already visible
    pub fn ensure_visible(&self, target: &Target) -> EsperarResult<()> {
        if self.is_in_viewport(target)? {
            return Ok(());
        }
        self.scroll_into_view(target)
    }

    /// Reload the current document and give it a moment to settle
    pub fn refresh_view(&self) -> EsperarResult<()> {
        self.record(ReportLevel::Debug, "Refreshing view".to_string());
        self.surface.refresh()?;
        self.delay.pause(Duration::from_secs(4));
        Ok(())
    }

    /// The URL the surface currently shows
    pub fn current_url(&self) -> EsperarResult<String> {
        let url = self.surface.current_url()?;
        self.record(ReportLevel::Debug, format!("Current URL: {url}"));
        Ok(url)
    }

    // =========================================================================
    // MODAL PROMPTS
    // =========================================================================

    /// Accept the open modal prompt
    pub fn accept_prompt(&self, fatal: bool) -> EsperarResult<()> {
        self.record(ReportLevel::Info, "Accepting modal prompt".to_string());
        self.prompt_op(fatal, || self.surface.accept_prompt())
    }

    /// Dismiss the open modal prompt
    pub fn dismiss_prompt(&self, fatal: bool) -> EsperarResult<()> {
        self.record(ReportLevel::Info, "Dismissing modal prompt".to_string());
        self.prompt_op(fatal, || self.surface.dismiss_prompt())
    }

    /// Read the open modal prompt's message, `None` when absent (non-fatal)
    pub fn prompt_text(&self, fatal: bool) -> EsperarResult<Option<String>> {
        self.record(ReportLevel::Info, "Reading modal prompt text".to_string());
        match self.surface.prompt_text() {
            Ok(text) => Ok(Some(text)),
            Err(fault) => {
                self.handle_prompt_fault(fatal, &fault)?;
                Ok(None)
            }
        }
    }

    /// Type into the open modal prompt's input
    pub fn type_in_prompt(&self, text: &str, fatal: bool) -> EsperarResult<()> {
        self.record(
            ReportLevel::Info,
            format!("Typing '{text}' in modal prompt"),
        );
        self.prompt_op(fatal, || self.surface.type_in_prompt(text))
    }

    fn prompt_op(&self, fatal: bool, op: impl FnOnce() -> EsperarResult<()>) -> EsperarResult<()> {
        match op() {
            Ok(()) => Ok(()),
            Err(fault) => {
                self.handle_prompt_fault(fatal, &fault)?;
                Ok(())
            }
        }
    }

    // Absent prompt is tolerated unless the caller made it fatal.
    fn handle_prompt_fault(&self, fatal: bool, fault: &EsperarError) -> EsperarResult<()> {
        let message = format!("modal prompt not available: {fault}");
        self.record(ReportLevel::Error, message.clone());
        if fatal {
            self.reporter.fail(&message, Some(fault));
            return Err(EsperarError::Surface { message });
        }
        Ok(())
    }

    fn settle(&self) {
        self.delay.pause(ACTION_SETTLE_DELAY);
    }

    fn record(&self, level: ReportLevel, message: String) {
        self.reporter.record(level, &message, None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delay::DelaySettings;
    use crate::mock::MockSurface;
    use crate::reporter::RecordingReporter;
    use std::sync::Arc;

    fn fast_actions(surface: MockSurface) -> (Actions<MockSurface, RecordingReporter>, RecordingReporter) {
        let reporter = RecordingReporter::new();
        let delay = Delay::new(Arc::new(DelaySettings::with_factor(0.0)));
        let actions = Actions::with_delay(surface, reporter.clone(), delay);
        (actions, reporter)
    }

    mod resolution_tests {
        use super::*;

        #[test]
        fn test_resolve_first_and_last() {
            let surface = MockSurface::new();
            let locator = Locator::css("li");
            let handles = surface.add_elements(&locator, 3);
            let (actions, _) = fast_actions(surface);

            let first = actions.resolve(&Target::from(&locator), Pick::First, false).unwrap();
            let last = actions.resolve(&Target::from(&locator), Pick::Last, false).unwrap();
            assert_eq!(first, handles[0]);
            assert_eq!(last, handles[2]);
        }

        #[test]
        fn test_resolve_passes_through_handle() {
            let (actions, _) = fast_actions(MockSurface::new());
            let handle = ElementHandle::new("pre-resolved");
            let resolved = actions
                .resolve(&Target::from(&handle), Pick::First, false)
                .unwrap();
            assert_eq!(resolved, handle);
        }

        #[test]
        fn test_empty_resolution_is_not_found() {
            let (actions, reporter) = fast_actions(MockSurface::new());
            let err = actions
                .find_elements(&Locator::css("#missing"), false)
                .unwrap_err();
            assert!(err.is_not_found());
            assert!(reporter.has_level(ReportLevel::Error));
            assert_eq!(reporter.failure_count(), 0);
        }

        #[test]
        fn test_empty_resolution_fatal_signals_failure() {
            let (actions, reporter) = fast_actions(MockSurface::new());
            let err = actions
                .find_elements(&Locator::css("#missing"), true)
                .unwrap_err();
            assert!(err.is_not_found());
            assert_eq!(reporter.failure_count(), 1);
        }

        #[test]
        fn test_child_scoped_resolution() {
            let surface = MockSurface::new();
            let rows = Locator::css("tr");
            let cell = Locator::css("td");
            let parents = surface.add_elements(&rows, 2);
            let child = surface.add_child(&parents[0], &cell);
            let (actions, _) = fast_actions(surface);

            let found = actions
                .find_elements_within(&rows, &[cell], false)
                .unwrap();
            assert_eq!(found, vec![child]);
        }

        #[test]
        fn test_child_scope_uses_first_parent_only() {
            let surface = MockSurface::new();
            let rows = Locator::css("tr");
            let cell = Locator::css("td");
            let parents = surface.add_elements(&rows, 2);
            // child exists only under the second parent, which is discarded
            surface.add_child(&parents[1], &cell);
            let (actions, _) = fast_actions(surface);

            let err = actions
                .find_elements_within(&rows, &[cell], false)
                .unwrap_err();
            assert!(err.is_not_found());
        }

        #[test]
        fn test_child_chain_depth_limit() {
            let surface = MockSurface::new();
            let root = Locator::css("main");
            surface.add_element(&root);
            let (actions, _) = fast_actions(surface);

            let children = vec![Locator::css("a"); MAX_CHILD_LOCATORS + 1];
            let err = actions
                .find_elements_within(&root, &children, false)
                .unwrap_err();
            assert!(matches!(err, EsperarError::ChildDepthExceeded { given: 6, .. }));
        }

        #[test]
        fn test_exists() {
            let surface = MockSurface::new();
            let locator = Locator::css("#hero");
            surface.add_element(&locator);
            let (actions, _) = fast_actions(surface);

            assert!(actions.exists(&locator).unwrap());
            assert!(!actions.exists(&Locator::css("#ghost")).unwrap());
        }

        #[test]
        fn test_count_zero_is_observable() {
            let (actions, _) = fast_actions(MockSurface::new());
            assert_eq!(actions.count(&Locator::css(".row")).unwrap(), 0);
        }
    }

    mod read_tests {
        use super::*;

        #[test]
        fn test_text_reads_current_value() {
            let surface = MockSurface::new();
            let locator = Locator::css("#status");
            let el = surface.add_element(&locator);
            surface.set_text(&el, "Ready");
            let (actions, _) = fast_actions(surface);

            assert_eq!(
                actions.text(&Target::from(&locator)).unwrap(),
                Some("Ready".to_string())
            );
        }

        #[test]
        fn test_text_missing_element_is_neutral() {
            let (actions, _) = fast_actions(MockSurface::new());
            assert_eq!(actions.text(&Target::from(&Locator::css("#gone"))).unwrap(), None);
        }

        #[test]
        fn test_stale_twice_then_success() {
            let surface = MockSurface::new();
            let locator = Locator::css("#flaky");
            let el = surface.add_element(&locator);
            surface.set_text(&el, "value");
            surface.fail_reads_with_stale(&el, 2);
            let (actions, reporter) = fast_actions(surface);

            let text = actions.text(&Target::from(&locator)).unwrap();
            assert_eq!(text, Some("value".to_string()));
            // two stale warnings were recorded, nothing propagated
            let warns = reporter
                .events()
                .iter()
                .filter(|e| e.level == ReportLevel::Warn)
                .count();
            assert_eq!(warns, 2);
        }

        #[test]
        fn test_stale_exhaustion_degrades_to_none() {
            let surface = MockSurface::new();
            let locator = Locator::css("#flaky");
            let el = surface.add_element(&locator);
            surface.set_text(&el, "value");
            surface.fail_reads_with_stale(&el, STALE_RETRY_ATTEMPTS);
            let (actions, _) = fast_actions(surface);

            assert_eq!(actions.text(&Target::from(&locator)).unwrap(), None);
        }

        #[test]
        fn test_displayed_degrades_to_false() {
            let surface = MockSurface::new();
            let locator = Locator::css("#flaky");
            let el = surface.add_element(&locator);
            surface.set_displayed(&el, true);
            surface.fail_reads_with_stale(&el, STALE_RETRY_ATTEMPTS);
            let (actions, _) = fast_actions(surface);

            assert!(!actions.is_displayed(&Target::from(&locator)).unwrap());
        }

        #[test]
        fn test_attribute_and_css_reads() {
            let surface = MockSurface::new();
            let locator = Locator::css("input");
            let el = surface.add_element(&locator);
            surface.set_attribute(&el, "aria-expanded", "true");
            surface.set_css_value(&el, "display", "none");
            let (actions, _) = fast_actions(surface);

            let target = Target::from(&locator);
            assert_eq!(
                actions.attribute(&target, "aria-expanded").unwrap(),
                Some("true".to_string())
            );
            assert_eq!(
                actions.css_value(&target, "display").unwrap(),
                Some("none".to_string())
            );
        }

        #[test]
        fn test_unexpected_fault_propagates() {
            let surface = MockSurface::new();
            let locator = Locator::css("#broken");
            let el = surface.add_element(&locator);
            surface.fail_reads_with_fault(&el, 1);
            let (actions, _) = fast_actions(surface);

            let err = actions.text(&Target::from(&locator)).unwrap_err();
            assert!(matches!(err, EsperarError::Surface { .. }));
        }

        #[test]
        fn test_last_message_text_reads_last_match() {
            let surface = MockSurface::new();
            let locator = Locator::css(".message");
            let els = surface.add_elements(&locator, 3);
            surface.set_text(&els[0], "first");
            surface.set_text(&els[2], "newest");
            let (actions, _) = fast_actions(surface);

            assert_eq!(
                actions.last_message_text(&locator).unwrap(),
                Some("newest".to_string())
            );
        }
    }

    mod click_tests {
        use super::*;

        #[test]
        fn test_click_records_and_tracks_last() {
            let surface = MockSurface::new();
            let locator = Locator::css("button");
            let el = surface.add_element(&locator);
            let (actions, reporter) = fast_actions(surface);

            actions.click(&Target::from(&locator)).unwrap();
            assert_eq!(actions.surface().clicks(), vec![el.id().to_string()]);
            assert!(reporter.has_level(ReportLevel::Success));
        }

        #[test]
        fn test_blocked_click_replays_previous_then_retries() {
            let surface = MockSurface::new();
            let first = Locator::css("#open-menu");
            let second = Locator::css("#menu-item");
            let first_el = surface.add_element(&first);
            let second_el = surface.add_element(&second);
            surface.fail_clicks_with_blocked(&second_el, 1);
            let (actions, reporter) = fast_actions(surface);

            actions.click(&Target::from(&first)).unwrap();
            actions.click(&Target::from(&second)).unwrap();

            // blocked attempt, replayed previous click, successful retry
            assert_eq!(
                actions.surface().clicks(),
                vec![
                    first_el.id().to_string(),
                    first_el.id().to_string(),
                    second_el.id().to_string(),
                ]
            );
            assert!(reporter.has_message("click intercepted"));
            assert_eq!(reporter.failure_count(), 0);
        }

        #[test]
        fn test_blocked_click_without_previous_still_retries() {
            let surface = MockSurface::new();
            let locator = Locator::css("button");
            let el = surface.add_element(&locator);
            surface.fail_clicks_with_blocked(&el, 1);
            let (actions, _) = fast_actions(surface);

            actions.click(&Target::from(&locator)).unwrap();
            assert_eq!(actions.surface().clicks(), vec![el.id().to_string()]);
        }

        #[test]
        fn test_blocked_twice_is_fatal() {
            let surface = MockSurface::new();
            let locator = Locator::css("button");
            let el = surface.add_element(&locator);
            surface.fail_clicks_with_blocked(&el, 2);
            let (actions, reporter) = fast_actions(surface);

            let err = actions.click(&Target::from(&locator)).unwrap_err();
            assert!(err.is_blocked());
            assert_eq!(reporter.failure_count(), 1);
        }

        #[test]
        fn test_click_if_exists() {
            let surface = MockSurface::new();
            let locator = Locator::css("button");
            surface.add_element(&locator);
            let (actions, _) = fast_actions(surface);

            assert!(actions.click_if_exists(&locator).unwrap());
            assert!(!actions.click_if_exists(&Locator::css("#ghost")).unwrap());
        }
    }

    mod mutation_tests {
        use super::*;

        #[test]
        fn test_type_and_clear() {
            let surface = MockSurface::new();
            let locator = Locator::css("input");
            let el = surface.add_element(&locator);
            let (actions, _) = fast_actions(surface);

            let target = Target::from(&locator);
            actions.type_text(&target, "hello").unwrap();
            actions.clear(&target).unwrap();

            assert_eq!(
                actions.surface().typed(),
                vec![(el.id().to_string(), "hello".to_string())]
            );
            assert_eq!(actions.surface().cleared(), vec![el.id().to_string()]);
        }

        #[test]
        fn test_type_masked_hides_secret_from_evidence() {
            let surface = MockSurface::new();
            let locator = Locator::css("input[type=password]");
            surface.add_element(&locator);
            let (actions, reporter) = fast_actions(surface);

            actions
                .type_masked(&Target::from(&locator), "hunter2")
                .unwrap();
            assert!(!reporter.has_message("hunter2"));
            assert!(reporter.has_message("*********"));
        }

        #[test]
        fn test_input_clears_clicks_types() {
            let surface = MockSurface::new();
            let locator = Locator::css("input");
            let el = surface.add_element(&locator);
            let (actions, _) = fast_actions(surface);

            actions.input(&Target::from(&locator), "abc", true).unwrap();
            assert_eq!(actions.surface().cleared(), vec![el.id().to_string()]);
            assert_eq!(actions.surface().clicks(), vec![el.id().to_string()]);
            assert_eq!(
                actions.surface().typed(),
                vec![(el.id().to_string(), "abc".to_string())]
            );
        }

        #[test]
        fn test_select_and_drag() {
            let surface = MockSurface::new();
            let dropdown = Locator::css("select");
            let from = Locator::css("#card");
            let to = Locator::css("#column");
            let dropdown_el = surface.add_element(&dropdown);
            let from_el = surface.add_element(&from);
            let to_el = surface.add_element(&to);
            let (actions, _) = fast_actions(surface);

            actions
                .select_by_text(&Target::from(&dropdown), "Option B")
                .unwrap();
            actions.drag_and_drop(&from, &to).unwrap();

            assert_eq!(
                actions.surface().selections(),
                vec![(dropdown_el.id().to_string(), "Option B".to_string())]
            );
            assert_eq!(
                actions.surface().drags(),
                vec![(from_el.id().to_string(), to_el.id().to_string())]
            );
        }

        #[test]
        fn test_scroll_into_view_runs_script() {
            let surface = MockSurface::new();
            let locator = Locator::css("#footer");
            surface.add_element(&locator);
            let (actions, _) = fast_actions(surface);

            actions.scroll_into_view(&Target::from(&locator)).unwrap();
            let scripts = actions.surface().scripts();
            assert_eq!(scripts.len(), 1);
            assert!(scripts[0].contains("scrollIntoView"));
        }

        #[test]
        fn test_ensure_visible_skips_scroll_when_in_viewport() {
            let surface = MockSurface::new();
            let locator = Locator::css("#hero");
            surface.add_element(&locator);
            surface.set_script_result(serde_json::json!(true));
            let (actions, _) = fast_actions(surface);

            actions.ensure_visible(&Target::from(&locator)).unwrap();
            // only the viewport probe ran, no scroll
            let scripts = actions.surface().scripts();
            assert_eq!(scripts.len(), 1);
            assert!(scripts[0].contains("elementFromPoint"));
        }

        #[test]
        fn test_refresh_view() {
            let (actions, _) = fast_actions(MockSurface::new());
            actions.refresh_view().unwrap();
            assert_eq!(actions.surface().refresh_count(), 1);
        }
    }

    mod prompt_tests {
        use super::*;

        #[test]
        fn test_accept_open_prompt() {
            let surface = MockSurface::new();
            surface.open_prompt("Delete everything?");
            let (actions, _) = fast_actions(surface);

            actions.accept_prompt(true).unwrap();
            assert_eq!(actions.surface().prompt_log(), vec!["accept".to_string()]);
        }

        #[test]
        fn test_prompt_text_and_type() {
            let surface = MockSurface::new();
            surface.open_prompt("Name this snapshot");
            let (actions, _) = fast_actions(surface);

            assert_eq!(
                actions.prompt_text(true).unwrap(),
                Some("Name this snapshot".to_string())
            );
            actions.type_in_prompt("baseline", true).unwrap();
            assert_eq!(
                actions.surface().prompt_log(),
                vec!["read".to_string(), "type:baseline".to_string()]
            );
        }

        #[test]
        fn test_absent_prompt_tolerated_when_not_fatal() {
            let (actions, reporter) = fast_actions(MockSurface::new());
            actions.dismiss_prompt(false).unwrap();
            assert!(reporter.has_level(ReportLevel::Error));
            assert_eq!(reporter.failure_count(), 0);
        }

        #[test]
        fn test_absent_prompt_fatal() {
            let (actions, reporter) = fast_actions(MockSurface::new());
            let err = actions.accept_prompt(true).unwrap_err();
            assert!(matches!(err, EsperarError::Surface { .. }));
            assert_eq!(reporter.failure_count(), 1);
        }
    }
}
