//! Scripted Surface Double for Engine and Harness Tests
//!
//! [`MockSurface`] implements [`RemoteSurface`] over an in-memory script:
//! element sets per locator, per-element value sequences that advance one
//! step per read (the last value sticks), and bounded fault queues for
//! rehearsing stale-handle and intercepted-click recovery. Every
//! interaction is journaled so tests can assert exactly what the layer
//! under test did to the surface.
//!
//! Single-threaded by design, like the engine that drives it.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};

use crate::locator::Locator;
use crate::result::{EsperarError, EsperarResult};
use crate::surface::{ElementHandle, RemoteSurface, ScriptArg};

// =============================================================================
// SCRIPTED VALUES
// =============================================================================

/// A sequence of values handed out one per read; the final value repeats
#[derive(Debug, Clone)]
struct ScriptedValues<T> {
    values: VecDeque<T>,
}

impl<T: Clone> ScriptedValues<T> {
    fn single(value: T) -> Self {
        Self {
            values: VecDeque::from([value]),
        }
    }

    fn sequence(values: impl IntoIterator<Item = T>) -> Self {
        Self {
            values: values.into_iter().collect(),
        }
    }

    fn next(&mut self) -> Option<T> {
        if self.values.len() > 1 {
            self.values.pop_front()
        } else {
            self.values.front().cloned()
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    next_id: usize,
    url: String,
    elements: HashMap<Locator, Vec<ElementHandle>>,
    children: HashMap<(String, Locator), Vec<ElementHandle>>,
    texts: HashMap<String, ScriptedValues<String>>,
    attributes: HashMap<(String, String), ScriptedValues<String>>,
    css_values: HashMap<(String, String), ScriptedValues<String>>,
    displayed: HashMap<String, ScriptedValues<bool>>,
    enabled: HashMap<String, ScriptedValues<bool>>,
    stale_reads: HashMap<String, usize>,
    faulty_reads: HashMap<String, usize>,
    blocked_clicks: HashMap<String, usize>,
    clicks: Vec<String>,
    typed: Vec<(String, String)>,
    cleared: Vec<String>,
    selections: Vec<(String, String)>,
    drags: Vec<(String, String)>,
    scripts: Vec<String>,
    script_result: serde_json::Value,
    refreshes: usize,
    prompt: Option<String>,
    prompt_log: Vec<String>,
}

impl Inner {
    // Consumes one queued read fault for the element, if any.
    fn take_read_fault(&mut self, id: &str) -> Option<EsperarError> {
        if let Some(remaining) = self.stale_reads.get_mut(id) {
            if *remaining > 0 {
                *remaining -= 1;
                return Some(EsperarError::Stale {
                    context: id.to_string(),
                });
            }
        }
        if let Some(remaining) = self.faulty_reads.get_mut(id) {
            if *remaining > 0 {
                *remaining -= 1;
                return Some(EsperarError::Surface {
                    message: format!("scripted fault reading {id}"),
                });
            }
        }
        None
    }
}

// =============================================================================
// MOCK SURFACE
// =============================================================================

/// In-memory, scripted [`RemoteSurface`] implementation
#[derive(Debug, Default)]
pub struct MockSurface {
    inner: RefCell<Inner>,
}

impl MockSurface {
    /// Create an empty surface
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // SCRIPTING
    // =========================================================================

    /// Set the URL the surface reports
    pub fn set_url(&self, url: impl Into<String>) {
        self.inner.borrow_mut().url = url.into();
    }

    /// Add one element matched by the locator
    pub fn add_element(&self, locator: &Locator) -> ElementHandle {
        self.add_elements(locator, 1).remove(0)
    }

    /// Add `count` elements matched by the locator, in order
    pub fn add_elements(&self, locator: &Locator, count: usize) -> Vec<ElementHandle> {
        let mut inner = self.inner.borrow_mut();
        let mut added = Vec::with_capacity(count);
        for _ in 0..count {
            let handle = ElementHandle::new(format!("el-{}", inner.next_id));
            inner.next_id += 1;
            inner
                .elements
                .entry(locator.clone())
                .or_default()
                .push(handle.clone());
            added.push(handle);
        }
        added
    }

    /// Remove every element matched by the locator
    pub fn remove_elements(&self, locator: &Locator) {
        self.inner.borrow_mut().elements.remove(locator);
    }

    /// Add an element matched by the locator inside the parent's subtree
    pub fn add_child(&self, parent: &ElementHandle, locator: &Locator) -> ElementHandle {
        let mut inner = self.inner.borrow_mut();
        let handle = ElementHandle::new(format!("el-{}", inner.next_id));
        inner.next_id += 1;
        inner
            .children
            .entry((parent.id().to_string(), locator.clone()))
            .or_default()
            .push(handle.clone());
        handle
    }

    /// Fix the element's text
    pub fn set_text(&self, element: &ElementHandle, text: impl Into<String>) {
        self.inner
            .borrow_mut()
            .texts
            .insert(element.id().to_string(), ScriptedValues::single(text.into()));
    }

    /// Script a text sequence, one value per read; the last one sticks
    pub fn queue_texts(&self, element: &ElementHandle, texts: &[&str]) {
        self.inner.borrow_mut().texts.insert(
            element.id().to_string(),
            ScriptedValues::sequence(texts.iter().map(ToString::to_string)),
        );
    }

    /// Fix an attribute value
    pub fn set_attribute(&self, element: &ElementHandle, name: &str, value: impl Into<String>) {
        self.inner.borrow_mut().attributes.insert(
            (element.id().to_string(), name.to_string()),
            ScriptedValues::single(value.into()),
        );
    }

    /// Script an attribute sequence, one value per read
    pub fn queue_attributes(&self, element: &ElementHandle, name: &str, values: &[&str]) {
        self.inner.borrow_mut().attributes.insert(
            (element.id().to_string(), name.to_string()),
            ScriptedValues::sequence(values.iter().map(ToString::to_string)),
        );
    }

    /// Fix a computed CSS value
    pub fn set_css_value(&self, element: &ElementHandle, name: &str, value: impl Into<String>) {
        self.inner.borrow_mut().css_values.insert(
            (element.id().to_string(), name.to_string()),
            ScriptedValues::single(value.into()),
        );
    }

    /// Fix the element's visibility
    pub fn set_displayed(&self, element: &ElementHandle, displayed: bool) {
        self.inner.borrow_mut().displayed.insert(
            element.id().to_string(),
            ScriptedValues::single(displayed),
        );
    }

    /// Script a visibility sequence, one value per probe
    pub fn queue_displayed(&self, element: &ElementHandle, values: &[bool]) {
        self.inner.borrow_mut().displayed.insert(
            element.id().to_string(),
            ScriptedValues::sequence(values.iter().copied()),
        );
    }

    /// Fix the element's enablement
    pub fn set_enabled(&self, element: &ElementHandle, enabled: bool) {
        self.inner
            .borrow_mut()
            .enabled
            .insert(element.id().to_string(), ScriptedValues::single(enabled));
    }

    /// Script an enablement sequence, one value per probe
    pub fn queue_enabled(&self, element: &ElementHandle, values: &[bool]) {
        self.inner.borrow_mut().enabled.insert(
            element.id().to_string(),
            ScriptedValues::sequence(values.iter().copied()),
        );
    }

    /// Make the next `times` reads of the element fail with a stale fault
    pub fn fail_reads_with_stale(&self, element: &ElementHandle, times: usize) {
        self.inner
            .borrow_mut()
            .stale_reads
            .insert(element.id().to_string(), times);
    }

    /// Make the next `times` reads fail with an unexpected surface fault
    pub fn fail_reads_with_fault(&self, element: &ElementHandle, times: usize) {
        self.inner
            .borrow_mut()
            .faulty_reads
            .insert(element.id().to_string(), times);
    }

    /// Make the next `times` clicks on the element raise an interception
    pub fn fail_clicks_with_blocked(&self, element: &ElementHandle, times: usize) {
        self.inner
            .borrow_mut()
            .blocked_clicks
            .insert(element.id().to_string(), times);
    }

    /// Fix the value every executed script returns
    pub fn set_script_result(&self, value: serde_json::Value) {
        self.inner.borrow_mut().script_result = value;
    }

    /// Open a modal prompt with the given message
    pub fn open_prompt(&self, message: impl Into<String>) {
        self.inner.borrow_mut().prompt = Some(message.into());
    }

    // =========================================================================
    // JOURNALS
    // =========================================================================

    /// Element ids clicked, in order (successful clicks only)
    #[must_use]
    pub fn clicks(&self) -> Vec<String> {
        self.inner.borrow().clicks.clone()
    }

    /// (element id, text) pairs sent as keystrokes, in order
    #[must_use]
    pub fn typed(&self) -> Vec<(String, String)> {
        self.inner.borrow().typed.clone()
    }

    /// Element ids cleared, in order
    #[must_use]
    pub fn cleared(&self) -> Vec<String> {
        self.inner.borrow().cleared.clone()
    }

    /// (element id, option text) pairs selected, in order
    #[must_use]
    pub fn selections(&self) -> Vec<(String, String)> {
        self.inner.borrow().selections.clone()
    }

    /// (from id, to id) drag pairs, in order
    #[must_use]
    pub fn drags(&self) -> Vec<(String, String)> {
        self.inner.borrow().drags.clone()
    }

    /// Script sources executed, in order
    #[must_use]
    pub fn scripts(&self) -> Vec<String> {
        self.inner.borrow().scripts.clone()
    }

    /// Number of refreshes requested
    #[must_use]
    pub fn refresh_count(&self) -> usize {
        self.inner.borrow().refreshes
    }

    /// Prompt interactions, in order: `accept`, `dismiss`, `read`,
    /// `type:<text>`
    #[must_use]
    pub fn prompt_log(&self) -> Vec<String> {
        self.inner.borrow().prompt_log.clone()
    }
}

impl RemoteSurface for MockSurface {
    fn locate(&self, locator: &Locator) -> EsperarResult<Vec<ElementHandle>> {
        Ok(self
            .inner
            .borrow()
            .elements
            .get(locator)
            .cloned()
            .unwrap_or_default())
    }

    fn locate_within(
        &self,
        parent: &ElementHandle,
        locator: &Locator,
    ) -> EsperarResult<Vec<ElementHandle>> {
        Ok(self
            .inner
            .borrow()
            .children
            .get(&(parent.id().to_string(), locator.clone()))
            .cloned()
            .unwrap_or_default())
    }

    fn click(&self, element: &ElementHandle) -> EsperarResult<()> {
        let mut inner = self.inner.borrow_mut();
        if let Some(remaining) = inner.blocked_clicks.get_mut(element.id()) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(EsperarError::Blocked {
                    target: element.id().to_string(),
                });
            }
        }
        inner.clicks.push(element.id().to_string());
        Ok(())
    }

    fn send_keys(&self, element: &ElementHandle, text: &str) -> EsperarResult<()> {
        self.inner
            .borrow_mut()
            .typed
            .push((element.id().to_string(), text.to_string()));
        Ok(())
    }

    fn clear(&self, element: &ElementHandle) -> EsperarResult<()> {
        self.inner
            .borrow_mut()
            .cleared
            .push(element.id().to_string());
        Ok(())
    }

    fn text(&self, element: &ElementHandle) -> EsperarResult<String> {
        let mut inner = self.inner.borrow_mut();
        if let Some(fault) = inner.take_read_fault(element.id()) {
            return Err(fault);
        }
        Ok(inner
            .texts
            .get_mut(element.id())
            .and_then(ScriptedValues::next)
            .unwrap_or_default())
    }

    fn attribute(&self, element: &ElementHandle, name: &str) -> EsperarResult<String> {
        let mut inner = self.inner.borrow_mut();
        if let Some(fault) = inner.take_read_fault(element.id()) {
            return Err(fault);
        }
        Ok(inner
            .attributes
            .get_mut(&(element.id().to_string(), name.to_string()))
            .and_then(ScriptedValues::next)
            .unwrap_or_default())
    }

    fn css_value(&self, element: &ElementHandle, name: &str) -> EsperarResult<String> {
        let mut inner = self.inner.borrow_mut();
        if let Some(fault) = inner.take_read_fault(element.id()) {
            return Err(fault);
        }
        Ok(inner
            .css_values
            .get_mut(&(element.id().to_string(), name.to_string()))
            .and_then(ScriptedValues::next)
            .unwrap_or_default())
    }

    fn is_displayed(&self, element: &ElementHandle) -> EsperarResult<bool> {
        let mut inner = self.inner.borrow_mut();
        if let Some(fault) = inner.take_read_fault(element.id()) {
            return Err(fault);
        }
        Ok(inner
            .displayed
            .get_mut(element.id())
            .and_then(ScriptedValues::next)
            .unwrap_or(false))
    }

    fn is_enabled(&self, element: &ElementHandle) -> EsperarResult<bool> {
        let mut inner = self.inner.borrow_mut();
        if let Some(fault) = inner.take_read_fault(element.id()) {
            return Err(fault);
        }
        Ok(inner
            .enabled
            .get_mut(element.id())
            .and_then(ScriptedValues::next)
            .unwrap_or(true))
    }

    fn select_option(&self, element: &ElementHandle, option_text: &str) -> EsperarResult<()> {
        self.inner
            .borrow_mut()
            .selections
            .push((element.id().to_string(), option_text.to_string()));
        Ok(())
    }

    fn drag_and_drop(&self, from: &ElementHandle, to: &ElementHandle) -> EsperarResult<()> {
        self.inner
            .borrow_mut()
            .drags
            .push((from.id().to_string(), to.id().to_string()));
        Ok(())
    }

    fn current_url(&self) -> EsperarResult<String> {
        Ok(self.inner.borrow().url.clone())
    }

    fn refresh(&self) -> EsperarResult<()> {
        self.inner.borrow_mut().refreshes += 1;
        Ok(())
    }

    fn execute_script(
        &self,
        source: &str,
        _args: &[ScriptArg],
    ) -> EsperarResult<serde_json::Value> {
        let mut inner = self.inner.borrow_mut();
        inner.scripts.push(source.to_string());
        Ok(inner.script_result.clone())
    }

    fn accept_prompt(&self) -> EsperarResult<()> {
        let mut inner = self.inner.borrow_mut();
        if inner.prompt.take().is_none() {
            return Err(no_prompt());
        }
        inner.prompt_log.push("accept".to_string());
        Ok(())
    }

    fn dismiss_prompt(&self) -> EsperarResult<()> {
        let mut inner = self.inner.borrow_mut();
        if inner.prompt.take().is_none() {
            return Err(no_prompt());
        }
        inner.prompt_log.push("dismiss".to_string());
        Ok(())
    }

    fn prompt_text(&self) -> EsperarResult<String> {
        let mut inner = self.inner.borrow_mut();
        let message = inner.prompt.clone().ok_or_else(no_prompt)?;
        inner.prompt_log.push("read".to_string());
        Ok(message)
    }

    fn type_in_prompt(&self, text: &str) -> EsperarResult<()> {
        let mut inner = self.inner.borrow_mut();
        if inner.prompt.is_none() {
            return Err(no_prompt());
        }
        inner.prompt_log.push(format!("type:{text}"));
        Ok(())
    }
}

fn no_prompt() -> EsperarError {
    EsperarError::Surface {
        message: "no prompt present".to_string(),
    }
}
