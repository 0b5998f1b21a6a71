//! RemoteSurface - Abstract Remote UI Driver Trait
//!
//! The wait engine and the action layer never talk to a concrete browser
//! or UI runtime. They drive an abstract [`RemoteSurface`] capability, so
//! implementations can sit on WebDriver, CDP, or an in-process test double
//! without the core noticing.
//!
//! Implementations are expected to be cheap and safe to call repeatedly;
//! their own I/O latency is absorbed into the polling interval.

use serde::{Deserialize, Serialize};

use crate::locator::Locator;
use crate::result::EsperarResult;

/// Transient reference to a resolved element.
///
/// A handle is a snapshot: it stays valid only while the remote surface
/// keeps the underlying element alive. Structural change on the surface
/// invalidates it, which the surface reports as a stale fault. Handles are
/// owned by a single action invocation and are never cached across polling
/// iterations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementHandle {
    /// Surface-assigned identifier for the snapshot
    id: String,
}

impl ElementHandle {
    /// Create a handle from a surface-assigned identifier
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    /// The surface-assigned identifier
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl std::fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "element#{}", self.id)
    }
}

/// Argument passed to a script executed on the remote surface
#[derive(Debug, Clone)]
pub enum ScriptArg {
    /// A resolved element, marshalled by the surface implementation
    Element(ElementHandle),
    /// An arbitrary JSON value
    Value(serde_json::Value),
}

/// Capability contract for the remote UI driver.
///
/// Every method is fallible. Implementations signal the taxonomy the core
/// recovers from (`Stale`, `Blocked`, `NotFound`) through
/// [`crate::EsperarError`]; anything else surfaces as an unexpected fault
/// and is never retried by the core.
pub trait RemoteSurface {
    /// Locate all elements matching the locator, in surface order.
    ///
    /// Zero matches is an `Ok(vec![])`, not an error; the caller decides
    /// whether absence is a failure.
    fn locate(&self, locator: &Locator) -> EsperarResult<Vec<ElementHandle>>;

    /// Locate elements matching `locator` within the subtree of `parent`
    fn locate_within(
        &self,
        parent: &ElementHandle,
        locator: &Locator,
    ) -> EsperarResult<Vec<ElementHandle>>;

    /// Click the element
    fn click(&self, element: &ElementHandle) -> EsperarResult<()>;

    /// Send keystrokes to the element
    fn send_keys(&self, element: &ElementHandle, text: &str) -> EsperarResult<()>;

    /// Clear the element's editable content
    fn clear(&self, element: &ElementHandle) -> EsperarResult<()>;

    /// Read the element's visible text
    fn text(&self, element: &ElementHandle) -> EsperarResult<String>;

    /// Read an attribute value
    fn attribute(&self, element: &ElementHandle, name: &str) -> EsperarResult<String>;

    /// Read a computed CSS value
    fn css_value(&self, element: &ElementHandle, name: &str) -> EsperarResult<String>;

    /// Whether the element is currently rendered visible
    fn is_displayed(&self, element: &ElementHandle) -> EsperarResult<bool>;

    /// Whether the element currently accepts interaction
    fn is_enabled(&self, element: &ElementHandle) -> EsperarResult<bool>;

    /// Select an option of a choice element by its visible text
    fn select_option(&self, element: &ElementHandle, option_text: &str) -> EsperarResult<()>;

    /// Drag one element onto another
    fn drag_and_drop(&self, from: &ElementHandle, to: &ElementHandle) -> EsperarResult<()>;

    /// The URL currently shown by the surface
    fn current_url(&self) -> EsperarResult<String>;

    /// Reload the surface's current document
    fn refresh(&self) -> EsperarResult<()>;

    /// Execute a script on the surface and return its result
    fn execute_script(
        &self,
        source: &str,
        args: &[ScriptArg],
    ) -> EsperarResult<serde_json::Value>;

    /// Accept the open modal prompt
    fn accept_prompt(&self) -> EsperarResult<()>;

    /// Dismiss the open modal prompt
    fn dismiss_prompt(&self) -> EsperarResult<()>;

    /// Read the open modal prompt's message
    fn prompt_text(&self) -> EsperarResult<String>;

    /// Type into the open modal prompt's input
    fn type_in_prompt(&self, text: &str) -> EsperarResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_identity() {
        let a = ElementHandle::new("el-1");
        let b = ElementHandle::new("el-1");
        let c = ElementHandle::new("el-2");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.id(), "el-1");
    }

    #[test]
    fn test_handle_display() {
        assert_eq!(format!("{}", ElementHandle::new("e7")), "element#e7");
    }

    #[test]
    fn test_handle_serde_round_trip() {
        let handle = ElementHandle::new("el-42");
        let json = serde_json::to_string(&handle).unwrap();
        let back: ElementHandle = serde_json::from_str(&json).unwrap();
        assert_eq!(handle, back);
    }
}
