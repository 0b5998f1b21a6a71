//! Locator abstraction for element selection.
//!
//! A [`Locator`] is an immutable query descriptor against the remote
//! surface's current state. It carries no handle to any element: every
//! polling iteration re-resolves through the locator so the loop never
//! acts on a snapshot that the surface has since invalidated.

use serde::{Deserialize, Serialize};

use crate::surface::ElementHandle;

/// Maximum number of nested child locators in a scoped resolution
pub const MAX_CHILD_LOCATORS: usize = 5;

/// Query descriptor for locating elements on the remote surface.
///
/// Equality and hashing are structural: two locators are the same query
/// if and only if they carry the same strategy and expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Locator {
    /// CSS selector (e.g., "button.primary")
    Css(String),
    /// XPath expression
    XPath(String),
    /// Text content match
    Text(String),
    /// Test ID selector (data-testid attribute)
    TestId(String),
}

impl Locator {
    /// Create a CSS selector locator
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create an XPath locator
    #[must_use]
    pub fn xpath(expression: impl Into<String>) -> Self {
        Self::XPath(expression.into())
    }

    /// Create a text content locator
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Create a test ID locator
    #[must_use]
    pub fn test_id(id: impl Into<String>) -> Self {
        Self::TestId(id.into())
    }

    /// The query expression without its strategy prefix
    #[must_use]
    pub fn expression(&self) -> &str {
        match self {
            Self::Css(s) | Self::XPath(s) | Self::Text(s) | Self::TestId(s) => s,
        }
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Css(s) => write!(f, "css={s}"),
            Self::XPath(s) => write!(f, "xpath={s}"),
            Self::Text(s) => write!(f, "text={s}"),
            Self::TestId(s) => write!(f, "testid={s}"),
        }
    }
}

/// Either a locator still to be resolved or an element already in hand.
///
/// Most actions accept both forms. The action layer pattern-matches and
/// resolves only the [`Target::Locator`] branch; a [`Target::Resolved`]
/// handle is used as-is and therefore skips stale re-resolution.
#[derive(Debug, Clone)]
pub enum Target {
    /// A query to resolve at the point of use
    Locator(Locator),
    /// An element handle resolved earlier in the same operation
    Resolved(ElementHandle),
}

impl From<Locator> for Target {
    fn from(locator: Locator) -> Self {
        Self::Locator(locator)
    }
}

impl From<&Locator> for Target {
    fn from(locator: &Locator) -> Self {
        Self::Locator(locator.clone())
    }
}

impl From<ElementHandle> for Target {
    fn from(handle: ElementHandle) -> Self {
        Self::Resolved(handle)
    }
}

impl From<&ElementHandle> for Target {
    fn from(handle: &ElementHandle) -> Self {
        Self::Resolved(handle.clone())
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Locator(locator) => write!(f, "{locator}"),
            Self::Resolved(handle) => write!(f, "{handle}"),
        }
    }
}
