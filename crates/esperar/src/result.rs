//! Result and error types for Esperar.

use thiserror::Error;

/// Result type for Esperar operations
pub type EsperarResult<T> = Result<T, EsperarError>;

/// Errors that can occur while driving a remote surface
#[derive(Debug, Error)]
pub enum EsperarError {
    /// A locator resolved to zero elements
    #[error("no elements found for '{locator}'")]
    NotFound {
        /// Locator that matched nothing
        locator: String,
    },

    /// A previously resolved handle no longer refers to a live element
    #[error("stale element reference: {context}")]
    Stale {
        /// Element or operation the handle belonged to
        context: String,
    },

    /// An interaction was intercepted by an overlay or obstruction
    #[error("interaction blocked on '{target}'")]
    Blocked {
        /// Element the interaction was aimed at
        target: String,
    },

    /// A polling loop exhausted its budget without the condition holding
    #[error("condition not met after {attempts} attempt(s) within {ms}ms")]
    Timeout {
        /// Effective timeout in milliseconds
        ms: u64,
        /// Evaluations performed before giving up
        attempts: usize,
    },

    /// Any other fault raised by the remote surface
    #[error("remote surface fault: {message}")]
    Surface {
        /// Error message
        message: String,
    },

    /// A child-locator chain was deeper than the supported maximum
    #[error("child locator chain of {given} exceeds {max} levels")]
    ChildDepthExceeded {
        /// Levels requested
        given: usize,
        /// Supported maximum
        max: usize,
    },

    /// Invalid filename pattern for a filesystem check
    #[error("invalid file pattern '{pattern}': {message}")]
    InvalidPattern {
        /// Offending pattern
        pattern: String,
        /// Parser message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EsperarError {
    /// Check whether this is a stale-handle fault
    #[must_use]
    pub const fn is_stale(&self) -> bool {
        matches!(self, Self::Stale { .. })
    }

    /// Check whether this is an intercepted-interaction fault
    #[must_use]
    pub const fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked { .. })
    }

    /// Check whether this is an empty-resolution fault
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check whether this is a poll-budget exhaustion
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
