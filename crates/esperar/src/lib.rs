//! Esperar: Condition Waits for Remote UI Surfaces Under Test
//!
//! A polling-based condition-wait engine plus a resilient action layer for
//! driving a remote, asynchronously rendering UI during automated tests.
//! State over there is eventually consistent and only partially
//! observable; Esperar's job is to observe it with bounded patience and
//! report success or failure deterministically.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │  Wait (condition-poll engine)                                 │
//! │    sample → predicate → early-exit | sleep one interval       │
//! ├───────────────────────────────────────────────────────────────┤
//! │  Actions (resilient action layer)                             │
//! │    stale-handle retry · blocked-click replay · settle delays  │
//! ├──────────────────────────┬────────────────────────────────────┤
//! │  RemoteSurface (trait)   │  Reporter (trait)                  │
//! │  locate/read/interact    │  evidence + fatal signaling        │
//! └──────────────────────────┴────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use esperar::mock::MockSurface;
//! use esperar::{Actions, Locator, PollPolicy, Target, TracingReporter};
//!
//! let surface = MockSurface::new();
//! let status = Locator::css("#status");
//! let element = surface.add_element(&status);
//! surface.set_text(&element, "Ready");
//!
//! let actions = Actions::new(surface, TracingReporter::new());
//! let outcome = actions
//!     .wait()
//!     .text_equal(
//!         &Target::from(&status),
//!         "ready",
//!         &PollPolicy::new(Duration::from_secs(5)),
//!     )
//!     .unwrap();
//! assert!(outcome.succeeded);
//! ```

#![warn(missing_docs)]

mod action;
mod delay;
mod file_check;
mod locator;
mod metrics;
mod reporter;
mod result;
mod surface;
mod wait;

/// Scripted surface double for engine and harness tests
pub mod mock;

pub use action::{
    Actions, Pick, ACTION_SETTLE_DELAY, BLOCKED_RETRY_PAUSE, STALE_RETRY_ATTEMPTS,
};
pub use delay::{Delay, DelaySettings, DEFAULT_DELAY_FACTOR};
pub use file_check::list_files;
pub use locator::{Locator, Target, MAX_CHILD_LOCATORS};
pub use metrics::{MetricsRegistry, Stopwatch};
#[cfg(not(target_arch = "wasm32"))]
pub use reporter::init_tracing;
pub use reporter::{RecordedEvent, RecordingReporter, ReportLevel, Reporter, TracingReporter};
pub use result::{EsperarError, EsperarResult};
pub use surface::{ElementHandle, RemoteSurface, ScriptArg};
pub use wait::{
    ConditionSample, ObservedValue, PollPolicy, Wait, WaitOutcome, DEFAULT_POLL_INTERVAL,
    DEFAULT_WAIT_TIMEOUT, HIGH_FREQUENCY_POLL_INTERVAL,
};
