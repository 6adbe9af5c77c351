//! Target acquisition for the report trigger
//!
//! Finds the tracker's time-tracking element on pages that render late or
//! re-render, and wires the click handler exactly once per element:
//! - [`TargetLocator`]: immediate scan, bounded polling, mutation observation
//! - [`InjectionGuard`]: marker-based at-most-once handler attachment

pub mod errors;
pub mod guard;
pub mod locator;

pub use errors::LocatorError;
pub use guard::{InjectOutcome, InjectionGuard, INJECTED_MARKER};
pub use locator::{
    LocatorHandle, LocatorState, PollOutcome, PollPolicy, TargetLocator, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_POLL_INTERVAL,
};
