//! Site adapters - per-tracker knowledge of page markup
//!
//! Each adapter answers three questions about one issue tracker's pages:
//! - where is the native time-tracking block (selector chain, then label search)
//! - which part of it should be clickable
//! - which project and issue the page shows
//!
//! Adapters are looked up by configured system type through [`AdapterRegistry`].

pub mod adapter;
pub mod errors;
pub mod gitlab;
pub mod registry;

pub use adapter::{SiteAdapter, TRIGGER_TOOLTIP};
pub use errors::AdapterError;
pub use gitlab::{GitlabAdapter, ScanStrategy, TIME_TRACKING_LABEL};
pub use registry::{AdapterFactory, AdapterRegistry};
