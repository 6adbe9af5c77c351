//! OmniTime
//!
//! Adds a time-tracking report popup to issue-tracker pages. The pieces live
//! in the member crates; this crate reads settings, decides whether a page is
//! a configured instance, and wires discovery, injection, fetching and the
//! overlay together.

pub mod cli;
pub mod config;
pub mod content;
pub mod errors;
pub mod logging;
pub mod orchestrator;

pub use config::{
    ConfigStore, Configuration, FileConfigStore, InstanceConfig, MemoryConfigStore, Settings,
};
pub use content::{match_instance, ActiveSession, ContentScript};
pub use errors::{ActivationError, ReportError};
pub use orchestrator::{build_query_url, FetchOrchestrator};
