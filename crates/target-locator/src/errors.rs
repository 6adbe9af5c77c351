//! Error types for target acquisition

use page_dom::DomError;
use site_adapter::AdapterError;
use thiserror::Error;

/// Locator error enumeration
#[derive(Debug, Error, Clone)]
pub enum LocatorError {
    /// Adapter failed to derive a trigger
    #[error("adapter error: {0}")]
    Adapter(#[from] AdapterError),

    /// Page operation failed while injecting
    #[error("page error: {0}")]
    Dom(#[from] DomError),

    /// Background discovery task ended abnormally
    #[error("discovery task failed: {0}")]
    Task(String),
}
