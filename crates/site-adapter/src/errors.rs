//! Error types for site adapters

use page_dom::{DomError, SelectorError};
use thiserror::Error;

/// Adapter error enumeration
#[derive(Debug, Error, Clone)]
pub enum AdapterError {
    /// Required identifiers could not be read from the page
    #[error("metadata extraction failed: {0}")]
    Extraction(String),

    /// No adapter registered for the configured system type
    #[error("unsupported system type '{0}'")]
    UnsupportedSystemType(String),

    /// A built-in selector failed to parse
    #[error("invalid adapter selector: {0}")]
    InvalidSelector(#[from] SelectorError),

    /// Page operation failed while styling the target
    #[error("page error: {0}")]
    Dom(#[from] DomError),
}
