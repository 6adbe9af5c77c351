//! Error types for activation and the report click path

use extensions_bridge::BridgeError;
use site_adapter::AdapterError;
use thiserror::Error;

/// Reasons the content script stays inactive on a page.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ActivationError {
    /// `apiUrl` or `instances` absent from the stored settings
    #[error("missing configuration: {0}")]
    ConfigurationMissing(&'static str),

    /// Page host is not a configured instance
    #[error("no configured instance for host {0}")]
    NoHostMatch(String),

    #[error("no adapter found for system type '{0}'")]
    UnsupportedSystemType(String),
}

impl ActivationError {
    /// The frequent, expected case that must not be logged.
    pub fn is_silent(&self) -> bool {
        matches!(self, ActivationError::NoHostMatch(_))
    }
}

/// Failures on the click path, surfaced into the overlay.
#[derive(Debug, Error, Clone)]
pub enum ReportError {
    #[error("{0}")]
    Extraction(#[from] AdapterError),

    #[error("{0}")]
    Fetch(#[from] BridgeError),
}
