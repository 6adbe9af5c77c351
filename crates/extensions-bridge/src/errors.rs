use thiserror::Error;

/// Errors surfaced by the bridge.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum BridgeError {
    /// Transport failure before a status was received
    #[error("{0}")]
    Http(String),

    /// Non-2xx answer from the time-tracking API
    #[error("HTTP error! status: {0}")]
    Status(u16),

    /// Body or payload was not the expected JSON
    #[error("invalid response body: {0}")]
    Decode(String),

    /// Failure reported by the other side of the boundary
    #[error("{0}")]
    Remote(String),

    #[error("unsupported action: {0}")]
    UnsupportedAction(String),

    #[error("channel closed")]
    ChannelClosed,
}
