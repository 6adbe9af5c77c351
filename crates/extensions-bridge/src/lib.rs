//! OmniTime extensions bridge.
//!
//! The page side cannot reach the time-tracking API directly; it asks the
//! background side with a `FETCH_TIME_DATA` message and gets exactly one
//! `{success, data?, error?}` answer back. This crate provides the wire
//! messages, the traits at both ends of that exchange, the HTTP fetch that
//! serves it, and a channel-based service/client pair standing in for the
//! browser's message passing.

pub mod errors;
pub mod http;
pub mod messages;
pub mod service;

use async_trait::async_trait;

pub use errors::BridgeError;
pub use http::{HttpFetchBridge, API_KEY_HEADER};
pub use messages::{BridgeRequest, BridgeResponse, FETCH_TIME_DATA};
pub use service::{BackgroundService, BridgeClient};

/// Page-side request primitive.
///
/// `Err` means the primitive itself failed (the other side is gone); a
/// failed fetch is an `Ok` response with `success: false`.
#[async_trait]
pub trait RequestPrimitive: Send + Sync {
    async fn send(&self, request: BridgeRequest) -> Result<BridgeResponse, BridgeError>;
}

/// Background-side message handler.
#[async_trait]
pub trait MessageHandler: Send + Sync + 'static {
    async fn handle(&self, request: BridgeRequest) -> BridgeResponse;
}
