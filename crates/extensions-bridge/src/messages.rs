//! Wire messages exchanged across the privilege boundary.

use omnitime_core_types::ReportPayload;
use serde::{Deserialize, Serialize};

use crate::errors::BridgeError;

/// The only action the background side understands.
pub const FETCH_TIME_DATA: &str = "FETCH_TIME_DATA";

const UNKNOWN_ERROR: &str = "Unknown error";

/// Request envelope sent from the page side.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeRequest {
    pub action: String,
    pub url: String,
    pub api_key: String,
}

impl BridgeRequest {
    pub fn fetch_time_data(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            action: FETCH_TIME_DATA.to_string(),
            url: url.into(),
            api_key: api_key.into(),
        }
    }

    pub fn is_fetch_time_data(&self) -> bool {
        self.action == FETCH_TIME_DATA
    }
}

/// Response envelope; `data` on success, `error` otherwise.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BridgeResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BridgeResponse {
    pub fn ok(data: serde_json::Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }

    /// Decode into the report payload or the reported failure.
    pub fn into_result(self) -> Result<ReportPayload, BridgeError> {
        if !self.success {
            let message = self
                .error
                .filter(|message| !message.is_empty())
                .unwrap_or_else(|| UNKNOWN_ERROR.to_string());
            return Err(BridgeError::Remote(message));
        }
        let data = self
            .data
            .ok_or_else(|| BridgeError::Decode("success response without data".to_string()))?;
        serde_json::from_value(data).map_err(|err| BridgeError::Decode(err.to_string()))
    }
}

impl From<Result<serde_json::Value, BridgeError>> for BridgeResponse {
    fn from(result: Result<serde_json::Value, BridgeError>) -> Self {
        match result {
            Ok(data) => BridgeResponse::ok(data),
            Err(err) => BridgeResponse::failure(err.to_string()),
        }
    }
}
