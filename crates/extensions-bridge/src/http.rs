//! Background-side fetch against the time-tracking API.

use async_trait::async_trait;
use omnitime_core_types::DebugLog;
use reqwest::header::ACCEPT;

use crate::errors::BridgeError;
use crate::messages::{BridgeRequest, BridgeResponse};
use crate::{MessageHandler, RequestPrimitive};

/// Header carrying the configured API key.
pub const API_KEY_HEADER: &str = "api-key";

/// Performs the GET for `FETCH_TIME_DATA` requests.
#[derive(Clone, Debug)]
pub struct HttpFetchBridge {
    client: reqwest::Client,
    log: DebugLog,
}

impl HttpFetchBridge {
    pub fn new() -> Result<Self, BridgeError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|err| BridgeError::Http(err.to_string()))?;
        Ok(Self {
            client,
            log: DebugLog::disabled(),
        })
    }

    pub fn with_log(mut self, log: DebugLog) -> Self {
        self.log = log;
        self
    }

    /// GET `url` and parse the body as JSON.
    pub async fn fetch(&self, url: &str, api_key: &str) -> Result<serde_json::Value, BridgeError> {
        self.log.info(format_args!("Fetching time data from {url}"));
        let response = self
            .client
            .get(url)
            .header(API_KEY_HEADER, api_key)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|err| BridgeError::Http(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BridgeError::Status(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| BridgeError::Http(err.to_string()))?;
        serde_json::from_slice(&body).map_err(|err| BridgeError::Decode(err.to_string()))
    }
}

#[async_trait]
impl MessageHandler for HttpFetchBridge {
    async fn handle(&self, request: BridgeRequest) -> BridgeResponse {
        if !request.is_fetch_time_data() {
            return BridgeResponse::failure(
                BridgeError::UnsupportedAction(request.action).to_string(),
            );
        }
        let result = self.fetch(&request.url, &request.api_key).await;
        if let Err(err) = &result {
            self.log
                .warn(format_args!("Fetch error for {}: {err}", request.url));
        }
        result.into()
    }
}

/// Direct use without a background service in between.
#[async_trait]
impl RequestPrimitive for HttpFetchBridge {
    async fn send(&self, request: BridgeRequest) -> Result<BridgeResponse, BridgeError> {
        Ok(self.handle(request).await)
    }
}
