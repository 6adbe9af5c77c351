//! Click handling for the injected trigger
//!
//! A click opens the overlay in its loading state, extracts the issue
//! identifiers, asks the request primitive for the report and paints the
//! outcome. Every failure ends as an overlay error; nothing escapes into the
//! page's own event dispatch.

use std::sync::Arc;

use extensions_bridge::{BridgeRequest, RequestPrimitive};
use omnitime_core_types::{AdapterMetadata, DebugLog, ReportPayload};
use page_dom::{DomEvent, Listener, Page};
use report_overlay::{OverlayTicket, ReportOverlay};
use site_adapter::SiteAdapter;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::error;
use url::form_urlencoded;

use crate::config::Configuration;
use crate::errors::ReportError;

/// `<api_url>?source=<origin>&project_id=<id>&issue_id=<id>`, each value escaped.
pub fn build_query_url(api_url: &str, origin: &str, metadata: &AdapterMetadata) -> String {
    format!(
        "{api_url}?source={}&project_id={}&issue_id={}",
        escape(origin),
        escape(&metadata.project_id),
        escape(&metadata.issue_id),
    )
}

fn escape(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

pub struct FetchOrchestrator {
    page: Page,
    adapter: Arc<dyn SiteAdapter>,
    overlay: Arc<ReportOverlay>,
    primitive: Arc<dyn RequestPrimitive>,
    api_url: String,
    api_key: String,
    log: DebugLog,
    runtime: Handle,
}

impl FetchOrchestrator {
    /// Must be called inside a tokio runtime; clicks spawn onto it.
    pub fn new(
        page: Page,
        adapter: Arc<dyn SiteAdapter>,
        overlay: Arc<ReportOverlay>,
        primitive: Arc<dyn RequestPrimitive>,
        configuration: &Configuration,
    ) -> Arc<Self> {
        Arc::new(Self {
            page,
            adapter,
            overlay,
            primitive,
            api_url: configuration.api_url.clone(),
            api_key: configuration.api_key.clone(),
            log: configuration.debug_log(),
            runtime: Handle::current(),
        })
    }

    pub fn overlay(&self) -> &Arc<ReportOverlay> {
        &self.overlay
    }

    /// Listener to attach to a trigger.
    pub fn click_handler(self: &Arc<Self>) -> Listener {
        let this = Arc::clone(self);
        Arc::new(move |event: &mut DomEvent| {
            event.prevent_default();
            event.stop_propagation();
            this.on_click();
        })
    }

    /// Open the overlay and start the fetch in the background.
    pub fn on_click(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        let ticket = match self.overlay.show_loading() {
            Ok(ticket) => ticket,
            Err(err) => {
                error!(error = %err, "failed to open report overlay");
                return None;
            }
        };
        let this = Arc::clone(self);
        Some(self.runtime.spawn(async move { this.complete(ticket).await }))
    }

    async fn complete(&self, ticket: OverlayTicket) {
        let painted = match self.fetch_report().await {
            Ok(payload) => self.overlay.render(ticket, payload),
            Err(err) => {
                error!(error = %err, "report request failed");
                self.overlay.show_error(ticket, &err.to_string())
            }
        };
        match painted {
            Ok(true) => {}
            Ok(false) => self.log.info("Overlay closed before the report arrived"),
            Err(err) => self
                .log
                .warn(format_args!("Failed to update overlay: {err}")),
        }
    }

    /// Metadata, query URL and exactly one request.
    pub async fn fetch_report(&self) -> Result<ReportPayload, ReportError> {
        let metadata = self.adapter.get_metadata(&self.page)?;
        let origin = self.page.location().origin();
        let url = build_query_url(&self.api_url, &origin, &metadata);
        self.log.info(format_args!("Requesting {url}"));

        let response = self
            .primitive
            .send(BridgeRequest::fetch_time_data(url, self.api_key.clone()))
            .await?;
        Ok(response.into_result()?)
    }
}
