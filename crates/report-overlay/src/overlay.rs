//! Full-page report overlay
//!
//! Owns one backdrop + panel subtree in the host document. Showing a new
//! overlay tears down the previous one first, listeners included, so
//! repeated clicks never stack popups or key handlers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use omnitime_core_types::{DebugLog, ReportPayload};
use page_dom::{Document, DomError, DomEvent, EventKind, Listener, ListenerId, NodeId};
use parking_lot::Mutex;
use tokio::sync::watch;

use crate::view::{ReportView, EMPTY_MESSAGE, TIME_HEADER, TOTAL_LABEL};

pub const OVERLAY_CLASS: &str = "omnitime-modal-overlay";
pub const PANEL_CLASS: &str = "omnitime-modal";
pub const HEADER_CLASS: &str = "omnitime-modal-header";
pub const CLOSE_CLASS: &str = "omnitime-modal-close";
pub const CONTENT_CLASS: &str = "omnitime-modal-content";
pub const TABLE_CLASS: &str = "omnitime-table";
pub const TOTAL_ROW_CLASS: &str = "omnitime-total-row";
pub const ERROR_CLASS: &str = "omnitime-error";

pub const TITLE: &str = "Tracking report";
pub const CLOSE_LABEL: &str = "\u{00d7}";
pub const LOADING_MESSAGE: &str = "Loading time data...";

const ESCAPE_KEY: &str = "Escape";

/// Text shown for a failed load.
pub fn error_text(reason: &str) -> String {
    format!("Failed to load time data: {reason}. Please check logs.")
}

/// What the overlay currently displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayState {
    Hidden,
    Loading,
    Rendered(ReportPayload),
    /// Carries the underlying reason
    Errored(String),
}

/// Names one opened overlay instance.
///
/// Results are applied only while the ticket's instance is still open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OverlayTicket(u64);

struct OpenOverlay {
    instance: u64,
    root: NodeId,
    content: NodeId,
    key_listener: ListenerId,
}

pub struct ReportOverlay {
    document: Document,
    log: DebugLog,
    open: Mutex<Option<OpenOverlay>>,
    next_instance: AtomicU64,
    state: watch::Sender<OverlayState>,
    this: Weak<ReportOverlay>,
}

impl ReportOverlay {
    pub fn new(document: Document, log: DebugLog) -> Arc<Self> {
        let (state, _) = watch::channel(OverlayState::Hidden);
        Arc::new_cyclic(|this| Self {
            document,
            log,
            open: Mutex::new(None),
            next_instance: AtomicU64::new(1),
            state,
            this: this.clone(),
        })
    }

    pub fn state(&self) -> OverlayState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<OverlayState> {
        self.state.subscribe()
    }

    pub fn is_open(&self) -> bool {
        self.open.lock().is_some()
    }

    /// Root element of the open overlay.
    pub fn root(&self) -> Option<NodeId> {
        self.open.lock().as_ref().map(|open| open.root)
    }

    /// Open a fresh overlay in the loading state, replacing any open one.
    pub fn show_loading(&self) -> Result<OverlayTicket, DomError> {
        let mut open = self.open.lock();
        if let Some(previous) = open.take() {
            self.teardown(previous);
        }

        let instance = self.next_instance.fetch_add(1, Ordering::SeqCst);
        let built = self.build(instance)?;
        *open = Some(built);
        drop(open);

        self.log.info(format_args!("Report overlay {instance} opened"));
        self.state.send_replace(OverlayState::Loading);
        Ok(OverlayTicket(instance))
    }

    /// Render a payload into the ticket's overlay.
    ///
    /// Returns `false` when the ticket is stale and nothing was drawn.
    pub fn render(&self, ticket: OverlayTicket, payload: ReportPayload) -> Result<bool, DomError> {
        let view = ReportView::from_payload(&payload);
        let drawn = self.replace_content(ticket, |document| build_view(document, &view))?;
        if drawn {
            self.state.send_replace(OverlayState::Rendered(payload));
        }
        Ok(drawn)
    }

    /// Render an error into the ticket's overlay.
    pub fn show_error(&self, ticket: OverlayTicket, reason: &str) -> Result<bool, DomError> {
        let drawn = self.replace_content(ticket, |document| {
            let node = document.create_element("div");
            document.set_attribute(node, "class", ERROR_CLASS)?;
            centered(document, node, "#d9534f")?;
            document.set_text_content(node, &error_text(reason))?;
            Ok(node)
        })?;
        if drawn {
            self.state
                .send_replace(OverlayState::Errored(reason.to_string()));
        }
        Ok(drawn)
    }

    /// Remove the open overlay, if any.
    pub fn close(&self) {
        let previous = self.open.lock().take();
        if let Some(previous) = previous {
            self.teardown(previous);
            self.state.send_replace(OverlayState::Hidden);
        }
    }

    fn close_instance(&self, instance: u64) {
        let previous = {
            let mut open = self.open.lock();
            match open.as_ref() {
                Some(current) if current.instance == instance => open.take(),
                _ => None,
            }
        };
        if let Some(previous) = previous {
            self.teardown(previous);
            self.state.send_replace(OverlayState::Hidden);
        }
    }

    fn teardown(&self, overlay: OpenOverlay) {
        self.document.remove_document_listener(overlay.key_listener);
        if let Err(err) = self.document.discard(overlay.root) {
            self.log
                .warn(format_args!("Failed to remove overlay: {err}"));
        }
        self.log
            .info(format_args!("Report overlay {} closed", overlay.instance));
    }

    fn replace_content<F>(&self, ticket: OverlayTicket, build: F) -> Result<bool, DomError>
    where
        F: FnOnce(&Document) -> Result<NodeId, DomError>,
    {
        let open = self.open.lock();
        let Some(current) = open.as_ref().filter(|open| open.instance == ticket.0) else {
            self.log.info(format_args!(
                "Dropping result for closed overlay {}",
                ticket.0
            ));
            return Ok(false);
        };

        let node = build(&self.document)?;
        let old = self.document.children(current.content);
        self.document.replace_children(current.content, &[node])?;
        for child in old {
            self.document.discard(child)?;
        }
        Ok(true)
    }

    fn build(&self, instance: u64) -> Result<OpenOverlay, DomError> {
        let document = &self.document;

        let root = document.create_element("div");
        document.set_attribute(root, "class", OVERLAY_CLASS)?;

        let panel = document.append_element(root, "div", &[("class", PANEL_CLASS)])?;
        let header = document.append_element(panel, "div", &[("class", HEADER_CLASS)])?;
        let title = document.append_element(header, "h3", &[])?;
        document.set_text_content(title, TITLE)?;
        let close = document.append_element(header, "button", &[("class", CLOSE_CLASS)])?;
        document.set_text_content(close, CLOSE_LABEL)?;

        let content = document.append_element(panel, "div", &[("class", CONTENT_CLASS)])?;
        let loading = document.append_element(content, "div", &[])?;
        centered(document, loading, "#666")?;
        document.set_text_content(loading, LOADING_MESSAGE)?;

        let this = self.this.clone();
        let on_close: Listener = Arc::new(move |_: &mut DomEvent| {
            if let Some(overlay) = this.upgrade() {
                overlay.close_instance(instance);
            }
        });
        document.add_event_listener(close, EventKind::Click, on_close)?;

        let this = self.this.clone();
        let on_backdrop: Listener = Arc::new(move |event: &mut DomEvent| {
            if event.target() != root {
                return;
            }
            if let Some(overlay) = this.upgrade() {
                overlay.close_instance(instance);
            }
        });
        document.add_event_listener(root, EventKind::Click, on_backdrop)?;

        let this = self.this.clone();
        let on_key: Listener = Arc::new(move |event: &mut DomEvent| {
            if event.key() != Some(ESCAPE_KEY) {
                return;
            }
            if let Some(overlay) = this.upgrade() {
                overlay.close_instance(instance);
            }
        });
        let key_listener = document.add_document_listener(EventKind::KeyDown, on_key);

        if let Err(err) = document.append_child(document.body(), root) {
            document.remove_document_listener(key_listener);
            let _ = document.discard(root);
            return Err(err);
        }

        Ok(OpenOverlay {
            instance,
            root,
            content,
            key_listener,
        })
    }
}

impl Drop for ReportOverlay {
    fn drop(&mut self) {
        if let Some(open) = self.open.get_mut().take() {
            self.teardown(open);
        }
    }
}

fn centered(document: &Document, node: NodeId, color: &str) -> Result<(), DomError> {
    document.set_style(node, "padding", "20px")?;
    document.set_style(node, "text-align", "center")?;
    document.set_style(node, "color", color)
}

/// Detached content root for a view.
fn build_view(document: &Document, view: &ReportView) -> Result<NodeId, DomError> {
    let ReportView::Table {
        user_header,
        rows,
        total,
    } = view
    else {
        let node = document.create_element("div");
        document.set_style(node, "padding", "20px")?;
        document.set_style(node, "text-align", "center")?;
        document.set_text_content(node, EMPTY_MESSAGE)?;
        return Ok(node);
    };

    let table = document.create_element("table");
    document.set_attribute(table, "class", TABLE_CLASS)?;

    let head = document.append_element(table, "thead", &[])?;
    let head_row = document.append_element(head, "tr", &[])?;
    let th_user = document.append_element(head_row, "th", &[])?;
    document.set_text_content(th_user, user_header)?;
    let th_time = document.append_element(head_row, "th", &[])?;
    document.set_text_content(th_time, TIME_HEADER)?;

    let body = document.append_element(table, "tbody", &[])?;
    for row in rows {
        let tr = document.append_element(body, "tr", &[])?;
        let td_user = document.append_element(tr, "td", &[])?;
        document.set_text_content(td_user, &row.user)?;
        let td_time = document.append_element(tr, "td", &[])?;
        document.set_text_content(td_time, &row.time)?;
    }

    let total_row = document.append_element(body, "tr", &[("class", TOTAL_ROW_CLASS)])?;
    let td_label = document.append_element(total_row, "td", &[])?;
    document.set_text_content(td_label, TOTAL_LABEL)?;
    let td_total = document.append_element(total_row, "td", &[])?;
    document.set_text_content(td_total, total)?;

    Ok(table)
}
