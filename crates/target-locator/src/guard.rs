//! At-most-once click handler injection per target element

use std::sync::Arc;

use omnitime_core_types::DebugLog;
use page_dom::{EventKind, Listener, NodeId, Page};
use site_adapter::SiteAdapter;

use crate::errors::LocatorError;

/// Attribute set on a target once its trigger has a handler.
pub const INJECTED_MARKER: &str = "data-omni-time-injected";

/// Result of offering a target to the guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectOutcome {
    /// Marker set and handler attached to `trigger`
    Injected { trigger: NodeId },

    /// Target already carried the marker; nothing done
    AlreadyInjected,
}

impl InjectOutcome {
    pub fn is_injected(&self) -> bool {
        matches!(self, InjectOutcome::Injected { .. })
    }
}

/// Attaches the click handler to each physical target exactly once.
///
/// The marker is checked and set in one critical section on the document,
/// so any number of concurrent rediscoveries converge on a single handler.
pub struct InjectionGuard {
    adapter: Arc<dyn SiteAdapter>,
    handler: Listener,
    log: DebugLog,
}

impl InjectionGuard {
    pub fn new(adapter: Arc<dyn SiteAdapter>, handler: Listener, log: DebugLog) -> Self {
        Self {
            adapter,
            handler,
            log,
        }
    }

    pub fn is_injected(page: &Page, target: NodeId) -> bool {
        page.document().attribute(target, INJECTED_MARKER).is_some()
    }

    pub fn inject(&self, page: &Page, target: NodeId) -> Result<InjectOutcome, LocatorError> {
        let document = page.document();
        if !document.mark_once(target, INJECTED_MARKER, "true")? {
            return Ok(InjectOutcome::AlreadyInjected);
        }

        self.log.info(format_args!("Found target {target}"));
        self.log.info("Injecting click listener into target");

        let attached = self.adapter.style_target(page, target).and_then(|trigger| {
            document.add_event_listener(trigger, EventKind::Click, self.handler.clone())?;
            Ok(trigger)
        });

        match attached {
            Ok(trigger) => Ok(InjectOutcome::Injected { trigger }),
            Err(err) => {
                // Unmark so a later rediscovery can retry.
                let _ = document.remove_attribute(target, INJECTED_MARKER);
                Err(err.into())
            }
        }
    }
}
