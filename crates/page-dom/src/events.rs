//! Event and mutation types

use std::fmt;
use std::sync::Arc;

use crate::NodeId;

/// Event kinds the page model dispatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Click,
    KeyDown,
}

impl EventKind {
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::Click => "click",
            EventKind::KeyDown => "keydown",
        }
    }
}

/// Event handed to listeners during dispatch.
#[derive(Debug, Clone)]
pub struct DomEvent {
    kind: EventKind,
    target: NodeId,
    current_target: Option<NodeId>,
    key: Option<String>,
    default_prevented: bool,
    propagation_stopped: bool,
}

impl DomEvent {
    pub(crate) fn new(kind: EventKind, target: NodeId, key: Option<String>) -> Self {
        Self {
            kind,
            target,
            current_target: None,
            key,
            default_prevented: false,
            propagation_stopped: false,
        }
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Node the event was dispatched on.
    pub fn target(&self) -> NodeId {
        self.target
    }

    /// Node whose listener is running; `None` while document listeners run.
    pub fn current_target(&self) -> Option<NodeId> {
        self.current_target
    }

    pub(crate) fn set_current_target(&mut self, node: Option<NodeId>) {
        self.current_target = node;
    }

    /// Key name for keyboard events (`"Escape"`, `"Enter"`, ...).
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}

/// Listener callback. Runs with the document unlocked, so it may mutate the page.
pub type Listener = Arc<dyn Fn(&mut DomEvent) + Send + Sync>;

/// Handle returned when registering a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

/// One child-list change on a connected node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    pub target: NodeId,
    pub added: Vec<NodeId>,
    pub removed: Vec<NodeId>,
}
