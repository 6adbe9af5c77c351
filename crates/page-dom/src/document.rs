//! Arena-backed document tree

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::trace;

use crate::errors::DomError;
use crate::events::{DomEvent, EventKind, Listener, ListenerId, MutationRecord};
use crate::selector::{Selector, SelectorTarget};

const MUTATION_CAPACITY: usize = 256;

/// Stable reference to a node. Stays valid after the node is detached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node-{}", self.0)
    }
}

#[derive(Debug, Clone)]
enum NodeKind {
    Element {
        tag: String,
        attributes: BTreeMap<String, String>,
        style: BTreeMap<String, String>,
    },
    Text(String),
}

struct Registered {
    id: ListenerId,
    kind: EventKind,
    listener: Listener,
}

struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    listeners: Vec<Registered>,
}

impl NodeData {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            listeners: Vec::new(),
        }
    }
}

struct Tree {
    nodes: HashMap<NodeId, NodeData>,
    root: NodeId,
    body: NodeId,
    document_listeners: Vec<Registered>,
    next_node: u64,
    next_listener: u64,
}

impl Tree {
    fn new() -> Self {
        let mut tree = Self {
            nodes: HashMap::new(),
            root: NodeId(0),
            body: NodeId(0),
            document_listeners: Vec::new(),
            next_node: 0,
            next_listener: 0,
        };
        let root = tree.insert(element_kind("html"));
        let body = tree.insert(element_kind("body"));
        tree.root = root;
        tree.body = body;
        if let Some(data) = tree.nodes.get_mut(&root) {
            data.children.push(body);
        }
        if let Some(data) = tree.nodes.get_mut(&body) {
            data.parent = Some(root);
        }
        tree
    }

    fn insert(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.next_node);
        self.next_node += 1;
        self.nodes.insert(id, NodeData::new(kind));
        id
    }

    fn next_listener_id(&mut self) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        id
    }

    fn node(&self, id: NodeId) -> Result<&NodeData, DomError> {
        self.nodes.get(&id).ok_or(DomError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut NodeData, DomError> {
        self.nodes.get_mut(&id).ok_or(DomError::UnknownNode(id))
    }

    fn is_connected(&self, mut id: NodeId) -> bool {
        loop {
            if id == self.root {
                return true;
            }
            match self.nodes.get(&id).and_then(|n| n.parent) {
                Some(parent) => id = parent,
                None => return false,
            }
        }
    }

    fn is_inclusive_ancestor(&self, ancestor: NodeId, mut node: NodeId) -> bool {
        loop {
            if node == ancestor {
                return true;
            }
            match self.nodes.get(&node).and_then(|n| n.parent) {
                Some(parent) => node = parent,
                None => return false,
            }
        }
    }

    /// Detach `child` from its parent; returns the former parent.
    fn detach(&mut self, child: NodeId) -> Result<Option<NodeId>, DomError> {
        let parent = self.node(child)?.parent;
        if let Some(parent) = parent {
            self.node_mut(parent)?.children.retain(|c| *c != child);
            self.node_mut(child)?.parent = None;
        }
        Ok(parent)
    }

    /// Pre-order descendants of `root`, excluding `root`.
    fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = match self.nodes.get(&root) {
            Some(data) => data.children.iter().rev().copied().collect(),
            None => return out,
        };
        while let Some(id) = stack.pop() {
            out.push(id);
            if let Some(data) = self.nodes.get(&id) {
                stack.extend(data.children.iter().rev().copied());
            }
        }
        out
    }

    fn text_content(&self, id: NodeId) -> String {
        let mut text = String::new();
        if let Some(NodeKind::Text(own)) = self.nodes.get(&id).map(|n| &n.kind) {
            text.push_str(own);
            return text;
        }
        for node in self.descendants(id) {
            if let Some(NodeKind::Text(value)) = self.nodes.get(&node).map(|n| &n.kind) {
                text.push_str(value);
            }
        }
        text
    }

    fn listeners_for(&self, id: NodeId, kind: EventKind) -> Vec<Listener> {
        self.nodes
            .get(&id)
            .map(|data| collect_listeners(&data.listeners, kind))
            .unwrap_or_default()
    }
}

impl SelectorTarget for Tree {
    fn tag(&self, node: NodeId) -> Option<&str> {
        match &self.nodes.get(&node)?.kind {
            NodeKind::Element { tag, .. } => Some(tag.as_str()),
            NodeKind::Text(_) => None,
        }
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        match &self.nodes.get(&node)?.kind {
            NodeKind::Element { attributes, .. } => attributes.get(name).map(String::as_str),
            NodeKind::Text(_) => None,
        }
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(&node)?.parent
    }
}

fn element_kind(tag: &str) -> NodeKind {
    NodeKind::Element {
        tag: tag.to_ascii_lowercase(),
        attributes: BTreeMap::new(),
        style: BTreeMap::new(),
    }
}

fn collect_listeners(registered: &[Registered], kind: EventKind) -> Vec<Listener> {
    registered
        .iter()
        .filter(|r| r.kind == kind)
        .map(|r| r.listener.clone())
        .collect()
}

struct Inner {
    tree: RwLock<Tree>,
    mutations: broadcast::Sender<MutationRecord>,
}

/// Shared handle to a page document. Clones refer to the same tree.
#[derive(Clone)]
pub struct Document {
    inner: Arc<Inner>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tree = self.inner.tree.read();
        f.debug_struct("Document")
            .field("nodes", &tree.nodes.len())
            .field("body", &tree.body)
            .finish()
    }
}

impl Document {
    /// Empty `<html><body></body></html>` document.
    pub fn new() -> Self {
        let (mutations, _) = broadcast::channel(MUTATION_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                tree: RwLock::new(Tree::new()),
                mutations,
            }),
        }
    }

    pub fn root(&self) -> NodeId {
        self.inner.tree.read().root
    }

    pub fn body(&self) -> NodeId {
        self.inner.tree.read().body
    }

    /// Subscribe to child-list changes anywhere in the connected tree.
    pub fn subscribe(&self) -> broadcast::Receiver<MutationRecord> {
        self.inner.mutations.subscribe()
    }

    fn publish(&self, record: MutationRecord) {
        trace!(target = %record.target, added = record.added.len(), removed = record.removed.len(), "child list mutation");
        // No subscribers is fine.
        let _ = self.inner.mutations.send(record);
    }

    // ---- construction -------------------------------------------------

    /// New detached element.
    pub fn create_element(&self, tag: &str) -> NodeId {
        self.inner.tree.write().insert(element_kind(tag))
    }

    /// New detached text node.
    pub fn create_text(&self, text: &str) -> NodeId {
        self.inner
            .tree
            .write()
            .insert(NodeKind::Text(text.to_string()))
    }

    /// Create an element with attributes and append it to `parent`.
    pub fn append_element(
        &self,
        parent: NodeId,
        tag: &str,
        attributes: &[(&str, &str)],
    ) -> Result<NodeId, DomError> {
        let node = self.create_element(tag);
        for (name, value) in attributes {
            self.set_attribute(node, name, value)?;
        }
        self.append_child(parent, node)?;
        Ok(node)
    }

    /// Create a text node and append it to `parent`.
    pub fn append_text(&self, parent: NodeId, text: &str) -> Result<NodeId, DomError> {
        let node = self.create_text(text);
        self.append_child(parent, node)?;
        Ok(node)
    }

    // ---- tree mutation ------------------------------------------------

    /// Append `child` as last child of `parent`, moving it if already attached.
    pub fn append_child(&self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        let mut records = Vec::new();
        {
            let mut tree = self.inner.tree.write();
            if matches!(tree.node(parent)?.kind, NodeKind::Text(_)) {
                return Err(DomError::NotAnElement(parent));
            }
            tree.node(child)?;
            if child == tree.root || tree.is_inclusive_ancestor(child, parent) {
                return Err(DomError::HierarchyRequest { parent, child });
            }
            if let Some(old_parent) = tree.detach(child)? {
                if tree.is_connected(old_parent) {
                    records.push(MutationRecord {
                        target: old_parent,
                        added: Vec::new(),
                        removed: vec![child],
                    });
                }
            }
            tree.node_mut(parent)?.children.push(child);
            tree.node_mut(child)?.parent = Some(parent);
            if tree.is_connected(parent) {
                records.push(MutationRecord {
                    target: parent,
                    added: vec![child],
                    removed: Vec::new(),
                });
            }
        }
        for record in records {
            self.publish(record);
        }
        Ok(())
    }

    /// Detach `node` from its parent. The node stays valid and can be re-inserted.
    pub fn remove(&self, node: NodeId) -> Result<(), DomError> {
        let record = {
            let mut tree = self.inner.tree.write();
            let connected = tree.is_connected(node);
            match tree.detach(node)? {
                Some(parent) if connected => Some(MutationRecord {
                    target: parent,
                    added: Vec::new(),
                    removed: vec![node],
                }),
                _ => None,
            }
        };
        if let Some(record) = record {
            self.publish(record);
        }
        Ok(())
    }

    /// Detach `node` and drop it and its subtree (including listeners) from the arena.
    pub fn discard(&self, node: NodeId) -> Result<(), DomError> {
        self.remove(node)?;
        let mut tree = self.inner.tree.write();
        let mut doomed = tree.descendants(node);
        doomed.push(node);
        for id in doomed {
            tree.nodes.remove(&id);
        }
        Ok(())
    }

    /// Replace all children of `parent` with `children`, as one mutation.
    ///
    /// Replaced children stay in the arena detached, so callers may re-insert
    /// them; [`discard`](Self::discard) frees them.
    pub fn replace_children(&self, parent: NodeId, children: &[NodeId]) -> Result<(), DomError> {
        let record = {
            let mut tree = self.inner.tree.write();
            if matches!(tree.node(parent)?.kind, NodeKind::Text(_)) {
                return Err(DomError::NotAnElement(parent));
            }
            for child in children {
                tree.node(*child)?;
                if *child == tree.root || tree.is_inclusive_ancestor(*child, parent) {
                    return Err(DomError::HierarchyRequest {
                        parent,
                        child: *child,
                    });
                }
            }
            let removed = std::mem::take(&mut tree.node_mut(parent)?.children);
            for old in &removed {
                tree.node_mut(*old)?.parent = None;
            }
            for child in children {
                tree.detach(*child)?;
                tree.node_mut(*child)?.parent = Some(parent);
            }
            tree.node_mut(parent)?.children = children.to_vec();
            tree.is_connected(parent).then(|| MutationRecord {
                target: parent,
                added: children.to_vec(),
                removed,
            })
        };
        if let Some(record) = record {
            self.publish(record);
        }
        Ok(())
    }

    /// Replace the content of `node` with a single text node.
    ///
    /// The previous children are dropped from the arena.
    pub fn set_text_content(&self, node: NodeId, text: &str) -> Result<(), DomError> {
        let old = self.children(node);
        let text_node = self.create_text(text);
        if let Err(err) = self.replace_children(node, &[text_node]) {
            self.inner.tree.write().nodes.remove(&text_node);
            return Err(err);
        }
        for child in old {
            // Another handle may have re-inserted it meanwhile.
            if self.parent(child).is_none() {
                self.discard(child)?;
            }
        }
        Ok(())
    }

    // ---- node data ----------------------------------------------------

    /// Lower-case tag name, `None` for text nodes and unknown ids.
    pub fn tag_name(&self, node: NodeId) -> Option<String> {
        self.inner.tree.read().tag(node).map(str::to_string)
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.inner
            .tree
            .read()
            .attribute(node, name)
            .map(str::to_string)
    }

    pub fn set_attribute(&self, node: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        let mut tree = self.inner.tree.write();
        match &mut tree.node_mut(node)?.kind {
            NodeKind::Element { attributes, .. } => {
                attributes.insert(name.to_ascii_lowercase(), value.to_string());
                Ok(())
            }
            NodeKind::Text(_) => Err(DomError::NotAnElement(node)),
        }
    }

    pub fn remove_attribute(&self, node: NodeId, name: &str) -> Result<(), DomError> {
        let mut tree = self.inner.tree.write();
        match &mut tree.node_mut(node)?.kind {
            NodeKind::Element { attributes, .. } => {
                attributes.remove(&name.to_ascii_lowercase());
                Ok(())
            }
            NodeKind::Text(_) => Err(DomError::NotAnElement(node)),
        }
    }

    /// Set `name` only if absent, in one critical section.
    ///
    /// Returns `true` when this call set the attribute.
    pub fn mark_once(&self, node: NodeId, name: &str, value: &str) -> Result<bool, DomError> {
        let mut tree = self.inner.tree.write();
        match &mut tree.node_mut(node)?.kind {
            NodeKind::Element { attributes, .. } => {
                let key = name.to_ascii_lowercase();
                if attributes.contains_key(&key) {
                    return Ok(false);
                }
                attributes.insert(key, value.to_string());
                Ok(true)
            }
            NodeKind::Text(_) => Err(DomError::NotAnElement(node)),
        }
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.inner
            .tree
            .read()
            .attribute(node, "class")
            .map(|value| value.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    pub fn set_style(&self, node: NodeId, property: &str, value: &str) -> Result<(), DomError> {
        let mut tree = self.inner.tree.write();
        match &mut tree.node_mut(node)?.kind {
            NodeKind::Element { style, .. } => {
                style.insert(property.to_string(), value.to_string());
                Ok(())
            }
            NodeKind::Text(_) => Err(DomError::NotAnElement(node)),
        }
    }

    pub fn style(&self, node: NodeId, property: &str) -> Option<String> {
        let tree = self.inner.tree.read();
        match &tree.nodes.get(&node)?.kind {
            NodeKind::Element { style, .. } => style.get(property).cloned(),
            NodeKind::Text(_) => None,
        }
    }

    /// Concatenated text of the node and its descendants.
    pub fn text_content(&self, node: NodeId) -> String {
        self.inner.tree.read().text_content(node)
    }

    /// Rendered text approximation: text content with surrounding whitespace trimmed.
    pub fn inner_text(&self, node: NodeId) -> String {
        self.text_content(node).trim().to_string()
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.inner.tree.read().parent(node)
    }

    /// Parent if it is an element; the root `<html>` has none.
    pub fn parent_element(&self, node: NodeId) -> Option<NodeId> {
        let tree = self.inner.tree.read();
        tree.parent(node).filter(|p| tree.tag(*p).is_some())
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.inner
            .tree
            .read()
            .nodes
            .get(&node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.inner.tree.read().nodes.contains_key(&node)
    }

    /// Nodes held by the arena, attached or not.
    pub fn node_count(&self) -> usize {
        self.inner.tree.read().nodes.len()
    }

    /// Attached to the document tree.
    pub fn is_connected(&self, node: NodeId) -> bool {
        let tree = self.inner.tree.read();
        tree.nodes.contains_key(&node) && tree.is_connected(node)
    }

    // ---- queries ------------------------------------------------------

    /// First matching element in document order.
    pub fn query_selector(&self, selector: &Selector) -> Option<NodeId> {
        let tree = self.inner.tree.read();
        let root = tree.root;
        std::iter::once(root)
            .chain(tree.descendants(root))
            .find(|id| selector.matches(&*tree, *id))
    }

    /// All matching elements in document order.
    pub fn query_selector_all(&self, selector: &Selector) -> Vec<NodeId> {
        let tree = self.inner.tree.read();
        let root = tree.root;
        std::iter::once(root)
            .chain(tree.descendants(root))
            .filter(|id| selector.matches(&*tree, *id))
            .collect()
    }

    /// Matching descendants of `scope` (not `scope` itself), in document order.
    pub fn query_selector_within(&self, scope: NodeId, selector: &Selector) -> Vec<NodeId> {
        let tree = self.inner.tree.read();
        tree.descendants(scope)
            .into_iter()
            .filter(|id| selector.matches(&*tree, *id))
            .collect()
    }

    /// First matching descendant of `scope`.
    pub fn first_within(&self, scope: NodeId, selector: &Selector) -> Option<NodeId> {
        let tree = self.inner.tree.read();
        tree.descendants(scope)
            .into_iter()
            .find(|id| selector.matches(&*tree, *id))
    }

    /// Nearest inclusive ancestor matching `selector`.
    pub fn closest(&self, node: NodeId, selector: &Selector) -> Option<NodeId> {
        let tree = self.inner.tree.read();
        let mut cursor = Some(node);
        while let Some(id) = cursor {
            if selector.matches(&*tree, id) {
                return Some(id);
            }
            cursor = tree.parent(id);
        }
        None
    }

    /// Parse and run a selector against the whole document.
    pub fn select(&self, selector: &str) -> Result<Vec<NodeId>, DomError> {
        let selector = Selector::parse(selector)?;
        Ok(self.query_selector_all(&selector))
    }

    // ---- events -------------------------------------------------------

    pub fn add_event_listener(
        &self,
        node: NodeId,
        kind: EventKind,
        listener: Listener,
    ) -> Result<ListenerId, DomError> {
        let mut tree = self.inner.tree.write();
        tree.node(node)?;
        let id = tree.next_listener_id();
        tree.node_mut(node)?.listeners.push(Registered { id, kind, listener });
        Ok(id)
    }

    /// Returns `true` if the listener was registered on `node`.
    pub fn remove_event_listener(&self, node: NodeId, id: ListenerId) -> bool {
        let mut tree = self.inner.tree.write();
        let Some(data) = tree.nodes.get_mut(&node) else {
            return false;
        };
        let before = data.listeners.len();
        data.listeners.retain(|r| r.id != id);
        data.listeners.len() != before
    }

    pub fn add_document_listener(&self, kind: EventKind, listener: Listener) -> ListenerId {
        let mut tree = self.inner.tree.write();
        let id = tree.next_listener_id();
        tree.document_listeners.push(Registered { id, kind, listener });
        id
    }

    pub fn remove_document_listener(&self, id: ListenerId) -> bool {
        let mut tree = self.inner.tree.write();
        let before = tree.document_listeners.len();
        tree.document_listeners.retain(|r| r.id != id);
        tree.document_listeners.len() != before
    }

    pub fn listener_count(&self, node: NodeId, kind: EventKind) -> usize {
        self.inner
            .tree
            .read()
            .nodes
            .get(&node)
            .map(|data| data.listeners.iter().filter(|r| r.kind == kind).count())
            .unwrap_or(0)
    }

    pub fn document_listener_count(&self, kind: EventKind) -> usize {
        self.inner
            .tree
            .read()
            .document_listeners
            .iter()
            .filter(|r| r.kind == kind)
            .count()
    }

    /// Dispatch a bubbling click on `target`.
    pub fn dispatch_click(&self, target: NodeId) -> Result<DomEvent, DomError> {
        self.dispatch(DomEvent::new(EventKind::Click, target, None))
    }

    /// Dispatch a keydown from the body, as when nothing else has focus.
    pub fn dispatch_key(&self, key: &str) -> Result<DomEvent, DomError> {
        let body = self.body();
        self.dispatch(DomEvent::new(EventKind::KeyDown, body, Some(key.to_string())))
    }

    fn dispatch(&self, mut event: DomEvent) -> Result<DomEvent, DomError> {
        let kind = event.kind();
        // Snapshot the propagation path, then run listeners unlocked.
        let (path, document_listeners) = {
            let tree = self.inner.tree.read();
            tree.node(event.target())?;
            let mut path = Vec::new();
            let mut cursor = Some(event.target());
            while let Some(id) = cursor {
                path.push((id, tree.listeners_for(id, kind)));
                cursor = tree.parent(id);
            }
            let connected = tree.is_connected(event.target());
            let document_listeners = if connected {
                collect_listeners(&tree.document_listeners, kind)
            } else {
                Vec::new()
            };
            (path, document_listeners)
        };

        for (node, listeners) in path {
            event.set_current_target(Some(node));
            for listener in listeners {
                listener(&mut event);
            }
            if event.propagation_stopped() {
                event.set_current_target(None);
                return Ok(event);
            }
        }
        event.set_current_target(None);
        for listener in document_listeners {
            listener(&mut event);
        }
        Ok(event)
    }
}
