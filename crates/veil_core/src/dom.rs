//! Headless document model
//!
//! An arena-backed element tree standing in for the host's DOM. Widgets
//! create and attach elements here, the focus trap walks it to find
//! tabbable nodes, and hosts feed input through [`Document::dispatch`].
//!
//! `Document` is a cheap, clonable handle to shared state. No borrow of the
//! shared state is held while a listener runs, so listeners are free to
//! focus nodes, add or remove listeners, or dispatch nested events.
//!
//! # Example
//!
//! ```rust
//! use veil_core::dom::Document;
//!
//! let doc = Document::new();
//! let form = doc.create_element("form");
//! let input = doc.create_element("input");
//! doc.append_child(doc.body(), form);
//! doc.append_child(form, input);
//!
//! doc.focus(input);
//! assert_eq!(doc.active_element(), Some(input));
//! assert!(doc.contains(form, input));
//! ```

use indexmap::IndexMap;
use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use thiserror::Error;

use crate::events::{DomEvent, EventKind, Key, Modifiers};

new_key_type! {
    /// Handle to an element in a [`Document`]
    pub struct NodeId;
    /// Handle to a registered event listener
    pub struct ListenerId;
}

/// Document errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomError {
    /// Selector uses syntax the headless document does not support
    #[error("Unsupported selector: {0}")]
    UnsupportedSelector(String),
}

/// Listener callback type
pub type ListenerFn = Rc<dyn Fn(&mut DomEvent)>;

/// Where a listener is attached
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListenerTarget {
    /// The document itself (also stands in for `window`)
    Document,
    /// A specific element
    Node(NodeId),
}

/// Dispatch phase a listener participates in
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Capture,
    Bubble,
}

struct Listener {
    target: ListenerTarget,
    kind: EventKind,
    phase: Phase,
    callback: ListenerFn,
}

#[derive(Debug, Default)]
struct Element {
    tag: String,
    attributes: IndexMap<String, String>,
    style: IndexMap<String, String>,
    text: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// Text selection state for inputs (set when focused through `select`)
    selected: bool,
}

struct DocumentInner {
    nodes: SlotMap<NodeId, Element>,
    document_element: NodeId,
    body: NodeId,
    active: Option<NodeId>,
    listeners: SlotMap<ListenerId, Listener>,
    /// Registration order (slotmap iteration order is not insertion order)
    listener_order: Vec<ListenerId>,
}

/// Shared handle to a headless document
#[derive(Clone)]
pub struct Document {
    inner: Rc<RefCell<DocumentInner>>,
}

/// Weak handle to a document, for listeners that must not keep it alive
#[derive(Clone)]
pub struct WeakDocument {
    inner: Weak<RefCell<DocumentInner>>,
}

impl WeakDocument {
    pub fn upgrade(&self) -> Option<Document> {
        self.inner.upgrade().map(|inner| Document { inner })
    }
}

impl Document {
    /// Create a document with `<html>` and `<body>` elements
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let document_element = nodes.insert(Element {
            tag: "html".to_string(),
            ..Default::default()
        });
        let body = nodes.insert(Element {
            tag: "body".to_string(),
            parent: Some(document_element),
            ..Default::default()
        });
        if let Some(html) = nodes.get_mut(document_element) {
            html.children.push(body);
        }
        Self {
            inner: Rc::new(RefCell::new(DocumentInner {
                nodes,
                document_element,
                body,
                active: None,
                listeners: SlotMap::with_key(),
                listener_order: Vec::new(),
            })),
        }
    }

    pub fn downgrade(&self) -> WeakDocument {
        WeakDocument {
            inner: Rc::downgrade(&self.inner),
        }
    }

    pub fn document_element(&self) -> NodeId {
        self.inner.borrow().document_element
    }

    pub fn body(&self) -> NodeId {
        self.inner.borrow().body
    }

    // =========================================================================
    // Tree
    // =========================================================================

    /// Create a detached element
    pub fn create_element(&self, tag: &str) -> NodeId {
        self.inner.borrow_mut().nodes.insert(Element {
            tag: tag.to_ascii_lowercase(),
            ..Default::default()
        })
    }

    pub fn exists(&self, node: NodeId) -> bool {
        self.inner.borrow().nodes.contains_key(node)
    }

    /// Append `child` to `parent`, detaching it from any previous parent
    pub fn append_child(&self, parent: NodeId, child: NodeId) {
        if parent == child || self.contains(child, parent) {
            tracing::warn!("append_child: refusing to create a cycle");
            return;
        }
        self.detach(child);
        let mut inner = self.inner.borrow_mut();
        if !inner.nodes.contains_key(parent) || !inner.nodes.contains_key(child) {
            return;
        }
        if let Some(el) = inner.nodes.get_mut(child) {
            el.parent = Some(parent);
        }
        if let Some(el) = inner.nodes.get_mut(parent) {
            el.children.push(child);
        }
    }

    /// Detach a node from its parent (the subtree stays alive)
    pub fn detach(&self, node: NodeId) {
        let mut inner = self.inner.borrow_mut();
        let Some(parent) = inner.nodes.get(node).and_then(|el| el.parent) else {
            return;
        };
        if let Some(el) = inner.nodes.get_mut(parent) {
            el.children.retain(|c| *c != node);
        }
        if let Some(el) = inner.nodes.get_mut(node) {
            el.parent = None;
        }
        if let Some(active) = inner.active {
            if is_inclusive_ancestor(&inner.nodes, node, active) {
                inner.active = None;
            }
        }
    }

    /// Detach and free a subtree, dropping listeners attached to it
    pub fn remove(&self, node: NodeId) {
        self.detach(node);
        let mut inner = self.inner.borrow_mut();
        let mut stack = vec![node];
        let mut removed: SmallVec<[NodeId; 16]> = SmallVec::new();
        while let Some(id) = stack.pop() {
            if let Some(el) = inner.nodes.remove(id) {
                stack.extend(el.children);
                removed.push(id);
            }
        }
        let dead: Vec<ListenerId> = inner
            .listeners
            .iter()
            .filter(|(_, l)| matches!(l.target, ListenerTarget::Node(n) if removed.contains(&n)))
            .map(|(id, _)| id)
            .collect();
        for id in dead {
            inner.listeners.remove(id);
        }
        let DocumentInner {
            listeners,
            listener_order,
            ..
        } = &mut *inner;
        listener_order.retain(|id| listeners.contains_key(*id));
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.inner.borrow().nodes.get(node).and_then(|el| el.parent)
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.inner
            .borrow()
            .nodes
            .get(node)
            .map(|el| el.children.clone())
            .unwrap_or_default()
    }

    /// Descendants of `root` in document (pre-)order, excluding `root`
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let inner = self.inner.borrow();
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = inner
            .nodes
            .get(root)
            .map(|el| el.children.iter().rev().copied().collect())
            .unwrap_or_default();
        while let Some(id) = stack.pop() {
            out.push(id);
            if let Some(el) = inner.nodes.get(id) {
                stack.extend(el.children.iter().rev().copied());
            }
        }
        out
    }

    /// DOM `contains`: true when `node` is `ancestor` or one of its descendants
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        is_inclusive_ancestor(&self.inner.borrow().nodes, ancestor, node)
    }

    /// Whether the node is attached under the document element
    pub fn is_connected(&self, node: NodeId) -> bool {
        let root = self.document_element();
        self.contains(root, node)
    }

    // =========================================================================
    // Attributes, style and text
    // =========================================================================

    pub fn tag(&self, node: NodeId) -> Option<String> {
        self.inner.borrow().nodes.get(node).map(|el| el.tag.clone())
    }

    pub fn set_attribute(&self, node: NodeId, name: &str, value: impl Into<String>) {
        if let Some(el) = self.inner.borrow_mut().nodes.get_mut(node) {
            el.attributes.insert(name.to_string(), value.into());
        }
    }

    pub fn remove_attribute(&self, node: NodeId, name: &str) {
        if let Some(el) = self.inner.borrow_mut().nodes.get_mut(node) {
            el.attributes.shift_remove(name);
        }
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.inner
            .borrow()
            .nodes
            .get(node)
            .and_then(|el| el.attributes.get(name).cloned())
    }

    pub fn has_attribute(&self, node: NodeId, name: &str) -> bool {
        self.inner
            .borrow()
            .nodes
            .get(node)
            .map_or(false, |el| el.attributes.contains_key(name))
    }

    /// Set an inline style property (`display`, `visibility`, `opacity`, ...)
    pub fn set_style(&self, node: NodeId, property: &str, value: impl Into<String>) {
        if let Some(el) = self.inner.borrow_mut().nodes.get_mut(node) {
            el.style.insert(property.to_string(), value.into());
        }
    }

    pub fn style(&self, node: NodeId, property: &str) -> Option<String> {
        self.inner
            .borrow()
            .nodes
            .get(node)
            .and_then(|el| el.style.get(property).cloned())
    }

    /// Computed `visibility`: inherited from the nearest ancestor that sets it
    pub fn computed_visibility(&self, node: NodeId) -> String {
        let inner = self.inner.borrow();
        let mut current = Some(node);
        while let Some(id) = current {
            let Some(el) = inner.nodes.get(id) else { break };
            if let Some(v) = el.style.get("visibility") {
                if v != "inherit" {
                    return v.clone();
                }
            }
            current = el.parent;
        }
        "visible".to_string()
    }

    pub fn set_text(&self, node: NodeId, text: impl Into<String>) {
        if let Some(el) = self.inner.borrow_mut().nodes.get_mut(node) {
            el.text = text.into();
        }
    }

    pub fn text(&self, node: NodeId) -> String {
        self.inner
            .borrow()
            .nodes
            .get(node)
            .map(|el| el.text.clone())
            .unwrap_or_default()
    }

    /// Effective tab index: the parsed `tabindex` attribute, else the
    /// element's default (0 for natively focusable elements, -1 otherwise)
    pub fn tab_index(&self, node: NodeId) -> i32 {
        let inner = self.inner.borrow();
        let Some(el) = inner.nodes.get(node) else {
            return -1;
        };
        if let Some(parsed) = el
            .attributes
            .get("tabindex")
            .and_then(|v| v.trim().parse::<i32>().ok())
        {
            return parsed;
        }
        match el.tag.as_str() {
            "input" | "select" | "textarea" | "button" => 0,
            "a" if el.attributes.contains_key("href") => 0,
            _ => -1,
        }
    }

    pub fn is_disabled(&self, node: NodeId) -> bool {
        self.has_attribute(node, "disabled")
    }

    // =========================================================================
    // Selectors
    // =========================================================================

    /// Whether the node matches a compound selector (`tag#id.class[attr]`)
    pub fn matches(&self, node: NodeId, selector: &str) -> Result<bool, DomError> {
        let parsed = Selector::parse(selector)?;
        Ok(parsed.matches(&self.inner.borrow(), node))
    }

    /// First element in document order matching a compound selector
    pub fn query_selector(&self, selector: &str) -> Result<Option<NodeId>, DomError> {
        let parsed = Selector::parse(selector)?;
        let root = self.document_element();
        let candidates = std::iter::once(root).chain(self.descendants(root));
        let inner = self.inner.borrow();
        Ok(candidates.into_iter().find(|id| parsed.matches(&inner, *id)))
    }

    // =========================================================================
    // Focus
    // =========================================================================

    pub fn active_element(&self) -> Option<NodeId> {
        self.inner.borrow().active
    }

    /// Move focus to `node` and dispatch a focus event targeting it
    ///
    /// Focus listeners may reject the move (for instance by blurring the
    /// target), so read [`Document::active_element`] afterwards rather than
    /// assuming the call succeeded.
    pub fn focus(&self, node: NodeId) {
        {
            let mut inner = self.inner.borrow_mut();
            if !inner.nodes.contains_key(node) {
                return;
            }
            if inner.active == Some(node) {
                return;
            }
            if let Some(prev) = inner.active {
                if let Some(el) = inner.nodes.get_mut(prev) {
                    el.selected = false;
                }
            }
            inner.active = Some(node);
        }
        tracing::trace!("focus -> {:?}", node);
        self.dispatch(DomEvent::focus(node));
    }

    /// Remove focus from `node` if it holds it
    pub fn blur(&self, node: NodeId) {
        let mut inner = self.inner.borrow_mut();
        if inner.active == Some(node) {
            inner.active = None;
            if let Some(el) = inner.nodes.get_mut(node) {
                el.selected = false;
            }
        }
    }

    /// Select the text of an input (no-op for other elements)
    pub fn select(&self, node: NodeId) {
        if let Some(el) = self.inner.borrow_mut().nodes.get_mut(node) {
            if el.tag == "input" {
                el.selected = true;
            }
        }
    }

    pub fn is_selected(&self, node: NodeId) -> bool {
        self.inner
            .borrow()
            .nodes
            .get(node)
            .map_or(false, |el| el.selected)
    }

    // =========================================================================
    // Listeners and dispatch
    // =========================================================================

    /// Register a listener
    pub fn add_listener<F>(
        &self,
        target: ListenerTarget,
        kind: EventKind,
        phase: Phase,
        callback: F,
    ) -> ListenerId
    where
        F: Fn(&mut DomEvent) + 'static,
    {
        let mut inner = self.inner.borrow_mut();
        let id = inner.listeners.insert(Listener {
            target,
            kind,
            phase,
            callback: Rc::new(callback),
        });
        inner.listener_order.push(id);
        id
    }

    /// Remove a listener; removing during dispatch prevents pending calls
    pub fn remove_listener(&self, id: ListenerId) {
        let mut inner = self.inner.borrow_mut();
        if inner.listeners.remove(id).is_some() {
            inner.listener_order.retain(|l| *l != id);
        }
    }

    pub fn has_listener(&self, id: ListenerId) -> bool {
        self.inner.borrow().listeners.contains_key(id)
    }

    /// Number of listeners attached to the document itself
    pub fn document_listener_count(&self) -> usize {
        self.inner
            .borrow()
            .listeners
            .values()
            .filter(|l| l.target == ListenerTarget::Document)
            .count()
    }

    /// Dispatch an event and return it (with its prevented/stopped flags)
    ///
    /// Order: document capture listeners, then listeners on the target and
    /// its ancestors (innermost first), then document bubble listeners.
    pub fn dispatch(&self, mut event: DomEvent) -> DomEvent {
        let path = self.ancestor_path(event.target);
        self.run_listeners(ListenerTarget::Document, Some(Phase::Capture), &mut event);
        if event.propagation_stopped() {
            return event;
        }
        for node in path {
            self.run_listeners(ListenerTarget::Node(node), None, &mut event);
            if event.propagation_stopped() {
                return event;
            }
        }
        self.run_listeners(ListenerTarget::Document, Some(Phase::Bubble), &mut event);
        event
    }

    /// Dispatch keydown then keyup at the focused element (or the body)
    pub fn press_key(&self, key: Key, modifiers: Modifiers) -> DomEvent {
        let target = self.active_element().unwrap_or_else(|| self.body());
        let down = self.dispatch(DomEvent::key_down(target, key.clone(), modifiers));
        let target = self.active_element().unwrap_or_else(|| self.body());
        self.dispatch(DomEvent::key_up(target, key, modifiers));
        down
    }

    /// Dispatch the pointer sequence of a click: mousedown, then click
    pub fn click(&self, node: NodeId) -> DomEvent {
        self.dispatch(DomEvent::mouse_down(node));
        self.dispatch(DomEvent::click(node))
    }

    fn ancestor_path(&self, node: NodeId) -> Vec<NodeId> {
        let inner = self.inner.borrow();
        let mut path = Vec::new();
        let mut current = Some(node);
        while let Some(id) = current {
            let Some(el) = inner.nodes.get(id) else { break };
            path.push(id);
            current = el.parent;
        }
        path
    }

    fn run_listeners(&self, target: ListenerTarget, phase: Option<Phase>, event: &mut DomEvent) {
        let ids: SmallVec<[ListenerId; 8]> = {
            let inner = self.inner.borrow();
            inner
                .listener_order
                .iter()
                .copied()
                .filter(|id| {
                    inner.listeners.get(*id).map_or(false, |l| {
                        l.target == target
                            && l.kind == event.kind
                            && phase.map_or(true, |p| p == l.phase)
                    })
                })
                .collect()
        };
        for id in ids {
            // Re-check: an earlier listener may have removed this one
            let callback = self.inner.borrow().listeners.get(id).map(|l| l.callback.clone());
            if let Some(callback) = callback {
                callback(event);
            }
            if event.immediate_propagation_stopped() {
                return;
            }
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

fn is_inclusive_ancestor(nodes: &SlotMap<NodeId, Element>, ancestor: NodeId, node: NodeId) -> bool {
    let mut current = Some(node);
    while let Some(id) = current {
        if id == ancestor {
            return true;
        }
        current = nodes.get(id).and_then(|el| el.parent);
    }
    false
}

/// Compound selector: optional tag, `#id`, `.class`es and `[attr]`s
#[derive(Debug, Default)]
struct Selector {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attributes: Vec<String>,
}

impl Selector {
    fn parse(input: &str) -> Result<Self, DomError> {
        let input = input.trim();
        let unsupported = || DomError::UnsupportedSelector(input.to_string());
        if input.is_empty()
            || input
                .chars()
                .any(|c| c.is_whitespace() || matches!(c, '>' | '+' | '~' | ',' | ':' | '*' | '='))
        {
            return Err(unsupported());
        }

        let mut selector = Selector::default();
        let mut rest = input;
        let tag_end = rest.find(['#', '.', '[']).unwrap_or(rest.len());
        if tag_end > 0 {
            selector.tag = Some(rest[..tag_end].to_ascii_lowercase());
        }
        rest = &rest[tag_end..];

        while let Some(first) = rest.chars().next() {
            match first {
                '#' | '.' => {
                    let body = &rest[1..];
                    let end = body.find(['#', '.', '[']).unwrap_or(body.len());
                    if end == 0 {
                        return Err(unsupported());
                    }
                    let name = body[..end].to_string();
                    if first == '#' {
                        selector.id = Some(name);
                    } else {
                        selector.classes.push(name);
                    }
                    rest = &body[end..];
                }
                '[' => {
                    let close = rest.find(']').ok_or_else(unsupported)?;
                    let name = rest[1..close].trim();
                    if name.is_empty() {
                        return Err(unsupported());
                    }
                    selector.attributes.push(name.to_string());
                    rest = &rest[close + 1..];
                }
                _ => return Err(unsupported()),
            }
        }
        Ok(selector)
    }

    fn matches(&self, inner: &DocumentInner, node: NodeId) -> bool {
        let Some(el) = inner.nodes.get(node) else {
            return false;
        };
        if let Some(tag) = &self.tag {
            if &el.tag != tag {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if el.attributes.get("id") != Some(id) {
                return false;
            }
        }
        if !self.classes.is_empty() {
            let class_attr = el.attributes.get("class").map(String::as_str).unwrap_or("");
            if !self
                .classes
                .iter()
                .all(|c| class_attr.split_whitespace().any(|have| have == c))
            {
                return false;
            }
        }
        self.attributes
            .iter()
            .all(|a| el.attributes.contains_key(a.as_str()))
    }
}
