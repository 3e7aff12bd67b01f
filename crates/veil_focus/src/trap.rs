//! Focus traps
//!
//! A [`FocusTrap`] keeps keyboard and pointer focus inside a root element
//! while it is active. Traps are created through a [`FocusCoordinator`],
//! which owns the document, the post-dispatch queue and the single
//! "listening" slot: activating (or unpausing) a trap pauses whichever trap
//! was listening before it.
//!
//! # State machine
//!
//! ```text
//! Inactive --activate--> Active --pause--> Paused
//!     ^                    |  ^              |
//!     |                    |  +---unpause----+
//!     +----deactivate------+-----------------+
//! ```
//!
//! # Example
//!
//! ```rust
//! use veil_core::{Document, DeferredQueue, Key, Modifiers};
//! use veil_focus::{FocusCoordinator, FocusTrapOptions};
//!
//! let doc = Document::new();
//! let dialog = doc.create_element("div");
//! let ok = doc.create_element("button");
//! doc.append_child(doc.body(), dialog);
//! doc.append_child(dialog, ok);
//!
//! let focus = FocusCoordinator::new(doc.clone(), DeferredQueue::new());
//! let trap = focus.create_trap(dialog, FocusTrapOptions::default()).unwrap();
//! trap.activate().unwrap();
//! assert_eq!(doc.active_element(), Some(ok));
//!
//! doc.press_key(Key::Tab, Modifiers::NONE);
//! assert_eq!(doc.active_element(), Some(ok));
//! ```

use smallvec::SmallVec;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use veil_core::{
    DeferredQueue, Document, DomEvent, EventKind, Key, ListenerId, ListenerTarget, NodeId, Phase,
};

use crate::error::{FocusTrapError, Result};
use crate::tabbable::tabbable_nodes;

// =============================================================================
// Options
// =============================================================================

/// Resolver callback for a focus target
pub type NodeResolver = Rc<dyn Fn() -> Option<NodeId>>;

/// Where a trap root or focus option points
#[derive(Clone)]
pub enum FocusTarget {
    Node(NodeId),
    /// First element matching a compound selector
    Selector(String),
    /// Looked up every time it is needed
    Resolver(NodeResolver),
}

impl FocusTarget {
    pub fn resolver<F>(resolve: F) -> Self
    where
        F: Fn() -> Option<NodeId> + 'static,
    {
        FocusTarget::Resolver(Rc::new(resolve))
    }

    /// Resolve to a node; `option` names the target in errors
    pub fn resolve(&self, document: &Document, option: &'static str) -> Result<NodeId> {
        match self {
            FocusTarget::Node(node) => Ok(*node),
            FocusTarget::Selector(selector) => {
                document
                    .query_selector(selector)?
                    .ok_or_else(|| FocusTrapError::NoMatchingNode {
                        option,
                        selector: selector.clone(),
                    })
            }
            FocusTarget::Resolver(resolve) => {
                resolve().ok_or(FocusTrapError::ResolverReturnedNothing { option })
            }
        }
    }
}

impl From<NodeId> for FocusTarget {
    fn from(node: NodeId) -> Self {
        FocusTarget::Node(node)
    }
}

impl From<&str> for FocusTarget {
    fn from(selector: &str) -> Self {
        FocusTarget::Selector(selector.to_string())
    }
}

impl From<String> for FocusTarget {
    fn from(selector: String) -> Self {
        FocusTarget::Selector(selector)
    }
}

impl fmt::Debug for FocusTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FocusTarget::Node(node) => f.debug_tuple("Node").field(node).finish(),
            FocusTarget::Selector(selector) => f.debug_tuple("Selector").field(selector).finish(),
            FocusTarget::Resolver(_) => f.write_str("Resolver(..)"),
        }
    }
}

type Callback = Rc<dyn Fn()>;

/// Focus trap configuration
#[derive(Clone)]
pub struct FocusTrapOptions {
    /// Node focused on activation (default: the focused node if it is inside
    /// the root, else the first tabbable node)
    pub initial_focus: Option<FocusTarget>,
    /// Node focused when the root has nothing tabbable
    pub fallback_focus: Option<FocusTarget>,
    /// Escape keydown deactivates the trap
    pub escape_deactivates: bool,
    /// Refocus the node that had focus before activation
    pub return_focus_on_deactivate: bool,
    /// Pointer-down outside the root deactivates instead of being blocked
    pub click_outside_deactivates: bool,
    pub on_activate: Option<Callback>,
    pub on_deactivate: Option<Callback>,
}

impl Default for FocusTrapOptions {
    fn default() -> Self {
        Self {
            initial_focus: None,
            fallback_focus: None,
            escape_deactivates: true,
            return_focus_on_deactivate: true,
            click_outside_deactivates: false,
            on_activate: None,
            on_deactivate: None,
        }
    }
}

impl FocusTrapOptions {
    pub fn initial_focus(mut self, target: impl Into<FocusTarget>) -> Self {
        self.initial_focus = Some(target.into());
        self
    }

    pub fn fallback_focus(mut self, target: impl Into<FocusTarget>) -> Self {
        self.fallback_focus = Some(target.into());
        self
    }

    pub fn escape_deactivates(mut self, enabled: bool) -> Self {
        self.escape_deactivates = enabled;
        self
    }

    pub fn return_focus_on_deactivate(mut self, enabled: bool) -> Self {
        self.return_focus_on_deactivate = enabled;
        self
    }

    pub fn click_outside_deactivates(mut self, enabled: bool) -> Self {
        self.click_outside_deactivates = enabled;
        self
    }

    pub fn on_activate<F>(mut self, callback: F) -> Self
    where
        F: Fn() + 'static,
    {
        self.on_activate = Some(Rc::new(callback));
        self
    }

    pub fn on_deactivate<F>(mut self, callback: F) -> Self
    where
        F: Fn() + 'static,
    {
        self.on_deactivate = Some(Rc::new(callback));
        self
    }
}

impl fmt::Debug for FocusTrapOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FocusTrapOptions")
            .field("initial_focus", &self.initial_focus)
            .field("fallback_focus", &self.fallback_focus)
            .field("escape_deactivates", &self.escape_deactivates)
            .field("return_focus_on_deactivate", &self.return_focus_on_deactivate)
            .field("click_outside_deactivates", &self.click_outside_deactivates)
            .finish_non_exhaustive()
    }
}

/// Per-call overrides for [`FocusTrap::deactivate_with`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeactivateOptions {
    /// Overrides `return_focus_on_deactivate` when set
    pub return_focus: Option<bool>,
    /// Call `on_deactivate`
    pub notify: bool,
}

impl Default for DeactivateOptions {
    fn default() -> Self {
        Self {
            return_focus: None,
            notify: true,
        }
    }
}

impl DeactivateOptions {
    pub fn without_return_focus() -> Self {
        Self {
            return_focus: Some(false),
            ..Self::default()
        }
    }
}

// =============================================================================
// Coordinator
// =============================================================================

struct CoordinatorInner {
    document: Document,
    tasks: DeferredQueue,
    listening: RefCell<Option<Weak<RefCell<TrapInner>>>>,
}

/// Creates traps and tracks the one currently listening
#[derive(Clone)]
pub struct FocusCoordinator {
    inner: Rc<CoordinatorInner>,
}

impl FocusCoordinator {
    pub fn new(document: Document, tasks: DeferredQueue) -> Self {
        Self {
            inner: Rc::new(CoordinatorInner {
                document,
                tasks,
                listening: RefCell::new(None),
            }),
        }
    }

    pub fn document(&self) -> &Document {
        &self.inner.document
    }

    pub fn tasks(&self) -> &DeferredQueue {
        &self.inner.tasks
    }

    /// Create an inactive trap over `root`
    pub fn create_trap(
        &self,
        root: impl Into<FocusTarget>,
        options: FocusTrapOptions,
    ) -> Result<FocusTrap> {
        let root = root.into().resolve(&self.inner.document, "root")?;
        Ok(FocusTrap {
            inner: Rc::new(RefCell::new(TrapInner {
                root,
                options,
                state: TrapState::Inactive,
                tabbables: Vec::new(),
                return_to: None,
                listeners: SmallVec::new(),
            })),
            coordinator: self.clone(),
        })
    }

    /// The trap whose listeners are installed, if any
    pub fn listening_trap(&self) -> Option<FocusTrap> {
        let inner = self.inner.listening.borrow().as_ref()?.upgrade()?;
        Some(FocusTrap {
            inner,
            coordinator: self.clone(),
        })
    }

    fn is_listening(&self, trap: &Rc<RefCell<TrapInner>>) -> bool {
        self.inner
            .listening
            .borrow()
            .as_ref()
            .map_or(false, |weak| weak.ptr_eq(&Rc::downgrade(trap)))
    }

    fn set_listening(&self, trap: Option<&Rc<RefCell<TrapInner>>>) {
        *self.inner.listening.borrow_mut() = trap.map(Rc::downgrade);
    }
}

impl fmt::Debug for FocusCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FocusCoordinator")
            .field("listening", &self.listening_trap().map(|t| t.root()))
            .finish()
    }
}

// =============================================================================
// Trap
// =============================================================================

/// Lifecycle state of a trap
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TrapState {
    #[default]
    Inactive,
    Active,
    /// Active, with listeners removed while another trap listens
    Paused,
}

impl TrapState {
    pub fn is_active(&self) -> bool {
        !matches!(self, TrapState::Inactive)
    }
}

struct TrapInner {
    root: NodeId,
    options: FocusTrapOptions,
    state: TrapState,
    tabbables: Vec<NodeId>,
    /// Focused node at activation
    return_to: Option<NodeId>,
    listeners: SmallVec<[ListenerId; 5]>,
}

/// Handle to a focus trap
#[derive(Clone)]
pub struct FocusTrap {
    inner: Rc<RefCell<TrapInner>>,
    coordinator: FocusCoordinator,
}

impl FocusTrap {
    pub fn root(&self) -> NodeId {
        self.inner.borrow().root
    }

    pub fn state(&self) -> TrapState {
        self.inner.borrow().state
    }

    pub fn is_active(&self) -> bool {
        self.state().is_active()
    }

    pub fn is_paused(&self) -> bool {
        self.state() == TrapState::Paused
    }

    /// Whether this trap's document listeners are installed
    pub fn is_listening(&self) -> bool {
        self.coordinator.is_listening(&self.inner)
    }

    /// Tabbable nodes from the last computation
    pub fn tabbable_nodes(&self) -> Vec<NodeId> {
        self.inner.borrow().tabbables.clone()
    }

    pub fn ptr_eq(&self, other: &FocusTrap) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Activate the trap and move focus inside it
    ///
    /// Does nothing when already active. A configuration error leaves the
    /// trap inactive and the previously listening trap untouched.
    pub fn activate(&self) -> Result<()> {
        let on_activate = {
            let mut inner = self.inner.borrow_mut();
            if inner.state != TrapState::Inactive {
                return Ok(());
            }
            inner.state = TrapState::Active;
            inner.return_to = self.coordinator.document().active_element();
            inner.options.on_activate.clone()
        };

        if let Err(err) = self.add_listeners() {
            let mut inner = self.inner.borrow_mut();
            inner.state = TrapState::Inactive;
            inner.return_to = None;
            return Err(err);
        }
        tracing::debug!("focus trap on {:?} activated", self.root());

        if let Some(callback) = on_activate {
            callback();
        }
        Ok(())
    }

    /// Deactivate with the configured options
    pub fn deactivate(&self) {
        self.deactivate_with(DeactivateOptions::default());
    }

    /// Remove listeners and (unless disabled) return focus after the current
    /// event has finished dispatching
    pub fn deactivate_with(&self, options: DeactivateOptions) {
        let (return_to, on_deactivate) = {
            let mut inner = self.inner.borrow_mut();
            if inner.state == TrapState::Inactive {
                return;
            }
            inner.state = TrapState::Inactive;
            let return_focus = options
                .return_focus
                .unwrap_or(inner.options.return_focus_on_deactivate);
            let return_to = inner.return_to.take().filter(|_| return_focus);
            let on_deactivate = inner.options.on_deactivate.clone().filter(|_| options.notify);
            (return_to, on_deactivate)
        };
        self.remove_listeners();
        tracing::debug!("focus trap on {:?} deactivated", self.root());

        if let Some(callback) = on_deactivate {
            callback();
        }

        if let Some(node) = return_to {
            let document = self.coordinator.document().downgrade();
            self.coordinator.tasks().defer(move || {
                if let Some(document) = document.upgrade() {
                    try_focus(&document, node);
                }
            });
        }
    }

    /// Stop listening while staying active
    pub fn pause(&self) {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.state != TrapState::Active {
                return;
            }
            inner.state = TrapState::Paused;
        }
        self.remove_listeners();
        tracing::debug!("focus trap on {:?} paused", self.root());
    }

    /// Resume listening and refocus the initial focus node
    pub fn unpause(&self) -> Result<()> {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.state != TrapState::Paused {
                return Ok(());
            }
            inner.state = TrapState::Active;
        }
        if let Err(err) = self.add_listeners() {
            self.inner.borrow_mut().state = TrapState::Paused;
            return Err(err);
        }
        tracing::debug!("focus trap on {:?} unpaused", self.root());
        Ok(())
    }

    // =========================================================================
    // Listeners
    // =========================================================================

    fn add_listeners(&self) -> Result<()> {
        let document = self.coordinator.document().clone();
        self.update_tabbable_nodes();
        let first = self.first_focus_node()?;

        if let Some(previous) = self.coordinator.listening_trap() {
            if !previous.ptr_eq(self) {
                previous.pause();
            }
        }
        self.remove_listeners();
        self.coordinator.set_listening(Some(&self.inner));

        try_focus(&document, first);

        let mut ids: SmallVec<[ListenerId; 5]> = SmallVec::new();
        for kind in [
            EventKind::Focus,
            EventKind::Click,
            EventKind::MouseDown,
            EventKind::TouchStart,
            EventKind::KeyDown,
        ] {
            let weak = Rc::downgrade(&self.inner);
            let coordinator = Rc::downgrade(&self.coordinator.inner);
            ids.push(document.add_listener(
                ListenerTarget::Document,
                kind,
                Phase::Capture,
                move |event| {
                    let (Some(inner), Some(coordinator)) = (weak.upgrade(), coordinator.upgrade())
                    else {
                        return;
                    };
                    let trap = FocusTrap {
                        inner,
                        coordinator: FocusCoordinator { inner: coordinator },
                    };
                    trap.handle_event(event);
                },
            ));
        }
        self.inner.borrow_mut().listeners = ids;
        Ok(())
    }

    fn remove_listeners(&self) {
        let ids = std::mem::take(&mut self.inner.borrow_mut().listeners);
        let document = self.coordinator.document();
        for id in ids {
            document.remove_listener(id);
        }
        if self.coordinator.is_listening(&self.inner) {
            self.coordinator.set_listening(None);
        }
    }

    fn update_tabbable_nodes(&self) {
        let root = self.root();
        let nodes = tabbable_nodes(self.coordinator.document(), root);
        self.inner.borrow_mut().tabbables = nodes;
    }

    fn first_focus_node(&self) -> Result<NodeId> {
        let (root, initial, fallback, first_tabbable) = {
            let inner = self.inner.borrow();
            (
                inner.root,
                inner.options.initial_focus.clone(),
                inner.options.fallback_focus.clone(),
                inner.tabbables.first().copied(),
            )
        };
        let document = self.coordinator.document();

        if let Some(initial) = initial {
            return initial.resolve(document, "initial_focus");
        }
        if let Some(active) = document.active_element() {
            if document.contains(root, active) {
                return Ok(active);
            }
        }
        if let Some(node) = first_tabbable {
            return Ok(node);
        }
        match fallback {
            Some(fallback) => fallback.resolve(document, "fallback_focus"),
            None => Err(FocusTrapError::NoFocusableNode),
        }
    }

    fn handle_event(&self, event: &mut DomEvent) {
        match event.kind {
            EventKind::Focus => self.check_focus(event),
            EventKind::Click => self.check_click(event),
            EventKind::MouseDown | EventKind::TouchStart => self.check_pointer_down(event),
            EventKind::KeyDown => self.check_key(event),
            EventKind::KeyUp => {}
        }
    }

    fn contains(&self, node: NodeId) -> bool {
        self.coordinator.document().contains(self.root(), node)
    }

    fn check_focus(&self, event: &mut DomEvent) {
        if self.contains(event.target) {
            return;
        }
        event.prevent_default();
        event.stop_immediate_propagation();
        self.coordinator.document().blur(event.target);
    }

    fn check_click(&self, event: &mut DomEvent) {
        let click_outside_deactivates = self.inner.borrow().options.click_outside_deactivates;
        if click_outside_deactivates || self.contains(event.target) {
            return;
        }
        event.prevent_default();
        event.stop_immediate_propagation();
    }

    // Runs on mousedown/touchstart so it precedes the focus event
    fn check_pointer_down(&self, event: &mut DomEvent) {
        let click_outside_deactivates = self.inner.borrow().options.click_outside_deactivates;
        if click_outside_deactivates && !self.contains(event.target) {
            self.deactivate_with(DeactivateOptions::without_return_focus());
        }
    }

    fn check_key(&self, event: &mut DomEvent) {
        if event.is_key(&Key::Tab) {
            self.handle_tab(event);
        }
        let escape_deactivates = self.inner.borrow().options.escape_deactivates;
        if escape_deactivates && event.is_key(&Key::Escape) {
            self.deactivate();
        }
    }

    fn handle_tab(&self, event: &mut DomEvent) {
        event.prevent_default();
        self.update_tabbable_nodes();
        let nodes = self.tabbable_nodes();
        let (Some(&first), Some(&last)) = (nodes.first(), nodes.last()) else {
            return;
        };
        let current = nodes.iter().position(|node| *node == event.target);

        let next = if event.modifiers.shift {
            match current {
                Some(index) if index > 0 => nodes[index - 1],
                _ => last,
            }
        } else {
            match current {
                Some(index) if index + 1 < nodes.len() => nodes[index + 1],
                Some(_) => first,
                None => first,
            }
        };
        try_focus(self.coordinator.document(), next);
    }
}

impl fmt::Debug for FocusTrap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("FocusTrap")
            .field("root", &inner.root)
            .field("state", &inner.state)
            .field("tabbables", &inner.tabbables.len())
            .finish()
    }
}

/// Focus a node, selecting its text when it is an input
pub fn try_focus(document: &Document, node: NodeId) {
    if !document.exists(node) {
        return;
    }
    document.focus(node);
    if document.tag(node).as_deref() == Some("input") {
        document.select(node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use veil_core::Modifiers;

    struct Fixture {
        doc: Document,
        tasks: DeferredQueue,
        focus: FocusCoordinator,
    }

    impl Fixture {
        fn new() -> Self {
            let doc = Document::new();
            let tasks = DeferredQueue::new();
            let focus = FocusCoordinator::new(doc.clone(), tasks.clone());
            Self { doc, tasks, focus }
        }

        fn add(&self, parent: NodeId, tag: &str) -> NodeId {
            let node = self.doc.create_element(tag);
            self.doc.append_child(parent, node);
            node
        }

        /// Root with three buttons
        fn region(&self) -> (NodeId, [NodeId; 3]) {
            let root = self.add(self.doc.body(), "div");
            let a = self.add(root, "button");
            let b = self.add(root, "button");
            let c = self.add(root, "button");
            (root, [a, b, c])
        }
    }

    #[test]
    fn test_activate_focuses_first_tabbable() {
        let fx = Fixture::new();
        let outside = fx.add(fx.doc.body(), "button");
        fx.doc.focus(outside);
        let (root, [a, _, _]) = fx.region();

        let trap = fx.focus.create_trap(root, FocusTrapOptions::default()).unwrap();
        trap.activate().unwrap();
        assert_eq!(trap.state(), TrapState::Active);
        assert!(trap.is_listening());
        assert_eq!(fx.doc.active_element(), Some(a));
        assert_eq!(fx.doc.document_listener_count(), 5);

        trap.activate().unwrap();
        assert_eq!(fx.doc.document_listener_count(), 5);
    }

    #[test]
    fn test_tab_cycles_and_wraps() {
        let fx = Fixture::new();
        let (root, [a, b, c]) = fx.region();
        let trap = fx.focus.create_trap(root, FocusTrapOptions::default()).unwrap();
        trap.activate().unwrap();

        fx.doc.press_key(Key::Tab, Modifiers::NONE);
        assert_eq!(fx.doc.active_element(), Some(b));
        fx.doc.press_key(Key::Tab, Modifiers::NONE);
        assert_eq!(fx.doc.active_element(), Some(c));
        let event = fx.doc.press_key(Key::Tab, Modifiers::NONE);
        assert_eq!(fx.doc.active_element(), Some(a));
        assert!(event.default_prevented());

        fx.doc.press_key(Key::Tab, Modifiers::SHIFT);
        assert_eq!(fx.doc.active_element(), Some(c));
        fx.doc.press_key(Key::Tab, Modifiers::SHIFT);
        assert_eq!(fx.doc.active_element(), Some(b));
    }

    #[test]
    fn test_focus_outside_is_rejected() {
        let fx = Fixture::new();
        let outside = fx.add(fx.doc.body(), "button");
        let (root, [a, _, _]) = fx.region();
        let trap = fx.focus.create_trap(root, FocusTrapOptions::default()).unwrap();
        trap.activate().unwrap();
        assert_eq!(fx.doc.active_element(), Some(a));

        fx.doc.focus(outside);
        assert_eq!(fx.doc.active_element(), None);
    }

    #[test]
    fn test_click_outside_blocked() {
        let fx = Fixture::new();
        let outside = fx.add(fx.doc.body(), "button");
        let (root, [a, _, _]) = fx.region();
        let trap = fx.focus.create_trap(root, FocusTrapOptions::default()).unwrap();
        trap.activate().unwrap();

        let clicked = Rc::new(Cell::new(false));
        let c = clicked.clone();
        fx.doc.add_listener(
            ListenerTarget::Node(outside),
            EventKind::Click,
            Phase::Bubble,
            move |_| c.set(true),
        );
        let event = fx.doc.click(outside);
        assert!(event.default_prevented());
        assert!(!clicked.get());

        let inside = fx.doc.click(a);
        assert!(!inside.default_prevented());
        assert!(trap.is_active());
    }

    #[test]
    fn test_click_outside_deactivates_without_returning_focus() {
        let fx = Fixture::new();
        let outside = fx.add(fx.doc.body(), "button");
        fx.doc.focus(outside);
        let (root, _) = fx.region();
        let trap = fx
            .focus
            .create_trap(root, FocusTrapOptions::default().click_outside_deactivates(true))
            .unwrap();
        trap.activate().unwrap();

        fx.doc.click(outside);
        assert_eq!(trap.state(), TrapState::Inactive);
        assert_eq!(fx.tasks.len(), 0);
        assert_eq!(fx.doc.document_listener_count(), 0);
    }

    #[test]
    fn test_escape_deactivates_and_returns_focus_later() {
        let fx = Fixture::new();
        let opener = fx.add(fx.doc.body(), "button");
        fx.doc.focus(opener);
        let (root, [a, _, _]) = fx.region();
        let deactivated = Rc::new(Cell::new(0));
        let d = deactivated.clone();
        let trap = fx
            .focus
            .create_trap(
                root,
                FocusTrapOptions::default().on_deactivate(move || d.set(d.get() + 1)),
            )
            .unwrap();
        trap.activate().unwrap();
        assert_eq!(fx.doc.active_element(), Some(a));

        fx.doc.press_key(Key::Escape, Modifiers::NONE);
        assert_eq!(trap.state(), TrapState::Inactive);
        assert_eq!(deactivated.get(), 1);
        // Restoration waits for the deferred queue
        assert_eq!(fx.doc.active_element(), Some(a));
        fx.tasks.run_pending();
        assert_eq!(fx.doc.active_element(), Some(opener));
    }

    #[test]
    fn test_escape_can_be_disabled() {
        let fx = Fixture::new();
        let (root, _) = fx.region();
        let trap = fx
            .focus
            .create_trap(root, FocusTrapOptions::default().escape_deactivates(false))
            .unwrap();
        trap.activate().unwrap();
        fx.doc.press_key(Key::Escape, Modifiers::NONE);
        assert!(trap.is_active());
    }

    #[test]
    fn test_single_listening_trap() {
        let fx = Fixture::new();
        let (first_root, [a, _, _]) = fx.region();
        let (second_root, [x, _, _]) = fx.region();
        let first = fx.focus.create_trap(first_root, FocusTrapOptions::default()).unwrap();
        let second = fx.focus.create_trap(second_root, FocusTrapOptions::default()).unwrap();

        first.activate().unwrap();
        second.activate().unwrap();
        assert_eq!(first.state(), TrapState::Paused);
        assert!(second.is_listening());
        assert_eq!(fx.doc.active_element(), Some(x));
        assert_eq!(fx.doc.document_listener_count(), 5);

        second.deactivate();
        assert!(fx.focus.listening_trap().is_none());
        first.unpause().unwrap();
        assert!(first.is_listening());
        assert_eq!(fx.doc.active_element(), Some(a));
    }

    #[test]
    fn test_pause_keeps_return_target() {
        let fx = Fixture::new();
        let opener = fx.add(fx.doc.body(), "button");
        fx.doc.focus(opener);
        let (root, _) = fx.region();
        let trap = fx.focus.create_trap(root, FocusTrapOptions::default()).unwrap();
        trap.activate().unwrap();
        trap.pause();
        assert_eq!(fx.doc.document_listener_count(), 0);
        trap.pause();
        trap.unpause().unwrap();
        assert_eq!(fx.doc.document_listener_count(), 5);

        trap.deactivate();
        fx.tasks.run_pending();
        assert_eq!(fx.doc.active_element(), Some(opener));
    }

    #[test]
    fn test_initial_focus_options() {
        let fx = Fixture::new();
        let (root, [_, b, _]) = fx.region();
        fx.doc.set_attribute(b, "id", "second");
        let trap = fx
            .focus
            .create_trap(root, FocusTrapOptions::default().initial_focus("#second"))
            .unwrap();
        trap.activate().unwrap();
        assert_eq!(fx.doc.active_element(), Some(b));
    }

    #[test]
    fn test_input_text_selected_on_focus() {
        let fx = Fixture::new();
        let root = fx.add(fx.doc.body(), "div");
        let input = fx.add(root, "input");
        let trap = fx.focus.create_trap(root, FocusTrapOptions::default()).unwrap();
        trap.activate().unwrap();
        assert!(fx.doc.is_selected(input));
    }

    #[test]
    fn test_configuration_errors_leave_trap_inactive() {
        let fx = Fixture::new();
        let empty = fx.add(fx.doc.body(), "div");

        let trap = fx.focus.create_trap(empty, FocusTrapOptions::default()).unwrap();
        assert_eq!(trap.activate(), Err(FocusTrapError::NoFocusableNode));
        assert_eq!(trap.state(), TrapState::Inactive);
        assert_eq!(fx.doc.document_listener_count(), 0);

        let trap = fx
            .focus
            .create_trap(empty, FocusTrapOptions::default().initial_focus("#missing"))
            .unwrap();
        assert!(matches!(
            trap.activate(),
            Err(FocusTrapError::NoMatchingNode { option: "initial_focus", .. })
        ));

        let trap = fx
            .focus
            .create_trap(
                empty,
                FocusTrapOptions::default().fallback_focus(FocusTarget::resolver(|| None)),
            )
            .unwrap();
        assert_eq!(
            trap.activate(),
            Err(FocusTrapError::ResolverReturnedNothing { option: "fallback_focus" })
        );

        assert!(fx.focus.create_trap("#nowhere", FocusTrapOptions::default()).is_err());
    }

    #[test]
    fn test_fallback_focus_used_when_nothing_tabbable() {
        let fx = Fixture::new();
        let root = fx.add(fx.doc.body(), "div");
        let trap = fx
            .focus
            .create_trap(root, FocusTrapOptions::default().fallback_focus(root))
            .unwrap();
        trap.activate().unwrap();
        assert_eq!(fx.doc.active_element(), Some(root));

        // Tab with nothing tabbable keeps focus where it is
        fx.doc.press_key(Key::Tab, Modifiers::NONE);
        assert_eq!(fx.doc.active_element(), Some(root));
    }
}
