//! Modal overlay
//!
//! The base widget every dialog is built on: a root element holding a
//! content container and a scrim, animated in and out, with a focus trap
//! and a place on the shared modal stack.
//!
//! # Lifecycle
//!
//! ```text
//! hidden --open()--> opening --(both transitions finish)--> open
//!   ^                                                         |
//!   +-- (both transitions finish) <-- hiding <--hide()--------+
//! ```
//!
//! `hide` fires `result`, then the reason (`closed` or `dismissed`), then
//! `hiding`. Reversing mid-transition supersedes the running animations, so
//! `opened` or `hidden` only fire for a transition that actually completed.

use std::cell::Cell;
use std::rc::{Rc, Weak};

use smallvec::SmallVec;
use veil_animation::{AnimationOutcome, Completion, Transition};
use veil_core::{
    ChangeSet, Component, Document, DomEvent, EventKind, Fragment, Key, ListenerId,
    ListenerTarget, NodeId, Phase, Promise, Record, Value,
};
use veil_focus::{try_focus, FocusTrap, FocusTrapOptions, StackKey, Stackable};

use crate::config::ModalConfig;
use crate::context::UiContext;
use crate::error::Result;

/// Events a modal fires
pub mod fires {
    pub const OPENING: &str = "opening";
    pub const OPENED: &str = "opened";
    /// Payload of `close`/`dismiss`, fired first on every hide
    pub const RESULT: &str = "result";
    pub const DISMISSED: &str = "dismissed";
    pub const CLOSED: &str = "closed";
    pub const HIDING: &str = "hiding";
    pub const HIDDEN: &str = "hidden";

    pub const ALL: &[&str] = &[OPENING, OPENED, RESULT, DISMISSED, CLOSED, HIDING, HIDDEN];
}

/// Events a modal listens for
pub mod ons {
    pub const OPEN: &str = "open";
    pub const DISMISS: &str = "dismiss";
    pub const CLOSE: &str = "close";

    pub const ALL: &[&str] = &[OPEN, DISMISS, CLOSE];
}

/// Option keys a wrapping widget relays to its modal
pub const MODAL_KEYS: &[&str] = &[
    "initially_hidden",
    "initial_focus_element",
    "center",
    "z_index_base",
    "press_scrim_to_dismiss",
    "esc_to_dismiss",
    "trap_focus",
];

const OPEN_OPACITY: f64 = 1.0;
const HIDDEN_OPACITY: f64 = 0.0;
const OPEN_SCALE: f64 = 1.0;
const HIDDEN_SCALE: f64 = 0.9;

fn modal_style(opacity: f64) -> Value {
    Value::record([("opacity", opacity)])
}

fn content_style(scale: f64) -> Value {
    Value::record([("scale", scale)])
}

fn flag(state: &Record, key: &str) -> bool {
    state.get(key).map_or(false, Value::is_truthy)
}

fn all_finished(outcomes: &[AnimationOutcome]) -> bool {
    outcomes.iter().all(|o| *o == AnimationOutcome::Finished)
}

// =============================================================================
// Modal
// =============================================================================

struct ModalShared {
    ctx: UiContext,
    component: Component,
    root: NodeId,
    content: NodeId,
    scrim: NodeId,
    trap: FocusTrap,
    transition: Cell<Transition>,
    stack_key: Cell<Option<StackKey>>,
}

/// Handle to a modal; clones refer to the same instance
///
/// Dropping every handle does not remove the modal from the document. Call
/// [`Modal::destroy`] for that.
#[derive(Clone)]
pub struct Modal {
    shared: Rc<ModalShared>,
}

/// Non-owning modal handle held by listeners and the stack
#[derive(Clone)]
pub struct WeakModal {
    shared: Weak<ModalShared>,
}

impl WeakModal {
    pub fn upgrade(&self) -> Option<Modal> {
        self.shared.upgrade().map(|shared| Modal { shared })
    }
}

impl Modal {
    /// Build the modal inside `target`, opening it unless
    /// `config.initially_hidden` is set
    pub fn new(ctx: &UiContext, target: NodeId, config: ModalConfig) -> Result<Self> {
        let document = ctx.document();
        let root = document.create_element("div");
        document.set_attribute(root, "class", "veil-modal");
        document.set_attribute(root, "tabindex", "-1");
        let content = document.create_element("div");
        document.set_attribute(content, "class", "content");
        let scrim = document.create_element("div");
        document.set_attribute(scrim, "class", "scrim");
        document.append_child(root, content);
        document.append_child(root, scrim);
        document.append_child(target, root);

        // The modal handles Escape itself so only the foreground one reacts
        let trap = ctx.focus().create_trap(
            root,
            FocusTrapOptions::default()
                .initial_focus(root)
                .fallback_focus(root)
                .escape_deactivates(false)
                .return_focus_on_deactivate(true),
        )?;

        let mut state: Vec<(&str, Value)> = vec![
            ("hidden", true.into()),
            ("hiding", false.into()),
            ("opening", false.into()),
            ("in_foreground", false.into()),
            ("modal_style", modal_style(HIDDEN_OPACITY)),
            ("content_style", content_style(HIDDEN_SCALE)),
        ];
        state.extend(config.state_entries());
        let component = Component::with_state(state);
        component.computed("transitioning", &["hiding", "opening"], |s| {
            Value::Bool(flag(s, "hiding") || flag(s, "opening"))
        });
        component.computed("open", &["hidden", "transitioning"], |s| {
            Value::Bool(!flag(s, "hidden") && !flag(s, "transitioning"))
        });
        component.computed("z_index", &["z_index_base", "in_foreground"], |s| {
            let base = s.get("z_index_base").and_then(Value::as_f64).unwrap_or(1.0);
            Value::Number(if flag(s, "in_foreground") { base } else { base - 1.0 })
        });

        let modal = Modal {
            shared: Rc::new(ModalShared {
                ctx: ctx.clone(),
                component,
                root,
                content,
                scrim,
                trap,
                transition: Cell::new(config.transition),
                stack_key: Cell::new(None),
            }),
        };
        modal.mount();
        modal.install_handlers();
        tracing::debug!("modal {:?} created", modal.shared.component.id());

        if !config.initially_hidden {
            modal.open()?;
        }
        Ok(modal)
    }

    fn mount(&self) {
        let document = self.shared.ctx.document();
        let weak = self.downgrade();
        let keyup = document.add_listener(
            ListenerTarget::Document,
            EventKind::KeyUp,
            Phase::Bubble,
            move |event| {
                if let Some(modal) = weak.upgrade() {
                    modal.on_keyup(event);
                }
            },
        );
        let weak = self.downgrade();
        let scrim_press = document.add_listener(
            ListenerTarget::Node(self.shared.scrim),
            EventKind::Click,
            Phase::Bubble,
            move |_| {
                if let Some(modal) = weak.upgrade() {
                    modal.on_scrim_press();
                }
            },
        );

        let mut listeners = SmallVec::new();
        listeners.push(keyup);
        listeners.push(scrim_press);
        self.shared.component.mount_fragment(Box::new(ModalFragment {
            document: document.clone(),
            root: self.shared.root,
            content: self.shared.content,
            listeners,
        }));
    }

    fn install_handlers(&self) {
        let component = &self.shared.component;
        let weak = self.downgrade();

        component.on(ons::OPEN, handler(&weak, |modal, _| {
            modal.report("open", modal.open());
        }));
        component.on(ons::DISMISS, handler(&weak, |modal, result| {
            modal.report("dismiss", modal.dismiss(result.clone()));
        }));
        component.on(ons::CLOSE, handler(&weak, |modal, result| {
            modal.report("close", modal.close(result.clone()));
        }));

        // The trap activates before the stack foregrounds this modal, so it
        // records the element focused before the modal opened
        component.on(fires::OPENING, handler(&weak, |modal, _| modal.activate_trap()));
        component.on(fires::HIDING, handler(&weak, |modal, _| modal.shared.trap.deactivate()));
        component.on("destroy", handler(&weak, |modal, _| modal.shared.trap.deactivate()));

        component.on(fires::OPENING, handler(&weak, |modal, _| modal.push_onto_stack()));
        component.on(fires::HIDING, handler(&weak, |modal, _| modal.pop_from_stack()));
        component.on("destroy", handler(&weak, |modal, _| modal.pop_from_stack()));
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn downgrade(&self) -> WeakModal {
        WeakModal {
            shared: Rc::downgrade(&self.shared),
        }
    }

    pub fn component(&self) -> &Component {
        &self.shared.component
    }

    /// The modal element (focus trap root)
    pub fn root(&self) -> NodeId {
        self.shared.root
    }

    /// Container for the widget's own markup
    pub fn content(&self) -> NodeId {
        self.shared.content
    }

    pub fn scrim(&self) -> NodeId {
        self.shared.scrim
    }

    pub fn trap(&self) -> &FocusTrap {
        &self.shared.trap
    }

    pub fn transition(&self) -> Transition {
        self.shared.transition.get()
    }

    /// Used by the next open or hide
    pub fn set_transition(&self, transition: Transition) {
        self.shared.transition.set(transition);
    }

    pub fn is_open(&self) -> bool {
        self.flag("open")
    }

    pub fn is_hidden(&self) -> bool {
        self.flag("hidden")
    }

    pub fn is_transitioning(&self) -> bool {
        self.flag("transitioning")
    }

    pub fn in_foreground(&self) -> bool {
        self.flag("in_foreground")
    }

    pub fn is_destroyed(&self) -> bool {
        self.shared.component.is_destroyed()
    }

    fn flag(&self, key: &str) -> bool {
        self.shared
            .component
            .get(key)
            .map_or(false, |value| value.is_truthy())
    }

    // =========================================================================
    // Open / hide
    // =========================================================================

    /// Show the modal; a no-op while open or already opening
    pub fn open(&self) -> Result<()> {
        let component = &self.shared.component;
        if component.is_destroyed() || self.flag("open") || self.flag("opening") {
            return Ok(());
        }
        tracing::debug!("modal {:?} opening", component.id());

        component.set([("opening", true), ("hiding", false), ("hidden", false)]);
        component.fire(fires::OPENING, Value::Null);

        let completions =
            self.transition_to(modal_style(OPEN_OPACITY), content_style(OPEN_SCALE))?;
        let weak = self.downgrade();
        Promise::all(completions).then(move |outcomes| {
            if !all_finished(&outcomes) {
                return;
            }
            if let Some(modal) = weak.upgrade() {
                let component = &modal.shared.component;
                component.set([("opening", false)]);
                tracing::debug!("modal {:?} opened", component.id());
                component.fire(fires::OPENED, Value::Null);
            }
        });
        Ok(())
    }

    /// Hide the modal, firing `result` and `reason` with `result` as payload
    ///
    /// A no-op while hidden or already hiding.
    pub fn hide(&self, reason: &str, result: impl Into<Value>) -> Result<()> {
        let component = &self.shared.component;
        if component.is_destroyed() || self.flag("hidden") || self.flag("hiding") {
            return Ok(());
        }
        tracing::debug!("modal {:?} hiding ({})", component.id(), reason);

        component.set([("opening", false), ("hiding", true)]);
        let result = result.into();
        component.fire(fires::RESULT, result.clone());
        component.fire(reason, result);
        component.fire(fires::HIDING, Value::Null);

        let completions =
            self.transition_to(modal_style(HIDDEN_OPACITY), content_style(HIDDEN_SCALE))?;
        let weak = self.downgrade();
        Promise::all(completions).then(move |outcomes| {
            if !all_finished(&outcomes) {
                return;
            }
            if let Some(modal) = weak.upgrade() {
                let component = &modal.shared.component;
                component.set([("hiding", false), ("hidden", true)]);
                tracing::debug!("modal {:?} hidden", component.id());
                component.fire(fires::HIDDEN, Value::Null);
            }
        });
        Ok(())
    }

    pub fn close(&self, result: impl Into<Value>) -> Result<()> {
        self.hide(fires::CLOSED, result)
    }

    pub fn dismiss(&self, result: impl Into<Value>) -> Result<()> {
        self.hide(fires::DISMISSED, result)
    }

    fn transition_to(&self, backdrop: Value, body: Value) -> Result<[Completion; 2]> {
        let scheduler = self.shared.ctx.scheduler();
        let component = &self.shared.component;
        let transition = self.shared.transition.get();
        let backdrop = scheduler.animate(component, "modal_style", backdrop, transition)?;
        let body = scheduler.animate(component, "content_style", body, transition)?;
        Ok([backdrop.completion, body.completion])
    }

    fn report(&self, action: &str, result: Result<()>) {
        if let Err(err) = result {
            tracing::warn!("modal {:?} {} failed: {}", self.shared.component.id(), action, err);
        }
    }

    // =========================================================================
    // Focus and stacking
    // =========================================================================

    /// Focus `initial_focus_element` when it names a node
    pub fn focus_initial_focus_element(&self) {
        let node = self
            .shared
            .component
            .get("initial_focus_element")
            .and_then(|value| value.as_node());
        if let Some(node) = node {
            try_focus(self.shared.ctx.document(), node);
        }
    }

    /// Another modal opened on top of this one
    pub fn background(&self) {
        self.shared.trap.pause();
        self.shared.component.set([("in_foreground", false)]);
    }

    /// This modal is the top of the stack again
    pub fn foreground(&self) {
        if let Err(err) = self.shared.trap.unpause() {
            tracing::warn!(
                "modal {:?} could not resume its focus trap: {}",
                self.shared.component.id(),
                err
            );
        }
        self.focus_initial_focus_element();
        self.shared.component.set([("in_foreground", true)]);
    }

    fn push_onto_stack(&self) {
        if self.shared.stack_key.get().is_some() {
            return;
        }
        let entry = Rc::new(StackedModal(self.downgrade()));
        let key = self.shared.ctx.stack().opening(entry);
        self.shared.stack_key.set(Some(key));
    }

    fn pop_from_stack(&self) {
        if let Some(key) = self.shared.stack_key.take() {
            self.shared.ctx.stack().closing(key);
        }
    }

    fn activate_trap(&self) {
        if self.flag("trap_focus") {
            if let Err(err) = self.shared.trap.activate() {
                tracing::warn!(
                    "modal {:?} could not trap focus: {}",
                    self.shared.component.id(),
                    err
                );
            }
        }
        // The trap lands on the root; the configured element follows once
        // the opening event has finished
        let weak = self.downgrade();
        self.shared.ctx.tasks().defer(move || {
            if let Some(modal) = weak.upgrade() {
                modal.focus_initial_focus_element();
            }
        });
    }

    fn on_keyup(&self, event: &mut DomEvent) {
        let dismiss = event.is_key(&Key::Escape)
            && self.flag("esc_to_dismiss")
            && self.flag("in_foreground");
        if dismiss {
            self.report("dismiss", self.dismiss(Value::Null));
        }
    }

    fn on_scrim_press(&self) {
        if self.flag("press_scrim_to_dismiss") {
            self.report("dismiss", self.dismiss(Value::Null));
        }
    }

    // =========================================================================
    // Teardown
    // =========================================================================

    pub fn destroy(&self) {
        self.shared.component.destroy();
    }

    pub fn destroy_with(&self, detach: bool) {
        self.shared.component.destroy_with(detach);
    }
}

impl std::fmt::Debug for Modal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Modal")
            .field("component", &self.shared.component.id())
            .field("root", &self.shared.root)
            .field("open", &self.is_open())
            .field("hidden", &self.is_hidden())
            .field("in_foreground", &self.in_foreground())
            .finish()
    }
}

fn handler<F>(weak: &WeakModal, action: F) -> impl Fn(&Value) + 'static
where
    F: Fn(&Modal, &Value) + 'static,
{
    let weak = weak.clone();
    move |data| {
        if let Some(modal) = weak.upgrade() {
            action(&modal, data);
        }
    }
}

struct StackedModal(WeakModal);

impl Stackable for StackedModal {
    fn background(&self) {
        if let Some(modal) = self.0.upgrade() {
            modal.background();
        }
    }

    fn foreground(&self) {
        if let Some(modal) = self.0.upgrade() {
            modal.foreground();
        }
    }
}

// =============================================================================
// Fragment
// =============================================================================

struct ModalFragment {
    document: Document,
    root: NodeId,
    content: NodeId,
    listeners: SmallVec<[ListenerId; 2]>,
}

impl Fragment for ModalFragment {
    fn update(&mut self, changed: &ChangeSet, state: &Record) {
        let document = &self.document;
        if changed.contains("center") {
            document.set_attribute(self.root, "data-center", flag(state, "center").to_string());
        }
        if changed.contains("hidden") {
            let hidden = flag(state, "hidden");
            document.set_attribute(self.root, "data-hidden", hidden.to_string());
            document.set_style(self.root, "visibility", if hidden { "hidden" } else { "inherit" });
        }
        if changed.contains("z_index") {
            if let Some(z) = state.get("z_index").and_then(Value::as_f64) {
                document.set_style(self.root, "z-index", z.to_string());
            }
        }
        if changed.contains("modal_style") {
            let opacity = state
                .get("modal_style")
                .and_then(|style| style.field("opacity"))
                .and_then(Value::as_f64);
            if let Some(opacity) = opacity {
                document.set_style(self.root, "opacity", opacity.to_string());
            }
        }
        if changed.contains("content_style") {
            let scale = state
                .get("content_style")
                .and_then(|style| style.field("scale"))
                .and_then(Value::as_f64);
            if let Some(scale) = scale {
                document.set_style(self.content, "transform", format!("scale({scale})"));
            }
        }
    }

    fn unmount(&mut self) {
        self.document.remove(self.root);
    }

    fn destroy(&mut self) {
        for id in self.listeners.drain(..) {
            self.document.remove_listener(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use veil_animation::ManualClock;
    use veil_core::Modifiers;

    fn context() -> (UiContext, ManualClock) {
        let clock = ManualClock::new();
        (UiContext::with_clock(clock.clone()), clock)
    }

    fn settle(ctx: &UiContext, clock: &ManualClock) {
        for _ in 0..500 {
            clock.advance(16.0);
            if !ctx.frame() {
                break;
            }
        }
        ctx.flush();
    }

    fn record(component: &Component, names: &[&str]) -> Rc<RefCell<Vec<String>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        for name in names {
            let log = log.clone();
            let label = name.to_string();
            component.on(name, move |_| log.borrow_mut().push(label.clone()));
        }
        log
    }

    #[test]
    fn test_initially_hidden_modal() {
        let (ctx, _clock) = context();
        let modal = Modal::new(
            &ctx,
            ctx.body(),
            ModalConfig::standard().with_initially_hidden(true),
        )
        .unwrap();
        let doc = ctx.document();

        assert!(modal.is_hidden());
        assert!(!modal.is_open());
        assert!(doc.contains(ctx.body(), modal.root()));
        assert!(doc.contains(modal.root(), modal.content()));
        assert_eq!(doc.attribute(modal.root(), "data-hidden").as_deref(), Some("true"));
        assert_eq!(doc.attribute(modal.root(), "data-center").as_deref(), Some("true"));
        assert_eq!(doc.style(modal.root(), "visibility").as_deref(), Some("hidden"));
        assert_eq!(doc.style(modal.root(), "z-index").as_deref(), Some("0"));
        assert_eq!(doc.style(modal.root(), "opacity").as_deref(), Some("0"));
        assert_eq!(
            doc.style(modal.content(), "transform").as_deref(),
            Some("scale(0.9)")
        );
        assert!(!ctx.scheduler().is_running());
        assert!(ctx.stack().is_empty());
    }

    #[test]
    fn test_open_then_close_lifecycle() {
        let (ctx, clock) = context();
        let modal = Modal::new(
            &ctx,
            ctx.body(),
            ModalConfig::tweened().with_initially_hidden(true),
        )
        .unwrap();
        let log = record(modal.component(), fires::ALL);
        let doc = ctx.document();

        modal.open().unwrap();
        assert_eq!(*log.borrow(), vec!["opening"]);
        assert!(modal.is_transitioning());
        assert!(modal.in_foreground());
        assert_eq!(doc.style(modal.root(), "visibility").as_deref(), Some("inherit"));
        assert_eq!(doc.style(modal.root(), "z-index").as_deref(), Some("1"));
        assert!(modal.trap().is_listening());
        assert_eq!(doc.active_element(), Some(modal.root()));

        settle(&ctx, &clock);
        assert_eq!(*log.borrow(), vec!["opening", "opened"]);
        assert!(modal.is_open());
        assert_eq!(doc.style(modal.root(), "opacity").as_deref(), Some("1"));
        assert_eq!(doc.style(modal.content(), "transform").as_deref(), Some("scale(1)"));

        let results = Rc::new(RefCell::new(Vec::new()));
        let sink = results.clone();
        modal
            .component()
            .on(fires::RESULT, move |data| sink.borrow_mut().push(data.clone()));
        modal.close(42).unwrap();
        assert_eq!(
            *log.borrow(),
            vec!["opening", "opened", "result", "closed", "hiding"]
        );
        assert_eq!(*results.borrow(), vec![Value::from(42)]);
        assert!(!modal.trap().is_active());
        assert!(ctx.stack().is_empty());

        settle(&ctx, &clock);
        assert_eq!(log.borrow().last().map(String::as_str), Some("hidden"));
        assert!(modal.is_hidden());
        assert_eq!(doc.attribute(modal.root(), "data-hidden").as_deref(), Some("true"));
        assert!(!ctx.scheduler().is_running());
    }

    #[test]
    fn test_reopen_while_hiding_skips_hidden() {
        let (ctx, clock) = context();
        let modal = Modal::new(&ctx, ctx.body(), ModalConfig::tweened()).unwrap();
        settle(&ctx, &clock);
        let log = record(modal.component(), fires::ALL);

        modal.dismiss(Value::Null).unwrap();
        clock.advance(50.0);
        ctx.frame();
        modal.open().unwrap();
        settle(&ctx, &clock);

        let log = log.borrow();
        assert!(log.contains(&"dismissed".to_string()));
        assert!(!log.contains(&"hidden".to_string()));
        assert_eq!(log.last().map(String::as_str), Some("opened"));
        assert!(modal.is_open());
    }

    #[test]
    fn test_open_and_hide_are_idempotent() {
        let (ctx, clock) = context();
        let modal = Modal::new(&ctx, ctx.body(), ModalConfig::instant()).unwrap();
        let log = record(modal.component(), fires::ALL);
        modal.open().unwrap();
        assert!(log.borrow().is_empty());
        settle(&ctx, &clock);

        modal.close(Value::Null).unwrap();
        modal.dismiss(Value::Null).unwrap();
        assert_eq!(*log.borrow(), vec!["opened", "result", "closed", "hiding"]);
    }

    #[test]
    fn test_escape_keyup_dismisses() {
        let (ctx, clock) = context();
        let modal = Modal::new(&ctx, ctx.body(), ModalConfig::instant()).unwrap();
        settle(&ctx, &clock);
        let log = record(modal.component(), &[fires::DISMISSED]);

        ctx.document().press_key(Key::Character('a'), Modifiers::NONE);
        assert!(log.borrow().is_empty());
        ctx.document().press_key(Key::Escape, Modifiers::NONE);
        assert_eq!(*log.borrow(), vec!["dismissed"]);
    }

    #[test]
    fn test_escape_ignored_when_disabled() {
        let (ctx, clock) = context();
        let modal = Modal::new(&ctx, ctx.body(), ModalConfig::persistent()).unwrap();
        settle(&ctx, &clock);

        ctx.document().press_key(Key::Escape, Modifiers::NONE);
        ctx.document().click(modal.scrim());
        ctx.flush();
        assert!(modal.is_open());
    }

    #[test]
    fn test_scrim_press_dismisses() {
        let (ctx, clock) = context();
        let modal = Modal::new(&ctx, ctx.body(), ModalConfig::instant()).unwrap();
        settle(&ctx, &clock);

        ctx.document().click(modal.scrim());
        assert!(modal.is_transitioning());
        settle(&ctx, &clock);
        assert!(modal.is_hidden());
    }

    #[test]
    fn test_events_drive_methods() {
        let (ctx, clock) = context();
        let modal = Modal::new(
            &ctx,
            ctx.body(),
            ModalConfig::instant().with_initially_hidden(true),
        )
        .unwrap();
        modal.component().fire(ons::OPEN, Value::Null);
        settle(&ctx, &clock);
        assert!(modal.is_open());

        let results = Rc::new(RefCell::new(Vec::new()));
        let sink = results.clone();
        modal
            .component()
            .on(fires::RESULT, move |data| sink.borrow_mut().push(data.clone()));
        modal.component().fire(ons::DISMISS, "nope");
        assert_eq!(*results.borrow(), vec![Value::from("nope")]);
    }

    #[test]
    fn test_initial_focus_element_on_open() {
        let (ctx, clock) = context();
        let doc = ctx.document();
        let modal = Modal::new(
            &ctx,
            ctx.body(),
            ModalConfig::instant().with_initially_hidden(true),
        )
        .unwrap();
        let button = doc.create_element("button");
        doc.append_child(modal.content(), button);
        modal.component().set([("initial_focus_element", button)]);

        modal.open().unwrap();
        assert_eq!(doc.active_element(), Some(button));
        ctx.flush();
        assert_eq!(doc.active_element(), Some(button));
        settle(&ctx, &clock);
        assert_eq!(doc.active_element(), Some(button));
    }

    #[test]
    fn test_focus_returns_to_launcher_not_initial_element() {
        let (ctx, clock) = context();
        let doc = ctx.document();
        let launcher = doc.create_element("button");
        doc.append_child(ctx.body(), launcher);
        doc.focus(launcher);

        let modal = Modal::new(

            &ctx,

            ctx.body(),

            ModalConfig::instant().with_initially_hidden(true),

        )

        .unwrap();
        let button = doc.create_element("button");
        doc.append_child(modal.content(), button);
        modal.component().set([("initial_focus_element", button)]);
        modal.open().unwrap();
        settle(&ctx, &clock);
        assert_eq!(doc.active_element(), Some(button));

        modal.dismiss(Value::Null).unwrap();
        ctx.flush();
        assert_eq!(doc.active_element(), Some(launcher));
    }

    #[test]
    fn test_without_focus_trap() {
        let (ctx, clock) = context();
        let modal = Modal::new(
            &ctx,
            ctx.body(),
            ModalConfig::instant().with_trap_focus(false),
        )
        .unwrap();
        settle(&ctx, &clock);
        assert!(!modal.trap().is_active());
        assert!(modal.in_foreground());
    }

    #[test]
    fn test_focus_returns_after_hide() {
        let (ctx, clock) = context();
        let doc = ctx.document();
        let launcher = doc.create_element("button");
        doc.append_child(ctx.body(), launcher);
        doc.focus(launcher);

        let modal = Modal::new(&ctx, ctx.body(), ModalConfig::instant()).unwrap();
        settle(&ctx, &clock);
        assert_eq!(doc.active_element(), Some(modal.root()));

        modal.close(Value::Null).unwrap();
        ctx.flush();
        assert_eq!(doc.active_element(), Some(launcher));
    }

    #[test]
    fn test_destroy_mid_animation() {
        let (ctx, clock) = context();
        let doc = ctx.document().clone();
        let modal = Modal::new(&ctx, ctx.body(), ModalConfig::tweened()).unwrap();
        let root = modal.root();
        let id = modal.component().id();
        let listeners_before = doc.document_listener_count();
        clock.advance(16.0);
        ctx.frame();
        assert!(ctx.scheduler().is_registered(id));

        modal.destroy();
        assert!(!doc.exists(root));
        assert!(!ctx.scheduler().is_registered(id));
        assert!(ctx.stack().is_empty());
        assert!(!modal.trap().is_active());
        assert!(doc.document_listener_count() < listeners_before);

        clock.advance(16.0);
        assert!(!ctx.frame());
        ctx.document().press_key(Key::Escape, Modifiers::NONE);
    }

    #[test]
    fn test_destroy_without_detach_keeps_nodes() {
        let (ctx, _clock) = context();
        let modal = Modal::new(
            &ctx,
            ctx.body(),
            ModalConfig::instant().with_initially_hidden(true),
        )
        .unwrap();
        modal.destroy_with(false);
        assert!(modal.is_destroyed());
        assert!(ctx.document().exists(modal.root()));
    }
}
