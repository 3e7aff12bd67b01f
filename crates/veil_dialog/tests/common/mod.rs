//! Shared harness for the integration tests

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use veil_animation::ManualClock;
use veil_core::{Component, DomEvent, Key, Modifiers, NodeId};
use veil_dialog::UiContext;

/// A context on a hand-driven clock, at 60 frames per second
pub struct Harness {
    pub ctx: UiContext,
    pub clock: ManualClock,
}

impl Harness {
    pub fn new() -> Self {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
        let clock = ManualClock::new();
        Self {
            ctx: UiContext::with_clock(clock.clone()),
            clock,
        }
    }

    /// Advance one frame
    pub fn frame(&self) -> bool {
        self.clock.advance(16.0);
        self.ctx.frame()
    }

    /// Advance `millis` in a single frame
    pub fn frame_after(&self, millis: f64) -> bool {
        self.clock.advance(millis);
        self.ctx.frame()
    }

    /// Run frames until every animation has finished, then drain deferred work
    pub fn settle(&self) {
        for _ in 0..1000 {
            if !self.frame() {
                break;
            }
        }
        self.ctx.flush();
    }

    /// Press and release a key, then drain deferred work
    pub fn press(&self, key: Key) -> DomEvent {
        let event = self.ctx.document().press_key(key, Modifiers::NONE);
        self.ctx.flush();
        event
    }

    pub fn shift_tab(&self) -> DomEvent {
        let event = self.ctx.document().press_key(Key::Tab, Modifiers::SHIFT);
        self.ctx.flush();
        event
    }

    pub fn click(&self, node: NodeId) {
        self.ctx.document().click(node);
        self.ctx.flush();
    }

    pub fn active(&self) -> Option<NodeId> {
        self.ctx.document().active_element()
    }

    /// Append an element under `parent`
    pub fn add(&self, parent: NodeId, tag: &str) -> NodeId {
        let document = self.ctx.document();
        let node = document.create_element(tag);
        document.append_child(parent, node);
        node
    }
}

/// Collect the names of `events` as they fire on `component`
pub fn record(component: &Component, events: &[&str]) -> Rc<RefCell<Vec<String>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    for event in events {
        let log = log.clone();
        let label = event.to_string();
        component.on(event, move |_| log.borrow_mut().push(label.clone()));
    }
    log
}
