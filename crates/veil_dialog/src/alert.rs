//! Alert: a dialog with a single OK button

use std::rc::{Rc, Weak};

use veil_core::{
    ChangeSet, Component, Document, EventKind, Fragment, ListenerId, ListenerTarget, NodeId,
    Phase, Record, Value,
};

use crate::config::AlertConfig;
use crate::context::UiContext;
use crate::dialog::{text_of, Dialog, DIALOG_KEYS};
use crate::error::Result;
use crate::forward::{forward_data, forward_events};
use crate::modal::{fires, ons, MODAL_KEYS};

struct AlertShared {
    component: Component,
    dialog: Dialog,
    ok: NodeId,
}

#[derive(Clone)]
pub struct Alert {
    shared: Rc<AlertShared>,
}

impl Alert {
    pub fn new(ctx: &UiContext, target: NodeId, config: AlertConfig) -> Result<Self> {
        let mut dialog_config = config.dialog();
        dialog_config.modal.initially_hidden = true;
        let dialog = Dialog::new(ctx, target, dialog_config)?;

        let document = ctx.document();
        let ok = document.create_element("button");
        document.set_attribute(ok, "class", "dialog-action ok");
        document.append_child(dialog.actions(), ok);

        let mut state = config.dialog().state_entries();
        state.push(("initial_focus", config.initial_focus.into()));
        let component = Component::with_state(state);
        if config.initial_focus {
            component.set([("initial_focus_element", ok)]);
        }

        let alert = Alert {
            shared: Rc::new(AlertShared {
                component,
                dialog,
                ok,
            }),
        };

        let weak = Rc::downgrade(&alert.shared);
        let press = document.add_listener(
            ListenerTarget::Node(ok),
            EventKind::Click,
            Phase::Bubble,
            move |_| {
                if let Some(alert) = upgrade(&weak) {
                    alert.report(alert.close());
                }
            },
        );
        alert.shared.component.mount_fragment(Box::new(AlertFragment {
            document: document.clone(),
            ok,
            press,
            dialog: alert.shared.dialog.clone(),
            detached: false,
        }));

        let keys: Vec<&str> = MODAL_KEYS.iter().chain(DIALOG_KEYS).copied().collect();
        let inner = alert.shared.dialog.component();
        forward_data(&alert.shared.component, inner, &keys);
        forward_events(inner, &alert.shared.component, fires::ALL);
        forward_events(&alert.shared.component, inner, ons::ALL);

        if !config.modal.initially_hidden {
            alert.open()?;
        }
        Ok(alert)
    }

    pub fn component(&self) -> &Component {
        &self.shared.component
    }

    pub fn dialog(&self) -> &Dialog {
        &self.shared.dialog
    }

    /// The OK button
    pub fn ok_button(&self) -> NodeId {
        self.shared.ok
    }

    pub fn open(&self) -> Result<()> {
        self.shared.dialog.open()
    }

    pub fn close(&self) -> Result<()> {
        self.shared.dialog.close(Value::Null)
    }

    pub fn destroy(&self) {
        self.shared.component.destroy();
    }

    fn report(&self, result: Result<()>) {
        if let Err(err) = result {
            tracing::warn!("alert {:?} failed to close: {}", self.shared.component.id(), err);
        }
    }
}

fn upgrade(weak: &Weak<AlertShared>) -> Option<Alert> {
    weak.upgrade().map(|shared| Alert { shared })
}

struct AlertFragment {
    document: Document,
    ok: NodeId,
    press: ListenerId,
    dialog: Dialog,
    detached: bool,
}

impl Fragment for AlertFragment {
    fn update(&mut self, changed: &ChangeSet, state: &Record) {
        if changed.contains("ok_text") {
            self.document.set_text(self.ok, text_of(state, "ok_text"));
        }
    }

    fn unmount(&mut self) {
        self.detached = true;
    }

    fn destroy(&mut self) {
        self.document.remove_listener(self.press);
        self.dialog.destroy_with(self.detached);
    }
}
