//! Confirm: a dialog with deny and confirm buttons
//!
//! Confirming closes the dialog with `{confirmed: true}`; denying dismisses
//! it with `{confirmed: false}`. Escape and the scrim dismiss it without a
//! payload.

use std::rc::{Rc, Weak};

use smallvec::SmallVec;
use veil_core::{
    ChangeSet, Component, Document, EventKind, Fragment, ListenerId, ListenerTarget, NodeId,
    Phase, Record, Value,
};

use crate::config::{ConfirmAction, ConfirmConfig};
use crate::context::UiContext;
use crate::dialog::{text_of, Dialog, DIALOG_KEYS};
use crate::error::Result;
use crate::forward::{forward_data, forward_events};
use crate::modal::{fires, ons, MODAL_KEYS};

fn outcome(confirmed: bool) -> Value {
    Value::record([("confirmed", confirmed)])
}

struct ConfirmShared {
    component: Component,
    dialog: Dialog,
    deny: NodeId,
    confirm: NodeId,
}

#[derive(Clone)]
pub struct Confirm {
    shared: Rc<ConfirmShared>,
}

impl Confirm {
    pub fn new(ctx: &UiContext, target: NodeId, config: ConfirmConfig) -> Result<Self> {
        let mut dialog_config = config.dialog();
        dialog_config.modal.initially_hidden = true;
        let dialog = Dialog::new(ctx, target, dialog_config)?;

        let document = ctx.document();
        let deny = document.create_element("button");
        document.set_attribute(deny, "class", "dialog-action deny");
        let confirm = document.create_element("button");
        document.set_attribute(confirm, "class", "dialog-action confirm");
        document.append_child(dialog.actions(), deny);
        document.append_child(dialog.actions(), confirm);

        let mut state = config.dialog().state_entries();
        state.extend([
            ("deny_text", config.deny_text.as_str().into()),
            ("confirm_text", config.confirm_text.as_str().into()),
            (
                "default_action",
                config.default_action.map(|action| action.as_str()).into(),
            ),
        ]);
        let component = Component::with_state(state);
        let focused = match config.default_action {
            Some(ConfirmAction::Confirm) => Some(confirm),
            Some(ConfirmAction::Deny) => Some(deny),
            None => None,
        };
        if let Some(node) = focused {
            component.set([("initial_focus_element", node)]);
        }

        let widget = Confirm {
            shared: Rc::new(ConfirmShared {
                component,
                dialog,
                deny,
                confirm,
            }),
        };

        let mut listeners = SmallVec::new();
        for (button, action) in [(deny, ConfirmAction::Deny), (confirm, ConfirmAction::Confirm)] {
            let weak = Rc::downgrade(&widget.shared);
            listeners.push(document.add_listener(
                ListenerTarget::Node(button),
                EventKind::Click,
                Phase::Bubble,
                move |_| {
                    if let Some(widget) = upgrade(&weak) {
                        widget.choose(action);
                    }
                },
            ));
        }
        widget.shared.component.mount_fragment(Box::new(ConfirmFragment {
            document: document.clone(),
            deny,
            confirm,
            listeners,
            dialog: widget.shared.dialog.clone(),
            detached: false,
        }));

        let keys: Vec<&str> = MODAL_KEYS.iter().chain(DIALOG_KEYS).copied().collect();
        let inner = widget.shared.dialog.component();
        forward_data(&widget.shared.component, inner, &keys);
        forward_events(inner, &widget.shared.component, fires::ALL);
        forward_events(&widget.shared.component, inner, ons::ALL);

        if !config.modal.initially_hidden {
            widget.open()?;
        }
        Ok(widget)
    }

    pub fn component(&self) -> &Component {
        &self.shared.component
    }

    pub fn dialog(&self) -> &Dialog {
        &self.shared.dialog
    }

    pub fn button(&self, action: ConfirmAction) -> NodeId {
        match action {
            ConfirmAction::Confirm => self.shared.confirm,
            ConfirmAction::Deny => self.shared.deny,
        }
    }

    pub fn open(&self) -> Result<()> {
        self.shared.dialog.open()
    }

    pub fn confirm(&self) -> Result<()> {
        self.shared.dialog.close(outcome(true))
    }

    pub fn deny(&self) -> Result<()> {
        self.shared.dialog.dismiss(outcome(false))
    }

    pub fn destroy(&self) {
        self.shared.component.destroy();
    }

    fn choose(&self, action: ConfirmAction) {
        let result = match action {
            ConfirmAction::Confirm => self.confirm(),
            ConfirmAction::Deny => self.deny(),
        };
        if let Err(err) = result {
            tracing::warn!(
                "confirm {:?} failed to {}: {}",
                self.shared.component.id(),
                action.as_str(),
                err
            );
        }
    }
}

fn upgrade(weak: &Weak<ConfirmShared>) -> Option<Confirm> {
    weak.upgrade().map(|shared| Confirm { shared })
}

struct ConfirmFragment {
    document: Document,
    deny: NodeId,
    confirm: NodeId,
    listeners: SmallVec<[ListenerId; 2]>,
    dialog: Dialog,
    detached: bool,
}

impl Fragment for ConfirmFragment {
    fn update(&mut self, changed: &ChangeSet, state: &Record) {
        if changed.contains("deny_text") {
            self.document.set_text(self.deny, text_of(state, "deny_text"));
        }
        if changed.contains("confirm_text") {
            self.document
                .set_text(self.confirm, text_of(state, "confirm_text"));
        }
    }

    fn unmount(&mut self) {
        self.detached = true;
    }

    fn destroy(&mut self) {
        for id in self.listeners.drain(..) {
            self.document.remove_listener(id);
        }
        self.dialog.destroy_with(self.detached);
    }
}
