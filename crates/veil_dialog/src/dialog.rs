//! Dialog: a modal with a heading, a description and an actions row
//!
//! The dialog owns its options and relays the modal's share of them down;
//! the modal's events are re-fired on the dialog, and `open`/`dismiss`/
//! `close` events sent to the dialog reach the modal.

use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

use veil_core::{ChangeSet, Component, Document, Fragment, NodeId, Record, Value};

use crate::config::DialogConfig;
use crate::context::UiContext;
use crate::error::Result;
use crate::forward::{forward_data, forward_events};
use crate::modal::{fires, ons, Modal, MODAL_KEYS};

/// Option keys a dialog adds on top of the modal's
pub const DIALOG_KEYS: &[&str] = &["heading", "description", "ok_text"];

static NEXT_DIALOG_ID: AtomicUsize = AtomicUsize::new(0);

pub(crate) fn text_of(state: &Record, key: &str) -> String {
    state.get(key).map(|value| value.to_string()).unwrap_or_default()
}

struct DialogShared {
    component: Component,
    modal: Modal,
    element: NodeId,
    heading: NodeId,
    description: NodeId,
    actions: NodeId,
}

#[derive(Clone)]
pub struct Dialog {
    shared: Rc<DialogShared>,
}

impl Dialog {
    pub fn new(ctx: &UiContext, target: NodeId, config: DialogConfig) -> Result<Self> {
        let modal = Modal::new(
            ctx,
            target,
            config.modal.clone().with_initially_hidden(true),
        )?;

        let id = NEXT_DIALOG_ID.fetch_add(1, Ordering::Relaxed);
        let heading_id = format!("veil-dialog-heading-{id}");
        let description_id = format!("veil-dialog-description-{id}");

        let document = ctx.document();
        let element = document.create_element("div");
        document.set_attribute(element, "class", "veil-dialog");
        document.set_attribute(element, "role", "alertdialog");
        document.set_attribute(element, "aria-labelledby", heading_id.as_str());
        document.set_attribute(element, "aria-describedby", description_id.as_str());
        let heading = document.create_element("h1");
        document.set_attribute(heading, "id", heading_id);
        let description = document.create_element("p");
        document.set_attribute(description, "id", description_id);
        let actions = document.create_element("div");
        document.set_attribute(actions, "class", "actions");
        document.append_child(element, heading);
        document.append_child(element, description);
        document.append_child(element, actions);
        document.append_child(modal.content(), element);

        let component = Component::with_state(config.state_entries());
        component.mount_fragment(Box::new(DialogFragment {
            document: document.clone(),
            heading,
            description,
            modal: modal.clone(),
            detached: false,
        }));

        forward_data(&component, modal.component(), MODAL_KEYS);
        forward_events(modal.component(), &component, fires::ALL);
        forward_events(&component, modal.component(), ons::ALL);

        let dialog = Dialog {
            shared: Rc::new(DialogShared {
                component,
                modal,
                element,
                heading,
                description,
                actions,
            }),
        };
        if !config.modal.initially_hidden {
            dialog.open()?;
        }
        Ok(dialog)
    }

    pub fn component(&self) -> &Component {
        &self.shared.component
    }

    pub fn modal(&self) -> &Modal {
        &self.shared.modal
    }

    /// The `alertdialog` element
    pub fn element(&self) -> NodeId {
        self.shared.element
    }

    pub fn heading(&self) -> NodeId {
        self.shared.heading
    }

    pub fn description(&self) -> NodeId {
        self.shared.description
    }

    /// Container for the widget's buttons
    pub fn actions(&self) -> NodeId {
        self.shared.actions
    }

    pub fn open(&self) -> Result<()> {
        self.shared.modal.open()
    }

    pub fn dismiss(&self, result: impl Into<Value>) -> Result<()> {
        self.shared.modal.dismiss(result)
    }

    pub fn close(&self, result: impl Into<Value>) -> Result<()> {
        self.shared.modal.close(result)
    }

    pub fn destroy(&self) {
        self.shared.component.destroy();
    }

    pub fn destroy_with(&self, detach: bool) {
        self.shared.component.destroy_with(detach);
    }
}

impl std::fmt::Debug for Dialog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dialog")
            .field("component", &self.shared.component.id())
            .field("modal", &self.shared.modal)
            .finish()
    }
}

struct DialogFragment {
    document: Document,
    heading: NodeId,
    description: NodeId,
    modal: Modal,
    detached: bool,
}

impl Fragment for DialogFragment {
    fn update(&mut self, changed: &ChangeSet, state: &Record) {
        if changed.contains("heading") {
            self.document.set_text(self.heading, text_of(state, "heading"));
        }
        if changed.contains("description") {
            self.document
                .set_text(self.description, text_of(state, "description"));
        }
    }

    fn unmount(&mut self) {
        self.detached = true;
    }

    // The modal owns the nodes
    fn destroy(&mut self) {
        self.modal.destroy_with(self.detached);
    }
}
