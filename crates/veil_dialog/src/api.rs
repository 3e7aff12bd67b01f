//! One-call dialogs
//!
//! `alert` and `confirm` build the widget in the document body, resolve with
//! the first `result` payload, and destroy the widget once it has finished
//! hiding.
//!
//! ```rust
//! use veil_animation::ManualClock;
//! use veil_core::Value;
//! use veil_dialog::{confirm, ConfirmConfig, UiContext};
//!
//! let clock = ManualClock::new();
//! let ctx = UiContext::with_clock(clock.clone());
//! let pending = confirm(&ctx, ConfirmConfig::default()).unwrap();
//!
//! pending.dialog.confirm().unwrap();
//! let result = pending.result.value().unwrap();
//! assert_eq!(result.field("confirmed"), Some(&Value::Bool(true)));
//! ```

use std::future::IntoFuture;

use veil_core::{Component, Promise, Value};

use crate::alert::Alert;
use crate::config::{AlertConfig, ConfirmConfig};
use crate::confirm::Confirm;
use crate::context::UiContext;
use crate::error::Result;
use crate::modal::fires;

/// A widget the function API can drive
pub trait DialogWidget: Clone + 'static {
    fn component(&self) -> &Component;
    fn destroy(&self);
}

impl DialogWidget for Alert {
    fn component(&self) -> &Component {
        Alert::component(self)
    }

    fn destroy(&self) {
        Alert::destroy(self)
    }
}

impl DialogWidget for Confirm {
    fn component(&self) -> &Component {
        Confirm::component(self)
    }

    fn destroy(&self) {
        Confirm::destroy(self)
    }
}

/// The pending answer to a dialog, plus the dialog itself
///
/// Awaiting it yields the `result` payload; `Value::Null` when the dialog
/// was dismissed without one.
pub struct DialogPromise<W> {
    pub result: Promise<Value>,
    pub dialog: W,
}

impl<W> DialogPromise<W> {
    /// The payload, once the dialog has produced one
    pub fn value(&self) -> Option<Value> {
        self.result.value()
    }

    pub fn is_settled(&self) -> bool {
        self.result.is_settled()
    }
}

impl<W> IntoFuture for DialogPromise<W> {
    type Output = Value;
    type IntoFuture = Promise<Value>;

    fn into_future(self) -> Self::IntoFuture {
        self.result
    }
}

/// Wire the result promise and self-destruction onto a fresh widget
pub fn launch<W: DialogWidget>(widget: W) -> DialogPromise<W> {
    let (result, resolver) = Promise::pending();
    let component = widget.component();
    component.on(fires::RESULT, move |data| {
        resolver.resolve(data.clone());
    });
    // The handler keeps the widget alive until it has hidden
    let keep = widget.clone();
    component.on(fires::HIDDEN, move |_| keep.destroy());
    DialogPromise {
        result,
        dialog: widget,
    }
}

/// Show an alert in the document body
pub fn alert(ctx: &UiContext, config: AlertConfig) -> Result<DialogPromise<Alert>> {
    let widget = Alert::new(ctx, ctx.body(), config)?;
    Ok(launch(widget))
}

/// Ask for confirmation in the document body
pub fn confirm(ctx: &UiContext, config: ConfirmConfig) -> Result<DialogPromise<Confirm>> {
    let widget = Confirm::new(ctx, ctx.body(), config)?;
    Ok(launch(widget))
}
