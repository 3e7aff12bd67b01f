//! Veil Dialogs
//!
//! Headless modal dialogs on top of the Veil runtime.
//!
//! - **Modal**: animated overlay with scrim and Escape dismissal, a focus
//!   trap, and a place on the shared modal stack
//! - **Dialog**: heading, description and an actions row inside a modal
//! - **Alert** / **Confirm**: ready-made dialogs with their buttons
//! - **Function API**: [`alert`] and [`confirm`] resolve with the dialog's
//!   result and clean up after themselves
//!
//! Every widget takes a [`UiContext`], the bundle of document, frame
//! scheduler, focus coordinator and modal stack shared by a whole
//! application. The host drives it: call [`UiContext::frame`] on each
//! display refresh while animations run, and [`UiContext::flush`] after
//! dispatching each input event.
//!
//! # Example
//!
//! ```rust
//! use veil_animation::ManualClock;
//! use veil_core::{Key, Modifiers};
//! use veil_dialog::{Modal, ModalConfig, UiContext};
//!
//! let clock = ManualClock::new();
//! let ctx = UiContext::with_clock(clock.clone());
//! let modal = Modal::new(&ctx, ctx.body(), ModalConfig::standard()).unwrap();
//!
//! while {
//!     clock.advance(16.0);
//!     ctx.frame()
//! } {}
//! assert!(modal.is_open());
//!
//! ctx.document().press_key(Key::Escape, Modifiers::NONE);
//! ctx.flush();
//! assert!(modal.is_transitioning());
//! ```

pub mod alert;
pub mod api;
pub mod config;
pub mod confirm;
pub mod context;
pub mod dialog;
pub mod error;
pub mod forward;
pub mod modal;

pub use alert::Alert;
pub use api::{alert, confirm, launch, DialogPromise, DialogWidget};
pub use config::{AlertConfig, ConfirmAction, ConfirmConfig, DialogConfig, ModalConfig};
pub use confirm::Confirm;
pub use context::UiContext;
pub use dialog::{Dialog, DIALOG_KEYS};
pub use error::{DialogError, Result};
pub use forward::{forward_data, forward_events};
pub use modal::{fires, ons, Modal, WeakModal, MODAL_KEYS};
