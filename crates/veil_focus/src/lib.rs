//! Veil Focus Management
//!
//! Keeps keyboard focus inside the active modal region.
//!
//! - **Tabbable nodes**: which elements Tab can reach, and in what order
//! - **Focus traps**: activate/deactivate/pause/unpause with a single
//!   listening trap per [`FocusCoordinator`]
//! - **Modal stack**: foreground/background bookkeeping across nested modals

pub mod error;
pub mod stack;
pub mod tabbable;
pub mod trap;

pub use error::{FocusTrapError, Result};
pub use stack::{ModalStack, StackKey, Stackable};
pub use tabbable::{is_tabbable, tabbable_nodes};
pub use trap::{
    try_focus, DeactivateOptions, FocusCoordinator, FocusTarget, FocusTrap, FocusTrapOptions,
    NodeResolver, TrapState,
};
