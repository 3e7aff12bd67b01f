//! Veil Core Runtime
//!
//! Foundational primitives shared by the Veil crates:
//!
//! - **Values**: the dynamically shaped state model ([`Value`])
//! - **Document**: a headless element tree with focus and event dispatch
//! - **Components**: observable key/value state with change detection
//! - **Deferred tasks**: the post-dispatch queue used to sequence focus moves
//! - **Promises**: one-shot completion signals for animations and dialogs
//!
//! # Example
//!
//! ```rust
//! use veil_core::{Component, Value};
//!
//! let modal = Component::with_state([("hidden", true)]);
//! modal.computed("open", &["hidden"], |state| {
//!     Value::Bool(!state.get("hidden").map_or(false, Value::is_truthy))
//! });
//!
//! modal.set([("hidden", false)]);
//! assert_eq!(modal.get("open"), Some(Value::Bool(true)));
//! ```

pub mod component;
pub mod dom;
pub mod events;
pub mod promise;
pub mod subscription;
pub mod task;
pub mod value;

pub use component::{
    Change, ChangeSet, Component, ComponentId, Fragment, ObserveOptions, WeakComponent,
    WriteOrigin,
};
pub use dom::{Document, DomError, ListenerId, ListenerTarget, NodeId, Phase, WeakDocument};
pub use events::{DomEvent, EventKind, Key, Modifiers};
pub use promise::{Promise, Resolver};
pub use subscription::Subscription;
pub use task::DeferredQueue;
pub use value::{differs, Record, Timestamp, Value};
