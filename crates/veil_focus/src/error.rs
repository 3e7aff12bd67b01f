//! Focus trap errors

use thiserror::Error;
use veil_core::DomError;

/// Configuration errors raised when a trap is created, activated or unpaused
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FocusTrapError {
    /// A selector option matched no element
    #[error("`{option}` refers to no known node (selector {selector:?})")]
    NoMatchingNode {
        option: &'static str,
        selector: String,
    },

    /// A resolver option returned nothing
    #[error("`{option}` did not return a node")]
    ResolverReturnedNothing { option: &'static str },

    /// Neither an initial focus, a tabbable node nor a fallback exists
    #[error("a focus trap needs at least one focusable element")]
    NoFocusableNode,

    #[error(transparent)]
    Selector(#[from] DomError),
}

/// Result type for focus trap operations
pub type Result<T> = std::result::Result<T, FocusTrapError>;
