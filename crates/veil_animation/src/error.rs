//! Animation error types

use thiserror::Error;

/// Value shapes that cannot be interpolated into one another
///
/// Always returned synchronously when an animation starts, before the
/// scheduler sees it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InterpolateError {
    /// Start and target are different kinds of value
    #[error("Cannot interpolate values of different type ({from} -> {to})")]
    TypeMismatch {
        from: &'static str,
        to: &'static str,
    },

    /// Arrays of different lengths
    #[error("Cannot interpolate arrays of different length ({from} -> {to})")]
    LengthMismatch { from: usize, to: usize },

    /// Records whose key sets differ
    #[error("Cannot interpolate differently-shaped records")]
    KeyMismatch,

    /// A kind of value that has no in-between states
    #[error("Cannot interpolate {0} values")]
    NotInterpolatable(&'static str),
}

/// Result type for animation operations
pub type Result<T> = std::result::Result<T, InterpolateError>;
