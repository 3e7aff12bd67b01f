//! Error types for the dialog widgets

use thiserror::Error;
use veil_animation::InterpolateError;
use veil_focus::FocusTrapError;

#[derive(Error, Debug)]
pub enum DialogError {
    #[error("transition failed: {0}")]
    Animation(#[from] InterpolateError),

    #[error("focus trap error: {0}")]
    Focus(#[from] FocusTrapError),

    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, DialogError>;
