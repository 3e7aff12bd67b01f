//! Widget configuration and presets
//!
//! Every config deserializes from TOML with missing fields falling back to
//! their defaults, so a host only writes what it changes:
//!
//! ```toml
//! heading = "Delete draft?"
//! confirm_text = "Delete"
//! default_action = "deny"
//!
//! [modal]
//! press_scrim_to_dismiss = false
//!
//! [modal.transition]
//! kind = "tween"
//! duration = 180.0
//! easing = "ease_out_cubic"
//! ```

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use veil_animation::{Easing, SpringConfig, Transition, TweenOptions};
use veil_core::Value;

use crate::error::Result;

fn parse<T: DeserializeOwned>(source: &str) -> Result<T> {
    let config = toml::from_str(source)?;
    Ok(config)
}

// =============================================================================
// Modal
// =============================================================================

/// Options of the base modal
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModalConfig {
    /// Build the modal closed; `open()` shows it later
    pub initially_hidden: bool,
    /// Center the content vertically
    pub center: bool,
    /// z-index while in the foreground; backgrounded modals sit one below
    pub z_index_base: i32,
    pub press_scrim_to_dismiss: bool,
    pub esc_to_dismiss: bool,
    /// Keep keyboard focus inside the modal while it is open
    pub trap_focus: bool,
    /// How the backdrop and content animate in and out
    pub transition: Transition,
}

impl Default for ModalConfig {
    fn default() -> Self {
        Self::standard()
    }
}

impl ModalConfig {
    /// Spring-animated, dismissable, focus-trapping modal
    pub fn standard() -> Self {
        Self {
            initially_hidden: false,
            center: true,
            z_index_base: 1,
            press_scrim_to_dismiss: true,
            esc_to_dismiss: true,
            trap_focus: true,
            transition: Transition::Spring(SpringConfig::default()),
        }
    }

    /// Duration-based transition; reversing mid-way takes only as long as
    /// the distance already covered
    pub fn tweened() -> Self {
        Self {
            transition: Transition::Tween(
                TweenOptions::default()
                    .with_duration(225.0)
                    .with_easing(Easing::EaseOutCubic)
                    .adjusting_duration(),
            ),
            ..Self::standard()
        }
    }

    /// Only the widget's own buttons close it
    pub fn persistent() -> Self {
        Self {
            press_scrim_to_dismiss: false,
            esc_to_dismiss: false,
            ..Self::standard()
        }
    }

    /// Opens and hides on the next frame
    pub fn instant() -> Self {
        Self {
            transition: Transition::Tween(TweenOptions::default().with_duration(0.0)),
            ..Self::standard()
        }
    }

    pub fn from_toml_str(source: &str) -> Result<Self> {
        parse(source)
    }

    pub fn with_initially_hidden(mut self, hidden: bool) -> Self {
        self.initially_hidden = hidden;
        self
    }

    pub fn with_center(mut self, center: bool) -> Self {
        self.center = center;
        self
    }

    pub fn with_z_index_base(mut self, base: i32) -> Self {
        self.z_index_base = base;
        self
    }

    pub fn with_press_scrim_to_dismiss(mut self, enabled: bool) -> Self {
        self.press_scrim_to_dismiss = enabled;
        self
    }

    pub fn with_esc_to_dismiss(mut self, enabled: bool) -> Self {
        self.esc_to_dismiss = enabled;
        self
    }

    pub fn with_trap_focus(mut self, enabled: bool) -> Self {
        self.trap_focus = enabled;
        self
    }

    pub fn with_transition(mut self, transition: Transition) -> Self {
        self.transition = transition;
        self
    }

    /// The option keys as component state
    pub(crate) fn state_entries(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("initially_hidden", self.initially_hidden.into()),
            ("initial_focus_element", Value::Bool(false)),
            ("center", self.center.into()),
            ("z_index_base", self.z_index_base.into()),
            ("press_scrim_to_dismiss", self.press_scrim_to_dismiss.into()),
            ("esc_to_dismiss", self.esc_to_dismiss.into()),
            ("trap_focus", self.trap_focus.into()),
        ]
    }
}

// =============================================================================
// Dialog
// =============================================================================

/// A modal with a heading, a description and an actions row
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DialogConfig {
    pub modal: ModalConfig,
    pub heading: String,
    pub description: String,
    pub ok_text: String,
}

impl Default for DialogConfig {
    fn default() -> Self {
        Self {
            modal: ModalConfig::standard(),
            heading: "This page says...".to_string(),
            description: "Press \"OK\" to continue.".to_string(),
            ok_text: "OK".to_string(),
        }
    }
}

impl DialogConfig {
    pub fn from_toml_str(source: &str) -> Result<Self> {
        parse(source)
    }

    pub fn with_modal(mut self, modal: ModalConfig) -> Self {
        self.modal = modal;
        self
    }

    pub fn with_heading(mut self, heading: impl Into<String>) -> Self {
        self.heading = heading.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_ok_text(mut self, text: impl Into<String>) -> Self {
        self.ok_text = text.into();
        self
    }

    pub(crate) fn state_entries(&self) -> Vec<(&'static str, Value)> {
        let mut entries = self.modal.state_entries();
        entries.extend([
            ("heading", self.heading.as_str().into()),
            ("description", self.description.as_str().into()),
            ("ok_text", self.ok_text.as_str().into()),
        ]);
        entries
    }
}

// =============================================================================
// Alert
// =============================================================================

/// A dialog with a single OK button
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    pub modal: ModalConfig,
    pub heading: String,
    pub description: String,
    pub ok_text: String,
    /// Focus the OK button when the alert opens
    pub initial_focus: bool,
}

impl Default for AlertConfig {
    fn default() -> Self {
        let dialog = DialogConfig::default();
        Self {
            modal: dialog.modal,
            heading: dialog.heading,
            description: dialog.description,
            ok_text: dialog.ok_text,
            initial_focus: false,
        }
    }
}

impl AlertConfig {
    pub fn from_toml_str(source: &str) -> Result<Self> {
        parse(source)
    }

    pub fn with_modal(mut self, modal: ModalConfig) -> Self {
        self.modal = modal;
        self
    }

    pub fn with_heading(mut self, heading: impl Into<String>) -> Self {
        self.heading = heading.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_ok_text(mut self, text: impl Into<String>) -> Self {
        self.ok_text = text.into();
        self
    }

    pub fn with_initial_focus(mut self, enabled: bool) -> Self {
        self.initial_focus = enabled;
        self
    }

    pub(crate) fn dialog(&self) -> DialogConfig {
        DialogConfig {
            modal: self.modal.clone(),
            heading: self.heading.clone(),
            description: self.description.clone(),
            ok_text: self.ok_text.clone(),
        }
    }
}

// =============================================================================
// Confirm
// =============================================================================

/// The two buttons of a confirm dialog
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmAction {
    Confirm,
    Deny,
}

impl ConfirmAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfirmAction::Confirm => "confirm",
            ConfirmAction::Deny => "deny",
        }
    }
}

/// A dialog asking the user to confirm or deny
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfirmConfig {
    pub modal: ModalConfig,
    pub heading: String,
    pub description: String,
    pub deny_text: String,
    pub confirm_text: String,
    /// Button focused when the dialog opens
    pub default_action: Option<ConfirmAction>,
}

impl Default for ConfirmConfig {
    fn default() -> Self {
        Self {
            modal: ModalConfig::standard(),
            heading: "Are you sure?".to_string(),
            description: "Confirm if you wish to proceed.".to_string(),
            deny_text: "Cancel".to_string(),
            confirm_text: "Confirm".to_string(),
            default_action: None,
        }
    }
}

impl ConfirmConfig {
    pub fn from_toml_str(source: &str) -> Result<Self> {
        parse(source)
    }

    pub fn with_modal(mut self, modal: ModalConfig) -> Self {
        self.modal = modal;
        self
    }

    pub fn with_heading(mut self, heading: impl Into<String>) -> Self {
        self.heading = heading.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_deny_text(mut self, text: impl Into<String>) -> Self {
        self.deny_text = text.into();
        self
    }

    pub fn with_confirm_text(mut self, text: impl Into<String>) -> Self {
        self.confirm_text = text.into();
        self
    }

    pub fn with_default_action(mut self, action: ConfirmAction) -> Self {
        self.default_action = Some(action);
        self
    }

    pub(crate) fn dialog(&self) -> DialogConfig {
        DialogConfig {
            modal: self.modal.clone(),
            heading: self.heading.clone(),
            description: self.description.clone(),
            ..DialogConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_modal_defaults() {
        let config = ModalConfig::default();
        assert!(!config.initially_hidden);
        assert!(config.center);
        assert_eq!(config.z_index_base, 1);
        assert!(config.press_scrim_to_dismiss);
        assert!(config.esc_to_dismiss);
        assert!(config.trap_focus);
        assert_eq!(
            config.transition,
            Transition::Spring(SpringConfig::new(0.5, 1.0))
        );
    }

    #[test]
    fn test_presets() {
        let tweened = ModalConfig::tweened();
        match tweened.transition {
            Transition::Tween(options) => {
                assert_eq!(options.duration, 225.0);
                assert_eq!(options.easing, Easing::EaseOutCubic);
                assert!(options.adjust_duration);
            }
            other => panic!("expected a tween, got {other:?}"),
        }

        let persistent = ModalConfig::persistent();
        assert!(!persistent.press_scrim_to_dismiss);
        assert!(!persistent.esc_to_dismiss);
        assert!(persistent.trap_focus);
    }

    #[test]
    fn test_modal_from_partial_toml() {
        let config = ModalConfig::from_toml_str(
            r#"
            z_index_base = 10
            esc_to_dismiss = false

            [transition]
            kind = "tween"
            duration = 180.0
            easing = "ease_out_cubic"
            "#,
        )
        .unwrap();
        assert_eq!(config.z_index_base, 10);
        assert!(!config.esc_to_dismiss);
        assert!(config.press_scrim_to_dismiss);
        assert_eq!(
            config.transition,
            Transition::Tween(TweenOptions {
                duration: 180.0,
                delay: 0.0,
                easing: Easing::EaseOutCubic,
                adjust_duration: false,
            })
        );
    }

    #[test]
    fn test_spring_transition_from_toml() {
        let config = ModalConfig::from_toml_str(
            r#"
            [transition]
            kind = "spring"
            stiffness = 0.2
            "#,
        )
        .unwrap();
        assert_eq!(
            config.transition,
            Transition::Spring(SpringConfig::new(0.2, 1.0))
        );
    }

    #[test]
    fn test_confirm_from_nested_toml() {
        let config = ConfirmConfig::from_toml_str(
            r#"
            heading = "Delete draft?"
            default_action = "deny"

            [modal]
            press_scrim_to_dismiss = false
            "#,
        )
        .unwrap();
        assert_eq!(config.heading, "Delete draft?");
        assert_eq!(config.description, "Confirm if you wish to proceed.");
        assert_eq!(config.default_action, Some(ConfirmAction::Deny));
        assert!(!config.modal.press_scrim_to_dismiss);
        assert!(config.modal.esc_to_dismiss);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = DialogConfig::from_toml_str("heading = 3").unwrap_err();
        assert!(matches!(err, crate::DialogError::Config(_)));
    }

    #[test]
    fn test_alert_defaults_follow_dialog() {
        let alert = AlertConfig::default();
        assert_eq!(alert.heading, "This page says...");
        assert_eq!(alert.ok_text, "OK");
        assert!(!alert.initial_focus);
        assert_eq!(alert.dialog().description, "Press \"OK\" to continue.");
    }

    #[test]
    fn test_state_entries_cover_modal_keys() {
        let entries = DialogConfig::default().state_entries();
        let keys: Vec<&str> = entries.iter().map(|(k, _)| *k).collect();
        for key in crate::modal::MODAL_KEYS {
            assert!(keys.contains(key), "missing {key}");
        }
        assert!(keys.contains(&"heading"));
    }
}
