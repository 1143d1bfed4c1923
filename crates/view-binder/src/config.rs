#![forbid(unsafe_code)]

//! Binding configuration.
//!
//! [`BindConfig`] is what callers pass to the bind functions: every field is
//! optional. [`BindConfig::resolve`] merges it over the defaults, with the
//! caller's fields winning, into a [`ResolvedConfig`].
//!
//! Configuration is plain data, so it can be loaded from JSON (always) or
//! TOML (`policy-config` feature):
//!
//! ```
//! use view_binder::BindConfig;
//!
//! let cfg = BindConfig::from_json_str(r#"{ "controlChangeEventType": "input" }"#).unwrap();
//! let resolved = cfg.resolve();
//! assert_eq!(resolved.control_change_event_type, "input");
//! assert_eq!(resolved.model_change_event_type, "change");
//! ```

use serde::{Deserialize, Serialize};

use crate::error::BindError;
use crate::event::DEFAULT_CHANGE_EVENT;

/// How view-change events are routed to relations on the model side.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DispatchMode {
    /// One subscription per relation, each re-checking control id and property.
    #[default]
    PerRelation,
    /// One subscription per bind call, routed through a
    /// [`RelationIndex`](crate::RelationIndex).
    Indexed,
}

/// Caller-supplied configuration. Unset fields fall back to the defaults.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct BindConfig {
    /// Native event type the model emits on property change.
    pub model_change_event_type: Option<String>,
    /// Native event type controls emit on property change.
    pub control_change_event_type: Option<String>,
    pub dispatch: Option<DispatchMode>,
}

impl BindConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn model_change_event_type(mut self, event_type: impl Into<String>) -> Self {
        self.model_change_event_type = Some(event_type.into());
        self
    }

    #[must_use]
    pub fn control_change_event_type(mut self, event_type: impl Into<String>) -> Self {
        self.control_change_event_type = Some(event_type.into());
        self
    }

    #[must_use]
    pub fn dispatch(mut self, mode: DispatchMode) -> Self {
        self.dispatch = Some(mode);
        self
    }

    /// Merge over [`ResolvedConfig::default`]; fields set here win.
    #[must_use]
    pub fn resolve(&self) -> ResolvedConfig {
        let defaults = ResolvedConfig::default();
        ResolvedConfig {
            model_change_event_type: self
                .model_change_event_type
                .clone()
                .unwrap_or(defaults.model_change_event_type),
            control_change_event_type: self
                .control_change_event_type
                .clone()
                .unwrap_or(defaults.control_change_event_type),
            dispatch: self.dispatch.unwrap_or(defaults.dispatch),
        }
    }

    /// Parse a JSON configuration document.
    pub fn from_json_str(input: &str) -> Result<Self, BindError> {
        Ok(serde_json::from_str(input)?)
    }

    /// Parse a TOML configuration document.
    #[cfg(feature = "policy-config")]
    pub fn from_toml_str(input: &str) -> Result<Self, BindError> {
        Ok(toml::from_str(input)?)
    }
}

/// Fully merged configuration used while wiring relations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub model_change_event_type: String,
    pub control_change_event_type: String,
    pub dispatch: DispatchMode,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            model_change_event_type: DEFAULT_CHANGE_EVENT.to_owned(),
            control_change_event_type: DEFAULT_CHANGE_EVENT.to_owned(),
            dispatch: DispatchMode::PerRelation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_resolves_to_defaults() {
        assert_eq!(BindConfig::new().resolve(), ResolvedConfig::default());
    }

    #[test]
    fn supplied_fields_win_over_defaults() {
        let resolved = BindConfig::new()
            .model_change_event_type("propertychange")
            .dispatch(DispatchMode::Indexed)
            .resolve();
        assert_eq!(resolved.model_change_event_type, "propertychange");
        assert_eq!(resolved.control_change_event_type, "change");
        assert_eq!(resolved.dispatch, DispatchMode::Indexed);
    }

    #[test]
    fn json_uses_camel_case_keys() {
        let cfg = BindConfig::from_json_str(
            r#"{ "modelChangeEventType": "viewmodelchange", "dispatch": "indexed" }"#,
        )
        .unwrap();
        assert_eq!(cfg.model_change_event_type.as_deref(), Some("viewmodelchange"));
        assert_eq!(cfg.dispatch, Some(DispatchMode::Indexed));
    }

    #[test]
    fn unknown_json_key_is_rejected() {
        let err = BindConfig::from_json_str(r#"{ "modelChange": "x" }"#).unwrap_err();
        assert!(matches!(err, BindError::InvalidConfig(_)));
    }

    #[cfg(feature = "policy-config")]
    #[test]
    fn toml_config() {
        let cfg = BindConfig::from_toml_str(
            "controlChangeEventType = \"input\"\ndispatch = \"per-relation\"\n",
        )
        .unwrap();
        assert_eq!(cfg.control_change_event_type.as_deref(), Some("input"));
        assert_eq!(cfg.dispatch, Some(DispatchMode::PerRelation));
    }
}
