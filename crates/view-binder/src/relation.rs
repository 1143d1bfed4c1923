#![forbid(unsafe_code)]

//! Declarative binding relations and their validated form.
//!
//! A [`BindingRelation`] pairs a model property (`name`) with a control
//! property (`property`) and may override the event types used on either
//! side. Relations are validated eagerly: a bind call with one malformed
//! relation fails before any subscription is registered.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ResolvedConfig;
use crate::error::BindError;
use crate::event::EventType;

/// One model-property ↔ control-property pairing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct BindingRelation {
    /// Model property key.
    pub name: Option<String>,
    /// Control property key.
    pub property: Option<String>,
    /// Control event type for this relation, overriding the configured default.
    pub property_change_event_type: Option<String>,
    /// Model event type for this relation, overriding the configured default.
    pub name_change_event_type: Option<String>,
}

impl BindingRelation {
    /// Relate model property `name` to control property `property`.
    #[must_use]
    pub fn new(name: impl Into<String>, property: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            property: Some(property.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn property_change_event_type(mut self, event_type: impl Into<String>) -> Self {
        self.property_change_event_type = Some(event_type.into());
        self
    }

    #[must_use]
    pub fn name_change_event_type(mut self, event_type: impl Into<String>) -> Self {
        self.name_change_event_type = Some(event_type.into());
        self
    }

    /// Parse a JSON array of relations.
    pub fn list_from_json(input: &str) -> Result<Vec<Self>, BindError> {
        Ok(serde_json::from_str(input)?)
    }

    /// Validate this relation (at position `index`) against `config`.
    pub fn resolve(
        &self,
        index: usize,
        config: &ResolvedConfig,
    ) -> Result<ResolvedRelation, BindError> {
        let name = required(self.name.as_deref(), index, "name")?;
        let property = required(self.property.as_deref(), index, "property")?;
        let control_event = self
            .property_change_event_type
            .clone()
            .unwrap_or_else(|| config.control_change_event_type.clone());
        let model_event = self
            .name_change_event_type
            .clone()
            .unwrap_or_else(|| config.model_change_event_type.clone());

        Ok(ResolvedRelation {
            name: name.to_owned(),
            property: property.to_owned(),
            control_event: EventType::Named(control_event),
            model_event: EventType::Named(model_event),
        })
    }
}

fn required<'a>(
    value: Option<&'a str>,
    index: usize,
    field: &'static str,
) -> Result<&'a str, BindError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(BindError::missing(index, field)),
    }
}

/// A validated relation with event types filled in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedRelation {
    pub name: String,
    pub property: String,
    /// Native control event that triggers control → model sync.
    pub control_event: EventType,
    /// Native model event that triggers model → control sync.
    pub model_event: EventType,
}

/// Validate every relation, failing on the first malformed one.
///
/// Relations that bind one control property to different model properties
/// are accepted but reported, since they make the model side order-dependent.
pub fn resolve_all(
    relations: &[BindingRelation],
    config: &ResolvedConfig,
) -> Result<Vec<ResolvedRelation>, BindError> {
    let resolved = relations
        .iter()
        .enumerate()
        .map(|(index, relation)| relation.resolve(index, config))
        .collect::<Result<Vec<_>, _>>()?;

    for (i, a) in resolved.iter().enumerate() {
        if let Some(b) = resolved[i + 1..]
            .iter()
            .find(|b| b.property == a.property && b.name != a.name)
        {
            debug!(
                property = %a.property,
                first = %a.name,
                second = %b.name,
                "control property bound to more than one model property"
            );
        }
    }

    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_uses_config_defaults() {
        let cfg = ResolvedConfig::default();
        let r = BindingRelation::new("x", "val").resolve(0, &cfg).unwrap();
        assert_eq!(r.control_event, EventType::change());
        assert_eq!(r.model_event, EventType::change());
    }

    #[test]
    fn relation_overrides_win() {
        let cfg = ResolvedConfig::default();
        let r = BindingRelation::new("x", "val")
            .property_change_event_type("input")
            .name_change_event_type("viewmodelchange")
            .resolve(0, &cfg)
            .unwrap();
        assert_eq!(r.control_event, EventType::from("input"));
        assert_eq!(r.model_event, EventType::from("viewmodelchange"));
    }

    #[test]
    fn missing_fields_are_named() {
        let cfg = ResolvedConfig::default();
        let no_name = BindingRelation {
            property: Some("val".into()),
            ..BindingRelation::default()
        };
        assert_eq!(
            no_name.resolve(3, &cfg).unwrap_err(),
            BindError::missing(3, "name")
        );

        let empty_property = BindingRelation::new("x", "");
        assert_eq!(
            empty_property.resolve(0, &cfg).unwrap_err(),
            BindError::missing(0, "property")
        );
    }

    #[test]
    fn resolve_all_reports_first_bad_index() {
        let cfg = ResolvedConfig::default();
        let relations = vec![
            BindingRelation::new("a", "p"),
            BindingRelation::new("b", "q"),
            BindingRelation::default(),
        ];
        assert_eq!(
            resolve_all(&relations, &cfg).unwrap_err(),
            BindError::missing(2, "name")
        );
    }

    #[test]
    fn relations_parse_from_json() {
        let relations = BindingRelation::list_from_json(
            r#"[
                { "name": "x", "property": "val" },
                { "name": "y", "property": "checked", "propertyChangeEventType": "click" }
            ]"#,
        )
        .unwrap();
        assert_eq!(relations.len(), 2);
        assert_eq!(relations[1].property_change_event_type.as_deref(), Some("click"));
    }
}
