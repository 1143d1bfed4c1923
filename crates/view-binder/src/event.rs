#![forbid(unsafe_code)]

//! Event vocabulary exchanged between models, controls, and the binder.
//!
//! Native events are addressed by name (`"change"`, `"input"`, ...). The
//! binder's own funnel event, [`EventType::ViewChange`], is a separate variant
//! so it can never collide with a name a widget library happens to emit.

use std::fmt;

/// Dynamic property value.
pub type Value = serde_json::Value;

/// Default native event type for both models and controls.
pub const DEFAULT_CHANGE_EVENT: &str = "change";

/// Identifies a stream of events on an emitter.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum EventType {
    /// A native event type emitted by a model or control.
    Named(String),
    /// The unified view-change funnel.
    ///
    /// Control observers re-emit native change notifications under this type
    /// so model-side filters see one shape regardless of the control's own
    /// event taxonomy.
    ViewChange,
}

impl EventType {
    /// Create a named event type.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// The default `"change"` event type.
    #[must_use]
    pub fn change() -> Self {
        Self::named(DEFAULT_CHANGE_EVENT)
    }
}

impl From<&str> for EventType {
    fn from(name: &str) -> Self {
        Self::Named(name.to_owned())
    }
}

impl From<String> for EventType {
    fn from(name: String) -> Self {
        Self::Named(name)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name),
            Self::ViewChange => f.write_str("<view-change>"),
        }
    }
}

/// A model property change notification.
#[derive(Clone, Debug, PartialEq)]
pub struct PropertyChange {
    /// Model property key.
    pub name: String,
    /// Value before the write (`Null` when previously unset).
    pub old_value: Value,
    /// Value after the write.
    pub new_value: Value,
}

/// Normalized control change carried by the funnel event.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewChange {
    pub control_id: String,
    pub property: String,
    pub new_value: Value,
}

/// Event body.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Payload {
    /// Native event with no binder-relevant body (e.g. a widget `"input"`).
    #[default]
    Empty,
    Change(PropertyChange),
    ViewChange(ViewChange),
}

/// An event as delivered to handlers.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Event {
    /// Id of the entity the event is attributed to, when known.
    pub source: Option<String>,
    pub payload: Payload,
}

impl Event {
    /// An event with no payload.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Attribute this event to `source`.
    #[must_use]
    pub fn from_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// A model change event.
    #[must_use]
    pub fn change(name: impl Into<String>, old_value: Value, new_value: Value) -> Self {
        Self {
            source: None,
            payload: Payload::Change(PropertyChange {
                name: name.into(),
                old_value,
                new_value,
            }),
        }
    }

    /// The model change carried by this event, if any.
    #[must_use]
    pub fn as_change(&self) -> Option<&PropertyChange> {
        match &self.payload {
            Payload::Change(change) => Some(change),
            _ => None,
        }
    }

    /// The view change carried by this event, if any.
    #[must_use]
    pub fn as_view_change(&self) -> Option<&ViewChange> {
        match &self.payload {
            Payload::ViewChange(change) => Some(change),
            _ => None,
        }
    }
}
