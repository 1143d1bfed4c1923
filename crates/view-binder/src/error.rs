#![forbid(unsafe_code)]

//! Error type shared by the binder, the emitter, and entity implementations.

use thiserror::Error;

/// Errors raised while wiring or propagating bindings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    /// A binding relation (or embedded bind call) is missing a required key.
    ///
    /// `index` is the position of the offending relation in the list passed to
    /// the bind call; it is `0` for single-relation embedded calls.
    #[error("binding relation #{index} is missing required field `{field}`")]
    Configuration { index: usize, field: &'static str },

    /// An entity refused a property write.
    #[error("cannot write property `{property}` on `{entity}`: {reason}")]
    PropertyWrite {
        entity: String,
        property: String,
        reason: String,
    },

    /// A control id could not be resolved by a registry.
    #[error("control not found: {0}")]
    ControlNotFound(String),

    /// A configuration or relation document could not be parsed.
    #[error("invalid binding config: {0}")]
    InvalidConfig(String),
}

impl BindError {
    /// Shorthand for a missing-field configuration error.
    #[must_use]
    pub fn missing(index: usize, field: &'static str) -> Self {
        Self::Configuration { index, field }
    }
}

impl From<serde_json::Error> for BindError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidConfig(err.to_string())
    }
}

#[cfg(feature = "policy-config")]
impl From<toml::de::Error> for BindError {
    fn from(err: toml::de::Error) -> Self {
        Self::InvalidConfig(err.to_string())
    }
}
