#![forbid(unsafe_code)]

//! Declarative property binding between models and controls.
//!
//! A model (view-model) and a control (widget) both expose properties and
//! emit change events. This crate keeps named properties on the two sides in
//! sync from a list of [`BindingRelation`]s, without either side knowing about
//! the other.
//!
//! - [`bind_model_to_control`], [`bind_control_to_model`], [`dual_bind`]:
//!   wire an existing model and control from a relation list. The returned
//!   [`BindingSet`] disconnects everything when dropped.
//! - [`Bindable`]: a view-model binds itself to controls addressed by id, one
//!   relation per call.
//!
//! # Architecture
//!
//! Control changes are normalized into a single funnel event,
//! [`EventType::ViewChange`], carrying `(control id, property, value)`; model
//! side handlers filter that funnel on both id and property. Model changes are
//! already self-describing ([`PropertyChange`]) and are consumed directly.
//!
//! Propagation is synchronous. A thread-local guard records the
//! `(entity, property)` pairs being written by binding handlers and suppresses
//! nested binding writes to a pair already in flight, which stops echo loops.
//!
//! # Invariants
//!
//! 1. Handlers for one event type run in subscription order.
//! 2. A control → model write filters on control id *and* property.
//! 3. No dirty checking: every model change reaches the control, even when the
//!    value is unchanged.
//! 4. Relations are validated before any subscription is registered.
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use serde_json::json;
//! use view_binder::{BindConfig, BindingRelation, MemoryEntity, PropertyHolder, dual_bind};
//!
//! let model = Rc::new(MemoryEntity::new("form"));
//! let control = Rc::new(MemoryEntity::new("c1"));
//! let _bindings = dual_bind(
//!     &model,
//!     &control,
//!     &[BindingRelation::new("x", "val")],
//!     &BindConfig::default(),
//! )
//! .unwrap();
//!
//! control.input("val", json!("hello")).unwrap();
//! assert_eq!(model.get("x"), json!("hello"));
//!
//! model.set("x", json!("world")).unwrap();
//! assert_eq!(control.get("val"), json!("world"));
//! ```

pub mod bindable;
pub mod binder;
pub mod config;
pub mod emitter;
pub mod entity;
pub mod error;
pub mod event;
pub mod index;
pub mod memory;
pub mod propagation;
pub mod relation;
pub mod scope;

pub use bindable::{Bindable, SELF_CHANGE_EVENT, VIEW_MODEL_CHANGE_EVENT};
pub use binder::{BindMode, bind, bind_control_to_model, bind_model_to_control, dual_bind};
pub use config::{BindConfig, DispatchMode, ResolvedConfig};
pub use emitter::{EventEmitter, EventHandler, Subscription, WeakEmitter, handler};
pub use entity::{Control, ControlRegistry, Model, Observable, PropertyHolder};
pub use error::BindError;
pub use event::{DEFAULT_CHANGE_EVENT, Event, EventType, Payload, PropertyChange, Value, ViewChange};
pub use index::RelationIndex;
pub use memory::{MemoryEntity, MemoryRegistry};
pub use propagation::propagation_depth;
pub use relation::{BindingRelation, ResolvedRelation, resolve_all};
pub use scope::BindingSet;
