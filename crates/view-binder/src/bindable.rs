#![forbid(unsafe_code)]

//! Embedded binder: a view-model that binds itself to controls by id.
//!
//! [`Bindable`] is attached to a view-model by composition. It owns an event
//! bus of its own (the view-model's `"change"` stream) and resolves controls
//! through a [`ControlRegistry`] whenever it needs one, so controls can be
//! created or replaced after the binding is declared.
//!
//! ```
//! use std::rc::Rc;
//! use serde_json::json;
//! use view_binder::{Bindable, MemoryEntity, MemoryRegistry, PropertyHolder};
//!
//! let model = Rc::new(MemoryEntity::new("vm").with_change_event("viewmodelchange"));
//! let controls = Rc::new(MemoryRegistry::new());
//! let input = Rc::new(MemoryEntity::new("title-input"));
//! controls.register(input.clone());
//!
//! let vm = Bindable::new(model.clone(), controls);
//! vm.dual_bind("title", "title-input", "value", None).unwrap();
//!
//! input.input("value", json!("Draft")).unwrap();
//! assert_eq!(model.get("title"), json!("Draft"));
//!
//! model.set("title", json!("Final")).unwrap();
//! assert_eq!(input.get("value"), json!("Final"));
//! ```
//!
//! # Invariants
//!
//! 1. Each relation is one `(name, control id, control property)` triple; there
//!    is no bulk form.
//! 2. `single_bind` looks the control up on every model change; a control
//!    missing at that moment surfaces as the registry's error from the
//!    model's `fire`, except while the model is being written from that
//!    same control's edit.
//! 3. Edits on an observed control reach the model whether or not the control
//!    is still registered.
//! 4. `unbind` drops every subscription registered for the control address.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use ahash::AHashMap;
use tracing::{debug, trace};

use crate::emitter::{EventEmitter, EventHandler, Subscription, handler};
use crate::entity::{ControlRegistry, Model, entity_key};
use crate::error::BindError;
use crate::event::{DEFAULT_CHANGE_EVENT, Event, EventType, Payload, ViewChange};
use crate::propagation::{Endpoint, propagate};

/// Event the bound model emits when one of its properties changes.
pub const VIEW_MODEL_CHANGE_EVENT: &str = "viewmodelchange";

/// Event the bindable fires on its own bus for observed control changes.
pub const SELF_CHANGE_EVENT: &str = "change";

type Address = (String, String);

/// Self-binding capability for a view-model.
pub struct Bindable<M: ?Sized, R: ?Sized> {
    model: Rc<M>,
    controls: Rc<R>,
    events: EventEmitter,
    bindings: RefCell<AHashMap<Address, Vec<Subscription>>>,
}

impl<M, R> Bindable<M, R>
where
    M: Model + ?Sized + 'static,
    R: ControlRegistry + ?Sized + 'static,
{
    /// Attach to `model`, resolving controls through `controls`.
    pub fn new(model: Rc<M>, controls: Rc<R>) -> Self {
        Self {
            model,
            controls,
            events: EventEmitter::new(),
            bindings: RefCell::new(AHashMap::new()),
        }
    }

    /// Subscribe to the bindable's own bus.
    pub fn on(&self, event_type: impl Into<EventType>, handler: EventHandler) -> Subscription {
        self.events.on(event_type, handler)
    }

    /// Re-fire `control_id`'s `event_type` as a `"change"` on this bindable,
    /// carrying the control's current `control_property` value.
    pub fn observe_control(
        &self,
        control_id: &str,
        control_property: &str,
        event_type: impl Into<EventType>,
    ) -> Result<(), BindError> {
        self.observe(control_id, control_property, event_type.into()).map(|_| ())
    }

    /// Write model property `name` into the control whenever the model
    /// reports a change to it.
    pub fn single_bind(
        &self,
        name: &str,
        control_id: &str,
        control_property: &str,
    ) -> Result<(), BindError> {
        self.bind_to_control(name, control_id, control_property, None)
    }

    /// Bind model property `name` and the control property in both
    /// directions. `event_type` defaults to `"change"`.
    pub fn dual_bind(
        &self,
        name: &str,
        control_id: &str,
        control_property: &str,
        event_type: Option<&str>,
    ) -> Result<(), BindError> {
        check_name(name)?;
        check_address(control_id, control_property)?;

        let control_key = self.observe(
            control_id,
            control_property,
            EventType::named(event_type.unwrap_or(DEFAULT_CHANGE_EVENT)),
        )?;

        let weak_model = Rc::downgrade(&self.model);
        let model_key = entity_key(&self.model);
        let name_owned = name.to_owned();
        let id = control_id.to_owned();
        let property = control_property.to_owned();
        let sub = self.events.on(
            SELF_CHANGE_EVENT,
            handler(move |event| {
                let Some(change) = event.as_view_change() else {
                    return Ok(());
                };
                if change.control_id != id || change.property != property {
                    return Ok(());
                }
                let Some(model) = weak_model.upgrade() else {
                    return Ok(());
                };
                propagate(
                    Endpoint::new(control_key, &property),
                    Endpoint::new(model_key, &name_owned),
                    || {
                        trace!(
                            control = %id,
                            property = %property,
                            model_property = %name_owned,
                            "control -> view-model"
                        );
                        model.set(&name_owned, change.new_value.clone())
                    },
                )
                .map(|_| ())
            }),
        );
        self.hold(control_id, control_property, sub);

        self.bind_to_control(name, control_id, control_property, Some(control_key))
    }

    /// Drop every subscription registered for `control_id`/`control_property`.
    ///
    /// Returns the number of subscriptions released.
    pub fn unbind(&self, control_id: &str, control_property: &str) -> usize {
        let removed = self
            .bindings
            .borrow_mut()
            .remove(&(control_id.to_owned(), control_property.to_owned()));
        let count = removed.as_ref().map_or(0, Vec::len);
        drop(removed);
        debug!(control = control_id, property = control_property, count, "unbind");
        count
    }

    /// Number of subscriptions currently held.
    #[must_use]
    pub fn binding_count(&self) -> usize {
        self.bindings.borrow().values().map(Vec::len).sum()
    }

    /// Subscribe to the control's native event and return its entity key.
    fn observe(
        &self,
        control_id: &str,
        control_property: &str,
        event_type: EventType,
    ) -> Result<usize, BindError> {
        check_address(control_id, control_property)?;
        let control = self.controls.get_safely(control_id)?;
        let control_key = entity_key(&control);

        let weak_control = Rc::downgrade(&control);
        let weak_events = self.events.downgrade();
        let id = control_id.to_owned();
        let property = control_property.to_owned();
        let sub = control.on(
            event_type,
            handler(move |_event| {
                let (Some(control), Some(events)) = (weak_control.upgrade(), weak_events.upgrade())
                else {
                    return Ok(());
                };
                let change = ViewChange {
                    control_id: id.clone(),
                    property: property.clone(),
                    new_value: control.get(&property),
                };
                let event = Event {
                    source: Some(id.clone()),
                    payload: Payload::ViewChange(change),
                };
                events.fire(&EventType::named(SELF_CHANGE_EVENT), &event)
            }),
        );
        self.hold(control_id, control_property, sub);
        Ok(control_key)
    }

    /// Model → control half. `observed` is the key of the control whose edits
    /// feed the model for this address; while one of its edits is being
    /// written, a control missing from the registry is not an error.
    fn bind_to_control(
        &self,
        name: &str,
        control_id: &str,
        control_property: &str,
        observed: Option<usize>,
    ) -> Result<(), BindError> {
        check_name(name)?;
        check_address(control_id, control_property)?;

        let model_key = entity_key(&self.model);
        let weak_controls = Rc::downgrade(&self.controls);
        let name_owned = name.to_owned();
        let id = control_id.to_owned();
        let property = control_property.to_owned();
        let sub = self.model.on(
            EventType::named(VIEW_MODEL_CHANGE_EVENT),
            handler(move |event| {
                let Some(change) = event.as_change() else {
                    return Ok(());
                };
                if change.name != name_owned {
                    return Ok(());
                }
                let Some(controls) = weak_controls.upgrade() else {
                    return Ok(());
                };
                let echo = observed.is_some_and(|key| Endpoint::new(key, &property).is_active());
                let control = match controls.get_safely(&id) {
                    Ok(control) => control,
                    Err(_) if echo => {
                        trace!(control = %id, property = %property, "unregistered control, echo skipped");
                        return Ok(());
                    }
                    Err(err) => return Err(err),
                };
                propagate(
                    Endpoint::new(model_key, &name_owned),
                    Endpoint::new(entity_key(&control), &property),
                    || {
                        trace!(
                            control = %id,
                            model_property = %name_owned,
                            property = %property,
                            "view-model -> control"
                        );
                        control.set(&property, change.new_value.clone())
                    },
                )
                .map(|_| ())
            }),
        );
        self.hold(control_id, control_property, sub);
        debug!(
            model_property = name,
            control = control_id,
            property = control_property,
            "single bind"
        );
        Ok(())
    }

    fn hold(&self, control_id: &str, control_property: &str, sub: Subscription) {
        self.bindings
            .borrow_mut()
            .entry((control_id.to_owned(), control_property.to_owned()))
            .or_default()
            .push(sub);
    }
}

fn check_name(name: &str) -> Result<(), BindError> {
    if name.is_empty() {
        return Err(BindError::missing(0, "name"));
    }
    Ok(())
}

fn check_address(control_id: &str, control_property: &str) -> Result<(), BindError> {
    if control_id.is_empty() {
        return Err(BindError::missing(0, "control_id"));
    }
    if control_property.is_empty() {
        return Err(BindError::missing(0, "control_property"));
    }
    Ok(())
}

impl<M: ?Sized, R: ?Sized> fmt::Debug for Bindable<M, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bindable")
            .field("addresses", &self.bindings.borrow().len())
            .field("events", &self.events)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::PropertyHolder;
    use crate::memory::{MemoryEntity, MemoryRegistry};
    use serde_json::json;

    fn setup() -> (Rc<MemoryEntity>, Rc<MemoryEntity>, Bindable<MemoryEntity, MemoryRegistry>) {
        let model = Rc::new(MemoryEntity::new("vm").with_change_event(VIEW_MODEL_CHANGE_EVENT));
        let control = Rc::new(MemoryEntity::new("c1"));
        let registry = Rc::new(MemoryRegistry::new());
        registry.register(control.clone());
        let vm = Bindable::new(Rc::clone(&model), registry);
        (model, control, vm)
    }

    #[test]
    fn observe_control_fires_self_change() {
        let (_model, control, vm) = setup();
        vm.observe_control("c1", "val", "input").unwrap();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let _sub = vm.on(
            SELF_CHANGE_EVENT,
            handler(move |ev| {
                s.borrow_mut().push(ev.as_view_change().cloned());
                Ok(())
            }),
        );

        control.input_with("val", json!(7), "input").unwrap();
        let seen = seen.borrow();
        let change = seen[0].as_ref().unwrap();
        assert_eq!(change.control_id, "c1");
        assert_eq!(change.property, "val");
        assert_eq!(change.new_value, json!(7));
    }

    #[test]
    fn observe_unknown_control_fails() {
        let (_model, _control, vm) = setup();
        assert_eq!(
            vm.observe_control("ghost", "val", "change").unwrap_err(),
            BindError::ControlNotFound("ghost".into())
        );
        assert_eq!(vm.binding_count(), 0);
    }

    #[test]
    fn single_bind_is_one_way() {
        let (model, control, vm) = setup();
        vm.single_bind("x", "c1", "val").unwrap();

        model.set("x", json!("down")).unwrap();
        assert_eq!(control.get("val"), json!("down"));

        control.input("val", json!("up")).unwrap();
        assert_eq!(model.get("x"), json!("down"));
    }

    #[test]
    fn single_bind_resolves_control_lazily() {
        let model = Rc::new(MemoryEntity::new("vm").with_change_event(VIEW_MODEL_CHANGE_EVENT));
        let registry = Rc::new(MemoryRegistry::new());
        let vm = Bindable::new(Rc::clone(&model), Rc::clone(&registry));
        vm.single_bind("x", "late", "val").unwrap();

        let err = model.set("x", json!(1)).unwrap_err();
        assert_eq!(err, BindError::ControlNotFound("late".into()));

        let control = Rc::new(MemoryEntity::new("late"));
        registry.register(control.clone());
        model.set("x", json!(2)).unwrap();
        assert_eq!(control.get("val"), json!(2));
    }

    #[test]
    fn empty_arguments_are_rejected() {
        let (_model, _control, vm) = setup();
        assert_eq!(
            vm.dual_bind("", "c1", "val", None).unwrap_err(),
            BindError::missing(0, "name")
        );
        assert_eq!(
            vm.single_bind("x", "", "val").unwrap_err(),
            BindError::missing(0, "control_id")
        );
        assert_eq!(
            vm.observe_control("c1", "", "change").unwrap_err(),
            BindError::missing(0, "control_property")
        );
        assert_eq!(vm.binding_count(), 0);
    }

    #[test]
    fn unbind_releases_address() {
        let (model, control, vm) = setup();
        vm.dual_bind("x", "c1", "val", None).unwrap();
        assert_eq!(vm.binding_count(), 3);

        assert_eq!(vm.unbind("c1", "val"), 3);
        assert_eq!(vm.binding_count(), 0);
        assert_eq!(vm.unbind("c1", "val"), 0);

        control.input("val", json!("ignored")).unwrap();
        assert_eq!(model.get("x"), serde_json::Value::Null);
        model.set("x", json!("also ignored")).unwrap();
        assert_eq!(control.get("val"), json!("ignored"));
    }
}
