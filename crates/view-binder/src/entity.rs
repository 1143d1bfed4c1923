#![forbid(unsafe_code)]

//! Capability traits every model and control must satisfy.
//!
//! The binder never stores or emits property values itself; it only talks to
//! these traits. Entities take `&self` everywhere because they are shared
//! (`Rc`) between the application and the binder's handlers and are mutated
//! from inside event handlers.

use std::rc::Rc;

use crate::emitter::{EventHandler, Subscription};
use crate::error::BindError;
use crate::event::{Event, EventType, Payload, Value};

/// Event-emitting side of an entity.
pub trait Observable {
    /// Register `handler` for `event_type`.
    fn on(&self, event_type: EventType, handler: EventHandler) -> Subscription;

    /// Emit `event` to the handlers registered for `event_type`.
    fn fire(&self, event_type: &EventType, event: &Event) -> Result<(), BindError>;

    /// Re-emit `payload` on this entity as `event_type`, attributed to `source`.
    fn delegate(
        &self,
        source: Option<&str>,
        event_type: &EventType,
        payload: Payload,
    ) -> Result<(), BindError> {
        let event = Event {
            source: source.map(str::to_owned),
            payload,
        };
        self.fire(event_type, &event)
    }
}

/// Property storage side of an entity.
pub trait PropertyHolder {
    /// Current value of `property`; `Value::Null` when unset.
    fn get(&self, property: &str) -> Value;

    /// Write `value` into `property`.
    ///
    /// Models are expected to fire their change event from here; keeping
    /// their own state consistent is the entity's job, not the binder's.
    fn set(&self, property: &str, value: Value) -> Result<(), BindError>;
}

/// Data-holding side of a binding.
pub trait Model: Observable + PropertyHolder {}

impl<T: Observable + PropertyHolder + ?Sized> Model for T {}

/// UI-widget side of a binding.
pub trait Control: Observable + PropertyHolder {
    /// Stable control id, used to filter view-change events.
    fn id(&self) -> &str;
}

/// Id-based control lookup used by [`Bindable`](crate::Bindable).
pub trait ControlRegistry {
    /// Resolve `control_id`, failing when it is unknown.
    fn get_safely(&self, control_id: &str) -> Result<Rc<dyn Control>, BindError>;
}

/// Identity of a shared entity, used by the propagation guard.
pub(crate) fn entity_key<T: ?Sized>(entity: &Rc<T>) -> usize {
    Rc::as_ptr(entity).cast::<()>() as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryEntity;

    #[test]
    fn delegate_attributes_source() {
        let control = MemoryEntity::new("c1");
        let seen = Rc::new(std::cell::RefCell::new(None));
        let s = Rc::clone(&seen);
        let _sub = control.on(
            EventType::ViewChange,
            crate::emitter::handler(move |ev| {
                *s.borrow_mut() = ev.source.clone();
                Ok(())
            }),
        );
        control
            .delegate(Some("c1"), &EventType::ViewChange, Payload::Empty)
            .unwrap();
        assert_eq!(seen.borrow().as_deref(), Some("c1"));
    }

    #[test]
    fn entity_key_is_stable_across_clones_and_coercions() {
        let a = Rc::new(MemoryEntity::new("a"));
        let b = Rc::new(MemoryEntity::new("b"));
        let a_dyn: Rc<dyn Control> = a.clone();
        assert_eq!(entity_key(&a), entity_key(&a.clone()));
        assert_eq!(entity_key(&a), entity_key(&a_dyn));
        assert_ne!(entity_key(&a), entity_key(&b));
    }
}
