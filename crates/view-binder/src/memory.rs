#![forbid(unsafe_code)]

//! In-memory reference entity and control registry.
//!
//! [`MemoryEntity`] implements every capability trait and can play either the
//! model or the control role. It is what the crate's own tests bind against,
//! and a starting point for adapting a real widget toolkit.
//!
//! Write behavior:
//!
//! - `set` stores the value, counts the write, and (unless the entity is
//!   [`silent`](MemoryEntity::silent)) fires its change event carrying a
//!   [`PropertyChange`](crate::PropertyChange). There is no dirty checking:
//!   writing the current value fires again.
//! - `input` simulates a user edit on a control: the value is stored without
//!   counting as a write, then the native event fires with an empty payload.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use ahash::{AHashMap, AHashSet};

use crate::emitter::{EventEmitter, EventHandler, Subscription};
use crate::entity::{Control, ControlRegistry, Observable, PropertyHolder};
use crate::error::BindError;
use crate::event::{Event, EventType, Value};

/// Property bag with its own event emitter.
pub struct MemoryEntity {
    id: String,
    props: RefCell<AHashMap<String, Value>>,
    read_only: RefCell<AHashSet<String>>,
    events: EventEmitter,
    change_event: Option<EventType>,
    writes: RefCell<AHashMap<String, usize>>,
    total_writes: Cell<usize>,
}

impl MemoryEntity {
    /// Create an entity that fires `"change"` on every write.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            props: RefCell::new(AHashMap::new()),
            read_only: RefCell::new(AHashSet::new()),
            events: EventEmitter::new(),
            change_event: Some(EventType::change()),
            writes: RefCell::new(AHashMap::new()),
            total_writes: Cell::new(0),
        }
    }

    /// Fire `event_type` instead of `"change"` on writes.
    #[must_use]
    pub fn with_change_event(mut self, event_type: impl Into<EventType>) -> Self {
        self.change_event = Some(event_type.into());
        self
    }

    /// Do not fire any event on writes.
    #[must_use]
    pub fn silent(mut self) -> Self {
        self.change_event = None;
        self
    }

    /// Seed a property without firing or counting a write.
    #[must_use]
    pub fn with_property(self, property: impl Into<String>, value: Value) -> Self {
        self.props.borrow_mut().insert(property.into(), value);
        self
    }

    /// Make `property` reject writes with [`BindError::PropertyWrite`].
    #[must_use]
    pub fn with_read_only(self, property: impl Into<String>) -> Self {
        self.read_only.borrow_mut().insert(property.into());
        self
    }

    /// Simulate a user edit and fire the native `"change"` event.
    pub fn input(&self, property: &str, value: Value) -> Result<(), BindError> {
        self.input_with(property, value, EventType::change())
    }

    /// Simulate a user edit and fire `event_type`.
    pub fn input_with(
        &self,
        property: &str,
        value: Value,
        event_type: impl Into<EventType>,
    ) -> Result<(), BindError> {
        self.props.borrow_mut().insert(property.to_owned(), value);
        let event = Event::empty().from_source(self.id.clone());
        self.events.fire(&event_type.into(), &event)
    }

    /// Number of `set` calls that targeted `property`.
    #[must_use]
    pub fn writes_to(&self, property: &str) -> usize {
        self.writes.borrow().get(property).copied().unwrap_or(0)
    }

    /// Number of `set` calls on any property.
    #[must_use]
    pub fn total_writes(&self) -> usize {
        self.total_writes.get()
    }

    /// The entity's emitter.
    #[must_use]
    pub fn events(&self) -> &EventEmitter {
        &self.events
    }
}

impl Observable for MemoryEntity {
    fn on(&self, event_type: EventType, handler: EventHandler) -> Subscription {
        self.events.on(event_type, handler)
    }

    fn fire(&self, event_type: &EventType, event: &Event) -> Result<(), BindError> {
        self.events.fire(event_type, event)
    }
}

impl PropertyHolder for MemoryEntity {
    fn get(&self, property: &str) -> Value {
        self.props
            .borrow()
            .get(property)
            .cloned()
            .unwrap_or(Value::Null)
    }

    fn set(&self, property: &str, value: Value) -> Result<(), BindError> {
        if self.read_only.borrow().contains(property) {
            return Err(BindError::PropertyWrite {
                entity: self.id.clone(),
                property: property.to_owned(),
                reason: "property is read-only".to_owned(),
            });
        }

        let old_value = self
            .props
            .borrow_mut()
            .insert(property.to_owned(), value.clone())
            .unwrap_or(Value::Null);
        *self
            .writes
            .borrow_mut()
            .entry(property.to_owned())
            .or_default() += 1;
        self.total_writes.set(self.total_writes.get() + 1);

        match &self.change_event {
            Some(event_type) => {
                let event = Event::change(property, old_value, value).from_source(self.id.clone());
                self.events.fire(event_type, &event)
            }
            None => Ok(()),
        }
    }
}

impl Control for MemoryEntity {
    fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Debug for MemoryEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryEntity")
            .field("id", &self.id)
            .field("properties", &self.props.borrow().len())
            .field("total_writes", &self.total_writes.get())
            .finish()
    }
}

/// Control lookup table keyed by control id.
#[derive(Default)]
pub struct MemoryRegistry {
    controls: RefCell<AHashMap<String, Rc<dyn Control>>>,
}

impl MemoryRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `control` under its own id, replacing any previous entry.
    pub fn register(&self, control: Rc<dyn Control>) {
        self.controls
            .borrow_mut()
            .insert(control.id().to_owned(), control);
    }

    /// Remove the control registered as `control_id`.
    pub fn remove(&self, control_id: &str) -> Option<Rc<dyn Control>> {
        self.controls.borrow_mut().remove(control_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.controls.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.controls.borrow().is_empty()
    }
}

impl ControlRegistry for MemoryRegistry {
    fn get_safely(&self, control_id: &str) -> Result<Rc<dyn Control>, BindError> {
        self.controls
            .borrow()
            .get(control_id)
            .cloned()
            .ok_or_else(|| BindError::ControlNotFound(control_id.to_owned()))
    }
}

impl fmt::Debug for MemoryRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryRegistry")
            .field("controls", &self.len())
            .finish()
    }
}
