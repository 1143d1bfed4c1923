#![forbid(unsafe_code)]

//! Typed, single-threaded event emitter with removable subscriptions.
//!
//! Every model and control owns its own [`EventEmitter`]; there is no global
//! dispatch. Registering a handler returns a [`Subscription`] that removes the
//! handler when dropped.
//!
//! # Invariants
//!
//! 1. Handlers for one event type run in registration order.
//! 2. Handlers registered while an event is being dispatched do not see that
//!    event.
//! 3. A handler removed while an event is being dispatched does not run after
//!    its removal, even if it was registered before dispatch started.
//! 4. Handlers may re-enter the emitter (`on`, `fire`, drop a subscription)
//!    without panicking: no borrow is held while a handler runs.
//!
//! # Failure Modes
//!
//! | Failure | Behavior |
//! |---------|----------|
//! | Handler returns `Err` | Dispatch stops, error returned from `fire` |
//! | Handler panics | Propagates to the caller of `fire` |
//! | Emitter dropped before subscription | Dropping the subscription is a no-op |

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::error::BindError;
use crate::event::{Event, EventType};

/// Event handler shared between an emitter and its dispatch snapshots.
pub type EventHandler = Rc<dyn Fn(&Event) -> Result<(), BindError>>;

/// Wrap a closure as an [`EventHandler`].
pub fn handler(f: impl Fn(&Event) -> Result<(), BindError> + 'static) -> EventHandler {
    Rc::new(f)
}

struct Listener {
    id: u64,
    event_type: EventType,
    handler: EventHandler,
}

#[derive(Default)]
struct EmitterInner {
    listeners: Vec<Listener>,
    next_id: u64,
}

impl EmitterInner {
    fn contains(&self, id: u64) -> bool {
        self.listeners.iter().any(|l| l.id == id)
    }
}

/// Per-entity event emitter.
///
/// Cloning shares the listener list (like cloning an `Rc`).
#[derive(Clone, Default)]
pub struct EventEmitter {
    inner: Rc<RefCell<EmitterInner>>,
}

impl EventEmitter {
    /// Create an emitter with no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `event_type`.
    pub fn on(&self, event_type: impl Into<EventType>, handler: EventHandler) -> Subscription {
        let id = {
            let mut inner = self.inner.borrow_mut();
            let id = inner.next_id;
            inner.next_id += 1;
            inner.listeners.push(Listener {
                id,
                event_type: event_type.into(),
                handler,
            });
            id
        };
        let weak = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.borrow_mut().listeners.retain(|l| l.id != id);
            }
        })
    }

    /// Dispatch `event` to every handler registered for `event_type`.
    pub fn fire(&self, event_type: &EventType, event: &Event) -> Result<(), BindError> {
        let snapshot: Vec<(u64, EventHandler)> = self
            .inner
            .borrow()
            .listeners
            .iter()
            .filter(|l| &l.event_type == event_type)
            .map(|l| (l.id, Rc::clone(&l.handler)))
            .collect();

        for (id, handler) in snapshot {
            if !self.inner.borrow().contains(id) {
                continue;
            }
            handler(event)?;
        }
        Ok(())
    }

    /// Number of handlers registered for `event_type`.
    #[must_use]
    pub fn listener_count(&self, event_type: &EventType) -> usize {
        self.inner
            .borrow()
            .listeners
            .iter()
            .filter(|l| &l.event_type == event_type)
            .count()
    }

    /// Total number of registered handlers.
    #[must_use]
    pub fn total_listeners(&self) -> usize {
        self.inner.borrow().listeners.len()
    }

    /// A non-owning handle, for handlers that must fire on their own emitter.
    #[must_use]
    pub fn downgrade(&self) -> WeakEmitter {
        WeakEmitter {
            inner: Rc::downgrade(&self.inner),
        }
    }
}

impl fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventEmitter")
            .field("listeners", &self.total_listeners())
            .finish()
    }
}

/// Weak counterpart of [`EventEmitter`].
#[derive(Clone, Debug, Default)]
pub struct WeakEmitter {
    inner: Weak<RefCell<EmitterInner>>,
}

impl WeakEmitter {
    /// Upgrade to a strong emitter if it is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<EventEmitter> {
        self.inner.upgrade().map(|inner| EventEmitter { inner })
    }
}

/// RAII guard for a registered handler.
///
/// Dropping the subscription removes the handler. [`Subscription::detach`]
/// leaves it registered for as long as the emitter lives.
#[must_use = "dropping a subscription unregisters its handler"]
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Build a subscription from an unsubscribe callback.
    ///
    /// Foreign emitters implementing [`Observable`](crate::Observable) use this
    /// to hand out subscriptions.
    pub fn new(unsubscribe: impl FnOnce() + 'static) -> Self {
        Self {
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }

    /// Keep the handler registered permanently.
    pub fn detach(mut self) {
        self.unsubscribe = None;
    }

    /// Unregister the handler now.
    pub fn unsubscribe(mut self) {
        if let Some(f) = self.unsubscribe.take() {
            f();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(f) = self.unsubscribe.take() {
            f();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.unsubscribe.is_some())
            .finish()
    }
}
