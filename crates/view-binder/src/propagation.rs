#![forbid(unsafe_code)]

//! Re-entrancy guard for binding writes.
//!
//! Propagation is synchronous: a binding handler's `set` fires the target's
//! change event, which can run other binding handlers before `set` returns.
//! While a handler writes, its source and target `(entity, property)` pairs
//! are recorded in a thread-local turn. A nested binding write whose target is
//! already in the turn is suppressed, which stops the immediate echo
//! (control → model → same control) and longer cycles through other relations.
//!
//! # Invariants
//!
//! 1. A write is suppressed only while an enclosing binding write on the same
//!    `(entity, property)` is still on the stack.
//! 2. Writes issued outside any binding handler are never suppressed, so
//!    writing the same value twice reaches the other side twice.
//! 3. Entries are popped on scope exit, including on error and panic.

use std::cell::RefCell;

use tracing::trace;

use crate::error::BindError;

thread_local! {
    static ACTIVE: RefCell<Vec<(usize, String)>> = const { RefCell::new(Vec::new()) };
}

/// One side of a binding write.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Endpoint<'a> {
    pub entity: usize,
    pub property: &'a str,
}

impl<'a> Endpoint<'a> {
    pub(crate) fn new(entity: usize, property: &'a str) -> Self {
        Self { entity, property }
    }

    pub(crate) fn is_active(self) -> bool {
        ACTIVE.with(|active| {
            active
                .borrow()
                .iter()
                .any(|(e, p)| *e == self.entity && p == self.property)
        })
    }
}

struct TurnGuard {
    pushed: usize,
}

impl TurnGuard {
    fn enter(endpoints: &[Endpoint<'_>]) -> Self {
        ACTIVE.with(|active| {
            let mut active = active.borrow_mut();
            for ep in endpoints {
                active.push((ep.entity, ep.property.to_owned()));
            }
        });
        Self {
            pushed: endpoints.len(),
        }
    }
}

impl Drop for TurnGuard {
    fn drop(&mut self) {
        ACTIVE.with(|active| {
            let mut active = active.borrow_mut();
            let keep = active.len().saturating_sub(self.pushed);
            active.truncate(keep);
        });
    }
}

/// Run `write` unless `target` is already being written in this turn.
///
/// Returns `Ok(false)` when the write was suppressed.
pub(crate) fn propagate(
    source: Endpoint<'_>,
    target: Endpoint<'_>,
    write: impl FnOnce() -> Result<(), BindError>,
) -> Result<bool, BindError> {
    if target.is_active() {
        trace!(property = target.property, "suppressed echo write");
        return Ok(false);
    }
    let _turn = TurnGuard::enter(&[source, target]);
    write()?;
    Ok(true)
}

/// Number of `(entity, property)` pairs in the current propagation turn.
///
/// Zero whenever no binding write is in progress on this thread.
#[must_use]
pub fn propagation_depth() -> usize {
    ACTIVE.with(|active| active.borrow().len())
}
