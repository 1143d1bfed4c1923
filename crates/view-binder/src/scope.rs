#![forbid(unsafe_code)]

//! Lifetime handle for the subscriptions created by one bind call.

use std::fmt;

use crate::emitter::Subscription;

/// Subscriptions wired by a bind call.
///
/// Dropping the set disconnects every relation it wired. Call
/// [`detach`](Self::detach) to keep the relations alive for as long as the
/// model and control emitters live instead.
///
/// # Invariants
///
/// 1. Subscriptions are released in reverse registration order on drop.
/// 2. After drop or [`clear`](Self::clear), no handler from this set fires.
/// 3. `subscription_count` always equals the number of held subscriptions.
#[must_use = "dropping a BindingSet disconnects its bindings; call detach() to keep them"]
#[derive(Default)]
pub struct BindingSet {
    subscriptions: Vec<Subscription>,
    relation_count: usize,
}

impl BindingSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_relations(relation_count: usize) -> Self {
        Self {
            subscriptions: Vec::new(),
            relation_count,
        }
    }

    /// Take ownership of `sub` for the lifetime of this set.
    pub fn hold(&mut self, sub: Subscription) {
        self.subscriptions.push(sub);
    }

    /// Number of relations wired through this set.
    #[must_use]
    pub fn relation_count(&self) -> usize {
        self.relation_count
    }

    /// Number of held subscriptions.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Disconnect everything now; the set stays usable.
    pub fn clear(&mut self) {
        while let Some(sub) = self.subscriptions.pop() {
            sub.unsubscribe();
        }
        self.relation_count = 0;
    }

    /// Leave every subscription registered permanently.
    pub fn detach(mut self) {
        for sub in self.subscriptions.drain(..) {
            sub.detach();
        }
    }
}

impl Drop for BindingSet {
    fn drop(&mut self) {
        self.clear();
    }
}

impl fmt::Debug for BindingSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingSet")
            .field("relation_count", &self.relation_count)
            .field("subscription_count", &self.subscriptions.len())
            .finish()
    }
}
