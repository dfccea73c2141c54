//! Weak instance-to-identifier registry.
//!
//! Maps each live target to its stable [`TargetId`] without extending the
//! target's lifetime. Entries are keyed by the target's `Arc` allocation
//! address and hold only a `Weak` reference; once a target is dropped its
//! entry is dead and gets pruned opportunistically on the next mutation.
//! A dead entry whose address has been reused by a new allocation reads as
//! untracked, never as a stale identifier.

use rehydrate_core::{SavedState, TargetId};
use std::collections::HashMap;
use std::sync::{Arc, Weak};

#[derive(Default)]
pub struct IdentityRegistry {
    entries: HashMap<usize, Entry>,
}

struct Entry {
    target: Weak<dyn SavedState>,
    id: TargetId,
}

impl Entry {
    fn is_live(&self) -> bool {
        self.target.strong_count() > 0
    }
}

fn address_of(target: &Arc<dyn SavedState>) -> usize {
    Arc::as_ptr(target) as *const () as usize
}

impl IdentityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the identifier for a tracked, live target.
    pub fn resolve(&mut self, target: &Arc<dyn SavedState>) -> Option<TargetId> {
        let key = address_of(target);
        match self.entries.get(&key) {
            Some(entry) if entry.is_live() => Some(entry.id.clone()),
            Some(_) => {
                // Dead entry whose address was reused by this target.
                self.entries.remove(&key);
                None
            }
            None => None,
        }
    }

    /// Return the existing identifier for `target`, or allocate and track a
    /// fresh one.
    pub fn resolve_or_allocate(&mut self, target: &Arc<dyn SavedState>) -> TargetId {
        if let Some(id) = self.resolve(target) {
            return id;
        }
        let id = TargetId::random();
        self.track(target, id.clone());
        id
    }

    /// Associate `target` with `id`, replacing any prior association for the
    /// same instance.
    pub fn track(&mut self, target: &Arc<dyn SavedState>, id: TargetId) {
        self.prune();
        self.entries.insert(
            address_of(target),
            Entry {
                target: Arc::downgrade(target),
                id,
            },
        );
    }

    /// Remove and return the identifier for `target`, or `None` if untracked.
    pub fn untrack(&mut self, target: &Arc<dyn SavedState>) -> Option<TargetId> {
        let key = address_of(target);
        let entry = self.entries.remove(&key)?;
        if entry.is_live() {
            Some(entry.id)
        } else {
            None
        }
    }

    /// Drop every association.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Remove entries whose targets have been reclaimed.
    fn prune(&mut self) {
        self.entries.retain(|_, entry| entry.is_live());
    }

    /// Number of live tracked targets.
    pub fn len(&self) -> usize {
        self.entries.values().filter(|e| e.is_live()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
