//! Deduplicating set of objects awaiting recomputation.

use std::collections::{HashSet, VecDeque};

use crate::collab::ObjectId;

/// Objects pending a recompute.
///
/// Set semantics: inserting an object that is already pending is a no-op, so
/// an object is recomputed at most once per drain no matter how many events
/// targeted it. Drain order is insertion order, which keeps output stable;
/// callers must not rely on it for correctness.
#[derive(Debug, Clone, Default)]
pub struct DirtySet {
    order: VecDeque<ObjectId>,
    members: HashSet<ObjectId>,
}

impl DirtySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `id` dirty. Returns true if it was not already pending.
    pub fn insert(&mut self, id: ObjectId) -> bool {
        if self.members.insert(id) {
            self.order.push_back(id);
            true
        } else {
            false
        }
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.members.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Take the oldest pending object.
    pub fn pop(&mut self) -> Option<ObjectId> {
        let id = self.order.pop_front()?;
        self.members.remove(&id);
        Some(id)
    }

    /// Take up to `limit` objects; `None` takes everything.
    ///
    /// Objects left behind stay pending and deduplicated for the next drain.
    pub fn drain_up_to(&mut self, limit: Option<usize>) -> Vec<ObjectId> {
        let count = limit.map_or(self.order.len(), |n| n.min(self.order.len()));
        let taken: Vec<ObjectId> = self.order.drain(..count).collect();
        for id in &taken {
            self.members.remove(id);
        }
        taken
    }

    pub fn iter(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.order.iter().copied()
    }
}
