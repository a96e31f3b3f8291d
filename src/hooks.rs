//! Lifecycle wiring between the host's object events and the connection core.
//!
//! Every event funnels into [`ConnectSystem::notify_changed`]. The ordering
//! matters: detaching notifies while the object still has its capability, and
//! relocating notifies at both the old and the new tile so neighbors on both
//! sides are invalidated.

use crate::collab::{ConnectWorld, ObjectId};
use crate::rule::MatchRule;
use crate::system::{ConnectError, ConnectSystem, ConnectWarning};

/// Object lifecycle notifications understood by the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Capability started (object created or component attached).
    Attached,
    /// Capability about to stop; raise before the object is torn down.
    Detached,
    /// About to leave its current tile.
    Moving,
    /// Arrived at a new tile (or was un-anchored).
    Moved,
}

impl<W: ConnectWorld, M: MatchRule<W>> ConnectSystem<W, M> {
    pub fn on_lifecycle(
        &mut self,
        event: Lifecycle,
        id: ObjectId,
    ) -> Result<Option<ConnectWarning>, ConnectError> {
        tracing::trace!(object = %id, ?event, "lifecycle event");
        self.notify_changed(id)
    }

    /// Apply `change` to the world, notifying before and after.
    ///
    /// Use for relocation: the first notification invalidates the neighbors
    /// of the old tile, the second those of the new tile. Notifications are
    /// deduplicated so the object itself is recomputed once.
    ///
    /// `change` is always applied and both notifications always run; a
    /// failure of either is reported after the move, the first one winning.
    pub fn relocate<F>(&mut self, id: ObjectId, change: F) -> Result<Vec<ConnectWarning>, ConnectError>
    where
        F: FnOnce(&mut W),
    {
        let before = self.on_lifecycle(Lifecycle::Moving, id);
        change(self.world_mut());
        let after = self.on_lifecycle(Lifecycle::Moved, id);

        let mut warnings = Vec::new();
        warnings.extend(before?);
        warnings.extend(after?);
        Ok(warnings)
    }

    /// Notify, then apply `teardown` (despawn or capability removal).
    ///
    /// The object is queued while still capable so its neighbors get marked;
    /// at drain time it is skipped as stale.
    pub fn detach<F>(&mut self, id: ObjectId, teardown: F) -> Result<Option<ConnectWarning>, ConnectError>
    where
        F: FnOnce(&mut W),
    {
        let warning = self.on_lifecycle(Lifecycle::Detached, id);
        teardown(self.world_mut());
        warning
    }

    /// Apply `setup` (spawn or capability grant), then notify.
    pub fn attach<F>(&mut self, id: ObjectId, setup: F) -> Result<Option<ConnectWarning>, ConnectError>
    where
        F: FnOnce(&mut W),
    {
        setup(self.world_mut());
        self.on_lifecycle(Lifecycle::Attached, id)
    }
}
