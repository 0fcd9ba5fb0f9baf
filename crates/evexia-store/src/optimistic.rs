//! Optimistic writes with rollback.

use std::fmt;

use tracing::debug;

use crate::cache::{EntityCache, ErasedValue};

/// Guard for a value written ahead of server confirmation.
///
/// Created by [`EntityCache::optimistic_set`]. Call [`rollback`] when the
/// server rejects the change to restore what was cached before; call
/// [`commit`] (or just drop the guard) to keep the new value.
///
/// [`rollback`]: OptimisticUpdate::rollback
/// [`commit`]: OptimisticUpdate::commit
#[must_use = "dropping the guard keeps the optimistic value; call rollback() on failure"]
pub struct OptimisticUpdate {
    cache: EntityCache,
    entity_type: String,
    id: String,
    previous: Option<ErasedValue>,
}

impl OptimisticUpdate {
    pub(crate) fn new(
        cache: EntityCache,
        entity_type: String,
        id: String,
        previous: Option<ErasedValue>,
    ) -> Self {
        Self {
            cache,
            entity_type,
            id,
            previous,
        }
    }

    /// Whether a value was cached before the optimistic write.
    pub fn had_previous(&self) -> bool {
        self.previous.is_some()
    }

    /// Keep the optimistic value.
    pub fn commit(self) {
        debug!(entity_type = %self.entity_type, id = %self.id, "Optimistic update committed");
    }

    /// Restore the previous value, or remove the entry if there was none.
    pub fn rollback(self) {
        debug!(entity_type = %self.entity_type, id = %self.id, "Rolling back optimistic update");
        match self.previous {
            Some(previous) => {
                self.cache.set_erased(&self.entity_type, self.id, previous);
            }
            None => {
                self.cache.invalidate(&self.entity_type, Some(&self.id));
            }
        }
    }
}

impl fmt::Debug for OptimisticUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptimisticUpdate")
            .field("entity_type", &self.entity_type)
            .field("id", &self.id)
            .field("had_previous", &self.previous.is_some())
            .finish()
    }
}
