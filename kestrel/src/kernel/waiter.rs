//! Per-service waiter sets.

use crate::cell::LockedCell;
use crate::kernel::priority::ProcessMap;
use crate::sync::interrupt_lock::InterruptLockKey;

/// The set of processes blocked on one service.
///
/// A process's tag is a member of at most one waiter map at a time. The
/// resume operations clear the bit of every process they ready; a bit still
/// present when the blocked process resumes means the resumption came from a
/// timeout or a forced wake, not from the service.
pub struct WaiterMap(LockedCell<ProcessMap>);

impl WaiterMap {
    pub const fn new() -> WaiterMap {
        WaiterMap(LockedCell::new(ProcessMap::EMPTY))
    }

    #[inline(always)]
    pub(crate) fn get(&self, key: InterruptLockKey<'_>) -> ProcessMap {
        self.0.get(key)
    }

    #[inline(always)]
    pub(crate) fn set(&self, key: InterruptLockKey<'_>, map: ProcessMap) {
        self.0.set(key, map)
    }

    #[inline(always)]
    pub(crate) fn insert(&self, key: InterruptLockKey<'_>, tag: ProcessMap) {
        self.0.set(key, self.0.get(key).union(tag))
    }

    #[inline(always)]
    pub(crate) fn remove(&self, key: InterruptLockKey<'_>, tag: ProcessMap) {
        self.0.set(key, self.0.get(key).without(tag))
    }

    #[inline(always)]
    pub(crate) fn contains(&self, key: InterruptLockKey<'_>, tag: ProcessMap) -> bool {
        self.0.get(key).contains(tag)
    }

    /// Read and empty the map in one step.
    #[inline(always)]
    pub(crate) fn take(&self, key: InterruptLockKey<'_>) -> ProcessMap {
        let map = self.0.get(key);
        self.0.set(key, ProcessMap::EMPTY);
        map
    }
}
