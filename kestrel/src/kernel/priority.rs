//! Priorities and process bitmaps.
//!
//! A priority is both a process's identity and its index into the kernel
//! process table. Priority 0 is always the highest; `PROCESS_COUNT - 1` is
//! the idle process. The `priority-order-reversed` feature flips only the
//! bit position a priority occupies in a [`ProcessMap`], so that ports whose
//! find-first-set instruction scans from the most significant bit still
//! resolve the highest ready priority in one operation.

use crate::config::PROCESS_COUNT;
use bit_field::BitField;

pub type ProcessPriority = u8;

/// Ticks remaining in a bounded wait; zero means no deadline is armed.
pub type TimeoutCount = u32;

pub(crate) const LAST_PRIORITY: ProcessPriority = (PROCESS_COUNT - 1) as ProcessPriority;
pub(crate) const IDLE_PRIORITY: ProcessPriority = LAST_PRIORITY;

/// A set of processes, one bit per priority.
///
/// Used for the kernel ready set and for per-service waiter sets. A map
/// with exactly one bit set is a process *tag*.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct ProcessMap(u32);

impl ProcessMap {
    pub const EMPTY: ProcessMap = ProcessMap(0);

    /// The tag of the process at `priority`.
    #[inline(always)]
    pub const fn tag(priority: ProcessPriority) -> ProcessMap {
        #[cfg(not(feature = "priority-order-reversed"))]
        {
            ProcessMap(1 << priority)
        }
        #[cfg(feature = "priority-order-reversed")]
        {
            ProcessMap(1 << (LAST_PRIORITY - priority))
        }
    }

    /// Priority of the highest-priority member.
    ///
    /// The result is unspecified for an empty map; the caller guarantees
    /// non-emptiness (the idle process's ready bit is always set).
    #[inline(always)]
    pub fn highest_priority(self) -> ProcessPriority {
        debug_assert!(self.0 != 0);
        #[cfg(not(feature = "priority-order-reversed"))]
        {
            self.0.trailing_zeros() as ProcessPriority
        }
        #[cfg(feature = "priority-order-reversed")]
        {
            LAST_PRIORITY - (31 - self.0.leading_zeros()) as ProcessPriority
        }
    }

    /// Tag of the highest-priority member; [`ProcessMap::EMPTY`] for an
    /// empty map.
    #[inline(always)]
    pub fn highest_tag(self) -> ProcessMap {
        if self.0 == 0 {
            return ProcessMap::EMPTY;
        }
        #[cfg(not(feature = "priority-order-reversed"))]
        {
            // Isolate the lowest set bit.
            ProcessMap(self.0 & self.0.wrapping_neg())
        }
        #[cfg(feature = "priority-order-reversed")]
        {
            ProcessMap(1 << (31 - self.0.leading_zeros()))
        }
    }

    #[inline(always)]
    pub fn union(self, other: ProcessMap) -> ProcessMap {
        ProcessMap(self.0 | other.0)
    }

    #[inline(always)]
    pub fn without(self, other: ProcessMap) -> ProcessMap {
        ProcessMap(self.0 & !other.0)
    }

    #[inline(always)]
    pub fn contains(self, tag: ProcessMap) -> bool {
        self.0 & tag.0 != 0
    }

    #[inline(always)]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Whether the process at `priority` is a member.
    #[inline(always)]
    pub fn contains_priority(self, priority: ProcessPriority) -> bool {
        self.0.get_bit(Self::tag(priority).0.trailing_zeros() as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::TestResult;
    use quickcheck_macros::quickcheck;

    fn map_of(priorities: &[ProcessPriority]) -> ProcessMap {
        priorities
            .iter()
            .fold(ProcessMap::EMPTY, |map, &p| map.union(ProcessMap::tag(p)))
    }

    #[test]
    fn tag_roundtrips_through_highest_priority() {
        for priority in 0..PROCESS_COUNT as ProcessPriority {
            let tag = ProcessMap::tag(priority);
            assert_eq!(tag.highest_priority(), priority);
            assert_eq!(tag.highest_tag(), tag);
        }
    }

    #[test]
    fn empty_map_queries() {
        assert!(ProcessMap::EMPTY.is_empty());
        assert_eq!(ProcessMap::EMPTY.highest_tag(), ProcessMap::EMPTY);
        for priority in 0..PROCESS_COUNT as ProcessPriority {
            assert!(!ProcessMap::EMPTY.contains_priority(priority));
        }
    }

    #[quickcheck]
    fn highest_priority_is_minimal_member(priorities: Vec<u8>) -> TestResult {
        let priorities: Vec<ProcessPriority> = priorities
            .into_iter()
            .map(|p| p % PROCESS_COUNT as u8)
            .collect();
        if priorities.is_empty() {
            return TestResult::discard();
        }
        let map = map_of(&priorities);
        let highest = map.highest_priority();
        TestResult::from_bool(
            priorities.iter().all(|&p| highest <= p) && priorities.contains(&highest),
        )
    }

    #[quickcheck]
    fn highest_tag_matches_highest_priority(priorities: Vec<u8>) -> TestResult {
        let priorities: Vec<ProcessPriority> = priorities
            .into_iter()
            .map(|p| p % PROCESS_COUNT as u8)
            .collect();
        if priorities.is_empty() {
            return TestResult::discard();
        }
        let map = map_of(&priorities);
        TestResult::from_bool(map.highest_tag() == ProcessMap::tag(map.highest_priority()))
    }

    #[quickcheck]
    fn membership_survives_union_and_removal(priorities: Vec<u8>) -> TestResult {
        let priorities: Vec<ProcessPriority> = priorities
            .into_iter()
            .map(|p| p % PROCESS_COUNT as u8)
            .collect();
        if priorities.is_empty() {
            return TestResult::discard();
        }
        let map = map_of(&priorities);
        let victim = priorities[0];
        let removed = map.without(ProcessMap::tag(victim));
        TestResult::from_bool(
            priorities.iter().all(|&p| map.contains_priority(p))
                && !removed.contains_priority(victim),
        )
    }
}
