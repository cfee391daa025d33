//! Identifier allocation and reuse for hosts and switches.
//!
//! Each [`NodeKind`] owns an [`IdPool`]: a monotonic counter of the next
//! never-issued number plus a free pool of released numbers. Allocation
//! always prefers the numerically smallest released number, so ids stay
//! compact and deterministic across delete/insert cycles.
//!
//! The free pool is kept as disjoint ranges, so reserving a single large
//! loaded id (`h4000000000`) costs one range rather than one entry per
//! skipped number.

use crate::error::StateError;
use crate::name::{NodeKind, NodeName};
use std::collections::BTreeMap;
use std::ops::RangeInclusive;

/// Counter plus free pool for one kind namespace.
///
/// Every number below `next` is either live or in `free`, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdPool {
    kind: NodeKind,
    /// `None` once [`NodeName::MAX_NUMBER`] has been issued.
    next: Option<u64>,
    /// Released numbers as disjoint, non-adjacent inclusive ranges
    /// `first -> last`, keyed by `first`.
    free: BTreeMap<u64, u64>,
}

impl IdPool {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            next: Some(1),
            free: BTreeMap::new(),
        }
    }

    /// Take the smallest free number, or the counter if the pool is empty.
    pub fn allocate(&mut self) -> Result<NodeName, StateError> {
        if let Some((&first, _)) = self.free.first_key_value() {
            self.take_free(first);
            return Ok(NodeName::issued(self.kind, first));
        }
        let number = self.next.ok_or(StateError::Exhausted(self.kind))?;
        self.next = number.checked_add(1);
        Ok(NodeName::issued(self.kind, number))
    }

    /// Return a live number to the free pool.
    pub fn release(&mut self, name: NodeName) -> Result<(), StateError> {
        let n = name.number();
        if !self.issued(n) {
            return Err(StateError::NotAllocated(name));
        }
        if self.free_range_of(n).is_some() {
            return Err(StateError::AlreadyReleased(name));
        }
        self.insert_free(n, n);
        Ok(())
    }

    /// Mark a specific number as live (used when materializing a loaded
    /// topology). Numbers skipped over by the counter enter the free pool.
    pub fn reserve(&mut self, name: NodeName) -> Result<(), StateError> {
        let n = name.number();
        if let Some(next) = self.next
            && n >= next
        {
            if n > next {
                self.insert_free(next, n - 1);
            }
            self.next = n.checked_add(1);
            Ok(())
        } else if self.take_free(n) {
            Ok(())
        } else {
            Err(StateError::AlreadyAllocated(name))
        }
    }

    pub fn is_live(&self, name: NodeName) -> bool {
        self.issued(name.number()) && self.free_range_of(name.number()).is_none()
    }

    /// Released numbers, smallest first.
    pub fn free(&self) -> impl Iterator<Item = u64> + '_ {
        self.free_ranges().flatten()
    }

    /// Released numbers as contiguous runs, smallest first.
    pub fn free_ranges(&self) -> impl Iterator<Item = RangeInclusive<u64>> + '_ {
        self.free.iter().map(|(&first, &last)| first..=last)
    }

    /// The counter value, or `None` when every number has been issued.
    pub fn next_unused(&self) -> Option<u64> {
        self.next
    }

    pub fn reset(&mut self) {
        self.next = Some(1);
        self.free.clear();
    }

    fn issued(&self, n: u64) -> bool {
        self.next.is_none_or(|next| n < next)
    }

    fn free_range_of(&self, n: u64) -> Option<(u64, u64)> {
        self.free
            .range(..=n)
            .next_back()
            .map(|(&first, &last)| (first, last))
            .filter(|&(_, last)| n <= last)
    }

    /// Add `first..=last` to the pool, merging with adjacent runs.
    fn insert_free(&mut self, mut first: u64, mut last: u64) {
        if let Some((&prev_first, &prev_last)) = self.free.range(..first).next_back()
            && prev_last + 1 == first
        {
            self.free.remove(&prev_first);
            first = prev_first;
        }
        if let Some(after) = last.checked_add(1)
            && let Some(next_last) = self.free.remove(&after)
        {
            last = next_last;
        }
        self.free.insert(first, last);
    }

    /// Remove `n` from the pool. Returns false if it was not free.
    fn take_free(&mut self, n: u64) -> bool {
        let Some((first, last)) = self.free_range_of(n) else {
            return false;
        };
        self.free.remove(&first);
        if first < n {
            self.free.insert(first, n - 1);
        }
        if n < last {
            self.free.insert(n + 1, last);
        }
        true
    }
}

/// One [`IdPool`] per node kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeIdAllocator {
    hosts: IdPool,
    switches: IdPool,
}

impl Default for NodeIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeIdAllocator {
    pub fn new() -> Self {
        Self {
            hosts: IdPool::new(NodeKind::Host),
            switches: IdPool::new(NodeKind::Switch),
        }
    }

    pub fn pool(&self, kind: NodeKind) -> &IdPool {
        match kind {
            NodeKind::Host => &self.hosts,
            NodeKind::Switch => &self.switches,
        }
    }

    fn pool_mut(&mut self, kind: NodeKind) -> &mut IdPool {
        match kind {
            NodeKind::Host => &mut self.hosts,
            NodeKind::Switch => &mut self.switches,
        }
    }

    /// Issue the next name for `kind`. Fails only when the namespace is used
    /// up to [`NodeName::MAX_NUMBER`] with nothing released.
    pub fn allocate(&mut self, kind: NodeKind) -> Result<NodeName, StateError> {
        let name = self.pool_mut(kind).allocate()?;
        log::debug!("allocated {name}");
        Ok(name)
    }

    /// Release `name` into its kind's free pool.
    ///
    /// Releasing a number that was never issued, or releasing twice, is a
    /// [`StateError`]; the pool is left unchanged in that case.
    pub fn release(&mut self, name: NodeName) -> Result<(), StateError> {
        self.pool_mut(name.kind()).release(name)?;
        log::debug!("released {name}");
        Ok(())
    }

    pub fn reserve(&mut self, name: NodeName) -> Result<(), StateError> {
        self.pool_mut(name.kind()).reserve(name)
    }

    pub fn is_live(&self, name: NodeName) -> bool {
        self.pool(name.kind()).is_live(name)
    }

    /// Forget every issued id; the next host is `h1`, the next switch `s1`.
    pub fn reset(&mut self) {
        self.hosts.reset();
        self.switches.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn h(n: u64) -> NodeName {
        NodeName::host(n).unwrap()
    }

    fn s(n: u64) -> NodeName {
        NodeName::switch(n).unwrap()
    }

    fn host(ids: &mut NodeIdAllocator) -> NodeName {
        ids.allocate(NodeKind::Host).unwrap()
    }

    #[test]
    fn reuses_smallest_released_id_first() {
        let mut ids = NodeIdAllocator::new();
        let issued: Vec<NodeName> = (0..5).map(|_| host(&mut ids)).collect();
        assert_eq!(issued, vec![h(1), h(2), h(3), h(4), h(5)]);

        ids.release(h(4)).unwrap();
        ids.release(h(2)).unwrap();

        assert_eq!(host(&mut ids), h(2));
        assert_eq!(host(&mut ids), h(4));
        assert_eq!(host(&mut ids), h(6));
    }

    #[test]
    fn reuse_order_is_numeric_not_textual() {
        let mut ids = NodeIdAllocator::new();
        for _ in 0..10 {
            host(&mut ids);
        }
        ids.release(h(10)).unwrap();
        ids.release(h(2)).unwrap();
        assert_eq!(host(&mut ids), h(2));
        assert_eq!(host(&mut ids), h(10));
    }

    #[test]
    fn kinds_have_independent_namespaces() {
        let mut ids = NodeIdAllocator::new();
        assert_eq!(host(&mut ids), h(1));
        assert_eq!(ids.allocate(NodeKind::Switch), Ok(s(1)));
        ids.release(s(1)).unwrap();
        assert_eq!(host(&mut ids), h(2));
        assert_eq!(ids.allocate(NodeKind::Switch), Ok(s(1)));
    }

    #[test]
    fn double_release_is_rejected() {
        let mut ids = NodeIdAllocator::new();
        ids.allocate(NodeKind::Switch).unwrap();
        ids.release(s(1)).unwrap();
        assert_eq!(ids.release(s(1)), Err(StateError::AlreadyReleased(s(1))));
        // The failed release must not disturb the pool.
        assert_eq!(ids.allocate(NodeKind::Switch), Ok(s(1)));
        assert_eq!(ids.allocate(NodeKind::Switch), Ok(s(2)));
    }

    #[test]
    fn releasing_unissued_id_is_rejected() {
        let mut ids = NodeIdAllocator::new();
        assert_eq!(ids.release(h(3)), Err(StateError::NotAllocated(h(3))));
        assert_eq!(host(&mut ids), h(1));
    }

    #[test]
    fn released_neighbours_merge_into_one_run() {
        let mut ids = NodeIdAllocator::new();
        for _ in 0..6 {
            host(&mut ids);
        }
        ids.release(h(2)).unwrap();
        ids.release(h(4)).unwrap();
        ids.release(h(3)).unwrap();
        let pool = ids.pool(NodeKind::Host);
        assert_eq!(pool.free_ranges().collect::<Vec<_>>(), vec![2..=4]);
        assert_eq!(ids.release(h(3)), Err(StateError::AlreadyReleased(h(3))));
    }

    #[test]
    fn reserve_fills_gaps_into_free_pool() {
        let mut ids = NodeIdAllocator::new();
        ids.reserve(h(1)).unwrap();
        ids.reserve(h(3)).unwrap();
        assert!(ids.is_live(h(3)));
        assert!(!ids.is_live(h(2)));
        assert_eq!(ids.pool(NodeKind::Host).next_unused(), Some(4));

        assert_eq!(host(&mut ids), h(2));
        assert_eq!(host(&mut ids), h(4));
    }

    #[test]
    fn reserve_of_live_id_is_rejected() {
        let mut ids = NodeIdAllocator::new();
        ids.reserve(s(2)).unwrap();
        assert_eq!(ids.reserve(s(2)), Err(StateError::AlreadyAllocated(s(2))));
        ids.reserve(s(1)).unwrap();
        assert_eq!(ids.pool(NodeKind::Switch).free().count(), 0);
    }

    #[test]
    fn reserving_a_huge_id_keeps_the_gap_as_one_run() {
        let mut ids = NodeIdAllocator::new();
        ids.reserve(h(4_000_000_000)).unwrap();
        ids.reserve(h(7)).unwrap();

        let pool = ids.pool(NodeKind::Host);
        assert_eq!(
            pool.free_ranges().collect::<Vec<_>>(),
            vec![1..=6, 8..=3_999_999_999]
        );
        assert_eq!(pool.next_unused(), Some(4_000_000_001));
        assert!(ids.is_live(h(4_000_000_000)));
        assert!(!ids.is_live(h(123_456)));

        assert_eq!(host(&mut ids), h(1));
        assert_eq!(host(&mut ids), h(2));
    }

    #[test]
    fn counter_stops_at_the_largest_number() {
        let mut ids = NodeIdAllocator::new();
        ids.reserve(s(NodeName::MAX_NUMBER)).unwrap();
        assert_eq!(ids.pool(NodeKind::Switch).next_unused(), None);
        assert!(ids.is_live(s(NodeName::MAX_NUMBER)));

        ids.release(s(NodeName::MAX_NUMBER)).unwrap();
        assert_eq!(ids.allocate(NodeKind::Switch), Ok(s(1)));
        ids.reserve(s(NodeName::MAX_NUMBER)).unwrap();
        assert_eq!(
            ids.pool(NodeKind::Switch).free_ranges().next(),
            Some(2..=NodeName::MAX_NUMBER - 1)
        );
    }

    #[test]
    fn exhausted_namespace_reports_an_error() {
        let mut pool = IdPool::new(NodeKind::Host);
        pool.reserve(h(NodeName::MAX_NUMBER)).unwrap();
        // Every lower number live too.
        pool.free.clear();
        assert_eq!(pool.allocate(), Err(StateError::Exhausted(NodeKind::Host)));
    }

    #[test]
    fn reset_restarts_counters() {
        let mut ids = NodeIdAllocator::new();
        host(&mut ids);
        host(&mut ids);
        ids.release(h(1)).unwrap();
        ids.reset();
        assert_eq!(host(&mut ids), h(1));
        assert_eq!(host(&mut ids), h(2));
    }
}
