//! Ordered point index
//!
//! A duplicate-key tolerant ordered index over endpoint records. Records live
//! in a generational slab so their handles survive unrelated insertions and
//! erasures; ordering is kept in a B-tree keyed by `(key, seq)`. The sequence
//! number grows monotonically, which places a new entry after every existing
//! entry with an equal key and never merges equal keys.

use std::collections::BTreeMap;
use std::ops::Bound::{Excluded, Included, Unbounded};
use std::sync::atomic::{AtomicU64, Ordering};

use generational_arena::{Arena, Index};
use smallvec::SmallVec;

use crate::segment::{Role, Segment, SegmentId};

/// Scratch list of handles touched by a single operation
pub type IdList = SmallVec<[SegmentId; 16]>;

/// Position of an entry in the index order
type Position<K> = (K, u64);

/// Source of index identities carried by every handle
static NEXT_OWNER: AtomicU64 = AtomicU64::new(1);

/// Balanced ordered multi-key index of endpoint records
#[derive(Debug)]
pub struct PointIndex<K, V> {
    /// Endpoint storage, addressed by generational handle
    arena: Arena<Segment<K, V>>,
    /// Sorted view over the arena
    order: BTreeMap<Position<K>, Index>,
    /// Last sequence number handed out
    last_seq: u64,
    /// Identity stamped on handles from this index
    owner: u64,
}

impl<K: Ord + Clone, V> PointIndex<K, V> {
    /// Create an empty index with room for `capacity` endpoints
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            arena: Arena::with_capacity(capacity),
            order: BTreeMap::new(),
            last_seq: 0,
            owner: NEXT_OWNER.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Identity shared by every handle this index hands out
    pub fn owner(&self) -> u64 {
        self.owner
    }

    fn handle(&self, slot: Index) -> SegmentId {
        SegmentId {
            owner: self.owner,
            slot,
        }
    }

    fn slot(&self, id: SegmentId) -> Option<Index> {
        (id.owner == self.owner).then_some(id.slot)
    }

    /// Number of indexed endpoints
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the index holds no endpoints
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Slots currently allocated in the slab
    pub fn capacity(&self) -> usize {
        self.arena.capacity()
    }

    /// Insert an endpoint after every entry already holding `key`
    pub fn insert(&mut self, key: K, role: Role, contribution: V, aggregate: V) -> SegmentId {
        // seq 0 is reserved as the lower sentinel for range scans
        self.last_seq += 1;
        let seq = self.last_seq;
        let idx = self
            .arena
            .insert(Segment::new(key.clone(), seq, role, contribution, aggregate));
        self.order.insert((key, seq), idx);
        self.handle(idx)
    }

    /// Erase an endpoint by handle, returning its record
    pub fn erase(&mut self, id: SegmentId) -> Option<Segment<K, V>> {
        let seg = self.arena.remove(self.slot(id)?)?;
        self.order.remove(&(seg.key.clone(), seg.seq));
        Some(seg)
    }

    /// Whether `id` refers to a live entry of this index
    pub fn contains(&self, id: SegmentId) -> bool {
        self.slot(id).is_some_and(|slot| self.arena.contains(slot))
    }

    pub fn get(&self, id: SegmentId) -> Option<&Segment<K, V>> {
        self.arena.get(self.slot(id)?)
    }

    pub fn get_mut(&mut self, id: SegmentId) -> Option<&mut Segment<K, V>> {
        let slot = self.slot(id)?;
        self.arena.get_mut(slot)
    }

    /// Entry immediately before `id` in index order
    pub fn prev(&self, id: SegmentId) -> Option<SegmentId> {
        let seg = self.get(id)?;
        self.order
            .range(..(seg.key.clone(), seg.seq))
            .next_back()
            .map(|(_, &idx)| self.handle(idx))
    }

    /// Entry immediately after `id` in index order
    pub fn next(&self, id: SegmentId) -> Option<SegmentId> {
        let seg = self.get(id)?;
        self.order
            .range((Excluded((seg.key.clone(), seg.seq)), Unbounded))
            .next()
            .map(|(_, &idx)| self.handle(idx))
    }

    /// Key of the entry after `id`, if any
    pub fn next_key(&self, id: SegmentId) -> Option<&K> {
        self.next(id)
            .and_then(|next| self.get(next))
            .map(|seg| &seg.key)
    }

    pub fn first(&self) -> Option<SegmentId> {
        self.order.values().next().map(|&idx| self.handle(idx))
    }

    pub fn last(&self) -> Option<SegmentId> {
        self.order.values().next_back().map(|&idx| self.handle(idx))
    }

    /// Last entry whose key is less than or equal to `key`
    pub fn last_at_or_before(&self, key: &K) -> Option<SegmentId> {
        self.order
            .range(..=(key.clone(), u64::MAX))
            .next_back()
            .map(|(_, &idx)| self.handle(idx))
    }

    /// Handles of every entry whose key lies in `[lower, upper)`, ascending
    pub fn ids_in(&self, lower: &K, upper: &K) -> IdList {
        if lower >= upper {
            return IdList::new();
        }
        self.order
            .range((Included((lower.clone(), 0)), Excluded((upper.clone(), 0))))
            .map(|(_, &idx)| self.handle(idx))
            .collect()
    }

    /// Entries in ascending order; reverse for descending
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (SegmentId, &Segment<K, V>)> + '_ {
        self.order
            .values()
            .filter_map(move |&idx| self.arena.get(idx).map(|seg| (self.handle(idx), seg)))
    }

    /// Number of distinct keys in the index
    pub fn distinct_keys(&self) -> usize {
        let mut count = 0;
        let mut prev: Option<&K> = None;
        for (key, _) in self.order.keys() {
            if prev != Some(key) {
                count += 1;
                prev = Some(key);
            }
        }
        count
    }

    /// Whether the slab and the ordering agree entry for entry
    pub(crate) fn is_consistent(&self) -> bool {
        self.arena.len() == self.order.len()
            && self.order.iter().all(|((key, seq), &idx)| {
                self.arena
                    .get(idx)
                    .is_some_and(|seg| &seg.key == key && seg.seq == *seq)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(index: &PointIndex<u32, i64>) -> Vec<u32> {
        index.iter().map(|(_, s)| *s.key()).collect()
    }

    #[test]
    fn test_index_empty() {
        let index: PointIndex<u32, i64> = PointIndex::with_capacity(8);

        assert!(index.is_empty());
        assert_eq!(index.len(), 0);
        assert_eq!(index.first(), None);
        assert_eq!(index.last(), None);
        assert_eq!(index.last_at_or_before(&10), None);
        assert!(index.ids_in(&0, &100).is_empty());
    }

    #[test]
    fn test_index_sorted_with_duplicates() {
        let mut index = PointIndex::with_capacity(8);

        let a = index.insert(10u32, Role::Begin, 1i64, 0);
        let b = index.insert(5, Role::Begin, 1, 0);
        let c = index.insert(10, Role::End, 1, 0);
        let d = index.insert(10, Role::Begin, 1, 0);

        assert_eq!(keys(&index), vec![5, 10, 10, 10]);

        // Equal keys keep insertion order
        let order: Vec<SegmentId> = index.iter().map(|(id, _)| id).collect();
        assert_eq!(order, vec![b, a, c, d]);

        let rev: Vec<SegmentId> = index.iter().rev().map(|(id, _)| id).collect();
        assert_eq!(rev, vec![d, c, a, b]);
        assert_eq!(index.distinct_keys(), 2);
        assert!(index.is_consistent());
    }

    #[test]
    fn test_index_navigation() {
        let mut index = PointIndex::with_capacity(8);

        let a = index.insert(1u32, Role::Begin, 1i64, 0);
        let b = index.insert(3, Role::End, 1, 0);
        let c = index.insert(3, Role::Begin, 1, 0);
        let d = index.insert(7, Role::End, 1, 0);

        assert_eq!(index.prev(a), None);
        assert_eq!(index.next(a), Some(b));
        assert_eq!(index.next(b), Some(c));
        assert_eq!(index.prev(c), Some(b));
        assert_eq!(index.next(d), None);
        assert_eq!(index.next_key(c), Some(&7));
        assert_eq!(index.first(), Some(a));
        assert_eq!(index.last(), Some(d));

        assert_eq!(index.last_at_or_before(&0), None);
        assert_eq!(index.last_at_or_before(&3), Some(c));
        assert_eq!(index.last_at_or_before(&5), Some(c));
        assert_eq!(index.last_at_or_before(&100), Some(d));
    }

    #[test]
    fn test_index_ids_in_half_open() {
        let mut index = PointIndex::with_capacity(8);

        let a = index.insert(0u32, Role::Begin, 1i64, 0);
        let b = index.insert(5, Role::Begin, 1, 0);
        let _c = index.insert(10, Role::End, 1, 0);

        let ids = index.ids_in(&0, &10);
        assert_eq!(ids.as_slice(), &[a, b]);
        assert!(index.ids_in(&5, &5).is_empty());
        assert!(index.ids_in(&9, &2).is_empty());
    }

    #[test]
    fn test_index_erase_detects_stale_handle() {
        let mut index = PointIndex::with_capacity(8);

        let a = index.insert(1u32, Role::Begin, 1i64, 0);
        let b = index.insert(2, Role::End, 1, 0);

        let erased = index.erase(a).unwrap();
        assert_eq!(*erased.key(), 1);
        assert!(!index.contains(a));
        assert!(index.erase(a).is_none());
        assert_eq!(index.prev(a), None);

        // A reused slot must not resurrect the old handle
        let c = index.insert(1, Role::Begin, 1, 0);
        assert_ne!(a, c);
        assert!(index.get(a).is_none());
        assert_eq!(index.prev(b), Some(c));
        assert!(index.is_consistent());
    }

    #[test]
    fn test_index_rejects_foreign_handle() {
        let mut left = PointIndex::with_capacity(4);
        let mut right = PointIndex::with_capacity(4);

        let a = left.insert(1u32, Role::Begin, 1i64, 0);
        let b = right.insert(1u32, Role::Begin, 1i64, 0);

        assert_ne!(left.owner(), right.owner());
        assert_ne!(a, b);
        assert!(!right.contains(a));
        assert!(right.get(a).is_none());
        assert!(right.erase(a).is_none());
        assert_eq!(right.len(), 1);
    }
}
