//! Segment-maintenance engine
//!
//! The map keeps one entry per interval boundary in a [`PointIndex`] and stores
//! on every entry the coverage at its own key: the combined value of all live
//! intervals with `lower <= key < upper`. The segment from an entry to the next
//! one therefore carries the aggregate of every point inside it, and entries
//! sharing a key agree on their aggregate regardless of tie order.
//!
//! Insertion and removal only touch entries whose key lies in the affected
//! interval, so both run in `O(log n + k)` for `k` touched entries.

use smallvec::SmallVec;
use tracing::{debug, trace};

use super::cursor::{SegmentCursor, Segments};
use crate::config::MapConfig;
use crate::error::Error;
use crate::hook::Link;
use crate::index::PointIndex;
use crate::segment::{Role, Segment, SegmentId};
use crate::traits::NodeTraits;

/// Predecessors whose next key may change, paired with that key beforehand
type Neighbours<K> = SmallVec<[(SegmentId, Option<K>); 2]>;

/// Map from weighted intervals to the aggregate of every segment they form
pub struct IntervalMap<T: NodeTraits> {
    /// Endpoints of every live interval
    index: PointIndex<T::Key, T::Value>,
    /// Caller accessors and callbacks
    traits: T,
    config: MapConfig,
    /// Number of live intervals
    intervals: usize,
}

impl<T: NodeTraits> IntervalMap<T> {
    /// Create an empty map with the default configuration
    pub fn new(traits: T) -> Self {
        Self::with_config(traits, MapConfig::default())
    }

    /// Create an empty map with the given configuration
    pub fn with_config(traits: T, config: MapConfig) -> Self {
        Self {
            index: PointIndex::with_capacity(config.initial_capacity),
            traits,
            config,
            intervals: 0,
        }
    }

    /// Number of live intervals
    pub fn len(&self) -> usize {
        self.intervals
    }

    /// Whether the map holds no intervals
    pub fn is_empty(&self) -> bool {
        self.intervals == 0
    }

    /// Number of index entries, always twice the interval count
    pub fn entry_count(&self) -> usize {
        self.index.len()
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn traits(&self) -> &T {
        &self.traits
    }

    pub fn traits_mut(&mut self) -> &mut T {
        &mut self.traits
    }

    /// Insert `node`, panicking on a contract fault
    ///
    /// # Panics
    ///
    /// If `node` is already linked into a map or its lower bound exceeds its
    /// upper bound. See [`try_insert`](Self::try_insert).
    pub fn insert(&mut self, node: &mut T::Node) {
        if let Err(err) = self.try_insert(node) {
            panic!("interval map insert failed: {err}");
        }
    }

    /// Insert `node`, linking its hook to the two new endpoints
    pub fn try_insert(&mut self, node: &mut T::Node) -> Result<(), Error> {
        if self.traits.hook(node).is_linked() {
            return Err(Error::AlreadyIndexed);
        }
        let lower = self.traits.lower(node);
        let upper = self.traits.upper(node);
        if lower > upper {
            return Err(Error::InvertedBounds);
        }
        let value = self.traits.value(node);
        let zero_width = lower == upper;

        // Coverage at both bounds before this interval exists
        let before_lower = self.index.last_at_or_before(&lower);
        let before_upper = self.index.last_at_or_before(&upper);
        let cov_lower = self.aggregate_of(before_lower);
        let cov_upper = self.aggregate_of(before_upper);

        let covered = self.index.ids_in(&lower, &upper);
        let neighbours = self.neighbours([before_lower, before_upper]);

        let begin = self
            .index
            .insert(lower, Role::Begin, value.clone(), T::Value::default());
        let end = self
            .index
            .insert(upper, Role::End, value.clone(), T::Value::default());
        self.traits.hook_mut(node).set(Link {
            map_id: self.index.owner(),
            begin,
            end,
        });
        self.intervals += 1;

        self.notify_inserted(begin);
        self.notify_inserted(end);
        self.notify_length_changes(&neighbours);
        self.notify_length(begin);
        self.notify_length(end);

        for &id in &covered {
            self.shift(id, &value, true);
        }

        let begin_initial = if zero_width {
            cov_lower
        } else {
            cov_lower + value
        };
        self.initialize(begin, begin_initial);
        self.initialize(end, cov_upper);

        trace!(
            map = self.index.owner(),
            touched = covered.len(),
            entries = self.index.len(),
            zero_width,
            "inserted interval"
        );
        self.verify("insert");
        Ok(())
    }

    /// Remove `node`, panicking on a contract fault
    ///
    /// # Panics
    ///
    /// If `node` is not linked into this map.
    pub fn remove(&mut self, node: &mut T::Node) {
        if let Err(err) = self.try_remove(node) {
            panic!("interval map remove failed: {err}");
        }
    }

    /// Remove `node` and reset its hook
    ///
    /// The bounds and value captured at insertion are used, so a record whose
    /// fields changed while indexed is still removed cleanly.
    pub fn try_remove(&mut self, node: &mut T::Node) -> Result<(), Error> {
        let link = self.traits.hook(node).link().ok_or(Error::NotIndexed)?;
        if link.map_id != self.index.owner() {
            return Err(Error::ForeignHook);
        }
        let (lower, upper, value) = match (self.index.get(link.begin), self.index.get(link.end)) {
            (Some(begin), Some(end)) => (
                begin.key.clone(),
                end.key.clone(),
                begin.contribution.clone(),
            ),
            _ => return Err(Error::StaleSegment),
        };

        let covered = self.index.ids_in(&lower, &upper);
        for &id in &covered {
            self.shift(id, &value, false);
        }

        let prev_begin = self.index.prev(link.begin);
        let prev_end = match self.index.prev(link.end) {
            Some(prev) if prev == link.begin => prev_begin,
            prev => prev,
        };
        let neighbours = self.neighbours([prev_begin, prev_end]);

        if let Some(seg) = self.index.erase(link.begin) {
            self.traits.on_segment_removed(link.begin, &seg);
        }
        if let Some(seg) = self.index.erase(link.end) {
            self.traits.on_segment_removed(link.end, &seg);
        }
        self.notify_length_changes(&neighbours);

        self.traits.hook_mut(node).reset();
        self.intervals -= 1;

        trace!(
            map = self.index.owner(),
            touched = covered.len(),
            entries = self.index.len(),
            "removed interval"
        );
        self.verify("remove");
        Ok(())
    }

    /// Whether `node` is currently linked into this map
    pub fn contains(&self, node: &T::Node) -> bool {
        self.traits
            .hook(node)
            .link()
            .is_some_and(|link| link.map_id == self.index.owner() && self.index.contains(link.begin))
    }

    /// Stored aggregate of a segment
    ///
    /// # Panics
    ///
    /// If `id` is stale or belongs to another map.
    pub fn get_aggregate(&self, id: SegmentId) -> &T::Value {
        match self.try_get_aggregate(id) {
            Ok(value) => value,
            Err(err) => panic!("interval map lookup failed: {err}"),
        }
    }

    /// Stored aggregate of a segment, or `StaleSegment` for a dead handle
    pub fn try_get_aggregate(&self, id: SegmentId) -> Result<&T::Value, Error> {
        self.index
            .get(id)
            .map(|seg| &seg.aggregate)
            .ok_or(Error::StaleSegment)
    }

    /// Endpoint record behind a handle
    pub fn segment(&self, id: SegmentId) -> Option<&Segment<T::Key, T::Value>> {
        self.index.get(id)
    }

    /// Combined value of every interval covering `key`
    ///
    /// Outside the horizon this is the identity.
    pub fn aggregate_at(&self, key: &T::Key) -> T::Value {
        self.aggregate_of(self.index.last_at_or_before(key))
    }

    /// Smallest and largest indexed key
    pub fn horizon(&self) -> Option<(&T::Key, &T::Key)> {
        let first = self.index.first().and_then(|id| self.index.get(id))?;
        let last = self.index.last().and_then(|id| self.index.get(id))?;
        Some((&first.key, &last.key))
    }

    /// Cursor on the first segment, or the end cursor when there is none
    pub fn cursor(&self) -> SegmentCursor<'_, T::Key, T::Value> {
        SegmentCursor::first(&self.index)
    }

    /// Past-the-end cursor; step it back to reach the last segment
    pub fn cursor_end(&self) -> SegmentCursor<'_, T::Key, T::Value> {
        SegmentCursor::end(&self.index)
    }

    /// Cursor on the segment whose range contains `key`
    pub fn cursor_at(&self, key: &T::Key) -> SegmentCursor<'_, T::Key, T::Value> {
        SegmentCursor::at(&self.index, self.index.last_at_or_before(key))
    }

    /// All segments in ascending key order
    pub fn segments(&self) -> Segments<'_, T::Key, T::Value> {
        Segments::new(&self.index)
    }

    /// Get map statistics
    pub fn stats(&self) -> MapStats {
        MapStats {
            interval_count: self.intervals,
            entry_count: self.index.len(),
            distinct_keys: self.index.distinct_keys(),
            capacity: self.index.capacity(),
        }
    }

    /// Recompute every aggregate from the captured contributions and compare
    pub fn validate(&self) -> Result<(), Error> {
        if !self.index.is_consistent() {
            return Err(Error::Corrupted("index storage and ordering disagree".into()));
        }
        if self.index.len() != 2 * self.intervals {
            return Err(Error::Corrupted(format!(
                "{} entries for {} intervals",
                self.index.len(),
                self.intervals
            )));
        }

        let entries: Vec<(SegmentId, &Segment<T::Key, T::Value>)> = self.index.iter().collect();
        let begins = entries.iter().filter(|(_, seg)| seg.is_begin()).count();
        if begins != self.intervals {
            return Err(Error::Corrupted(format!(
                "{begins} begin entries for {} intervals",
                self.intervals
            )));
        }

        let mut running = T::Value::default();
        let mut start = 0;
        while start < entries.len() {
            let key = &entries[start].1.key;
            let mut stop = start;
            let mut at_key = running.clone();
            while stop < entries.len() && &entries[stop].1.key == key {
                let seg = entries[stop].1;
                at_key = match seg.role {
                    Role::Begin => at_key + seg.contribution.clone(),
                    Role::End => at_key - seg.contribution.clone(),
                };
                stop += 1;
            }
            if let Some((id, _)) = entries[start..stop]
                .iter()
                .find(|(_, seg)| seg.aggregate != at_key)
            {
                return Err(Error::Corrupted(format!("stale aggregate on {id:?}")));
            }
            running = at_key;
            start = stop;
        }

        if running != T::Value::default() {
            return Err(Error::Corrupted(
                "coverage does not return to the identity".into(),
            ));
        }
        Ok(())
    }

    fn aggregate_of(&self, id: Option<SegmentId>) -> T::Value {
        id.and_then(|id| self.index.get(id))
            .map(|seg| seg.aggregate.clone())
            .unwrap_or_default()
    }

    fn neighbours(&self, ids: [Option<SegmentId>; 2]) -> Neighbours<T::Key> {
        let mut out = Neighbours::new();
        for id in ids.into_iter().flatten() {
            if out.iter().any(|(seen, _)| *seen == id) {
                continue;
            }
            out.push((id, self.index.next_key(id).cloned()));
        }
        out
    }

    /// Add or subtract `delta` on one entry and report the change
    fn shift(&mut self, id: SegmentId, delta: &T::Value, grow: bool) {
        let Some(seg) = self.index.get_mut(id) else {
            return;
        };
        let old = seg.aggregate.clone();
        seg.aggregate = if grow {
            old.clone() + delta.clone()
        } else {
            old.clone() - delta.clone()
        };
        let seg = &*seg;
        self.traits.on_value_changed(id, seg, &old, &seg.aggregate);
    }

    fn initialize(&mut self, id: SegmentId, aggregate: T::Value) {
        let Some(seg) = self.index.get_mut(id) else {
            return;
        };
        seg.aggregate = aggregate;
        let seg = &*seg;
        self.traits
            .on_value_changed(id, seg, &T::Value::default(), &seg.aggregate);
    }

    fn notify_inserted(&mut self, id: SegmentId) {
        if let Some(seg) = self.index.get(id) {
            self.traits.on_segment_inserted(id, seg);
        }
    }

    fn notify_length(&mut self, id: SegmentId) {
        if let Some(seg) = self.index.get(id) {
            self.traits
                .on_length_changed(id, seg, self.index.next_key(id));
        }
    }

    fn notify_length_changes(&mut self, neighbours: &Neighbours<T::Key>) {
        for (id, before) in neighbours {
            let Some(seg) = self.index.get(*id) else {
                continue;
            };
            let after = self.index.next_key(*id);
            if after != before.as_ref() {
                self.traits.on_length_changed(*id, seg, after);
            }
        }
    }

    fn verify(&self, op: &str) {
        if !self.config.verify_mutations {
            return;
        }
        if let Err(err) = self.validate() {
            debug!(map = self.index.owner(), op, %err, "interval map failed verification");
            panic!("interval map corrupted after {op}: {err}");
        }
    }
}

impl<T: NodeTraits + Default> Default for IntervalMap<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// Statistics about an interval map
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub struct MapStats {
    /// Live intervals
    pub interval_count: usize,
    /// Index entries, two per interval
    pub entry_count: usize,
    /// Keys after collapsing duplicates
    pub distinct_keys: usize,
    /// Endpoint slots allocated
    pub capacity: usize,
}
