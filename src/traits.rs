//! Caller-supplied node traits
//!
//! An [`IntervalMap`](crate::IntervalMap) never inspects caller records
//! directly. It reads bounds, values and the embedded [`MapHook`] through a
//! [`NodeTraits`] implementation, and reports structural and aggregate changes
//! back through its optional callbacks.

use std::ops::{Add, Sub};

use crate::hook::MapHook;
use crate::segment::{Segment, SegmentId};

/// Value types that can be aggregated over overlapping intervals
///
/// Implementors must form an abelian group: `Default` is the identity and
/// addition and subtraction are exact inverses. Floating point types satisfy
/// the bounds but not the contract.
pub trait Aggregate:
    Clone + Default + PartialEq + Add<Output = Self> + Sub<Output = Self>
{
}

impl<T> Aggregate for T where
    T: Clone + Default + PartialEq + Add<Output = T> + Sub<Output = T>
{
}

/// Tells an interval map how to read and link caller records
///
/// `lower`, `upper`, `value` and the hook selectors are mandatory. The
/// `on_*` callbacks default to no-ops.
///
/// A record that takes part in several maps embeds one [`MapHook`] per map,
/// and each map gets its own traits type selecting the matching field.
pub trait NodeTraits {
    /// Caller record type
    type Node;
    /// Ordered key type of interval bounds
    type Key: Ord + Clone;
    /// Aggregated value type
    type Value: Aggregate;

    /// Lower (inclusive) bound of `node`
    fn lower(&self, node: &Self::Node) -> Self::Key;

    /// Upper (exclusive) bound of `node`
    fn upper(&self, node: &Self::Node) -> Self::Key;

    /// Value contributed by `node` to every segment it covers
    fn value(&self, node: &Self::Node) -> Self::Value;

    /// Hook embedded in `node` for this map
    fn hook<'n>(&self, node: &'n Self::Node) -> &'n MapHook;

    /// Mutable hook embedded in `node` for this map
    fn hook_mut<'n>(&self, node: &'n mut Self::Node) -> &'n mut MapHook;

    /// Called when the aggregate of a segment changes
    fn on_value_changed(
        &mut self,
        id: SegmentId,
        seg: &Segment<Self::Key, Self::Value>,
        old: &Self::Value,
        new: &Self::Value,
    ) {
        let _ = (id, seg, old, new);
    }

    /// Called when the distance from a segment to its next entry changes
    ///
    /// `upper` is the new upper key, or `None` for the last entry.
    fn on_length_changed(
        &mut self,
        id: SegmentId,
        seg: &Segment<Self::Key, Self::Value>,
        upper: Option<&Self::Key>,
    ) {
        let _ = (id, seg, upper);
    }

    /// Called for every new entry before any other callback references it
    ///
    /// The aggregate is still the identity at this point.
    fn on_segment_inserted(&mut self, id: SegmentId, seg: &Segment<Self::Key, Self::Value>) {
        let _ = (id, seg);
    }

    /// Called after an entry left the index, with its final record
    fn on_segment_removed(&mut self, id: SegmentId, seg: &Segment<Self::Key, Self::Value>) {
        let _ = (id, seg);
    }
}
