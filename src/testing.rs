//! Shared fixtures for unit and property tests

use crate::hook::MapHook;
use crate::interval::IntervalMap;
use crate::segment::{Segment, SegmentId};
use crate::traits::NodeTraits;

/// A reservation of `value` units over `[lower, upper)`
#[derive(Debug, Default)]
pub struct Slot {
    pub lower: u32,
    pub upper: u32,
    pub value: i64,
    pub hook: MapHook,
}

impl Slot {
    pub fn new(lower: u32, upper: u32, value: i64) -> Self {
        Self {
            lower,
            upper,
            value,
            hook: MapHook::new(),
        }
    }

    pub fn covers(&self, point: u32) -> bool {
        self.lower <= point && point < self.upper
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SlotTraits;

impl NodeTraits for SlotTraits {
    type Node = Slot;
    type Key = u32;
    type Value = i64;

    fn lower(&self, node: &Slot) -> u32 {
        node.lower
    }

    fn upper(&self, node: &Slot) -> u32 {
        node.upper
    }

    fn value(&self, node: &Slot) -> i64 {
        node.value
    }

    fn hook<'n>(&self, node: &'n Slot) -> &'n MapHook {
        &node.hook
    }

    fn hook_mut<'n>(&self, node: &'n mut Slot) -> &'n mut MapHook {
        &mut node.hook
    }
}

/// Callback observed by [`RecordingTraits`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Inserted(SegmentId, u32),
    Removed(SegmentId, u32),
    ValueChanged(SegmentId, u32, i64, i64),
    LengthChanged(SegmentId, u32, Option<u32>),
}

/// Slot traits that log every callback in order
#[derive(Debug, Default)]
pub struct RecordingTraits {
    pub events: Vec<Event>,
}

impl NodeTraits for RecordingTraits {
    type Node = Slot;
    type Key = u32;
    type Value = i64;

    fn lower(&self, node: &Slot) -> u32 {
        node.lower
    }

    fn upper(&self, node: &Slot) -> u32 {
        node.upper
    }

    fn value(&self, node: &Slot) -> i64 {
        node.value
    }

    fn hook<'n>(&self, node: &'n Slot) -> &'n MapHook {
        &node.hook
    }

    fn hook_mut<'n>(&self, node: &'n mut Slot) -> &'n mut MapHook {
        &mut node.hook
    }

    fn on_value_changed(&mut self, id: SegmentId, seg: &Segment<u32, i64>, old: &i64, new: &i64) {
        self.events
            .push(Event::ValueChanged(id, *seg.key(), *old, *new));
    }

    fn on_length_changed(&mut self, id: SegmentId, seg: &Segment<u32, i64>, upper: Option<&u32>) {
        self.events
            .push(Event::LengthChanged(id, *seg.key(), upper.copied()));
    }

    fn on_segment_inserted(&mut self, id: SegmentId, seg: &Segment<u32, i64>) {
        self.events.push(Event::Inserted(id, *seg.key()));
    }

    fn on_segment_removed(&mut self, id: SegmentId, seg: &Segment<u32, i64>) {
        self.events.push(Event::Removed(id, *seg.key()));
    }
}

/// Every segment of `map` as `(lower, upper, aggregate)`
pub fn segments_of<T>(map: &IntervalMap<T>) -> Vec<(u32, u32, i64)>
where
    T: NodeTraits<Key = u32, Value = i64>,
{
    map.segments()
        .map(|seg| (*seg.lower(), *seg.upper(), *seg.value()))
        .collect()
}

/// Coverage at `point` computed directly from the live slots
pub fn brute_force<'a>(slots: impl IntoIterator<Item = &'a Slot>, point: u32) -> i64 {
    slots
        .into_iter()
        .filter(|slot| slot.hook.is_linked() && slot.covers(point))
        .map(|slot| slot.value)
        .sum()
}
