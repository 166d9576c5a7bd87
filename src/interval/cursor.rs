//! Segment cursors and iterators
//!
//! A segment is the pair of two index-adjacent entries. The cursor holds both
//! handles; the past-the-end cursor holds neither. Cursors borrow the map, so
//! no insertion or removal can happen while one is alive.

use std::iter::FusedIterator;

use crate::index::PointIndex;
use crate::segment::{Segment, SegmentId};

/// Borrowed view of one segment
#[derive(Debug)]
pub struct SegmentRef<'a, K, V> {
    id: SegmentId,
    segment: &'a Segment<K, V>,
    upper: &'a K,
}

impl<'a, K, V> SegmentRef<'a, K, V> {
    /// Handle of the entry representing this segment
    pub fn id(&self) -> SegmentId {
        self.id
    }

    /// Lower key, owned by the representing entry
    pub fn lower(&self) -> &'a K {
        &self.segment.key
    }

    /// Key of the next entry in the index
    pub fn upper(&self) -> &'a K {
        self.upper
    }

    /// Aggregate of every interval covering the segment
    pub fn value(&self) -> &'a V {
        &self.segment.aggregate
    }

    pub fn segment(&self) -> &'a Segment<K, V> {
        self.segment
    }
}

impl<K: PartialEq, V> SegmentRef<'_, K, V> {
    /// Whether both bounds share a key
    pub fn is_empty(&self) -> bool {
        self.segment.key == *self.upper
    }
}

impl<K, V> Clone for SegmentRef<'_, K, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V> Copy for SegmentRef<'_, K, V> {}

/// Bidirectional cursor over the segments of a map
#[derive(Debug)]
pub struct SegmentCursor<'a, K, V> {
    index: &'a PointIndex<K, V>,
    lower: Option<SegmentId>,
    upper: Option<SegmentId>,
}

impl<'a, K: Ord + Clone, V> SegmentCursor<'a, K, V> {
    pub(crate) fn first(index: &'a PointIndex<K, V>) -> Self {
        Self::at(index, index.first())
    }

    pub(crate) fn end(index: &'a PointIndex<K, V>) -> Self {
        Self {
            index,
            lower: None,
            upper: None,
        }
    }

    /// Cursor on the segment starting at `lower`, or the end cursor if
    /// `lower` is the last entry
    pub(crate) fn at(index: &'a PointIndex<K, V>, lower: Option<SegmentId>) -> Self {
        let upper = lower.and_then(|id| index.next(id));
        match upper {
            Some(_) => Self {
                index,
                lower,
                upper,
            },
            None => Self::end(index),
        }
    }

    /// Whether the cursor is past the last segment
    pub fn is_end(&self) -> bool {
        self.lower.is_none()
    }

    /// Step to the next segment; stepping past the last reaches the end
    ///
    /// Returns `false` if the cursor was already at the end.
    pub fn move_next(&mut self) -> bool {
        let Some(upper) = self.upper else {
            return false;
        };
        match self.index.next(upper) {
            Some(next) => {
                self.lower = Some(upper);
                self.upper = Some(next);
            }
            None => {
                self.lower = None;
                self.upper = None;
            }
        }
        true
    }

    /// Step to the previous segment; from the end this reaches the last one
    ///
    /// Returns `false` if there is no previous segment.
    pub fn move_prev(&mut self) -> bool {
        let (lower, upper) = match self.lower {
            None => {
                let Some(last) = self.index.last() else {
                    return false;
                };
                (self.index.prev(last), Some(last))
            }
            Some(lower) => (self.index.prev(lower), Some(lower)),
        };
        if lower.is_none() {
            return false;
        }
        self.lower = lower;
        self.upper = upper;
        true
    }

    /// Step forward `steps` times, stopping at the end
    pub fn advance(&mut self, steps: usize) -> &mut Self {
        for _ in 0..steps {
            if !self.move_next() {
                break;
            }
        }
        self
    }

    /// Step back `steps` times, stopping at the first segment
    pub fn retreat(&mut self, steps: usize) -> &mut Self {
        for _ in 0..steps {
            if !self.move_prev() {
                break;
            }
        }
        self
    }

    /// Current segment, or `None` at the end
    pub fn get(&self) -> Option<SegmentRef<'a, K, V>> {
        let id = self.lower?;
        let segment = self.index.get(id)?;
        let upper = &self.index.get(self.upper?)?.key;
        Some(SegmentRef { id, segment, upper })
    }

    pub fn id(&self) -> Option<SegmentId> {
        self.lower
    }

    pub fn lower(&self) -> Option<&'a K> {
        self.get().map(|seg| seg.lower())
    }

    pub fn upper(&self) -> Option<&'a K> {
        self.get().map(|seg| seg.upper())
    }

    pub fn value(&self) -> Option<&'a V> {
        self.get().map(|seg| seg.value())
    }
}

impl<K, V> Clone for SegmentCursor<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            index: self.index,
            lower: self.lower,
            upper: self.upper,
        }
    }
}

impl<K, V> PartialEq for SegmentCursor<'_, K, V> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.index, other.index) && self.lower == other.lower
    }
}

impl<K, V> Eq for SegmentCursor<'_, K, V> {}

/// Iterator over every segment of a map, in ascending key order
#[derive(Debug, Clone)]
pub struct Segments<'a, K, V> {
    front: SegmentCursor<'a, K, V>,
    back: SegmentCursor<'a, K, V>,
    remaining: usize,
}

impl<'a, K: Ord + Clone, V> Segments<'a, K, V> {
    pub(crate) fn new(index: &'a PointIndex<K, V>) -> Self {
        let mut back = SegmentCursor::end(index);
        back.move_prev();
        Self {
            front: SegmentCursor::first(index),
            back,
            remaining: index.len().saturating_sub(1),
        }
    }
}

impl<'a, K: Ord + Clone, V> Iterator for Segments<'a, K, V> {
    type Item = SegmentRef<'a, K, V>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let item = self.front.get()?;
        self.front.move_next();
        self.remaining -= 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K: Ord + Clone, V> DoubleEndedIterator for Segments<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let item = self.back.get()?;
        self.back.move_prev();
        self.remaining -= 1;
        Some(item)
    }
}

impl<K: Ord + Clone, V> ExactSizeIterator for Segments<'_, K, V> {}

impl<K: Ord + Clone, V> FusedIterator for Segments<'_, K, V> {}
