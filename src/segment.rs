//! Endpoint records stored in the point index
//!
//! Every indexed interval owns two of these records, one per boundary. Each
//! record doubles as the segment running from its key up to the key of the
//! next entry in the index.

use std::cmp::Ordering;

use generational_arena::Index;

/// Which boundary of its interval an endpoint represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub enum Role {
    /// Lower bound of the owning interval
    Begin,
    /// Upper bound of the owning interval
    End,
}

/// Stable handle to an endpoint record inside one map
///
/// Handles stay valid until the owning interval is removed. A handle kept past
/// that point, or presented to a different map, is detected as stale rather
/// than aliasing another entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SegmentId {
    pub(crate) owner: u64,
    pub(crate) slot: Index,
}

/// An endpoint record and the segment starting at it
#[derive(Debug, Clone)]
pub struct Segment<K, V> {
    pub(crate) key: K,
    pub(crate) seq: u64,
    pub(crate) role: Role,
    pub(crate) contribution: V,
    pub(crate) aggregate: V,
}

impl<K, V> Segment<K, V> {
    pub(crate) fn new(key: K, seq: u64, role: Role, contribution: V, aggregate: V) -> Self {
        Self {
            key,
            seq,
            role,
            contribution,
            aggregate,
        }
    }

    /// Key of the boundary, fixed while indexed
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Insertion sequence, the tie-break among equal keys
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Boundary role within the owning interval
    pub fn role(&self) -> Role {
        self.role
    }

    /// Value of the owning interval, captured at insertion
    pub fn contribution(&self) -> &V {
        &self.contribution
    }

    /// Combined value of every interval covering this segment
    pub fn aggregate(&self) -> &V {
        &self.aggregate
    }

    pub fn is_begin(&self) -> bool {
        self.role == Role::Begin
    }
}

impl<K: Ord, V> PartialEq for Segment<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.seq == other.seq
    }
}

impl<K: Ord, V> Eq for Segment<K, V> {}

impl<K: Ord, V> PartialOrd for Segment<K, V> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K: Ord, V> Ord for Segment<K, V> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key
            .cmp(&other.key)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}
