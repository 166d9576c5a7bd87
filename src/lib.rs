//! segmap: Segment-Aggregating Interval Map
//!
//! This crate maintains a dynamic set of weighted intervals over an ordered key
//! domain and answers, for any point, the aggregated value of every interval
//! covering it. Interval records stay owned by the caller; the map only links
//! them through an embedded [`MapHook`] and keeps the per-segment aggregates of
//! the timeline they form.
//!
//! ```
//! use segmap::{IntervalMap, MapHook, NodeTraits};
//!
//! struct Reservation {
//!     start: u32,
//!     end: u32,
//!     units: i64,
//!     hook: MapHook,
//! }
//!
//! struct Units;
//!
//! impl NodeTraits for Units {
//!     type Node = Reservation;
//!     type Key = u32;
//!     type Value = i64;
//!
//!     fn lower(&self, r: &Reservation) -> u32 { r.start }
//!     fn upper(&self, r: &Reservation) -> u32 { r.end }
//!     fn value(&self, r: &Reservation) -> i64 { r.units }
//!     fn hook<'n>(&self, r: &'n Reservation) -> &'n MapHook { &r.hook }
//!     fn hook_mut<'n>(&self, r: &'n mut Reservation) -> &'n mut MapHook { &mut r.hook }
//! }
//!
//! let mut map = IntervalMap::new(Units);
//! let mut a = Reservation { start: 0, end: 10, units: 1, hook: MapHook::new() };
//! let mut b = Reservation { start: 5, end: 15, units: 2, hook: MapHook::new() };
//! map.insert(&mut a);
//! map.insert(&mut b);
//!
//! let timeline: Vec<_> = map
//!     .segments()
//!     .map(|s| (*s.lower(), *s.upper(), *s.value()))
//!     .collect();
//! assert_eq!(timeline, vec![(0, 5, 1), (5, 10, 3), (10, 15, 2)]);
//!
//! map.remove(&mut a);
//! assert_eq!(map.aggregate_at(&7), 2);
//! ```

#![warn(missing_docs)]

/// Per-map link embedded in caller records
pub mod hook;
/// Ordered point index over endpoint records
pub mod index;
/// Segment-maintenance engine and cursors
pub mod interval;
/// Endpoint and segment records
pub mod segment;
/// Caller-supplied accessors and callbacks
pub mod traits;

#[cfg(test)]
pub(crate) mod testing;


// Re-exports
pub use config::MapConfig;
pub use error::Error;
pub use hook::MapHook;
pub use index::PointIndex;
pub use interval::{IntervalMap, MapStats, SegmentCursor, SegmentRef, Segments};
pub use segment::{Role, Segment, SegmentId};
pub use traits::{Aggregate, NodeTraits};

/// Error types for interval map operations
pub mod error {
    /// Contract faults detected by an interval map
    ///
    /// None of these are recoverable runtime conditions; they indicate misuse
    /// by the caller or internal corruption.
    #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
    pub enum Error {
        /// The record's hook is already linked into a map
        #[error("interval is already indexed by an interval map")]
        AlreadyIndexed,
        /// The record's hook is not linked into any map
        #[error("interval is not indexed by this map")]
        NotIndexed,
        /// The record's hook is linked into a different map
        #[error("interval hook belongs to a different interval map")]
        ForeignHook,
        /// The record's lower bound exceeds its upper bound
        #[error("interval lower bound is greater than its upper bound")]
        InvertedBounds,
        /// The segment handle is dead or was issued by another map
        #[error("segment handle is stale or belongs to another map")]
        StaleSegment,
        /// Validation found an inconsistent index
        #[error("interval map corrupted: {0}")]
        Corrupted(String),
    }
}

/// Configuration options for interval maps
pub mod config {
    /// Configuration for an interval map instance
    #[derive(Debug, Clone, PartialEq, Eq)]
    #[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
    pub struct MapConfig {
        /// Endpoint slots to pre-allocate; two per interval
        pub initial_capacity: usize,
        /// Re-validate every aggregate after each insert and remove
        pub verify_mutations: bool,
    }

    impl Default for MapConfig {
        fn default() -> Self {
            Self {
                initial_capacity: 64,
                verify_mutations: false,
            }
        }
    }

    impl MapConfig {
        /// Configuration sized for `intervals` live intervals
        pub fn for_intervals(intervals: usize) -> Self {
            Self {
                initial_capacity: intervals.saturating_mul(2),
                ..Self::default()
            }
        }
    }
}
