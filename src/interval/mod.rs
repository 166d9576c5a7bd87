//! Interval map module
//!
//! This module provides the segment-maintenance engine that keeps per-segment
//! aggregates of a dynamic set of weighted intervals, and the cursors used to
//! walk the resulting timeline.

pub mod cursor;
pub mod map;

// Re-export key types
pub use cursor::{SegmentCursor, SegmentRef, Segments};
pub use map::{IntervalMap, MapStats};
