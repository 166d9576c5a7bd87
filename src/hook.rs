//! Per-map link embedded in caller records

use crate::segment::SegmentId;

/// Handles of an indexed record's two endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Link {
    /// Identity of the owning map
    pub map_id: u64,
    pub begin: SegmentId,
    pub end: SegmentId,
}

/// Embedded in a caller record once per map it participates in
///
/// A fresh hook is unlinked. Inserting the record links it to the map's
/// endpoints; removing it resets it, after which the record can be dropped or
/// inserted again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapHook {
    link: Option<Link>,
}

impl MapHook {
    /// Create an unlinked hook
    pub const fn new() -> Self {
        Self { link: None }
    }

    /// Whether the record is currently indexed by some map
    pub fn is_linked(&self) -> bool {
        self.link.is_some()
    }

    /// Begin endpoint, while linked
    pub fn begin(&self) -> Option<SegmentId> {
        self.link.map(|l| l.begin)
    }

    /// End endpoint, while linked
    pub fn end(&self) -> Option<SegmentId> {
        self.link.map(|l| l.end)
    }

    pub(crate) fn link(&self) -> Option<Link> {
        self.link
    }

    pub(crate) fn set(&mut self, link: Link) {
        self.link = Some(link);
    }

    pub(crate) fn reset(&mut self) {
        self.link = None;
    }
}
