//! Identifiers and the id allocator shared by the graph stores.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Keyframe id within its owning collection. `-1` (`NONE`) marks "no keyframe".
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyframeId(pub i32);

impl KeyframeId {
    pub const NONE: KeyframeId = KeyframeId(-1);

    #[inline]
    pub fn is_none(self) -> bool {
        self.0 < 0
    }

    #[inline]
    pub fn is_some(self) -> bool {
        self.0 >= 0
    }
}

impl Default for KeyframeId {
    fn default() -> Self {
        KeyframeId::NONE
    }
}

impl fmt::Display for KeyframeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Category id (legacy hierarchical format).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(pub i32);

/// Animation entry id within a category (legacy hierarchical format).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(pub i32);

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Allocates `max(live) + 1` (or 0 when empty), but never below the session
/// high-water mark, so an id freed by a removal is not handed out again.
#[derive(Default, Debug, Clone)]
pub struct IdAllocator {
    // one past `i32::MAX` marks an exhausted id space
    next: i64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh id given the largest id still alive in the collection.
    /// Returns `None` once every non-negative `i32` has been handed out.
    #[inline]
    pub fn alloc(&mut self, max_live: Option<i32>) -> Option<i32> {
        let candidate = max_live.map_or(0, |m| i64::from(m) + 1).max(0);
        let id = i32::try_from(candidate.max(self.next)).ok()?;
        self.next = i64::from(id) + 1;
        Some(id)
    }

    /// Record an id inserted from outside (document load) so later allocations skip it.
    #[inline]
    pub fn observe(&mut self, id: i32) {
        self.next = self.next.max(i64::from(id) + 1);
    }

    #[inline]
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_follows_max_live() {
        let mut alloc = IdAllocator::new();
        assert_eq!(alloc.alloc(None), Some(0));
        assert_eq!(alloc.alloc(Some(0)), Some(1));
        assert_eq!(alloc.alloc(Some(1)), Some(2));
    }

    #[test]
    fn alloc_never_reuses_within_session() {
        let mut alloc = IdAllocator::new();
        assert_eq!(alloc.alloc(None), Some(0));
        assert_eq!(alloc.alloc(Some(0)), Some(1));
        // id 1 removed, max live is 0 again
        assert_eq!(alloc.alloc(Some(0)), Some(2));
        // everything removed
        assert_eq!(alloc.alloc(None), Some(3));
    }

    #[test]
    fn observe_bumps_high_water() {
        let mut alloc = IdAllocator::new();
        alloc.observe(7);
        assert_eq!(alloc.alloc(Some(3)), Some(8));
        alloc.reset();
        assert_eq!(alloc.alloc(None), Some(0));
    }

    #[test]
    fn alloc_stops_at_i32_max() {
        let mut alloc = IdAllocator::new();
        alloc.observe(i32::MAX - 1);
        assert_eq!(alloc.alloc(Some(i32::MAX - 1)), Some(i32::MAX));
        assert_eq!(alloc.alloc(Some(i32::MAX)), None);
        assert_eq!(alloc.alloc(None), None);

        let mut alloc = IdAllocator::new();
        alloc.observe(i32::MAX);
        assert_eq!(alloc.alloc(Some(i32::MAX)), None);
    }

    #[test]
    fn none_sentinel() {
        assert!(KeyframeId::NONE.is_none());
        assert!(KeyframeId(0).is_some());
        assert_eq!(KeyframeId::default(), KeyframeId::NONE);
        assert_eq!(serde_json::to_string(&KeyframeId(4)).unwrap(), "4");
    }
}
