//! Chain traversal from a start keyframe along successor links.

use hashbrown::HashSet;

use crate::ids::KeyframeId;

/// Successor view over a keyframe collection.
pub trait KeyframeLinks {
    fn contains(&self, id: KeyframeId) -> bool;
    /// Successor of `id`; `KeyframeId::NONE` when absent or unset.
    fn next(&self, id: KeyframeId) -> KeyframeId;
}

/// Why a walk stopped.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ChainEnd {
    /// Reached a `NONE` successor.
    Terminated,
    /// Successor id not present in the collection.
    Dangling(KeyframeId),
    /// Successor already visited in this walk.
    Cycle(KeyframeId),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Traversal {
    /// Visited ids in walk order; each appears once.
    pub visited: Vec<KeyframeId>,
    pub end: ChainEnd,
}

impl Traversal {
    #[inline]
    pub fn is_truncated(&self) -> bool {
        matches!(self.end, ChainEnd::Cycle(_))
    }
}

/// Follow successor links from `start` until a `NONE`, a missing id or a revisit.
///
/// Never fails: a dangling successor ends the walk and a cycle truncates it,
/// both with a log line naming `resource`.
pub fn traverse<L: KeyframeLinks + ?Sized>(
    links: &L,
    start: KeyframeId,
    resource: &str,
) -> Traversal {
    let mut visited = Vec::new();
    let mut seen = HashSet::new();
    let mut current = start;

    let end = loop {
        if current.is_none() {
            break ChainEnd::Terminated;
        }
        if !links.contains(current) {
            log::debug!("{resource}: keyframe {current} not found, chain ends");
            break ChainEnd::Dangling(current);
        }
        if !seen.insert(current) {
            log::warn!("{resource}: cycle detected at keyframe {current}, bake truncated");
            break ChainEnd::Cycle(current);
        }
        visited.push(current);
        current = links.next(current);
    };

    Traversal { visited, end }
}
