//! Error types for the graph stores, source animations and document codec.
//!
//! None of these abort a bake; they are returned from individual store or
//! track operations so the host can ignore or surface them.

use thiserror::Error;

use crate::animation::TrackKind;
use crate::ids::{CategoryId, EntryId, KeyframeId};

#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum GraphError {
    #[error("keyframe {0} not found")]
    KeyframeNotFound(KeyframeId),

    #[error("category {0} not found")]
    CategoryNotFound(CategoryId),

    #[error("animation {animation} not found in category {category}")]
    AnimationNotFound {
        category: CategoryId,
        animation: EntryId,
    },

    #[error("no free {0} id left")]
    IdsExhausted(&'static str),

    #[error("no source animation assigned to '{0}'")]
    MissingSourceAnimation(String),

    #[error("document parse error: {0}")]
    Parse(String),

    #[error("invalid document: {0}")]
    InvalidDocument(String),
}

impl GraphError {
    /// Missing ids at any nesting level.
    #[inline]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::KeyframeNotFound(_) | Self::CategoryNotFound(_) | Self::AnimationNotFound { .. }
        )
    }
}

impl From<serde_json::Error> for GraphError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum AnimationError {
    #[error("track {track} out of range (animation has {count} tracks)")]
    TrackOutOfRange { track: usize, count: usize },

    #[error("key {key} out of range on track {track}")]
    KeyOutOfRange { track: usize, key: usize },

    #[error("{actual:?} key does not fit {expected:?} track {track}")]
    KindMismatch {
        track: usize,
        expected: TrackKind,
        actual: TrackKind,
    },

    #[error("invalid key time {0}")]
    InvalidTime(f32),

    #[error("animation parse error: {0}")]
    Parse(String),
}

impl From<serde_json::Error> for AnimationError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}
