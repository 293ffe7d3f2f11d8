//! Per-tick output of [`GraphPlayer::advance`](crate::player::GraphPlayer::advance).
//!
//! Continuous tracks produce `changes`; discrete keys (method calls, audio
//! starts) and playback transitions produce `events`.

use serde::{Deserialize, Serialize};

use crate::ids::KeyframeId;
use keygraph_api_core::Value;

/// Blended value for one source track this tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackSample {
    pub track: usize,
    pub path: String,
    pub value: Value,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum PlayerEvent {
    KeyframeEntered {
        keyframe: KeyframeId,
        source_frame_index: i32,
        time: f32,
    },
    MethodCall {
        path: String,
        method: String,
        args: Vec<Value>,
    },
    AudioStarted {
        path: String,
        stream: String,
        start_offset: f32,
        end_offset: f32,
    },
    PlaybackEnded {
        time: f32,
    },
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerFrame {
    #[serde(default)]
    pub changes: Vec<TrackSample>,
    #[serde(default)]
    pub events: Vec<PlayerEvent>,
}

impl PlayerFrame {
    #[inline]
    pub fn clear(&mut self) {
        self.changes.clear();
        self.events.clear();
    }

    #[inline]
    pub fn push_change(&mut self, change: TrackSample) {
        self.changes.push(change);
    }

    #[inline]
    pub fn push_event(&mut self, event: PlayerEvent) {
        self.events.push(event);
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty() && self.events.is_empty()
    }

    /// Sample for the track at `path`, if one changed.
    pub fn change(&self, path: &str) -> Option<&Value> {
        self.changes
            .iter()
            .find(|c| c.path == path)
            .map(|c| &c.value)
    }
}
