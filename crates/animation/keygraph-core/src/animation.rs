//! Source animation model: a multi-track keyframe timeline.
//!
//! The graph never owns its source animation; it reads it through the
//! [`AnimationSource`] trait. [`Animation`] is the in-crate implementation and
//! also the shape of every bake result.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::AnimationError;
use keygraph_api_core::Value;

/// Two key times closer than this are the same time.
pub const KEY_TIME_EPSILON: f32 = 1e-4;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackKind {
    Value,
    Transform,
    Method,
    Bezier,
    Audio,
    Animation,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterpolationMode {
    Nearest,
    #[default]
    Linear,
    Cubic,
}

/// Location, rotation (quat x,y,z,w) and scale of a transform key.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransformKey {
    pub location: [f32; 3],
    pub rotation: [f32; 4],
    pub scale: [f32; 3],
}

impl Default for TransformKey {
    fn default() -> Self {
        Self {
            location: [0.0; 3],
            rotation: [0.0, 0.0, 0.0, 1.0],
            scale: [1.0; 3],
        }
    }
}

impl TransformKey {
    pub fn to_value(&self) -> Value {
        Value::transform(self.location, self.rotation, self.scale)
    }

    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Transform { pos, rot, scale } => Some(Self {
                location: *pos,
                rotation: *rot,
                scale: *scale,
            }),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MethodKey {
    pub method: String,
    #[serde(default)]
    pub args: Vec<Value>,
}

/// Bezier key; handles are (time, value) offsets relative to the key.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BezierKey {
    pub value: f32,
    #[serde(default)]
    pub in_handle: [f32; 2],
    #[serde(default)]
    pub out_handle: [f32; 2],
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AudioKey {
    pub stream: String,
    #[serde(default)]
    pub start_offset: f32,
    #[serde(default)]
    pub end_offset: f32,
}

/// Payload of one key; the variant must match the owning track's kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum KeyData {
    Value(Value),
    Transform(TransformKey),
    Method(MethodKey),
    Bezier(BezierKey),
    Audio(AudioKey),
    /// Name of a sub-animation to start.
    Animation(String),
}

impl KeyData {
    #[inline]
    pub fn kind(&self) -> TrackKind {
        match self {
            KeyData::Value(_) => TrackKind::Value,
            KeyData::Transform(_) => TrackKind::Transform,
            KeyData::Method(_) => TrackKind::Method,
            KeyData::Bezier(_) => TrackKind::Bezier,
            KeyData::Audio(_) => TrackKind::Audio,
            KeyData::Animation(_) => TrackKind::Animation,
        }
    }
}

fn default_transition() -> f32 {
    1.0
}

fn default_true() -> bool {
    true
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Key {
    pub time: f32,
    /// Ease exponent applied when blending from this key to the next.
    #[serde(default = "default_transition")]
    pub transition: f32,
    pub data: KeyData,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Target path, e.g. "Body/Sprite:frame".
    pub path: String,
    pub kind: TrackKind,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub interpolation: InterpolationMode,
    /// On looping animations, blend the last key back into the first.
    #[serde(default = "default_true")]
    pub loop_wrap: bool,
    /// Sorted by time.
    #[serde(default)]
    pub keys: Vec<Key>,
}

impl Track {
    pub fn new(kind: TrackKind, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind,
            enabled: true,
            interpolation: InterpolationMode::default(),
            loop_wrap: true,
            keys: Vec::new(),
        }
    }

    /// Index of the last key at or before `time`.
    pub fn key_at_or_before(&self, time: f32) -> Option<usize> {
        let n = self
            .keys
            .partition_point(|k| k.time <= time + KEY_TIME_EPSILON);
        n.checked_sub(1)
    }

    /// Index of a key whose time matches `time` within [`KEY_TIME_EPSILON`].
    pub fn key_exact(&self, time: f32) -> Option<usize> {
        self.key_at_or_before(time)
            .filter(|&i| (self.keys[i].time - time).abs() <= KEY_TIME_EPSILON)
    }
}

/// Multi-track animation asset.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Animation {
    #[serde(default)]
    pub name: String,
    /// Duration in seconds.
    pub length: f32,
    #[serde(rename = "loop", default)]
    pub loop_enabled: bool,
    #[serde(default)]
    pub tracks: Vec<Track>,
}

impl Animation {
    pub fn new(name: impl Into<String>, length: f32) -> Self {
        Self {
            name: name.into(),
            length,
            loop_enabled: false,
            tracks: Vec::new(),
        }
    }

    /// Append a track, returning its index.
    pub fn add_track(&mut self, kind: TrackKind, path: impl Into<String>) -> usize {
        self.tracks.push(Track::new(kind, path));
        self.tracks.len() - 1
    }

    pub fn remove_track(&mut self, track: usize) -> Result<Track, AnimationError> {
        self.check_track(track)?;
        Ok(self.tracks.remove(track))
    }

    pub fn track(&self, track: usize) -> Option<&Track> {
        self.tracks.get(track)
    }

    pub fn track_mut(&mut self, track: usize) -> Option<&mut Track> {
        self.tracks.get_mut(track)
    }

    pub fn key_count(&self, track: usize) -> usize {
        self.tracks.get(track).map_or(0, |t| t.keys.len())
    }

    fn check_track(&self, track: usize) -> Result<&Track, AnimationError> {
        self.tracks
            .get(track)
            .ok_or(AnimationError::TrackOutOfRange {
                track,
                count: self.tracks.len(),
            })
    }

    /// Insert a key keeping the track sorted. A key already at `time` is replaced.
    /// Returns the index of the inserted key.
    pub fn insert_key(
        &mut self,
        track: usize,
        time: f32,
        data: KeyData,
        transition: f32,
    ) -> Result<usize, AnimationError> {
        if !time.is_finite() {
            return Err(AnimationError::InvalidTime(time));
        }
        let expected = self.check_track(track)?.kind;
        if data.kind() != expected {
            return Err(AnimationError::KindMismatch {
                track,
                expected,
                actual: data.kind(),
            });
        }

        let t = &mut self.tracks[track];
        let key = Key {
            time,
            transition,
            data,
        };
        if let Some(idx) = t.key_exact(time) {
            t.keys[idx] = key;
            return Ok(idx);
        }
        let idx = t.keys.partition_point(|k| k.time < time);
        t.keys.insert(idx, key);
        Ok(idx)
    }

    pub fn remove_key(&mut self, track: usize, key: usize) -> Result<Key, AnimationError> {
        let t = self
            .tracks
            .get_mut(track)
            .ok_or(AnimationError::KeyOutOfRange { track, key })?;
        if key >= t.keys.len() {
            return Err(AnimationError::KeyOutOfRange { track, key });
        }
        Ok(t.keys.remove(key))
    }

    /// Check sorted key times, key kinds and a non-negative length.
    pub fn validate(&self) -> Result<(), AnimationError> {
        if !self.length.is_finite() || self.length < 0.0 {
            return Err(AnimationError::InvalidTime(self.length));
        }
        for (ti, track) in self.tracks.iter().enumerate() {
            let mut last = f32::NEG_INFINITY;
            for key in &track.keys {
                if !key.time.is_finite() || key.time < last {
                    return Err(AnimationError::InvalidTime(key.time));
                }
                if key.data.kind() != track.kind {
                    return Err(AnimationError::KindMismatch {
                        track: ti,
                        expected: track.kind,
                        actual: key.data.kind(),
                    });
                }
                last = key.time;
            }
        }
        Ok(())
    }
}

/// Read-only view of a source animation, as consumed by the bake engine and
/// the keyframe cache.
pub trait AnimationSource: fmt::Debug {
    fn name(&self) -> &str;
    /// Duration in seconds.
    fn length(&self) -> f32;
    fn loop_enabled(&self) -> bool;

    fn track_count(&self) -> usize;
    fn track_kind(&self, track: usize) -> Option<TrackKind>;
    fn track_path(&self, track: usize) -> Option<&str>;
    fn track_enabled(&self, track: usize) -> bool;
    fn track_interpolation(&self, track: usize) -> InterpolationMode;

    /// Key at `time`. With `exact` the key time must match; otherwise the
    /// nearest key at or before `time` is returned.
    fn find_key(&self, track: usize, time: f32, exact: bool) -> Option<usize>;
    fn key_time(&self, track: usize, key: usize) -> Option<f32>;
    fn key_data(&self, track: usize, key: usize) -> Option<&KeyData>;

    fn key_value(&self, track: usize, key: usize) -> Option<&Value> {
        match self.key_data(track, key)? {
            KeyData::Value(v) => Some(v),
            _ => None,
        }
    }

    fn key_transform(&self, track: usize, key: usize) -> Option<&TransformKey> {
        match self.key_data(track, key)? {
            KeyData::Transform(t) => Some(t),
            _ => None,
        }
    }

    fn key_method(&self, track: usize, key: usize) -> Option<&MethodKey> {
        match self.key_data(track, key)? {
            KeyData::Method(m) => Some(m),
            _ => None,
        }
    }

    fn key_audio(&self, track: usize, key: usize) -> Option<&AudioKey> {
        match self.key_data(track, key)? {
            KeyData::Audio(a) => Some(a),
            _ => None,
        }
    }

    fn key_bezier(&self, track: usize, key: usize) -> Option<&BezierKey> {
        match self.key_data(track, key)? {
            KeyData::Bezier(b) => Some(b),
            _ => None,
        }
    }
}

impl AnimationSource for Animation {
    fn name(&self) -> &str {
        &self.name
    }

    fn length(&self) -> f32 {
        self.length
    }

    fn loop_enabled(&self) -> bool {
        self.loop_enabled
    }

    fn track_count(&self) -> usize {
        self.tracks.len()
    }

    fn track_kind(&self, track: usize) -> Option<TrackKind> {
        self.tracks.get(track).map(|t| t.kind)
    }

    fn track_path(&self, track: usize) -> Option<&str> {
        self.tracks.get(track).map(|t| t.path.as_str())
    }

    fn track_enabled(&self, track: usize) -> bool {
        self.tracks.get(track).is_some_and(|t| t.enabled)
    }

    fn track_interpolation(&self, track: usize) -> InterpolationMode {
        self.tracks
            .get(track)
            .map(|t| t.interpolation)
            .unwrap_or_default()
    }

    fn find_key(&self, track: usize, time: f32, exact: bool) -> Option<usize> {
        let t = self.tracks.get(track)?;
        if exact {
            t.key_exact(time)
        } else {
            t.key_at_or_before(time)
        }
    }

    fn key_time(&self, track: usize, key: usize) -> Option<f32> {
        self.tracks.get(track)?.keys.get(key).map(|k| k.time)
    }

    fn key_data(&self, track: usize, key: usize) -> Option<&KeyData> {
        self.tracks.get(track)?.keys.get(key).map(|k| &k.data)
    }
}
