//! Per-frame-index snapshots of source keys for direct playback.
//!
//! Unlike a bake, the cache keeps the source's key records as-is, keyed by the
//! `source_frame_index` the keyframes reference.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::animation::{AnimationSource, AudioKey, KeyData, MethodKey, TransformKey};
use crate::error::GraphError;
use crate::graph::KeyframeGraph;
use keygraph_api_core::Value;

/// Typed key snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum CachedData {
    Value(Value),
    Transform(TransformKey),
    Method(MethodKey),
    Audio(AudioKey),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CachedKey {
    /// Source track the key was read from.
    pub track: usize,
    pub path: String,
    pub data: CachedData,
}

#[derive(Clone, Debug, Default)]
pub struct KeyframeCache {
    entries: HashMap<i32, Vec<CachedKey>>,
}

fn snapshot(data: &KeyData) -> Option<CachedData> {
    match data {
        KeyData::Value(v) => Some(CachedData::Value(v.clone())),
        KeyData::Transform(t) => Some(CachedData::Transform(*t)),
        KeyData::Method(m) => Some(CachedData::Method(m.clone())),
        KeyData::Audio(a) => Some(CachedData::Audio(a.clone())),
        KeyData::Bezier(b) => Some(CachedData::Value(Value::Float(b.value))),
        KeyData::Animation(_) => None,
    }
}

impl KeyframeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild every index referenced by a live keyframe of `graph`, using its
    /// assigned source animation. Returns the number of cached indices.
    pub fn initialize(&mut self, graph: &KeyframeGraph) -> Result<usize, GraphError> {
        let source = graph
            .animation()
            .ok_or_else(|| GraphError::MissingSourceAnimation(graph.name().to_string()))?;
        Ok(self.initialize_with(graph, source.as_ref()))
    }

    /// Like [`initialize`](Self::initialize) with an explicit source.
    pub fn initialize_with(
        &mut self,
        graph: &KeyframeGraph,
        source: &dyn AnimationSource,
    ) -> usize {
        self.entries.clear();
        let fps = graph.config().effective_fps(graph.animation_fps());
        let mut indices: Vec<i32> = graph
            .keyframes()
            .map(|(_, kf)| kf.source_frame_index)
            .collect();
        indices.sort_unstable();
        indices.dedup();
        for &index in &indices {
            self.rebuild_index(index, source, fps);
        }
        log::debug!(
            "{}: cached {} frame indices from '{}'",
            graph.name(),
            indices.len(),
            source.name()
        );
        indices.len()
    }

    /// Clear and repopulate one index. Returns the number of keys captured.
    pub fn rebuild_index(&mut self, index: i32, source: &dyn AnimationSource, fps: f32) -> usize {
        let sample_time = index as f32 * source.length() / fps;
        let mut keys = Vec::new();
        for track in 0..source.track_count() {
            let Some(key) = source.find_key(track, sample_time, false) else {
                continue;
            };
            let Some(data) = source.key_data(track, key).and_then(snapshot) else {
                continue;
            };
            keys.push(CachedKey {
                track,
                path: source.track_path(track).unwrap_or_default().to_string(),
                data,
            });
        }
        let count = keys.len();
        self.entries.insert(index, keys);
        count
    }

    /// Cached keys for `index`; empty when the index was never built.
    pub fn samples(&self, index: i32) -> &[CachedKey] {
        self.entries.get(&index).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_index(&self, index: i32) -> bool {
        self.entries.contains_key(&index)
    }

    /// Cached indices in ascending order.
    pub fn indices(&self) -> Vec<i32> {
        let mut out: Vec<i32> = self.entries.keys().copied().collect();
        out.sort_unstable();
        out
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
