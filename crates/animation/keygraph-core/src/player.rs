//! Direct playback of a keyframe chain from a [`KeyframeCache`], without baking.
//!
//! The chain is fixed when the player is built. Each node spans `time`
//! seconds; inside a node, cached value and transform keys blend toward the
//! next node's keys on the same track using the node's ease. Zero-duration
//! nodes are entered, and fire their events, in the same tick as the node
//! that follows them.

use crate::cache::{CachedData, CachedKey, KeyframeCache};
use crate::graph::{Keyframe, KeyframeGraph};
use crate::ids::KeyframeId;
use crate::outputs::{PlayerEvent, PlayerFrame, TrackSample};
use keygraph_api_core::{lerp_value, Value};

#[derive(Clone, Debug)]
struct ChainNode {
    id: KeyframeId,
    start: f32,
    keyframe: Keyframe,
}

fn fmod(a: f32, b: f32) -> f32 {
    if b == 0.0 {
        return 0.0;
    }
    let m = a % b;
    if (m < 0.0 && b > 0.0) || (m > 0.0 && b < 0.0) {
        m + b
    } else {
        m
    }
}

fn continuous_value(data: &CachedData) -> Option<Value> {
    match data {
        CachedData::Value(v) => Some(v.clone()),
        CachedData::Transform(t) => Some(t.to_value()),
        CachedData::Method(_) | CachedData::Audio(_) => None,
    }
}

#[derive(Clone, Debug)]
pub struct GraphPlayer {
    name: String,
    chain: Vec<ChainNode>,
    length: f32,
    looping: bool,
    time: f32,
    scale: f32,
    playing: bool,
    current: Option<usize>,
}

impl GraphPlayer {
    /// Walk `graph` from its start keyframe and lay the chain out on a timeline.
    pub fn new(graph: &KeyframeGraph) -> Self {
        let walk = graph.bake_from(graph.start_frame_index());
        let mut chain = Vec::with_capacity(walk.visited.len());
        let mut start = 0.0f32;
        for id in walk.visited {
            let Some(kf) = graph.keyframe(id) else {
                continue;
            };
            chain.push(ChainNode {
                id,
                start,
                keyframe: kf.clone(),
            });
            start += kf.time.max(0.0);
        }
        Self {
            name: graph.name().to_string(),
            chain,
            length: start,
            looping: graph.loop_enabled(),
            time: 0.0,
            scale: 1.0,
            playing: false,
            current: None,
        }
    }

    pub fn length(&self) -> f32 {
        self.length
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn play(&mut self) {
        if !self.looping && self.time >= self.length {
            self.time = 0.0;
            self.current = None;
        }
        self.playing = true;
    }

    /// Stop and rewind.
    pub fn stop(&mut self) {
        self.playing = false;
        self.time = 0.0;
        self.current = None;
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn set_scale(&mut self, scale: f32) {
        self.scale = scale;
    }

    /// Jump to `time`; the node there is re-entered on the next advance.
    pub fn seek(&mut self, time: f32) {
        self.time = time.clamp(0.0, self.length);
        self.current = None;
    }

    /// Keyframe under the playhead, or `NONE` for an empty chain.
    pub fn current_keyframe(&self) -> KeyframeId {
        self.locate(self.time)
            .map_or(KeyframeId::NONE, |i| self.chain[i].id)
    }

    fn locate(&self, time: f32) -> Option<usize> {
        if self.chain.is_empty() {
            return None;
        }
        let n = self.chain.partition_point(|node| node.start <= time);
        Some(n.saturating_sub(1))
    }

    fn next_index(&self, idx: usize) -> Option<usize> {
        if idx + 1 < self.chain.len() {
            Some(idx + 1)
        } else if self.looping {
            Some(0)
        } else {
            None
        }
    }

    /// Move the playhead by `delta * scale` seconds and sample the chain.
    pub fn advance(&mut self, delta: f32, cache: &KeyframeCache) -> PlayerFrame {
        let mut frame = PlayerFrame::default();
        if !self.playing {
            return frame;
        }

        let raw = self.time + delta * self.scale;
        let mut wrapped = false;
        let mut ended = false;
        if self.length <= 0.0 {
            self.time = 0.0;
            ended = true;
        } else if self.looping {
            wrapped = raw >= self.length || raw < 0.0;
            self.time = fmod(raw, self.length);
        } else if raw >= self.length {
            self.time = self.length;
            ended = true;
        } else if raw < 0.0 {
            self.time = 0.0;
            ended = true;
        } else {
            self.time = raw;
        }

        if let Some(idx) = self.locate(self.time) {
            if wrapped || self.current != Some(idx) {
                let start = self.chain[idx].start;
                let mut first = idx;
                while first > 0 && self.chain[first - 1].start == start {
                    first -= 1;
                }
                for i in first..=idx {
                    self.enter(i, cache, &mut frame);
                }
            }
            self.sample(idx, cache, &mut frame);
        }

        if ended {
            self.playing = false;
            log::debug!("{}: playback ended at {}s", self.name, self.time);
            frame.push_event(PlayerEvent::PlaybackEnded { time: self.time });
        }
        frame
    }

    fn enter(&mut self, idx: usize, cache: &KeyframeCache, frame: &mut PlayerFrame) {
        self.current = Some(idx);
        let node = &self.chain[idx];
        frame.push_event(PlayerEvent::KeyframeEntered {
            keyframe: node.id,
            source_frame_index: node.keyframe.source_frame_index,
            time: node.start,
        });
        for key in cache.samples(node.keyframe.source_frame_index) {
            match &key.data {
                CachedData::Method(m) => frame.push_event(PlayerEvent::MethodCall {
                    path: key.path.clone(),
                    method: m.method.clone(),
                    args: m.args.clone(),
                }),
                CachedData::Audio(a) => frame.push_event(PlayerEvent::AudioStarted {
                    path: key.path.clone(),
                    stream: a.stream.clone(),
                    start_offset: a.start_offset,
                    end_offset: a.end_offset,
                }),
                CachedData::Value(_) | CachedData::Transform(_) => {}
            }
        }
    }

    fn sample(&self, idx: usize, cache: &KeyframeCache, frame: &mut PlayerFrame) {
        let node = &self.chain[idx];
        let duration = node.keyframe.time;
        let local = if duration > 0.0 {
            ((self.time - node.start) / duration).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let t = node.keyframe.ease(local);
        let next_keys: &[CachedKey] = self
            .next_index(idx)
            .map(|n| cache.samples(self.chain[n].keyframe.source_frame_index))
            .unwrap_or(&[]);

        for key in cache.samples(node.keyframe.source_frame_index) {
            let Some(a) = continuous_value(&key.data) else {
                continue;
            };
            let value = match next_keys
                .iter()
                .find(|k| k.track == key.track)
                .and_then(|k| continuous_value(&k.data))
            {
                Some(b) => lerp_value(&a, &b, t),
                None => a,
            };
            frame.push_change(TrackSample {
                track: key.track,
                path: key.path.clone(),
                value,
            });
        }
    }
}
