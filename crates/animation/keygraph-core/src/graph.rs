//! Flat keyframe graph: an id-addressed map of keyframes linked by successor ids.
//!
//! Removing a keyframe never rewrites other keyframes' `next_keyframe`; a
//! dangling successor simply ends the chain during traversal.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::animation::AnimationSource;
use crate::baking::{bake_graph, BakeReport};
use crate::config::Config;
use crate::error::GraphError;
use crate::ids::{IdAllocator, KeyframeId};
use crate::traverse::{traverse, KeyframeLinks, Traversal};
use keygraph_api_core::{ease, EaseCurve};

/// One graph node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Keyframe {
    pub name: String,
    /// Frame of the source animation this node samples.
    pub source_frame_index: i32,
    pub next_keyframe: KeyframeId,
    /// Ease exponent toward the next node; 0 snaps, 1 is linear.
    pub transition: f32,
    /// Seconds this node occupies on the output timeline.
    pub time: f32,
    /// Editor layout only.
    pub position: [f32; 2],
    /// Replaces `transition` when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub curve: Option<EaseCurve>,
}

impl Keyframe {
    pub fn with_defaults(cfg: &Config) -> Self {
        Self {
            name: String::new(),
            source_frame_index: 0,
            next_keyframe: KeyframeId::NONE,
            transition: cfg.default_transition,
            time: cfg.default_keyframe_time,
            position: [0.0, 0.0],
            curve: None,
        }
    }

    /// Eased blend factor for `t` in [0,1].
    pub fn ease(&self, t: f32) -> f32 {
        match &self.curve {
            Some(curve) if !curve.is_empty() => curve.interpolate(t),
            _ if self.transition == 1.0 => t.clamp(0.0, 1.0),
            _ => ease(t, self.transition),
        }
    }
}

impl Default for Keyframe {
    fn default() -> Self {
        Self::with_defaults(&Config::default())
    }
}

#[derive(Clone, Debug)]
pub struct KeyframeGraph {
    name: String,
    keyframes: BTreeMap<KeyframeId, Keyframe>,
    ids: IdAllocator,
    start_frame_index: KeyframeId,
    start_node_position: [f32; 2],
    length: f32,
    loop_enabled: bool,
    animation_fps: f32,
    animation: Option<Arc<dyn AnimationSource>>,
    frame_labels: BTreeMap<i32, String>,
    config: Config,
}

impl Default for KeyframeGraph {
    fn default() -> Self {
        Self::with_config("", Config::default())
    }
}

fn missing(graph: &str, id: KeyframeId) -> GraphError {
    log::warn!("{graph}: keyframe {id} not found");
    GraphError::KeyframeNotFound(id)
}

macro_rules! keyframe_field {
    ($get:ident, $set:ident, $field:ident, $ty:ty) => {
        pub fn $get(&self, id: KeyframeId) -> $ty {
            self.keyframes
                .get(&id)
                .map(|k| k.$field.clone())
                .unwrap_or_default()
        }

        pub fn $set(&mut self, id: KeyframeId, value: $ty) -> Result<(), GraphError> {
            let kf = self.keyframe_mut(id)?;
            kf.$field = value;
            Ok(())
        }
    };
}

impl KeyframeGraph {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, Config::default())
    }

    pub fn with_config(name: impl Into<String>, config: Config) -> Self {
        Self {
            name: name.into(),
            keyframes: BTreeMap::new(),
            ids: IdAllocator::new(),
            start_frame_index: KeyframeId::NONE,
            start_node_position: [0.0, 0.0],
            length: 0.0,
            loop_enabled: false,
            animation_fps: config.default_animation_fps,
            animation: None,
            frame_labels: BTreeMap::new(),
            config,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // ---- keyframes ----

    /// Insert a default keyframe under a fresh id.
    /// Fails only once the id space is exhausted; live keyframes are never replaced.
    pub fn add_keyframe(&mut self) -> Result<KeyframeId, GraphError> {
        let max_live = self.keyframes.keys().next_back().map(|k| k.0);
        let Some(id) = self.ids.alloc(max_live).map(KeyframeId) else {
            log::warn!("{}: no free keyframe id left", self.name);
            return Err(GraphError::IdsExhausted("keyframe"));
        };
        self.keyframes.insert(id, Keyframe::with_defaults(&self.config));
        Ok(id)
    }

    /// Insert `keyframe` under a caller-chosen id, replacing any existing one.
    /// Used by document loading; later allocations skip past `id`.
    pub fn insert_keyframe(
        &mut self,
        id: KeyframeId,
        keyframe: Keyframe,
    ) -> Result<(), GraphError> {
        if id.is_none() {
            return Err(GraphError::InvalidDocument(format!(
                "keyframe id {id} is negative"
            )));
        }
        self.ids.observe(id.0);
        self.keyframes.insert(id, keyframe);
        Ok(())
    }

    pub fn remove_keyframe(&mut self, id: KeyframeId) -> Result<Keyframe, GraphError> {
        self.keyframes.remove(&id).ok_or_else(|| self.not_found(id))
    }

    pub fn has_keyframe(&self, id: KeyframeId) -> bool {
        self.keyframes.contains_key(&id)
    }

    pub fn keyframe(&self, id: KeyframeId) -> Option<&Keyframe> {
        self.keyframes.get(&id)
    }

    fn keyframe_mut(&mut self, id: KeyframeId) -> Result<&mut Keyframe, GraphError> {
        let name = &self.name;
        self.keyframes
            .get_mut(&id)
            .ok_or_else(|| missing(name, id))
    }

    fn not_found(&self, id: KeyframeId) -> GraphError {
        missing(&self.name, id)
    }

    /// Live keyframe ids in ascending order.
    pub fn keyframe_indices(&self) -> Vec<KeyframeId> {
        self.keyframes.keys().copied().collect()
    }

    pub fn keyframes(&self) -> impl Iterator<Item = (KeyframeId, &Keyframe)> {
        self.keyframes.iter().map(|(id, kf)| (*id, kf))
    }

    pub fn len(&self) -> usize {
        self.keyframes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    keyframe_field!(keyframe_name, set_keyframe_name, name, String);
    keyframe_field!(
        keyframe_source_frame_index,
        set_keyframe_source_frame_index,
        source_frame_index,
        i32
    );
    keyframe_field!(keyframe_next, set_keyframe_next, next_keyframe, KeyframeId);
    keyframe_field!(keyframe_transition, set_keyframe_transition, transition, f32);
    keyframe_field!(keyframe_time, set_keyframe_time, time, f32);
    keyframe_field!(keyframe_position, set_keyframe_position, position, [f32; 2]);
    keyframe_field!(keyframe_curve, set_keyframe_curve, curve, Option<EaseCurve>);

    // ---- graph-level state ----

    pub fn start_frame_index(&self) -> KeyframeId {
        self.start_frame_index
    }

    /// Any id is accepted; a missing one bakes an empty chain.
    pub fn set_start_frame_index(&mut self, id: KeyframeId) {
        self.start_frame_index = id;
    }

    pub fn start_node_position(&self) -> [f32; 2] {
        self.start_node_position
    }

    pub fn set_start_node_position(&mut self, position: [f32; 2]) {
        self.start_node_position = position;
    }

    pub fn length(&self) -> f32 {
        self.length
    }

    pub fn set_length(&mut self, length: f32) {
        self.length = length;
    }

    pub fn loop_enabled(&self) -> bool {
        self.loop_enabled
    }

    pub fn set_loop(&mut self, enabled: bool) {
        self.loop_enabled = enabled;
    }

    pub fn animation_fps(&self) -> f32 {
        self.animation_fps
    }

    pub fn set_animation_fps(&mut self, fps: f32) {
        self.animation_fps = fps;
    }

    pub fn animation(&self) -> Option<&Arc<dyn AnimationSource>> {
        self.animation.as_ref()
    }

    pub fn set_animation(&mut self, animation: Option<Arc<dyn AnimationSource>>) {
        self.animation = animation;
    }

    // ---- frame labels ----

    pub fn set_frame_label(&mut self, frame: i32, label: impl Into<String>) {
        self.frame_labels.insert(frame, label.into());
    }

    /// Label for `frame`, or an empty string.
    pub fn frame_label(&self, frame: i32) -> &str {
        self.frame_labels.get(&frame).map_or("", String::as_str)
    }

    pub fn remove_frame_label(&mut self, frame: i32) -> Option<String> {
        self.frame_labels.remove(&frame)
    }

    pub fn frame_labels(&self) -> &BTreeMap<i32, String> {
        &self.frame_labels
    }

    // ---- bake ----

    /// Walk the chain from `start`.
    pub fn bake_from(&self, start: KeyframeId) -> Traversal {
        traverse(self, start, &self.name)
    }

    /// Bake against the assigned source animation. Also stores the baked length.
    pub fn bake(&mut self) -> Result<BakeReport, GraphError> {
        let source = self
            .animation
            .clone()
            .ok_or_else(|| GraphError::MissingSourceAnimation(self.name.clone()))?;
        let report = self.bake_with(source.as_ref());
        self.length = report.animation.length;
        Ok(report)
    }

    /// Bake against an explicit source without touching graph state.
    pub fn bake_with(&self, source: &dyn AnimationSource) -> BakeReport {
        bake_graph(self, source)
    }
}

impl KeyframeLinks for KeyframeGraph {
    fn contains(&self, id: KeyframeId) -> bool {
        self.keyframes.contains_key(&id)
    }

    fn next(&self, id: KeyframeId) -> KeyframeId {
        self.keyframes
            .get(&id)
            .map_or(KeyframeId::NONE, |k| k.next_keyframe)
    }
}
