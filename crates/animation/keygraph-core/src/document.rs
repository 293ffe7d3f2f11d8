//! JSON documents for the flat graph, the legacy category hierarchy and source animations.
//!
//! Documents are plain record lists; converting into a store validates ids and
//! reseeds the id allocators so later additions never collide with loaded ids.

use hashbrown::HashSet;
use serde::{Deserialize, Serialize};

use crate::animation::Animation;
use crate::config::Config;
use crate::error::{AnimationError, GraphError};
use crate::graph::{Keyframe, KeyframeGraph};
use crate::ids::{CategoryId, EntryId, KeyframeId};
use crate::legacy::{AnimationEntry, Category, CategoryStore};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KeyframeRecord {
    pub id: KeyframeId,
    #[serde(flatten)]
    pub keyframe: Keyframe,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameLabelRecord {
    pub frame: i32,
    pub label: String,
}

/// Flat keyframe graph document.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    #[serde(default)]
    pub name: String,
    /// Name of the source animation, informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animation: Option<String>,
    #[serde(default)]
    pub start_frame_index: KeyframeId,
    #[serde(default)]
    pub start_node_position: [f32; 2],
    #[serde(default)]
    pub length: f32,
    #[serde(rename = "loop", default)]
    pub loop_enabled: bool,
    /// Falls back to the configured default when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animation_fps: Option<f32>,
    #[serde(default)]
    pub keyframes: Vec<KeyframeRecord>,
    #[serde(default)]
    pub frame_labels: Vec<FrameLabelRecord>,
}

fn check_unique<I: IntoIterator<Item = i32>>(ids: I, what: &str) -> Result<(), GraphError> {
    let mut seen = HashSet::new();
    for id in ids {
        if id < 0 {
            return Err(GraphError::InvalidDocument(format!("negative {what} id {id}")));
        }
        if !seen.insert(id) {
            return Err(GraphError::InvalidDocument(format!("duplicate {what} id {id}")));
        }
    }
    Ok(())
}

fn keyframe_records<'a>(
    iter: impl Iterator<Item = (KeyframeId, &'a Keyframe)>,
) -> Vec<KeyframeRecord> {
    iter.map(|(id, kf)| KeyframeRecord {
        id,
        keyframe: kf.clone(),
    })
    .collect()
}

impl GraphDocument {
    pub fn from_graph(graph: &KeyframeGraph) -> Self {
        Self {
            name: graph.name().to_string(),
            animation: graph.animation().map(|a| a.name().to_string()),
            start_frame_index: graph.start_frame_index(),
            start_node_position: graph.start_node_position(),
            length: graph.length(),
            loop_enabled: graph.loop_enabled(),
            animation_fps: Some(graph.animation_fps()),
            keyframes: keyframe_records(graph.keyframes()),
            frame_labels: graph
                .frame_labels()
                .iter()
                .map(|(frame, label)| FrameLabelRecord {
                    frame: *frame,
                    label: label.clone(),
                })
                .collect(),
        }
    }

    /// Build a graph. The source animation is not part of the document and
    /// must be assigned by the host afterwards.
    pub fn into_graph(self, config: Config) -> Result<KeyframeGraph, GraphError> {
        check_unique(self.keyframes.iter().map(|r| r.id.0), "keyframe")?;

        let fps = self.animation_fps.unwrap_or(config.default_animation_fps);
        let mut graph = KeyframeGraph::with_config(self.name, config);
        for record in self.keyframes {
            graph.insert_keyframe(record.id, record.keyframe)?;
        }
        graph.set_start_frame_index(self.start_frame_index);
        graph.set_start_node_position(self.start_node_position);
        graph.set_length(self.length);
        graph.set_loop(self.loop_enabled);
        graph.set_animation_fps(fps);
        for label in self.frame_labels {
            graph.set_frame_label(label.frame, label.label);
        }
        Ok(graph)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnimationRecord {
    pub id: EntryId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub position: [f32; 2],
    #[serde(default)]
    pub start_frame_index: KeyframeId,
    #[serde(default)]
    pub keyframes: Vec<KeyframeRecord>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CategoryRecord {
    pub id: CategoryId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub animations: Vec<AnimationRecord>,
}

/// Legacy category → animation → keyframe document.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LegacyDocument {
    #[serde(default)]
    pub categories: Vec<CategoryRecord>,
}

impl LegacyDocument {
    pub fn from_store(store: &CategoryStore) -> Self {
        let categories = store
            .category_indices()
            .into_iter()
            .filter_map(|cid| {
                let cat = store.category(cid)?;
                Some(CategoryRecord {
                    id: cid,
                    name: cat.name.clone(),
                    animations: cat
                        .animations()
                        .map(|(aid, entry)| AnimationRecord {
                            id: aid,
                            name: entry.name.clone(),
                            position: entry.position,
                            start_frame_index: entry.start_frame_index,
                            keyframes: keyframe_records(entry.keyframes()),
                        })
                        .collect(),
                })
            })
            .collect();
        Self { categories }
    }

    pub fn into_store(self) -> Result<CategoryStore, GraphError> {
        check_unique(self.categories.iter().map(|c| c.id.0), "category")?;
        let mut store = CategoryStore::new();
        for crec in self.categories {
            check_unique(crec.animations.iter().map(|a| a.id.0), "animation")?;
            let mut category = Category::default();
            category.name = crec.name;
            for arec in crec.animations {
                check_unique(arec.keyframes.iter().map(|k| k.id.0), "keyframe")?;
                let mut entry = AnimationEntry::default();
                entry.name = arec.name;
                entry.position = arec.position;
                entry.start_frame_index = arec.start_frame_index;
                for krec in arec.keyframes {
                    entry.insert_keyframe(krec.id, krec.keyframe);
                }
                category.insert_animation(arec.id, entry);
            }
            store.insert_category(crec.id, category);
        }
        Ok(store)
    }
}

pub fn parse_graph_json(s: &str, config: Config) -> Result<KeyframeGraph, GraphError> {
    let doc: GraphDocument = serde_json::from_str(s)?;
    doc.into_graph(config)
}

pub fn to_graph_json(graph: &KeyframeGraph) -> Result<String, GraphError> {
    Ok(serde_json::to_string_pretty(&GraphDocument::from_graph(graph))?)
}

pub fn parse_legacy_json(s: &str) -> Result<CategoryStore, GraphError> {
    let doc: LegacyDocument = serde_json::from_str(s)?;
    doc.into_store()
}

pub fn to_legacy_json(store: &CategoryStore) -> Result<String, GraphError> {
    Ok(serde_json::to_string_pretty(&LegacyDocument::from_store(store))?)
}

/// Parse and validate a source animation.
pub fn parse_animation_json(s: &str) -> Result<Animation, AnimationError> {
    let anim: Animation = serde_json::from_str(s)?;
    anim.validate()?;
    Ok(anim)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graph_document_defaults() {
        let json = r#"{
            "name": "hop",
            "keyframes": [
                { "id": 3, "source_frame_index": 2, "next_keyframe": 7 },
                { "id": 7, "time": 0.5 }
            ]
        }"#;
        let mut graph = parse_graph_json(json, Config::default()).unwrap();
        assert_eq!(graph.start_frame_index(), KeyframeId::NONE);
        assert_eq!(graph.animation_fps(), 15.0);
        assert_eq!(graph.keyframe_next(KeyframeId(3)), KeyframeId(7));
        assert_eq!(graph.keyframe_transition(KeyframeId(3)), 1.0);
        assert_eq!(graph.keyframe_time(KeyframeId(7)), 0.5);
        assert_eq!(graph.keyframe_next(KeyframeId(7)), KeyframeId::NONE);
        // allocation continues past loaded ids
        assert_eq!(graph.add_keyframe().unwrap(), KeyframeId(8));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let json = r#"{ "keyframes": [ { "id": 1 }, { "id": 1 } ] }"#;
        assert!(matches!(
            parse_graph_json(json, Config::default()),
            Err(GraphError::InvalidDocument(_))
        ));
        let json = r#"{ "keyframes": [ { "id": -2 } ] }"#;
        assert!(matches!(
            parse_graph_json(json, Config::default()),
            Err(GraphError::InvalidDocument(_))
        ));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            parse_graph_json("{", Config::default()),
            Err(GraphError::Parse(_))
        ));
        assert!(matches!(parse_legacy_json("42"), Err(GraphError::Parse(_))));
    }

    #[test]
    fn exhausted_ids_keep_the_loaded_keyframe() {
        let json = r#"{ "keyframes": [ { "id": 2147483647, "name": "keep" } ] }"#;
        let mut graph = parse_graph_json(json, Config::default()).unwrap();
        assert_eq!(graph.add_keyframe(), Err(GraphError::IdsExhausted("keyframe")));
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.keyframe_name(KeyframeId(i32::MAX)), "keep");

        let json = r#"{ "categories": [ { "id": 0, "animations": [
            { "id": 2147483647, "keyframes": [ { "id": 2147483647, "name": "keep" } ] }
        ] } ] }"#;
        let mut store = parse_legacy_json(json).unwrap();
        let (c, a) = (CategoryId(0), EntryId(i32::MAX));
        assert_eq!(store.add_animation(c), Err(GraphError::IdsExhausted("animation")));
        assert_eq!(store.add_keyframe(c, a), Err(GraphError::IdsExhausted("keyframe")));
        assert_eq!(store.keyframe_indices(c, a), vec![KeyframeId(i32::MAX)]);
        assert_eq!(store.keyframe_name(c, a, KeyframeId(i32::MAX)), "keep");
    }

    #[test]
    fn graph_survives_json() {
        let mut graph = KeyframeGraph::new("g");
        let a = graph.add_keyframe().unwrap();
        let b = graph.add_keyframe().unwrap();
        graph.set_keyframe_next(a, b).unwrap();
        graph.set_start_frame_index(a);
        graph.set_loop(true);
        graph.set_frame_label(3, "land");
        let json = to_graph_json(&graph).unwrap();
        let back = parse_graph_json(&json, Config::default()).unwrap();
        assert_eq!(back.keyframe_indices(), vec![a, b]);
        assert_eq!(back.keyframe_next(a), b);
        assert!(back.loop_enabled());
        assert_eq!(back.frame_label(3), "land");
    }

    #[test]
    fn legacy_document_rebuilds_hierarchy() {
        let json = r#"{
            "categories": [
                { "id": 2, "name": "locomotion", "animations": [
                    { "id": 0, "name": "walk", "start_frame_index": 1,
                      "keyframes": [ { "id": 1, "next_keyframe": 4 }, { "id": 4 } ] }
                ] }
            ]
        }"#;
        let mut store = parse_legacy_json(json).unwrap();
        let (c, a) = (CategoryId(2), EntryId(0));
        assert_eq!(store.category_name(c), "locomotion");
        assert_eq!(store.animation_start_frame_index(c, a), KeyframeId(1));
        assert_eq!(store.keyframe_indices(c, a), vec![KeyframeId(1), KeyframeId(4)]);
        assert_eq!(store.add_category().unwrap(), CategoryId(3));
        assert_eq!(store.add_keyframe(c, a).unwrap(), KeyframeId(5));

        let again = parse_legacy_json(&to_legacy_json(&store).unwrap()).unwrap();
        assert_eq!(again.category_indices(), vec![CategoryId(2), CategoryId(3)]);
    }

    #[test]
    fn animation_json_is_validated() {
        let ok = r#"{ "name": "a", "length": 1.0, "tracks": [
            { "path": "n:x", "kind": "value", "keys": [
                { "time": 0.0,
                  "data": { "type": "value", "data": { "type": "float", "data": 1.0 } } }
            ] }
        ] }"#;
        let anim = parse_animation_json(ok).unwrap();
        assert_eq!(anim.tracks[0].keys[0].transition, 1.0);
        assert!(anim.tracks[0].enabled);

        let bad = r#"{ "length": -1.0 }"#;
        assert!(matches!(
            parse_animation_json(bad),
            Err(AnimationError::InvalidTime(_))
        ));
    }
}
