//! Keygraph core (engine-agnostic)
//!
//! An animation described as a directed graph of keyframe nodes over a
//! conventional multi-track source animation. The crate holds the graph stores
//! (flat and legacy hierarchical), chain traversal, the bake engine that
//! flattens a chain into a track animation, and the keyframe cache plus player
//! used for direct playback.

pub mod animation;
pub mod baking;
pub mod cache;
pub mod config;
pub mod document;
pub mod error;
pub mod graph;
pub mod ids;
pub mod legacy;
pub mod outputs;
pub mod player;
pub mod sampling;
pub mod traverse;

// Re-exports for hosts
pub use animation::{
    Animation, AnimationSource, AudioKey, BezierKey, InterpolationMode, Key, KeyData, MethodKey,
    Track, TrackKind, TransformKey, KEY_TIME_EPSILON,
};
pub use baking::{bake_graph, bake_graph_from, BakeDiagnostic, BakeReport};
pub use cache::{CachedData, CachedKey, KeyframeCache};
pub use config::Config;
pub use document::{
    parse_animation_json, parse_graph_json, parse_legacy_json, to_graph_json, to_legacy_json,
    GraphDocument, LegacyDocument,
};
pub use error::{AnimationError, GraphError};
pub use graph::{Keyframe, KeyframeGraph};
pub use ids::{CategoryId, EntryId, IdAllocator, KeyframeId};
pub use keygraph_api_core::{CurvePoint, EaseCurve, Value, ValueKind};
pub use legacy::{AnimationEntry, Category, CategoryStore};
pub use outputs::{PlayerEvent, PlayerFrame, TrackSample};
pub use player::GraphPlayer;
pub use traverse::{traverse, ChainEnd, KeyframeLinks, Traversal};
