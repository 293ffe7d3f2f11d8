//! Bake engine: flatten a keyframe chain into a conventional track animation.
//!
//! Each visited keyframe pulls one key per source track at
//! `source_frame_index / fps` (exact key first, else the key at or before) and
//! lays it down at the accumulated output time with the keyframe's transition.

use crate::animation::{Animation, AnimationSource, Track, TrackKind};
use crate::graph::KeyframeGraph;
use crate::ids::KeyframeId;
use crate::traverse::{traverse, ChainEnd};

/// Non-fatal observations collected while baking.
#[derive(Clone, Debug, PartialEq)]
pub enum BakeDiagnostic {
    /// The graph's fps was unusable and the configured default was used.
    InvalidFps { fps: f32, fallback: f32 },
    /// No source track had a key for this keyframe; it still consumed its time.
    KeyframeDataNotFound { keyframe: KeyframeId, sample_time: f32 },
    /// Chain ended on a successor id that does not exist.
    DanglingSuccessor(KeyframeId),
    /// Chain revisited a keyframe and was truncated there.
    CycleDetected(KeyframeId),
    /// A key could not be written to the output track.
    KeyRejected { track: usize, reason: String },
}

#[derive(Clone, Debug)]
pub struct BakeReport {
    pub animation: Animation,
    pub visited: Vec<KeyframeId>,
    pub diagnostics: Vec<BakeDiagnostic>,
}

impl BakeReport {
    /// True when the whole reachable chain made it into the output.
    pub fn is_complete(&self) -> bool {
        !self
            .diagnostics
            .iter()
            .any(|d| matches!(d, BakeDiagnostic::CycleDetected(_)))
    }
}

/// One output track per source track, index for index. A source track with no
/// kind becomes a disabled, empty placeholder.
fn output_tracks(source: &dyn AnimationSource) -> Vec<Track> {
    (0..source.track_count())
        .map(|i| {
            let path = source.track_path(i).unwrap_or_default();
            let Some(kind) = source.track_kind(i) else {
                let mut placeholder = Track::new(TrackKind::Value, path);
                placeholder.enabled = false;
                return placeholder;
            };
            let mut track = Track::new(kind, path);
            track.enabled = source.track_enabled(i);
            track.interpolation = source.track_interpolation(i);
            track
        })
        .collect()
}

/// Bake the chain starting at the graph's start keyframe.
pub fn bake_graph(graph: &KeyframeGraph, source: &dyn AnimationSource) -> BakeReport {
    bake_graph_from(graph, graph.start_frame_index(), source)
}

/// Bake the chain starting at `start`.
pub fn bake_graph_from(
    graph: &KeyframeGraph,
    start: KeyframeId,
    source: &dyn AnimationSource,
) -> BakeReport {
    let cfg = graph.config();
    let resource = graph.name();
    let mut diagnostics = Vec::new();

    let fps = cfg.effective_fps(graph.animation_fps());
    if fps != graph.animation_fps() {
        if cfg.log_diagnostics {
            log::warn!(
                "{resource}: animation_fps {} unusable, baking at {fps}",
                graph.animation_fps()
            );
        }
        diagnostics.push(BakeDiagnostic::InvalidFps {
            fps: graph.animation_fps(),
            fallback: fps,
        });
    }
    let key_step = 1.0 / fps;

    let traversal = traverse(graph, start, resource);
    match traversal.end {
        ChainEnd::Terminated => {}
        ChainEnd::Dangling(id) => diagnostics.push(BakeDiagnostic::DanglingSuccessor(id)),
        ChainEnd::Cycle(id) => diagnostics.push(BakeDiagnostic::CycleDetected(id)),
    }

    let mut out = Animation::new(resource, 0.0);
    out.loop_enabled = graph.loop_enabled();
    out.tracks = output_tracks(source);

    let mut target_time = 0.0f32;
    for &id in &traversal.visited {
        let Some(node) = graph.keyframe(id) else {
            continue;
        };
        let sample_time = node.source_frame_index as f32 * key_step;
        let mut found = false;

        for track in 0..out.tracks.len() {
            if source.track_kind(track).is_none() {
                continue;
            }
            let key = source
                .find_key(track, sample_time, true)
                .or_else(|| source.find_key(track, sample_time, false));
            let Some(data) = key.and_then(|k| source.key_data(track, k)) else {
                continue;
            };
            found = true;
            if let Err(err) = out.insert_key(track, target_time, data.clone(), node.transition) {
                if cfg.log_diagnostics {
                    log::warn!("{resource}: track {track}: {err}");
                }
                diagnostics.push(BakeDiagnostic::KeyRejected {
                    track,
                    reason: err.to_string(),
                });
            }
        }

        if !found {
            if cfg.log_diagnostics {
                log::warn!(
                    "{resource}: keyframe data not found for keyframe {id} at {sample_time}s"
                );
            }
            diagnostics.push(BakeDiagnostic::KeyframeDataNotFound {
                keyframe: id,
                sample_time,
            });
        }
        target_time += node.time;
    }

    out.length = target_time;
    log::debug!(
        "{resource}: baked {} keyframes into {} tracks, length {target_time}s",
        traversal.visited.len(),
        out.tracks.len()
    );

    BakeReport {
        animation: out,
        visited: traversal.visited,
        diagnostics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{InterpolationMode, KeyData};
    use keygraph_api_core::Value;

    /// Hides the kind of its first track, as a host-side source might for a
    /// track type it cannot describe.
    #[derive(Debug)]
    struct UntypedFirstTrack(Animation);

    impl AnimationSource for UntypedFirstTrack {
        fn name(&self) -> &str {
            self.0.name()
        }
        fn length(&self) -> f32 {
            self.0.length()
        }
        fn loop_enabled(&self) -> bool {
            self.0.loop_enabled()
        }
        fn track_count(&self) -> usize {
            self.0.track_count()
        }
        fn track_kind(&self, track: usize) -> Option<TrackKind> {
            if track == 0 {
                None
            } else {
                self.0.track_kind(track)
            }
        }
        fn track_path(&self, track: usize) -> Option<&str> {
            self.0.track_path(track)
        }
        fn track_enabled(&self, track: usize) -> bool {
            self.0.track_enabled(track)
        }
        fn track_interpolation(&self, track: usize) -> InterpolationMode {
            self.0.track_interpolation(track)
        }
        fn find_key(&self, track: usize, time: f32, exact: bool) -> Option<usize> {
            self.0.find_key(track, time, exact)
        }
        fn key_time(&self, track: usize, key: usize) -> Option<f32> {
            self.0.key_time(track, key)
        }
        fn key_data(&self, track: usize, key: usize) -> Option<&KeyData> {
            self.0.key_data(track, key)
        }
    }

    #[test]
    fn untyped_source_track_keeps_later_indices_aligned() {
        let mut anim = Animation::new("src", 1.0);
        let a = anim.add_track(TrackKind::Value, "n:a");
        let b = anim.add_track(TrackKind::Value, "n:b");
        anim.insert_key(a, 0.0, KeyData::Value(Value::Float(1.0)), 1.0)
            .unwrap();
        anim.insert_key(b, 0.0, KeyData::Value(Value::Float(2.0)), 1.0)
            .unwrap();

        let mut graph = KeyframeGraph::new("g");
        let id = graph.add_keyframe().unwrap();
        graph.set_start_frame_index(id);

        let report = bake_graph(&graph, &UntypedFirstTrack(anim));
        let tracks = &report.animation.tracks;
        assert_eq!(tracks.len(), 2);
        assert!(!tracks[0].enabled);
        assert!(tracks[0].keys.is_empty());
        assert_eq!(tracks[1].path, "n:b");
        assert_eq!(tracks[1].keys[0].data, KeyData::Value(Value::Float(2.0)));
        assert!(report.diagnostics.is_empty());
    }
}
