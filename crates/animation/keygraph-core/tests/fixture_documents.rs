use std::sync::Arc;

use anyhow::{Context, Result};
use keygraph_core::{
    parse_animation_json, parse_graph_json, parse_legacy_json, BakeDiagnostic, CategoryId,
    Config, EntryId, GraphDocument, KeyData, KeyframeId, Value,
};
use keygraph_test_fixtures::{animations, graphs, legacy};

fn approx(a: f32, b: f32, eps: f32) {
    assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
}

fn float_key(data: &KeyData) -> f32 {
    match data {
        KeyData::Value(Value::Float(f)) => *f,
        other => panic!("expected float value key, got {other:?}"),
    }
}

#[test]
fn hop_chain_bakes_against_scalar_ramp() -> Result<()> {
    let source = parse_animation_json(&animations::json("scalar-ramp")?)?;
    let mut graph = parse_graph_json(&graphs::json("hop-chain")?, Config::default())?;
    assert_eq!(graph.frame_label(10), "contact");
    assert_eq!(graph.start_node_position(), [-120.0, 0.0]);
    graph.set_animation(Some(Arc::new(source)));

    let report = graph.bake().context("bake hop chain")?;
    assert_eq!(
        report.visited,
        vec![KeyframeId(0), KeyframeId(1), KeyframeId(2)]
    );
    assert!(report.diagnostics.is_empty());

    let keys = &report.animation.tracks[0].keys;
    let times: Vec<f32> = keys.iter().map(|k| k.time).collect();
    assert_eq!(times, vec![0.0, 0.5, 1.5]);
    // frame 5 lands between source keys and takes the earlier one
    approx(float_key(&keys[1].data), 5.0, 1e-6);
    approx(keys[1].transition, 2.0, 1e-6);
    approx(float_key(&keys[2].data), 10.0, 1e-6);
    approx(report.animation.length, 1.75, 1e-6);
    Ok(())
}

#[test]
fn three_cycle_fixture_is_truncated() -> Result<()> {
    let source = parse_animation_json(&animations::json("scalar-ramp")?)?;
    let graph = parse_graph_json(&graphs::json("three-cycle")?, Config::default())?;
    let report = graph.bake_with(&source);
    assert_eq!(report.visited.len(), 3);
    assert_eq!(
        report.diagnostics,
        vec![BakeDiagnostic::CycleDetected(KeyframeId(1))]
    );
    assert!(report.animation.loop_enabled);
    approx(report.animation.length, 3.0, 1e-6);
    Ok(())
}

#[test]
fn graph_fixture_loads_as_document() -> Result<()> {
    let doc: GraphDocument = graphs::load("hop-chain")?;
    assert_eq!(doc.animation.as_deref(), Some("scalar_ramp"));
    assert_eq!(doc.keyframes.len(), 3);
    assert_eq!(doc.keyframes[1].keyframe.name, "air");
    Ok(())
}

#[test]
fn legacy_fixture_imports_into_flat_graph() -> Result<()> {
    let store = parse_legacy_json(&legacy::json("locomotion")?)?;
    let (c, a) = (CategoryId(0), EntryId(0));
    assert_eq!(store.category_indices(), vec![CategoryId(0), CategoryId(1)]);
    assert_eq!(store.animation_name(c, a), "run");
    assert!(store.animation_indices(CategoryId(1)).is_empty());
    assert!(store.keyframe_in_curve(c, a, KeyframeId(1)).is_some());

    let graph = store.import_animation(c, a, Config::default())?;
    assert_eq!(graph.start_frame_index(), KeyframeId(0));
    assert_eq!(graph.start_node_position(), [40.0, 80.0]);
    assert_eq!(graph.keyframe_name(KeyframeId(1)), "flight");
    // the imported in-curve drives the node's ease
    let eased = graph
        .keyframe(KeyframeId(1))
        .map(|kf| kf.ease(0.5))
        .context("flight keyframe")?;
    approx(eased, 0.5, 1e-5);

    let walk = graph.bake_from(graph.start_frame_index());
    assert_eq!(walk.visited, vec![KeyframeId(0), KeyframeId(1)]);
    Ok(())
}

#[test]
fn every_animation_fixture_validates() -> Result<()> {
    for name in animations::keys() {
        parse_animation_json(&animations::json(&name)?)
            .with_context(|| format!("animation fixture {name}"))?;
    }
    Ok(())
}
