use criterion::{black_box, criterion_group, criterion_main, Criterion};
use keygraph_core::{Animation, KeyData, KeyframeCache, KeyframeGraph, TrackKind, Value};

fn source(tracks: usize, keys: usize) -> Animation {
    let mut anim = Animation::new("bench", keys as f32 / 30.0);
    for t in 0..tracks {
        let track = anim.add_track(TrackKind::Value, format!("node{t}:x"));
        for k in 0..keys {
            let _ = anim.insert_key(
                track,
                k as f32 / 30.0,
                KeyData::Value(Value::Float(k as f32)),
                1.0,
            );
        }
    }
    anim
}

fn chain(len: usize) -> KeyframeGraph {
    let mut graph = KeyframeGraph::new("bench");
    graph.set_animation_fps(30.0);
    let mut prev = None;
    for i in 0..len {
        let id = graph.add_keyframe().unwrap();
        let _ = graph.set_keyframe_source_frame_index(id, i as i32);
        match prev {
            Some(p) => {
                let _ = graph.set_keyframe_next(p, id);
            }
            None => graph.set_start_frame_index(id),
        }
        prev = Some(id);
    }
    graph
}

fn bench_bake(c: &mut Criterion) {
    let src = source(16, 240);
    let graph = chain(240);
    c.bench_function("bake_240_nodes_16_tracks", |b| {
        b.iter(|| black_box(graph.bake_with(&src)))
    });
    c.bench_function("cache_240_nodes_16_tracks", |b| {
        b.iter(|| {
            let mut cache = KeyframeCache::new();
            black_box(cache.initialize_with(&graph, &src))
        })
    });
}

criterion_group!(benches, bench_bake);
criterion_main!(benches);
