//! Continuous sampling of source animation tracks.
//!
//! Value and transform tracks are evaluated through the interpolation kernel:
//! - find the key at or before `time` (`idx`) and the key after it (`next`)
//! - the key's `transition` of 0, or `idx == next`, holds `idx`
//! - otherwise the blend factor is eased by `transition` and the track's
//!   interpolation mode picks nearest / linear / cubic
//!
//! On a looping animation with `loop_wrap` set, the segment after the last key
//! blends back into the first key across the loop boundary.
//!
//! Bezier tracks solve the key handles as a 2D cubic Bézier over (time, value).

use crate::animation::{Animation, InterpolationMode, Key, KeyData, TrackKind, TransformKey};
use keygraph_api_core::interp::{cubic_value, lerp_value};
use keygraph_api_core::{ease, Value};

/// Resolved segment on a track: key indices and the un-eased blend factor.
#[derive(Copy, Clone, Debug, PartialEq)]
struct Segment {
    idx: usize,
    next: usize,
    t: f32,
}

fn find_segment(
    keys: &[Key],
    time: f32,
    length: f32,
    wrap: bool,
    looping: bool,
) -> Option<Segment> {
    let len = keys.len();
    if len == 0 {
        return None;
    }
    let found = keys.partition_point(|k| k.time <= time).checked_sub(1);

    if wrap {
        let seg = match found {
            Some(idx) if idx + 1 < len => {
                let next = idx + 1;
                let delta = keys[next].time - keys[idx].time;
                let from = time - keys[idx].time;
                let t = if delta > 0.0 { from / delta } else { 0.0 };
                Segment { idx, next, t }
            }
            Some(idx) => {
                // past the last key: blend toward the first key of the next loop
                let delta = (length - keys[idx].time) + keys[0].time;
                let from = time - keys[idx].time;
                let t = if delta > 0.0 { from / delta } else { 0.0 };
                Segment { idx, next: 0, t }
            }
            None => {
                // before the first key: still inside the wrap segment
                let idx = len - 1;
                let end = (length - keys[idx].time).max(0.0);
                let delta = end + keys[0].time;
                let t = if delta > 0.0 { (time + end) / delta } else { 0.0 };
                Segment { idx, next: 0, t }
            }
        };
        return Some(seg);
    }

    match found {
        Some(idx) if idx + 1 < len => {
            let next = idx + 1;
            let delta = keys[next].time - keys[idx].time;
            let from = time - keys[idx].time;
            let t = if delta > 0.0 { from / delta } else { 0.0 };
            Some(Segment { idx, next, t })
        }
        Some(idx) => Some(Segment { idx, next: idx, t: 0.0 }),
        // only a looping animation extends the first key back to its start
        None if looping => Some(Segment {
            idx: 0,
            next: 0,
            t: 0.0,
        }),
        None => None,
    }
}

fn blend_keys<F>(keys: &[Key], seg: Segment, mode: InterpolationMode, read: F) -> Option<Value>
where
    F: Fn(&Key) -> Option<Value>,
{
    let left = &keys[seg.idx];
    let a = read(left)?;
    let transition = left.transition;
    if transition == 0.0 || seg.idx == seg.next {
        return Some(a);
    }
    let t = if transition == 1.0 {
        seg.t
    } else {
        ease(seg.t, transition)
    };
    let b = read(&keys[seg.next])?;

    let out = match mode {
        InterpolationMode::Nearest => a,
        InterpolationMode::Linear => lerp_value(&a, &b, t),
        InterpolationMode::Cubic => {
            let pre_idx = seg.idx.saturating_sub(1);
            let post_idx = (seg.next + 1).min(keys.len() - 1);
            let pre = read(&keys[pre_idx]).unwrap_or_else(|| a.clone());
            let post = read(&keys[post_idx]).unwrap_or_else(|| b.clone());
            cubic_value(&pre, &a, &b, &post, t)
        }
    };
    Some(out)
}

fn read_value(key: &Key) -> Option<Value> {
    match &key.data {
        KeyData::Value(v) => Some(v.clone()),
        _ => None,
    }
}

fn read_transform(key: &Key) -> Option<Value> {
    match &key.data {
        KeyData::Transform(t) => Some(t.to_value()),
        _ => None,
    }
}

/// Cubic Bézier basis over a single axis.
#[inline]
fn cubic_bezier(p0: f32, p1: f32, p2: f32, p3: f32, t: f32) -> f32 {
    let u = 1.0 - t;
    u * u * u * p0 + 3.0 * u * u * t * p1 + 3.0 * u * t * t * p2 + t * t * t * p3
}

impl Animation {
    fn sample_track_with<F>(
        &self,
        track: usize,
        kind: TrackKind,
        time: f32,
        read: F,
    ) -> Option<Value>
    where
        F: Fn(&Key) -> Option<Value>,
    {
        let tr = self.tracks.get(track)?;
        if tr.kind != kind {
            return None;
        }
        let time = if self.loop_enabled && self.length > 0.0 {
            time.rem_euclid(self.length)
        } else {
            time
        };
        let wrap = tr.loop_wrap && self.loop_enabled;
        let seg = find_segment(&tr.keys, time, self.length, wrap, self.loop_enabled)?;
        blend_keys(&tr.keys, seg, tr.interpolation, read)
    }

    /// Sample a value track at `time` (seconds).
    pub fn sample_value(&self, track: usize, time: f32) -> Option<Value> {
        self.sample_track_with(track, TrackKind::Value, time, read_value)
    }

    /// Sample a transform track at `time`; rotation blends spherically.
    pub fn sample_transform(&self, track: usize, time: f32) -> Option<TransformKey> {
        let v = self.sample_track_with(track, TrackKind::Transform, time, read_transform)?;
        TransformKey::from_value(&v)
    }

    /// Evaluate a bezier track at `time`. Outside the key range the end values hold.
    pub fn sample_bezier(&self, track: usize, time: f32) -> Option<f32> {
        let tr = self.tracks.get(track)?;
        if tr.kind != TrackKind::Bezier {
            return None;
        }
        let keys: Vec<(f32, _)> = tr
            .keys
            .iter()
            .filter_map(|k| match &k.data {
                KeyData::Bezier(b) => Some((k.time, *b)),
                _ => None,
            })
            .collect();
        let n = keys.len();
        if n == 0 {
            return None;
        }
        let idx = match keys.partition_point(|(t, _)| *t <= time).checked_sub(1) {
            None => return Some(keys[0].1.value),
            Some(i) if i + 1 >= n => return Some(keys[n - 1].1.value),
            Some(i) => i,
        };

        let (t0, k0) = keys[idx];
        let (t1, k1) = keys[idx + 1];
        let duration = t1 - t0;
        let local = time - t0;

        // x is time relative to the left key, y is value
        let p0 = [0.0, k0.value];
        let p1 = [k0.out_handle[0], k0.value + k0.out_handle[1]];
        let p3 = [duration, k1.value];
        let p2 = [duration + k1.in_handle[0], k1.value + k1.in_handle[1]];

        let mut lo = 0.0f32;
        let mut hi = 1.0f32;
        for _ in 0..24 {
            let mid = 0.5 * (lo + hi);
            let x = cubic_bezier(p0[0], p1[0], p2[0], p3[0], mid);
            if (x - local).abs() < 1e-6 {
                lo = mid;
                hi = mid;
                break;
            }
            if x < local {
                lo = mid;
            } else {
                hi = mid;
            }
        }

        let lo_x = cubic_bezier(p0[0], p1[0], p2[0], p3[0], lo);
        let hi_x = cubic_bezier(p0[0], p1[0], p2[0], p3[0], hi);
        let lo_y = cubic_bezier(p0[1], p1[1], p2[1], p3[1], lo);
        let hi_y = cubic_bezier(p0[1], p1[1], p2[1], p3[1], hi);
        let span = hi_x - lo_x;
        let c = if span.abs() > f32::EPSILON {
            (local - lo_x) / span
        } else {
            0.0
        };
        Some(lo_y + (hi_y - lo_y) * c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::BezierKey;
    use approx::assert_relative_eq;

    fn ramp(interp: InterpolationMode) -> Animation {
        let mut anim = Animation::new("ramp", 3.0);
        let t = anim.add_track(TrackKind::Value, "n:x");
        anim.tracks[t].interpolation = interp;
        for (time, v) in [(0.0, 0.0), (1.0, 10.0), (2.0, 20.0), (3.0, 30.0)] {
            anim.insert_key(t, time, KeyData::Value(Value::Float(v)), 1.0)
                .unwrap();
        }
        anim
    }

    #[test]
    fn linear_between_keys() {
        let anim = ramp(InterpolationMode::Linear);
        assert_eq!(anim.sample_value(0, 0.5), Some(Value::Float(5.0)));
        assert_eq!(anim.sample_value(0, 2.0), Some(Value::Float(20.0)));
        // holds the last key on a non-looping animation
        assert_eq!(anim.sample_value(0, 9.0), Some(Value::Float(30.0)));
        assert_eq!(anim.sample_value(0, -1.0), None);
    }

    #[test]
    fn nearest_holds_left_key() {
        let anim = ramp(InterpolationMode::Nearest);
        assert_eq!(anim.sample_value(0, 1.9), Some(Value::Float(10.0)));
    }

    #[test]
    fn cubic_on_a_straight_ramp_stays_linear() {
        let anim = ramp(InterpolationMode::Cubic);
        let v = anim.sample_value(0, 1.5).and_then(|v| v.as_f32()).unwrap();
        assert_relative_eq!(v, 15.0, epsilon = 1e-4);
    }

    #[test]
    fn zero_transition_snaps() {
        let mut anim = ramp(InterpolationMode::Linear);
        anim.tracks[0].keys[1].transition = 0.0;
        assert_eq!(anim.sample_value(0, 1.7), Some(Value::Float(10.0)));
    }

    #[test]
    fn eased_transition_bends_the_blend() {
        let mut anim = ramp(InterpolationMode::Linear);
        anim.tracks[0].keys[0].transition = 2.0;
        let v = anim.sample_value(0, 0.5).and_then(|v| v.as_f32()).unwrap();
        assert_relative_eq!(v, 2.5, epsilon = 1e-5);
    }

    #[test]
    fn loop_wrap_blends_last_into_first() {
        let mut anim = Animation::new("loop", 2.0);
        anim.loop_enabled = true;
        let t = anim.add_track(TrackKind::Value, "n:x");
        anim.insert_key(t, 0.0, KeyData::Value(Value::Float(0.0)), 1.0)
            .unwrap();
        anim.insert_key(t, 1.0, KeyData::Value(Value::Float(10.0)), 1.0)
            .unwrap();
        let v = anim.sample_value(t, 1.5).and_then(|v| v.as_f32()).unwrap();
        assert_relative_eq!(v, 5.0, epsilon = 1e-5);

        anim.tracks[t].loop_wrap = false;
        assert_eq!(anim.sample_value(t, 1.5), Some(Value::Float(10.0)));
    }

    #[test]
    fn loop_wrap_time_past_length() {
        let mut anim = Animation::new("loop", 2.0);
        anim.loop_enabled = true;
        let t = anim.add_track(TrackKind::Value, "n:x");
        anim.insert_key(t, 0.0, KeyData::Value(Value::Float(0.0)), 1.0)
            .unwrap();
        anim.insert_key(t, 1.0, KeyData::Value(Value::Float(10.0)), 1.0)
            .unwrap();
        let at = |time| anim.sample_value(t, time).and_then(|v| v.as_f32()).unwrap();
        assert_relative_eq!(at(2.5), 5.0, epsilon = 1e-5);
        assert_relative_eq!(at(5.0), 10.0, epsilon = 1e-5);
        assert_relative_eq!(at(-1.5), 5.0, epsilon = 1e-5);
        // the wrap segment past the last key stays between the two values
        assert_relative_eq!(at(3.5), 5.0, epsilon = 1e-5);
    }

    #[test]
    fn transform_track_blends_per_channel() {
        let mut anim = Animation::new("xf", 1.0);
        let t = anim.add_track(TrackKind::Transform, "Body");
        anim.insert_key(t, 0.0, KeyData::Transform(TransformKey::default()), 1.0)
            .unwrap();
        anim.insert_key(
            t,
            1.0,
            KeyData::Transform(TransformKey {
                location: [2.0, 0.0, 0.0],
                rotation: [0.0, 0.0, 0.0, 1.0],
                scale: [3.0, 3.0, 3.0],
            }),
            1.0,
        )
        .unwrap();
        let xf = anim.sample_transform(t, 0.5).unwrap();
        assert_relative_eq!(xf.location[0], 1.0, epsilon = 1e-5);
        assert_relative_eq!(xf.scale[1], 2.0, epsilon = 1e-5);
        assert!(anim.sample_value(t, 0.5).is_none());
    }

    #[test]
    fn bezier_with_flat_handles_hits_ends_and_midpoint() {
        let mut anim = Animation::new("bz", 1.0);
        let t = anim.add_track(TrackKind::Bezier, "n:y");
        let key = |value| {
            KeyData::Bezier(BezierKey {
                value,
                in_handle: [-0.25, 0.0],
                out_handle: [0.25, 0.0],
            })
        };
        anim.insert_key(t, 0.0, key(0.0), 1.0).unwrap();
        anim.insert_key(t, 1.0, key(1.0), 1.0).unwrap();
        assert_eq!(anim.sample_bezier(t, -1.0), Some(0.0));
        assert_eq!(anim.sample_bezier(t, 2.0), Some(1.0));
        assert_relative_eq!(anim.sample_bezier(t, 0.5).unwrap(), 0.5, epsilon = 1e-3);
        assert!(anim.sample_bezier(t, 0.25).unwrap() < 0.25);
    }
}
