//! Interpolation kernel for Value types.
//! - f32 linear interpolation for scalars and vector components
//! - quaternion slerp (shortest-arc) and cubic slerp
//! - 4-point Catmull-Rom blend for scalars, vectors, rects and boxes
//! - transform blending per channel (pos/scale euclidean, rot spherical)
//! - fail-soft fallback: mismatched or non-blendable kinds return the `a` sample

use crate::ease::ease;
use crate::value::{Value, ValueKind};

/// Below this |dot| two quaternions are treated as the same orientation by `slerp_ni`.
const SLERP_NI_THRESHOLD: f32 = 0.9999;
/// Above this dot `slerp` degrades to a normalized lerp.
const SLERP_DOT_THRESHOLD: f32 = 0.9995;

/// Linear interpolation for f32
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Lerp for fixed-size arrays
pub fn lerp_array<const N: usize>(a: &[f32; N], b: &[f32; N], t: f32) -> [f32; N] {
    let mut out = [0.0f32; N];
    for i in 0..N {
        out[i] = lerp(a[i], b[i], t);
    }
    out
}

#[inline]
pub fn lerp_vec2(a: [f32; 2], b: [f32; 2], t: f32) -> [f32; 2] {
    lerp_array(&a, &b, t)
}

#[inline]
pub fn lerp_vec3(a: [f32; 3], b: [f32; 3], t: f32) -> [f32; 3] {
    lerp_array(&a, &b, t)
}

#[inline]
fn dot4(a: [f32; 4], b: [f32; 4]) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2] + a[3] * b[3]
}

/// Normalize a quaternion represented as [x,y,z,w]
pub fn normalize_quat(q: [f32; 4]) -> [f32; 4] {
    let mag = dot4(q, q).sqrt();
    if mag == 0.0 {
        [0.0, 0.0, 0.0, 1.0]
    } else {
        [q[0] / mag, q[1] / mag, q[2] / mag, q[3] / mag]
    }
}

/// Slerp between two unit quaternions q1, q2 along the shortest arc.
///
/// When the inputs lie in opposite hemispheres the second quaternion is negated,
/// so `slerp(a, b, 1.0)` may return `-b` (the same orientation).
pub fn slerp(q1: [f32; 4], q2: [f32; 4], t: f32) -> [f32; 4] {
    let qa = normalize_quat(q1);
    let mut qb = normalize_quat(q2);

    let mut dot = dot4(qa, qb);

    // If the dot product is negative, slerp won't take the short path.
    if dot < 0.0 {
        qb = [-qb[0], -qb[1], -qb[2], -qb[3]];
        dot = -dot;
    }

    if dot > SLERP_DOT_THRESHOLD {
        return normalize_quat(lerp_array(&qa, &qb, t));
    }

    let theta_0 = dot.clamp(-1.0, 1.0).acos();
    let theta = theta_0 * t;
    let sin_theta_0 = theta_0.sin();

    let s0 = (theta_0 - theta).sin() / sin_theta_0;
    let s1 = theta.sin() / sin_theta_0;

    [
        s0 * qa[0] + s1 * qb[0],
        s0 * qa[1] + s1 * qb[1],
        s0 * qa[2] + s1 * qb[2],
        s0 * qa[3] + s1 * qb[3],
    ]
}

/// Spherical interpolation without shortest-arc correction.
/// Nearly identical inputs return `q1` untouched.
pub fn slerp_ni(q1: [f32; 4], q2: [f32; 4], t: f32) -> [f32; 4] {
    let dot = dot4(q1, q2);
    if dot.abs() > SLERP_NI_THRESHOLD {
        return q1;
    }

    let theta = dot.clamp(-1.0, 1.0).acos();
    let inv_sin = theta.sin().recip();
    let new_factor = (t * theta).sin() * inv_sin;
    let inv_factor = ((1.0 - t) * theta).sin() * inv_sin;

    [
        inv_factor * q1[0] + new_factor * q2[0],
        inv_factor * q1[1] + new_factor * q2[1],
        inv_factor * q1[2] + new_factor * q2[2],
        inv_factor * q1[3] + new_factor * q2[3],
    ]
}

/// Catmull-Rom blend of four scalars; `t` runs from `a` (0) to `b` (1).
#[inline]
pub fn cubic_f32(pre: f32, a: f32, b: f32, post: f32, t: f32) -> f32 {
    let t2 = t * t;
    let t3 = t2 * t;
    0.5 * ((a * 2.0)
        + (-pre + b) * t
        + (2.0 * pre - 5.0 * a + 4.0 * b - post) * t2
        + (-pre + 3.0 * a - 3.0 * b + post) * t3)
}

/// Component-wise Catmull-Rom blend for fixed-size arrays.
pub fn cubic_array<const N: usize>(
    pre: &[f32; N],
    a: &[f32; N],
    b: &[f32; N],
    post: &[f32; N],
    t: f32,
) -> [f32; N] {
    let mut out = [0.0f32; N];
    for i in 0..N {
        out[i] = cubic_f32(pre[i], a[i], b[i], post[i], t);
    }
    out
}

/// Spherical cubic blend of orientations: slerp a->b, slerp_ni pre->post,
/// then bend the first toward the second by `2t(1-t)`.
pub fn cubic_slerp(pre: [f32; 4], a: [f32; 4], b: [f32; 4], post: [f32; 4], t: f32) -> [f32; 4] {
    let t2 = (1.0 - t) * t * 2.0;
    let sp = slerp(a, b, t);
    let sq = slerp_ni(pre, post, t);
    slerp_ni(sp, sq, t2)
}

fn numeric_result(all_int: bool, v: f32) -> Value {
    if all_int {
        // truncates toward zero
        Value::Int(v as i64)
    } else {
        Value::Float(v)
    }
}

/// Linear interpolation across Value kinds.
///
/// Int and Float mix freely (all-Int inputs stay Int, truncated). Quaternions use
/// slerp, transforms blend pos/scale linearly and rot spherically. Any other
/// combination, including step-only kinds, returns `a` unchanged.
pub fn lerp_value(a: &Value, b: &Value, t: f32) -> Value {
    match (a, b) {
        (Value::Vec2(va), Value::Vec2(vb)) => Value::Vec2(lerp_array(va, vb, t)),
        (Value::Vec3(va), Value::Vec3(vb)) => Value::Vec3(lerp_array(va, vb, t)),
        (Value::Quat(qa), Value::Quat(qb)) => Value::Quat(slerp(*qa, *qb, t)),
        (
            Value::Rect2 {
                pos: pa,
                size: sa,
            },
            Value::Rect2 {
                pos: pb,
                size: sb,
            },
        ) => Value::Rect2 {
            pos: lerp_array(pa, pb, t),
            size: lerp_array(sa, sb, t),
        },
        (
            Value::Aabb {
                pos: pa,
                size: sa,
            },
            Value::Aabb {
                pos: pb,
                size: sb,
            },
        ) => Value::Aabb {
            pos: lerp_array(pa, pb, t),
            size: lerp_array(sa, sb, t),
        },
        (
            Value::Transform {
                pos: pa,
                rot: ra,
                scale: sa,
            },
            Value::Transform {
                pos: pb,
                rot: rb,
                scale: sb,
            },
        ) => Value::Transform {
            pos: lerp_array(pa, pb, t),
            rot: slerp(*ra, *rb, t),
            scale: lerp_array(sa, sb, t),
        },
        _ => match (a.as_f32(), b.as_f32()) {
            (Some(fa), Some(fb)) => {
                let all_int = a.kind() == ValueKind::Int && b.kind() == ValueKind::Int;
                numeric_result(all_int, lerp(fa, fb, t))
            }
            // Fallback: if types mismatch, prefer left (fail-soft).
            _ => a.clone(),
        },
    }
}

/// True when the four samples can be blended by one structural rule:
/// either all numeric, or all the same kind.
fn cubic_compatible(pre: &Value, a: &Value, b: &Value, post: &Value) -> bool {
    let kinds = [pre.kind(), a.kind(), b.kind(), post.kind()];
    if kinds.iter().all(|k| k.is_numeric()) {
        return true;
    }
    kinds.iter().all(|k| *k == kinds[1])
}

/// Four-point cubic interpolation across Value kinds.
///
/// `t` runs from `a` to `b`; `pre` and `post` shape the tangents. Inputs that
/// disagree on kind return `a` unchanged. Kinds without a cubic rule, and
/// all-Int samples, fall back to [`lerp_value`] between `a` and `b`.
pub fn cubic_value(pre: &Value, a: &Value, b: &Value, post: &Value, t: f32) -> Value {
    if !cubic_compatible(pre, a, b, post) {
        return a.clone();
    }

    if let (Some(p0), Some(p1), Some(p2), Some(p3)) =
        (pre.as_f32(), a.as_f32(), b.as_f32(), post.as_f32())
    {
        if [pre, a, b, post].iter().all(|v| v.kind() == ValueKind::Int) {
            return numeric_result(true, lerp(p1, p2, t));
        }
        return Value::Float(cubic_f32(p0, p1, p2, p3, t));
    }

    match (pre, a, b, post) {
        (Value::Vec2(p0), Value::Vec2(p1), Value::Vec2(p2), Value::Vec2(p3)) => {
            Value::Vec2(cubic_array(p0, p1, p2, p3, t))
        }
        (Value::Vec3(p0), Value::Vec3(p1), Value::Vec3(p2), Value::Vec3(p3)) => {
            Value::Vec3(cubic_array(p0, p1, p2, p3, t))
        }
        (Value::Quat(p0), Value::Quat(p1), Value::Quat(p2), Value::Quat(p3)) => {
            Value::Quat(cubic_slerp(*p0, *p1, *p2, *p3, t))
        }
        (
            Value::Rect2 { pos: p0, size: s0 },
            Value::Rect2 { pos: p1, size: s1 },
            Value::Rect2 { pos: p2, size: s2 },
            Value::Rect2 { pos: p3, size: s3 },
        ) => Value::Rect2 {
            pos: cubic_array(p0, p1, p2, p3, t),
            size: cubic_array(s0, s1, s2, s3, t),
        },
        (
            Value::Aabb { pos: p0, size: s0 },
            Value::Aabb { pos: p1, size: s1 },
            Value::Aabb { pos: p2, size: s2 },
            Value::Aabb { pos: p3, size: s3 },
        ) => Value::Aabb {
            pos: cubic_array(p0, p1, p2, p3, t),
            size: cubic_array(s0, s1, s2, s3, t),
        },
        (
            Value::Transform {
                pos: p0,
                rot: r0,
                scale: s0,
            },
            Value::Transform {
                pos: p1,
                rot: r1,
                scale: s1,
            },
            Value::Transform {
                pos: p2,
                rot: r2,
                scale: s2,
            },
            Value::Transform {
                pos: p3,
                rot: r3,
                scale: s3,
            },
        ) => Value::Transform {
            pos: cubic_array(p0, p1, p2, p3, t),
            rot: cubic_slerp(*r0, *r1, *r2, *r3, t),
            scale: cubic_array(s0, s1, s2, s3, t),
        },
        _ => lerp_value(a, b, t),
    }
}

/// Linear blend after remapping `t` through the transition ease.
/// A transition of 0 snaps to `a`.
pub fn interpolate_eased(a: &Value, b: &Value, t: f32, transition: f32) -> Value {
    if transition == 0.0 {
        return a.clone();
    }
    let t = if transition == 1.0 {
        t
    } else {
        ease(t, transition)
    };
    lerp_value(a, b, t)
}
