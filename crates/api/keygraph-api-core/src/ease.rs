//! Easing helpers: the exponential `ease` remap used by keyframe transitions and
//! `EaseCurve`, a tangent-controlled curve that can replace the exponent.

use serde::{Deserialize, Serialize};

/// Remap `x` in [0,1] through an exponential ease controlled by `c`.
///
/// - `c > 1`: ease-in (`x^c`)
/// - `0 < c < 1`: ease-out (`1 - (1-x)^(1/c)`)
/// - `c == 1`: identity
/// - `c < 0`: ease-in-out with exponent `-c`
/// - `c == 0`: constant 0
pub fn ease(x: f32, c: f32) -> f32 {
    let x = x.clamp(0.0, 1.0);
    if c > 0.0 {
        if c < 1.0 {
            1.0 - (1.0 - x).powf(1.0 / c)
        } else {
            x.powf(c)
        }
    } else if c < 0.0 {
        if x < 0.5 {
            (x * 2.0).powf(-c) * 0.5
        } else {
            (1.0 - (1.0 - (x - 0.5) * 2.0).powf(-c)) * 0.5 + 0.5
        }
    } else {
        0.0
    }
}

/// Cubic Bezier basis function
#[inline]
fn bezier_interp(t: f32, start: f32, control_1: f32, control_2: f32, end: f32) -> f32 {
    let omt = 1.0 - t;
    let omt2 = omt * omt;
    let omt3 = omt2 * omt;
    let t2 = t * t;
    let t3 = t2 * t;
    start * omt3 + control_1 * omt2 * t * 3.0 + control_2 * omt * t2 * 3.0 + end * t3
}

/// One control point of an [`EaseCurve`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub left_tangent: f32,
    #[serde(default)]
    pub right_tangent: f32,
}

impl CurvePoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            left_tangent: 0.0,
            right_tangent: 0.0,
        }
    }
}

/// Easing curve over the unit interval. Points are kept sorted by `x`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EaseCurve {
    points: Vec<CurvePoint>,
}

impl EaseCurve {
    pub fn new() -> Self {
        Self::default()
    }

    /// Straight line from (0,0) to (1,1); evaluates as the identity.
    pub fn linear() -> Self {
        let mut curve = Self::new();
        curve.add_point(CurvePoint {
            x: 0.0,
            y: 0.0,
            left_tangent: 1.0,
            right_tangent: 1.0,
        });
        curve.add_point(CurvePoint {
            x: 1.0,
            y: 1.0,
            left_tangent: 1.0,
            right_tangent: 1.0,
        });
        curve
    }

    /// Insert a point, keeping the list sorted. Returns the index it landed at.
    pub fn add_point(&mut self, point: CurvePoint) -> usize {
        let idx = self.points.partition_point(|p| p.x <= point.x);
        self.points.insert(idx, point);
        idx
    }

    pub fn remove_point(&mut self, idx: usize) -> Option<CurvePoint> {
        if idx < self.points.len() {
            Some(self.points.remove(idx))
        } else {
            None
        }
    }

    pub fn points(&self) -> &[CurvePoint] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Evaluate the curve at `x`. Outside the point range the nearest end value is held;
    /// an empty curve evaluates to 0.
    pub fn interpolate(&self, x: f32) -> f32 {
        let n = self.points.len();
        match n {
            0 => return 0.0,
            1 => return self.points[0].y,
            _ => {}
        }
        if x <= self.points[0].x {
            return self.points[0].y;
        }
        if x >= self.points[n - 1].x {
            return self.points[n - 1].y;
        }

        let i = self.points.partition_point(|p| p.x <= x).saturating_sub(1);
        let a = self.points[i];
        let b = self.points[(i + 1).min(n - 1)];

        let span = b.x - a.x;
        if span.abs() <= f32::EPSILON {
            return b.y;
        }
        let local = (x - a.x) / span;
        let d = span / 3.0;
        let yac = a.y + d * a.right_tangent;
        let ybc = b.y - d * b.left_tangent;
        bezier_interp(local, a.y, yac, ybc, b.y)
    }
}
