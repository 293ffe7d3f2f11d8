//! Value: the closed set of payloads a keyframe track can carry.
//! All floating point components use f32.

use serde::{Deserialize, Serialize};

/// Coarse kind tag used for dispatch and diagnostics.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Int,
    Float,
    Vec2,
    Vec3,
    Quat,
    Rect2,
    Aabb,
    Transform,
    Bool,
    Text,
    Opaque,
}

impl ValueKind {
    /// Int and Float blend with each other as floating point.
    #[inline]
    pub fn is_numeric(self) -> bool {
        matches!(self, ValueKind::Int | ValueKind::Float)
    }

    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::Vec2 => "vec2",
            ValueKind::Vec3 => "vec3",
            ValueKind::Quat => "quat",
            ValueKind::Rect2 => "rect2",
            ValueKind::Aabb => "aabb",
            ValueKind::Transform => "transform",
            ValueKind::Bool => "bool",
            ValueKind::Text => "text",
            ValueKind::Opaque => "opaque",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Value {
    /// Signed integer; blends as float when mixed with `Float`.
    Int(i64),

    /// Scalar float
    Float(f32),

    /// 2D point / vector
    Vec2([f32; 2]),

    /// 3D point / vector
    Vec3([f32; 3]),

    /// Orientation quaternion (x, y, z, w)
    Quat([f32; 4]),

    /// Axis-aligned 2D rectangle
    Rect2 { pos: [f32; 2], size: [f32; 2] },

    /// Axis-aligned 3D bounding box
    Aabb { pos: [f32; 3], size: [f32; 3] },

    /// Location, orientation (quat x,y,z,w) and scale
    Transform {
        pos: [f32; 3],
        rot: [f32; 4],
        scale: [f32; 3],
    },

    /// Step-only boolean
    Bool(bool),

    /// Step-only text
    Text(String),

    /// Any payload the kernel does not understand. Never interpolated.
    Opaque(serde_json::Value),
}

impl Default for Value {
    fn default() -> Self {
        Value::Float(0.0)
    }
}

impl Value {
    /// Return the coarse kind of this value.
    #[inline]
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::Vec2(_) => ValueKind::Vec2,
            Value::Vec3(_) => ValueKind::Vec3,
            Value::Quat(_) => ValueKind::Quat,
            Value::Rect2 { .. } => ValueKind::Rect2,
            Value::Aabb { .. } => ValueKind::Aabb,
            Value::Transform { .. } => ValueKind::Transform,
            Value::Bool(_) => ValueKind::Bool,
            Value::Text(_) => ValueKind::Text,
            Value::Opaque(_) => ValueKind::Opaque,
        }
    }

    /// Numeric view of `Int`/`Float`; `None` for everything else.
    #[inline]
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Value::Int(i) => Some(*i as f32),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Convenience constructors
    pub fn f(v: f32) -> Self {
        Value::Float(v)
    }

    pub fn vec2(x: f32, y: f32) -> Self {
        Value::Vec2([x, y])
    }

    pub fn vec3(x: f32, y: f32, z: f32) -> Self {
        Value::Vec3([x, y, z])
    }

    pub fn quat(x: f32, y: f32, z: f32, w: f32) -> Self {
        Value::Quat([x, y, z, w])
    }

    pub fn transform(pos: [f32; 3], rot: [f32; 4], scale: [f32; 3]) -> Self {
        Value::Transform { pos, rot, scale }
    }

    /// Identity transform (no translation, identity rotation, unit scale).
    pub fn identity_transform() -> Self {
        Value::Transform {
            pos: [0.0; 3],
            rot: [0.0, 0.0, 0.0, 1.0],
            scale: [1.0; 3],
        }
    }
}
