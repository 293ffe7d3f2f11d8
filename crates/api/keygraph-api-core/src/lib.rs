//! keygraph-api-core: value model and interpolation kernel (engine-agnostic)

pub mod ease;
pub mod interp;
pub mod value;

pub use ease::{ease, CurvePoint, EaseCurve};
pub use interp::{cubic_value, interpolate_eased, lerp_value};
pub use value::{Value, ValueKind};
