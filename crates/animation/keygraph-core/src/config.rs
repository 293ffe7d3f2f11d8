//! Core configuration for keygraph-core.

use serde::{Deserialize, Serialize};

/// Defaults and tolerances applied by the graph store, bake engine and cache.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Used in place of a graph's `animation_fps` when that is not a positive finite number.
    pub default_animation_fps: f32,
    /// `time` given to freshly added keyframes.
    pub default_keyframe_time: f32,
    /// `transition` given to freshly added keyframes (1 = linear).
    pub default_transition: f32,
    /// Emit bake/cache diagnostics through `log` in addition to returning them.
    pub log_diagnostics: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_animation_fps: 15.0,
            default_keyframe_time: 1.0,
            default_transition: 1.0,
            log_diagnostics: true,
        }
    }
}

impl Config {
    /// Return `fps` when usable, otherwise the configured default.
    pub fn effective_fps(&self, fps: f32) -> f32 {
        if fps.is_finite() && fps > 0.0 {
            fps
        } else {
            self.default_animation_fps
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: Config = serde_json::from_str(r#"{ "default_animation_fps": 30.0 }"#).unwrap();
        assert_eq!(cfg.default_animation_fps, 30.0);
        assert_eq!(cfg.default_keyframe_time, 1.0);
        assert!(cfg.log_diagnostics);
    }

    #[test]
    fn effective_fps_falls_back() {
        let cfg = Config::default();
        assert_eq!(cfg.effective_fps(24.0), 24.0);
        assert_eq!(cfg.effective_fps(0.0), 15.0);
        assert_eq!(cfg.effective_fps(f32::NAN), 15.0);
    }
}
