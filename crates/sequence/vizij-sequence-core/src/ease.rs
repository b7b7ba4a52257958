//! Easing functions.
//!
//! The scheduler treats an ease as an opaque `f(t) -> value` over `t ∈ [0, 1]`.
//! Results are never clamped: overshooting eases (e.g. `out_back`) carry the
//! animated property past its target before settling.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Named eases usable from stored sequences.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EasePreset {
    #[default]
    Linear,
    InQuad,
    OutQuad,
    InOutQuad,
    InCubic,
    OutCubic,
    OutBack,
    SmoothStep,
}

impl EasePreset {
    pub fn apply(self, t: f32) -> f32 {
        match self {
            EasePreset::Linear => t,
            EasePreset::InQuad => t * t,
            EasePreset::OutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            EasePreset::InOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            EasePreset::InCubic => t * t * t,
            EasePreset::OutCubic => 1.0 - (1.0 - t).powi(3),
            EasePreset::OutBack => {
                const C1: f32 = 1.70158;
                const C3: f32 = C1 + 1.0;
                1.0 + C3 * (t - 1.0).powi(3) + C1 * (t - 1.0).powi(2)
            }
            EasePreset::SmoothStep => t * t * (3.0 - 2.0 * t),
        }
    }
}

#[derive(Clone)]
enum Curve {
    Preset(EasePreset),
    Custom(Arc<dyn Fn(f32) -> f32 + Send + Sync>),
}

/// Cheaply clonable easing function.
#[derive(Clone)]
pub struct Ease(Curve);

impl Ease {
    pub fn linear() -> Self {
        Ease(Curve::Preset(EasePreset::Linear))
    }

    pub fn preset(preset: EasePreset) -> Self {
        Ease(Curve::Preset(preset))
    }

    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(f32) -> f32 + Send + Sync + 'static,
    {
        Ease(Curve::Custom(Arc::new(f)))
    }

    #[inline]
    pub fn eval(&self, t: f32) -> f32 {
        match &self.0 {
            Curve::Preset(p) => p.apply(t),
            Curve::Custom(f) => f(t),
        }
    }
}

impl Default for Ease {
    fn default() -> Self {
        Self::linear()
    }
}

impl From<EasePreset> for Ease {
    fn from(preset: EasePreset) -> Self {
        Ease::preset(preset)
    }
}

impl fmt::Debug for Ease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Curve::Preset(p) => write!(f, "Ease({p:?})"),
            Curve::Custom(_) => f.write_str("Ease(custom)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_hit_endpoints() {
        for preset in [
            EasePreset::Linear,
            EasePreset::InQuad,
            EasePreset::OutQuad,
            EasePreset::InOutQuad,
            EasePreset::InCubic,
            EasePreset::OutCubic,
            EasePreset::OutBack,
            EasePreset::SmoothStep,
        ] {
            assert!(preset.apply(0.0).abs() < 1e-5, "{preset:?} at 0");
            assert!((preset.apply(1.0) - 1.0).abs() < 1e-5, "{preset:?} at 1");
        }
    }

    #[test]
    fn out_back_overshoots() {
        let peak = (1..100)
            .map(|i| EasePreset::OutBack.apply(i as f32 / 100.0))
            .fold(f32::MIN, f32::max);
        assert!(peak > 1.0);
    }

    #[test]
    fn custom_ease_is_called() {
        let e = Ease::from_fn(|t| t * 2.0);
        assert_eq!(e.eval(0.75), 1.5);
        assert_eq!(format!("{e:?}"), "Ease(custom)");
    }

    #[test]
    fn preset_names_are_snake_case() {
        let p: EasePreset = serde_json::from_str("\"in_out_quad\"").unwrap();
        assert_eq!(p, EasePreset::InOutQuad);
    }
}
