//! Stored sequences: JSON documents describing one job.
//!
//! ```json
//! {
//!   "name": "intro",
//!   "defaults": { "duration": 0.5, "ease": "out_cubic" },
//!   "programs": [
//!     { "target": "cube", "steps": [
//!       { "op": "delay", "seconds": 1.0 },
//!       { "op": "move", "to": [3, 0, 0], "duration": 1.0 },
//!       { "op": "flush" },
//!       { "op": "reparent", "parent": "pivot" }
//!     ] }
//!   ]
//! }
//! ```
//!
//! Targets are names resolved through a [`TargetResolver`] at compose time;
//! fades list their materials from the [`SceneHost`] at that moment, exactly
//! like the fluent API.

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::ease::{Ease, EasePreset};
use crate::error::{Result, SequenceError};
use crate::host::{SceneHost, Space, TargetResolver, ToggleTarget};
use crate::ids::EntityId;
use crate::job::RunOptions;
use crate::math::{normalize4, quat_from_euler_degrees, Quat, Rgba, Vec3};
use crate::program::{Composition, Overrides, ProgramBuilder};

/// Authoring defaults; any field left out keeps the inherited value.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocDefaults {
    pub duration: Option<f32>,
    pub space: Option<Space>,
    pub ease: Option<String>,
    pub color_property: Option<String>,
}

/// Per-step overrides shared by timed steps.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timing {
    pub duration: Option<f32>,
    pub ease: Option<String>,
    pub space: Option<Space>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    Delay {
        seconds: f32,
    },
    Flush,
    Reparent {
        #[serde(default)]
        parent: Option<String>,
        #[serde(default)]
        keep_world: bool,
    },
    Move {
        to: Vec3,
        #[serde(flatten)]
        timing: Timing,
    },
    MoveRelative {
        reference: String,
        #[serde(default)]
        offset: Vec3,
        #[serde(flatten)]
        timing: Timing,
    },
    /// Quaternion `[x, y, z, w]`.
    Rotate {
        to: Quat,
        #[serde(flatten)]
        timing: Timing,
    },
    RotateEuler {
        degrees: Vec3,
        #[serde(flatten)]
        timing: Timing,
    },
    RotateBy {
        degrees: Vec3,
        #[serde(flatten)]
        timing: Timing,
    },
    Scale {
        to: Vec3,
        #[serde(flatten)]
        timing: Timing,
    },
    FadeColor {
        to: Rgba,
        #[serde(default)]
        property: Option<String>,
        #[serde(default)]
        volatile: bool,
        #[serde(flatten)]
        timing: Timing,
    },
    FadeAlpha {
        to: f32,
        #[serde(default)]
        property: Option<String>,
        #[serde(default)]
        volatile: bool,
        #[serde(flatten)]
        timing: Timing,
    },
    /// Toggles an entity; `target` defaults to the program's own target.
    SetActive {
        #[serde(default)]
        target: Option<String>,
        active: bool,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProgramDoc {
    pub target: String,
    #[serde(default)]
    pub defaults: DocDefaults,
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SequenceDoc {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub ignore_scaled_time: bool,
    #[serde(default)]
    pub defaults: DocDefaults,
    #[serde(default)]
    pub programs: Vec<ProgramDoc>,
}

pub fn parse_sequence_json(s: &str) -> Result<SequenceDoc> {
    Ok(serde_json::from_str(s)?)
}

/// Ease presets are spelled in snake_case (`"in_out_quad"`).
pub fn parse_ease(name: &str) -> Result<EasePreset> {
    serde_json::from_value(serde_json::Value::String(name.to_string())).map_err(|_| {
        SequenceError::UnknownEase {
            name: name.to_string(),
        }
    })
}

impl SequenceDoc {
    pub fn compose(
        &self,
        resolver: &mut dyn TargetResolver,
        scene: &dyn SceneHost,
    ) -> Result<(Composition, RunOptions)> {
        self.compose_with_config(&Config::default(), resolver, scene)
    }

    /// Build a composition whose programs start from `cfg`'s defaults, then
    /// the document defaults, then each program's own.
    pub fn compose_with_config(
        &self,
        cfg: &Config,
        resolver: &mut dyn TargetResolver,
        scene: &dyn SceneHost,
    ) -> Result<(Composition, RunOptions)> {
        let mut composition = Composition::with_config(cfg);
        for program in &self.programs {
            let target = resolve(resolver, &program.target)?;
            let builder = composition.begin(target);
            apply_defaults(builder, &self.defaults, &program.target)?;
            apply_defaults(builder, &program.defaults, &program.target)?;
            for (index, step) in program.steps.iter().enumerate() {
                let mut ctx = StepCtx {
                    builder: &mut *builder,
                    resolver: &mut *resolver,
                    scene,
                    program: &program.target,
                    index,
                };
                ctx.apply(step)?;
            }
        }

        let mut options = RunOptions::new().ignore_scaled_time(self.ignore_scaled_time);
        if let Some(name) = &self.name {
            options = options.named(name.clone());
        }
        log::debug!(
            "composed sequence {} with {} program(s)",
            self.name.as_deref().unwrap_or("unnamed"),
            composition.len()
        );
        Ok((composition, options))
    }
}

fn resolve(resolver: &mut dyn TargetResolver, name: &str) -> Result<EntityId> {
    resolver
        .resolve(name)
        .ok_or_else(|| SequenceError::UnknownTarget {
            name: name.to_string(),
        })
}

fn apply_defaults(builder: &mut ProgramBuilder, defaults: &DocDefaults, label: &str) -> Result<()> {
    if let Some(duration) = defaults.duration {
        if !duration.is_finite() || duration < 0.0 {
            return Err(SequenceError::InvalidStep {
                target: label.to_string(),
                index: 0,
                reason: format!("default duration {duration} must be finite and >= 0"),
            });
        }
        builder.set_duration(duration);
    }
    if let Some(space) = defaults.space {
        builder.set_space(space);
    }
    if let Some(ease) = &defaults.ease {
        builder.set_ease(parse_ease(ease)?);
    }
    if let Some(property) = &defaults.color_property {
        builder.set_color_property(property.as_str());
    }
    Ok(())
}

struct StepCtx<'a> {
    builder: &'a mut ProgramBuilder,
    resolver: &'a mut dyn TargetResolver,
    scene: &'a dyn SceneHost,
    program: &'a str,
    index: usize,
}

impl StepCtx<'_> {
    fn invalid(&self, reason: impl Into<String>) -> SequenceError {
        SequenceError::InvalidStep {
            target: self.program.to_string(),
            index: self.index,
            reason: reason.into(),
        }
    }

    fn finite(&self, what: &str, values: &[f32]) -> Result<()> {
        if values.iter().all(|v| v.is_finite()) {
            Ok(())
        } else {
            Err(self.invalid(format!("{what} must be finite")))
        }
    }

    fn overrides(&self, timing: &Timing) -> Result<Overrides> {
        let mut over = Overrides::new();
        if let Some(duration) = timing.duration {
            if !duration.is_finite() || duration < 0.0 {
                return Err(self.invalid(format!("duration {duration} must be finite and >= 0")));
            }
            over = over.duration(duration);
        }
        if let Some(ease) = &timing.ease {
            over = over.ease(Ease::preset(parse_ease(ease)?));
        }
        if let Some(space) = timing.space {
            over = over.space(space);
        }
        Ok(over)
    }

    fn fade_overrides(
        &self,
        timing: &Timing,
        property: &Option<String>,
        volatile: bool,
    ) -> Result<Overrides> {
        let mut over = self.overrides(timing)?;
        if let Some(property) = property {
            if property.is_empty() {
                return Err(self.invalid("color property must not be empty"));
            }
            over = over.color_property(property.as_str());
        }
        if volatile {
            over = over.volatile();
        }
        Ok(over)
    }

    fn apply(&mut self, step: &Step) -> Result<()> {
        match step {
            Step::Delay { seconds } => {
                if !seconds.is_finite() || *seconds < 0.0 {
                    return Err(self.invalid(format!("delay {seconds} must be finite and >= 0")));
                }
                self.builder.delay(*seconds);
            }
            Step::Flush => {
                self.builder.flush();
            }
            Step::Reparent { parent, keep_world } => {
                let parent = match parent {
                    Some(name) => Some(resolve(&mut *self.resolver, name)?),
                    None => None,
                };
                self.builder.reparent_with(parent, *keep_world);
            }
            Step::Move { to, timing } => {
                self.finite("move target", to)?;
                let over = self.overrides(timing)?;
                self.builder.move_to_with(*to, over);
            }
            Step::MoveRelative {
                reference,
                offset,
                timing,
            } => {
                self.finite("offset", offset)?;
                let reference = resolve(&mut *self.resolver, reference)?;
                let over = self.overrides(timing)?;
                self.builder.move_relative_to_with(reference, *offset, over);
            }
            Step::Rotate { to, timing } => {
                self.finite("rotation", to)?;
                let len_sq: f32 = to.iter().map(|c| c * c).sum();
                if len_sq <= f32::EPSILON {
                    return Err(self.invalid("rotation quaternion has zero length"));
                }
                let over = self.overrides(timing)?;
                self.builder.rotate_to_with(normalize4(*to), over);
            }
            Step::RotateEuler { degrees, timing } => {
                self.finite("euler angles", degrees)?;
                let over = self.overrides(timing)?;
                self.builder
                    .rotate_to_with(quat_from_euler_degrees(*degrees), over);
            }
            Step::RotateBy { degrees, timing } => {
                self.finite("euler angles", degrees)?;
                let over = self.overrides(timing)?;
                self.builder.rotate_by_with(*degrees, over);
            }
            Step::Scale { to, timing } => {
                self.finite("scale", to)?;
                let over = self.overrides(timing)?;
                self.builder.scale_to_with(*to, over);
            }
            Step::FadeColor {
                to,
                property,
                volatile,
                timing,
            } => {
                self.finite("color", to)?;
                let over = self.fade_overrides(timing, property, *volatile)?;
                self.builder.fade_color_with(self.scene, *to, over);
            }
            Step::FadeAlpha {
                to,
                property,
                volatile,
                timing,
            } => {
                self.finite("alpha", &[*to])?;
                let over = self.fade_overrides(timing, property, *volatile)?;
                self.builder.fade_alpha_with(self.scene, *to, over);
            }
            Step::SetActive { target, active } => {
                let entity = match target {
                    Some(name) => resolve(&mut *self.resolver, name)?,
                    None => self.builder.target(),
                };
                self.builder
                    .set_active(ToggleTarget::Entity(entity), *active);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_steps_with_inline_timing() {
        let doc = parse_sequence_json(
            r#"{ "programs": [ { "target": "a", "steps": [
                { "op": "move", "to": [1, 2, 3], "duration": 0.5, "ease": "in_quad" },
                { "op": "flush" }
            ] } ] }"#,
        )
        .unwrap();
        assert_eq!(
            doc.programs[0].steps[0],
            Step::Move {
                to: [1.0, 2.0, 3.0],
                timing: Timing {
                    duration: Some(0.5),
                    ease: Some("in_quad".into()),
                    space: None,
                },
            }
        );
        assert_eq!(doc.programs[0].steps[1], Step::Flush);
    }

    #[test]
    fn ease_names_are_snake_case() {
        assert_eq!(parse_ease("out_back").unwrap(), EasePreset::OutBack);
        assert!(matches!(
            parse_ease("bounce"),
            Err(SequenceError::UnknownEase { .. })
        ));
    }

    #[test]
    fn unknown_op_is_a_parse_error() {
        let err = parse_sequence_json(
            r#"{ "programs": [ { "target": "a", "steps": [ { "op": "teleport" } ] } ] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, SequenceError::Parse(_)));
    }
}
