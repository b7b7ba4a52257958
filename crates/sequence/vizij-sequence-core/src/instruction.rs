//! Instructions: one scheduled operation each, immutable once authored.
//!
//! Execution state (snapshots, timers, the working material list of a fade)
//! lives in the lane that runs the instruction, never here.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::ease::Ease;
use crate::host::{ColorProperty, Space, ToggleTarget};
use crate::ids::{EntityId, MaterialId};
use crate::math::{Quat, Vec3};

/// Coarse kind of an instruction, used for logging and the flush scan.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Opcode {
    Wait,
    Barrier,
    Reparent,
    Move,
    MoveRelativeTo,
    Rotate,
    RotateByVector,
    Scale,
    FadeColor,
    FadeAlpha,
    ToggleActive,
    CustomSample,
    Invoke,
}

impl Opcode {
    /// Runs the interpolation routine rather than completing instantly or waiting.
    pub fn is_property_animation(self) -> bool {
        matches!(
            self,
            Opcode::Move
                | Opcode::MoveRelativeTo
                | Opcode::Rotate
                | Opcode::RotateByVector
                | Opcode::Scale
                | Opcode::FadeColor
                | Opcode::FadeAlpha
                | Opcode::CustomSample
        )
    }
}

/// Callback run by `Invoke`.
#[derive(Clone)]
pub struct Action(Arc<dyn Fn() + Send + Sync>);

impl Action {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    #[inline]
    pub fn call(&self) {
        (self.0)()
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Action(..)")
    }
}

/// Per-tick callback of `CustomSample`, receiving the eased factor.
#[derive(Clone)]
pub struct Sampler(Arc<dyn Fn(f32) + Send + Sync>);

impl Sampler {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(f32) + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    #[inline]
    pub fn call(&self, interpolated: f32) {
        (self.0)(interpolated)
    }
}

impl fmt::Debug for Sampler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Sampler(..)")
    }
}

/// Materials a fade writes to, resolved when the fade was authored.
#[derive(Clone, Debug, PartialEq)]
pub struct FadeTarget {
    pub materials: Vec<MaterialId>,
    pub property: ColorProperty,
    /// Materials may be swapped by the host mid-fade; reconcile every tick.
    pub volatile: bool,
}

/// Operation payload, one shape per opcode.
#[derive(Clone, Debug)]
pub enum Op {
    Wait,
    Barrier,
    Reparent {
        parent: Option<EntityId>,
        keep_world: bool,
    },
    Move {
        to: Vec3,
        space: Space,
    },
    /// Move (in world space) to `reference`'s world position plus `offset`.
    MoveRelativeTo {
        reference: EntityId,
        offset: Vec3,
    },
    Rotate {
        to: Quat,
        space: Space,
    },
    /// Rotate by Euler degrees, one axis after another.
    RotateByVector {
        degrees: Vec3,
        space: Space,
    },
    Scale {
        to: Vec3,
    },
    FadeColor {
        target: FadeTarget,
        to: [f32; 4],
    },
    FadeAlpha {
        target: FadeTarget,
        to: f32,
    },
    ToggleActive {
        target: ToggleTarget,
        active: bool,
    },
    CustomSample {
        sampler: Sampler,
    },
    Invoke {
        action: Action,
    },
}

#[derive(Clone, Debug)]
pub struct Instruction {
    duration: f32,
    ease: Ease,
    op: Op,
}

impl Instruction {
    /// Negative and non-finite durations are treated as zero.
    pub fn new(op: Op, duration: f32, ease: Ease) -> Self {
        let duration = if duration.is_finite() {
            duration.max(0.0)
        } else {
            0.0
        };
        Self { duration, ease, op }
    }

    /// An instruction with no timing of its own (reparent, toggle, invoke).
    pub fn instant(op: Op) -> Self {
        Self::new(op, 0.0, Ease::linear())
    }

    pub fn wait(duration: f32) -> Self {
        Self::new(Op::Wait, duration, Ease::linear())
    }

    pub fn barrier(duration: f32) -> Self {
        Self::new(Op::Barrier, duration, Ease::linear())
    }

    #[inline]
    pub fn duration(&self) -> f32 {
        self.duration
    }

    #[inline]
    pub fn ease(&self) -> &Ease {
        &self.ease
    }

    #[inline]
    pub fn op(&self) -> &Op {
        &self.op
    }

    /// Declared space for Move/Rotate style instructions.
    pub fn space(&self) -> Option<Space> {
        match &self.op {
            Op::Move { space, .. } | Op::Rotate { space, .. } | Op::RotateByVector { space, .. } => {
                Some(*space)
            }
            Op::MoveRelativeTo { .. } => Some(Space::World),
            _ => None,
        }
    }

    pub fn opcode(&self) -> Opcode {
        match &self.op {
            Op::Wait => Opcode::Wait,
            Op::Barrier => Opcode::Barrier,
            Op::Reparent { .. } => Opcode::Reparent,
            Op::Move { .. } => Opcode::Move,
            Op::MoveRelativeTo { .. } => Opcode::MoveRelativeTo,
            Op::Rotate { .. } => Opcode::Rotate,
            Op::RotateByVector { .. } => Opcode::RotateByVector,
            Op::Scale { .. } => Opcode::Scale,
            Op::FadeColor { .. } => Opcode::FadeColor,
            Op::FadeAlpha { .. } => Opcode::FadeAlpha,
            Op::ToggleActive { .. } => Opcode::ToggleActive,
            Op::CustomSample { .. } => Opcode::CustomSample,
            Op::Invoke { .. } => Opcode::Invoke,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_are_sanitized() {
        assert_eq!(Instruction::wait(-2.0).duration(), 0.0);
        assert_eq!(Instruction::wait(f32::NAN).duration(), 0.0);
        assert_eq!(Instruction::wait(0.5).duration(), 0.5);
    }

    #[test]
    fn opcode_classification() {
        let mv = Instruction::new(
            Op::Move {
                to: [1.0, 0.0, 0.0],
                space: Space::World,
            },
            1.0,
            Ease::linear(),
        );
        assert_eq!(mv.opcode(), Opcode::Move);
        assert_eq!(mv.space(), Some(Space::World));
        assert!(mv.opcode().is_property_animation());
        assert!(!Instruction::barrier(1.0).opcode().is_property_animation());
        assert_eq!(
            Instruction::instant(Op::Invoke {
                action: Action::new(|| {})
            })
            .space(),
            None
        );
    }
}
