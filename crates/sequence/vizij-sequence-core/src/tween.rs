//! Interpolation routine for property-animation instructions.
//!
//! `Tween::begin` snapshots the animated property from the host at the moment
//! the instruction starts executing (never the authored value), so chained
//! and interrupted animations continue from the true current state. Each
//! `advance` accumulates time, evaluates the (unclamped) ease and writes the
//! blended value back; the final write always uses `ease(1)`.

use crate::host::{SceneHost, Space};
use crate::ids::EntityId;
use crate::instruction::{Instruction, Op};
use crate::math::{
    add3, lerp_clamped, lerp_vec3, lerp_vec4, nlerp_quat, quat_from_axis_angle, quat_mul, Quat,
    Vec3,
};
use crate::reconcile::{reconcile, FadeState, Reconciliation};

#[derive(Clone, Debug)]
enum Snapshot {
    Position(Vec3),
    Rotation(Quat),
    Scale(Vec3),
    Fade(FadeState),
    Nothing,
}

/// Result of one `advance`.
#[derive(Copy, Clone, Debug, Default)]
pub(crate) struct TweenStep {
    pub done: bool,
    pub reconciled: Option<Reconciliation>,
}

#[derive(Clone, Debug)]
pub(crate) struct Tween {
    instruction: Instruction,
    elapsed: f32,
    snapshot: Snapshot,
}

impl Tween {
    pub(crate) fn begin(instruction: Instruction, host: &dyn SceneHost, target: EntityId) -> Self {
        let snapshot = match instruction.op() {
            Op::Move { space, .. } => Snapshot::Position(host.position(target, *space)),
            Op::MoveRelativeTo { .. } => Snapshot::Position(host.position(target, Space::World)),
            Op::Rotate { space, .. } | Op::RotateByVector { space, .. } => {
                Snapshot::Rotation(host.rotation(target, *space))
            }
            Op::Scale { .. } => Snapshot::Scale(host.scale(target)),
            Op::FadeColor { target: fade, .. } | Op::FadeAlpha { target: fade, .. } => {
                Snapshot::Fade(FadeState::capture(&fade.materials, &fade.property, host))
            }
            _ => Snapshot::Nothing,
        };
        Self {
            instruction,
            elapsed: 0.0,
            snapshot,
        }
    }

    pub(crate) fn instruction(&self) -> &Instruction {
        &self.instruction
    }

    pub(crate) fn advance(
        &mut self,
        delta: f32,
        host: &mut dyn SceneHost,
        target: EntityId,
    ) -> TweenStep {
        let duration = self.instruction.duration();
        self.elapsed = (self.elapsed + delta).min(duration);
        let factor = if duration > 0.0 {
            self.elapsed / duration
        } else {
            1.0
        };
        let t = self.instruction.ease().eval(factor);
        let mut step = TweenStep::default();

        match (self.instruction.op(), &mut self.snapshot) {
            (Op::Move { to, space }, Snapshot::Position(from)) => {
                host.set_position(target, *space, lerp_vec3(*from, *to, t));
            }
            (Op::MoveRelativeTo { reference, offset }, Snapshot::Position(from)) => {
                let to = add3(host.position(*reference, Space::World), *offset);
                host.set_position(target, Space::World, lerp_vec3(*from, to, t));
            }
            (Op::Rotate { to, space }, Snapshot::Rotation(from)) => {
                host.set_rotation(target, *space, nlerp_quat(*from, *to, t));
            }
            (Op::RotateByVector { degrees, space }, Snapshot::Rotation(from)) => {
                host.set_rotation(target, *space, rotate_by_axes(*from, *degrees, *space, t));
            }
            (Op::Scale { to }, Snapshot::Scale(from)) => {
                host.set_scale(target, lerp_vec3(*from, *to, t));
            }
            (Op::FadeColor { target: fade, to }, Snapshot::Fade(state)) => {
                if fade.volatile {
                    step.reconciled =
                        reconcile(state, host.materials(target), &fade.property, &*host);
                }
                for (m, from) in state.materials.iter().zip(state.from.iter()) {
                    host.set_material_color(*m, &fade.property, lerp_vec4(*from, *to, t));
                }
            }
            (Op::FadeAlpha { target: fade, to }, Snapshot::Fade(state)) => {
                if fade.volatile {
                    step.reconciled =
                        reconcile(state, host.materials(target), &fade.property, &*host);
                }
                for (m, from) in state.materials.iter().zip(state.from.iter()) {
                    let mut color = *from;
                    color[3] = lerp_clamped(from[3], *to, t);
                    host.set_material_color(*m, &fade.property, color);
                }
            }
            (Op::CustomSample { sampler }, _) => sampler.call(t),
            (op, _) => {
                log::warn!("instruction {op:?} is not a property animation; skipping");
            }
        }

        step.done = self.elapsed >= duration;
        step
    }
}

/// One axis-angle rotation per Euler component, applied X then Y then Z on
/// top of `from`. Each angle is `|component| * t` about the axis signed like
/// the component.
fn rotate_by_axes(from: Quat, degrees: Vec3, space: Space, t: f32) -> Quat {
    let axis_step = |component: f32, axis: Vec3| {
        let sign = if component < 0.0 { -1.0 } else { 1.0 };
        quat_from_axis_angle(
            [axis[0] * sign, axis[1] * sign, axis[2] * sign],
            component.abs() * t,
        )
    };
    let qx = axis_step(degrees[0], [1.0, 0.0, 0.0]);
    let qy = axis_step(degrees[1], [0.0, 1.0, 0.0]);
    let qz = axis_step(degrees[2], [0.0, 0.0, 1.0]);
    match space {
        Space::Local => quat_mul(quat_mul(quat_mul(from, qx), qy), qz),
        Space::World => quat_mul(qz, quat_mul(qy, quat_mul(qx, from))),
    }
}
