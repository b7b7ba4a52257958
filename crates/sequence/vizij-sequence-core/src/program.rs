//! Programs and authoring.
//!
//! A [`Composition`] is the authoring buffer: `begin(target)` opens a
//! [`ProgramBuilder`] whose fluent calls append instructions, resolving any
//! unspecified space / duration / ease / color property to that program's
//! current defaults. `Scheduler::run` drains the composition into one job.

use std::collections::VecDeque;

use crate::config::Config;
use crate::ease::Ease;
use crate::host::{ColorProperty, SceneHost, Space, ToggleTarget};
use crate::ids::EntityId;
use crate::instruction::{Action, FadeTarget, Instruction, Op, Opcode, Sampler};
use crate::math::{quat_from_euler_degrees, Quat, Rgba, Vec3};

/// Program-scoped authoring defaults.
#[derive(Clone, Debug)]
pub struct Defaults {
    pub space: Space,
    pub duration: f32,
    pub ease: Ease,
    pub color_property: ColorProperty,
}

impl Defaults {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            space: cfg.default_space,
            duration: cfg.default_duration,
            ease: Ease::linear(),
            color_property: cfg.default_color_property.clone(),
        }
    }
}

impl Default for Defaults {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Per-call overrides; `None` falls back to the program defaults.
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub space: Option<Space>,
    pub duration: Option<f32>,
    pub ease: Option<Ease>,
    pub color_property: Option<ColorProperty>,
    /// Fades only: reconcile the material list every tick.
    pub volatile: bool,
}

impl Overrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn space(mut self, space: Space) -> Self {
        self.space = Some(space);
        self
    }

    pub fn duration(mut self, seconds: f32) -> Self {
        self.duration = Some(seconds);
        self
    }

    pub fn ease(mut self, ease: impl Into<Ease>) -> Self {
        self.ease = Some(ease.into());
        self
    }

    pub fn color_property(mut self, property: impl Into<ColorProperty>) -> Self {
        self.color_property = Some(property.into());
        self
    }

    pub fn volatile(mut self) -> Self {
        self.volatile = true;
        self
    }
}

/// Ordered instruction queue bound to one target entity.
#[derive(Clone, Debug)]
pub struct Program {
    target: EntityId,
    queue: VecDeque<Instruction>,
    defaults: Defaults,
}

impl Program {
    pub fn new(target: EntityId, defaults: Defaults) -> Self {
        Self {
            target,
            queue: VecDeque::new(),
            defaults,
        }
    }

    #[inline]
    pub fn target(&self) -> EntityId {
        self.target
    }

    /// Defaults in effect when the program was last authored.
    #[inline]
    pub fn defaults(&self) -> &Defaults {
        &self.defaults
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn instructions(&self) -> impl Iterator<Item = &Instruction> {
        self.queue.iter()
    }

    pub fn push(&mut self, instruction: Instruction) {
        self.queue.push_back(instruction);
    }

    #[inline]
    pub(crate) fn pop_front(&mut self) -> Option<Instruction> {
        self.queue.pop_front()
    }

    /// Longest duration appended since the nearest preceding barrier,
    /// ignoring waits and reparents.
    pub fn pending_barrier_duration(&self) -> f32 {
        let mut longest = 0.0f32;
        for instr in self.queue.iter().rev() {
            match instr.opcode() {
                Opcode::Barrier => break,
                Opcode::Wait | Opcode::Reparent => continue,
                _ => longest = longest.max(instr.duration()),
            }
        }
        longest
    }

    /// Append a barrier covering everything since the last one; no-op when
    /// nothing timed was appended.
    pub fn flush(&mut self) {
        let longest = self.pending_barrier_duration();
        if longest > 0.0 {
            self.queue.push_back(Instruction::barrier(longest));
        }
    }
}

/// Fluent authoring over one program.
#[derive(Debug)]
pub struct ProgramBuilder {
    program: Program,
}

impl ProgramBuilder {
    fn new(target: EntityId, defaults: Defaults) -> Self {
        Self {
            program: Program::new(target, defaults),
        }
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn target(&self) -> EntityId {
        self.program.target
    }

    pub fn set_space(&mut self, space: Space) -> &mut Self {
        self.program.defaults.space = space;
        self
    }

    pub fn set_duration(&mut self, seconds: f32) -> &mut Self {
        self.program.defaults.duration = seconds;
        self
    }

    pub fn set_ease(&mut self, ease: impl Into<Ease>) -> &mut Self {
        self.program.defaults.ease = ease.into();
        self
    }

    pub fn set_color_property(&mut self, property: impl Into<ColorProperty>) -> &mut Self {
        self.program.defaults.color_property = property.into();
        self
    }

    fn push_timed(&mut self, op: Op, over: &Overrides) -> &mut Self {
        let d = &self.program.defaults;
        let duration = over.duration.unwrap_or(d.duration);
        let ease = over.ease.clone().unwrap_or_else(|| d.ease.clone());
        self.program.push(Instruction::new(op, duration, ease));
        self
    }

    fn space_of(&self, over: &Overrides) -> Space {
        over.space.unwrap_or(self.program.defaults.space)
    }

    fn fade_target(&self, scene: &dyn SceneHost, over: &Overrides) -> FadeTarget {
        FadeTarget {
            materials: scene.materials(self.program.target),
            property: over
                .color_property
                .clone()
                .unwrap_or_else(|| self.program.defaults.color_property.clone()),
            volatile: over.volatile,
        }
    }

    /// Suspend the program for `seconds`.
    pub fn delay(&mut self, seconds: f32) -> &mut Self {
        self.program.push(Instruction::wait(seconds));
        self
    }

    /// Wait for everything appended since the last barrier.
    pub fn flush(&mut self) -> &mut Self {
        self.program.flush();
        self
    }

    /// Re-parent the target keeping its local pose.
    pub fn reparent(&mut self, parent: Option<EntityId>) -> &mut Self {
        self.reparent_with(parent, false)
    }

    pub fn reparent_with(&mut self, parent: Option<EntityId>, keep_world: bool) -> &mut Self {
        self.program.push(Instruction::instant(Op::Reparent {
            parent,
            keep_world,
        }));
        self
    }

    pub fn move_to(&mut self, to: Vec3) -> &mut Self {
        self.move_to_with(to, Overrides::default())
    }

    pub fn move_to_with(&mut self, to: Vec3, over: Overrides) -> &mut Self {
        let space = self.space_of(&over);
        self.push_timed(Op::Move { to, space }, &over)
    }

    pub fn move_relative_to(&mut self, reference: EntityId, offset: Vec3) -> &mut Self {
        self.move_relative_to_with(reference, offset, Overrides::default())
    }

    pub fn move_relative_to_with(
        &mut self,
        reference: EntityId,
        offset: Vec3,
        over: Overrides,
    ) -> &mut Self {
        self.push_timed(Op::MoveRelativeTo { reference, offset }, &over)
    }

    pub fn rotate_to(&mut self, to: Quat) -> &mut Self {
        self.rotate_to_with(to, Overrides::default())
    }

    pub fn rotate_to_with(&mut self, to: Quat, over: Overrides) -> &mut Self {
        let space = self.space_of(&over);
        self.push_timed(Op::Rotate { to, space }, &over)
    }

    /// Rotate to an absolute orientation given as Euler degrees (X, Y, Z).
    pub fn rotate_to_euler(&mut self, degrees: Vec3) -> &mut Self {
        self.rotate_to(quat_from_euler_degrees(degrees))
    }

    /// Rotate by Euler degrees relative to the orientation at start.
    pub fn rotate_by(&mut self, degrees: Vec3) -> &mut Self {
        self.rotate_by_with(degrees, Overrides::default())
    }

    pub fn rotate_by_with(&mut self, degrees: Vec3, over: Overrides) -> &mut Self {
        let space = self.space_of(&over);
        self.push_timed(Op::RotateByVector { degrees, space }, &over)
    }

    pub fn scale_to(&mut self, to: Vec3) -> &mut Self {
        self.scale_to_with(to, Overrides::default())
    }

    pub fn scale_to_with(&mut self, to: Vec3, over: Overrides) -> &mut Self {
        self.push_timed(Op::Scale { to }, &over)
    }

    /// Fade every material currently attached to the target toward `to`.
    pub fn fade_color(&mut self, scene: &dyn SceneHost, to: Rgba) -> &mut Self {
        self.fade_color_with(scene, to, Overrides::default())
    }

    pub fn fade_color_with(&mut self, scene: &dyn SceneHost, to: Rgba, over: Overrides) -> &mut Self {
        let target = self.fade_target(scene, &over);
        self.push_timed(Op::FadeColor { target, to }, &over)
    }

    pub fn fade_alpha(&mut self, scene: &dyn SceneHost, to: f32) -> &mut Self {
        self.fade_alpha_with(scene, to, Overrides::default())
    }

    pub fn fade_alpha_with(&mut self, scene: &dyn SceneHost, to: f32, over: Overrides) -> &mut Self {
        let target = self.fade_target(scene, &over);
        self.push_timed(Op::FadeAlpha { target, to }, &over)
    }

    pub fn set_active(&mut self, target: ToggleTarget, active: bool) -> &mut Self {
        self.program
            .push(Instruction::instant(Op::ToggleActive { target, active }));
        self
    }

    /// Drive arbitrary state: `f` receives the eased factor every tick.
    pub fn sample<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(f32) + Send + Sync + 'static,
    {
        self.sample_with(f, Overrides::default())
    }

    pub fn sample_with<F>(&mut self, f: F, over: Overrides) -> &mut Self
    where
        F: Fn(f32) + Send + Sync + 'static,
    {
        self.push_timed(
            Op::CustomSample {
                sampler: Sampler::new(f),
            },
            &over,
        )
    }

    pub fn invoke<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.program.push(Instruction::instant(Op::Invoke {
            action: Action::new(f),
        }));
        self
    }

    /// Append a pre-built instruction as-is.
    pub fn push(&mut self, instruction: Instruction) -> &mut Self {
        self.program.push(instruction);
        self
    }
}

/// Authoring buffer of programs that will be launched together.
#[derive(Debug, Default)]
pub struct Composition {
    defaults: Defaults,
    programs: Vec<ProgramBuilder>,
}

impl Composition {
    pub fn new() -> Self {
        Self::default()
    }

    /// New programs start from the config's defaults.
    pub fn with_config(cfg: &Config) -> Self {
        Self {
            defaults: Defaults::from_config(cfg),
            programs: Vec::new(),
        }
    }

    /// Open a new program for `target`; it becomes the current program.
    pub fn begin(&mut self, target: EntityId) -> &mut ProgramBuilder {
        self.programs
            .push(ProgramBuilder::new(target, self.defaults.clone()));
        let last = self.programs.len() - 1;
        &mut self.programs[last]
    }

    /// The most recently opened program.
    ///
    /// # Panics
    /// When no program has been opened: authoring without `begin` is a caller bug.
    pub fn current(&mut self) -> &mut ProgramBuilder {
        match self.programs.last_mut() {
            Some(builder) => builder,
            None => panic!("authoring call without an open program; call begin(target) first"),
        }
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    pub fn programs(&self) -> impl Iterator<Item = &Program> {
        self.programs.iter().map(|b| &b.program)
    }

    /// Take every program out, leaving the buffer empty.
    pub fn take_programs(&mut self) -> Vec<Program> {
        self.programs.drain(..).map(|b| b.program).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T: EntityId = EntityId(1);

    fn opcodes(p: &Program) -> Vec<(Opcode, f32)> {
        p.instructions()
            .map(|i| (i.opcode(), i.duration()))
            .collect()
    }

    #[test]
    fn flush_takes_max_since_last_barrier() {
        let mut comp = Composition::new();
        comp.begin(T)
            .move_to_with([1.0, 0.0, 0.0], Overrides::new().duration(0.5))
            .scale_to_with([2.0, 2.0, 2.0], Overrides::new().duration(2.0))
            .rotate_by_with([0.0, 90.0, 0.0], Overrides::new().duration(1.0))
            .flush();
        let p = comp.current().program().clone();
        assert_eq!(opcodes(&p).last(), Some(&(Opcode::Barrier, 2.0)));
    }

    #[test]
    fn flush_ignores_waits_and_reparents_and_stops_at_barrier() {
        let mut comp = Composition::new();
        comp.begin(T)
            .move_to_with([1.0, 0.0, 0.0], Overrides::new().duration(3.0))
            .flush()
            .delay(5.0)
            .reparent(Some(EntityId(2)))
            .move_to_with([0.0, 0.0, 0.0], Overrides::new().duration(0.25))
            .flush();
        let ops = opcodes(comp.current().program());
        assert_eq!(ops[1], (Opcode::Barrier, 3.0));
        assert_eq!(ops.last(), Some(&(Opcode::Barrier, 0.25)));
    }

    #[test]
    fn flush_without_pending_work_is_noop() {
        let mut comp = Composition::new();
        comp.begin(T).flush();
        assert!(comp.current().program().is_empty());

        comp.current()
            .move_to_with([1.0, 0.0, 0.0], Overrides::new().duration(1.0))
            .flush()
            .flush()
            .delay(2.0)
            .flush();
        assert_eq!(comp.current().program().len(), 3);
    }

    #[test]
    fn zero_duration_work_does_not_synthesize_barrier() {
        let mut comp = Composition::new();
        comp.begin(T)
            .move_to_with([1.0, 0.0, 0.0], Overrides::new().duration(0.0))
            .invoke(|| {})
            .flush();
        assert_eq!(comp.current().program().len(), 2);
    }

    #[test]
    fn defaults_resolve_at_call_time() {
        let mut comp = Composition::new();
        comp.begin(T)
            .set_duration(0.5)
            .set_space(Space::World)
            .move_to([1.0, 0.0, 0.0])
            .set_duration(2.0)
            .move_to_with([2.0, 0.0, 0.0], Overrides::new().space(Space::Local));
        let p = comp.current().program();
        let got: Vec<(f32, Option<Space>)> =
            p.instructions().map(|i| (i.duration(), i.space())).collect();
        assert_eq!(got, vec![(0.5, Some(Space::World)), (2.0, Some(Space::Local))]);
    }

    #[test]
    fn defaults_are_program_scoped() {
        let mut comp = Composition::with_config(&Config {
            default_duration: 0.75,
            ..Config::default()
        });
        comp.begin(T).set_duration(3.0);
        comp.begin(EntityId(2)).move_to([0.0, 1.0, 0.0]);
        let durations: Vec<f32> = comp
            .programs()
            .nth(1)
            .unwrap()
            .instructions()
            .map(|i| i.duration())
            .collect();
        assert_eq!(durations, vec![0.75]);
    }

    #[test]
    #[should_panic(expected = "without an open program")]
    fn authoring_without_begin_panics() {
        let mut comp = Composition::new();
        comp.current().delay(1.0);
    }

    #[test]
    fn take_programs_clears_buffer() {
        let mut comp = Composition::new();
        comp.begin(T).delay(1.0);
        comp.begin(EntityId(9));
        let programs = comp.take_programs();
        assert_eq!(programs.len(), 2);
        assert_eq!(programs[1].target(), EntityId(9));
        assert!(comp.is_empty());
    }
}
