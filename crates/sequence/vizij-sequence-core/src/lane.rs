//! Per-program execution lane.
//!
//! A lane is an explicit state machine over its program's queue: it pops the
//! head, runs it to completion (instantly, over a timer, or through a
//! [`Tween`]) and only then pops the next one. Instant and zero-length
//! instructions complete inside the tick they start, so the lane keeps going
//! within that tick; a timed instruction ends the lane's work for the tick.

use crate::host::SceneHost;
use crate::ids::JobId;
use crate::instruction::{Instruction, Op};
use crate::outputs::{EventSink, SequenceEvent};
use crate::program::Program;
use crate::tween::Tween;

#[derive(Clone, Debug)]
enum Active {
    Timer { elapsed: f32, duration: f32 },
    Tween(Tween),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum LaneStatus {
    Running,
    Done,
}

pub(crate) struct LaneCtx<'a, 'e> {
    pub job: JobId,
    pub delta: f32,
    pub host: &'a mut dyn SceneHost,
    pub events: &'a mut EventSink<'e>,
    pub cancelled: &'a dyn Fn() -> bool,
}

#[derive(Debug)]
pub(crate) struct Lane {
    index: usize,
    program: Program,
    active: Option<Active>,
    done: bool,
}

impl Lane {
    pub(crate) fn new(index: usize, program: Program) -> Self {
        Self {
            index,
            program,
            active: None,
            done: false,
        }
    }

    pub(crate) fn step(&mut self, ctx: &mut LaneCtx<'_, '_>) -> LaneStatus {
        if self.done {
            return LaneStatus::Done;
        }
        loop {
            if (ctx.cancelled)() {
                // queue is abandoned, not drained
                self.active = None;
                self.done = true;
                return LaneStatus::Done;
            }

            let mut active = match self.active.take() {
                Some(active) => active,
                None => match self.program.pop_front() {
                    Some(instr) => match self.start(instr, ctx) {
                        Some(active) => active,
                        None => continue,
                    },
                    None => return self.complete(ctx),
                },
            };

            let target = self.program.target();
            let (finished, timed) = match &mut active {
                Active::Timer { elapsed, duration } => {
                    *elapsed = (*elapsed + ctx.delta).min(*duration);
                    (*elapsed >= *duration, *duration > 0.0)
                }
                Active::Tween(tween) => {
                    let step = tween.advance(ctx.delta, &mut *ctx.host, target);
                    if let Some(r) = step.reconciled {
                        log::debug!(
                            "job {:?} lane {}: fade materials changed ({} live, {} carried over)",
                            ctx.job,
                            self.index,
                            r.materials,
                            r.carried_over
                        );
                        ctx.events.push(SequenceEvent::MaterialsReconciled {
                            job: ctx.job,
                            target,
                            materials: r.materials,
                            carried_over: r.carried_over,
                        });
                    }
                    (step.done, tween.instruction().duration() > 0.0)
                }
            };

            if !finished {
                self.active = Some(active);
                return LaneStatus::Running;
            }
            if timed {
                if self.program.is_empty() {
                    return self.complete(ctx);
                }
                return LaneStatus::Running;
            }
        }
    }

    /// Apply instant instructions; return the in-flight state for the rest.
    fn start(&mut self, instr: Instruction, ctx: &mut LaneCtx<'_, '_>) -> Option<Active> {
        let target = self.program.target();
        log::trace!(
            "job {:?} lane {}: {:?} ({}s)",
            ctx.job,
            self.index,
            instr.opcode(),
            instr.duration()
        );
        match instr.op() {
            Op::Reparent { parent, keep_world } => {
                ctx.host.set_parent(target, *parent, *keep_world);
                return None;
            }
            Op::ToggleActive { target, active } => {
                ctx.host.set_active(*target, *active);
                return None;
            }
            Op::Invoke { action } => {
                action.call();
                return None;
            }
            Op::Wait | Op::Barrier => {
                return Some(Active::Timer {
                    elapsed: 0.0,
                    duration: instr.duration(),
                });
            }
            _ => {}
        }
        Some(Active::Tween(Tween::begin(instr, &*ctx.host, target)))
    }

    fn complete(&mut self, ctx: &mut LaneCtx<'_, '_>) -> LaneStatus {
        self.done = true;
        ctx.events.push(SequenceEvent::ProgramCompleted {
            job: ctx.job,
            program: self.index,
            target: self.program.target(),
        });
        LaneStatus::Done
    }
}
