//! Vizij Sequence Core (engine-agnostic)
//!
//! Declarative animation sequencing. Callers author [`Program`]s (ordered
//! instruction queues bound to one target entity) through a [`Composition`],
//! launch them together as a job with [`Scheduler::run`], and drive everything
//! with [`Scheduler::tick`] once per frame against a [`SceneHost`].
//!
//! Instructions inside a program run strictly one after another; programs in
//! a job run concurrently. `flush` inserts a barrier lasting as long as the
//! longest instruction since the previous barrier.

pub mod clock;
pub mod config;
pub mod ease;
pub mod error;
pub mod host;
pub mod ids;
pub mod instruction;
pub mod job;
mod lane;
pub mod math;
pub mod memory;
pub mod outputs;
pub mod program;
pub mod reconcile;
pub mod scheduler;
pub mod script;
mod tween;

// Re-exports for consumers (adapters)
pub use clock::{Frame, RealClock};
pub use config::Config;
pub use ease::{Ease, EasePreset};
pub use error::{Result, SequenceError};
pub use host::{ColorProperty, SceneHost, Space, TargetResolver, ToggleTarget};
pub use ids::{ComponentId, EntityId, IdAllocator, JobId, MaterialId};
pub use instruction::{Action, FadeTarget, Instruction, Op, Opcode, Sampler};
pub use job::{Completion, JobHandle, JobOutcome, RunOptions};
pub use math::{Quat, Rgba, Vec3};
pub use memory::MemoryScene;
pub use outputs::{Outputs, SequenceEvent};
pub use program::{Composition, Defaults, Overrides, Program, ProgramBuilder};
pub use reconcile::{reconcile, FadeState, Reconciliation};
pub use scheduler::Scheduler;
pub use script::{parse_sequence_json, SequenceDoc};
