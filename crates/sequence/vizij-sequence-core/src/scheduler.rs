//! Scheduler: owns jobs, the shared real clock and per-tick outputs.
//!
//! Methods:
//! - new, compose, run (drain a composition into a job), tick (advance every
//!   job one frame against a host), cancel_all

use crate::clock::{sanitize_delta, Frame, RealClock};
use crate::config::Config;
use crate::host::SceneHost;
use crate::ids::{IdAllocator, JobId};
use crate::job::{Job, JobHandle, RunOptions};
use crate::outputs::{EventSink, Outputs, SequenceEvent};
use crate::program::{Composition, Program};

#[derive(Debug)]
pub struct Scheduler {
    cfg: Config,
    ids: IdAllocator,
    /// Creation order is stepping order.
    jobs: Vec<Job>,
    clock: RealClock,

    /// Events raised between ticks (job starts), delivered with the next tick.
    pending: Vec<SequenceEvent>,
    outputs: Outputs,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl Scheduler {
    pub fn new(cfg: Config) -> Self {
        if let Err(e) = cfg.validate() {
            log::warn!("{e}; continuing with the supplied values");
        }
        Self {
            jobs: Vec::with_capacity(cfg.job_capacity),
            cfg,
            ids: IdAllocator::new(),
            clock: RealClock::new(),
            pending: Vec::new(),
            outputs: Outputs::default(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Fresh authoring buffer using this scheduler's defaults.
    pub fn compose(&self) -> Composition {
        Composition::with_config(&self.cfg)
    }

    /// Launch every program in `composition` as one job, leaving it empty.
    pub fn run(&mut self, composition: &mut Composition, options: RunOptions) -> JobHandle {
        self.run_programs(composition.take_programs(), options)
    }

    pub fn run_programs(&mut self, programs: Vec<Program>, options: RunOptions) -> JobHandle {
        let id = self.ids.alloc_job();
        let name = options.name.clone();
        if options.ignore_scaled_time {
            self.clock.subscribe();
        }
        let (job, handle) = Job::new(id, programs, options);
        log::debug!(
            "job {:?} ({}) started with {} program(s)",
            id,
            name.as_deref().unwrap_or("unnamed"),
            job.lane_count()
        );
        self.pending.push(SequenceEvent::JobStarted {
            job: id,
            name,
            programs: job.lane_count(),
        });
        self.jobs.push(job);
        handle
    }

    /// Advance every job one frame, writing animated values into `host`.
    pub fn tick(&mut self, frame: Frame, host: &mut dyn SceneHost) -> &Outputs {
        self.outputs.clear();
        let mut sink = EventSink::new(&mut self.outputs, self.cfg.max_events_per_tick);
        for event in self.pending.drain(..) {
            sink.push(event);
        }

        self.clock.advance(frame.real_delta);
        let scaled = sanitize_delta(frame.scaled_delta);
        let real = self.clock.delta();

        let mut released_real = 0usize;
        self.jobs.retain_mut(|job| {
            let delta = if job.ignores_scaled_time() { real } else { scaled };
            match job.step(delta, &mut *host, &mut sink) {
                Some(_) => {
                    if job.ignores_scaled_time() {
                        released_real += 1;
                    }
                    false
                }
                None => true,
            }
        });
        for _ in 0..released_real {
            self.clock.unsubscribe();
        }

        &self.outputs
    }

    /// Outputs of the most recent tick.
    pub fn outputs(&self) -> &Outputs {
        &self.outputs
    }

    /// Jobs that have not settled yet.
    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_idle(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn job(&self, id: JobId) -> Option<JobHandle> {
        self.jobs.iter().find(|j| j.id() == id).map(|j| j.handle())
    }

    pub fn handles(&self) -> Vec<JobHandle> {
        self.jobs.iter().map(|j| j.handle()).collect()
    }

    /// Cancel every live job; callbacks fire on the next tick.
    pub fn cancel_all(&mut self) -> usize {
        self.jobs.iter().filter(|j| j.handle().cancel()).count()
    }

    pub fn real_clock(&self) -> &RealClock {
        &self.clock
    }
}
