//! Jobs: a set of programs launched together with unified pause, cancel and
//! completion.
//!
//! The scheduler owns the [`Job`]; callers hold a [`JobHandle`] sharing its
//! flags. Handles are cheap to clone and may be moved into callbacks (an
//! `invoke` step can cancel its own job) or other threads.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, Waker};

use serde::{Deserialize, Serialize};

use crate::host::SceneHost;
use crate::ids::JobId;
use crate::lane::{Lane, LaneCtx, LaneStatus};
use crate::outputs::{EventSink, SequenceEvent};
use crate::program::Program;

const RUNNING: u8 = 0;
const FINISHED: u8 = 1;
const CANCELLED: u8 = 2;

/// Terminal state of a job.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobOutcome {
    Finished,
    Cancelled,
}

type Callback = Box<dyn FnOnce() + Send + Sync>;

/// Options for `Scheduler::run`.
#[derive(Default)]
pub struct RunOptions {
    /// Advance on the real clock instead of the host's scaled delta.
    pub ignore_scaled_time: bool,
    pub name: Option<String>,
    on_finished: Option<Callback>,
    on_cancelled: Option<Callback>,
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn ignore_scaled_time(mut self, ignore: bool) -> Self {
        self.ignore_scaled_time = ignore;
        self
    }

    pub fn on_finished<F>(mut self, f: F) -> Self
    where
        F: FnOnce() + Send + Sync + 'static,
    {
        self.on_finished = Some(Box::new(f));
        self
    }

    pub fn on_cancelled<F>(mut self, f: F) -> Self
    where
        F: FnOnce() + Send + Sync + 'static,
    {
        self.on_cancelled = Some(Box::new(f));
        self
    }
}

impl fmt::Debug for RunOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunOptions")
            .field("ignore_scaled_time", &self.ignore_scaled_time)
            .field("name", &self.name)
            .field("on_finished", &self.on_finished.is_some())
            .field("on_cancelled", &self.on_cancelled.is_some())
            .finish()
    }
}

#[derive(Debug)]
struct JobShared {
    id: JobId,
    name: Option<String>,
    state: AtomicU8,
    paused: AtomicBool,
    /// Set once the completion callback has run.
    settled: AtomicBool,
    /// One entry per pending `Completion` task.
    wakers: Mutex<Vec<Waker>>,
}

impl JobShared {
    #[inline]
    fn state(&self) -> u8 {
        self.state.load(Ordering::Acquire)
    }

    fn transition(&self, to: u8) -> bool {
        self.state
            .compare_exchange(RUNNING, to, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn outcome(&self) -> Option<JobOutcome> {
        match self.state() {
            FINISHED => Some(JobOutcome::Finished),
            CANCELLED => Some(JobOutcome::Cancelled),
            _ => None,
        }
    }

    fn settle(&self) {
        self.settled.store(true, Ordering::Release);
        let wakers = match self.wakers.lock() {
            Ok(mut pending) => std::mem::take(&mut *pending),
            Err(_) => Vec::new(),
        };
        for w in wakers {
            w.wake();
        }
    }
}

/// Caller-side view of a running job.
#[derive(Clone, Debug)]
pub struct JobHandle {
    shared: Arc<JobShared>,
}

impl JobHandle {
    pub fn id(&self) -> JobId {
        self.shared.id
    }

    pub fn name(&self) -> Option<&str> {
        self.shared.name.as_deref()
    }

    pub fn is_running(&self) -> bool {
        self.shared.state() == RUNNING
    }

    pub fn is_paused(&self) -> bool {
        self.shared.paused.load(Ordering::Acquire)
    }

    /// Paused jobs are not stepped: no time accumulates and no instruction runs.
    pub fn set_paused(&self, paused: bool) {
        self.shared.paused.store(paused, Ordering::Release);
    }

    /// Stop the job at the next lane boundary. Returns `false` when it had
    /// already reached a terminal state.
    pub fn cancel(&self) -> bool {
        let cancelled = self.shared.transition(CANCELLED);
        if cancelled {
            log::debug!("job {:?} cancel requested", self.shared.id);
        }
        cancelled
    }

    /// True once finished or cancelled (cancellation counts as finished).
    pub fn is_finished(&self) -> bool {
        self.shared.state() != RUNNING
    }

    pub fn did_cancel(&self) -> bool {
        self.shared.state() == CANCELLED
    }

    /// True once the scheduler has fired the completion callback.
    pub fn is_settled(&self) -> bool {
        self.shared.settled.load(Ordering::Acquire)
    }

    pub fn outcome(&self) -> Option<JobOutcome> {
        self.shared.outcome()
    }

    /// Future resolving after the job settles.
    pub fn completion(&self) -> Completion {
        Completion {
            shared: Arc::clone(&self.shared),
        }
    }
}

/// Awaitable completion of a job.
#[derive(Debug)]
pub struct Completion {
    shared: Arc<JobShared>,
}

impl Completion {
    fn ready(&self) -> Option<JobOutcome> {
        if self.shared.settled.load(Ordering::Acquire) {
            self.shared.outcome()
        } else {
            None
        }
    }
}

impl Future for Completion {
    type Output = JobOutcome;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if let Some(outcome) = self.ready() {
            return Poll::Ready(outcome);
        }
        if let Ok(mut pending) = self.shared.wakers.lock() {
            match pending.iter_mut().find(|w| w.will_wake(cx.waker())) {
                Some(w) => w.clone_from(cx.waker()),
                None => pending.push(cx.waker().clone()),
            }
        }
        // settle() may have run between the check and storing the waker
        match self.ready() {
            Some(outcome) => Poll::Ready(outcome),
            None => Poll::Pending,
        }
    }
}

/// Scheduler-owned job state.
pub(crate) struct Job {
    shared: Arc<JobShared>,
    lanes: Vec<Lane>,
    ignore_scaled_time: bool,
    on_finished: Option<Callback>,
    on_cancelled: Option<Callback>,
}

impl Job {
    pub(crate) fn new(id: JobId, programs: Vec<Program>, options: RunOptions) -> (Self, JobHandle) {
        let shared = Arc::new(JobShared {
            id,
            name: options.name,
            state: AtomicU8::new(RUNNING),
            paused: AtomicBool::new(false),
            settled: AtomicBool::new(false),
            wakers: Mutex::new(Vec::new()),
        });
        let lanes = programs
            .into_iter()
            .enumerate()
            .map(|(i, p)| Lane::new(i, p))
            .collect();
        let job = Self {
            shared: Arc::clone(&shared),
            lanes,
            ignore_scaled_time: options.ignore_scaled_time,
            on_finished: options.on_finished,
            on_cancelled: options.on_cancelled,
        };
        (job, JobHandle { shared })
    }

    #[inline]
    pub(crate) fn id(&self) -> JobId {
        self.shared.id
    }

    #[inline]
    pub(crate) fn ignores_scaled_time(&self) -> bool {
        self.ignore_scaled_time
    }

    pub(crate) fn lane_count(&self) -> usize {
        self.lanes.len()
    }

    pub(crate) fn handle(&self) -> JobHandle {
        JobHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Advance every lane once. Returns the outcome on the tick the job settles.
    pub(crate) fn step(
        &mut self,
        delta: f32,
        host: &mut dyn SceneHost,
        events: &mut EventSink<'_>,
    ) -> Option<JobOutcome> {
        let shared = Arc::clone(&self.shared);
        let cancelled = move || shared.state() == CANCELLED;

        if !cancelled() {
            if self.shared.paused.load(Ordering::Acquire) {
                return None;
            }
            let mut ctx = LaneCtx {
                job: self.shared.id,
                delta,
                host,
                events: &mut *events,
                cancelled: &cancelled,
            };
            let mut running = 0usize;
            for lane in self.lanes.iter_mut() {
                if lane.step(&mut ctx) == LaneStatus::Running {
                    running += 1;
                }
            }
            if running > 0 && !cancelled() {
                return None;
            }
        }

        Some(self.settle(events))
    }

    /// Completion watcher: exactly one callback, then the terminal state.
    fn settle(&mut self, events: &mut EventSink<'_>) -> JobOutcome {
        let outcome = if self.shared.transition(FINISHED) {
            JobOutcome::Finished
        } else {
            JobOutcome::Cancelled
        };
        let id = self.shared.id;
        match outcome {
            JobOutcome::Finished => {
                log::debug!("job {id:?} finished");
                if let Some(cb) = self.on_finished.take() {
                    cb();
                }
                events.push(SequenceEvent::JobFinished { job: id });
            }
            JobOutcome::Cancelled => {
                log::debug!("job {id:?} cancelled");
                if let Some(cb) = self.on_cancelled.take() {
                    cb();
                }
                events.push(SequenceEvent::JobCancelled { job: id });
            }
        }
        self.on_finished = None;
        self.on_cancelled = None;
        self.shared.settle();
        outcome
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("id", &self.shared.id)
            .field("name", &self.shared.name)
            .field("lanes", &self.lanes.len())
            .field("ignore_scaled_time", &self.ignore_scaled_time)
            .finish()
    }
}
