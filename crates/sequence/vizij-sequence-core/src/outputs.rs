//! Output contracts from the scheduler.
//!
//! Scene writes go straight to the host during `Scheduler::tick()`; Outputs
//! only carry the discrete lifecycle signals of that tick so adapters can
//! forward them (Bevy events, logs, tests).

use serde::{Deserialize, Serialize};

use crate::ids::{EntityId, JobId};

/// Discrete semantic signals emitted during a tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum SequenceEvent {
    JobStarted {
        job: JobId,
        name: Option<String>,
        programs: usize,
    },
    ProgramCompleted {
        job: JobId,
        program: usize,
        target: EntityId,
    },
    /// A volatile fade found a different material list and rebuilt its snapshots.
    MaterialsReconciled {
        job: JobId,
        target: EntityId,
        materials: usize,
        carried_over: usize,
    },
    JobFinished {
        job: JobId,
    },
    JobCancelled {
        job: JobId,
    },
}

/// Outputs returned by `Scheduler::tick()`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Outputs {
    #[serde(default)]
    pub events: Vec<SequenceEvent>,
    /// Events discarded this tick because of `Config::max_events_per_tick`.
    #[serde(default)]
    pub dropped_events: usize,
}

impl Outputs {
    #[inline]
    pub fn clear(&mut self) {
        self.events.clear();
        self.dropped_events = 0;
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn finished(&self) -> impl Iterator<Item = JobId> + '_ {
        self.events.iter().filter_map(|e| match e {
            SequenceEvent::JobFinished { job } => Some(*job),
            _ => None,
        })
    }

    pub fn cancelled(&self) -> impl Iterator<Item = JobId> + '_ {
        self.events.iter().filter_map(|e| match e {
            SequenceEvent::JobCancelled { job } => Some(*job),
            _ => None,
        })
    }
}

/// Per-tick event sink with a hard cap.
#[derive(Debug)]
pub(crate) struct EventSink<'a> {
    out: &'a mut Outputs,
    cap: usize,
}

impl<'a> EventSink<'a> {
    pub(crate) fn new(out: &'a mut Outputs, cap: usize) -> Self {
        Self { out, cap }
    }

    pub(crate) fn push(&mut self, event: SequenceEvent) {
        if self.out.events.len() < self.cap {
            self.out.events.push(event);
        } else {
            if self.out.dropped_events == 0 {
                log::warn!(
                    "sequence events exceeded {} this tick; dropping the rest",
                    self.cap
                );
            }
            self.out.dropped_events += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sink_caps_events() {
        let mut out = Outputs::default();
        {
            let mut sink = EventSink::new(&mut out, 2);
            for i in 0..5 {
                sink.push(SequenceEvent::JobFinished { job: JobId(i) });
            }
        }
        assert_eq!(out.events.len(), 2);
        assert_eq!(out.dropped_events, 3);
        assert_eq!(out.finished().collect::<Vec<_>>(), vec![JobId(0), JobId(1)]);
        out.clear();
        assert!(out.is_empty());
    }
}
