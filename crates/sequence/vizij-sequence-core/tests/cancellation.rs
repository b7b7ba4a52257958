use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, Wake, Waker};

use vizij_sequence_core::{
    Frame, JobHandle, JobOutcome, MemoryScene, Overrides, RunOptions, Scheduler, SceneHost,
    SequenceEvent, Space,
};

fn counter() -> (Arc<AtomicUsize>, impl FnOnce() + Send + Sync + 'static) {
    let count = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&count);
    (count, move || {
        c.fetch_add(1, Ordering::SeqCst);
    })
}

/// it should stop writing after cancel and fire only on_cancelled, once
#[test]
fn cancel_between_ticks() {
    let mut scene = MemoryScene::new();
    let t = scene.spawn("t");
    let mut scheduler = Scheduler::default();
    let (finished, on_finished) = counter();
    let (cancelled, on_cancelled) = counter();

    let mut comp = scheduler.compose();
    comp.begin(t).move_to([1.0, 0.0, 0.0]);
    let handle = scheduler.run(
        &mut comp,
        RunOptions::new()
            .on_finished(on_finished)
            .on_cancelled(on_cancelled),
    );

    scheduler.tick(Frame::scaled(0.25), &mut scene);
    let writes = scene.writes();
    assert!(handle.cancel());
    assert!(!handle.cancel());
    assert!(handle.is_finished());
    assert!(handle.did_cancel());
    assert!(!handle.is_settled());

    let out = scheduler.tick(Frame::scaled(0.25), &mut scene);
    assert_eq!(out.cancelled().collect::<Vec<_>>(), vec![handle.id()]);
    assert!(handle.is_settled());
    for _ in 0..8 {
        scheduler.tick(Frame::scaled(0.25), &mut scene);
    }

    assert_eq!(scene.writes(), writes);
    assert_eq!(scene.position(t, Space::Local), [0.25, 0.0, 0.0]);
    assert_eq!(cancelled.load(Ordering::SeqCst), 1);
    assert_eq!(finished.load(Ordering::SeqCst), 0);
    assert_eq!(handle.outcome(), Some(JobOutcome::Cancelled));
}

/// it should stop sibling programs in the same tick when an invoke cancels the job
#[test]
fn cancel_from_invoke() {
    let mut scene = MemoryScene::new();
    let a = scene.spawn("a");
    let b = scene.spawn("b");
    let mut scheduler = Scheduler::default();
    let slot: Arc<Mutex<Option<JobHandle>>> = Arc::new(Mutex::new(None));
    let inner = Arc::clone(&slot);

    let mut comp = scheduler.compose();
    comp.begin(a).invoke(move || {
        if let Some(h) = inner.lock().unwrap().as_ref() {
            h.cancel();
        }
    });
    comp.begin(b).move_to([1.0, 0.0, 0.0]);
    let handle = scheduler.run(&mut comp, RunOptions::new());
    *slot.lock().unwrap() = Some(handle.clone());

    let out = scheduler.tick(Frame::scaled(0.5), &mut scene);
    assert!(out
        .events
        .contains(&SequenceEvent::JobCancelled { job: handle.id() }));
    assert_eq!(scene.writes(), 0);
    assert_eq!(scene.position(b, Space::Local), [0.0, 0.0, 0.0]);
    assert!(scheduler.is_idle());
}

/// it should settle a paused job when it is cancelled
#[test]
fn cancel_while_paused() {
    let mut scene = MemoryScene::new();
    let t = scene.spawn("t");
    let mut scheduler = Scheduler::default();
    let mut comp = scheduler.compose();
    comp.begin(t)
        .move_to_with([1.0, 0.0, 0.0], Overrides::new().duration(10.0));
    let handle = scheduler.run(&mut comp, RunOptions::new().ignore_scaled_time(true));

    handle.set_paused(true);
    scheduler.tick(Frame::new(0.1, 0.1), &mut scene);
    assert_eq!(scheduler.cancel_all(), 1);
    scheduler.tick(Frame::new(0.1, 0.1), &mut scene);

    assert!(handle.is_settled());
    assert!(scheduler.is_idle());
    assert!(!scheduler.real_clock().is_running());
}

/// it should report false when cancelling a job that already finished
#[test]
fn cancel_after_finish_is_noop() {
    let mut scene = MemoryScene::new();
    let t = scene.spawn("t");
    let mut scheduler = Scheduler::default();
    let (cancelled, on_cancelled) = counter();
    let mut comp = scheduler.compose();
    comp.begin(t).scale_to([2.0, 2.0, 2.0]);
    let handle = scheduler.run(&mut comp, RunOptions::new().on_cancelled(on_cancelled));

    scheduler.tick(Frame::scaled(1.0), &mut scene);
    assert!(!handle.cancel());
    assert!(!handle.did_cancel());
    assert_eq!(cancelled.load(Ordering::SeqCst), 0);
}

struct CountingWaker(AtomicUsize);

impl Wake for CountingWaker {
    fn wake(self: Arc<Self>) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// it should resolve the completion future once the job settles
#[test]
fn completion_future_wakes() {
    let mut scene = MemoryScene::new();
    let t = scene.spawn("t");
    let mut scheduler = Scheduler::default();
    let mut comp = scheduler.compose();
    comp.begin(t).move_to([1.0, 0.0, 0.0]);
    let handle = scheduler.run(&mut comp, RunOptions::new());

    let wakes = Arc::new(CountingWaker(AtomicUsize::new(0)));
    let waker = Waker::from(Arc::clone(&wakes));
    let mut cx = Context::from_waker(&waker);
    let mut completion = handle.completion();

    assert_eq!(Pin::new(&mut completion).poll(&mut cx), Poll::Pending);
    scheduler.tick(Frame::scaled(0.5), &mut scene);
    assert_eq!(wakes.0.load(Ordering::SeqCst), 0);
    scheduler.tick(Frame::scaled(0.5), &mut scene);
    assert_eq!(wakes.0.load(Ordering::SeqCst), 1);
    assert_eq!(
        Pin::new(&mut completion).poll(&mut cx),
        Poll::Ready(JobOutcome::Finished)
    );
}

/// it should wake every task awaiting the same job
#[test]
fn completion_wakes_every_waiter() {
    let mut scene = MemoryScene::new();
    let t = scene.spawn("t");
    let mut scheduler = Scheduler::default();
    let mut comp = scheduler.compose();
    comp.begin(t).scale_to([2.0, 2.0, 2.0]);
    let handle = scheduler.run(&mut comp, RunOptions::new());

    let first = Arc::new(CountingWaker(AtomicUsize::new(0)));
    let second = Arc::new(CountingWaker(AtomicUsize::new(0)));
    let first_waker = Waker::from(Arc::clone(&first));
    let second_waker = Waker::from(Arc::clone(&second));
    let mut a = handle.completion();
    let mut b = handle.clone().completion();

    let mut cx = Context::from_waker(&first_waker);
    assert_eq!(Pin::new(&mut a).poll(&mut cx), Poll::Pending);
    // re-polling with the same waker must not register it twice
    assert_eq!(Pin::new(&mut a).poll(&mut cx), Poll::Pending);
    let mut cx = Context::from_waker(&second_waker);
    assert_eq!(Pin::new(&mut b).poll(&mut cx), Poll::Pending);

    scheduler.tick(Frame::scaled(1.0), &mut scene);
    assert_eq!(first.0.load(Ordering::SeqCst), 1);
    assert_eq!(second.0.load(Ordering::SeqCst), 1);

    let mut cx = Context::from_waker(&first_waker);
    assert_eq!(
        Pin::new(&mut a).poll(&mut cx),
        Poll::Ready(JobOutcome::Finished)
    );
    assert_eq!(
        Pin::new(&mut b).poll(&mut cx),
        Poll::Ready(JobOutcome::Finished)
    );
}
