//! Frame and timer scheduler driven by an explicit clock.
//!
//! Nothing advances on its own: the host calls `tick` once per frame with
//! the elapsed time, and due tasks run from inside that call. This keeps
//! transition timing deterministic for tests and lets the host pick the
//! thread tasks run on.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

type TaskFn = Box<dyn FnMut() + Send>;

struct Task {
    id: u64,
    due: Duration,
    /// Earliest frame the task may run in
    frame: u64,
    period: Option<Duration>,
    canceled: Arc<AtomicBool>,
    run: TaskFn,
}

#[derive(Default)]
struct SchedulerState {
    now: Duration,
    frame: u64,
    next_id: u64,
    tasks: Vec<Task>,
}

/// Handle to a scheduled task
#[derive(Clone)]
pub struct Cancelable {
    id: u64,
    canceled: Arc<AtomicBool>,
    state: Weak<Mutex<SchedulerState>>,
}

impl Cancelable {
    /// Stop the task; canceling twice, or after it fired, is a no-op
    pub fn cancel(&self) {
        self.canceled.store(true, Ordering::Release);
        if let Some(state) = self.state.upgrade() {
            state.lock().tasks.retain(|t| t.id != self.id);
        }
    }

    pub fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::Acquire)
    }
}

/// Scheduler for frame callbacks, timeouts and intervals
pub struct System {
    state: Arc<Mutex<SchedulerState>>,
}

impl System {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SchedulerState::default())),
        }
    }

    /// Time elapsed since the scheduler was created
    pub fn timer(&self) -> Duration {
        self.state.lock().now
    }

    /// Frames ticked so far
    pub fn frame(&self) -> u64 {
        self.state.lock().frame
    }

    /// Run `f` on the next tick
    pub fn next_frame<F>(&self, f: F) -> Cancelable
    where
        F: FnOnce() + Send + 'static,
    {
        self.schedule(Duration::ZERO, None, once(f))
    }

    /// Run `f` once `delay` has elapsed
    pub fn set_timeout<F>(&self, delay: Duration, f: F) -> Cancelable
    where
        F: FnOnce() + Send + 'static,
    {
        self.schedule(delay, None, once(f))
    }

    /// Run `f` every `period` until canceled; a zero period fires once per tick
    pub fn set_interval<F>(&self, period: Duration, f: F) -> Cancelable
    where
        F: FnMut() + Send + 'static,
    {
        self.schedule(period, Some(period), Box::new(f))
    }

    fn schedule(&self, delay: Duration, period: Option<Duration>, run: TaskFn) -> Cancelable {
        let canceled = Arc::new(AtomicBool::new(false));
        let mut state = self.state.lock();
        let id = state.next_id;
        state.next_id += 1;
        let task = Task {
            id,
            due: state.now + delay,
            frame: state.frame + 1,
            period,
            canceled: Arc::clone(&canceled),
            run,
        };
        state.tasks.push(task);

        Cancelable {
            id,
            canceled,
            state: Arc::downgrade(&self.state),
        }
    }

    /// Advance the clock by `delta` and run every task that became due.
    ///
    /// Tasks run in due order, ties in scheduling order, with the scheduler
    /// unlocked so they may schedule or cancel other tasks.
    pub fn tick(&self, delta: Duration) {
        {
            let mut state = self.state.lock();
            state.now += delta;
            state.frame += 1;
        }

        loop {
            let mut task = {
                let mut state = self.state.lock();
                let (now, frame) = (state.now, state.frame);
                let next = state
                    .tasks
                    .iter()
                    .enumerate()
                    .filter(|(_, t)| t.due <= now && t.frame <= frame)
                    .min_by_key(|(_, t)| (t.due, t.id))
                    .map(|(index, _)| index);
                match next {
                    Some(index) => state.tasks.swap_remove(index),
                    None => break,
                }
            };

            (task.run)();

            if let Some(period) = task.period {
                if task.canceled.load(Ordering::Acquire) {
                    continue;
                }
                let mut state = self.state.lock();
                task.due += period;
                if period.is_zero() {
                    task.frame = state.frame + 1;
                }
                state.tasks.push(task);
            } else {
                task.canceled.store(true, Ordering::Release);
            }
        }
    }

    /// Scheduled tasks not yet fired or canceled
    pub fn pending(&self) -> usize {
        self.state.lock().tasks.len()
    }
}

impl Default for System {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for System {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

fn once<F>(f: F) -> TaskFn
where
    F: FnOnce() + Send + 'static,
{
    let mut slot = Some(f);
    Box::new(move || {
        if let Some(f) = slot.take() {
            f();
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counter() -> (Arc<AtomicUsize>, impl FnMut() + Send + 'static) {
        let hits = Arc::new(AtomicUsize::new(0));
        let inner = hits.clone();
        (hits, move || {
            inner.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_timeout_fires_once_when_due() {
        let system = System::new();
        let (hits, mut bump) = counter();
        system.set_timeout(Duration::from_millis(100), move || bump());

        system.tick(Duration::from_millis(60));
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        system.tick(Duration::from_millis(60));
        system.tick(Duration::from_millis(60));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(system.pending(), 0);
        assert_eq!(system.timer(), Duration::from_millis(180));
    }

    #[test]
    fn test_next_frame_waits_for_tick() {
        let system = System::new();
        let (hits, mut bump) = counter();
        system.next_frame(move || bump());

        assert_eq!(hits.load(Ordering::SeqCst), 0);
        system.tick(Duration::ZERO);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_interval_rearms_until_canceled() {
        let system = System::new();
        let (hits, bump) = counter();
        let handle = system.set_interval(Duration::from_millis(10), bump);

        system.tick(Duration::from_millis(35));
        assert_eq!(hits.load(Ordering::SeqCst), 3);

        handle.cancel();
        system.tick(Duration::from_millis(100));
        assert_eq!(hits.load(Ordering::SeqCst), 3);
        assert!(handle.is_canceled());
    }

    #[test]
    fn test_zero_interval_fires_once_per_tick() {
        let system = System::new();
        let (hits, bump) = counter();
        system.set_interval(Duration::ZERO, bump);

        system.tick(Duration::from_millis(16));
        system.tick(Duration::from_millis(16));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_canceled_timeout_never_fires() {
        let system = System::new();
        let (hits, mut bump) = counter();
        let handle = system.set_timeout(Duration::from_millis(5), move || bump());

        handle.cancel();
        system.tick(Duration::from_millis(10));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_tasks_run_in_due_order() {
        let system = System::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        for (delay, tag) in [(30, "c"), (10, "a"), (20, "b")] {
            let log = log.clone();
            system.set_timeout(Duration::from_millis(delay), move || log.lock().push(tag));
        }

        system.tick(Duration::from_millis(50));
        assert_eq!(*log.lock(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_task_may_schedule_from_inside_tick() {
        let system = System::new();
        let (hits, mut bump) = counter();
        let inner = system.clone();
        system.set_timeout(Duration::ZERO, move || {
            inner.next_frame(move || bump());
        });

        system.tick(Duration::ZERO);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        system.tick(Duration::ZERO);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
