//! Per-game timers with cancel-on-phase-change semantics
//!
//! Every task is a tokio task that only holds a `Weak` reference to the
//! game it belongs to. When it fires it locks the game and re-checks its
//! armed flag under that lock, so a task cancelled by a transition that won
//! the lock first never runs, even if its sleep already elapsed.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::AbortHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::debug;

/// Handle to a scheduled task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

/// Returned by repeating tasks after each run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repeat {
    Continue,
    Stop,
}

struct ArmedTask {
    label: &'static str,
    armed: Arc<AtomicBool>,
    abort: AbortHandle,
}

/// Owns the timers of one `G`. Dropping the scheduler cancels everything.
pub struct Scheduler<G> {
    target: Weak<Mutex<G>>,
    tasks: HashMap<TaskId, ArmedTask>,
    next_id: u64,
}

impl<G: Send + 'static> Scheduler<G> {
    pub fn new(target: Weak<Mutex<G>>) -> Self {
        Self {
            target,
            tasks: HashMap::new(),
            next_id: 0,
        }
    }

    /// Run `task` once after `delay`
    pub fn schedule_once<F>(&mut self, label: &'static str, delay: Duration, task: F) -> TaskId
    where
        F: FnOnce(&mut G) + Send + 'static,
    {
        let armed = Arc::new(AtomicBool::new(true));
        let flag = armed.clone();
        let target = self.target.clone();

        let handle = tokio::spawn(async move {
            time::sleep(delay).await;
            run_armed(&target, &flag, |game| {
                // Spent before running so the callback sees itself as disarmed
                flag.store(false, Ordering::Release);
                debug!(task = label, "Timer fired");
                task(game);
            });
        });

        self.register(label, armed, handle.abort_handle())
    }

    /// Run `task` after `initial_delay` and then every `period` until it
    /// returns `Repeat::Stop` or is cancelled
    pub fn schedule_repeating<F>(
        &mut self,
        label: &'static str,
        initial_delay: Duration,
        period: Duration,
        mut task: F,
    ) -> TaskId
    where
        F: FnMut(&mut G) -> Repeat + Send + 'static,
    {
        let armed = Arc::new(AtomicBool::new(true));
        let flag = armed.clone();
        let target = self.target.clone();

        let handle = tokio::spawn(async move {
            let mut ticks = time::interval_at(Instant::now() + initial_delay, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticks.tick().await;
                let outcome = run_armed(&target, &flag, |game| {
                    let repeat = task(game);
                    if repeat == Repeat::Stop {
                        flag.store(false, Ordering::Release);
                        debug!(task = label, "Repeating timer stopped itself");
                    }
                    repeat
                });

                if outcome != Some(Repeat::Continue) {
                    break;
                }
            }
        });

        self.register(label, armed, handle.abort_handle())
    }

    /// Cancel one task. Returns false if it had already fired, stopped or
    /// been cancelled.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        match self.tasks.remove(&id) {
            Some(task) => {
                let was_armed = task.armed.swap(false, Ordering::AcqRel);
                task.abort.abort();
                if was_armed {
                    debug!(task = task.label, "Timer cancelled");
                }
                was_armed
            }
            None => false,
        }
    }

    /// Cancel every task. Safe to call from inside a task callback: the
    /// running invocation completes, later ones never happen.
    pub fn cancel_all(&mut self) {
        let mut cancelled = 0;
        for (_, task) in self.tasks.drain() {
            if task.armed.swap(false, Ordering::AcqRel) {
                cancelled += 1;
            }
            task.abort.abort();
        }
        if cancelled > 0 {
            debug!(cancelled, "Cancelled all timers");
        }
    }

    pub fn is_armed(&self, id: TaskId) -> bool {
        self.tasks
            .get(&id)
            .is_some_and(|task| task.armed.load(Ordering::Acquire))
    }

    /// Number of tasks still waiting to fire
    pub fn armed_count(&self) -> usize {
        self.armed().count()
    }

    /// Labels of the tasks still waiting to fire, sorted
    pub fn armed_labels(&self) -> Vec<&'static str> {
        let mut labels: Vec<_> = self.armed().map(|task| task.label).collect();
        labels.sort_unstable();
        labels
    }

    fn armed(&self) -> impl Iterator<Item = &ArmedTask> {
        self.tasks
            .values()
            .filter(|task| task.armed.load(Ordering::Acquire))
    }

    fn register(
        &mut self,
        label: &'static str,
        armed: Arc<AtomicBool>,
        abort: AbortHandle,
    ) -> TaskId {
        self.tasks
            .retain(|_, task| task.armed.load(Ordering::Acquire));

        let id = TaskId(self.next_id);
        self.next_id += 1;
        debug!(task = label, id = id.0, "Timer armed");

        self.tasks.insert(id, ArmedTask { label, armed, abort });
        id
    }
}

impl<G> Drop for Scheduler<G> {
    fn drop(&mut self) {
        for (_, task) in self.tasks.drain() {
            task.armed.store(false, Ordering::Release);
            task.abort.abort();
        }
    }
}

/// Lock the target and run `f` if the task is still armed
fn run_armed<G, R>(
    target: &Weak<Mutex<G>>,
    armed: &AtomicBool,
    f: impl FnOnce(&mut G) -> R,
) -> Option<R> {
    let target = target.upgrade()?;
    let mut guard = target.lock();
    if !armed.load(Ordering::Acquire) {
        return None;
    }
    Some(f(&mut *guard))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter {
        fired: Vec<&'static str>,
        ticks: u32,
        scheduler: Scheduler<Counter>,
    }

    fn counter() -> Arc<Mutex<Counter>> {
        Arc::new_cyclic(|weak| {
            Mutex::new(Counter {
                fired: Vec::new(),
                ticks: 0,
                scheduler: Scheduler::new(weak.clone()),
            })
        })
    }

    async fn sleep_secs(secs: u64) {
        time::sleep(Duration::from_secs(secs)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn one_shot_fires_once_after_delay() {
        let counter = counter();
        counter
            .lock()
            .scheduler
            .schedule_once("once", Duration::from_secs(5), |p| p.fired.push("once"));
        assert_eq!(counter.lock().scheduler.armed_count(), 1);

        sleep_secs(4).await;
        assert!(counter.lock().fired.is_empty());

        sleep_secs(2).await;
        assert_eq!(counter.lock().fired, vec!["once"]);
        assert_eq!(counter.lock().scheduler.armed_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_all_suppresses_every_pending_task() {
        let counter = counter();
        {
            let mut p = counter.lock();
            p.scheduler
                .schedule_once("once", Duration::from_secs(5), |p| p.fired.push("once"));
            p.scheduler.schedule_repeating(
                "repeat",
                Duration::from_secs(1),
                Duration::from_secs(1),
                |p| {
                    p.fired.push("repeat");
                    Repeat::Continue
                },
            );
            p.scheduler.cancel_all();
            p.scheduler.cancel_all();
            assert_eq!(p.scheduler.armed_count(), 0);
        }

        sleep_secs(60).await;
        assert!(counter.lock().fired.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn repeating_task_stops_itself() {
        let counter = counter();
        counter.lock().scheduler.schedule_repeating(
            "repeat",
            Duration::from_secs(1),
            Duration::from_secs(1),
            |p| {
                p.ticks += 1;
                if p.ticks == 3 {
                    Repeat::Stop
                } else {
                    Repeat::Continue
                }
            },
        );

        sleep_secs(30).await;
        let p = counter.lock();
        assert_eq!(p.ticks, 3);
        assert_eq!(p.scheduler.armed_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn repeating_task_honours_initial_delay_and_period() {
        let counter = counter();
        let start = Instant::now();
        let stamps = Arc::new(Mutex::new(Vec::new()));
        let sink = stamps.clone();

        counter.lock().scheduler.schedule_repeating(
            "repeat",
            Duration::from_millis(1000),
            Duration::from_millis(1001),
            move |p| {
                sink.lock().push(start.elapsed().as_millis());
                p.ticks += 1;
                if p.ticks == 3 {
                    Repeat::Stop
                } else {
                    Repeat::Continue
                }
            },
        );

        sleep_secs(10).await;
        assert_eq!(*stamps.lock(), vec![1000, 2001, 3002]);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_all_inside_callback_finishes_current_run() {
        let counter = counter();
        {
            let mut p = counter.lock();
            p.scheduler
                .schedule_once("late", Duration::from_secs(10), |p| p.fired.push("late"));
            p.scheduler.schedule_repeating(
                "repeat",
                Duration::from_secs(1),
                Duration::from_secs(1),
                |p| {
                    p.scheduler.cancel_all();
                    p.fired.push("repeat");
                    Repeat::Continue
                },
            );
        }

        sleep_secs(30).await;
        let p = counter.lock();
        assert_eq!(p.fired, vec!["repeat"]);
        assert_eq!(p.scheduler.armed_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_single_task_leaves_others_armed() {
        let counter = counter();
        let (first, second) = {
            let mut p = counter.lock();
            let first = p
                .scheduler
                .schedule_once("first", Duration::from_secs(5), |p| p.fired.push("first"));
            let second = p
                .scheduler
                .schedule_once("second", Duration::from_secs(5), |p| p.fired.push("second"));
            assert!(p.scheduler.cancel(first));
            assert!(!p.scheduler.cancel(first));
            assert_eq!(p.scheduler.armed_labels(), vec!["second"]);
            (first, second)
        };

        sleep_secs(6).await;
        let p = counter.lock();
        assert_eq!(p.fired, vec!["second"]);
        assert!(!p.scheduler.is_armed(first));
        assert!(!p.scheduler.is_armed(second));
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_target_silences_tasks() {
        let counter = counter();
        let weak = Arc::downgrade(&counter);
        counter
            .lock()
            .scheduler
            .schedule_once("once", Duration::from_secs(1), |p| p.fired.push("once"));
        drop(counter);

        sleep_secs(5).await;
        assert!(weak.upgrade().is_none());
    }
}
