//! Cooperative task scheduler.
//!
//! Two FIFO queues mirror an event loop:
//!
//! - **microtasks**: coalesced re-renders requested by owned computeds
//! - **timers**: zero-delay tasks (deferred child re-renders, nested mounts,
//!   root `on_init`)
//!
//! [`run_until_idle`](Scheduler::run_until_idle) drains every microtask, runs
//! one timer task, and repeats until both queues are empty. Tasks may queue
//! more tasks; nothing runs while a task is being queued.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;

pub type Task = Box<dyn FnOnce()>;

pub struct Scheduler {
    microtasks: RefCell<VecDeque<Task>>,
    timers: RefCell<VecDeque<Task>>,
    max_tasks_per_flush: usize,
    flushing: Cell<bool>,
}

impl Scheduler {
    pub fn new(max_tasks_per_flush: usize) -> Self {
        Self {
            microtasks: RefCell::new(VecDeque::new()),
            timers: RefCell::new(VecDeque::new()),
            max_tasks_per_flush,
            flushing: Cell::new(false),
        }
    }

    pub fn queue_microtask(&self, task: impl FnOnce() + 'static) {
        self.microtasks.borrow_mut().push_back(Box::new(task));
    }

    pub fn set_timeout(&self, task: impl FnOnce() + 'static) {
        self.timers.borrow_mut().push_back(Box::new(task));
    }

    /// Queued (microtasks, timers).
    pub fn pending(&self) -> (usize, usize) {
        (self.microtasks.borrow().len(), self.timers.borrow().len())
    }

    pub fn is_idle(&self) -> bool {
        self.pending() == (0, 0)
    }

    fn pop_microtask(&self) -> Option<Task> {
        self.microtasks.borrow_mut().pop_front()
    }

    fn pop_timer(&self) -> Option<Task> {
        self.timers.borrow_mut().pop_front()
    }

    /// Run only the queued microtasks (and any they queue).
    pub fn run_microtasks(&self) -> usize {
        let mut ran = 0;
        while let Some(task) = self.pop_microtask() {
            task();
            ran += 1;
        }
        ran
    }

    /// Run tasks until both queues are empty. Returns the number run.
    ///
    /// A nested call from inside a task returns 0; the outer flush picks up
    /// whatever the task queued.
    pub fn run_until_idle(&self) -> usize {
        if self.flushing.replace(true) {
            return 0;
        }
        let _flushing = FlushGuard(&self.flushing);

        let mut ran = 0;
        loop {
            if ran >= self.max_tasks_per_flush {
                let (micro, timers) = self.pending();
                tracing::warn!(ran, micro, timers, "scheduler: task limit reached, leaving tasks queued");
                break;
            }
            let Some(task) = self.pop_microtask().or_else(|| self.pop_timer()) else { break };
            task();
            ran += 1;
        }
        ran
    }
}

/// Clears the `flushing` flag when dropped, so a task that panics does
/// not leave the scheduler refusing every later flush.
struct FlushGuard<'a>(&'a Cell<bool>);

impl Drop for FlushGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (micro, timers) = self.pending();
        f.debug_struct("Scheduler")
            .field("microtasks", &micro)
            .field("timers", &timers)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn test_microtasks_run_before_next_timer() {
        let scheduler = Rc::new(Scheduler::new(100));
        let log = Rc::new(RefCell::new(Vec::new()));

        let (s, l) = (scheduler.clone(), log.clone());
        scheduler.set_timeout(move || {
            l.borrow_mut().push("timer 1");
            let l2 = l.clone();
            s.queue_microtask(move || l2.borrow_mut().push("micro from timer 1"));
        });
        let l = log.clone();
        scheduler.set_timeout(move || l.borrow_mut().push("timer 2"));
        let l = log.clone();
        scheduler.queue_microtask(move || l.borrow_mut().push("micro"));

        assert_eq!(scheduler.run_until_idle(), 4);
        assert_eq!(*log.borrow(), vec!["micro", "timer 1", "micro from timer 1", "timer 2"]);
        assert!(scheduler.is_idle());
    }

    #[test]
    fn test_task_limit() {
        fn requeue(scheduler: Rc<Scheduler>) {
            let next = scheduler.clone();
            scheduler.set_timeout(move || requeue(next));
        }

        let scheduler = Rc::new(Scheduler::new(5));
        requeue(scheduler.clone());
        assert_eq!(scheduler.run_until_idle(), 5);
        assert_eq!(scheduler.pending(), (0, 1));
    }

    #[test]
    fn test_task_limit_applies_to_microtasks() {
        fn requeue(scheduler: Rc<Scheduler>) {
            let next = scheduler.clone();
            scheduler.queue_microtask(move || requeue(next));
        }

        let scheduler = Rc::new(Scheduler::new(5));
        requeue(scheduler.clone());
        let ran = Rc::new(Cell::new(false));
        let seen = ran.clone();
        scheduler.set_timeout(move || seen.set(true));

        assert_eq!(scheduler.run_until_idle(), 5);
        assert_eq!(scheduler.pending(), (1, 1));
        assert!(!ran.get());
    }

    #[test]
    fn test_flush_recovers_after_panicking_task() {
        let scheduler = Scheduler::new(100);
        scheduler.queue_microtask(|| panic!("task failed"));
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| scheduler.run_until_idle()));
        assert!(outcome.is_err());

        let ran = Rc::new(Cell::new(0));
        let seen = ran.clone();
        scheduler.set_timeout(move || seen.set(seen.get() + 1));
        assert_eq!(scheduler.run_until_idle(), 1);
        assert_eq!(ran.get(), 1);
    }
}
