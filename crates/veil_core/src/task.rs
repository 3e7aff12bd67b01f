//! Post-dispatch task queue
//!
//! Work that must run after the current event finishes dispatching (focus
//! restoration, foregrounding the next stacked modal) is pushed here instead
//! of running inline. The host drains the queue once the event cycle is over.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

type Task = Box<dyn FnOnce()>;

/// Shared FIFO of deferred callbacks
#[derive(Clone, Default)]
pub struct DeferredQueue {
    tasks: Rc<RefCell<VecDeque<Task>>>,
}

impl DeferredQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a task for the next drain
    pub fn defer<F>(&self, task: F)
    where
        F: FnOnce() + 'static,
    {
        self.tasks.borrow_mut().push_back(Box::new(task));
    }

    /// Run the tasks queued so far and return how many ran
    ///
    /// Tasks queued while draining wait for the next call, matching a
    /// zero-delay timer scheduled from inside a timer callback.
    pub fn run_pending(&self) -> usize {
        let batch: Vec<Task> = self.tasks.borrow_mut().drain(..).collect();
        let count = batch.len();
        for task in batch {
            task();
        }
        if count > 0 {
            tracing::trace!("deferred queue ran {} task(s)", count);
        }
        count
    }

    /// Drain repeatedly until the queue is empty or `max_rounds` is reached
    pub fn run_until_idle(&self, max_rounds: usize) -> usize {
        let mut total = 0;
        for _ in 0..max_rounds {
            let ran = self.run_pending();
            if ran == 0 {
                return total;
            }
            total += ran;
        }
        if !self.is_empty() {
            tracing::warn!(
                "deferred queue still has {} task(s) after {} rounds",
                self.len(),
                max_rounds
            );
        }
        total
    }

    pub fn len(&self) -> usize {
        self.tasks.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.borrow().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_run_pending_fifo() {
        let queue = DeferredQueue::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        for i in 0..3 {
            let log = log.clone();
            queue.defer(move || log.borrow_mut().push(i));
        }
        assert_eq!(queue.run_pending(), 3);
        assert_eq!(*log.borrow(), vec![0, 1, 2]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_nested_defer_waits_for_next_drain() {
        let queue = DeferredQueue::new();
        let ran = Rc::new(Cell::new(false));
        let q = queue.clone();
        let r = ran.clone();
        queue.defer(move || q.defer(move || r.set(true)));

        assert_eq!(queue.run_pending(), 1);
        assert!(!ran.get());
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.run_until_idle(8), 1);
        assert!(ran.get());
    }
}
