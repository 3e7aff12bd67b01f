//! Modal stacking
//!
//! Open modals form a stack. Only the top one is in the foreground (its
//! focus trap listening); opening another backgrounds everything below it,
//! and closing the top one brings the next one back once the event that
//! closed it has finished dispatching, so a dismissing Escape press does
//! not also reach the modal underneath.

use slotmap::{new_key_type, SlotMap};
use std::cell::RefCell;
use std::rc::Rc;
use veil_core::DeferredQueue;

new_key_type! {
    /// Handle to a stacked modal
    pub struct StackKey;
}

/// Something that can be moved between foreground and background
pub trait Stackable {
    /// Another modal opened above this one
    fn background(&self);

    /// This modal became the top of the stack
    fn foreground(&self);
}

struct StackInner {
    entries: SlotMap<StackKey, Rc<dyn Stackable>>,
    /// Bottom to top
    order: Vec<StackKey>,
}

/// Shared stack of open modals
#[derive(Clone)]
pub struct ModalStack {
    inner: Rc<RefCell<StackInner>>,
    tasks: DeferredQueue,
}

impl ModalStack {
    pub fn new(tasks: DeferredQueue) -> Self {
        Self {
            inner: Rc::new(RefCell::new(StackInner {
                entries: SlotMap::with_key(),
                order: Vec::new(),
            })),
            tasks,
        }
    }

    /// Background every stacked entry, foreground `entry` and push it
    pub fn opening(&self, entry: Rc<dyn Stackable>) -> StackKey {
        let below: Vec<Rc<dyn Stackable>> = {
            let inner = self.inner.borrow();
            inner
                .order
                .iter()
                .filter_map(|key| inner.entries.get(*key).cloned())
                .collect()
        };
        for other in &below {
            other.background();
        }
        entry.foreground();

        let mut inner = self.inner.borrow_mut();
        let key = inner.entries.insert(entry);
        inner.order.push(key);
        tracing::debug!("modal stack push -> depth {}", inner.order.len());
        key
    }

    /// Remove an entry; when it was the top, the new top is foregrounded
    /// from the deferred queue
    pub fn closing(&self, key: StackKey) {
        let next = {
            let mut inner = self.inner.borrow_mut();
            if inner.entries.remove(key).is_none() {
                return;
            }
            let was_top = inner.order.last() == Some(&key);
            inner.order.retain(|k| *k != key);
            tracing::debug!("modal stack pop -> depth {}", inner.order.len());
            if was_top {
                inner.order.last().copied()
            } else {
                None
            }
        };

        let Some(next) = next else {
            return;
        };
        let stack = Rc::downgrade(&self.inner);
        self.tasks.defer(move || {
            let Some(stack) = stack.upgrade() else {
                return;
            };
            // Something else may have opened or closed in the meantime
            let entry = {
                let inner = stack.borrow();
                if inner.order.last() != Some(&next) {
                    return;
                }
                inner.entries.get(next).cloned()
            };
            if let Some(entry) = entry {
                entry.foreground();
            }
        });
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().order.is_empty()
    }

    pub fn contains(&self, key: StackKey) -> bool {
        self.inner.borrow().entries.contains_key(key)
    }

    /// Key of the top entry
    pub fn top(&self) -> Option<StackKey> {
        self.inner.borrow().order.last().copied()
    }

    /// Whether `key` is the top entry
    pub fn is_top(&self, key: StackKey) -> bool {
        self.top() == Some(key)
    }
}

impl std::fmt::Debug for ModalStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModalStack")
            .field("order", &self.inner.borrow().order)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Probe {
        name: &'static str,
        log: Rc<RefCell<Vec<String>>>,
    }

    impl Stackable for Probe {
        fn background(&self) {
            self.log.borrow_mut().push(format!("{} bg", self.name));
        }

        fn foreground(&self) {
            self.log.borrow_mut().push(format!("{} fg", self.name));
        }
    }

    fn probe(name: &'static str, log: &Rc<RefCell<Vec<String>>>) -> Rc<dyn Stackable> {
        Rc::new(Probe {
            name,
            log: log.clone(),
        })
    }

    #[test]
    fn test_opening_backgrounds_others() {
        let tasks = DeferredQueue::new();
        let stack = ModalStack::new(tasks);
        let log = Rc::new(RefCell::new(Vec::new()));

        let a = stack.opening(probe("a", &log));
        let b = stack.opening(probe("b", &log));
        assert_eq!(*log.borrow(), vec!["a fg", "a bg", "b fg"]);
        assert_eq!(stack.len(), 2);
        assert!(stack.is_top(b));
        assert!(stack.contains(a));
    }

    #[test]
    fn test_closing_top_defers_foreground() {
        let tasks = DeferredQueue::new();
        let stack = ModalStack::new(tasks.clone());
        let log = Rc::new(RefCell::new(Vec::new()));

        let a = stack.opening(probe("a", &log));
        let b = stack.opening(probe("b", &log));
        log.borrow_mut().clear();

        stack.closing(b);
        assert!(log.borrow().is_empty());
        assert!(stack.is_top(a));
        tasks.run_pending();
        assert_eq!(*log.borrow(), vec!["a fg"]);

        stack.closing(b);
        stack.closing(a);
        assert!(stack.is_empty());
        assert_eq!(tasks.run_pending(), 0);
    }

    #[test]
    fn test_closing_below_top_leaves_top_alone() {
        let tasks = DeferredQueue::new();
        let stack = ModalStack::new(tasks.clone());
        let log = Rc::new(RefCell::new(Vec::new()));

        let a = stack.opening(probe("a", &log));
        let b = stack.opening(probe("b", &log));
        log.borrow_mut().clear();

        stack.closing(a);
        assert_eq!(tasks.run_pending(), 0);
        assert!(log.borrow().is_empty());
        assert!(stack.is_top(b));
    }

    #[test]
    fn test_stale_foreground_skipped() {
        let tasks = DeferredQueue::new();
        let stack = ModalStack::new(tasks.clone());
        let log = Rc::new(RefCell::new(Vec::new()));

        stack.opening(probe("a", &log));
        let b = stack.opening(probe("b", &log));
        stack.closing(b);
        stack.opening(probe("c", &log));
        log.borrow_mut().clear();

        tasks.run_pending();
        assert!(log.borrow().is_empty());
    }
}
