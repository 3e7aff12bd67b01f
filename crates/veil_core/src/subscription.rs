//! Cancellable subscription handles

use std::fmt;

/// Handle returned by `observe`, `on` and similar registration calls
///
/// Dropping the handle does not unsubscribe; call [`Subscription::cancel`].
/// Cancelling twice is a no-op.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new<F>(cancel: F) -> Self
    where
        F: FnOnce() + 'static,
    {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A handle with nothing to cancel (registration on a destroyed instance)
    pub fn noop() -> Self {
        Self { cancel: None }
    }

    /// Combine several handles into one that cancels all of them
    pub fn merge(subscriptions: impl IntoIterator<Item = Subscription>) -> Self {
        let mut subscriptions: Vec<Subscription> = subscriptions.into_iter().collect();
        Self::new(move || {
            for sub in &mut subscriptions {
                sub.cancel();
            }
        })
    }

    pub fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }

    pub fn is_active(&self) -> bool {
        self.cancel.is_some()
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_cancel_once() {
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        let mut sub = Subscription::new(move || c.set(c.get() + 1));
        sub.cancel();
        sub.cancel();
        assert_eq!(count.get(), 1);
        assert!(!sub.is_active());
    }

    #[test]
    fn test_merge_cancels_all() {
        let count = Rc::new(Cell::new(0));
        let subs = (0..3).map(|_| {
            let c = count.clone();
            Subscription::new(move || c.set(c.get() + 1))
        });
        let mut merged = Subscription::merge(subs);
        merged.cancel();
        assert_eq!(count.get(), 3);
    }
}
