//! Single-threaded one-shot completion signals
//!
//! A [`Promise`] settles once with a value. Consumers either register
//! callbacks with [`Promise::then`], which run synchronously inside
//! [`Resolver::resolve`], or `.await` it on a local executor. The awaitable
//! side is a shared `futures` oneshot receiver.

use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

use futures::channel::oneshot;
use futures::future::{self, JoinAll, Shared};
use futures::task::noop_waker_ref;
use futures::FutureExt;

type Callback<T> = Box<dyn FnOnce(T)>;

struct PromiseState<T> {
    value: Option<T>,
    callbacks: Vec<Callback<T>>,
    sender: Option<oneshot::Sender<T>>,
}

/// Read side of a one-shot signal
pub struct Promise<T> {
    state: Rc<RefCell<PromiseState<T>>>,
    settled: Shared<oneshot::Receiver<T>>,
}

/// Write side of a one-shot signal
pub struct Resolver<T> {
    state: Rc<RefCell<PromiseState<T>>>,
    settled: Shared<oneshot::Receiver<T>>,
}

impl<T: Clone> Clone for Promise<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            settled: self.settled.clone(),
        }
    }
}

impl<T: Clone> Clone for Resolver<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            settled: self.settled.clone(),
        }
    }
}

impl<T: Clone + 'static> Promise<T> {
    /// Create an unsettled promise and the resolver that settles it
    pub fn pending() -> (Promise<T>, Resolver<T>) {
        let (sender, receiver) = oneshot::channel();
        let state = Rc::new(RefCell::new(PromiseState {
            value: None,
            callbacks: Vec::new(),
            sender: Some(sender),
        }));
        let settled = receiver.shared();
        (
            Promise {
                state: state.clone(),
                settled: settled.clone(),
            },
            Resolver { state, settled },
        )
    }

    /// An already-settled promise
    pub fn resolved(value: T) -> Self {
        let (promise, resolver) = Self::pending();
        resolver.resolve(value);
        promise
    }

    /// The settled value, if any
    pub fn value(&self) -> Option<T> {
        self.state.borrow().value.clone()
    }

    pub fn is_settled(&self) -> bool {
        self.state.borrow().value.is_some()
    }

    /// Run `callback` once settled (immediately if already settled)
    pub fn then<F>(&self, callback: F)
    where
        F: FnOnce(T) + 'static,
    {
        let settled = self.state.borrow().value.clone();
        match settled {
            Some(value) => callback(value),
            None => self.state.borrow_mut().callbacks.push(Box::new(callback)),
        }
    }

    /// Settle once every promise has settled, with their values in order
    ///
    /// The join is driven from the members' `then` callbacks, so the result
    /// settles in the same call that settles the last member.
    pub fn all(promises: impl IntoIterator<Item = Promise<T>>) -> Promise<Vec<T>> {
        let promises: Vec<Promise<T>> = promises.into_iter().collect();
        let (all, resolver) = Promise::<Vec<T>>::pending();
        if promises.is_empty() {
            resolver.resolve(Vec::new());
            return all;
        }

        let join: Rc<RefCell<Option<Pin<Box<JoinAll<Promise<T>>>>>>> =
            Rc::new(RefCell::new(Some(Box::pin(future::join_all(promises.clone())))));
        for promise in &promises {
            let join = join.clone();
            let resolver = resolver.clone();
            promise.then(move |_| {
                let ready = {
                    let mut slot = join.borrow_mut();
                    let mut cx = Context::from_waker(noop_waker_ref());
                    match slot.as_mut().map(|join| join.as_mut().poll(&mut cx)) {
                        Some(Poll::Ready(values)) => {
                            *slot = None;
                            Some(values)
                        }
                        _ => None,
                    }
                };
                if let Some(values) = ready {
                    resolver.resolve(values);
                }
            });
        }
        all
    }
}

impl<T: Clone + 'static> Resolver<T> {
    /// Settle the promise; returns false if it was already settled
    pub fn resolve(&self, value: T) -> bool {
        let (callbacks, sender) = {
            let mut state = self.state.borrow_mut();
            if state.value.is_some() {
                return false;
            }
            state.value = Some(value.clone());
            (std::mem::take(&mut state.callbacks), state.sender.take())
        };
        // Awaiters see the value before callbacks run, so a join polled from
        // a callback observes this member as settled
        if let Some(sender) = sender {
            let _ = sender.send(value.clone());
        }
        for callback in callbacks {
            callback(value.clone());
        }
        true
    }

    pub fn is_settled(&self) -> bool {
        self.state.borrow().value.is_some()
    }

    /// The promise this resolver settles
    pub fn promise(&self) -> Promise<T> {
        Promise {
            state: self.state.clone(),
            settled: self.settled.clone(),
        }
    }
}

impl<T: Clone + 'static> Future for Promise<T> {
    type Output = T;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<T> {
        // A shared handle must not be polled again once it has completed
        if let Some(value) = self.value() {
            return Poll::Ready(value);
        }
        match self.settled.poll_unpin(cx) {
            Poll::Ready(Ok(value)) => Poll::Ready(value),
            // The sender lives in the shared state, so it only drops with
            // every promise handle
            Poll::Ready(Err(oneshot::Canceled)) | Poll::Pending => Poll::Pending,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Promise<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Promise")
            .field("value", &self.state.borrow().value)
            .finish()
    }
}
