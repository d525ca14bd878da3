//! EventSubject: multicast publish/subscribe with an error channel.
//!
//! Dispatch is synchronous: `next` returns after every success callback has
//! run, in subscription order. There is no buffering or replay, so a value
//! emitted before a callback subscribes is never seen by that callback.
//!
//! ```ignore
//! let saved = EventSubject::<String>::new();
//! let id = saved.subscribe(|name| println!("saved {name}"));
//! saved.next(&"notes.txt".to_string());
//! saved.unsubscribe(id);
//! ```

use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use crate::error::Error;

/// Opaque subscription handle. Ids start at 0 and increase per subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(usize);

type Callback<V> = Rc<dyn Fn(&V)>;

struct SubjectState<T, E> {
    next_id: usize,
    on_next: Vec<(SubscriptionId, Callback<T>)>,
    on_error: Vec<(SubscriptionId, Callback<E>)>,
}

/// Multicast channel of `T` values with a separate `E` error channel.
///
/// Cloning yields another handle to the same subject.
pub struct EventSubject<T: 'static, E: 'static = Error> {
    state: Rc<RefCell<SubjectState<T, E>>>,
}

impl<T: 'static, E: 'static> Clone for EventSubject<T, E> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
        }
    }
}

impl<T: 'static, E: 'static> fmt::Debug for EventSubject<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("EventSubject")
            .field("subscribers", &state.on_next.len())
            .field("error_subscribers", &state.on_error.len())
            .field("next_id", &state.next_id)
            .finish()
    }
}

impl<T: 'static, E: 'static> Default for EventSubject<T, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static, E: 'static> EventSubject<T, E> {
    /// Create a subject with no subscribers.
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(SubjectState {
                next_id: 0,
                on_next: Vec::new(),
                on_error: Vec::new(),
            })),
        }
    }

    /// Register a success callback.
    pub fn subscribe(&self, on_next: impl Fn(&T) + 'static) -> SubscriptionId {
        let mut state = self.state.borrow_mut();
        let id = SubscriptionId(state.next_id);
        state.next_id += 1;
        state.on_next.push((id, Rc::new(on_next)));
        id
    }

    /// Register a success callback and an error callback under one id.
    pub fn subscribe_with_error(
        &self,
        on_next: impl Fn(&T) + 'static,
        on_error: impl Fn(&E) + 'static,
    ) -> SubscriptionId {
        let id = self.subscribe(on_next);
        self.state.borrow_mut().on_error.push((id, Rc::new(on_error)));
        id
    }

    /// Remove both callbacks registered under `id`. Unknown ids are ignored.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        let mut state = self.state.borrow_mut();
        state.on_next.retain(|(sub, _)| *sub != id);
        state.on_error.retain(|(sub, _)| *sub != id);
    }

    /// Invoke every success callback with `value`, in subscription order.
    ///
    /// Callbacks registered or removed during dispatch take effect from the
    /// next emission.
    pub fn next(&self, value: &T) {
        let callbacks: Vec<Callback<T>> = self
            .state
            .borrow()
            .on_next
            .iter()
            .map(|(_, cb)| Rc::clone(cb))
            .collect();
        for callback in callbacks {
            callback(value);
        }
    }

    /// Invoke every error callback with `error`, in subscription order.
    pub fn error(&self, error: &E) {
        let callbacks: Vec<Callback<E>> = self
            .state
            .borrow()
            .on_error
            .iter()
            .map(|(_, cb)| Rc::clone(cb))
            .collect();
        for callback in callbacks {
            callback(error);
        }
    }

    /// Number of registered success callbacks.
    pub fn subscriber_count(&self) -> usize {
        self.state.borrow().on_next.len()
    }

    /// Whether two handles point at the same subject.
    pub fn same_subject(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }
}

impl<T: Clone + 'static, E: Clone + 'static> EventSubject<T, E> {
    /// A future that settles on the first `next` (Ok) or `error` (Err).
    ///
    /// The subscription backing the future stays registered after it settles;
    /// later emissions are ignored. If the subject is dropped without ever
    /// emitting, the future never completes.
    pub fn to_future(&self) -> SubjectFuture<T, E> {
        let (tx, rx) = oneshot::channel();
        let tx = Rc::new(RefCell::new(Some(tx)));
        let tx_err = Rc::clone(&tx);
        self.subscribe_with_error(
            move |value: &T| {
                if let Some(tx) = tx.borrow_mut().take() {
                    let _ = tx.send(Ok(value.clone()));
                }
            },
            move |error: &E| {
                if let Some(tx) = tx_err.borrow_mut().take() {
                    let _ = tx.send(Err(error.clone()));
                }
            },
        );
        SubjectFuture { rx }
    }
}

/// Future returned by [`EventSubject::to_future`].
#[derive(Debug)]
pub struct SubjectFuture<T, E> {
    rx: oneshot::Receiver<Result<T, E>>,
}

impl<T, E> Future for SubjectFuture<T, E> {
    type Output = Result<T, E>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(settled)) => Poll::Ready(settled),
            // Sender dropped with the subject: stays pending forever.
            Poll::Ready(Err(_)) | Poll::Pending => Poll::Pending,
        }
    }
}
