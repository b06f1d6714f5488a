//! Push-based observable streams.
//!
//! The reconciler consumes streams through a small contract:
//!
//! - `Observer::open` once when the subscription is ready
//! - `Observer::next` zero or more times
//! - `Observer::fail` or `Observer::done` at most once, terminally
//! - `Subscription::cancel` stops further emissions, synchronously and
//!   idempotently
//!
//! Everything is single-threaded (`Rc`-based). Sources may emit from inside
//! `subscribe` (replaying subjects, `Stream::of`), so subscribers must be
//! ready to receive values before `subscribe` returns.
//!
//! # Example
//!
//! ```ignore
//! let count = Subject::replay(0);
//! let label = count.stream().map(|n| format!("{n} items")).distinct();
//! let subscription = label.subscribe_next(|text| println!("{text}"));
//! count.next(1);
//! subscription.cancel();
//! ```

mod ops;
mod subject;
mod subscription;

pub use subject::Subject;
pub use subscription::Subscription;

use std::fmt;
use std::rc::Rc;

use crate::error::StreamError;

/// Receiver side of the stream contract.
pub trait Observer<T> {
    /// The subscription is ready; no items yet.
    fn open(&mut self) {}

    /// A value was emitted.
    fn next(&mut self, value: T);

    /// The stream failed. Terminal.
    fn fail(&mut self, error: StreamError) {
        let _ = error;
    }

    /// The stream completed. Terminal.
    fn done(&mut self) {}
}

/// Producer side of the stream contract.
pub trait Source<T> {
    /// Attach an observer, returning its cancellation control.
    fn subscribe(&self, observer: Box<dyn Observer<T>>) -> Subscription;
}

/// Shared handle to a source.
///
/// Cloning is cheap and preserves identity (see [`Stream::ptr_eq`]).
pub struct Stream<T> {
    source: Rc<dyn Source<T>>,
}

impl<T: 'static> Stream<T> {
    /// Wrap a source.
    pub fn from_source(source: impl Source<T> + 'static) -> Self {
        Self {
            source: Rc::new(source),
        }
    }

    /// Subscribe an observer.
    pub fn subscribe(&self, observer: impl Observer<T> + 'static) -> Subscription {
        self.source.subscribe(Box::new(observer))
    }

    /// Subscribe a closure to `next` only.
    pub fn subscribe_next(&self, next: impl FnMut(T) + 'static) -> Subscription {
        self.subscribe(NextObserver(next))
    }

    /// Whether both handles share the same source.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.source, &other.source)
    }
}

impl<T> Clone for Stream<T> {
    fn clone(&self) -> Self {
        Self {
            source: Rc::clone(&self.source),
        }
    }
}

impl<T> fmt::Debug for Stream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Stream")
            .field(&Rc::as_ptr(&self.source).cast::<()>())
            .finish()
    }
}

/// Observer that only cares about values.
struct NextObserver<F>(F);

impl<T, F: FnMut(T)> Observer<T> for NextObserver<F> {
    fn next(&mut self, value: T) {
        (self.0)(value)
    }
}

/// One step of the contract, buffered for later delivery.
#[derive(Debug, Clone)]
pub(crate) enum Signal<T> {
    Next(T),
    Fail(StreamError),
    Done,
}

impl<T> Signal<T> {
    pub(crate) fn deliver(self, observer: &mut dyn Observer<T>) {
        match self {
            Self::Next(value) => observer.next(value),
            Self::Fail(error) => observer.fail(error),
            Self::Done => observer.done(),
        }
    }
}
