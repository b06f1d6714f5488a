//! Cancellation handles.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// Cancellation control returned by `Stream::subscribe`.
///
/// Clones share one cancellation: `cancel()` runs the teardown once, no
/// matter how many clones call it.
#[derive(Clone)]
pub struct Subscription {
    inner: Rc<Inner>,
}

struct Inner {
    closed: Cell<bool>,
    teardown: RefCell<Option<Box<dyn FnOnce()>>>,
}

impl Subscription {
    /// Create a subscription that runs `teardown` on first cancel.
    pub fn new(teardown: impl FnOnce() + 'static) -> Self {
        Self {
            inner: Rc::new(Inner {
                closed: Cell::new(false),
                teardown: RefCell::new(Some(Box::new(teardown))),
            }),
        }
    }

    /// A subscription with nothing left to release.
    pub fn closed() -> Self {
        Self {
            inner: Rc::new(Inner {
                closed: Cell::new(true),
                teardown: RefCell::new(None),
            }),
        }
    }

    /// Combine several subscriptions into one.
    pub fn all(subscriptions: Vec<Subscription>) -> Self {
        Self::new(move || {
            for subscription in subscriptions {
                subscription.cancel();
            }
        })
    }

    /// Stop further emissions and release upstream resources.
    ///
    /// Synchronous and idempotent.
    pub fn cancel(&self) {
        if self.inner.closed.replace(true) {
            return;
        }
        let teardown = self.inner.teardown.borrow_mut().take();
        if let Some(teardown) = teardown {
            teardown();
        }
    }

    /// Whether `cancel()` has run (or nothing was ever open).
    pub fn is_closed(&self) -> bool {
        self.inner.closed.get()
    }
}

impl Default for Subscription {
    fn default() -> Self {
        Self::closed()
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("closed", &self.is_closed())
            .finish()
    }
}
