//! Lifecycle handles.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::stream::{Stream, Subject};

/// Handle that publishes `(physical node, is_mounted)` each time a node
/// carrying it is attached to or detached from its parent.
///
/// Created by the caller and cloned into node descriptions; identity is
/// reference identity. Late subscribers receive the most recent event.
pub struct NodeRef<H> {
    inner: Rc<Inner<H>>,
}

struct Inner<H> {
    events: Subject<(H, bool)>,
    current: RefCell<Option<H>>,
}

impl<H: Clone + 'static> NodeRef<H> {
    /// Create a handle that has not seen a node yet.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(Inner {
                events: Subject::replay_empty(),
                current: RefCell::new(None),
            }),
        }
    }

    /// Stream of `(node, is_mounted)` events.
    pub fn stream(&self) -> Stream<(H, bool)> {
        self.inner.events.stream()
    }

    /// The currently mounted node, if any.
    ///
    /// Becomes `None` as soon as the node or any ancestor the reconciler
    /// manages is removed. Dropping a [`Mount`](crate::Mount) without
    /// unmounting leaves it as it is.
    pub fn current(&self) -> Option<H> {
        self.inner.current.borrow().clone()
    }

    pub(crate) fn notify(&self, node: H, mounted: bool) {
        *self.inner.current.borrow_mut() = mounted.then(|| node.clone());
        self.inner.events.next((node, mounted));
    }
}

impl<H> NodeRef<H> {
    /// Whether both handles are the same handle.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<H: Clone + 'static> Default for NodeRef<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> Clone for NodeRef<H> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<H> PartialEq for NodeRef<H> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl<H: fmt::Debug> fmt::Debug for NodeRef<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("current", &self.inner.current.borrow())
            .finish()
    }
}
