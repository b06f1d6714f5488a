//! Physical display surfaces.
//!
//! A surface owns the real node tree (the browser DOM, or the in-memory
//! arena used by tests). The reconciler only ever talks to it through the
//! ordered child-list primitives of [`Surface`].
//!
//! All operations are infallible by contract: implementations that wrap a
//! fallible backend log and swallow failures.

pub(crate) mod memory;
#[cfg(feature = "web")]
mod web;

pub use memory::{ListenerId, MemoryEvent, MemorySurface, NodeId, SurfaceOp};
#[cfg(feature = "web")]
pub use web::WebSurface;

use std::fmt::Debug;

use crate::attr::Handler;

/// Ordered child-list primitives of a display surface.
pub trait Surface: 'static {
    /// Handle to a physical node. Cloning must not copy the node.
    type Node: Clone + PartialEq + Debug + 'static;
    /// Event payload passed to handlers.
    type Event: 'static;
    /// Token returned by `add_listener`, needed to detach it again.
    type Listener: 'static;

    /// Create a detached text node.
    fn create_text(&self, content: &str) -> Self::Node;

    /// Create a detached element.
    fn create_element(&self, tag: &str) -> Self::Node;

    /// Insert `child` into `parent` before `reference`, or append when
    /// `reference` is `None`.
    fn insert_before(&self, parent: &Self::Node, child: &Self::Node, reference: Option<&Self::Node>);

    /// Remove `child` from `parent`.
    fn remove_child(&self, parent: &Self::Node, child: &Self::Node);

    /// The child of `parent` at `index`, if any.
    fn child_at(&self, parent: &Self::Node, index: usize) -> Option<Self::Node>;

    /// Replace the payload of a text node.
    fn set_text(&self, node: &Self::Node, content: &str);

    /// Set a string attribute.
    fn set_attribute(&self, node: &Self::Node, name: &str, value: &str);

    /// Remove an attribute.
    fn remove_attribute(&self, node: &Self::Node, name: &str);

    /// Set an inline style property.
    fn set_style(&self, node: &Self::Node, name: &str, value: &str);

    /// Clear an inline style property.
    fn remove_style(&self, node: &Self::Node, name: &str);

    /// Replace the element's content with raw markup.
    fn set_inner_html(&self, node: &Self::Node, html: &str);

    /// Attach an event listener.
    fn add_listener(&self, node: &Self::Node, event: &str, handler: Handler<Self::Event>) -> Self::Listener;

    /// Detach a listener returned by `add_listener`.
    fn remove_listener(&self, node: &Self::Node, event: &str, listener: Self::Listener);
}
