//! tola-reconciler - Reactive node-tree reconciler
//!
//! Renders a description tree (elements, text, and streams of child lists)
//! onto an ordered child surface and keeps it in sync.
//!
//! ## Core Concepts
//!
//! **Static diff**: re-rendering a list compares it index by index with the
//! previous one and touches only what changed.
//!
//! **Dynamic regions**: a child can be a stream of child lists. Each
//! emission re-renders that region alone, at the right physical position
//! among its siblings, no matter how many nodes earlier regions expose.
//!
//! ## Modules
//! - `node`: Element/Text/Child description types and `NodeRef`
//! - `attr`: Props, constant or streamed values, event handlers
//! - `stream`: Push-based streams, `Subject`, `Subscription`
//! - `surface`: The `Surface` trait, an in-memory surface and a DOM surface
//! - `reconcile`: `mount`, `Mount::update`, `Mount::unmount`
//! - `algo`: Child-list diff
//!
//! ## Usage
//!
//! ```ignore
//! use std::rc::Rc;
//! use tola_reconciler::prelude::*;
//!
//! let surface = Rc::new(MemorySurface::new());
//! let container = surface.root("ul");
//! let rows: Subject<Option<ChildList<MemorySurface>>> = Subject::new();
//!
//! let mount = mount(surface.clone(), container, vec![Child::Stream(rows.stream())])?;
//! rows.next(Some(vec![element("li").text("first").into()]));
//! ```

// =============================================================================
// Core modules
// =============================================================================

/// Node types: Element, Text, Child, NodeRef
pub mod node;

/// Prop values and event handlers
pub mod attr;

/// Push-based streams
pub mod stream;

/// Display surfaces
pub mod surface;

/// Mounting and reconciliation
pub mod reconcile;

/// Algorithms: child-list diff
pub mod algo;

/// Error types
pub mod error;

/// Configuration
pub mod config;

/// Prelude for common imports
pub mod prelude;

mod bind;
mod macros;
mod render;

// =============================================================================
// Re-exports
// =============================================================================

// Node types
pub use node::{Child, ChildList, ChildStream, Children, Element, Node, NodeRef, Prop, RawChild, Text};

// Attributes
pub use attr::{Events, Handler, Props, PropsExt, Value};

// Streams
pub use stream::{Observer, Source, Stream, Subject, Subscription};

// Surfaces
pub use surface::{MemoryEvent, MemorySurface, NodeId, Surface, SurfaceOp};
#[cfg(feature = "web")]
pub use surface::WebSurface;

// Reconciler
pub use reconcile::{Mount, mount, mount_with_config};

// Algorithms
pub use algo::{DiffStats, ListDiff, diff_children};

// Configuration
pub use config::ReconcileConfig;

// Error types
pub use error::{ReconcileError, ReconcileResult, StreamError};

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::node::normalize;

    type M = MemorySurface;

    #[test]
    fn test_from_props_tree_mounts() {
        let clicked = Rc::new(std::cell::Cell::new(false));
        let flag = clicked.clone();
        let button = Element::<M>::from_props(
            "button",
            [
                ("type", Prop::from("submit")),
                ("onclick", Prop::handler(move |_| flag.set(true))),
            ],
            ["Send".into()],
        )
        .unwrap();

        let items = normalize::<M>([
            RawChild::Empty,
            "Total: ".into(),
            3_i32.into(),
            button.into(),
            None::<Text<M>>.into(),
        ]);

        let surface = Rc::new(MemorySurface::new());
        let container = surface.root("form");
        let mount = mount(surface.clone(), container, items).unwrap();

        assert_eq!(
            surface.render_children(container),
            r#"Total: 3<button type="submit">Send</button>"#
        );
        let node = mount.nodes()[2];
        surface.dispatch(node, "click");
        assert!(clicked.get());
    }

    #[test]
    fn test_streamed_attribute_through_mount() {
        let theme = Subject::replay("light".to_string());
        let surface = Rc::new(MemorySurface::new());
        let container = surface.root("body");
        let mount = mount(
            surface.clone(),
            container,
            vec![Element::<M>::new("main").attr_stream("data-theme", theme.stream()).into()],
        )
        .unwrap();
        let main = mount.nodes()[0];

        theme.next("dark".to_string());
        assert_eq!(surface.attribute(main, "data-theme").as_deref(), Some("dark"));

        mount.unmount();
        assert_eq!(theme.observer_count(), 0);
    }
}
