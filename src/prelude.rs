//! Prelude module for common imports.
//!
//! ```ignore
//! use tola_reconciler::prelude::*;
//! ```

// Node types
pub use crate::node::{
    Child, ChildList, ChildStream, Element, Node, NodeRef, Prop, RawChild, Text, element, node_ref,
    normalize, text,
};

// Attributes
pub use crate::attr::{Handler, Props, PropsExt, Value};

// Streams
pub use crate::stream::{Observer, Stream, Subject, Subscription};

// Surfaces
pub use crate::surface::{MemoryEvent, MemorySurface, NodeId, Surface, SurfaceOp};
#[cfg(feature = "web")]
pub use crate::surface::WebSurface;

// Reconciler
pub use crate::reconcile::{Mount, mount, mount_with_config};

// Configuration
pub use crate::config::ReconcileConfig;

// Error
pub use crate::error::{ReconcileError, ReconcileResult, StreamError};
