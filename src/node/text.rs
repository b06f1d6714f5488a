//! Text node type

use std::fmt;

use crate::surface::Surface;

use super::NodeRef;

// =============================================================================
// Text<S>
// =============================================================================

/// Text content node
pub struct Text<S: Surface> {
    /// Text content
    pub content: String,
    /// Lifecycle handle notified on attach and detach
    pub node_ref: Option<NodeRef<S::Node>>,
}

impl<S: Surface> Text<S> {
    /// Create a new text node
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            node_ref: None,
        }
    }

    /// Attach a lifecycle handle
    pub fn node_ref(mut self, node_ref: NodeRef<S::Node>) -> Self {
        self.node_ref = Some(node_ref);
        self
    }

    /// Check if text content is empty
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

impl<S: Surface> Clone for Text<S> {
    fn clone(&self) -> Self {
        Self {
            content: self.content.clone(),
            node_ref: self.node_ref.clone(),
        }
    }
}

impl<S: Surface> fmt::Debug for Text<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Text")
            .field("content", &self.content)
            .field("node_ref", &self.node_ref.is_some())
            .finish()
    }
}
