//! Node model.
//!
//! This module provides `Node`, `Element`, `Text`, `Child` and `NodeRef`,
//! the in-memory description of a tree the reconciler renders.
//!
//! # Key Features
//!
//! - Closed tagged variants: dispatch is always a `match` on `Node`/`Child`
//! - Children may be concrete nodes or streams of child lists
//! - Generic over the target [`Surface`] so event payloads and node handles
//!   are typed

mod element;
mod node_ref;
mod text;

pub use element::{Element, Prop};
pub use node_ref::NodeRef;
pub use text::Text;

use std::fmt;

use smallvec::SmallVec;

use crate::macros::impl_enum_accessors;
use crate::stream::Stream;
use crate::surface::Surface;

/// Node in a tree - either Element or Text.
pub enum Node<S: Surface> {
    Element(Box<Element<S>>),
    Text(Text<S>),
}

impl<S: Surface> Node<S> {
    impl_enum_accessors!(element => Element<S>, text => Text<S>);

    /// Lifecycle handle carried by this node, if any.
    pub fn node_ref(&self) -> Option<&NodeRef<S::Node>> {
        match self {
            Node::Element(elem) => elem.node_ref.as_ref(),
            Node::Text(text) => text.node_ref.as_ref(),
        }
    }

    /// Tag name for elements, `None` for text.
    pub fn tag(&self) -> Option<&str> {
        self.as_element().map(|elem| elem.tag.as_str())
    }
}

impl<S: Surface> Clone for Node<S> {
    fn clone(&self) -> Self {
        match self {
            Node::Element(elem) => Node::Element(elem.clone()),
            Node::Text(text) => Node::Text(text.clone()),
        }
    }
}

impl<S: Surface> fmt::Debug for Node<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Element(elem) => fmt::Debug::fmt(elem, f),
            Node::Text(text) => fmt::Debug::fmt(text, f),
        }
    }
}

impl<S: Surface> From<Element<S>> for Node<S> {
    fn from(elem: Element<S>) -> Self {
        Node::Element(Box::new(elem))
    }
}

impl<S: Surface> From<Text<S>> for Node<S> {
    fn from(text: Text<S>) -> Self {
        Node::Text(text)
    }
}

// =============================================================================
// Child
// =============================================================================

/// Stream feeding a dynamic region. `None` renders nothing.
pub type ChildStream<S> = Stream<Option<ChildList<S>>>;

/// A flat list of child items, as emitted by a [`ChildStream`].
pub type ChildList<S> = Vec<Child<S>>;

/// Type alias for an element's children collection.
pub type Children<S> = SmallVec<[Child<S>; 8]>;

/// One item of a child list.
pub enum Child<S: Surface> {
    /// A concrete node
    Node(Node<S>),
    /// A dynamic region driven by a stream of child lists
    Stream(ChildStream<S>),
}

impl<S: Surface> Child<S> {
    impl_enum_accessors!(node => Node<S>, stream => ChildStream<S>);

    /// Get as element, if this is an element node.
    pub fn as_element(&self) -> Option<&Element<S>> {
        self.as_node().and_then(Node::as_element)
    }

    /// Get as text, if this is a text node.
    pub fn as_text(&self) -> Option<&Text<S>> {
        self.as_node().and_then(Node::as_text)
    }
}

impl<S: Surface> Clone for Child<S> {
    fn clone(&self) -> Self {
        match self {
            Child::Node(node) => Child::Node(node.clone()),
            Child::Stream(stream) => Child::Stream(stream.clone()),
        }
    }
}

impl<S: Surface> fmt::Debug for Child<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Child::Node(node) => fmt::Debug::fmt(node, f),
            Child::Stream(stream) => fmt::Debug::fmt(stream, f),
        }
    }
}

impl<S: Surface> From<Node<S>> for Child<S> {
    fn from(node: Node<S>) -> Self {
        Child::Node(node)
    }
}

impl<S: Surface> From<Element<S>> for Child<S> {
    fn from(elem: Element<S>) -> Self {
        Child::Node(elem.into())
    }
}

impl<S: Surface> From<Text<S>> for Child<S> {
    fn from(text: Text<S>) -> Self {
        Child::Node(Node::Text(text))
    }
}

impl<S: Surface> From<ChildStream<S>> for Child<S> {
    fn from(stream: ChildStream<S>) -> Self {
        Child::Stream(stream)
    }
}

// =============================================================================
// Raw children
// =============================================================================

/// Loosely typed child argument, normalized by [`normalize`].
pub enum RawChild<S: Surface> {
    /// Dropped
    Empty,
    /// Becomes a text node
    Text(String),
    /// Becomes a text node with the number's display form
    Number(f64),
    /// Passed through
    Child(Child<S>),
}

/// Normalize raw children: empties are dropped, strings and numbers become
/// text nodes, nodes and streams pass through unchanged.
pub fn normalize<S: Surface>(raw: impl IntoIterator<Item = RawChild<S>>) -> ChildList<S> {
    raw.into_iter()
        .filter_map(|child| match child {
            RawChild::Empty => None,
            RawChild::Text(content) => Some(Text::new(content).into()),
            RawChild::Number(n) => Some(Text::new(n.to_string()).into()),
            RawChild::Child(child) => Some(child),
        })
        .collect()
}

impl<S: Surface> From<&str> for RawChild<S> {
    fn from(content: &str) -> Self {
        RawChild::Text(content.to_owned())
    }
}

impl<S: Surface> From<String> for RawChild<S> {
    fn from(content: String) -> Self {
        RawChild::Text(content)
    }
}

macro_rules! raw_child_from_number {
    ($($ty:ty),*) => {
        $(
            impl<S: Surface> From<$ty> for RawChild<S> {
                fn from(n: $ty) -> Self {
                    RawChild::Number(f64::from(n))
                }
            }
        )*
    };
}

raw_child_from_number!(i8, i16, i32, u8, u16, u32, f32, f64);

impl<S: Surface, T: Into<Child<S>>> From<Option<T>> for RawChild<S> {
    fn from(child: Option<T>) -> Self {
        child.map_or(RawChild::Empty, |child| RawChild::Child(child.into()))
    }
}

impl<S: Surface> From<Child<S>> for RawChild<S> {
    fn from(child: Child<S>) -> Self {
        RawChild::Child(child)
    }
}

impl<S: Surface> From<Node<S>> for RawChild<S> {
    fn from(node: Node<S>) -> Self {
        RawChild::Child(node.into())
    }
}

impl<S: Surface> From<Element<S>> for RawChild<S> {
    fn from(elem: Element<S>) -> Self {
        RawChild::Child(elem.into())
    }
}

impl<S: Surface> From<Text<S>> for RawChild<S> {
    fn from(text: Text<S>) -> Self {
        RawChild::Child(text.into())
    }
}

impl<S: Surface> From<ChildStream<S>> for RawChild<S> {
    fn from(stream: ChildStream<S>) -> Self {
        RawChild::Child(Child::Stream(stream))
    }
}

// =============================================================================
// Construction helpers
// =============================================================================

/// Build an element node.
pub fn element<S: Surface>(tag: &str) -> Element<S> {
    Element::new(tag)
}

/// Build a text node.
pub fn text<S: Surface>(content: impl Into<String>) -> Text<S> {
    Text::new(content)
}

/// Create a lifecycle handle.
pub fn node_ref<H: Clone + 'static>() -> NodeRef<H> {
    NodeRef::new()
}
