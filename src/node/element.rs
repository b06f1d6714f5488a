//! Element type
//!
//! The core building block of the tree.

use std::fmt;
use std::rc::Rc;

use compact_str::CompactString;
use smallvec::SmallVec;

use crate::attr::{Events, Handler, Props, PropsExt, Value, event_name};
use crate::error::{ReconcileError, ReconcileResult};
use crate::stream::Stream;
use crate::surface::Surface;

use super::{Child, ChildStream, Children, NodeRef, RawChild, Text, normalize};

/// Prop key holding the lifecycle handle.
const REF_KEY: &str = "ref";
/// Prop key holding the style map.
const STYLE_KEY: &str = "style";
/// Prop key holding raw markup.
const INNER_HTML_KEY: &str = "innerHTML";

// =============================================================================
// Element<S>
// =============================================================================

/// Element with attributes, style, events and children
pub struct Element<S: Surface> {
    /// Tag name
    pub tag: CompactString,
    /// Attributes, constant or streamed
    pub attrs: Props,
    /// Inline style properties, constant or streamed
    pub style: Props,
    /// Event listeners keyed by event name (`click`, not `onclick`)
    pub events: Events<S::Event>,
    /// Raw markup; when set, `children` is always empty
    pub inner_html: Option<String>,
    /// Child items
    pub children: Children<S>,
    /// Lifecycle handle notified on attach and detach
    pub node_ref: Option<NodeRef<S::Node>>,
}

/// Loosely typed prop value accepted by [`Element::from_props`].
pub enum Prop<S: Surface> {
    /// Attribute value, or raw markup under `innerHTML`
    Value(Value<String>),
    /// Event handler, under an `on*` key
    Handler(Handler<S::Event>),
    /// Style map, under `style`
    Style(Props),
    /// Lifecycle handle, under `ref`
    Ref(NodeRef<S::Node>),
}

impl<S: Surface> Prop<S> {
    /// Wrap a closure as a handler prop
    pub fn handler(f: impl Fn(&S::Event) + 'static) -> Self {
        Prop::Handler(Rc::new(f))
    }
}

impl<S: Surface> From<&str> for Prop<S> {
    fn from(value: &str) -> Self {
        Prop::Value(value.into())
    }
}

impl<S: Surface> From<String> for Prop<S> {
    fn from(value: String) -> Self {
        Prop::Value(value.into())
    }
}

impl<S: Surface> From<Stream<String>> for Prop<S> {
    fn from(stream: Stream<String>) -> Self {
        Prop::Value(Value::Stream(stream))
    }
}

impl<S: Surface> From<NodeRef<S::Node>> for Prop<S> {
    fn from(node_ref: NodeRef<S::Node>) -> Self {
        Prop::Ref(node_ref)
    }
}

impl<S: Surface> Element<S> {
    /// Create an element with no props or children
    pub fn new(tag: impl Into<CompactString>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            style: Vec::new(),
            events: Vec::new(),
            inner_html: None,
            children: SmallVec::new(),
            node_ref: None,
        }
    }

    /// Build an element from a flat prop list and raw children.
    ///
    /// `on*` keys become events, `ref` and `style` are extracted, and
    /// `innerHTML` sets raw markup. A value whose kind does not fit its key
    /// is a malformed node.
    pub fn from_props<K: Into<CompactString>>(
        tag: impl Into<CompactString>,
        props: impl IntoIterator<Item = (K, Prop<S>)>,
        children: impl IntoIterator<Item = RawChild<S>>,
    ) -> ReconcileResult<Self> {
        let mut elem = Self::new(tag);

        for (key, prop) in props {
            let key: CompactString = key.into();
            if let Err(reason) = elem.apply_prop(&key, prop) {
                return Err(ReconcileError::malformed(key, reason));
            }
        }

        if elem.inner_html.is_none() {
            elem.children = normalize(children).into_iter().collect();
        }
        Ok(elem)
    }

    fn apply_prop(&mut self, key: &str, prop: Prop<S>) -> Result<(), &'static str> {
        match (key, prop) {
            (REF_KEY, Prop::Ref(node_ref)) => self.node_ref = Some(node_ref),
            (REF_KEY, _) => return Err("expects a node ref"),
            (STYLE_KEY, Prop::Style(style)) => self.style = style,
            (STYLE_KEY, _) => return Err("expects a style map"),
            (INNER_HTML_KEY, Prop::Value(Value::Const(html))) => self.inner_html = Some(html),
            (INNER_HTML_KEY, _) => return Err("expects constant markup"),
            (name, prop) => match (event_name(name), prop) {
                (Some(event), Prop::Handler(handler)) => self.events.push((event.into(), handler)),
                (Some(_), _) => return Err("expects an event handler"),
                (None, Prop::Value(value)) => self.attrs.set_prop(name, value),
                (None, Prop::Handler(_)) => return Err("is not an event key"),
                (None, _) => return Err("expects a string value"),
            },
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Builder
    // ─────────────────────────────────────────────────────────────────────────

    /// Set a constant attribute
    pub fn attr(mut self, name: impl Into<CompactString>, value: impl Into<String>) -> Self {
        self.attrs.set_prop(name, Value::Const(value.into()));
        self
    }

    /// Bind an attribute to a stream
    pub fn attr_stream(mut self, name: impl Into<CompactString>, stream: Stream<String>) -> Self {
        self.attrs.set_prop(name, Value::Stream(stream));
        self
    }

    /// Set a constant style property
    pub fn style(mut self, name: impl Into<CompactString>, value: impl Into<String>) -> Self {
        self.style.set_prop(name, Value::Const(value.into()));
        self
    }

    /// Bind a style property to a stream
    pub fn style_stream(mut self, name: impl Into<CompactString>, stream: Stream<String>) -> Self {
        self.style.set_prop(name, Value::Stream(stream));
        self
    }

    /// Attach an event handler (`click`, not `onclick`)
    pub fn on(self, event: impl Into<CompactString>, handler: impl Fn(&S::Event) + 'static) -> Self {
        self.on_handler(event, Rc::new(handler))
    }

    /// Attach a shared event handler; reusing the same `Rc` keeps the
    /// listener in place across updates
    pub fn on_handler(mut self, event: impl Into<CompactString>, handler: Handler<S::Event>) -> Self {
        let event = event.into();
        self.events.retain(|(name, _)| *name != event);
        self.events.push((event, handler));
        self
    }

    /// Append a child item. Ignored once raw markup is set.
    pub fn child(mut self, child: impl Into<Child<S>>) -> Self {
        if self.inner_html.is_none() {
            self.children.push(child.into());
        }
        self
    }

    /// Append raw children after normalization
    pub fn children(mut self, children: impl IntoIterator<Item = RawChild<S>>) -> Self {
        if self.inner_html.is_none() {
            self.children.extend(normalize(children));
        }
        self
    }

    /// Append a text child
    pub fn text(self, content: impl Into<String>) -> Self {
        self.child(Text::new(content))
    }

    /// Append a dynamic region
    pub fn stream(self, stream: ChildStream<S>) -> Self {
        self.child(Child::Stream(stream))
    }

    /// Replace the content with raw markup; drops all children
    pub fn inner_html(mut self, html: impl Into<String>) -> Self {
        self.inner_html = Some(html.into());
        self.children.clear();
        self
    }

    /// Attach a lifecycle handle
    pub fn node_ref(mut self, node_ref: NodeRef<S::Node>) -> Self {
        self.node_ref = Some(node_ref);
        self
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Helpers
    // ─────────────────────────────────────────────────────────────────────────

    /// Get a constant attribute value by name
    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs.get_const(name)
    }

    /// Check if element has no children
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of direct child items (nodes and streams)
    pub fn child_count(&self) -> usize {
        self.children.len()
    }
}

impl<S: Surface> Clone for Element<S> {
    fn clone(&self) -> Self {
        Self {
            tag: self.tag.clone(),
            attrs: self.attrs.clone(),
            style: self.style.clone(),
            events: self.events.clone(),
            inner_html: self.inner_html.clone(),
            children: self.children.clone(),
            node_ref: self.node_ref.clone(),
        }
    }
}

impl<S: Surface> fmt::Debug for Element<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let events: Vec<&str> = self.events.iter().map(|(name, _)| name.as_str()).collect();
        f.debug_struct("Element")
            .field("tag", &self.tag)
            .field("attrs", &self.attrs)
            .field("style", &self.style)
            .field("events", &events)
            .field("inner_html", &self.inner_html)
            .field("children", &self.children)
            .field("node_ref", &self.node_ref.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::MemorySurface;

    type M = MemorySurface;

    #[test]
    fn test_element_builder() {
        let elem: Element<M> = Element::new("div")
            .attr("class", "box")
            .style("color", "red")
            .on("click", |_| {})
            .text("hi")
            .child(Element::new("span"));

        assert_eq!(elem.tag, "div");
        assert_eq!(elem.get_attr("class"), Some("box"));
        assert_eq!(elem.style.get_const("color"), Some("red"));
        assert_eq!(elem.events.len(), 1);
        assert_eq!(elem.child_count(), 2);
    }

    #[test]
    fn test_inner_html_forces_empty_children() {
        let elem: Element<M> = Element::new("div").text("a").inner_html("<b>x</b>").text("b");
        assert!(elem.is_empty());
        assert_eq!(elem.inner_html.as_deref(), Some("<b>x</b>"));
    }

    #[test]
    fn test_from_props_routes_keys() {
        let node_ref = NodeRef::new();
        let style: Props = vec![("color".into(), "blue".into())];
        let elem = Element::<M>::from_props(
            "button",
            [
                ("id", Prop::from("ok")),
                ("onclick", Prop::handler(|_| {})),
                ("style", Prop::Style(style)),
                ("ref", Prop::Ref(node_ref.clone())),
            ],
            ["Save".into(), RawChild::Empty],
        )
        .unwrap();

        assert_eq!(elem.get_attr("id"), Some("ok"));
        assert_eq!(elem.events[0].0, "click");
        assert_eq!(elem.style.get_const("color"), Some("blue"));
        assert!(elem.node_ref.as_ref().is_some_and(|r| r.ptr_eq(&node_ref)));
        assert_eq!(elem.child_count(), 1);
    }

    #[test]
    fn test_from_props_inner_html_drops_children() {
        let elem = Element::<M>::from_props(
            "div",
            [("innerHTML", Prop::from("<i>x</i>"))],
            ["ignored".into()],
        )
        .unwrap();
        assert!(elem.is_empty());
        assert_eq!(elem.inner_html.as_deref(), Some("<i>x</i>"));
    }

    #[test]
    fn test_from_props_rejects_mismatched_kinds() {
        let cases: Vec<(&str, Prop<M>)> = vec![
            ("onclick", Prop::from("alert(1)")),
            ("title", Prop::handler(|_| {})),
            ("ref", Prop::from("x")),
            ("style", Prop::from("color: red")),
            ("class", Prop::Ref(NodeRef::new())),
        ];

        for (key, prop) in cases {
            let err = Element::<M>::from_props("div", [(key, prop)], []).unwrap_err();
            assert!(
                matches!(&err, ReconcileError::MalformedNode { key: k, .. } if k == key),
                "unexpected error for {key}: {err}"
            );
        }
    }
}
