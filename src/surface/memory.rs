//! Headless surface backed by an arena.
//!
//! Every mutating call is appended to an operation log, so tests can assert
//! exactly which physical operations a reconcile pass issued.

use std::cell::RefCell;
use std::fmt;

use compact_str::CompactString;
use smallvec::SmallVec;

use crate::attr::Handler;

use super::Surface;

/// Handle to a node in a [`MemorySurface`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Arena index of this node.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Token for an attached listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Event delivered by [`MemorySurface::dispatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryEvent {
    /// Event name, e.g. `click`
    pub name: CompactString,
    /// Node the event was dispatched on
    pub target: NodeId,
}

/// One logged physical operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceOp {
    CreateText { node: NodeId, content: String },
    CreateElement { node: NodeId, tag: CompactString },
    /// `index` is the child position after insertion
    Insert { parent: NodeId, child: NodeId, index: usize },
    /// `index` is the child position before removal
    Remove { parent: NodeId, child: NodeId, index: usize },
    SetText { node: NodeId, content: String },
    SetAttribute { node: NodeId, name: CompactString, value: String },
    RemoveAttribute { node: NodeId, name: CompactString },
    SetStyle { node: NodeId, name: CompactString, value: String },
    RemoveStyle { node: NodeId, name: CompactString },
    SetInnerHtml { node: NodeId, html: String },
    AddListener { node: NodeId, event: CompactString },
    RemoveListener { node: NodeId, event: CompactString },
}

impl SurfaceOp {
    /// Whether this operation changes the shape of the tree.
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::Insert { .. } | Self::Remove { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum MemoryKind {
    Element(CompactString),
    Text(String),
}

pub(crate) struct MemoryNode {
    pub(crate) kind: MemoryKind,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) attrs: Vec<(CompactString, String)>,
    pub(crate) style: Vec<(CompactString, String)>,
    pub(crate) inner_html: Option<String>,
    listeners: SmallVec<[(ListenerId, CompactString, Handler<MemoryEvent>); 2]>,
}

impl MemoryNode {
    fn new(kind: MemoryKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            attrs: Vec::new(),
            style: Vec::new(),
            inner_html: None,
            listeners: SmallVec::new(),
        }
    }
}

#[derive(Default)]
struct Arena {
    nodes: Vec<MemoryNode>,
    ops: Vec<SurfaceOp>,
    next_listener: u64,
}

impl Arena {
    fn alloc(&mut self, kind: MemoryKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(MemoryNode::new(kind));
        id
    }

    fn detach(&mut self, child: NodeId) -> Option<(NodeId, usize)> {
        let parent = self.nodes[child.0].parent.take()?;
        let siblings = &mut self.nodes[parent.0].children;
        let index = siblings.iter().position(|&c| c == child)?;
        siblings.remove(index);
        Some((parent, index))
    }
}

/// In-memory [`Surface`] with an operation log.
///
/// Nodes live in an arena indexed by [`NodeId`] and are never freed, so
/// detached nodes stay readable. The log keeps growing until
/// [`MemorySurface::take_ops`] drains it.
#[derive(Default)]
pub struct MemorySurface {
    arena: RefCell<Arena>,
}

impl MemorySurface {
    /// Create an empty surface.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a container element to mount into. Not logged.
    pub fn root(&self, tag: &str) -> NodeId {
        self.arena
            .borrow_mut()
            .alloc(MemoryKind::Element(tag.into()))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Operation log
    // ─────────────────────────────────────────────────────────────────────────

    /// Operations logged since creation or the last `take_ops`.
    pub fn ops(&self) -> Vec<SurfaceOp> {
        self.arena.borrow().ops.clone()
    }

    /// Drain the operation log.
    pub fn take_ops(&self) -> Vec<SurfaceOp> {
        std::mem::take(&mut self.arena.borrow_mut().ops)
    }

    /// Number of logged operations.
    pub fn op_count(&self) -> usize {
        self.arena.borrow().ops.len()
    }

    /// Number of nodes ever created, attached or not.
    pub fn node_count(&self) -> usize {
        self.arena.borrow().nodes.len()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Inspection
    // ─────────────────────────────────────────────────────────────────────────

    /// Tag name, for elements.
    pub fn tag(&self, node: NodeId) -> Option<CompactString> {
        match &self.arena.borrow().nodes[node.0].kind {
            MemoryKind::Element(tag) => Some(tag.clone()),
            MemoryKind::Text(_) => None,
        }
    }

    /// Payload, for text nodes.
    pub fn text(&self, node: NodeId) -> Option<String> {
        match &self.arena.borrow().nodes[node.0].kind {
            MemoryKind::Text(content) => Some(content.clone()),
            MemoryKind::Element(_) => None,
        }
    }

    /// Current children, in order.
    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.arena.borrow().nodes[node.0].children.clone()
    }

    /// Current parent.
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.arena.borrow().nodes[node.0].parent
    }

    /// Position of `node` among its parent's children.
    pub fn index_in_parent(&self, node: NodeId) -> Option<usize> {
        let arena = self.arena.borrow();
        let parent = arena.nodes[node.0].parent?;
        arena.nodes[parent.0].children.iter().position(|&c| c == node)
    }

    /// Attribute value.
    pub fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.arena.borrow().nodes[node.0]
            .attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
    }

    /// Inline style property value.
    pub fn style(&self, node: NodeId, name: &str) -> Option<String> {
        self.arena.borrow().nodes[node.0]
            .style
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
    }

    /// Raw markup set through `set_inner_html`.
    pub fn inner_html(&self, node: NodeId) -> Option<String> {
        self.arena.borrow().nodes[node.0].inner_html.clone()
    }

    /// Number of listeners attached to `node`.
    pub fn listener_count(&self, node: NodeId) -> usize {
        self.arena.borrow().nodes[node.0].listeners.len()
    }

    /// Concatenated text of a subtree.
    pub fn text_content(&self, node: NodeId) -> String {
        let arena = self.arena.borrow();
        let mut buf = String::new();
        collect_text(&arena.nodes, node, &mut buf);
        buf
    }

    /// Serialize a node and its subtree to HTML.
    pub fn render(&self, node: NodeId) -> String {
        crate::render::render_html(&self.arena.borrow().nodes, node)
    }

    /// Serialize only the children of a node.
    pub fn render_children(&self, node: NodeId) -> String {
        crate::render::render_children(&self.arena.borrow().nodes, node)
    }

    /// Invoke every listener for `event` on `node`.
    ///
    /// Returns the number of handlers called. Handlers run without any
    /// surface borrow held, so they may drive further updates.
    pub fn dispatch(&self, node: NodeId, event: &str) -> usize {
        let handlers: Vec<Handler<MemoryEvent>> = self.arena.borrow().nodes[node.0]
            .listeners
            .iter()
            .filter(|(_, name, _)| name == event)
            .map(|(_, _, handler)| handler.clone())
            .collect();
        let payload = MemoryEvent {
            name: event.into(),
            target: node,
        };
        for handler in &handlers {
            handler(&payload);
        }
        handlers.len()
    }
}

fn collect_text(nodes: &[MemoryNode], node: NodeId, buf: &mut String) {
    let node = &nodes[node.0];
    match &node.kind {
        MemoryKind::Text(content) => buf.push_str(content),
        MemoryKind::Element(_) => {
            for &child in &node.children {
                collect_text(nodes, child, buf);
            }
        }
    }
}

impl fmt::Debug for MemorySurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let arena = self.arena.borrow();
        f.debug_struct("MemorySurface")
            .field("nodes", &arena.nodes.len())
            .field("ops", &arena.ops.len())
            .finish()
    }
}

impl Surface for MemorySurface {
    type Node = NodeId;
    type Event = MemoryEvent;
    type Listener = ListenerId;

    fn create_text(&self, content: &str) -> NodeId {
        let mut arena = self.arena.borrow_mut();
        let node = arena.alloc(MemoryKind::Text(content.to_owned()));
        arena.ops.push(SurfaceOp::CreateText {
            node,
            content: content.to_owned(),
        });
        node
    }

    fn create_element(&self, tag: &str) -> NodeId {
        let mut arena = self.arena.borrow_mut();
        let node = arena.alloc(MemoryKind::Element(tag.into()));
        arena.ops.push(SurfaceOp::CreateElement {
            node,
            tag: tag.into(),
        });
        node
    }

    fn insert_before(&self, parent: &NodeId, child: &NodeId, reference: Option<&NodeId>) {
        let mut arena = self.arena.borrow_mut();
        arena.detach(*child);
        let siblings = &arena.nodes[parent.0].children;
        let index = reference
            .and_then(|r| siblings.iter().position(|c| c == r))
            .unwrap_or(siblings.len());
        arena.nodes[parent.0].children.insert(index, *child);
        arena.nodes[child.0].parent = Some(*parent);
        arena.ops.push(SurfaceOp::Insert {
            parent: *parent,
            child: *child,
            index,
        });
    }

    fn remove_child(&self, parent: &NodeId, child: &NodeId) {
        let mut arena = self.arena.borrow_mut();
        if arena.nodes[child.0].parent != Some(*parent) {
            return;
        }
        if let Some((parent, index)) = arena.detach(*child) {
            arena.ops.push(SurfaceOp::Remove {
                parent,
                child: *child,
                index,
            });
        }
    }

    fn child_at(&self, parent: &NodeId, index: usize) -> Option<NodeId> {
        self.arena.borrow().nodes[parent.0].children.get(index).copied()
    }

    fn set_text(&self, node: &NodeId, content: &str) {
        let mut arena = self.arena.borrow_mut();
        if let MemoryKind::Text(text) = &mut arena.nodes[node.0].kind {
            content.clone_into(text);
        }
        arena.ops.push(SurfaceOp::SetText {
            node: *node,
            content: content.to_owned(),
        });
    }

    fn set_attribute(&self, node: &NodeId, name: &str, value: &str) {
        let mut arena = self.arena.borrow_mut();
        set_entry(&mut arena.nodes[node.0].attrs, name, value);
        arena.ops.push(SurfaceOp::SetAttribute {
            node: *node,
            name: name.into(),
            value: value.to_owned(),
        });
    }

    fn remove_attribute(&self, node: &NodeId, name: &str) {
        let mut arena = self.arena.borrow_mut();
        arena.nodes[node.0].attrs.retain(|(k, _)| k != name);
        arena.ops.push(SurfaceOp::RemoveAttribute {
            node: *node,
            name: name.into(),
        });
    }

    fn set_style(&self, node: &NodeId, name: &str, value: &str) {
        let mut arena = self.arena.borrow_mut();
        set_entry(&mut arena.nodes[node.0].style, name, value);
        arena.ops.push(SurfaceOp::SetStyle {
            node: *node,
            name: name.into(),
            value: value.to_owned(),
        });
    }

    fn remove_style(&self, node: &NodeId, name: &str) {
        let mut arena = self.arena.borrow_mut();
        arena.nodes[node.0].style.retain(|(k, _)| k != name);
        arena.ops.push(SurfaceOp::RemoveStyle {
            node: *node,
            name: name.into(),
        });
    }

    fn set_inner_html(&self, node: &NodeId, html: &str) {
        let mut arena = self.arena.borrow_mut();
        let children = std::mem::take(&mut arena.nodes[node.0].children);
        for child in children {
            arena.nodes[child.0].parent = None;
        }
        arena.nodes[node.0].inner_html = (!html.is_empty()).then(|| html.to_owned());
        arena.ops.push(SurfaceOp::SetInnerHtml {
            node: *node,
            html: html.to_owned(),
        });
    }

    fn add_listener(&self, node: &NodeId, event: &str, handler: Handler<MemoryEvent>) -> ListenerId {
        let mut arena = self.arena.borrow_mut();
        let id = ListenerId(arena.next_listener);
        arena.next_listener += 1;
        arena.nodes[node.0].listeners.push((id, event.into(), handler));
        arena.ops.push(SurfaceOp::AddListener {
            node: *node,
            event: event.into(),
        });
        id
    }

    fn remove_listener(&self, node: &NodeId, event: &str, listener: ListenerId) {
        let mut arena = self.arena.borrow_mut();
        arena.nodes[node.0].listeners.retain(|(id, _, _)| *id != listener);
        arena.ops.push(SurfaceOp::RemoveListener {
            node: *node,
            event: event.into(),
        });
    }
}

fn set_entry(entries: &mut Vec<(CompactString, String)>, name: &str, value: &str) {
    if let Some(entry) = entries.iter_mut().find(|(k, _)| k == name) {
        value.clone_into(&mut entry.1);
    } else {
        entries.push((name.into(), value.to_owned()));
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    #[test]
    fn test_insert_before_and_remove() {
        let surface = MemorySurface::new();
        let root = surface.root("div");
        let a = surface.create_text("a");
        let b = surface.create_text("b");
        let c = surface.create_text("c");

        surface.insert_before(&root, &a, None);
        surface.insert_before(&root, &c, None);
        surface.insert_before(&root, &b, Some(&c));
        assert_eq!(surface.children(root), vec![a, b, c]);
        assert_eq!(surface.child_at(&root, 1), Some(b));
        assert_eq!(surface.child_at(&root, 3), None);

        surface.remove_child(&root, &a);
        assert_eq!(surface.children(root), vec![b, c]);
        assert_eq!(surface.parent(a), None);
        assert_eq!(surface.index_in_parent(c), Some(1));

        let structural = surface.ops().iter().filter(|op| op.is_structural()).count();
        assert_eq!(structural, 4);
    }

    #[test]
    fn test_reinsert_moves_node() {
        let surface = MemorySurface::new();
        let left = surface.root("ul");
        let right = surface.root("ol");
        let item = surface.create_element("li");

        surface.insert_before(&left, &item, None);
        surface.insert_before(&right, &item, None);
        assert!(surface.children(left).is_empty());
        assert_eq!(surface.parent(item), Some(right));
    }

    #[test]
    fn test_attributes_styles_and_log() {
        let surface = MemorySurface::new();
        let node = surface.create_element("p");
        surface.take_ops();

        surface.set_attribute(&node, "class", "a");
        surface.set_attribute(&node, "class", "b");
        surface.set_style(&node, "color", "red");
        assert_eq!(surface.attribute(node, "class").as_deref(), Some("b"));
        assert_eq!(surface.style(node, "color").as_deref(), Some("red"));

        surface.remove_attribute(&node, "class");
        surface.remove_style(&node, "color");
        assert_eq!(surface.attribute(node, "class"), None);
        assert_eq!(surface.style(node, "color"), None);
        assert_eq!(surface.op_count(), 5);
    }

    #[test]
    fn test_dispatch_and_remove_listener() {
        let surface = MemorySurface::new();
        let button = surface.create_element("button");
        let clicks = Rc::new(Cell::new(0));

        let counter = clicks.clone();
        let listener = surface.add_listener(
            &button,
            "click",
            Rc::new(move |event: &MemoryEvent| {
                assert_eq!(event.name, "click");
                counter.set(counter.get() + 1);
            }),
        );

        assert_eq!(surface.dispatch(button, "click"), 1);
        assert_eq!(surface.dispatch(button, "input"), 0);
        surface.remove_listener(&button, "click", listener);
        assert_eq!(surface.dispatch(button, "click"), 0);
        assert_eq!(clicks.get(), 1);
    }

    #[test]
    fn test_inner_html_drops_children() {
        let surface = MemorySurface::new();
        let root = surface.root("div");
        let child = surface.create_text("x");
        surface.insert_before(&root, &child, None);

        surface.set_inner_html(&root, "<b>raw</b>");
        assert!(surface.children(root).is_empty());
        assert_eq!(surface.inner_html(root).as_deref(), Some("<b>raw</b>"));
        assert_eq!(surface.render(root), "<div><b>raw</b></div>");
    }

    #[test]
    fn test_detached_nodes_stay_readable() {
        let surface = MemorySurface::new();
        let root = surface.root("ul");
        let item = surface.create_element("li");
        surface.set_attribute(&item, "class", "gone");
        surface.insert_before(&root, &item, None);
        assert_eq!(surface.node_count(), 2);
        assert_eq!(surface.op_count(), 3);

        surface.remove_child(&root, &item);
        assert_eq!(surface.parent(item), None);
        assert_eq!(surface.tag(item).as_deref(), Some("li"));
        assert_eq!(surface.attribute(item, "class").as_deref(), Some("gone"));
        assert_eq!(surface.node_count(), 2);

        assert_eq!(surface.take_ops().len(), 4);
        assert_eq!(surface.op_count(), 0);
    }
}
