//! Reconciler: mount a child list into a container and keep it in sync.
//!
//! # Architecture
//!
//! ```text
//! Mount ── root Region (host: container)
//!            ├─ space 0: Mounted(text)
//!            ├─ space 1: Mounted(element) ── child Region (host: element)
//!            └─ space 2: Mirror, Mirror ──── nested Region (host: space 2 of root)
//!                                              ▲ fed by a stream subscription
//! ```
//!
//! Every region places its nodes through index arithmetic on its space map
//! (see `region`). Dynamic regions re-render on each emission; a stream
//! failure halts only the region it feeds and is recorded on the mount.
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use tola_reconciler::prelude::*;
//!
//! let surface = Rc::new(MemorySurface::new());
//! let container = surface.root("main");
//! let count = Subject::replay(Some(vec![Child::from(text::<MemorySurface>("0"))]));
//!
//! let mount = mount(
//!     surface.clone(),
//!     container,
//!     vec![element("h1").text("Count").into(), Child::Stream(count.stream())],
//! )
//! .unwrap();
//! assert_eq!(surface.render_children(container), "<h1>Count</h1>0");
//!
//! count.next(Some(vec![text("1").into()]));
//! assert_eq!(surface.render_children(container), "<h1>Count</h1>1");
//!
//! mount.unmount();
//! assert_eq!(surface.render_children(container), "");
//! ```

mod record;
mod region;
mod space;
mod tree;

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, error};

use crate::config::ReconcileConfig;
use crate::error::{ReconcileError, ReconcileResult};
use crate::node::Child;
use crate::surface::Surface;

use region::{Disposal, Host, Region};

// =============================================================================
// Context
// =============================================================================

/// State shared by every region of one mount.
pub(crate) struct Context<S: Surface> {
    pub(crate) surface: Rc<S>,
    pub(crate) config: ReconcileConfig,
    error: RefCell<Option<ReconcileError>>,
}

impl<S: Surface> Context<S> {
    pub(crate) fn new(surface: Rc<S>, config: ReconcileConfig) -> Self {
        Self {
            surface,
            config,
            error: RefCell::new(None),
        }
    }

    /// Record an error raised outside any caller's stack. The first one is
    /// kept.
    pub(crate) fn report(&self, err: ReconcileError) {
        error!(error = %err, "reconcile failed");
        let mut slot = self.error.borrow_mut();
        if slot.is_none() {
            *slot = Some(err);
        }
    }

    pub(crate) fn error(&self) -> Option<ReconcileError> {
        self.error.borrow().clone()
    }
}

// =============================================================================
// Mount
// =============================================================================

/// A child list mounted into a container.
///
/// Dropping a `Mount` without calling [`Mount::unmount`] cancels every
/// subscription and detaches every listener it made. The nodes stay in the
/// container as they are, and refs are not notified.
pub struct Mount<S: Surface> {
    ctx: Rc<Context<S>>,
    root: Rc<Region<S>>,
    container: S::Node,
}

/// Mount `items` as the children of `container` with the default config.
///
/// The mount owns the container's children from then on.
///
/// # Errors
///
/// Fails if any item cannot be mounted, including errors raised by streams
/// that emit synchronously on subscribe. Everything mounted so far is
/// removed again before the error is returned.
pub fn mount<S: Surface>(
    surface: Rc<S>,
    container: S::Node,
    items: impl IntoIterator<Item = Child<S>>,
) -> ReconcileResult<Mount<S>> {
    mount_with_config(surface, container, items, ReconcileConfig::default())
}

/// Mount `items` as the children of `container`.
///
/// # Errors
///
/// See [`mount`].
pub fn mount_with_config<S: Surface>(
    surface: Rc<S>,
    container: S::Node,
    items: impl IntoIterator<Item = Child<S>>,
    config: ReconcileConfig,
) -> ReconcileResult<Mount<S>> {
    let ctx = Rc::new(Context::new(surface, config));
    let root = Rc::new(Region::new(Rc::clone(&ctx), Host::Container(container.clone()), 0));

    let result = root.apply(items.into_iter().collect());
    if let Err(err) = result.and_then(|()| ctx.error().map_or(Ok(()), Err)) {
        root.dispose(Disposal::Detach);
        return Err(err);
    }

    debug!(nodes = root.width(), "mounted");
    Ok(Mount { ctx, root, container })
}

impl<S: Surface> Mount<S> {
    /// Reconcile the mounted list against `items`.
    ///
    /// # Errors
    ///
    /// Returns the first error of this pass. Sibling items are still
    /// updated; the mount stays usable.
    pub fn update(&self, items: impl IntoIterator<Item = Child<S>>) -> ReconcileResult<()> {
        self.root.apply(items.into_iter().collect())
    }

    /// Cancel every subscription and remove every node this mount created.
    pub fn unmount(self) {
        self.root.dispose(Disposal::Detach);
        debug!("unmounted");
    }

    /// First error raised by a dynamic region since mounting, if any.
    pub fn error(&self) -> Option<ReconcileError> {
        self.ctx.error()
    }

    /// Number of nodes currently placed in the container.
    pub fn len(&self) -> usize {
        self.root.width()
    }

    /// Whether the container is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Physical nodes placed in the container, in order.
    pub fn nodes(&self) -> Vec<S::Node> {
        self.root.handles()
    }

    /// Target surface.
    pub fn surface(&self) -> &Rc<S> {
        &self.ctx.surface
    }

    /// Container node.
    pub fn container(&self) -> &S::Node {
        &self.container
    }
}

impl<S: Surface> Drop for Mount<S> {
    fn drop(&mut self) {
        self.root.dispose(Disposal::Abandon);
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::error::StreamError;
    use crate::node::{ChildList, Element, NodeRef, Text, element, text};
    use crate::stream::Subject;
    use crate::surface::{MemorySurface, NodeId, SurfaceOp};

    type M = MemorySurface;
    type Feed = Subject<Option<ChildList<M>>>;

    fn setup() -> (Rc<M>, NodeId) {
        let surface = Rc::new(MemorySurface::new());
        let container = surface.root("div");
        (surface, container)
    }

    fn texts(items: &[&str]) -> ChildList<M> {
        items.iter().map(|s| Child::from(Text::new(*s))).collect()
    }

    fn feed() -> Feed {
        Subject::new()
    }

    fn removals(ops: &[SurfaceOp]) -> usize {
        ops.iter().filter(|op| matches!(op, SurfaceOp::Remove { .. })).count()
    }

    fn page() -> ChildList<M> {
        vec![
            text("a").into(),
            element("p").attr("class", "lead").text("b").into(),
            element("ul")
                .child(element("li").text("1"))
                .child(element("li").text("2"))
                .into(),
        ]
    }

    #[test]
    fn test_mount_renders_in_order() {
        let (surface, container) = setup();
        let mount = mount(surface.clone(), container, page()).unwrap();

        assert_eq!(
            surface.render_children(container),
            r#"a<p class="lead">b</p><ul><li>1</li><li>2</li></ul>"#
        );
        assert_eq!(mount.len(), 3);
        assert_eq!(mount.nodes(), surface.children(container));
    }

    #[test]
    fn test_identical_update_is_silent() {
        let (surface, container) = setup();
        let mount = mount(surface.clone(), container, page()).unwrap();
        surface.take_ops();

        mount.update(page()).unwrap();
        assert!(surface.take_ops().is_empty());
    }

    #[test]
    fn test_replace_element_keeps_sibling() {
        let (surface, container) = setup();
        let mount = mount(
            surface.clone(),
            container,
            vec![text("a").into(), element("p").text("b").into()],
        )
        .unwrap();
        let first = surface.children(container)[0];
        surface.take_ops();

        mount
            .update(vec![text("a").into(), element("div").text("b").into()])
            .unwrap();

        assert_eq!(surface.render_children(container), "a<div>b</div>");
        assert_eq!(surface.children(container)[0], first);
        let ops = surface.take_ops();
        assert_eq!(removals(&ops), 1);
        assert!(!ops.iter().any(|op| matches!(op, SurfaceOp::SetText { .. })));
    }

    #[test]
    fn test_text_update_in_place() {
        let (surface, container) = setup();
        let mount = mount(surface.clone(), container, texts(&["a", "b"])).unwrap();
        let before = surface.children(container);
        surface.take_ops();

        mount.update(texts(&["a", "c"])).unwrap();
        assert_eq!(surface.children(container), before);
        assert_eq!(surface.text(before[1]).as_deref(), Some("c"));
        assert_eq!(surface.take_ops().len(), 1);
    }

    #[test]
    fn test_trailing_changes() {
        let (surface, container) = setup();
        let mount = mount(surface.clone(), container, texts(&["a", "b", "c"])).unwrap();

        mount.update(texts(&["a"])).unwrap();
        assert_eq!(surface.text_content(container), "a");
        mount.update(texts(&["a", "x", "y"])).unwrap();
        assert_eq!(surface.text_content(container), "axy");
        assert_eq!(mount.len(), 3);
    }

    #[test]
    fn test_dynamic_region_shrinks() {
        let (surface, container) = setup();
        let items = feed();
        let _mount = mount(surface.clone(), container, vec![Child::Stream(items.stream())]).unwrap();

        items.next(Some(texts(&["1", "2", "3"])));
        let first = surface.children(container)[0];
        assert_eq!(surface.text_content(container), "123");

        surface.take_ops();
        items.next(Some(texts(&["1", "3"])));
        assert_eq!(surface.text_content(container), "13");
        assert_eq!(surface.children(container)[0], first);
        assert_eq!(removals(&surface.take_ops()), 1);
    }

    #[test]
    fn test_sibling_region_shifts() {
        let (surface, container) = setup();
        let (left, right) = (feed(), feed());
        let _mount = mount(
            surface.clone(),
            container,
            vec![Child::Stream(left.stream()), Child::Stream(right.stream())],
        )
        .unwrap();

        left.next(Some(texts(&["a", "b"])));
        right.next(Some(texts(&["z"])));
        let z = surface.children(container)[2];
        assert_eq!(surface.index_in_parent(z), Some(2));

        left.next(Some(texts(&["a", "b", "c"])));
        assert_eq!(surface.index_in_parent(z), Some(3));
        assert_eq!(surface.text_content(container), "abcz");

        left.next(None);
        assert_eq!(surface.index_in_parent(z), Some(0));
    }

    #[test]
    fn test_static_and_dynamic_are_isolated() {
        let (surface, container) = setup();
        let items = feed();
        let stream = items.stream();
        let mount = mount(
            surface.clone(),
            container,
            vec![text("s0").into(), text("s1").into(), Child::Stream(stream.clone())],
        )
        .unwrap();
        let statics = surface.children(container);

        items.next(Some(texts(&["x"])));
        items.next(Some(texts(&["x", "y"])));
        assert_eq!(&surface.children(container)[..2], &statics[..]);
        assert_eq!(surface.text_content(container), "s0s1xy");

        mount
            .update(vec![
                text("s0").into(),
                text("s1").into(),
                Child::Stream(stream),
                text("s2").into(),
            ])
            .unwrap();
        items.next(Some(texts(&["x", "y", "w"])));
        assert_eq!(surface.text_content(container), "s0s1xyws2");
        assert_eq!(&surface.children(container)[..2], &statics[..]);
    }

    #[test]
    fn test_nested_regions_compose() {
        let (surface, container) = setup();
        let (outer, inner) = (feed(), feed());
        let _mount = mount(surface.clone(), container, vec![Child::Stream(outer.stream())]).unwrap();

        outer.next(Some(vec![
            text("a").into(),
            Child::Stream(inner.stream()),
            text("b").into(),
        ]));
        inner.next(Some(texts(&["x", "y"])));
        assert_eq!(surface.text_content(container), "axyb");

        inner.next(Some(texts(&["x"])));
        assert_eq!(surface.text_content(container), "axb");

        outer.next(Some(texts(&["c"])));
        assert_eq!(surface.text_content(container), "c");
        assert_eq!(inner.observer_count(), 0);
    }

    #[test]
    fn test_none_renders_nothing() {
        let (surface, container) = setup();
        let items = Subject::replay(Some(texts(&["a"])));
        let mount = mount(surface.clone(), container, vec![Child::Stream(items.stream())]).unwrap();
        assert_eq!(mount.len(), 1);

        items.next(None);
        assert!(mount.is_empty());
        assert!(surface.children(container).is_empty());
    }

    #[test]
    fn test_unmount_cancels_recursively() {
        let (surface, container) = setup();
        let (outer, inner) = (feed(), feed());
        let title = Subject::replay("t".to_string());
        let mount = mount(surface.clone(), container, vec![Child::Stream(outer.stream())]).unwrap();

        outer.next(Some(vec![
            element("ul")
                .attr_stream("title", title.stream())
                .stream(inner.stream())
                .into(),
        ]));
        inner.next(Some(texts(&["1", "2"])));
        assert_eq!(surface.render_children(container), r#"<ul title="t">12</ul>"#);

        mount.unmount();
        assert!(surface.children(container).is_empty());
        assert_eq!(outer.observer_count(), 0);
        assert_eq!(inner.observer_count(), 0);
        assert_eq!(title.observer_count(), 0);

        surface.take_ops();
        outer.next(Some(texts(&["late"])));
        inner.next(Some(texts(&["late"])));
        title.next("late".to_string());
        assert!(surface.take_ops().is_empty());
    }

    #[test]
    fn test_drop_stops_streams_and_keeps_nodes() {
        let (surface, container) = setup();
        let (outer, inner) = (feed(), feed());
        let title = Subject::replay("t".to_string());
        let handle: NodeRef<NodeId> = NodeRef::new();
        let clicks = Rc::new(RefCell::new(0));
        let counter = clicks.clone();
        let mount = mount(surface.clone(), container, vec![Child::Stream(outer.stream())]).unwrap();

        outer.next(Some(vec![
            element("p")
                .attr_stream("title", title.stream())
                .node_ref(handle.clone())
                .on("click", move |_| *counter.borrow_mut() += 1)
                .stream(inner.stream())
                .into(),
        ]));
        inner.next(Some(texts(&["1"])));
        let p = surface.children(container)[0];

        drop(mount);
        assert_eq!(outer.observer_count(), 0);
        assert_eq!(inner.observer_count(), 0);
        assert_eq!(title.observer_count(), 0);
        assert_eq!(surface.listener_count(p), 0);

        title.next("late".to_string());
        inner.next(Some(texts(&["late"])));
        surface.dispatch(p, "click");
        assert_eq!(surface.render_children(container), r#"<p title="t">1</p>"#);
        assert_eq!(*clicks.borrow(), 0);
        assert_eq!(handle.current(), Some(p));
    }

    #[test]
    fn test_unmount_then_drop_is_quiet() {
        let (surface, container) = setup();
        let mount = mount(surface.clone(), container, page()).unwrap();
        surface.take_ops();

        mount.unmount();
        let ops = surface.take_ops();
        assert_eq!(removals(&ops), 3);
        assert_eq!(ops.len(), 3);
        assert!(surface.children(container).is_empty());
    }

    #[test]
    fn test_replacing_stream_stops_old_region() {
        let (surface, container) = setup();
        let items = feed();
        let mount = mount(surface.clone(), container, vec![Child::Stream(items.stream())]).unwrap();
        items.next(Some(texts(&["a"])));

        mount.update(texts(&["fixed"])).unwrap();
        assert_eq!(items.observer_count(), 0);
        surface.take_ops();

        items.next(Some(texts(&["b"])));
        assert!(surface.take_ops().is_empty());
        assert_eq!(surface.text_content(container), "fixed");
    }

    #[test]
    fn test_depth_limit() {
        let (surface, container) = setup();
        let tree: Element<M> = element("div").child(element("div").child(element("div").text("deep")));

        let err = mount_with_config(surface.clone(), container, vec![tree.into()], ReconcileConfig::new(2))
            .err()
            .unwrap();
        assert_eq!(err, ReconcileError::DepthLimit { limit: 2 });
        assert!(surface.children(container).is_empty());
    }

    #[test]
    fn test_self_feeding_stream_is_cut_off() {
        let (surface, container) = setup();
        let items: Feed = Subject::replay_empty();
        let mounted = mount_with_config(
            surface.clone(),
            container,
            vec![Child::Stream(items.stream())],
            ReconcileConfig::new(8),
        )
        .unwrap();

        items.next(Some(vec![text("x").into(), Child::Stream(items.stream())]));
        assert!(matches!(mounted.error(), Some(ReconcileError::DepthLimit { limit: 8 })));
    }

    #[test]
    fn test_stream_failure_halts_region() {
        let (surface, container) = setup();
        let (left, right) = (feed(), feed());
        let mount = mount(
            surface.clone(),
            container,
            vec![Child::Stream(left.stream()), Child::Stream(right.stream())],
        )
        .unwrap();

        left.next(Some(texts(&["a"])));
        left.fail(StreamError::new("boom"));
        assert_eq!(mount.error(), Some(StreamError::new("boom").into()));

        right.next(Some(texts(&["b"])));
        assert_eq!(surface.text_content(container), "ab");
    }

    #[test]
    fn test_failure_during_mount_is_returned() {
        let (surface, container) = setup();
        let items = feed();
        items.fail(StreamError::new("early"));

        let result = mount(surface.clone(), container, vec![text("a").into(), Child::Stream(items.stream())]);
        assert!(result.err().is_some_and(|err| err.is_stream()));
        assert!(surface.children(container).is_empty());
    }

    #[test]
    fn test_node_ref_lifecycle() {
        let (surface, container) = setup();
        let handle: NodeRef<NodeId> = NodeRef::new();
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        let _sub = handle.stream().subscribe_next(move |(_, mounted)| sink.borrow_mut().push(mounted));

        let mount = mount(
            surface.clone(),
            container,
            vec![element("input").node_ref(handle.clone()).into()],
        )
        .unwrap();
        assert_eq!(handle.current(), surface.children(container).first().copied());

        mount.update(vec![element("input").node_ref(handle.clone()).into()]).unwrap();
        mount.update(Vec::new()).unwrap();
        assert_eq!(handle.current(), None);
        assert_eq!(*events.borrow(), vec![true, false]);
    }

    #[test]
    fn test_node_ref_below_removed_subtree() {
        let (surface, container) = setup();
        let (outer, inner): (NodeRef<NodeId>, NodeRef<NodeId>) = (NodeRef::new(), NodeRef::new());
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        let _sub = inner.stream().subscribe_next(move |(_, mounted)| sink.borrow_mut().push(mounted));
        let items = feed();

        let tree = || -> ChildList<M> {
            vec![
                element("div")
                    .node_ref(outer.clone())
                    .child(element("section").child(element("span").node_ref(inner.clone())))
                    .into(),
            ]
        };
        let mount = mount(surface.clone(), container, vec![Child::Stream(items.stream())]).unwrap();
        items.next(Some(tree()));
        let span = inner.current();
        assert!(span.is_some());
        assert!(outer.current().is_some());

        items.next(None);
        assert_eq!(inner.current(), None);
        assert_eq!(outer.current(), None);
        assert_eq!(*events.borrow(), vec![true, false]);

        items.next(Some(tree()));
        mount.unmount();
        assert_eq!(inner.current(), None);
        assert_eq!(*events.borrow(), vec![true, false, true, false]);
    }

    #[test]
    fn test_node_ref_swap() {
        let (surface, container) = setup();
        let (a, b): (NodeRef<NodeId>, NodeRef<NodeId>) = (NodeRef::new(), NodeRef::new());
        let mount = mount(surface.clone(), container, vec![element("p").node_ref(a.clone()).into()]).unwrap();

        mount.update(vec![element("p").node_ref(b.clone()).into()]).unwrap();
        assert_eq!(a.current(), None);
        assert_eq!(b.current(), surface.children(container).first().copied());
    }

    #[test]
    fn test_props_and_events_follow_updates() {
        let (surface, container) = setup();
        let clicks = Rc::new(RefCell::new(0));
        let counter = clicks.clone();
        let mount = mount(
            surface.clone(),
            container,
            vec![
                element("button")
                    .attr("class", "a")
                    .style("color", "red")
                    .on("click", move |_| *counter.borrow_mut() += 1)
                    .into(),
            ],
        )
        .unwrap();
        let button = surface.children(container)[0];

        assert_eq!(surface.dispatch(button, "click"), 1);
        assert_eq!(*clicks.borrow(), 1);

        mount.update(vec![element("button").attr("class", "b").into()]).unwrap();
        assert_eq!(surface.children(container)[0], button);
        assert_eq!(surface.attribute(button, "class").as_deref(), Some("b"));
        assert_eq!(surface.style(button, "color"), None);
        assert_eq!(surface.dispatch(button, "click"), 0);
    }

    #[test]
    fn test_inner_html_transitions() {
        let (surface, container) = setup();
        let mount = mount(surface.clone(), container, vec![element("div").text("a").into()]).unwrap();
        let div = surface.children(container)[0];

        mount.update(vec![element("div").inner_html("<b>x</b>").into()]).unwrap();
        assert_eq!(surface.render(div), "<div><b>x</b></div>");
        assert!(surface.children(div).is_empty());

        mount.update(vec![element("div").inner_html("<i>y</i>").into()]).unwrap();
        assert_eq!(surface.render(div), "<div><i>y</i></div>");

        mount.update(vec![element("div").text("c").into()]).unwrap();
        assert_eq!(surface.render(div), "<div>c</div>");
        assert_eq!(surface.children(container)[0], div);
    }

    #[test]
    fn test_reentrant_emission_is_deferred() {
        let (surface, container) = setup();
        let items = feed();
        let handle: NodeRef<NodeId> = NodeRef::new();
        let again = items.clone();
        let fired = Rc::new(RefCell::new(false));
        let flag = fired.clone();
        let _sub = handle.stream().subscribe_next(move |(_, mounted)| {
            if mounted && !flag.replace(true) {
                again.next(Some(texts(&["second"])));
            }
        });

        let _mount = mount(surface.clone(), container, vec![Child::Stream(items.stream())]).unwrap();
        items.next(Some(vec![element("p").node_ref(handle.clone()).into()]));
        assert_eq!(surface.render_children(container), "second");
    }
}
