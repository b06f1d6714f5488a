//! Per-node records.

use std::rc::Rc;

use tracing::trace;

use crate::bind::Bindings;
use crate::error::ReconcileResult;
use crate::node::{Node, NodeRef};
use crate::surface::Surface;

use super::Context;
use super::region::{Disposal, Host, Region};

/// What a region keeps for one node it mounted.
pub(crate) struct Record<S: Surface> {
    /// Physical node
    pub(crate) handle: S::Node,
    /// Region owning the element's children; `None` for text and raw markup
    pub(crate) children: Option<Rc<Region<S>>>,
    /// Teardowns of the element's props
    pub(crate) bindings: Bindings<S>,
    /// Lifecycle handle to notify when the node is detached
    pub(crate) node_ref: Option<NodeRef<S::Node>>,
}

impl<S: Surface> Record<S> {
    /// Create the physical node for `node`, bind its props and mount its
    /// children underneath it. The node itself is not attached.
    pub(crate) fn build(ctx: &Rc<Context<S>>, depth: usize, node: &Node<S>) -> ReconcileResult<Self> {
        let elem = match node {
            Node::Text(text) => {
                return Ok(Self {
                    handle: ctx.surface.create_text(&text.content),
                    children: None,
                    bindings: Bindings::default(),
                    node_ref: text.node_ref.clone(),
                });
            }
            Node::Element(elem) => elem,
        };

        let handle = ctx.surface.create_element(&elem.tag);
        let bindings = Bindings::bind(&ctx.surface, &handle, elem);
        trace!(tag = %elem.tag, bindings = bindings.len(), "element created");

        let children = match &elem.inner_html {
            Some(html) => {
                ctx.surface.set_inner_html(&handle, html);
                None
            }
            None => {
                let region = Rc::new(Region::new(Rc::clone(ctx), Host::Container(handle.clone()), depth + 1));
                if let Err(error) = region.apply(elem.children.to_vec()) {
                    region.dispose(Disposal::Discard);
                    bindings.release(&ctx.surface, &handle);
                    return Err(error);
                }
                Some(region)
            }
        };

        Ok(Self {
            handle,
            children,
            bindings,
            node_ref: elem.node_ref.clone(),
        })
    }

    /// Stop everything the node owns. The node is left where it is.
    ///
    /// Refs below the node are told they are detached unless `disposal` is
    /// [`Disposal::Abandon`].
    pub(crate) fn release(self, ctx: &Context<S>, disposal: Disposal) {
        if let Some(children) = self.children {
            let below = match disposal {
                Disposal::Abandon => Disposal::Abandon,
                Disposal::Detach | Disposal::Discard => Disposal::Discard,
            };
            children.dispose(below);
        }
        self.bindings.release(&ctx.surface, &self.handle);
    }

    /// Tell the lifecycle handle, if any, that the node was attached or
    /// detached.
    pub(crate) fn notify(&self, mounted: bool) {
        if let Some(node_ref) = &self.node_ref {
            node_ref.notify(self.handle.clone(), mounted);
        }
    }
}
