//! Browser DOM surface (feature `web`).

use tracing::{trace, warn};
use wasm_bindgen::{JsCast, closure::Closure};

use crate::attr::Handler;

use super::Surface;

/// [`Surface`] over the browser DOM.
///
/// DOM calls that throw are logged at `warn` and otherwise ignored.
#[derive(Debug, Clone)]
pub struct WebSurface {
    document: web_sys::Document,
}

impl WebSurface {
    /// Surface over the current window's document.
    pub fn new() -> Option<Self> {
        let document = web_sys::window()?.document()?;
        Some(Self { document })
    }

    /// Surface over a specific document.
    pub fn from_document(document: web_sys::Document) -> Self {
        Self { document }
    }

    /// The underlying document.
    pub fn document(&self) -> &web_sys::Document {
        &self.document
    }
}

fn as_element<'a>(node: &'a web_sys::Node, op: &str) -> Option<&'a web_sys::Element> {
    let element = node.dyn_ref::<web_sys::Element>();
    if element.is_none() {
        warn!("{op}: expected an element but found {:?}", node);
    }
    element
}

fn as_html_element<'a>(node: &'a web_sys::Node, op: &str) -> Option<&'a web_sys::HtmlElement> {
    let element = node.dyn_ref::<web_sys::HtmlElement>();
    if element.is_none() {
        warn!("{op}: expected an HTML element but found {:?}", node);
    }
    element
}

impl Surface for WebSurface {
    type Node = web_sys::Node;
    type Event = web_sys::Event;
    type Listener = Closure<dyn Fn(web_sys::Event)>;

    fn create_text(&self, content: &str) -> web_sys::Node {
        self.document.create_text_node(content).into()
    }

    fn create_element(&self, tag: &str) -> web_sys::Node {
        match self.document.create_element(tag) {
            Ok(element) => element.into(),
            Err(err) => {
                warn!("create_element <{tag}> failed: {:?}; using a comment placeholder", err);
                self.document.create_comment(tag).into()
            }
        }
    }

    fn insert_before(&self, parent: &web_sys::Node, child: &web_sys::Node, reference: Option<&web_sys::Node>) {
        trace!("insert_before");
        if let Err(err) = parent.insert_before(child, reference) {
            warn!("insert_before failed: {:?}", err);
        }
    }

    fn remove_child(&self, parent: &web_sys::Node, child: &web_sys::Node) {
        trace!("remove_child");
        if let Err(err) = parent.remove_child(child) {
            warn!("remove_child failed: {:?}", err);
        }
    }

    fn child_at(&self, parent: &web_sys::Node, index: usize) -> Option<web_sys::Node> {
        let index = u32::try_from(index).ok()?;
        parent.child_nodes().item(index)
    }

    fn set_text(&self, node: &web_sys::Node, content: &str) {
        node.set_text_content(Some(content));
    }

    fn set_attribute(&self, node: &web_sys::Node, name: &str, value: &str) {
        if let Some(element) = as_element(node, "set_attribute") {
            if let Err(err) = element.set_attribute(name, value) {
                warn!("set_attribute {name:?} failed: {:?}", err);
            }
        }
    }

    fn remove_attribute(&self, node: &web_sys::Node, name: &str) {
        if let Some(element) = as_element(node, "remove_attribute") {
            if let Err(err) = element.remove_attribute(name) {
                warn!("remove_attribute {name:?} failed: {:?}", err);
            }
        }
    }

    fn set_style(&self, node: &web_sys::Node, name: &str, value: &str) {
        if let Some(element) = as_html_element(node, "set_style") {
            if let Err(err) = element.style().set_property(name, value) {
                warn!("set_style {name:?} failed: {:?}", err);
            }
        }
    }

    fn remove_style(&self, node: &web_sys::Node, name: &str) {
        if let Some(element) = as_html_element(node, "remove_style") {
            if let Err(err) = element.style().remove_property(name) {
                warn!("remove_style {name:?} failed: {:?}", err);
            }
        }
    }

    fn set_inner_html(&self, node: &web_sys::Node, html: &str) {
        if let Some(element) = as_element(node, "set_inner_html") {
            element.set_inner_html(html);
        }
    }

    fn add_listener(&self, node: &web_sys::Node, event: &str, handler: Handler<web_sys::Event>) -> Self::Listener {
        let closure = Closure::<dyn Fn(web_sys::Event)>::new(move |e: web_sys::Event| handler(&e));
        if let Err(err) = node.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref()) {
            warn!("add_listener {event:?} failed: {:?}", err);
        }
        closure
    }

    fn remove_listener(&self, node: &web_sys::Node, event: &str, listener: Self::Listener) {
        if let Err(err) = node.remove_event_listener_with_callback(event, listener.as_ref().unchecked_ref()) {
            warn!("remove_listener {event:?} failed: {:?}", err);
        }
    }
}
