//! Property binder
//!
//! Keeps an element's attributes, inline style properties and event
//! listeners in sync with its description. Every bound key owns exactly one
//! teardown in a [`Bindings`] table:
//!
//! - constant: remove the attribute or clear the style property
//! - stream: cancel the subscription
//! - event: detach the listener
//!
//! Binding a key that already has a teardown runs the old one first.

use std::rc::Rc;

use compact_str::CompactString;
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::attr::{Handler, Props, PropsExt, Value};
use crate::node::Element;
use crate::stream::Subscription;
use crate::surface::Surface;

/// Which property map a key belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum PropKind {
    Attribute,
    Style,
    Event,
}

impl PropKind {
    fn apply<S: Surface>(self, surface: &S, node: &S::Node, name: &str, value: &str) {
        match self {
            PropKind::Attribute => surface.set_attribute(node, name, value),
            PropKind::Style => surface.set_style(node, name, value),
            PropKind::Event => {}
        }
    }

    fn clear<S: Surface>(self, surface: &S, node: &S::Node, name: &str) {
        match self {
            PropKind::Attribute => surface.remove_attribute(node, name),
            PropKind::Style => surface.remove_style(node, name),
            PropKind::Event => {}
        }
    }
}

/// Key of one binding.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct BindingKey {
    pub(crate) kind: PropKind,
    pub(crate) name: CompactString,
}

impl BindingKey {
    pub(crate) fn new(kind: PropKind, name: impl Into<CompactString>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}

enum Binding<S: Surface> {
    Const,
    Stream(Subscription),
    Listener(S::Listener),
}

/// Teardown table of one mounted element.
pub(crate) struct Bindings<S: Surface> {
    entries: FxHashMap<BindingKey, Binding<S>>,
}

impl<S: Surface> Default for Bindings<S> {
    fn default() -> Self {
        Self {
            entries: FxHashMap::default(),
        }
    }
}

impl<S: Surface> Bindings<S> {
    /// Apply every attribute, style property and event of `elem` to `node`.
    pub(crate) fn bind(surface: &Rc<S>, node: &S::Node, elem: &Element<S>) -> Self {
        let mut bindings = Self::default();
        bindings.bind_props(surface, node, PropKind::Attribute, &elem.attrs);
        bindings.bind_props(surface, node, PropKind::Style, &elem.style);
        for (name, handler) in &elem.events {
            bindings.bind_listener(surface, node, name, handler);
        }
        bindings
    }

    /// Number of live bindings.
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    fn bind_props(&mut self, surface: &Rc<S>, node: &S::Node, kind: PropKind, props: &Props) {
        for (name, value) in props {
            self.bind_value(surface, node, kind, name, value);
        }
    }

    fn bind_value(
        &mut self,
        surface: &Rc<S>,
        node: &S::Node,
        kind: PropKind,
        name: &CompactString,
        value: &Value<String>,
    ) {
        let key = BindingKey::new(kind, name.clone());
        self.teardown(surface, node, &key, false);

        let binding = match value {
            Value::Const(value) => {
                kind.apply(&**surface, node, name, value);
                Binding::Const
            }
            Value::Stream(stream) => {
                let surface = Rc::clone(surface);
                let node = node.clone();
                let name = name.clone();
                let subscription = stream.distinct().subscribe_next(move |value: String| {
                    trace!(?kind, %name, %value, "streamed property");
                    kind.apply(&*surface, &node, &name, &value);
                });
                Binding::Stream(subscription)
            }
        };
        self.entries.insert(key, binding);
    }

    fn bind_listener(&mut self, surface: &Rc<S>, node: &S::Node, name: &CompactString, handler: &Handler<S::Event>) {
        let key = BindingKey::new(PropKind::Event, name.clone());
        self.teardown(surface, node, &key, false);

        let listener = surface.add_listener(node, name, Rc::clone(handler));
        self.entries.insert(key, Binding::Listener(listener));
    }

    /// Run and discard the teardown of every key in `keys`. The keys leave
    /// the node for good, so streamed values are cleared as well.
    pub(crate) fn unbind<'a>(&mut self, surface: &Rc<S>, node: &S::Node, keys: impl IntoIterator<Item = &'a BindingKey>) {
        for key in keys {
            self.teardown(surface, node, key, true);
        }
    }

    /// Undo the binding under `key`. A stream that is about to be replaced
    /// (`dropped == false`) is only cancelled; the next value overwrites
    /// whatever it left behind.
    fn teardown(&mut self, surface: &Rc<S>, node: &S::Node, key: &BindingKey, dropped: bool) {
        let Some(binding) = self.entries.remove(key) else {
            return;
        };
        match binding {
            Binding::Const => key.kind.clear(&**surface, node, &key.name),
            Binding::Stream(subscription) => {
                subscription.cancel();
                if dropped {
                    key.kind.clear(&**surface, node, &key.name);
                }
            }
            Binding::Listener(listener) => surface.remove_listener(node, &key.name, listener),
        }
    }

    /// Diff `prev` against `next` and update only what changed.
    ///
    /// Unchanged constants and identical handlers are left alone. Keys that
    /// vanished are unbound and cleared first. Changed keys are torn down
    /// right before their new value is applied. Streamed keys are always
    /// re-subscribed.
    pub(crate) fn rebind(&mut self, surface: &Rc<S>, node: &S::Node, prev: &Element<S>, next: &Element<S>) {
        for (kind, prev_props, next_props) in [
            (PropKind::Attribute, &prev.attrs, &next.attrs),
            (PropKind::Style, &prev.style, &next.style),
        ] {
            let unchanged = |name: &str| match (prev_props.get_prop(name), next_props.get_prop(name)) {
                (Some(Value::Const(a)), Some(Value::Const(b))) => a == b,
                _ => false,
            };

            let stale: Vec<BindingKey> = prev_props
                .iter()
                .filter(|(name, _)| !next_props.has_prop(name))
                .map(|(name, _)| BindingKey::new(kind, name.clone()))
                .collect();
            self.unbind(surface, node, &stale);

            for (name, value) in next_props {
                if !unchanged(name.as_str()) {
                    self.bind_value(surface, node, kind, name, value);
                }
            }
        }

        let same_handler = |name: &str| {
            let prev = prev.events.iter().find(|(k, _)| k == name);
            let next = next.events.iter().find(|(k, _)| k == name);
            matches!((prev, next), (Some((_, a)), Some((_, b))) if Rc::ptr_eq(a, b))
        };
        let stale: Vec<BindingKey> = prev
            .events
            .iter()
            .filter(|(name, _)| !next.events.iter().any(|(k, _)| k == name))
            .map(|(name, _)| BindingKey::new(PropKind::Event, name.clone()))
            .collect();
        self.unbind(surface, node, &stale);

        for (name, handler) in &next.events {
            if !same_handler(name.as_str()) {
                self.bind_listener(surface, node, name, handler);
            }
        }
    }

    /// Cancel subscriptions and detach listeners of a node that is going
    /// away. Constant attributes and styles are left on the node.
    pub(crate) fn release(self, surface: &Rc<S>, node: &S::Node) {
        for (key, binding) in self.entries {
            match binding {
                Binding::Const => {}
                Binding::Stream(subscription) => subscription.cancel(),
                Binding::Listener(listener) => surface.remove_listener(node, &key.name, listener),
            }
        }
    }
}
