//! Property values for elements
//!
//! Attributes and style properties are ordered `(name, value)` lists where
//! each value is either a constant or a stream of strings. Event handlers
//! live in their own list and compare by reference identity.

use std::fmt;
use std::rc::Rc;

use compact_str::CompactString;

use crate::stream::Stream;

/// Key prefix that routes a prop to the event map (`onclick` -> `click`).
pub const EVENT_PREFIX: &str = "on";

/// Event callback. Two handlers are the same binding only if they share an `Rc`.
pub type Handler<E> = Rc<dyn Fn(&E)>;

/// Element attributes or style properties, in declaration order
pub type Props = Vec<(CompactString, Value<String>)>;

/// Element event listeners, in declaration order
pub type Events<E> = Vec<(CompactString, Handler<E>)>;

// =============================================================================
// Value
// =============================================================================

/// A property value: fixed, or driven by a stream.
pub enum Value<T> {
    /// Applied once
    Const(T),
    /// Applied on every distinct emission
    Stream(Stream<T>),
}

impl<T> Value<T> {
    /// Get the constant, if this is one
    pub fn as_const(&self) -> Option<&T> {
        match self {
            Self::Const(value) => Some(value),
            Self::Stream(_) => None,
        }
    }

    /// Get the stream, if this is one
    pub fn as_stream(&self) -> Option<&Stream<T>> {
        match self {
            Self::Const(_) => None,
            Self::Stream(stream) => Some(stream),
        }
    }

    /// Check if this value is stream-driven
    pub fn is_stream(&self) -> bool {
        matches!(self, Self::Stream(_))
    }
}

impl<T: Clone> Clone for Value<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Const(value) => Self::Const(value.clone()),
            Self::Stream(stream) => Self::Stream(stream.clone()),
        }
    }
}

/// Constants compare by value, streams by identity.
impl<T: PartialEq + 'static> PartialEq for Value<T> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Const(a), Self::Const(b)) => a == b,
            (Self::Stream(a), Self::Stream(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Value<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Const(value) => f.debug_tuple("Const").field(value).finish(),
            Self::Stream(stream) => f.debug_tuple("Stream").field(stream).finish(),
        }
    }
}

impl From<&str> for Value<String> {
    fn from(value: &str) -> Self {
        Self::Const(value.to_owned())
    }
}

impl From<String> for Value<String> {
    fn from(value: String) -> Self {
        Self::Const(value)
    }
}

impl<T> From<Stream<T>> for Value<T> {
    fn from(stream: Stream<T>) -> Self {
        Self::Stream(stream)
    }
}

// =============================================================================
// Props helpers
// =============================================================================

/// Extension trait for lookups on [`Props`]
pub trait PropsExt {
    /// Get a property value by name
    fn get_prop(&self, name: &str) -> Option<&Value<String>>;

    /// Get a constant property value by name
    fn get_const(&self, name: &str) -> Option<&str>;

    /// Check if a property exists
    fn has_prop(&self, name: &str) -> bool;

    /// Set a property value (insert or update in place)
    fn set_prop(&mut self, name: impl Into<CompactString>, value: Value<String>);

    /// Remove a property by name, returning the old value if present
    fn remove_prop(&mut self, name: &str) -> Option<Value<String>>;
}

impl PropsExt for Props {
    fn get_prop(&self, name: &str) -> Option<&Value<String>> {
        self.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    fn get_const(&self, name: &str) -> Option<&str> {
        self.get_prop(name)
            .and_then(Value::as_const)
            .map(String::as_str)
    }

    fn has_prop(&self, name: &str) -> bool {
        self.iter().any(|(k, _)| k == name)
    }

    fn set_prop(&mut self, name: impl Into<CompactString>, value: Value<String>) {
        let name = name.into();
        if let Some(prop) = self.iter_mut().find(|(k, _)| *k == name) {
            prop.1 = value;
        } else {
            self.push((name, value));
        }
    }

    fn remove_prop(&mut self, name: &str) -> Option<Value<String>> {
        self.iter()
            .position(|(k, _)| k == name)
            .map(|pos| self.remove(pos).1)
    }
}

/// Event name for a prop key with the event prefix (`onclick` -> `click`).
///
/// Returns `None` for keys that are not event keys, including the bare prefix.
pub fn event_name(key: &str) -> Option<&str> {
    key.strip_prefix(EVENT_PREFIX).filter(|name| !name.is_empty())
}

// =============================================================================
// Tests
// =============================================================================
