//! Error types for tola-reconciler.
//!
//! Every failure is fatal for the mount or region that raised it: there is no
//! partial recovery inside the reconciler.

use compact_str::CompactString;
use thiserror::Error;

/// Failure signalled by an upstream stream through `Observer::fail`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct StreamError {
    message: String,
}

impl StreamError {
    /// Create a stream error with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors that can occur while building, mounting or reconciling a tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    /// A prop whose value kind does not fit its key
    #[error("malformed node: `{key}` {reason}")]
    MalformedNode {
        /// Offending prop key
        key: CompactString,
        /// What was expected under that key
        reason: &'static str,
    },

    /// The stream feeding a dynamic region failed
    #[error("stream failed: {0}")]
    Stream(#[from] StreamError),

    /// Element or region nesting went past `ReconcileConfig::max_depth`
    #[error("tree depth limit of {limit} exceeded")]
    DepthLimit {
        /// Configured limit
        limit: usize,
    },

    /// A nested region outlived the region that hosts it
    #[error("region is detached from its parent region")]
    Detached,
}

/// Result type alias for reconciler operations.
pub type ReconcileResult<T> = Result<T, ReconcileError>;

impl ReconcileError {
    /// Create a malformed-node error for a prop key.
    pub fn malformed(key: impl Into<CompactString>, reason: &'static str) -> Self {
        Self::MalformedNode {
            key: key.into(),
            reason,
        }
    }

    /// Whether this error came from an upstream stream.
    pub fn is_stream(&self) -> bool {
        matches!(self, Self::Stream(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ReconcileError::malformed("onclick", "expects an event handler");
        assert_eq!(err.to_string(), "malformed node: `onclick` expects an event handler");

        let err = ReconcileError::DepthLimit { limit: 8 };
        assert_eq!(err.to_string(), "tree depth limit of 8 exceeded");

        let err: ReconcileError = StreamError::new("socket closed").into();
        assert_eq!(err.to_string(), "stream failed: socket closed");
        assert!(err.is_stream());
    }

    #[test]
    fn test_error_is_send_sync() {
        static_assertions::assert_impl_all!(ReconcileError: Send, Sync, Clone);
        static_assertions::assert_impl_all!(StreamError: Send, Sync, Clone);
    }
}
