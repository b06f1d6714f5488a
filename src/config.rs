//! Reconciler configuration.

/// Default maximum nesting of elements and stream regions.
const DEFAULT_MAX_DEPTH: usize = 256;

/// Configuration for mount and reconcile passes.
///
/// Depth counts both element nesting and stream-in-stream nesting, so a
/// stream that keeps emitting streams of itself is cut off instead of
/// recursing forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileConfig {
    /// Maximum region depth before mounting fails with `DepthLimit`.
    /// Default: 256
    pub max_depth: usize,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ReconcileConfig {
    /// Create config with a custom depth limit.
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// Config for small widgets (fails fast on runaway nesting).
    pub fn shallow() -> Self {
        Self { max_depth: 32 }
    }

    /// Config for deeply generated trees.
    pub fn deep() -> Self {
        Self { max_depth: 4096 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_presets() {
        assert_eq!(ReconcileConfig::default().max_depth, DEFAULT_MAX_DEPTH);
        assert!(ReconcileConfig::shallow().max_depth < ReconcileConfig::deep().max_depth);
        assert_eq!(ReconcileConfig::new(3).max_depth, 3);
    }
}
