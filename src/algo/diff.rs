//! Static child-list diff
//!
//! Classifies each index of two child lists. This is a **pure algorithm
//! module**: it never touches a surface or a region.
//!
//! # Algorithm
//!
//! For every index below the shorter length:
//!
//! | prev \ next        | stream  | text        | element             |
//! |--------------------|---------|-------------|---------------------|
//! | stream             | replace | addition    | addition            |
//! | text               | replace | text-update / unchanged | replace |
//! | element            | replace | replace     | recurse / replace (tag) |
//!
//! Indices only in `next` are additions, indices only in `prev` are
//! removals. A replace is reported as a removal plus an addition at the same
//! index.
//!
//! A stream is never compared structurally: the caller cancels every
//! dynamic region of the list before applying the diff, so its previous
//! content is already gone.
//!
//! # Complexity
//!
//! - Time: O(max(n, m))
//! - Space: O(max(n, m)) for the index sets

use smallvec::SmallVec;

use crate::node::{Child, Node};
use crate::surface::Surface;

/// Index set of one verdict kind, ascending.
pub type IndexSet = SmallVec<[usize; 8]>;

/// Classification of one index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    /// Identical text; nothing to do
    Unchanged,
    /// Text payload changed; update in place
    TextUpdate,
    /// Same-tag elements; rebind and reconcile children
    Recurse,
    /// Remove the old occupant, mount the new item
    Replace,
    /// Mount the new item; nothing physical to remove
    Addition,
    /// Remove the old occupant; nothing to mount
    Removal,
}

/// Classify one index from its previous and next occupants.
///
/// Returns `None` when both sides are absent.
pub fn classify<S: Surface>(prev: Option<&Child<S>>, next: Option<&Child<S>>) -> Option<Verdict> {
    let verdict = match (prev, next) {
        (None, None) => return None,
        (None, Some(_)) => Verdict::Addition,
        (Some(_), None) => Verdict::Removal,
        (Some(_), Some(Child::Stream(_))) => Verdict::Replace,
        (Some(Child::Stream(_)), Some(Child::Node(_))) => Verdict::Addition,
        (Some(Child::Node(prev)), Some(Child::Node(next))) => match (prev, next) {
            (Node::Text(a), Node::Text(b)) if a.content == b.content => Verdict::Unchanged,
            (Node::Text(_), Node::Text(_)) => Verdict::TextUpdate,
            (Node::Element(a), Node::Element(b)) if a.tag == b.tag => Verdict::Recurse,
            _ => Verdict::Replace,
        },
    };
    Some(verdict)
}

/// Statistics from a diff
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct DiffStats {
    /// Number of indices present on both sides
    pub compared: usize,
    /// Number of indices left untouched
    pub unchanged: usize,
    /// Number of replaced occupants
    pub replaced: usize,
    /// Number of text updates
    pub text_updates: usize,
    /// Number of element recursions
    pub recursions: usize,
    /// Number of pure additions (trailing, or after a stream)
    pub additions: usize,
    /// Number of pure removals (trailing)
    pub removals: usize,
}

impl DiffStats {
    /// Whether anything besides recursion has to happen.
    pub fn has_changes(&self) -> bool {
        self.replaced + self.text_updates + self.additions + self.removals > 0
    }
}

/// Result of diffing two child lists.
///
/// The four index sets are pairwise disjoint except that a replaced index
/// appears in both `removals` and `additions`. Apply removals before
/// additions.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[must_use]
pub struct ListDiff {
    /// Indices whose previous occupant must be removed
    pub removals: IndexSet,
    /// Indices whose next item must be mounted
    pub additions: IndexSet,
    /// Indices whose text payload changed
    pub text_updates: IndexSet,
    /// Indices holding same-tag elements on both sides
    pub recursions: IndexSet,
    /// Statistics about the diff
    pub stats: DiffStats,
}

/// Diff two child lists.
pub fn diff_children<S: Surface>(prev: &[Child<S>], next: &[Child<S>]) -> ListDiff {
    let mut diff = ListDiff::default();
    diff.stats.compared = prev.len().min(next.len());

    for index in 0..prev.len().max(next.len()) {
        let Some(verdict) = classify(prev.get(index), next.get(index)) else {
            continue;
        };
        match verdict {
            Verdict::Unchanged => diff.stats.unchanged += 1,
            Verdict::TextUpdate => {
                diff.text_updates.push(index);
                diff.stats.text_updates += 1;
            }
            Verdict::Recurse => {
                diff.recursions.push(index);
                diff.stats.recursions += 1;
            }
            Verdict::Replace => {
                diff.removals.push(index);
                diff.additions.push(index);
                diff.stats.replaced += 1;
            }
            Verdict::Addition => {
                diff.additions.push(index);
                diff.stats.additions += 1;
            }
            Verdict::Removal => {
                diff.removals.push(index);
                diff.stats.removals += 1;
            }
        }
    }

    diff
}

// =============================================================================
// Tests
// =============================================================================
