//! Algorithm implementations for reconciliation.
//!
//! - `diff`: static child-list classification

mod diff;

pub use diff::{DiffStats, IndexSet, ListDiff, Verdict, classify, diff_children};
