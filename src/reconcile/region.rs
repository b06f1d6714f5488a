//! Regions and hosts.
//!
//! A region owns the physical nodes of one child list. It addresses them by
//! `(space, position)` and translates to a physical index on demand:
//!
//! ```text
//! index(S, P) = Σ occupied(space) for space < S  +  rank_S(P)
//! ```
//!
//! The translation is recomputed on every use, so no stored index can go
//! stale when an earlier space grows or shrinks.
//!
//! A region hands its physical operations to a [`Host`]. The root region and
//! element children use the container itself; a region nested under a stream
//! item forwards to its parent region, which mirrors the node in that item's
//! space and forwards again with its own index offset.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use tracing::{trace, warn};

use crate::error::{ReconcileError, ReconcileResult, StreamError};
use crate::node::ChildList;
use crate::stream::{Observer, Subscription};
use crate::surface::Surface;

use super::Context;
use super::space::{Slot, Space};

// =============================================================================
// Host
// =============================================================================

/// Where a region's physical operations land.
pub(crate) enum Host<S: Surface> {
    /// Directly under a physical node
    Container(S::Node),
    /// Inside one space of a parent region
    Space {
        parent: Weak<Region<S>>,
        space: usize,
    },
}

impl<S: Surface> Host<S> {
    /// Attach `node` so that it ends up at physical index `at`.
    pub(crate) fn insert(&self, ctx: &Context<S>, node: &S::Node, at: usize) -> ReconcileResult<()> {
        match self {
            Host::Container(container) => {
                let reference = ctx.surface.child_at(container, at);
                ctx.surface.insert_before(container, node, reference.as_ref());
                Ok(())
            }
            Host::Space { parent, space } => {
                let parent = parent.upgrade().ok_or(ReconcileError::Detached)?;
                parent.mirror_insert(*space, at, node)
            }
        }
    }

    /// Detach `node`, currently at physical index `at`.
    pub(crate) fn remove(&self, ctx: &Context<S>, node: &S::Node, at: usize) -> ReconcileResult<()> {
        match self {
            Host::Container(container) => {
                ctx.surface.remove_child(container, node);
                Ok(())
            }
            Host::Space { parent, space } => {
                let parent = parent.upgrade().ok_or(ReconcileError::Detached)?;
                parent.mirror_remove(*space, at, node)
            }
        }
    }
}

/// What [`Region::dispose`] does with the physical nodes it owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Disposal {
    /// Remove every node from its host, last first
    Detach,
    /// Leave nodes to an ancestor that is removing or overwriting them;
    /// refs are told they are detached
    Discard,
    /// Leave nodes attached and refs untouched; only subscriptions and
    /// listeners go
    Abandon,
}

// =============================================================================
// Region
// =============================================================================

pub(crate) struct Region<S: Surface> {
    pub(crate) ctx: Rc<Context<S>>,
    pub(crate) host: Host<S>,
    pub(crate) depth: usize,
    pub(crate) state: RefCell<RegionState<S>>,
}

pub(crate) struct RegionState<S: Surface> {
    /// Spaces keyed by logical item index
    pub(crate) spaces: BTreeMap<usize, Space<S>>,
    /// The list currently rendered
    pub(crate) items: ChildList<S>,
    /// Regions of stream items, keyed by logical item index
    pub(crate) nested: BTreeMap<usize, Rc<Region<S>>>,
    /// Subscription feeding this region, for stream-backed regions
    pub(crate) subscription: Option<Subscription>,
    /// Whether a first list has been mounted
    pub(crate) mounted: bool,
    /// Set once the region is disposed or halted
    pub(crate) stopped: bool,
    /// Set while a list is being applied
    pub(crate) busy: bool,
    /// Latest list received while busy
    pub(crate) pending: Option<ChildList<S>>,
}

impl<S: Surface> RegionState<S> {
    /// Physical index of `(space, position)` relative to the region start.
    pub(crate) fn index_of(&self, space: usize, position: usize) -> usize {
        let before: usize = self.spaces.range(..space).map(|(_, s)| s.occupied()).sum();
        before + self.spaces.get(&space).map_or(0, |s| s.rank(position))
    }

    /// Number of physical nodes the region currently exposes.
    pub(crate) fn width(&self) -> usize {
        self.spaces.values().map(Space::occupied).sum()
    }

    /// Remove the last occupied slot, returning it with its physical index.
    fn pop_last(&mut self) -> Option<(Slot<S>, usize)> {
        let (space, position) = self
            .spaces
            .iter()
            .rev()
            .find_map(|(&key, space)| space.last_occupied().map(|position| (key, position)))?;
        let at = self.index_of(space, position);
        let slot = self.spaces.get_mut(&space)?.remove(position)?;
        Some((slot, at))
    }
}

impl<S: Surface> Region<S> {
    pub(crate) fn new(ctx: Rc<Context<S>>, host: Host<S>, depth: usize) -> Self {
        Self {
            ctx,
            host,
            depth,
            state: RefCell::new(RegionState {
                spaces: BTreeMap::new(),
                items: Vec::new(),
                nested: BTreeMap::new(),
                subscription: None,
                mounted: false,
                stopped: false,
                busy: false,
                pending: None,
            }),
        }
    }

    pub(crate) fn width(&self) -> usize {
        self.state.borrow().width()
    }

    pub(crate) fn is_stopped(&self) -> bool {
        self.state.borrow().stopped
    }

    /// Physical handles in order, for inspection.
    pub(crate) fn handles(&self) -> Vec<S::Node> {
        let state = self.state.borrow();
        state.spaces.values().flat_map(Space::handles).cloned().collect()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mirrors
    // ─────────────────────────────────────────────────────────────────────────

    /// A nested region attached `node` at `at` within `space`.
    pub(crate) fn mirror_insert(&self, space: usize, at: usize, node: &S::Node) -> ReconcileResult<()> {
        let index = {
            let mut state = self.state.borrow_mut();
            let target = state.spaces.get_mut(&space).ok_or(ReconcileError::Detached)?;
            target.insert(at, Slot::Mirror(node.clone()));
            state.index_of(space, at)
        };
        trace!(space, at, index, "mirror insert");
        self.host.insert(&self.ctx, node, index)
    }

    /// A nested region detached `node` from `at` within `space`.
    pub(crate) fn mirror_remove(&self, space: usize, at: usize, node: &S::Node) -> ReconcileResult<()> {
        let index = {
            let mut state = self.state.borrow_mut();
            let index = state.index_of(space, at);
            let target = state.spaces.get_mut(&space).ok_or(ReconcileError::Detached)?;
            target.remove(at);
            index
        };
        trace!(space, at, index, "mirror remove");
        self.host.remove(&self.ctx, node, index)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Keep the subscription feeding this region; cancel it right away if
    /// the region already stopped.
    pub(crate) fn track(&self, subscription: Subscription) {
        let stopped = {
            let mut state = self.state.borrow_mut();
            if !state.stopped {
                state.subscription = Some(subscription.clone());
            }
            state.stopped
        };
        if stopped {
            subscription.cancel();
        }
    }

    /// Stop the region after a fatal error. What is mounted stays mounted.
    pub(crate) fn halt(&self, error: ReconcileError) {
        let subscription = {
            let mut state = self.state.borrow_mut();
            if state.stopped {
                return;
            }
            state.stopped = true;
            state.subscription.take()
        };
        if let Some(subscription) = subscription {
            subscription.cancel();
        }
        self.ctx.report(error);
    }

    /// Cancel the region and everything below it. See [`Disposal`] for what
    /// happens to the physical nodes.
    pub(crate) fn dispose(&self, disposal: Disposal) {
        let (subscription, nested) = {
            let mut state = self.state.borrow_mut();
            state.stopped = true;
            state.pending = None;
            (state.subscription.take(), std::mem::take(&mut state.nested))
        };
        if let Some(subscription) = subscription {
            subscription.cancel();
        }
        for (_, region) in nested.into_iter().rev() {
            region.dispose(disposal);
        }

        if disposal == Disposal::Detach {
            loop {
                let popped = self.state.borrow_mut().pop_last();
                let Some((slot, at)) = popped else {
                    break;
                };
                let Some(handle) = slot.handle().cloned() else {
                    continue;
                };
                if let Err(error) = self.host.remove(&self.ctx, &handle, at) {
                    warn!(%error, at, "failed to detach node during disposal");
                    self.ctx.report(error);
                }
                if let Slot::Mounted(record) = slot {
                    record.notify(false);
                    record.release(&self.ctx, Disposal::Discard);
                }
            }
        } else {
            let spaces = std::mem::take(&mut self.state.borrow_mut().spaces);
            for (_, mut space) in spaces {
                for slot in space.drain() {
                    if let Slot::Mounted(record) = slot {
                        if disposal == Disposal::Discard {
                            record.notify(false);
                        }
                        record.release(&self.ctx, disposal);
                    }
                }
            }
        }

        self.state.borrow_mut().items.clear();
    }
}

// =============================================================================
// RegionObserver
// =============================================================================

/// Feeds the lists a stream item emits into its nested region.
pub(crate) struct RegionObserver<S: Surface> {
    region: Weak<Region<S>>,
}

impl<S: Surface> RegionObserver<S> {
    pub(crate) fn new(region: &Rc<Region<S>>) -> Self {
        Self {
            region: Rc::downgrade(region),
        }
    }
}

impl<S: Surface> Observer<Option<ChildList<S>>> for RegionObserver<S> {
    fn open(&mut self) {
        trace!("dynamic region subscribed");
    }

    fn next(&mut self, items: Option<ChildList<S>>) {
        let Some(region) = self.region.upgrade() else {
            return;
        };
        if region.is_stopped() {
            return;
        }
        if let Err(error) = region.apply(items.unwrap_or_default()) {
            region.halt(error);
        }
    }

    fn fail(&mut self, error: StreamError) {
        if let Some(region) = self.region.upgrade() {
            region.halt(error.into());
        }
    }

    fn done(&mut self) {
        trace!("dynamic region source completed");
    }
}
