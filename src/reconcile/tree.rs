//! Mount and reconcile passes of a region.
//!
//! # Pass order
//!
//! 1. Cancel every dynamic region of the previous list
//! 2. Diff the previous list against the next one
//! 3. Removals, highest index first
//! 4. Text updates
//! 5. Element recursions (rebind props, reconcile children)
//! 6. Additions, lowest index first
//!
//! Indices are never cached across steps: each physical operation computes
//! its index from the space map at the moment it runs.

use std::rc::Rc;

use tracing::{debug, trace};

use crate::algo::diff_children;
use crate::error::{ReconcileError, ReconcileResult};
use crate::node::{Child, ChildList, ChildStream, Element};
use crate::surface::Surface;

use super::record::Record;
use super::region::{Disposal, Host, Region, RegionObserver};
use super::space::{Slot, Space};

impl<S: Surface> Region<S> {
    /// Render `items`: mount on the first call, reconcile afterwards.
    ///
    /// A list that arrives while the region is still applying the previous
    /// one is held back and applied once that pass is over.
    pub(crate) fn apply(self: &Rc<Self>, items: ChildList<S>) -> ReconcileResult<()> {
        {
            let mut state = self.state.borrow_mut();
            if state.busy {
                trace!(depth = self.depth, "deferring re-entrant update");
                state.pending = Some(items);
                return Ok(());
            }
            state.busy = true;
        }

        let mut items = items;
        loop {
            let first = !std::mem::replace(&mut self.state.borrow_mut().mounted, true);
            let result = if first {
                let result = self.mount_list(&items);
                self.state.borrow_mut().items = items;
                result
            } else {
                self.reconcile(items)
            };

            let pending = {
                let mut state = self.state.borrow_mut();
                let stopped = state.stopped;
                let pending = state.pending.take().filter(|_| result.is_ok() && !stopped);
                if pending.is_none() {
                    state.busy = false;
                }
                pending
            };
            match pending {
                Some(next) => items = next,
                None => return result,
            }
        }
    }

    /// Mount every item of a fresh list.
    fn mount_list(self: &Rc<Self>, items: &[Child<S>]) -> ReconcileResult<()> {
        let limit = self.ctx.config.max_depth;
        if self.depth > limit {
            return Err(ReconcileError::DepthLimit { limit });
        }
        for (index, item) in items.iter().enumerate() {
            self.mount_at(index, item)?;
        }
        Ok(())
    }

    /// Mount one item into the space of logical index `index`.
    pub(crate) fn mount_at(self: &Rc<Self>, index: usize, item: &Child<S>) -> ReconcileResult<()> {
        let node = match item {
            Child::Node(node) => node,
            Child::Stream(stream) => return self.attach_stream(index, stream),
        };

        let record = Record::build(&self.ctx, self.depth, node)?;
        let handle = record.handle.clone();
        let node_ref = record.node_ref.clone();
        let at = {
            let mut state = self.state.borrow_mut();
            state.spaces.entry(index).or_default().insert(0, Slot::Mounted(record));
            state.index_of(index, 0)
        };

        trace!(depth = self.depth, index, at, "mount");
        self.host.insert(&self.ctx, &handle, at)?;
        if let Some(node_ref) = node_ref {
            node_ref.notify(handle, true);
        }
        Ok(())
    }

    /// Give the stream item at `index` a nested region and subscribe it.
    fn attach_stream(self: &Rc<Self>, index: usize, stream: &ChildStream<S>) -> ReconcileResult<()> {
        let previous = self.state.borrow_mut().nested.remove(&index);
        if let Some(previous) = previous {
            previous.dispose(Disposal::Detach);
        }

        let limit = self.ctx.config.max_depth;
        if self.depth + 1 > limit {
            return Err(ReconcileError::DepthLimit { limit });
        }

        let host = Host::Space {
            parent: Rc::downgrade(self),
            space: index,
        };
        let region = Rc::new(Region::new(Rc::clone(&self.ctx), host, self.depth + 1));
        {
            let mut state = self.state.borrow_mut();
            state.spaces.insert(index, Space::default());
            state.nested.insert(index, Rc::clone(&region));
        }

        trace!(depth = self.depth, index, "attach dynamic region");
        let subscription = stream.subscribe(RegionObserver::new(&region));
        region.track(subscription);
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Reconcile
    // ─────────────────────────────────────────────────────────────────────────

    /// Bring the mounted list in line with `next`.
    fn reconcile(self: &Rc<Self>, next: ChildList<S>) -> ReconcileResult<()> {
        let prev = std::mem::take(&mut self.state.borrow_mut().items);
        self.release_streams();

        let diff = diff_children(&prev, &next);
        debug!(depth = self.depth, stats = ?diff.stats, "reconcile");

        let mut first_error = None;
        let mut keep = |result: ReconcileResult<()>| {
            if let Err(error) = result {
                first_error.get_or_insert(error);
            }
        };

        for &index in diff.removals.iter().rev() {
            keep(self.remove_at(index, index >= next.len()));
        }
        for &index in &diff.text_updates {
            if let Some(text) = next[index].as_text() {
                self.set_text(index, &text.content);
            }
        }
        for &index in &diff.recursions {
            if let (Some(prev), Some(next)) = (prev[index].as_element(), next[index].as_element()) {
                keep(self.patch_element(index, prev, next));
            }
        }
        for &index in &diff.additions {
            keep(self.mount_at(index, &next[index]));
        }

        self.state.borrow_mut().items = next;
        first_error.map_or(Ok(()), Err)
    }

    /// Cancel and detach every dynamic region, last first.
    fn release_streams(&self) {
        let nested = std::mem::take(&mut self.state.borrow_mut().nested);
        for (index, region) in nested.into_iter().rev() {
            trace!(depth = self.depth, index, "release dynamic region");
            region.dispose(Disposal::Detach);
        }
    }

    /// Detach the node mounted for `index`.
    ///
    /// With `free` the whole space goes away; otherwise the position is kept
    /// as a tombstone for the item that replaces it.
    pub(crate) fn remove_at(&self, index: usize, free: bool) -> ReconcileResult<()> {
        let removed = {
            let mut state = self.state.borrow_mut();
            let at = state.index_of(index, 0);
            let slot = state.spaces.get_mut(&index).and_then(|space| space.tombstone(0));
            if free {
                state.spaces.remove(&index);
            }
            slot.map(|slot| (slot, at))
        };
        let Some((slot, at)) = removed else {
            return Ok(());
        };

        trace!(depth = self.depth, index, at, free, "remove");
        match slot {
            Slot::Mounted(record) => {
                let result = self.host.remove(&self.ctx, &record.handle, at);
                record.notify(false);
                record.release(&self.ctx, Disposal::Discard);
                result
            }
            Slot::Mirror(node) => self.host.remove(&self.ctx, &node, at),
            Slot::Tombstone => Ok(()),
        }
    }

    fn set_text(&self, index: usize, content: &str) {
        let handle = {
            let state = self.state.borrow();
            state
                .spaces
                .get(&index)
                .and_then(|space| space.get(0))
                .and_then(Slot::handle)
                .cloned()
        };
        if let Some(handle) = handle {
            trace!(depth = self.depth, index, "text update");
            self.ctx.surface.set_text(&handle, content);
        }
    }

    /// Update a same-tag element in place: props, children and ref.
    fn patch_element(&self, index: usize, prev: &Element<S>, next: &Element<S>) -> ReconcileResult<()> {
        let taken = {
            let mut state = self.state.borrow_mut();
            match state.spaces.get_mut(&index).and_then(|space| space.get_mut(0)) {
                Some(Slot::Mounted(record)) => Some((
                    record.handle.clone(),
                    std::mem::take(&mut record.bindings),
                    record.children.take(),
                )),
                _ => None,
            }
        };
        let Some((handle, mut bindings, children)) = taken else {
            return Ok(());
        };

        bindings.rebind(&self.ctx.surface, &handle, prev, next);
        let (children, result) = self.patch_children(&handle, children, prev, next);

        {
            let mut state = self.state.borrow_mut();
            if let Some(Slot::Mounted(record)) = state.spaces.get_mut(&index).and_then(|space| space.get_mut(0)) {
                record.bindings = bindings;
                record.children = children;
                record.node_ref = next.node_ref.clone();
            }
        }

        match (&prev.node_ref, &next.node_ref) {
            (Some(a), Some(b)) if a.ptr_eq(b) => {}
            (old, new) => {
                if let Some(old) = old {
                    old.notify(handle.clone(), false);
                }
                if let Some(new) = new {
                    new.notify(handle, true);
                }
            }
        }
        result
    }

    /// Move the element's content between raw markup and child items.
    fn patch_children(
        &self,
        handle: &S::Node,
        children: Option<Rc<Region<S>>>,
        prev: &Element<S>,
        next: &Element<S>,
    ) -> (Option<Rc<Region<S>>>, ReconcileResult<()>) {
        let surface = &self.ctx.surface;
        match (children, &next.inner_html) {
            (Some(region), None) => {
                let result = region.apply(next.children.to_vec());
                (Some(region), result)
            }
            (Some(region), Some(html)) => {
                region.dispose(Disposal::Discard);
                surface.set_inner_html(handle, html);
                (None, Ok(()))
            }
            (None, Some(html)) => {
                if prev.inner_html.as_ref() != Some(html) {
                    surface.set_inner_html(handle, html);
                }
                (None, Ok(()))
            }
            (None, None) => {
                surface.set_inner_html(handle, "");
                let host = Host::Container(handle.clone());
                let region = Rc::new(Region::new(Rc::clone(&self.ctx), host, self.depth + 1));
                let result = region.apply(next.children.to_vec());
                (Some(region), result)
            }
        }
    }
}
