//! One execution context's view of a [`GlobalSpace`].
//!
//! A [`Context`] is the staging side of the space: its `transfer_out`
//! calls land in a private pending list, and `fence()` publishes that list
//! to the shared space in issue order. Reads through the same context see
//! the pending bytes immediately, so program order holds within a context
//! without any fence.
//!
//! The pending list stays short: a write that touches the most recent
//! pending write into the same allocation is merged into it, a write that covers earlier ones replaces them, and
//! once the list exceeds [`RuntimeConfig::max_pending_writes`] it is
//! published early. An early publish that fails is reported by the next
//! `fence()`.
//!
//! [`RuntimeConfig::max_pending_writes`]: crate::RuntimeConfig::max_pending_writes

use std::cell::{Cell, RefCell};
use std::sync::Arc;

use mond_core::{GlobalError, GlobalHandle, GlobalMemory, Result};
use smallvec::SmallVec;
use tracing::{debug, trace, warn};

use crate::space::{GlobalSpace, PendingWrite};
use crate::stats::ContextStats;

/// A connection from one execution context to a [`GlobalSpace`].
///
/// `Context` is `Send` but not `Sync`: move it into the thread that uses
/// it, and open one per thread with [`GlobalSpace::context`].
pub struct Context {
    space: Arc<GlobalSpace>,
    pending: RefCell<SmallVec<[PendingWrite; 4]>>,
    /// Failure of an early publish, held for the next fence.
    deferred: RefCell<Option<GlobalError>>,
    stats: Cell<ContextStats>,
}

impl Context {
    pub(crate) fn new(space: Arc<GlobalSpace>) -> Self {
        Self {
            space,
            pending: RefCell::new(SmallVec::new()),
            deferred: RefCell::new(None),
            stats: Cell::new(ContextStats::default()),
        }
    }

    /// The space this context is attached to.
    pub fn space(&self) -> &Arc<GlobalSpace> {
        &self.space
    }

    /// Number of writes waiting for the next fence.
    pub fn pending_writes(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Counters for everything issued through this context.
    pub fn stats(&self) -> ContextStats {
        let mut stats = self.stats.get();
        stats.pending_writes = self.pending_writes() as u64;
        stats
    }

    /// Queue `write` behind everything already pending.
    fn stage(&self, write: PendingWrite) {
        let mut pending = self.pending.borrow_mut();
        // Writes into different allocations never overlap, so only the
        // latest one into the same allocation constrains the merge.
        if let Some(last) = pending
            .iter_mut()
            .rev()
            .find(|w| w.allocation == write.allocation)
        {
            if last.absorb(&write) {
                return;
            }
        }
        pending.retain(|earlier| !write.covers(earlier));
        pending.push(write);

        if pending.len() > self.space.config().max_pending_writes {
            let writes = std::mem::take(&mut *pending);
            drop(pending);
            let result = self.space.publish(&writes);
            debug!(published = writes.len(), ok = result.is_ok(), "early publish");
            if let Err(e) = result {
                self.deferred.borrow_mut().get_or_insert(e);
            }
            let mut stats = self.stats.get();
            stats.early_publishes += 1;
            self.stats.set(stats);
        }
    }

    /// Count `result` as a success (via `on_ok`) or an error.
    fn tally<T>(&self, result: Result<T>, on_ok: impl FnOnce(&mut ContextStats)) -> Result<T> {
        let mut stats = self.stats.get();
        match &result {
            Ok(_) => on_ok(&mut stats),
            Err(_) => stats.errors += 1,
        }
        self.stats.set(stats);
        result
    }
}

impl GlobalMemory for Context {
    fn allocate(&self, bytes: usize) -> Result<GlobalHandle> {
        let result = self.space.allocate(bytes);
        self.tally(result, |s| s.allocations += 1)
    }

    fn free(&self, handle: GlobalHandle) -> Result<()> {
        let result = self.space.free(handle).map(|id| {
            // Our own unpublished writes into the freed block are moot.
            self.pending.borrow_mut().retain(|w| w.allocation != id);
        });
        self.tally(result, |s| s.frees += 1)
    }

    fn transfer_in(&self, src: GlobalHandle, dst: &mut [u8]) -> Result<()> {
        let result = self.space.read(src, dst).map(|(id, range)| {
            for write in self.pending.borrow().iter().filter(|w| w.allocation == id) {
                write.overlay(&range, dst);
            }
        });
        trace!(handle = %src, len = dst.len(), ok = result.is_ok(), "transfer in");
        let len = dst.len() as u64;
        self.tally(result, |s| {
            s.transfers_in += 1;
            s.bytes_in += len;
        })
    }

    fn transfer_out(&self, dst: GlobalHandle, src: &[u8]) -> Result<()> {
        let result = self.space.resolve(dst, src.len()).map(|(allocation, range)| {
            self.stage(PendingWrite {
                allocation,
                start: range.start,
                data: src.to_vec(),
            });
        });
        trace!(handle = %dst, len = src.len(), ok = result.is_ok(), "transfer out");
        let len = src.len() as u64;
        self.tally(result, |s| {
            s.transfers_out += 1;
            s.bytes_out += len;
        })
    }

    fn fence(&self) -> Result<()> {
        let writes = std::mem::take(&mut *self.pending.borrow_mut());
        let deferred = self.deferred.borrow_mut().take();
        let result = self
            .space
            .publish(&writes)
            .and_then(|()| deferred.map_or(Ok(()), Err));
        trace!(published = writes.len(), ok = result.is_ok(), "fence");
        self.tally(result, |s| s.fences += 1)
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        if let Some(e) = self.deferred.get_mut().take() {
            warn!(error = %e, "context dropped with an unreported early publish failure");
        }
        let writes = std::mem::take(self.pending.get_mut());
        if writes.is_empty() {
            return;
        }
        if let Err(e) = self.space.publish(&writes) {
            warn!(error = %e, "context dropped with unpublishable writes");
        }
    }
}
