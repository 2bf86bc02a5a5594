//! The shared global address space.
//!
//! [`GlobalSpace`] owns every live allocation. It is shared between
//! contexts through `Arc` and serialises access with a single mutex;
//! visibility ordering is handled one level up, in [`Context`].

use std::ops::Range;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use indexmap::IndexMap;
use mond_core::{GlobalError, GlobalHandle, Result};
use tracing::debug;

use crate::config::{ConfigError, RuntimeConfig};
use crate::context::Context;
use crate::token::{Address, AllocationId};

/// Backing bytes of one allocation. The length never changes.
struct Allocation {
    data: Vec<u8>,
}

struct SpaceState {
    allocations: IndexMap<AllocationId, Allocation>,
    /// Next id to hand out. Ids are never reused.
    next_id: u32,
    live_bytes: usize,
}

/// A buffered `transfer_out`, published by the next fence.
#[derive(Clone, Debug)]
pub(crate) struct PendingWrite {
    pub(crate) allocation: AllocationId,
    pub(crate) start: usize,
    pub(crate) data: Vec<u8>,
}

impl PendingWrite {
    fn end(&self) -> usize {
        self.start + self.data.len()
    }

    /// Whether this write overwrites every byte of `earlier`.
    pub(crate) fn covers(&self, earlier: &PendingWrite) -> bool {
        self.allocation == earlier.allocation
            && self.start <= earlier.start
            && earlier.end() <= self.end()
    }

    /// Fold `later` into this write if their ranges overlap or touch.
    ///
    /// The merged write has the same effect as applying `self` then
    /// `later`. Returns `false`, leaving `self` untouched, otherwise.
    pub(crate) fn absorb(&mut self, later: &PendingWrite) -> bool {
        if self.allocation != later.allocation
            || later.start > self.end()
            || later.end() < self.start
        {
            return false;
        }
        if later.start < self.start {
            // The gap is inside `later` and gets overwritten below.
            let mut data = vec![0; self.start - later.start];
            data.extend_from_slice(&self.data);
            self.data = data;
            self.start = later.start;
        }
        let end = self.end().max(later.end());
        self.data.resize(end - self.start, 0);
        let at = later.start - self.start;
        self.data[at..at + later.data.len()].copy_from_slice(&later.data);
        true
    }

    /// Copy the part of this write that overlaps `range` into `dst`, where
    /// `dst` holds the bytes of `range`.
    pub(crate) fn overlay(&self, range: &Range<usize>, dst: &mut [u8]) {
        let lo = range.start.max(self.start);
        let hi = range.end.min(self.end());
        if lo < hi {
            dst[lo - range.start..hi - range.start]
                .copy_from_slice(&self.data[lo - self.start..hi - self.start]);
        }
    }
}

/// Process-wide global address space.
///
/// Create one with [`GlobalSpace::new`], then hand each execution context
/// its own [`Context`] via [`GlobalSpace::context`].
pub struct GlobalSpace {
    config: RuntimeConfig,
    state: Mutex<SpaceState>,
}

impl GlobalSpace {
    /// Create a space after validating `config`.
    pub fn new(config: RuntimeConfig) -> std::result::Result<Arc<Self>, ConfigError> {
        config.validate()?;
        Ok(Arc::new(Self::from_valid(config)))
    }

    /// Create a space with [`RuntimeConfig::default`].
    pub fn with_defaults() -> Arc<Self> {
        Arc::new(Self::from_valid(RuntimeConfig::default()))
    }

    fn from_valid(config: RuntimeConfig) -> Self {
        Self {
            config,
            state: Mutex::new(SpaceState {
                allocations: IndexMap::new(),
                next_id: 1,
                live_bytes: 0,
            }),
        }
    }

    /// Open a new execution context on this space.
    pub fn context(self: &Arc<Self>) -> Context {
        Context::new(Arc::clone(self))
    }

    /// The configuration this space was built with.
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Number of allocations not yet freed.
    pub fn live_allocations(&self) -> usize {
        self.lock().allocations.len()
    }

    /// Bytes held by allocations not yet freed.
    pub fn live_bytes(&self) -> usize {
        self.lock().live_bytes
    }

    /// Bytes still available for allocation.
    pub fn available_bytes(&self) -> usize {
        self.config.capacity_bytes - self.lock().live_bytes
    }

    /// Size of the live allocation `handle` points into, if any.
    pub fn allocation_size(&self, handle: GlobalHandle) -> Option<usize> {
        let addr = Address::decode(handle)?;
        self.lock()
            .allocations
            .get(&addr.allocation)
            .map(|a| a.data.len())
    }

    // Every mutation completes before the guard drops, so a poisoned lock
    // still guards consistent state.
    fn lock(&self) -> MutexGuard<'_, SpaceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn allocate(&self, bytes: usize) -> Result<GlobalHandle> {
        if bytes == 0 {
            return Err(GlobalError::Allocation {
                requested: 0,
                reason: "zero-byte allocation".into(),
            });
        }
        if bytes > self.config.max_allocation_bytes {
            return Err(GlobalError::Allocation {
                requested: bytes,
                reason: format!(
                    "exceeds per-allocation limit of {} bytes",
                    self.config.max_allocation_bytes
                ),
            });
        }

        let mut state = self.lock();
        let available = self.config.capacity_bytes - state.live_bytes;
        if bytes > available {
            return Err(GlobalError::Allocation {
                requested: bytes,
                reason: format!(
                    "only {available} of {} bytes free",
                    self.config.capacity_bytes
                ),
            });
        }
        let id = state.next_id;
        state.next_id = id.checked_add(1).ok_or_else(|| GlobalError::Allocation {
            requested: bytes,
            reason: "allocation ids exhausted".into(),
        })?;
        state.allocations.insert(
            AllocationId(id),
            Allocation {
                data: vec![self.config.fill_byte; bytes],
            },
        );
        state.live_bytes += bytes;
        drop(state);

        let handle = Address::base(AllocationId(id));
        debug!(%handle, bytes, "global allocation");
        Ok(handle)
    }

    /// Release the allocation based at `handle`, returning its id.
    ///
    /// Only the base handle frees; an interior handle is rejected.
    pub(crate) fn free(&self, handle: GlobalHandle) -> Result<AllocationId> {
        let addr = Address::decode(handle)
            .filter(|a| a.offset == 0)
            .ok_or(GlobalError::InvalidHandle { handle })?;

        let mut state = self.lock();
        let allocation = state
            .allocations
            .swap_remove(&addr.allocation)
            .ok_or(GlobalError::InvalidHandle { handle })?;
        state.live_bytes -= allocation.data.len();
        drop(state);

        debug!(%handle, bytes = allocation.data.len(), "global free");
        Ok(addr.allocation)
    }

    /// Validate that `len` bytes at `handle` lie inside one live allocation.
    pub(crate) fn resolve(
        &self,
        handle: GlobalHandle,
        len: usize,
    ) -> Result<(AllocationId, Range<usize>)> {
        let state = self.lock();
        resolve_in(&state, handle, len)
    }

    /// Copy published bytes at `src` into `dst`.
    pub(crate) fn read(
        &self,
        src: GlobalHandle,
        dst: &mut [u8],
    ) -> Result<(AllocationId, Range<usize>)> {
        let state = self.lock();
        let (id, range) = resolve_in(&state, src, dst.len())?;
        let allocation = state
            .allocations
            .get(&id)
            .ok_or(GlobalError::InvalidHandle { handle: src })?;
        dst.copy_from_slice(&allocation.data[range.clone()]);
        Ok((id, range))
    }

    /// Apply `writes` in order under one lock.
    ///
    /// Stops at the first write whose allocation has been freed; that write
    /// and everything after it are dropped, never reordered.
    pub(crate) fn publish(&self, writes: &[PendingWrite]) -> Result<()> {
        let mut state = self.lock();
        for (i, write) in writes.iter().enumerate() {
            let Some(allocation) = state.allocations.get_mut(&write.allocation) else {
                return Err(GlobalError::Fence {
                    reason: format!(
                        "allocation {} was freed with {} writes unpublished",
                        write.allocation,
                        writes.len() - i
                    ),
                });
            };
            // Ranges were validated when the write was issued and
            // allocation sizes never change.
            allocation.data[write.start..write.end()].copy_from_slice(&write.data);
        }
        Ok(())
    }
}

fn resolve_in(
    state: &SpaceState,
    handle: GlobalHandle,
    len: usize,
) -> Result<(AllocationId, Range<usize>)> {
    let addr = Address::decode(handle).ok_or(GlobalError::InvalidHandle { handle })?;
    let allocation = state
        .allocations
        .get(&addr.allocation)
        .ok_or(GlobalError::InvalidHandle { handle })?;

    let size = allocation.data.len();
    let start = addr.offset as usize;
    match start.checked_add(len) {
        Some(end) if end <= size => Ok((addr.allocation, start..end)),
        _ => Err(GlobalError::Transfer {
            handle,
            len,
            reason: format!("range starting at offset {start} exceeds allocation of {size} bytes"),
        }),
    }
}
