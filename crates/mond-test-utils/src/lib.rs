//! Test utilities and instrumented runtimes for Mond development.
//!
//! Provides [`RecordingMemory`], a [`GlobalMemory`] wrapper that logs every
//! call for exact call-count assertions, fault injection via
//! [`FaultyMemory`], and small-space constructors for tests.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::cell::RefCell;
use std::sync::Arc;

use mond_core::{GlobalHandle, GlobalMemory, Result};
use mond_runtime::{GlobalSpace, RuntimeConfig};

pub use fixtures::{FaultPlan, FaultyMemory, Op};

/// One call that reached a [`GlobalMemory`] implementation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    Allocate { bytes: usize },
    Free { handle: GlobalHandle },
    TransferIn { handle: GlobalHandle, len: usize },
    TransferOut { handle: GlobalHandle, len: usize },
    Fence,
}

/// Wraps a runtime and records every call, successful or not, before
/// delegating.
pub struct RecordingMemory<M> {
    inner: M,
    calls: RefCell<Vec<Call>>,
}

impl<M> RecordingMemory<M> {
    pub fn new(inner: M) -> Self {
        Self {
            inner,
            calls: RefCell::new(Vec::new()),
        }
    }

    /// All calls recorded so far, oldest first.
    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    /// Number of recorded calls matching `pred`.
    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.borrow().iter().filter(|c| pred(c)).count()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        self.calls.borrow_mut().clear();
    }

    pub fn inner(&self) -> &M {
        &self.inner
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }
}

impl<M: GlobalMemory> GlobalMemory for RecordingMemory<M> {
    fn allocate(&self, bytes: usize) -> Result<GlobalHandle> {
        self.record(Call::Allocate { bytes });
        self.inner.allocate(bytes)
    }

    fn free(&self, handle: GlobalHandle) -> Result<()> {
        self.record(Call::Free { handle });
        self.inner.free(handle)
    }

    fn transfer_in(&self, src: GlobalHandle, dst: &mut [u8]) -> Result<()> {
        self.record(Call::TransferIn {
            handle: src,
            len: dst.len(),
        });
        self.inner.transfer_in(src, dst)
    }

    fn transfer_out(&self, dst: GlobalHandle, src: &[u8]) -> Result<()> {
        self.record(Call::TransferOut {
            handle: dst,
            len: src.len(),
        });
        self.inner.transfer_out(dst, src)
    }

    fn fence(&self) -> Result<()> {
        self.record(Call::Fence);
        self.inner.fence()
    }
}

/// A space of `capacity_bytes` whose fresh allocations read as `0xCD`, so
/// tests that accidentally depend on zero-initialisation fail loudly.
pub fn poisoned_space(capacity_bytes: usize) -> Arc<GlobalSpace> {
    let config = RuntimeConfig {
        fill_byte: 0xCD,
        ..RuntimeConfig::with_capacity(capacity_bytes)
    };
    GlobalSpace::new(config).expect("test space config is valid")
}
