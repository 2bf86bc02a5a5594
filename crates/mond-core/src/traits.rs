//! The contract a global-memory runtime must honour.

use std::sync::Arc;

use crate::error::Result;
use crate::handle::GlobalHandle;

/// Primitive operations of a global-memory runtime, as seen from one
/// execution context.
///
/// Every call blocks until the runtime answers. Implementations decide how
/// much of the failure taxonomy they can detect; the typed layer in
/// `mond-typed` propagates whatever they report and never retries.
///
/// Address arithmetic is not part of the trait: it is pure and lives on
/// [`GlobalHandle::offset`].
pub trait GlobalMemory {
    /// Reserve `bytes` bytes of global memory.
    ///
    /// Returns a fresh handle that overlaps no live allocation. Fails with
    /// [`GlobalError::Allocation`](crate::GlobalError::Allocation) when the
    /// request is zero-sized or cannot be satisfied.
    fn allocate(&self, bytes: usize) -> Result<GlobalHandle>;

    /// Release the allocation that starts at `handle`.
    ///
    /// Freeing NULL or an already-freed handle is an error when the runtime
    /// can detect it. Callers must not rely on double-free being harmless.
    fn free(&self, handle: GlobalHandle) -> Result<()>;

    /// Copy `dst.len()` bytes starting at `src` into local memory.
    fn transfer_in(&self, src: GlobalHandle, dst: &mut [u8]) -> Result<()>;

    /// Copy `src` into global memory starting at `dst`.
    fn transfer_out(&self, dst: GlobalHandle, src: &[u8]) -> Result<()>;

    /// Block until every transfer previously issued through this context is
    /// complete and visible to other contexts.
    fn fence(&self) -> Result<()>;
}

impl<M: GlobalMemory + ?Sized> GlobalMemory for &M {
    fn allocate(&self, bytes: usize) -> Result<GlobalHandle> {
        (**self).allocate(bytes)
    }

    fn free(&self, handle: GlobalHandle) -> Result<()> {
        (**self).free(handle)
    }

    fn transfer_in(&self, src: GlobalHandle, dst: &mut [u8]) -> Result<()> {
        (**self).transfer_in(src, dst)
    }

    fn transfer_out(&self, dst: GlobalHandle, src: &[u8]) -> Result<()> {
        (**self).transfer_out(dst, src)
    }

    fn fence(&self) -> Result<()> {
        (**self).fence()
    }
}

impl<M: GlobalMemory + ?Sized> GlobalMemory for Arc<M> {
    fn allocate(&self, bytes: usize) -> Result<GlobalHandle> {
        (**self).allocate(bytes)
    }

    fn free(&self, handle: GlobalHandle) -> Result<()> {
        (**self).free(handle)
    }

    fn transfer_in(&self, src: GlobalHandle, dst: &mut [u8]) -> Result<()> {
        (**self).transfer_in(src, dst)
    }

    fn transfer_out(&self, dst: GlobalHandle, src: &[u8]) -> Result<()> {
        (**self).transfer_out(dst, src)
    }

    fn fence(&self) -> Result<()> {
        (**self).fence()
    }
}
