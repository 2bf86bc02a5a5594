//! A single value that owns its global allocation.

use std::fmt;
use std::marker::PhantomData;
use std::mem;

use mond_core::{GlobalError, GlobalHandle, GlobalMemory, Result};
use tracing::warn;

use crate::element::{size_of, Element};
use crate::proxy::ValueProxy;

/// One `T` stored in a dedicated `size_of::<T>()`-byte global allocation.
///
/// The scalar frees its allocation exactly once: on drop, on
/// [`free`](Self::free), or never if ownership was handed off with
/// [`take`](Self::take) or [`into_raw`](Self::into_raw). An empty owner
/// (holding NULL) drops without touching the runtime, and every access
/// through it fails with [`GlobalError::InvalidState`].
pub struct OwnedScalar<T: Element, M: GlobalMemory> {
    memory: M,
    handle: GlobalHandle,
    _marker: PhantomData<T>,
}

impl<T: Element, M: GlobalMemory> OwnedScalar<T, M> {
    /// Allocate storage for one `T`. Contents are unspecified until written.
    pub fn new(memory: M) -> Result<Self> {
        let handle = memory.allocate(size_of::<T>())?;
        Ok(Self::from_raw(memory, handle))
    }

    /// Allocate storage and write `value` into it.
    ///
    /// If the write fails the allocation is released before the error is
    /// returned.
    pub fn with_value(memory: M, value: T) -> Result<Self> {
        let scalar = Self::new(memory)?;
        scalar.set(value)?;
        Ok(scalar)
    }

    /// Adopt an existing allocation of at least `size_of::<T>()` bytes.
    ///
    /// The scalar becomes its sole owner and will free it.
    pub fn from_raw(memory: M, handle: GlobalHandle) -> Self {
        Self {
            memory,
            handle,
            _marker: PhantomData,
        }
    }

    /// Give up ownership without freeing, returning the handle.
    pub fn into_raw(mut self) -> GlobalHandle {
        mem::replace(&mut self.handle, GlobalHandle::NULL)
    }

    /// The owned handle, or NULL once moved out.
    pub fn handle(&self) -> GlobalHandle {
        self.handle
    }

    /// Whether the allocation has been moved out.
    pub fn is_null(&self) -> bool {
        self.handle.is_null()
    }

    /// The runtime this scalar talks to.
    pub fn memory(&self) -> &M {
        &self.memory
    }

    /// A proxy on the owned value, valid while `self` is borrowed.
    pub fn proxy(&self) -> Result<ValueProxy<'_, T, M>> {
        Ok(ValueProxy::new(&self.memory, self.live_handle()?))
    }

    /// Read the current value.
    pub fn get(&self) -> Result<T> {
        self.proxy()?.read()
    }

    /// Overwrite the value.
    pub fn set(&self, value: T) -> Result<()> {
        self.proxy()?.write(value)
    }

    /// Free the allocation now, reporting any runtime error.
    ///
    /// Freeing an empty owner is a no-op.
    pub fn free(mut self) -> Result<()> {
        let handle = mem::replace(&mut self.handle, GlobalHandle::NULL);
        if handle.is_null() {
            return Ok(());
        }
        self.memory.free(handle)
    }

    fn live_handle(&self) -> Result<GlobalHandle> {
        if self.handle.is_null() {
            return Err(GlobalError::moved_out());
        }
        Ok(self.handle)
    }
}

impl<T: Element, M: GlobalMemory + Clone> OwnedScalar<T, M> {
    /// Move the allocation into a new owner, leaving `self` empty.
    pub fn take(&mut self) -> Self {
        Self::from_raw(
            self.memory.clone(),
            mem::replace(&mut self.handle, GlobalHandle::NULL),
        )
    }

    /// Deep copy: a new allocation holding the current value.
    ///
    /// The value is read before the copy is allocated, so a failed read
    /// allocates nothing; a failed write frees the new allocation.
    ///
    /// Fails with [`GlobalError::InvalidState`] on an empty owner, before
    /// any runtime call.
    pub fn try_clone(&self) -> Result<Self> {
        let value = self.get()?;
        Self::with_value(self.memory.clone(), value)
    }
}

impl<T: Element, M: GlobalMemory> Drop for OwnedScalar<T, M> {
    fn drop(&mut self) {
        let handle = mem::replace(&mut self.handle, GlobalHandle::NULL);
        if handle.is_null() {
            return;
        }
        if let Err(e) = self.memory.free(handle) {
            warn!(%handle, error = %e, "failed to free global scalar on drop");
        }
    }
}

impl<T: Element, M: GlobalMemory> fmt::Debug for OwnedScalar<T, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnedScalar")
            .field("type", &std::any::type_name::<T>())
            .field("handle", &self.handle)
            .finish()
    }
}
