//! Typed, non-owning access to one value in global memory.

use std::fmt;
use std::marker::PhantomData;

use bytemuck::Zeroable;
use mond_core::{GlobalHandle, GlobalMemory, Result};

use crate::element::Element;

/// "The `T` currently stored at `handle`."
///
/// A proxy is a view, not a value: it never owns memory and never caches.
/// Each [`read`](Self::read) transfers exactly `size_of::<T>()` bytes in and
/// each [`write`](Self::write) transfers exactly that many out, at the handle
/// the proxy was built with. Two proxies on the same handle observe the
/// same storage.
///
/// Proxies borrowed from an owner cannot outlive it.
pub struct ValueProxy<'a, T, M: ?Sized> {
    memory: &'a M,
    handle: GlobalHandle,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, T: Element, M: GlobalMemory + ?Sized> ValueProxy<'a, T, M> {
    /// Bind a proxy to `handle`. No runtime call is made.
    pub fn new(memory: &'a M, handle: GlobalHandle) -> Self {
        Self {
            memory,
            handle,
            _marker: PhantomData,
        }
    }

    /// The handle this proxy reads and writes.
    pub fn handle(&self) -> GlobalHandle {
        self.handle
    }

    /// Fetch the current value.
    pub fn read(&self) -> Result<T> {
        let mut value = <T as Zeroable>::zeroed();
        self.memory
            .transfer_in(self.handle, bytemuck::bytes_of_mut(&mut value))?;
        Ok(value)
    }

    /// Store `value`.
    pub fn write(&self, value: T) -> Result<()> {
        self.memory
            .transfer_out(self.handle, bytemuck::bytes_of(&value))
    }

    /// Read, apply `f`, write the result back, and return it.
    ///
    /// Two separate transfers: another context may write in between.
    pub fn update(&self, f: impl FnOnce(T) -> T) -> Result<T> {
        let value = f(self.read()?);
        self.write(value)?;
        Ok(value)
    }
}

impl<T, M: ?Sized> Clone for ValueProxy<'_, T, M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, M: ?Sized> Copy for ValueProxy<'_, T, M> {}

impl<T, M: ?Sized> fmt::Debug for ValueProxy<'_, T, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueProxy")
            .field("type", &std::any::type_name::<T>())
            .field("handle", &self.handle)
            .finish()
    }
}
