//! Borrowed, non-owning access to a run of values in global memory.

use std::fmt;
use std::marker::PhantomData;

use bytemuck::Zeroable;
use mond_core::{GlobalError, GlobalHandle, GlobalMemory, Result};

use crate::element::{byte_len, size_of, Element};
use crate::proxy::ValueProxy;

/// `len` values of `T` starting at `handle`, owned by someone else.
///
/// A view never frees. Get one from [`OwnedArray::view`](crate::OwnedArray::view)
/// for an array you own, or from [`ArrayView::new`] for a handle and length
/// received from another context. Like [`ValueProxy`], it is `Copy` and
/// never caches.
pub struct ArrayView<'a, T, M: ?Sized> {
    memory: &'a M,
    handle: GlobalHandle,
    len: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, T: Element, M: GlobalMemory + ?Sized> ArrayView<'a, T, M> {
    /// View `len` elements at `handle`. No runtime call is made.
    ///
    /// Fails with [`GlobalError::InvalidArgument`] if `len` is zero or its
    /// byte size overflows, and [`GlobalError::InvalidHandle`] for NULL.
    pub fn new(memory: &'a M, handle: GlobalHandle, len: usize) -> Result<Self> {
        byte_len::<T>(len)?;
        if handle.is_null() {
            return Err(GlobalError::InvalidHandle { handle });
        }
        Ok(Self::from_parts(memory, handle, len))
    }

    pub(crate) fn from_parts(memory: &'a M, handle: GlobalHandle, len: usize) -> Self {
        Self {
            memory,
            handle,
            len,
            _marker: PhantomData,
        }
    }

    /// Number of elements. Never zero.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Always `false`: a view covers at least one element.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Handle of the first element.
    pub fn handle(&self) -> GlobalHandle {
        self.handle
    }

    /// Proxy on element `index`.
    pub fn at(&self, index: usize) -> Result<ValueProxy<'a, T, M>> {
        if index >= self.len {
            return Err(GlobalError::IndexOutOfRange {
                index,
                len: self.len,
            });
        }
        // `len * size_of::<T>()` was checked, so this cannot overflow.
        Ok(ValueProxy::new(
            self.memory,
            self.handle.offset(index * size_of::<T>()),
        ))
    }

    /// Read element `index`.
    pub fn get(&self, index: usize) -> Result<T> {
        self.at(index)?.read()
    }

    /// Write element `index`.
    pub fn set(&self, index: usize, value: T) -> Result<()> {
        self.at(index)?.write(value)
    }

    /// The `len` elements starting at `start`, as a narrower view.
    pub fn subview(&self, start: usize, len: usize) -> Result<Self> {
        byte_len::<T>(len)?;
        match start.checked_add(len) {
            Some(end) if end <= self.len => Ok(Self::from_parts(
                self.memory,
                self.handle.offset(start * size_of::<T>()),
                len,
            )),
            _ => Err(GlobalError::IndexOutOfRange {
                index: start.saturating_add(len).saturating_sub(1),
                len: self.len,
            }),
        }
    }

    /// Proxies on every element, in order.
    pub fn proxies(self) -> impl Iterator<Item = ValueProxy<'a, T, M>> + 'a {
        let size = size_of::<T>();
        (0..self.len).map(move |i| ValueProxy::new(self.memory, self.handle.offset(i * size)))
    }

    /// Fetch every element in one transfer.
    pub fn read_all(&self) -> Result<Vec<T>> {
        let mut values = vec![<T as Zeroable>::zeroed(); self.len];
        self.memory
            .transfer_in(self.handle, bytemuck::cast_slice_mut(&mut values))?;
        Ok(values)
    }

    /// Overwrite every element in one transfer.
    ///
    /// `values.len()` must equal [`len`](Self::len).
    pub fn write_all(&self, values: &[T]) -> Result<()> {
        if values.len() != self.len {
            return Err(GlobalError::InvalidArgument {
                reason: format!(
                    "expected {} values for the whole array, got {}",
                    self.len,
                    values.len()
                ),
            });
        }
        self.memory
            .transfer_out(self.handle, bytemuck::cast_slice(values))
    }
}

impl<T, M: ?Sized> Clone for ArrayView<'_, T, M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, M: ?Sized> Copy for ArrayView<'_, T, M> {}

impl<T, M: ?Sized> fmt::Debug for ArrayView<'_, T, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArrayView")
            .field("type", &std::any::type_name::<T>())
            .field("handle", &self.handle)
            .field("len", &self.len)
            .finish()
    }
}
