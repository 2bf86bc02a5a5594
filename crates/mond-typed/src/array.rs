//! Fixed-length arrays that own one contiguous global allocation.

use std::fmt;
use std::marker::PhantomData;
use std::mem;

use mond_core::{GlobalError, GlobalHandle, GlobalMemory, Result};
use tracing::warn;

use crate::element::{byte_len, Element};
use crate::proxy::ValueProxy;
use crate::view::ArrayView;

/// `len` values of `T` in one `len * size_of::<T>()`-byte allocation.
///
/// Element `i` lives at `handle + i * size_of::<T>()`. Indexing is checked
/// against `len` before any runtime call and never touches the runtime
/// itself; only reads and writes through the returned proxy do.
///
/// Ownership follows [`OwnedScalar`](crate::OwnedScalar): one free for the
/// whole allocation, never per element.
pub struct OwnedArray<T: Element, M: GlobalMemory> {
    memory: M,
    handle: GlobalHandle,
    len: usize,
    _marker: PhantomData<T>,
}

impl<T: Element, M: GlobalMemory> OwnedArray<T, M> {
    /// Allocate an array of `len` elements with unspecified contents.
    ///
    /// `len == 0` fails with [`GlobalError::InvalidArgument`] without
    /// calling the runtime.
    pub fn new(memory: M, len: usize) -> Result<Self> {
        let bytes = byte_len::<T>(len)?;
        let handle = memory.allocate(bytes)?;
        Ok(Self::from_parts(memory, handle, len))
    }

    /// Allocate an array holding a copy of `values`, in one bulk write.
    pub fn from_slice(memory: M, values: &[T]) -> Result<Self> {
        let array = Self::new(memory, values.len())?;
        array.write_all(values)?;
        Ok(array)
    }

    /// Adopt an existing allocation of at least `len * size_of::<T>()` bytes.
    ///
    /// The array becomes its sole owner and will free it. To look at an
    /// allocation someone else owns, use [`ArrayView::new`] instead.
    ///
    /// Fails with [`GlobalError::InvalidArgument`] if `len` is zero or its
    /// byte size overflows, and [`GlobalError::InvalidHandle`] for NULL.
    pub fn from_raw(memory: M, handle: GlobalHandle, len: usize) -> Result<Self> {
        byte_len::<T>(len)?;
        if handle.is_null() {
            return Err(GlobalError::InvalidHandle { handle });
        }
        Ok(Self::from_parts(memory, handle, len))
    }

    fn from_parts(memory: M, handle: GlobalHandle, len: usize) -> Self {
        Self {
            memory,
            handle,
            len,
            _marker: PhantomData,
        }
    }

    /// Give up ownership without freeing, returning the handle and length.
    pub fn into_raw(mut self) -> (GlobalHandle, usize) {
        let len = mem::take(&mut self.len);
        (mem::replace(&mut self.handle, GlobalHandle::NULL), len)
    }

    /// Number of elements; zero once moved out.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the array has been moved out. A live array is never empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Base handle, or NULL once moved out.
    pub fn handle(&self) -> GlobalHandle {
        self.handle
    }

    /// The runtime this array talks to.
    pub fn memory(&self) -> &M {
        &self.memory
    }

    /// A borrowed view of the whole array.
    ///
    /// Fails with [`GlobalError::InvalidState`] once moved out.
    pub fn view(&self) -> Result<ArrayView<'_, T, M>> {
        let handle = self.live_handle()?;
        Ok(ArrayView::from_parts(&self.memory, handle, self.len))
    }

    /// Proxy on element `index`.
    pub fn at(&self, index: usize) -> Result<ValueProxy<'_, T, M>> {
        self.view()?.at(index)
    }

    /// Read element `index`.
    pub fn get(&self, index: usize) -> Result<T> {
        self.at(index)?.read()
    }

    /// Write element `index`.
    pub fn set(&self, index: usize, value: T) -> Result<()> {
        self.at(index)?.write(value)
    }

    /// Proxies on every element, in order. Empty once moved out.
    pub fn proxies(&self) -> impl Iterator<Item = ValueProxy<'_, T, M>> + '_ {
        self.view().into_iter().flat_map(ArrayView::proxies)
    }

    /// Fetch the whole array in one transfer.
    pub fn read_all(&self) -> Result<Vec<T>> {
        self.view()?.read_all()
    }

    /// Overwrite the whole array in one transfer.
    ///
    /// `values.len()` must equal [`len`](Self::len).
    pub fn write_all(&self, values: &[T]) -> Result<()> {
        self.view()?.write_all(values)
    }

    /// Free the allocation now, reporting any runtime error.
    ///
    /// Freeing an empty owner is a no-op.
    pub fn free(mut self) -> Result<()> {
        self.len = 0;
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

impl<T: Element, M: GlobalMemory + Clone> OwnedArray<T, M> {
    /// Move the allocation into a new owner, leaving `self` empty.
    pub fn take(&mut self) -> Self {
        let len = mem::take(&mut self.len);
        Self::from_parts(
            self.memory.clone(),
            mem::replace(&mut self.handle, GlobalHandle::NULL),
            len,
        )
    }

    /// Deep copy through a local buffer: one bulk transfer in from `self`,
    /// one bulk transfer out to the new allocation.
    ///
    /// The source is read before the copy is allocated, so a failed read
    /// allocates nothing. A failed write frees the new allocation.
    pub fn try_clone(&self) -> Result<Self> {
        let values = self.read_all()?;
        Self::from_slice(self.memory.clone(), &values)
    }
}

impl<T: Element, M: GlobalMemory> Drop for OwnedArray<T, M> {
    fn drop(&mut self) {
        let handle = mem::replace(&mut self.handle, GlobalHandle::NULL);
        if handle.is_null() {
            return;
        }
        if let Err(e) = self.memory.free(handle) {
            warn!(%handle, len = self.len, error = %e, "failed to free global array on drop");
        }
    }
}

impl<T: Element, M: GlobalMemory> fmt::Debug for OwnedArray<T, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnedArray")
            .field("type", &std::any::type_name::<T>())
            .field("handle", &self.handle)
            .field("len", &self.len)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mond_runtime::{Context, GlobalSpace};
    use mond_test_utils::{Call, FaultPlan, FaultyMemory, Op, RecordingMemory};

    fn recording() -> (std::sync::Arc<GlobalSpace>, RecordingMemory<Context>) {
        let space = GlobalSpace::with_defaults();
        let mem = RecordingMemory::new(space.context());
        (space, mem)
    }

    #[test]
    fn zero_length_rejected_without_runtime_call() {
        let (_space, mem) = recording();
        assert!(matches!(
            OwnedArray::<u32, _>::new(&mem, 0),
            Err(GlobalError::InvalidArgument { .. })
        ));
        assert!(mem.calls().is_empty());
    }

    #[test]
    fn overflowing_length_rejected() {
        let (_space, mem) = recording();
        assert!(matches!(
            OwnedArray::<u64, _>::new(&mem, usize::MAX / 2),
            Err(GlobalError::InvalidArgument { .. })
        ));
        assert!(mem.calls().is_empty());
    }

    #[test]
    fn allocates_len_times_element_size() {
        let (space, mem) = recording();
        let a = OwnedArray::<u32, _>::new(&mem, 5).unwrap();
        assert_eq!(mem.calls(), vec![Call::Allocate { bytes: 20 }]);
        assert_eq!(space.allocation_size(a.handle()), Some(20));
        assert_eq!(a.len(), 5);
        assert!(!a.is_empty());
    }

    #[test]
    fn index_maps_to_element_offset() {
        let (_space, mem) = recording();
        let a = OwnedArray::<u64, _>::new(&mem, 4).unwrap();
        mem.clear();
        let p = a.at(3).unwrap();
        assert_eq!(p.handle(), a.handle().offset(24));
        // Indexing alone never reaches the runtime.
        assert!(mem.calls().is_empty());
    }

    #[test]
    fn out_of_range_index_rejected_without_runtime_call() {
        let (_space, mem) = recording();
        let a = OwnedArray::<u8, _>::new(&mem, 4).unwrap();
        mem.clear();
        assert_eq!(
            a.at(4).unwrap_err(),
            GlobalError::IndexOutOfRange { index: 4, len: 4 }
        );
        assert!(matches!(a.get(100), Err(GlobalError::IndexOutOfRange { .. })));
        assert!(matches!(a.set(usize::MAX, 1), Err(GlobalError::IndexOutOfRange { .. })));
        assert!(mem.calls().is_empty());
    }

    #[test]
    fn byte_array_scenario() {
        let space = GlobalSpace::with_defaults();
        let ctx = space.context();
        let arr = OwnedArray::<u8, _>::new(&ctx, 4).unwrap();
        arr.set(0, 0xFF).unwrap();
        arr.set(3, 0x01).unwrap();
        assert_eq!(arr.get(0).unwrap(), 0xFF);
        assert_eq!(arr.get(3).unwrap(), 0x01);
        // Unwritten element: value unspecified, but reading is not an error.
        assert!(arr.get(1).is_ok());
    }

    #[test]
    fn writes_do_not_leak_into_neighbours() {
        let space = GlobalSpace::with_defaults();
        let ctx = space.context();
        let arr = OwnedArray::from_slice(&ctx, &[0u16; 6]).unwrap();
        arr.set(2, 0xBEEF).unwrap();
        assert_eq!(arr.read_all().unwrap(), vec![0, 0, 0xBEEF, 0, 0, 0]);
    }

    #[test]
    fn clone_uses_one_bulk_transfer_each_way() {
        let (space, mem) = recording();
        let a = OwnedArray::from_slice(&mem, &[1u32, 2, 3, 4]).unwrap();
        mem.clear();

        let b = a.try_clone().unwrap();
        assert_eq!(
            mem.calls(),
            vec![
                Call::TransferIn {
                    handle: a.handle(),
                    len: 16
                },
                Call::Allocate { bytes: 16 },
                Call::TransferOut {
                    handle: b.handle(),
                    len: 16
                },
            ]
        );
        assert_eq!(space.live_allocations(), 2);
    }

    #[test]
    fn clone_is_independent() {
        let space = GlobalSpace::with_defaults();
        let ctx = space.context();
        let arr = OwnedArray::from_slice(&ctx, &[7u8, 8, 9, 10]).unwrap();
        let arr2 = arr.try_clone().unwrap();
        arr2.set(0, 0).unwrap();
        assert_eq!(arr.get(0).unwrap(), 7);
        arr.set(1, 0).unwrap();
        assert_eq!(arr2.get(1).unwrap(), 8);
    }

    #[test]
    fn take_leaves_empty_owner() {
        let (_space, mem) = recording();
        let mut a = OwnedArray::from_slice(&mem, &[1i32, 2]).unwrap();
        let b = a.take();
        assert!(a.is_empty());
        assert_eq!(a.len(), 0);
        assert!(a.handle().is_null());
        assert_eq!(b.read_all().unwrap(), vec![1, 2]);
        mem.clear();

        assert!(matches!(a.at(0), Err(GlobalError::InvalidState { .. })));
        assert!(matches!(a.read_all(), Err(GlobalError::InvalidState { .. })));
        assert!(matches!(a.try_clone(), Err(GlobalError::InvalidState { .. })));
        drop(a);
        assert!(mem.calls().is_empty());

        drop(b);
        assert_eq!(mem.count(|c| matches!(c, Call::Free { .. })), 1);
    }

    #[test]
    fn drop_frees_whole_allocation_once() {
        let (space, mem) = recording();
        {
            let a = OwnedArray::<f32, _>::new(&mem, 64).unwrap();
            for p in a.proxies() {
                p.write(1.0).unwrap();
            }
        }
        assert_eq!(mem.count(|c| matches!(c, Call::Free { .. })), 1);
        assert_eq!(space.live_allocations(), 0);
    }

    #[test]
    fn write_all_requires_matching_length() {
        let space = GlobalSpace::with_defaults();
        let ctx = space.context();
        let a = OwnedArray::<u8, _>::new(&ctx, 3).unwrap();
        assert!(matches!(
            a.write_all(&[1, 2]),
            Err(GlobalError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn proxies_visit_every_element() {
        let space = GlobalSpace::with_defaults();
        let ctx = space.context();
        let a = OwnedArray::from_slice(&ctx, &[5u32, 6, 7]).unwrap();
        let values: Vec<u32> = a.proxies().map(|p| p.read().unwrap()).collect();
        assert_eq!(values, vec![5, 6, 7]);
    }

    #[test]
    fn into_raw_and_from_raw() {
        let space = GlobalSpace::with_defaults();
        let ctx = space.context();
        let a = OwnedArray::from_slice(&ctx, &[1u64, 2, 3]).unwrap();
        let (h, len) = a.into_raw();
        assert_eq!(len, 3);
        assert_eq!(space.live_allocations(), 1);
        let b = OwnedArray::<u64, _>::from_raw(&ctx, h, len).unwrap();
        assert_eq!(b.get(2).unwrap(), 3);
        b.free().unwrap();
        assert_eq!(space.live_allocations(), 0);
    }

    #[test]
    fn from_raw_rejects_bad_lengths_and_null() {
        let space = GlobalSpace::with_defaults();
        let ctx = space.context();
        let h = ctx.allocate(32).unwrap();

        assert!(matches!(
            OwnedArray::<u64, _>::from_raw(&ctx, h, 0),
            Err(GlobalError::InvalidArgument { .. })
        ));
        assert!(matches!(
            OwnedArray::<u64, _>::from_raw(&ctx, h, usize::MAX),
            Err(GlobalError::InvalidArgument { .. })
        ));
        assert!(matches!(
            OwnedArray::<u64, _>::from_raw(&ctx, GlobalHandle::NULL, 4),
            Err(GlobalError::InvalidHandle { .. })
        ));
        // Nothing was adopted, so nothing was freed.
        assert_eq!(space.live_allocations(), 1);
    }

    #[test]
    fn view_does_not_free() {
        let (space, mem) = recording();
        let arr = OwnedArray::from_slice(&mem, &[4u16, 5, 6]).unwrap();
        {
            let view = arr.view().unwrap();
            assert_eq!(view.len(), 3);
            assert_eq!(view.read_all().unwrap(), vec![4, 5, 6]);
            view.set(1, 50).unwrap();
        }
        assert_eq!(mem.count(|c| matches!(c, Call::Free { .. })), 0);
        assert_eq!(arr.get(1).unwrap(), 50);
        assert_eq!(space.live_allocations(), 1);
    }

    #[test]
    fn moved_out_array_has_no_view() {
        let space = GlobalSpace::with_defaults();
        let ctx = space.context();
        let mut a = OwnedArray::<u8, _>::new(&ctx, 2).unwrap();
        let _b = a.take();
        assert!(matches!(a.view(), Err(GlobalError::InvalidState { .. })));
        assert_eq!(a.proxies().count(), 0);
    }

    #[test]
    fn failing_clone_write_releases_new_allocation() {
        let space = GlobalSpace::with_defaults();
        let mem = FaultyMemory::new(space.context(), FaultPlan::new().fail_nth(Op::TransferOut, 1));
        let a = OwnedArray::from_slice(&mem, &[1u8, 2, 3]).unwrap();
        assert!(matches!(a.try_clone(), Err(GlobalError::Transfer { .. })));
        assert_eq!(space.live_allocations(), 1);
    }

    #[test]
    fn failing_free_on_drop_is_swallowed() {
        let space = GlobalSpace::with_defaults();
        let mem = FaultyMemory::new(space.context(), FaultPlan::new().fail_nth(Op::Free, 0));
        drop(OwnedArray::<u8, _>::new(&mem, 8).unwrap());
        assert_eq!(mem.attempts(Op::Free), 1);
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn write_one_element_leaves_others(
                len in 1usize..64,
                seed in any::<u32>(),
                value in any::<u32>(),
                index_frac in 0.0f64..1.0,
            ) {
                let space = GlobalSpace::with_defaults();
                let ctx = space.context();
                let initial: Vec<u32> = (0..len as u32).map(|i| i.wrapping_mul(seed)).collect();
                let arr = OwnedArray::from_slice(&ctx, &initial).unwrap();

                let i = ((len as f64) * index_frac) as usize % len;
                arr.set(i, value).unwrap();
                prop_assert_eq!(arr.get(i).unwrap(), value);
                for j in (0..len).filter(|&j| j != i) {
                    prop_assert_eq!(arr.get(j).unwrap(), initial[j]);
                }
            }

            #[test]
            fn index_at_or_past_len_is_rejected(len in 1usize..64, extra in 0usize..1000) {
                let space = GlobalSpace::with_defaults();
                let ctx = space.context();
                let arr = OwnedArray::<u8, _>::new(&ctx, len).unwrap();
                let is_out_of_range = matches!(
                    arr.at(len + extra),
                    Err(GlobalError::IndexOutOfRange { .. })
                );
                prop_assert!(is_out_of_range);
            }
        }
    }
}
