//! The bound on values that may live in global memory.

use bytemuck::Pod;
use mond_core::{GlobalError, Result};

/// A type that can be moved to and from global memory as raw bytes.
///
/// Any [`Pod`] type qualifies: every bit pattern is a valid value, there is
/// no padding, and no pointers into local memory. Derive `Pod` and
/// `Zeroable` with `bytemuck` for your own `#[repr(C)]` structs.
pub trait Element: Pod {}

impl<T: Pod> Element for T {}

/// Size in bytes of one `T` in global memory.
pub(crate) const fn size_of<T: Element>() -> usize {
    std::mem::size_of::<T>()
}

/// Byte size of `len` elements, rejecting empty and overflowing arrays.
pub(crate) fn byte_len<T: Element>(len: usize) -> Result<usize> {
    if len == 0 {
        return Err(GlobalError::InvalidArgument {
            reason: "array length must be at least 1".into(),
        });
    }
    len.checked_mul(size_of::<T>())
        .ok_or_else(|| GlobalError::InvalidArgument {
            reason: format!(
                "{len} elements of {} bytes overflow the address range",
                size_of::<T>()
            ),
        })
}
