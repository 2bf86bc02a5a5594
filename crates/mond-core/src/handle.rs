//! The opaque global address token.
//!
//! A [`GlobalHandle`] names a byte position inside the global address space.
//! It is a plain `u64` bit pattern defined by the runtime that produced it;
//! this crate only relies on two properties of the encoding:
//!
//! - the all-zero pattern is the NULL sentinel, never returned by `allocate`;
//! - byte offsets within one allocation live in the low bits, so advancing a
//!   handle by `n` bytes is integer addition on the raw token.

use std::fmt;
use std::ops::{Add, AddAssign};

/// Address of a byte in the global address space.
///
/// Handles are cheap to copy and carry no ownership. Arithmetic never
/// consults the runtime and never validates bounds: a handle is only
/// meaningful relative to the allocation it was derived from, and keeping
/// offsets inside that allocation is the caller's job.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
#[must_use]
pub struct GlobalHandle(u64);

impl GlobalHandle {
    /// The NULL handle. Owners hold this after their allocation is moved out.
    pub const NULL: Self = Self(0);

    /// Wrap a raw token produced by a runtime.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw token.
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Whether this is the NULL sentinel.
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// The handle `delta` bytes past `self`.
    ///
    /// Offsetting NULL yields NULL so that an empty owner can never
    /// synthesise a plausible-looking address.
    pub const fn offset(self, delta: usize) -> Self {
        if self.is_null() {
            return Self::NULL;
        }
        Self(self.0.wrapping_add(delta as u64))
    }
}

impl Add<usize> for GlobalHandle {
    type Output = Self;

    fn add(self, delta: usize) -> Self {
        self.offset(delta)
    }
}

impl AddAssign<usize> for GlobalHandle {
    fn add_assign(&mut self, delta: usize) {
        *self = self.offset(delta);
    }
}

impl fmt::Display for GlobalHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "null")
        } else {
            write!(f, "{:#018x}", self.0)
        }
    }
}
