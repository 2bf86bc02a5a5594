//! Handle encoding used by the reference runtime.
//!
//! Upper 32 bits = allocation id, lower 32 bits = byte offset. Ids start at
//! 1 and are never reused, so the all-zero token is always NULL and a handle
//! to a freed allocation can never resolve to a newer one.

use std::fmt;

use mond_core::GlobalHandle;

/// Identifies one allocation for its whole lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AllocationId(pub u32);

impl fmt::Display for AllocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A decoded handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Address {
    /// The allocation the handle points into.
    pub allocation: AllocationId,
    /// Byte offset from the allocation's base.
    pub offset: u32,
}

impl Address {
    /// Encode into an opaque handle.
    pub fn encode(self) -> GlobalHandle {
        GlobalHandle::from_raw(((self.allocation.0 as u64) << 32) | self.offset as u64)
    }

    /// Decode a handle. Returns `None` for NULL.
    pub fn decode(handle: GlobalHandle) -> Option<Self> {
        if handle.is_null() {
            return None;
        }
        let raw = handle.raw();
        Some(Self {
            allocation: AllocationId((raw >> 32) as u32),
            offset: raw as u32,
        })
    }

    /// Base handle of an allocation.
    pub fn base(allocation: AllocationId) -> GlobalHandle {
        Self {
            allocation,
            offset: 0,
        }
        .encode()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_round_trip() {
        let addr = Address {
            allocation: AllocationId(7),
            offset: 1024,
        };
        assert_eq!(Address::decode(addr.encode()), Some(addr));
    }

    #[test]
    fn null_decodes_to_none() {
        assert_eq!(Address::decode(GlobalHandle::NULL), None);
    }

    #[test]
    fn handle_offset_moves_low_bits_only() {
        let base = Address::base(AllocationId(3));
        let moved = Address::decode(base.offset(40)).unwrap();
        assert_eq!(moved.allocation, AllocationId(3));
        assert_eq!(moved.offset, 40);
    }
}
