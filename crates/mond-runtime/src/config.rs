//! Runtime configuration parameters.

use std::error::Error;
use std::fmt;

/// Configuration for a [`GlobalSpace`](crate::GlobalSpace).
///
/// Validated at construction; all values are immutable afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Maximum number of live bytes across all allocations.
    ///
    /// Default: 256MB.
    pub capacity_bytes: usize,

    /// Largest single allocation, in bytes.
    ///
    /// Default: 64MB. Offsets are carried in the low 32 bits of a handle,
    /// so this may not exceed [`RuntimeConfig::MAX_ALLOCATION_LIMIT`].
    pub max_allocation_bytes: usize,

    /// Byte pattern written into every fresh allocation.
    ///
    /// The typed layer treats unwritten memory as unspecified; this knob
    /// exists so tests can make stale reads obvious (e.g. `0xCD`).
    pub fill_byte: u8,

    /// Unfenced writes a context may hold before it publishes them early.
    ///
    /// Default: 1024. Early publication only makes writes visible sooner;
    /// a fence is still required for guaranteed visibility.
    pub max_pending_writes: usize,
}

impl RuntimeConfig {
    /// Default capacity: 256MB.
    pub const DEFAULT_CAPACITY_BYTES: usize = 256 * 1024 * 1024;

    /// Default per-allocation ceiling: 64MB.
    pub const DEFAULT_MAX_ALLOCATION_BYTES: usize = 64 * 1024 * 1024;

    /// Default pending-write limit per context.
    pub const DEFAULT_MAX_PENDING_WRITES: usize = 1024;

    /// Hard ceiling imposed by the 32-bit offset field of a handle.
    pub const MAX_ALLOCATION_LIMIT: usize = u32::MAX as usize;

    /// Default configuration.
    pub fn new() -> Self {
        Self {
            capacity_bytes: Self::DEFAULT_CAPACITY_BYTES,
            max_allocation_bytes: Self::DEFAULT_MAX_ALLOCATION_BYTES,
            fill_byte: 0,
            max_pending_writes: Self::DEFAULT_MAX_PENDING_WRITES,
        }
    }

    /// Default configuration shrunk to `capacity_bytes`.
    ///
    /// The per-allocation ceiling is clamped to the capacity.
    pub fn with_capacity(capacity_bytes: usize) -> Self {
        Self {
            capacity_bytes,
            max_allocation_bytes: Self::DEFAULT_MAX_ALLOCATION_BYTES.min(capacity_bytes),
            fill_byte: 0,
            max_pending_writes: Self::DEFAULT_MAX_PENDING_WRITES,
        }
    }

    /// Check the configuration for values the runtime cannot honour.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity_bytes == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.max_allocation_bytes == 0
            || self.max_allocation_bytes > Self::MAX_ALLOCATION_LIMIT
        {
            return Err(ConfigError::InvalidMaxAllocation {
                configured: self.max_allocation_bytes,
            });
        }
        if self.max_pending_writes == 0 {
            return Err(ConfigError::ZeroPendingLimit);
        }
        if self.max_allocation_bytes > self.capacity_bytes {
            return Err(ConfigError::AllocationExceedsCapacity {
                max_allocation_bytes: self.max_allocation_bytes,
                capacity_bytes: self.capacity_bytes,
            });
        }
        Ok(())
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors detected during [`RuntimeConfig::validate()`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// `capacity_bytes` is zero.
    ZeroCapacity,
    /// `max_allocation_bytes` is zero or above the 32-bit offset limit.
    InvalidMaxAllocation {
        /// The configured value.
        configured: usize,
    },
    /// `max_pending_writes` is zero.
    ZeroPendingLimit,
    /// `max_allocation_bytes` is larger than the whole space.
    AllocationExceedsCapacity {
        /// The configured per-allocation ceiling.
        max_allocation_bytes: usize,
        /// The configured capacity.
        capacity_bytes: usize,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroCapacity => write!(f, "capacity_bytes must be at least 1"),
            Self::ZeroPendingLimit => write!(f, "max_pending_writes must be at least 1"),
            Self::InvalidMaxAllocation { configured } => write!(
                f,
                "max_allocation_bytes {configured} must be in 1..={}",
                RuntimeConfig::MAX_ALLOCATION_LIMIT
            ),
            Self::AllocationExceedsCapacity {
                max_allocation_bytes,
                capacity_bytes,
            } => write!(
                f,
                "max_allocation_bytes {max_allocation_bytes} exceeds capacity_bytes {capacity_bytes}"
            ),
        }
    }
}

impl Error for ConfigError {}
