//! Per-context operation counters.
//!
//! [`ContextStats`] is a plain snapshot of what one [`Context`](crate::Context)
//! has issued so far, for tests and telemetry.

/// Counters for one context.
///
/// Success counters only advance when the runtime call succeeded; every
/// failed call increments `errors` instead.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ContextStats {
    /// Successful `allocate` calls.
    pub allocations: u64,
    /// Successful `free` calls.
    pub frees: u64,
    /// Successful `transfer_in` calls.
    pub transfers_in: u64,
    /// Successful `transfer_out` calls.
    pub transfers_out: u64,
    /// Bytes read by successful `transfer_in` calls.
    pub bytes_in: u64,
    /// Bytes written by successful `transfer_out` calls.
    pub bytes_out: u64,
    /// Successful `fence` calls.
    pub fences: u64,
    /// Times the pending-write limit forced a publish without a fence.
    pub early_publishes: u64,
    /// Calls of any kind that returned an error.
    pub errors: u64,
    /// Writes issued but not yet published by a fence.
    pub pending_writes: u64,
}
