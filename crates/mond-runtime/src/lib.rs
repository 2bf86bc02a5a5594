//! Single-process reference runtime for the Mond global address space.
//!
//! Implements the [`GlobalMemory`](mond_core::GlobalMemory) contract
//! entirely in local memory so the typed layer can be exercised, tested
//! and benchmarked without a cluster.
//!
//! # Architecture
//!
//! ```text
//! Arc<GlobalSpace> (shared by every context)
//! ├── RuntimeConfig (capacity, per-allocation limit, fill byte, pending limit)
//! └── Mutex<SpaceState>
//!     └── IndexMap<AllocationId, Allocation> (live allocations only)
//!
//! Context (one per execution context, Send + !Sync)
//! ├── pending writes (issued, merged, not yet published)
//! └── ContextStats
//! ```
//!
//! # Visibility
//!
//! A context's `transfer_out` is buffered. Its own `transfer_in` sees the
//! buffered bytes immediately; other contexts see them only after the
//! issuing context calls `fence()`. Dropping a context publishes whatever
//! is still pending.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod context;
pub mod space;
pub mod stats;
pub mod token;

pub use config::{ConfigError, RuntimeConfig};
pub use context::Context;
pub use space::GlobalSpace;
pub use stats::ContextStats;
pub use token::{Address, AllocationId};
