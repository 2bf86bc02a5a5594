//! Mond: typed handles, proxies and owners over a partitioned global
//! address space.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all Mond sub-crates.
//!
//! # Quick start
//!
//! ```rust
//! use mond::prelude::*;
//!
//! let space = GlobalSpace::with_defaults();
//! let ctx = space.context();
//!
//! // A scalar owns one allocation and frees it on drop.
//! let mut a = OwnedScalar::with_value(&ctx, 42i32)?;
//! let b = a.take();
//! assert_eq!(b.get()?, 42);
//! assert!(a.is_null());
//!
//! // Arrays index into one contiguous allocation.
//! let arr = OwnedArray::<u8, _>::new(&ctx, 4)?;
//! arr.set(0, 0xFF)?;
//! arr.set(3, 0x01)?;
//! let arr2 = arr.try_clone()?;
//! arr2.set(0, 0)?;
//! assert_eq!(arr.get(0)?, 0xFF);
//!
//! // Publish this context's writes to every other context.
//! ctx.fence()?;
//! # Ok::<(), GlobalError>(())
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `mond-core` | `GlobalHandle`, `GlobalMemory`, `GlobalError` |
//! | [`runtime`] | `mond-runtime` | In-process `GlobalSpace` and `Context` |
//! | [`typed`] | `mond-typed` | `ValueProxy`, `ArrayView`, `OwnedScalar`, `OwnedArray` |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Handles, the runtime contract, and errors (`mond-core`).
pub use mond_core as types;

/// Single-process reference runtime (`mond-runtime`).
///
/// [`runtime::GlobalSpace`] holds the memory; each execution context talks
/// to it through its own [`runtime::Context`].
pub use mond_runtime as runtime;

/// Typed proxies and owners (`mond-typed`).
pub use mond_typed as typed;

/// Derive support for user-defined element types.
///
/// `#[derive(Clone, Copy, Pod, Zeroable)]` on a `#[repr(C)]` struct makes
/// it an [`Element`](typed::Element).
pub use bytemuck;

/// Common imports for typical Mond usage.
pub mod prelude {
    pub use mond_core::{GlobalError, GlobalHandle, GlobalMemory};
    pub use mond_runtime::{Context, GlobalSpace, RuntimeConfig};
    pub use mond_typed::{ArrayView, Element, OwnedArray, OwnedScalar, ValueProxy};
}
