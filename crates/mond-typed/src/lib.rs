//! Typed proxies and owning containers over Mond global memory.
//!
//! Three layers sit on top of a [`GlobalMemory`](mond_core::GlobalMemory)
//! runtime:
//!
//! - [`ValueProxy`]: a non-owning, typed view of the value at one handle.
//!   Every `read` is a fresh transfer-in and every `write` a transfer-out;
//!   nothing is cached.
//! - [`OwnedScalar`]: one value in its own global allocation, freed exactly
//!   once when the owner goes away.
//! - [`OwnedArray`]: a fixed-length run of values in one contiguous
//!   allocation, with bounds-checked indexing and bulk transfers.
//! - [`ArrayView`]: a borrowed run of values owned elsewhere; never frees.
//!
//! Owners are neither `Copy` nor `Clone`. Moving one moves the allocation;
//! [`OwnedScalar::take`] and [`OwnedArray::take`] move it out explicitly and
//! leave an empty owner behind. Deep copies go through the fallible
//! `try_clone`.
//!
//! ```
//! use mond_runtime::GlobalSpace;
//! use mond_typed::{OwnedArray, OwnedScalar};
//!
//! let space = GlobalSpace::with_defaults();
//! let ctx = space.context();
//!
//! let counter = OwnedScalar::with_value(&ctx, 41i32)?;
//! counter.proxy()?.update(|v| v + 1)?;
//! assert_eq!(counter.get()?, 42);
//!
//! let bytes = OwnedArray::<u8, _>::new(&ctx, 4)?;
//! bytes.set(0, 0xFF)?;
//! assert_eq!(bytes.get(0)?, 0xFF);
//! # Ok::<(), mond_core::GlobalError>(())
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod array;
pub mod element;
pub mod proxy;
pub mod scalar;
pub mod view;

pub use array::OwnedArray;
pub use element::Element;
pub use proxy::ValueProxy;
pub use scalar::OwnedScalar;
pub use view::ArrayView;
