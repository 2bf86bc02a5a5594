//! Core types and traits for the Mond global-memory front end.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! opaque [`GlobalHandle`] address token, the [`GlobalMemory`] contract a
//! global-memory runtime must honour, and the [`GlobalError`] taxonomy
//! shared by every layer above it.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod handle;
pub mod traits;

pub use error::{GlobalError, Result};
pub use handle::GlobalHandle;
pub use traits::GlobalMemory;
