//! Benchmark fixtures for the mond global-memory layer.
//!
//! - [`bench_space`]: a space sized for the benchmark working sets
//! - [`filled_array`]: an `f64` array with deterministic contents

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::sync::Arc;

use mond_core::{GlobalMemory, Result};
use mond_runtime::{GlobalSpace, RuntimeConfig};
use mond_typed::OwnedArray;

/// Capacity of [`bench_space`]: 64 MiB.
pub const BENCH_CAPACITY: usize = 64 * 1024 * 1024;

/// Build a space large enough for every benchmark in this crate.
pub fn bench_space() -> Arc<GlobalSpace> {
    GlobalSpace::new(RuntimeConfig::with_capacity(BENCH_CAPACITY)).unwrap()
}

/// Allocate `len` `f64`s holding `0.0, 1.0, 2.0, ...`.
pub fn filled_array<M: GlobalMemory>(memory: M, len: usize) -> Result<OwnedArray<f64, M>> {
    let values: Vec<f64> = (0..len).map(|i| i as f64).collect();
    OwnedArray::from_slice(memory, &values)
}
