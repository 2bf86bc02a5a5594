//! Walk through the typed layer: scalars, arrays, moves, copies and fences.
//!
//! Run with `RUST_LOG=mond_runtime=trace` to see every transfer.

use std::error::Error;
use std::thread;

use mond::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let space = GlobalSpace::new(RuntimeConfig::with_capacity(1 << 20))?;
    let ctx = space.context();

    // A scalar and a move.
    let mut answer = OwnedScalar::with_value(&ctx, 42i32)?;
    let moved = answer.take();
    info!(moved = moved.get()?, empty = answer.is_null(), "moved scalar");

    // An array, element proxies and a deep copy.
    let bytes = OwnedArray::<u8, _>::new(&ctx, 4)?;
    bytes.at(0)?.write(0xFF)?;
    bytes.at(3)?.write(0x01)?;
    let copy = bytes.try_clone()?;
    copy.set(0, 0x10)?;
    info!(
        original = bytes.get(0)?,
        copy = copy.get(0)?,
        "deep copy is independent"
    );

    // Publish to another context.
    let totals = OwnedArray::from_slice(&ctx, &[1.0f64, 2.0, 3.0])?;
    ctx.fence()?;
    let handle = totals.handle();
    let len = totals.len();
    let worker_space = space.clone();
    let sum = thread::spawn(move || -> Result<f64, GlobalError> {
        let ctx = worker_space.context();
        let view = ArrayView::<f64, _>::new(&ctx, handle, len)?;
        Ok(view.read_all()?.iter().sum())
    })
    .join()
    .map_err(|_| "worker thread panicked")??;
    info!(sum, "read from another context after fence");

    let stats = ctx.stats();
    info!(
        allocations = stats.allocations,
        transfers_in = stats.transfers_in,
        transfers_out = stats.transfers_out,
        live = space.live_allocations(),
        "done"
    );
    Ok(())
}
