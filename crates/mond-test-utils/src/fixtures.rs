//! Fault injection for runtime error-path tests.
//!
//! [`FaultyMemory`] wraps a runtime and fails chosen calls according to a
//! [`FaultPlan`]. A failed call never reaches the wrapped runtime.

use std::cell::Cell;

use mond_core::{GlobalError, GlobalHandle, GlobalMemory, Result};

/// The runtime primitive a fault applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Op {
    Allocate,
    Free,
    TransferIn,
    TransferOut,
    Fence,
}

impl Op {
    fn index(self) -> usize {
        match self {
            Op::Allocate => 0,
            Op::Free => 1,
            Op::TransferIn => 2,
            Op::TransferOut => 3,
            Op::Fence => 4,
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum Fault {
    /// Fail the call with this zero-based ordinal.
    Nth(Op, usize),
    /// Fail every call.
    Always(Op),
}

/// Which calls to fail.
#[derive(Clone, Debug, Default)]
pub struct FaultPlan {
    faults: Vec<Fault>,
}

impl FaultPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the `n`-th (zero-based) call of `op`.
    pub fn fail_nth(mut self, op: Op, n: usize) -> Self {
        self.faults.push(Fault::Nth(op, n));
        self
    }

    /// Fail every call of `op`.
    pub fn fail_always(mut self, op: Op) -> Self {
        self.faults.push(Fault::Always(op));
        self
    }

    fn should_fail(&self, op: Op, ordinal: usize) -> bool {
        self.faults.iter().any(|f| match *f {
            Fault::Nth(o, n) => o == op && n == ordinal,
            Fault::Always(o) => o == op,
        })
    }
}

/// Wraps a runtime and injects failures per a [`FaultPlan`].
pub struct FaultyMemory<M> {
    inner: M,
    plan: FaultPlan,
    attempts: [Cell<usize>; 5],
}

impl<M> FaultyMemory<M> {
    pub fn new(inner: M, plan: FaultPlan) -> Self {
        Self {
            inner,
            plan,
            attempts: Default::default(),
        }
    }

    pub fn inner(&self) -> &M {
        &self.inner
    }

    /// Calls of `op` seen so far, including injected failures.
    pub fn attempts(&self, op: Op) -> usize {
        self.attempts[op.index()].get()
    }

    /// Count the call and report whether it should fail.
    fn trip(&self, op: Op) -> bool {
        let counter = &self.attempts[op.index()];
        let ordinal = counter.get();
        counter.set(ordinal + 1);
        self.plan.should_fail(op, ordinal)
    }
}

fn injected() -> String {
    "injected fault".into()
}

impl<M: GlobalMemory> GlobalMemory for FaultyMemory<M> {
    fn allocate(&self, bytes: usize) -> Result<GlobalHandle> {
        if self.trip(Op::Allocate) {
            return Err(GlobalError::Allocation {
                requested: bytes,
                reason: injected(),
            });
        }
        self.inner.allocate(bytes)
    }

    fn free(&self, handle: GlobalHandle) -> Result<()> {
        if self.trip(Op::Free) {
            return Err(GlobalError::InvalidHandle { handle });
        }
        self.inner.free(handle)
    }

    fn transfer_in(&self, src: GlobalHandle, dst: &mut [u8]) -> Result<()> {
        if self.trip(Op::TransferIn) {
            return Err(GlobalError::Transfer {
                handle: src,
                len: dst.len(),
                reason: injected(),
            });
        }
        self.inner.transfer_in(src, dst)
    }

    fn transfer_out(&self, dst: GlobalHandle, src: &[u8]) -> Result<()> {
        if self.trip(Op::TransferOut) {
            return Err(GlobalError::Transfer {
                handle: dst,
                len: src.len(),
                reason: injected(),
            });
        }
        self.inner.transfer_out(dst, src)
    }

    fn fence(&self) -> Result<()> {
        if self.trip(Op::Fence) {
            return Err(GlobalError::Fence { reason: injected() });
        }
        self.inner.fence()
    }
}
