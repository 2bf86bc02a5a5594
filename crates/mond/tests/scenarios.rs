//! End-to-end scenarios for scalars and arrays.

use bytemuck::{Pod, Zeroable};
use mond::prelude::*;
use mond_test_utils::{poisoned_space, Call, RecordingMemory};

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
struct Particle {
    position: [f32; 3],
    mass: f32,
    id: u64,
}

fn frees<M>(mem: &RecordingMemory<M>) -> usize {
    mem.count(|c| matches!(c, Call::Free { .. }))
}

#[test]
fn scalar_move_scenario() {
    let space = GlobalSpace::with_defaults();
    let mem = RecordingMemory::new(space.context());

    let mut a = OwnedScalar::with_value(&mem, 42i32).unwrap();
    let b = a.take();
    assert_eq!(b.get().unwrap(), 42);

    drop(a);
    assert_eq!(frees(&mem), 0);
    drop(b);
    assert_eq!(frees(&mem), 1);
    assert_eq!(space.live_allocations(), 0);
}

#[test]
fn byte_array_scenario() {
    // Fresh memory reads 0xCD here; nothing below may assume zeroes.
    let space = poisoned_space(1 << 20);
    let ctx = space.context();

    let arr = OwnedArray::<u8, _>::new(&ctx, 4).unwrap();
    arr.at(0).unwrap().write(0xFF).unwrap();
    arr.at(3).unwrap().write(0x01).unwrap();
    assert_eq!(arr.at(0).unwrap().read().unwrap(), 0xFF);
    assert_eq!(arr.at(3).unwrap().read().unwrap(), 0x01);
    assert!(arr.at(1).unwrap().read().is_ok());
}

#[test]
fn array_copy_scenario() {
    let space = GlobalSpace::with_defaults();
    let ctx = space.context();

    let arr = OwnedArray::from_slice(&ctx, &[0xFFu8, 0, 0, 0x01]).unwrap();
    let arr2 = arr.try_clone().unwrap();
    arr2.set(0, 0x10).unwrap();
    assert_eq!(arr.get(0).unwrap(), 0xFF);
    assert_eq!(arr2.read_all().unwrap(), vec![0x10, 0, 0, 0x01]);
}

#[test]
fn zero_length_array_and_bad_index() {
    let space = GlobalSpace::with_defaults();
    let ctx = space.context();
    assert!(matches!(
        OwnedArray::<i32, _>::new(&ctx, 0),
        Err(GlobalError::InvalidArgument { .. })
    ));

    let arr = OwnedArray::<i32, _>::new(&ctx, 3).unwrap();
    assert_eq!(
        arr.at(3).unwrap_err(),
        GlobalError::IndexOutOfRange { index: 3, len: 3 }
    );
}

#[test]
fn struct_elements_round_trip() {
    let space = GlobalSpace::with_defaults();
    let ctx = space.context();

    let p = Particle {
        position: [1.0, -2.0, 0.5],
        mass: 3.25,
        id: 77,
    };
    let scalar = OwnedScalar::with_value(&ctx, p).unwrap();
    assert_eq!(scalar.get().unwrap(), p);

    let swarm = OwnedArray::<Particle, _>::new(&ctx, 8).unwrap();
    assert_eq!(
        space.allocation_size(swarm.handle()),
        Some(8 * std::mem::size_of::<Particle>())
    );
    swarm.set(5, p).unwrap();
    swarm
        .at(5)
        .unwrap()
        .update(|mut q| {
            q.mass *= 2.0;
            q
        })
        .unwrap();
    assert_eq!(swarm.get(5).unwrap().mass, 6.5);
    assert_eq!(swarm.get(5).unwrap().id, 77);
}

#[test]
fn raw_handle_arithmetic_matches_array_indexing() {
    let space = GlobalSpace::with_defaults();
    let ctx = space.context();
    let arr = OwnedArray::from_slice(&ctx, &[10u32, 20, 30, 40]).unwrap();

    let mut h = arr.handle();
    h += 2 * std::mem::size_of::<u32>();
    let proxy = ValueProxy::<u32, _>::new(&ctx, h);
    assert_eq!(proxy.read().unwrap(), 30);
    assert_eq!(proxy.handle(), arr.at(2).unwrap().handle());

    let mut raw = [0u8; 4];
    ctx.transfer_in(arr.handle() + 12, &mut raw).unwrap();
    assert_eq!(u32::from_ne_bytes(raw), 40);
}

#[test]
fn exactly_one_free_on_every_path() {
    let space = GlobalSpace::with_defaults();
    let mem = RecordingMemory::new(space.context());

    // Normal drop.
    drop(OwnedArray::<u16, _>::new(&mem, 10).unwrap());
    assert_eq!(frees(&mem), 1);

    // Move out, then drop both.
    let mut a = OwnedArray::<u16, _>::new(&mem, 10).unwrap();
    let b = a.take();
    drop(a);
    drop(b);
    assert_eq!(frees(&mem), 2);

    // Explicit free.
    OwnedScalar::with_value(&mem, 1u8).unwrap().free().unwrap();
    assert_eq!(frees(&mem), 3);

    // Early return through `?` mid-computation.
    let fails = || -> Result<(), GlobalError> {
        let arr = OwnedArray::<u8, _>::new(&mem, 2)?;
        arr.get(9)?;
        Ok(())
    };
    assert!(fails().is_err());
    assert_eq!(frees(&mem), 4);
    assert_eq!(space.live_allocations(), 0);
}
