#![no_main]
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use pipeworks_core::grid::{Direction, DirectionSet, GridPosition};
use pipeworks_core::id::{PipeTypeId, SourceTypeId};
use pipeworks_core::test_utils::*;
use pipeworks_core::world::{Medium, Wrench};

/// A structured grid operation. Coordinates are folded into a small cube so
/// operations collide often.
#[derive(Arbitrary, Debug)]
enum FuzzOp {
    PlacePipe { at: (u8, u8, u8), tier: u8 },
    PlacePump { at: (u8, u8, u8), outputs: u8 },
    PlaceTank { at: (u8, u8, u8), capacity: u16 },
    Remove { at: (u8, u8, u8) },
    Wrench { at: (u8, u8, u8), face: u8 },
    Release { at: (u8, u8, u8), face: u8 },
    Fill { at: (u8, u8, u8), amount: u16 },
    Step,
}

#[derive(Arbitrary, Debug)]
struct FuzzInput {
    ops: Vec<FuzzOp>,
}

fn pos((x, y, z): (u8, u8, u8)) -> GridPosition {
    GridPosition::new(i32::from(x % 6), i32::from(y % 6), i32::from(z % 6))
}

fuzz_target!(|input: FuzzInput| {
    let mut grid = builtin_grid();
    let mut tool = Wrench::default();
    let tiers = grid.catalog().pipe_count() as u32;

    // Limit operations to prevent timeouts.
    let max_ops = input.ops.len().min(200);

    // Errors are expected; panics are not.
    for op in &input.ops[..max_ops] {
        match *op {
            FuzzOp::PlacePipe { at, tier } => {
                let _ = grid.place_pipe(pos(at), PipeTypeId(u32::from(tier) % tiers));
            }
            FuzzOp::PlacePump { at, outputs } => {
                let _ = grid.place_source(pos(at), SourceTypeId(0), DirectionSet::from_bits(outputs));
            }
            FuzzOp::PlaceTank { at, capacity } => {
                let _ = grid.place_container(pos(at), Medium::Fluid, u32::from(capacity));
            }
            FuzzOp::Remove { at } => {
                let _ = grid.remove(pos(at));
            }
            FuzzOp::Wrench { at, face } => {
                let _ = grid.wrench(pos(at), Direction::from_index(face as usize), &mut tool);
            }
            FuzzOp::Release { at, face } => {
                let _ = grid.release_override(pos(at), Direction::from_index(face as usize));
            }
            FuzzOp::Fill { at, amount } => {
                let _ = grid.insert_fluid(pos(at), water(u32::from(amount)));
            }
            FuzzOp::Step => {
                grid.step();
            }
        }
    }

    for (_, node) in grid.nodes() {
        assert!(node.pressure() <= node.spec().max_pressure);
        assert!((node.rotation_index() as usize) < Direction::COUNT);
    }
});
