//! Integration tests for pipe networks.
//!
//! These exercise the node algorithm end to end through the bundled grid
//! host: pressure propagation along chains, rotating flow fairness, wrench
//! overrides, removal and snapshots.

use pipeworks_core::connectivity::Connectivity;
use pipeworks_core::event::{PipeEvent, PipeEventKind};
use pipeworks_core::flow::FlowOutcome;
use pipeworks_core::grid::{Direction, DirectionSet, GridPosition};
use pipeworks_core::id::PipeTypeId;
use pipeworks_core::network::PipeGrid;
use pipeworks_core::node::{PipeNode, PipeRecord};
use pipeworks_core::registry::PipeCatalog;
use pipeworks_core::test_utils::*;
use pipeworks_core::world::{Medium, Wrench};

fn total_fluid(grid: &PipeGrid, positions: &[GridPosition]) -> u32 {
    positions
        .iter()
        .filter_map(|&p| grid.tank_at(p))
        .map(|t| t.amount())
        .sum()
}

// ===========================================================================
// Pressure along a chain
// ===========================================================================
//
// Pump(16) -> P1 -> P2 -> ... -> P20. A pipe k hops from the pump settles
// at max(0, 16 - (k - 1)).

#[test]
fn chain_pressure_decays_by_one_per_hop() {
    let (mut grid, ids) = pump_chain(20);
    for _ in 0..ids.len() + 1 {
        grid.step();
    }

    for &id in &ids {
        let node = grid.node(id).unwrap();
        let hops = node.position().manhattan_distance(&origin());
        let expected = 16u32.saturating_sub(hops - 1);
        assert_eq!(node.pressure(), expected, "pipe {hops} hops out");
    }
}

#[test]
fn pump_below_pipe_feeds_it_through_down_output() {
    let mut grid = builtin_grid();
    let pump = grid.catalog().source_id("fluid_pump").unwrap();
    let above = GridPosition::new(0, 1, 0);
    let id = grid.place_pipe(above, iron_pipe(&grid)).unwrap();

    grid.place_source(origin(), pump, DirectionSet::empty().with(Direction::Up))
        .unwrap();
    grid.step();
    assert_eq!(grid.node(id).unwrap().pressure(), 0);

    grid.set_source_outputs(origin(), DirectionSet::empty().with(Direction::Down))
        .unwrap();
    grid.step();
    assert_eq!(grid.node(id).unwrap().pressure(), 16);
}

#[test]
fn chain_is_stable_once_settled() {
    let (mut grid, ids) = pump_chain(8);
    for _ in 0..10 {
        grid.step();
    }
    let settled: Vec<u32> = ids.iter().map(|&id| grid.node(id).unwrap().pressure()).collect();
    for _ in 0..10 {
        grid.step();
    }
    let again: Vec<u32> = ids.iter().map(|&id| grid.node(id).unwrap().pressure()).collect();
    assert_eq!(settled, again);
}

#[test]
fn pressure_never_exceeds_tier_max() {
    let mut grid = builtin_grid();
    let big_pump = grid.catalog().source_id("high_pressure_pump").unwrap();
    let copper = grid.catalog().pipe_id("copper_fluid_pipe").unwrap();
    grid.place_source(origin(), big_pump, DirectionSet::all()).unwrap();
    let id = grid.place_pipe(GridPosition::new(0, 1, 0), copper).unwrap();

    grid.step();
    assert_eq!(grid.node(id).unwrap().pressure(), 8);
}

// ===========================================================================
// Removal invalidates downstream pressure
// ===========================================================================

#[test]
fn removing_a_link_depressurizes_downstream() {
    let (mut grid, ids) = pump_chain(5);
    for _ in 0..6 {
        grid.step();
    }
    assert!(ids.iter().all(|&id| grid.node(id).unwrap().pressure() > 0));

    grid.remove(GridPosition::new(3, 0, 0)).unwrap();
    let mut lost = Vec::new();
    for _ in 0..20 {
        lost.extend(
            grid.step()
                .into_iter()
                .filter(|e| e.kind() == PipeEventKind::PressureLost)
                .map(|e| e.node()),
        );
    }

    assert_eq!(grid.node(ids[0]).unwrap().pressure(), 16);
    assert_eq!(grid.node(ids[1]).unwrap().pressure(), 15);
    assert_eq!(grid.node(ids[3]).unwrap().pressure(), 0);
    assert_eq!(grid.node(ids[4]).unwrap().pressure(), 0);
    assert!(lost.contains(&ids[3]) && lost.contains(&ids[4]));
}

#[test]
fn removing_the_pump_depressurizes_everything() {
    let (mut grid, ids) = pump_chain(4);
    for _ in 0..5 {
        grid.step();
    }
    grid.remove(origin()).unwrap();
    // The highest pressure in the chain drops by at least one per tick.
    for _ in 0..20 {
        grid.step();
    }
    assert!(ids.iter().all(|&id| grid.node(id).unwrap().pressure() == 0));
}

// ===========================================================================
// Rotating flow fairness
// ===========================================================================
//
// A pressurized node with six accepting neighbors serves each exactly K
// times over 6K rollovers.

#[test]
fn six_way_fairness_over_many_rollovers() {
    const K: usize = 25;
    let cooldown = 3;
    let mut world = MockGrid::new();
    world.accept_all(u32::MAX);

    let mut node = PipeNode::new(origin(), PipeTypeId(0), test_spec(10, 4, cooldown));
    node.set_connectivity(Connectivity::from_parts(
        DirectionSet::all(),
        DirectionSet::empty(),
    ));
    node.deserialize(&PipeRecord {
        max_pressure: 10,
        flow_per_tick: 4,
        cooldown: 0,
        transfer_cooldown: cooldown,
        direction_index: 0,
        pressure: 5,
    });

    let mut rollovers = 0;
    while rollovers < 6 * K {
        if node.tick_flow(&mut world).rolled_over() {
            rollovers += 1;
        }
    }

    let mut per_direction = [0usize; Direction::COUNT];
    for t in world.transfers() {
        per_direction[t.direction.index()] += 1;
        assert_eq!(t.amount, 4);
    }
    assert_eq!(per_direction, [K; Direction::COUNT]);
}

#[test]
fn blocked_neighbors_are_skipped_not_retried() {
    let mut world = MockGrid::new();
    let at = origin();
    // Only East accepts; every rollover must still move once.
    world.accept(at.offset(Direction::East), u32::MAX);

    let mut node = PipeNode::new(at, PipeTypeId(0), test_spec(10, 4, 1));
    node.set_connectivity(Connectivity::from_parts(
        DirectionSet::all(),
        DirectionSet::empty(),
    ));
    node.deserialize(&PipeRecord {
        pressure: 3,
        ..node.serialize()
    });

    for _ in 0..12 {
        assert_eq!(
            node.tick_flow(&mut world),
            FlowOutcome::Moved {
                direction: Direction::East,
                amount: 4
            }
        );
    }
}

// ===========================================================================
// Fluid movement through the grid
// ===========================================================================

#[test]
fn fluid_reaches_tank_and_is_conserved() {
    let (mut grid, _) = pump_chain(3);
    let tank_pos = GridPosition::new(4, 0, 0);
    grid.place_container(tank_pos, Medium::Fluid, 100_000).unwrap();
    grid.insert_fluid(GridPosition::new(1, 0, 0), water(1000)).unwrap();

    let cells: Vec<GridPosition> = (1..=4).map(|x| GridPosition::new(x, 0, 0)).collect();
    let mut moved = 0u32;
    for _ in 0..2000 {
        for event in grid.step() {
            if let PipeEvent::FluidTransferred { amount, .. } = event {
                moved += amount;
            }
        }
        assert_eq!(total_fluid(&grid, &cells), 1000);
    }
    assert!(moved > 0);
    assert!(grid.tank_at(tank_pos).unwrap().amount() > 0);
}

#[test]
fn item_containers_are_ignored_by_fluid_pipes() {
    let (mut grid, ids) = pump_chain(1);
    let side = GridPosition::new(1, 0, 1);
    grid.place_container(side, Medium::Item, 1000).unwrap();
    grid.insert_fluid(GridPosition::new(1, 0, 0), water(500)).unwrap();

    assert!(!grid.node(ids[0]).unwrap().is_connected(Direction::South));
    for _ in 0..100 {
        grid.step();
    }
    assert_eq!(grid.tank_at(side).unwrap().amount(), 0);
}

// ===========================================================================
// Wrench overrides
// ===========================================================================

#[test]
fn wrenched_disconnect_blocks_pressure_from_pump() {
    let (mut grid, ids) = pump_chain(2);
    let mut tool = Wrench::default();
    let first = GridPosition::new(1, 0, 0);

    assert!(!grid.wrench(first, Direction::West, &mut tool).unwrap());
    for _ in 0..5 {
        grid.step();
    }
    assert_eq!(grid.node(ids[0]).unwrap().pressure(), 0);
    assert_eq!(grid.node(ids[1]).unwrap().pressure(), 0);

    // Replacing the pump does not undo the override.
    grid.remove(origin()).unwrap();
    let pump = grid.catalog().source_id("fluid_pump").unwrap();
    grid.place_source(origin(), pump, DirectionSet::all()).unwrap();
    assert!(!grid.node(ids[0]).unwrap().is_connected(Direction::West));

    grid.release_override(first, Direction::West).unwrap();
    grid.step();
    assert_eq!(grid.node(ids[0]).unwrap().pressure(), 16);
}

#[test]
fn creative_wrench_does_not_wear() {
    let (mut grid, _) = pump_chain(1);
    let mut tool = Wrench {
        damage: 0,
        creative: true,
    };
    grid.wrench(GridPosition::new(1, 0, 0), Direction::Up, &mut tool).unwrap();
    assert_eq!(tool.damage, 0);
}

// ===========================================================================
// Snapshots
// ===========================================================================

#[test]
fn overrides_survive_snapshot_and_later_neighbor_changes() {
    let (mut grid, _) = pump_chain(2);
    let second = GridPosition::new(2, 0, 0);
    grid.wrench(second, Direction::North, &mut Wrench::default())
        .unwrap();
    for _ in 0..7 {
        grid.step();
    }

    let data = grid.serialize().unwrap();
    let mut restored = PipeGrid::deserialize(&data, PipeCatalog::builtin()).unwrap();
    let north = second.offset(Direction::North);
    restored.place_container(north, Medium::Item, 10).unwrap();
    restored.remove(north).unwrap();

    let node = restored.node_at(second).unwrap();
    assert!(node.is_connected(Direction::North));
    assert!(node.connectivity().is_overridden(Direction::North));
}

#[test]
fn snapshot_mid_cooldown_resumes_on_schedule() {
    let (mut grid, _) = pump_chain(1);
    let pipe = GridPosition::new(1, 0, 0);
    grid.place_container(pipe.offset(Direction::Up), Medium::Fluid, 10_000)
        .unwrap();
    grid.insert_fluid(pipe, water(1000)).unwrap();
    // Iron pipes roll over every 8 ticks; stop partway.
    for _ in 0..5 {
        grid.step();
    }
    let mut restored =
        PipeGrid::deserialize(&grid.serialize().unwrap(), PipeCatalog::builtin()).unwrap();
    assert_eq!(restored.node_at(pipe).unwrap().cooldown(), 5);

    let original: Vec<_> = (0..30).flat_map(|_| grid.step()).map(|e| e.kind()).collect();
    let resumed: Vec<_> = (0..30).flat_map(|_| restored.step()).map(|e| e.kind()).collect();
    assert_eq!(original, resumed);
}

// ===========================================================================
// Larger grids
// ===========================================================================

#[test]
fn plane_runs_deterministically() {
    let mut a = pipe_plane(12, 4);
    let mut b = pipe_plane(12, 4);
    for _ in 0..50 {
        assert_eq!(a.step(), b.step());
    }
    for (_, node) in a.nodes() {
        assert!(node.pressure() <= node.spec().max_pressure);
    }
}
