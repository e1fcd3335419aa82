//! Shared test helpers for unit tests, integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so integration
//! tests and benches reach them through the `test-utils` feature.

use std::collections::HashMap;

use crate::container::FluidStack;
use crate::grid::{Direction, DirectionSet, GridPosition};
use crate::id::{FluidKindId, NodeId, PipeTypeId};
use crate::network::PipeGrid;
use crate::registry::{PipeCatalog, PipeSpec};
use crate::world::{
    ContainerView, FluidTransfer, Medium, NeighborLookup, Occupant, PipeView,
};

// ===========================================================================
// Positions, specs and occupants
// ===========================================================================

pub fn origin() -> GridPosition {
    GridPosition::new(0, 0, 0)
}

/// A fluid pipe spec with a tank large enough to never limit flow.
pub fn test_spec(max_pressure: u32, flow_per_tick: u32, transfer_cooldown: u32) -> PipeSpec {
    PipeSpec {
        medium: Medium::Fluid,
        max_pressure,
        flow_per_tick,
        transfer_cooldown,
        capacity: flow_per_tick.saturating_mul(10),
    }
}

/// A fluid pipe neighbor with the given pressure, connected on every face.
pub fn pipe_occupant(pressure: u32) -> Occupant {
    Occupant::Pipe(PipeView {
        medium: Medium::Fluid,
        pressure,
        connections: DirectionSet::all(),
    })
}

pub fn container_occupant() -> Occupant {
    Occupant::Container(ContainerView {
        medium: Medium::Fluid,
    })
}

pub fn item_container_occupant() -> Occupant {
    Occupant::Container(ContainerView {
        medium: Medium::Item,
    })
}

pub fn water(amount: u32) -> FluidStack {
    FluidStack::new(FluidKindId(0), amount)
}

// ===========================================================================
// MockGrid
// ===========================================================================

/// One accepted transfer seen by a [`MockGrid`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordedTransfer {
    pub from: GridPosition,
    pub direction: Direction,
    pub amount: u32,
}

/// A scripted world. Occupants are fixed; each target position has an
/// acceptance budget that shrinks as transfers land.
#[derive(Debug, Clone, Default)]
pub struct MockGrid {
    occupants: HashMap<GridPosition, Occupant>,
    budgets: HashMap<GridPosition, u32>,
    default_budget: u32,
    transfers: Vec<RecordedTransfer>,
}

impl MockGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, position: GridPosition, occupant: Occupant) {
        self.occupants.insert(position, occupant);
    }

    /// Let `position` accept up to `amount` units in total.
    pub fn accept(&mut self, position: GridPosition, amount: u32) {
        self.budgets.insert(position, amount);
    }

    /// Budget for every position without an explicit one.
    pub fn accept_all(&mut self, amount: u32) {
        self.default_budget = amount;
    }

    pub fn transfers(&self) -> &[RecordedTransfer] {
        &self.transfers
    }
}

impl NeighborLookup for MockGrid {
    fn occupant(&self, position: GridPosition) -> Occupant {
        self.occupants.get(&position).copied().unwrap_or_default()
    }
}

impl FluidTransfer for MockGrid {
    fn try_transfer(&mut self, from: GridPosition, direction: Direction, max_amount: u32) -> u32 {
        let target = from.offset(direction);
        let budget = self
            .budgets
            .entry(target)
            .or_insert(self.default_budget);
        let moved = max_amount.min(*budget);
        *budget -= moved;
        if moved > 0 {
            self.transfers.push(RecordedTransfer {
                from,
                direction,
                amount: moved,
            });
        }
        moved
    }
}

// ===========================================================================
// PipeGrid builders
// ===========================================================================

pub fn builtin_grid() -> PipeGrid {
    PipeGrid::new(PipeCatalog::builtin())
}

pub fn iron_pipe(grid: &PipeGrid) -> PipeTypeId {
    grid.catalog()
        .pipe_id("iron_fluid_pipe")
        .expect("builtin catalog has iron pipes")
}

/// A pump at the origin feeding `length` iron pipes along +x.
///
/// Returns the grid and the pipe ids in order of distance from the pump.
pub fn pump_chain(length: i32) -> (PipeGrid, Vec<NodeId>) {
    let mut grid = builtin_grid();
    let pump = grid
        .catalog()
        .source_id("fluid_pump")
        .expect("builtin catalog has a pump");
    let pipe = iron_pipe(&grid);
    grid.place_source(origin(), pump, DirectionSet::all())
        .expect("origin is free");
    let ids = (1..=length)
        .map(|x| {
            grid.place_pipe(GridPosition::new(x, 0, 0), pipe)
                .expect("chain cell is free")
        })
        .collect();
    grid.drain_events();
    (grid, ids)
}

/// A `size` x `size` plane of iron pipes with a pump under every
/// `pump_spacing`-th cell in both axes.
pub fn pipe_plane(size: i32, pump_spacing: i32) -> PipeGrid {
    let mut grid = builtin_grid();
    let pump = grid
        .catalog()
        .source_id("fluid_pump")
        .expect("builtin catalog has a pump");
    let pipe = iron_pipe(&grid);
    for x in 0..size {
        for z in 0..size {
            let pos = GridPosition::new(x, 0, z);
            grid.place_pipe(pos, pipe).expect("plane cell is free");
            if x % pump_spacing == 0 && z % pump_spacing == 0 {
                grid.place_source(
                    pos.offset(Direction::Down),
                    pump,
                    DirectionSet::empty().with(Direction::Down),
                )
                .expect("cell under plane is free");
                grid.insert_fluid(pos, water(1000)).expect("pipe has a tank");
            }
        }
    }
    grid.drain_events();
    grid
}
