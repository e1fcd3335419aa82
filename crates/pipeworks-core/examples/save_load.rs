//! Save/load example: snapshot round-trip.
//!
//! Builds a small pipe network with a wrenched face, runs it partway through
//! a cooldown, saves it to bytes, loads it into a new grid, and verifies both
//! grids keep producing identical snapshots.
//!
//! Run with: `cargo run -p pipeworks-core --example save_load`

use pipeworks_core::container::FluidStack;
use pipeworks_core::grid::{Direction, DirectionSet, GridPosition};
use pipeworks_core::id::FluidKindId;
use pipeworks_core::network::PipeGrid;
use pipeworks_core::registry::PipeCatalog;
use pipeworks_core::serialize::read_snapshot_header;
use pipeworks_core::world::{Medium, Wrench};

/// Pump -> gold pipe -> gold pipe -> tank, with a wrenched stub face.
fn build_network() -> Result<PipeGrid, Box<dyn std::error::Error>> {
    let mut grid = PipeGrid::new(PipeCatalog::builtin());
    let pump = grid
        .catalog()
        .source_id("high_pressure_pump")
        .ok_or("missing pump type")?;
    let gold = grid
        .catalog()
        .pipe_id("gold_fluid_pipe")
        .ok_or("missing pipe type")?;

    grid.place_source(GridPosition::new(0, 0, 0), pump, DirectionSet::all())?;
    grid.place_pipe(GridPosition::new(0, 1, 0), gold)?;
    grid.place_pipe(GridPosition::new(0, 2, 0), gold)?;
    grid.place_container(GridPosition::new(0, 3, 0), Medium::Fluid, 8000)?;
    grid.wrench(
        GridPosition::new(0, 2, 0),
        Direction::East,
        &mut Wrench::default(),
    )?;
    grid.insert_fluid(
        GridPosition::new(0, 1, 0),
        FluidStack::new(FluidKindId(1), 2000),
    )?;
    Ok(grid)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // --- Step 1: Build and run ---

    let mut grid = build_network()?;
    println!("Running 12 ticks...\n");
    for _ in 0..12 {
        grid.step();
    }

    // --- Step 2: Serialize ---

    let bytes = grid.serialize()?;
    let header = read_snapshot_header(&bytes)?;
    println!(
        "Serialized to {} bytes (format v{}, tick {})",
        bytes.len(),
        header.version,
        header.tick
    );

    // --- Step 3: Deserialize ---

    let mut restored = PipeGrid::deserialize(&bytes, PipeCatalog::builtin())?;
    println!("Deserialized {} pipes", restored.node_count());

    // --- Step 4: Run both and compare ---

    for _ in 0..50 {
        grid.step();
        restored.step();
    }
    let same = grid.serialize()? == restored.serialize()?;
    println!("\nAfter 50 more ticks the snapshots match: {same}");
    if !same {
        return Err("save/load round trip diverged".into());
    }

    let tank = GridPosition::new(0, 3, 0);
    println!(
        "Tank: {} units in both grids",
        restored.tank_at(tank).map_or(0, |t| t.amount())
    );
    Ok(())
}
