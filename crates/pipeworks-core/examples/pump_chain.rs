//! Pump chain example: pressure decay and fluid delivery.
//!
//! Places a pump, a line of iron pipes and a tank, fills the first pipe and
//! runs until the tank has received fluid. Prints each pipe's pressure and
//! the transfer events as they happen.
//!
//! Run with: `RUST_LOG=debug cargo run -p pipeworks-core --example pump_chain`

use pipeworks_core::container::FluidStack;
use pipeworks_core::event::PipeEvent;
use pipeworks_core::grid::{DirectionSet, GridPosition};
use pipeworks_core::id::FluidKindId;
use pipeworks_core::network::PipeGrid;
use pipeworks_core::registry::PipeCatalog;
use pipeworks_core::world::Medium;

const CHAIN_LENGTH: i32 = 6;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let catalog = PipeCatalog::builtin();
    let pump = catalog
        .source_id("fluid_pump")
        .ok_or("builtin catalog has no fluid_pump")?;
    let pipe = catalog
        .pipe_id("iron_fluid_pipe")
        .ok_or("builtin catalog has no iron_fluid_pipe")?;
    let mut grid = PipeGrid::new(catalog);

    grid.place_source(GridPosition::new(0, 0, 0), pump, DirectionSet::all())?;
    for x in 1..=CHAIN_LENGTH {
        grid.place_pipe(GridPosition::new(x, 0, 0), pipe)?;
    }
    let tank = GridPosition::new(CHAIN_LENGTH + 1, 0, 0);
    grid.place_container(tank, Medium::Fluid, 10_000)?;
    grid.insert_fluid(GridPosition::new(1, 0, 0), FluidStack::new(FluidKindId(0), 1000))?;
    grid.drain_events();

    grid.step();
    println!("=== Pressure after one tick ===");
    for x in 1..=CHAIN_LENGTH {
        let pressure = grid.pressure_at(GridPosition::new(x, 0, 0)).unwrap_or(0);
        println!("  pipe {x}: {pressure}");
    }

    println!();
    println!("=== Transfers ===");
    while grid.tank_at(tank).map_or(0, |t| t.amount()) == 0 && grid.tick() < 5000 {
        for event in grid.step() {
            if let PipeEvent::FluidTransferred {
                node,
                direction,
                amount,
                tick,
            } = event
            {
                let at = grid.node(node).map(|n| n.position());
                println!("  tick {tick:>4}: {at:?} -> {direction:?} ({amount})");
            }
        }
    }

    println!();
    println!(
        "Tank holds {} units after {} ticks",
        grid.tank_at(tank).map_or(0, |t| t.amount()),
        grid.tick()
    );
    Ok(())
}
