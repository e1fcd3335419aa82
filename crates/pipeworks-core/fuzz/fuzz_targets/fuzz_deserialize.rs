#![no_main]
use libfuzzer_sys::fuzz_target;
use pipeworks_core::network::PipeGrid;
use pipeworks_core::registry::PipeCatalog;

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes must produce Err, never a panic. A grid that does
    // load must survive a few ticks.
    if let Ok(mut grid) = PipeGrid::deserialize(data, PipeCatalog::builtin()) {
        for _ in 0..4 {
            grid.step();
        }
    }
});
