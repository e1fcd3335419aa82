//! Pressure field evaluation.
//!
//! Pressure is a small integer field over the pipe graph. A pipe takes the
//! best contribution among its six neighbors:
//!
//! - a connected pressure source that lists the direction from this pipe
//!   toward it as an output contributes its induced pressure;
//! - any neighboring pipe contributes its own pressure minus one;
//! - anything else contributes nothing.
//!
//! The result is clamped to `0..=max_pressure`. Neighbor pressures are read
//! as they stand, so a value may be from this tick or the previous one
//! depending on host iteration order. A chain of N pipes settles within N
//! ticks.

use crate::connectivity::Connectivity;
use crate::grid::Direction;
use crate::world::{Neighborhood, Occupant};

/// Contribution of a single neighbor.
///
/// `connected` is this pipe's connection flag toward `direction`. It gates
/// source contributions only; pipe-to-pipe propagation ignores it.
pub fn contribution(direction: Direction, neighbor: &Occupant, connected: bool) -> u32 {
    match neighbor {
        Occupant::Source(source) if connected && source.outputs.contains(direction) => {
            source.induced_pressure
        }
        Occupant::Pipe(pipe) => pipe.pressure.saturating_sub(1),
        _ => 0,
    }
}

/// Best neighbor contribution clamped to `max_pressure`.
pub fn evaluate(max_pressure: u32, connectivity: &Connectivity, hood: &Neighborhood) -> u32 {
    let best = hood
        .iter()
        .map(|(d, occ)| contribution(d, occ, connectivity.is_connected(d)))
        .max()
        .unwrap_or(0);
    best.min(max_pressure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::DirectionSet;
    use crate::world::{ContainerView, Medium, PipeView, SourceView};

    fn pipe(pressure: u32) -> Occupant {
        Occupant::Pipe(PipeView {
            medium: Medium::Fluid,
            pressure,
            connections: DirectionSet::all(),
        })
    }

    fn pump(induced: u32, outputs: DirectionSet) -> Occupant {
        Occupant::Source(SourceView {
            medium: Medium::Fluid,
            induced_pressure: induced,
            outputs,
        })
    }

    fn all_connected() -> Connectivity {
        Connectivity::from_parts(DirectionSet::all(), DirectionSet::empty())
    }

    #[test]
    fn isolated_node_has_zero_pressure() {
        assert_eq!(evaluate(10, &all_connected(), &Neighborhood::default()), 0);
    }

    #[test]
    fn pipe_neighbor_decays_by_one() {
        let mut hood = Neighborhood::default();
        hood.set(Direction::West, pipe(7));
        assert_eq!(evaluate(10, &all_connected(), &hood), 6);
    }

    #[test]
    fn zero_pressure_pipe_contributes_nothing() {
        let mut hood = Neighborhood::default();
        hood.set(Direction::West, pipe(0));
        assert_eq!(evaluate(10, &all_connected(), &hood), 0);
    }

    #[test]
    fn pipe_propagation_ignores_own_connection_flag() {
        let mut hood = Neighborhood::default();
        hood.set(Direction::Up, pipe(4));
        assert_eq!(evaluate(10, &Connectivity::new(), &hood), 3);
    }

    #[test]
    fn source_feeding_this_face_contributes_full_pressure() {
        // Pump sits to the west and lists West as an output.
        let mut hood = Neighborhood::default();
        hood.set(
            Direction::West,
            pump(8, DirectionSet::empty().with(Direction::West)),
        );
        assert_eq!(evaluate(10, &all_connected(), &hood), 8);
    }

    #[test]
    fn source_output_is_matched_against_scanned_direction() {
        let mut hood = Neighborhood::default();
        hood.set(
            Direction::Down,
            pump(9, DirectionSet::empty().with(Direction::Up)),
        );
        assert_eq!(evaluate(10, &all_connected(), &hood), 0);

        hood.set(
            Direction::Down,
            pump(9, DirectionSet::empty().with(Direction::Down)),
        );
        assert_eq!(evaluate(10, &all_connected(), &hood), 9);
    }

    #[test]
    fn source_facing_away_contributes_nothing() {
        let mut hood = Neighborhood::default();
        hood.set(
            Direction::West,
            pump(8, DirectionSet::empty().with(Direction::North)),
        );
        assert_eq!(evaluate(10, &all_connected(), &hood), 0);
    }

    #[test]
    fn disconnected_source_contributes_nothing() {
        let mut hood = Neighborhood::default();
        hood.set(Direction::West, pump(8, DirectionSet::all()));
        assert_eq!(evaluate(10, &Connectivity::new(), &hood), 0);
    }

    #[test]
    fn result_is_capped_at_max_pressure() {
        let mut hood = Neighborhood::default();
        hood.set(Direction::Down, pump(50, DirectionSet::all()));
        assert_eq!(evaluate(12, &all_connected(), &hood), 12);
    }

    #[test]
    fn best_neighbor_wins() {
        let mut hood = Neighborhood::default();
        hood.set(Direction::Down, pipe(3));
        hood.set(Direction::Up, pipe(9));
        hood.set(Direction::North, pump(5, DirectionSet::all()));
        hood.set(
            Direction::South,
            Occupant::Container(ContainerView { medium: Medium::Fluid }),
        );
        assert_eq!(evaluate(20, &all_connected(), &hood), 8);
    }
}
