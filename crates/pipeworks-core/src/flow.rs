//! Rotating flow scheduler.
//!
//! Every `transfer_cooldown` ticks a pressurized pipe tries to push up to
//! `flow_per_tick` units into one neighbor. The scan starts one past the
//! persisted rotation index and walks all six directions, stopping at the
//! first connected neighbor that accepts fluid. The index then advances by
//! exactly one regardless of the outcome, so over six rollovers every
//! direction is tried first once.

use serde::{Deserialize, Serialize};

use crate::grid::{Direction, DirectionSet, GridPosition};
use crate::world::FluidTransfer;

/// Next rotation index after a scan. The scan outcome does not move the
/// starting point further.
pub const fn advance_rotation(index: u8, _found: bool) -> u8 {
    (index + 1) % Direction::COUNT as u8
}

/// Directions in the order a scan from `rotation_index` tries them.
pub fn scan_order(rotation_index: u8) -> [Direction; 6] {
    let start = rotation_index as usize + 1;
    std::array::from_fn(|i| Direction::from_index(start + i))
}

/// What happened on a flow tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowOutcome {
    /// No pressure; the scheduler did not run.
    Idle,
    /// Cooldown still counting.
    Cooling,
    /// Fluid moved into the neighbor in `direction`.
    Moved { direction: Direction, amount: u32 },
    /// The cooldown rolled over but no neighbor accepted anything.
    Blocked,
}

impl FlowOutcome {
    /// Whether the cooldown rolled over this tick.
    pub fn rolled_over(&self) -> bool {
        matches!(self, FlowOutcome::Moved { .. } | FlowOutcome::Blocked)
    }
}

/// Mutable scheduler state owned by a pipe node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FlowState {
    /// Ticks counted toward the next attempt, in `0..transfer_cooldown`.
    pub cooldown: u32,
    /// Scan offset, in `0..6`.
    pub rotation_index: u8,
}

impl FlowState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the cooldown and, on rollover, run one scan.
    pub fn tick<T: FluidTransfer + ?Sized>(
        &mut self,
        transfer_cooldown: u32,
        flow_per_tick: u32,
        connections: DirectionSet,
        from: GridPosition,
        transfer: &mut T,
    ) -> FlowOutcome {
        self.cooldown = self.cooldown.saturating_add(1);
        if self.cooldown < transfer_cooldown {
            return FlowOutcome::Cooling;
        }
        self.cooldown = 0;

        let mut outcome = FlowOutcome::Blocked;
        for direction in scan_order(self.rotation_index) {
            if !connections.contains(direction) {
                continue;
            }
            let amount = transfer.try_transfer(from, direction, flow_per_tick);
            if amount > 0 {
                outcome = FlowOutcome::Moved { direction, amount };
                break;
            }
        }

        self.rotation_index =
            advance_rotation(self.rotation_index, matches!(outcome, FlowOutcome::Moved { .. }));
        debug_assert!((self.rotation_index as usize) < Direction::COUNT);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records every probe and accepts in the configured directions.
    #[derive(Default)]
    struct Probe {
        accepts: DirectionSet,
        calls: Vec<Direction>,
    }

    impl FluidTransfer for Probe {
        fn try_transfer(&mut self, _from: GridPosition, direction: Direction, max: u32) -> u32 {
            self.calls.push(direction);
            if self.accepts.contains(direction) { max } else { 0 }
        }
    }

    const ORIGIN: GridPosition = GridPosition::new(0, 0, 0);

    #[test]
    fn advance_rotation_wraps() {
        assert_eq!(advance_rotation(0, true), 1);
        assert_eq!(advance_rotation(4, false), 5);
        assert_eq!(advance_rotation(5, true), 0);
    }

    #[test]
    fn scan_starts_one_past_index() {
        assert_eq!(
            scan_order(0),
            [
                Direction::Up,
                Direction::North,
                Direction::South,
                Direction::West,
                Direction::East,
                Direction::Down,
            ]
        );
        assert_eq!(scan_order(5)[0], Direction::Down);
    }

    #[test]
    fn cooldown_counts_before_rollover() {
        let mut state = FlowState::new();
        let mut probe = Probe {
            accepts: DirectionSet::all(),
            ..Default::default()
        };

        assert_eq!(state.tick(3, 4, DirectionSet::all(), ORIGIN, &mut probe), FlowOutcome::Cooling);
        assert_eq!(state.tick(3, 4, DirectionSet::all(), ORIGIN, &mut probe), FlowOutcome::Cooling);
        assert!(probe.calls.is_empty());
        assert_eq!(state.rotation_index, 0);

        let outcome = state.tick(3, 4, DirectionSet::all(), ORIGIN, &mut probe);
        assert!(outcome.rolled_over());
        assert_eq!(state.cooldown, 0);
        assert_eq!(state.rotation_index, 1);
    }

    #[test]
    fn stops_at_first_acceptor() {
        let mut state = FlowState::new();
        let mut probe = Probe {
            accepts: DirectionSet::empty().with(Direction::South).with(Direction::East),
            ..Default::default()
        };

        let outcome = state.tick(1, 4, DirectionSet::all(), ORIGIN, &mut probe);
        assert_eq!(
            outcome,
            FlowOutcome::Moved {
                direction: Direction::South,
                amount: 4
            }
        );
        assert_eq!(
            probe.calls,
            vec![Direction::Up, Direction::North, Direction::South]
        );
    }

    #[test]
    fn disconnected_faces_are_never_probed() {
        let mut state = FlowState::new();
        let mut probe = Probe {
            accepts: DirectionSet::all(),
            ..Default::default()
        };
        let connections = DirectionSet::empty().with(Direction::Down);

        let outcome = state.tick(1, 2, connections, ORIGIN, &mut probe);
        assert_eq!(
            outcome,
            FlowOutcome::Moved {
                direction: Direction::Down,
                amount: 2
            }
        );
        assert_eq!(probe.calls, vec![Direction::Down]);
    }

    #[test]
    fn blocked_scan_still_advances_rotation() {
        let mut state = FlowState {
            cooldown: 0,
            rotation_index: 5,
        };
        let mut probe = Probe::default();

        assert_eq!(
            state.tick(1, 4, DirectionSet::all(), ORIGIN, &mut probe),
            FlowOutcome::Blocked
        );
        assert_eq!(probe.calls.len(), 6);
        assert_eq!(state.rotation_index, 0);
    }

    #[test]
    fn zero_or_one_cooldown_fires_every_tick() {
        for cooldown in [0, 1] {
            let mut state = FlowState::new();
            let mut probe = Probe::default();
            for expected in 1..=3u8 {
                assert!(state.tick(cooldown, 1, DirectionSet::all(), ORIGIN, &mut probe).rolled_over());
                assert_eq!(state.rotation_index, expected);
            }
        }
    }
}
