//! Directional connectivity: which faces of a pipe are joined to their
//! neighbors.
//!
//! Connectivity is computed automatically on placement and rechecked one face
//! at a time whenever a neighboring cell changes. A face that was set by hand
//! with a wrench is marked *overridden* and automatic rechecks leave it alone
//! until the override is released.

use serde::{Deserialize, Serialize};

use crate::grid::{Direction, DirectionSet, GridPosition};
use crate::world::{Medium, NeighborLookup, Neighborhood, Occupant, WrenchTool};

// ---------------------------------------------------------------------------
// ConnectPolicy
// ---------------------------------------------------------------------------

/// Compatibility predicate for a kind of pipe.
pub trait ConnectPolicy {
    /// Whether a pipe of this kind may join `neighbor`, which sits in
    /// `direction` from the pipe.
    fn can_connect(&self, neighbor: &Occupant, direction: Direction) -> bool;
}

impl ConnectPolicy for Medium {
    /// Pipes mate with any pipe, source or container carrying the same
    /// medium. Empty cells never connect.
    fn can_connect(&self, neighbor: &Occupant, _direction: Direction) -> bool {
        neighbor.medium() == Some(*self)
    }
}

// ---------------------------------------------------------------------------
// Connectivity
// ---------------------------------------------------------------------------

/// Per-face connection flags plus the manual-override mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Connectivity {
    connected: DirectionSet,
    overridden: DirectionSet,
}

impl Connectivity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted masks.
    pub fn from_parts(connected: DirectionSet, overridden: DirectionSet) -> Self {
        Self {
            connected,
            overridden,
        }
    }

    /// Connectivity of a freshly placed pipe against its current neighbors.
    pub fn compute<P, L>(policy: &P, lookup: &L, position: GridPosition) -> Self
    where
        P: ConnectPolicy + ?Sized,
        L: NeighborLookup + ?Sized,
    {
        Self::from_neighborhood(policy, &Neighborhood::gather(lookup, position))
    }

    pub fn from_neighborhood<P: ConnectPolicy + ?Sized>(policy: &P, hood: &Neighborhood) -> Self {
        let connected = hood
            .iter()
            .filter(|(d, occ)| policy.can_connect(occ, *d))
            .map(|(d, _)| d)
            .collect();
        Self {
            connected,
            overridden: DirectionSet::empty(),
        }
    }

    pub fn is_connected(&self, direction: Direction) -> bool {
        self.connected.contains(direction)
    }

    pub fn is_overridden(&self, direction: Direction) -> bool {
        self.overridden.contains(direction)
    }

    pub fn connected(&self) -> DirectionSet {
        self.connected
    }

    pub fn overridden(&self) -> DirectionSet {
        self.overridden
    }

    /// Re-evaluate one face after the neighbor in `direction` changed.
    ///
    /// Overridden faces are skipped. Returns `true` if the flag changed.
    pub fn recheck<P: ConnectPolicy + ?Sized>(
        &mut self,
        policy: &P,
        direction: Direction,
        neighbor: &Occupant,
    ) -> bool {
        if self.overridden.contains(direction) {
            return false;
        }
        let now = policy.can_connect(neighbor, direction);
        let changed = now != self.connected.contains(direction);
        self.connected.set(direction, now);
        changed
    }

    /// Re-evaluate every face. Returns the faces whose flag changed.
    pub fn recheck_all<P: ConnectPolicy + ?Sized>(
        &mut self,
        policy: &P,
        hood: &Neighborhood,
    ) -> DirectionSet {
        hood.iter()
            .filter_map(|(d, occ)| self.recheck(policy, d, occ).then_some(d))
            .collect()
    }

    /// Toggle a face by hand and pin it against automatic rechecks.
    ///
    /// Wears the tool by one unit. Returns the new connection state.
    pub fn wrench<T: WrenchTool + ?Sized>(&mut self, direction: Direction, tool: &mut T) -> bool {
        let now = !self.connected.contains(direction);
        self.connected.set(direction, now);
        self.overridden.insert(direction);
        tool.wear();
        now
    }

    /// Hand a face back to automatic rechecks. The connection flag is left
    /// as-is until the next recheck.
    pub fn release(&mut self, direction: Direction) {
        self.overridden.remove(direction);
    }
}
