//! The boundary between a pipe node and the world that hosts it.
//!
//! A node never owns or iterates the grid. It asks a [`NeighborLookup`] about
//! single cells, receives a closed [`Occupant`] variant, and pushes fluid
//! through a [`FluidTransfer`]. Hosts (the bundled
//! [`PipeGrid`](crate::network::PipeGrid), a game engine, or a test mock)
//! implement these traits.

use serde::{Deserialize, Serialize};

use crate::grid::{Direction, DirectionSet, GridPosition};

// ---------------------------------------------------------------------------
// Medium
// ---------------------------------------------------------------------------

/// What a block carries. Pipes only mate with blocks of the same medium.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Medium {
    #[default]
    Fluid,
    Item,
}

// ---------------------------------------------------------------------------
// Occupant
// ---------------------------------------------------------------------------

/// Read-only view of a neighboring pipe node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipeView {
    pub medium: Medium,
    /// Pressure as last written by that node (this tick or the previous one).
    pub pressure: u32,
    /// Faces the neighbor is connected on.
    pub connections: DirectionSet,
}

/// Read-only view of a pressure source such as a pump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceView {
    pub medium: Medium,
    pub induced_pressure: u32,
    /// Directions, as seen from an adjacent pipe looking at this source, in
    /// which the source feeds that pipe.
    pub outputs: DirectionSet,
}

/// Read-only view of a plain container (tank, machine inventory).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerView {
    pub medium: Medium,
}

/// Whatever occupies a grid cell, resolved once per lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Occupant {
    Pipe(PipeView),
    Source(SourceView),
    Container(ContainerView),
    #[default]
    Empty,
}

/// Tag-only form of [`Occupant`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OccupantKind {
    PipeNode,
    PressureSource,
    PlainContainer,
    None,
}

impl Occupant {
    pub fn kind(&self) -> OccupantKind {
        match self {
            Occupant::Pipe(_) => OccupantKind::PipeNode,
            Occupant::Source(_) => OccupantKind::PressureSource,
            Occupant::Container(_) => OccupantKind::PlainContainer,
            Occupant::Empty => OccupantKind::None,
        }
    }

    /// Medium of the occupant, or `None` for an empty cell.
    pub fn medium(&self) -> Option<Medium> {
        match self {
            Occupant::Pipe(p) => Some(p.medium),
            Occupant::Source(s) => Some(s.medium),
            Occupant::Container(c) => Some(c.medium),
            Occupant::Empty => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Host traits
// ---------------------------------------------------------------------------

/// Single-cell queries against the host grid.
pub trait NeighborLookup {
    fn occupant(&self, position: GridPosition) -> Occupant;

    fn occupant_kind(&self, position: GridPosition) -> OccupantKind {
        self.occupant(position).kind()
    }
}

/// Moves fluid out of the node at `from` into whatever sits at
/// `from + direction`.
///
/// Returns the amount moved, in `0..=max_amount`. A return of zero must leave
/// both sides untouched, so callers may probe speculatively.
pub trait FluidTransfer {
    fn try_transfer(&mut self, from: GridPosition, direction: Direction, max_amount: u32) -> u32;
}

/// A tool used to reorient pipe faces by hand.
pub trait WrenchTool {
    /// Consume one unit of durability.
    fn wear(&mut self);
}

/// A plain wrench that counts damage. Creative wrenches never wear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Wrench {
    pub damage: u32,
    pub creative: bool,
}

impl WrenchTool for Wrench {
    fn wear(&mut self) {
        if !self.creative {
            self.damage = self.damage.saturating_add(1);
        }
    }
}

// ---------------------------------------------------------------------------
// Neighborhood
// ---------------------------------------------------------------------------

/// The six occupants around a cell, indexed by [`Direction::index`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Neighborhood {
    occupants: [Occupant; 6],
}

impl Neighborhood {
    pub fn new(occupants: [Occupant; 6]) -> Self {
        Self { occupants }
    }

    /// Query all six neighbors of `position`.
    pub fn gather<L: NeighborLookup + ?Sized>(lookup: &L, position: GridPosition) -> Self {
        let mut occupants = [Occupant::Empty; 6];
        for (direction, pos) in position.neighbors() {
            occupants[direction.index()] = lookup.occupant(pos);
        }
        Self { occupants }
    }

    pub fn get(&self, direction: Direction) -> &Occupant {
        &self.occupants[direction.index()]
    }

    pub fn set(&mut self, direction: Direction, occupant: Occupant) {
        self.occupants[direction.index()] = occupant;
    }

    pub fn iter(&self) -> impl Iterator<Item = (Direction, &Occupant)> {
        Direction::ALL
            .into_iter()
            .map(move |d| (d, &self.occupants[d.index()]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct Cells(HashMap<GridPosition, Occupant>);

    impl NeighborLookup for Cells {
        fn occupant(&self, position: GridPosition) -> Occupant {
            self.0.get(&position).copied().unwrap_or_default()
        }
    }

    #[test]
    fn occupant_kind_matches_variant() {
        let pipe = Occupant::Pipe(PipeView {
            medium: Medium::Fluid,
            pressure: 3,
            connections: DirectionSet::empty(),
        });
        assert_eq!(pipe.kind(), OccupantKind::PipeNode);
        assert_eq!(Occupant::Empty.kind(), OccupantKind::None);
        assert_eq!(
            Occupant::Container(ContainerView { medium: Medium::Item }).medium(),
            Some(Medium::Item)
        );
        assert_eq!(Occupant::Empty.medium(), None);
    }

    #[test]
    fn gather_places_occupants_by_direction() {
        let origin = GridPosition::new(0, 0, 0);
        let mut cells = HashMap::new();
        cells.insert(
            origin.offset(Direction::East),
            Occupant::Container(ContainerView { medium: Medium::Fluid }),
        );
        let lookup = Cells(cells);

        let hood = Neighborhood::gather(&lookup, origin);
        assert_eq!(hood.get(Direction::East).kind(), OccupantKind::PlainContainer);
        assert_eq!(hood.get(Direction::West).kind(), OccupantKind::None);
        assert_eq!(lookup.occupant_kind(origin), OccupantKind::None);
    }

    #[test]
    fn wrench_wears_unless_creative() {
        let mut survival = Wrench::default();
        survival.wear();
        survival.wear();
        assert_eq!(survival.damage, 2);

        let mut creative = Wrench {
            damage: 0,
            creative: true,
        };
        creative.wear();
        assert_eq!(creative.damage, 0);
    }
}
