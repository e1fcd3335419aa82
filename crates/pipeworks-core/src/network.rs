//! A sparse voxel grid hosting pipe nodes, pressure sources and containers.
//!
//! [`PipeGrid`] is the bundled host for the node algorithm. It implements
//! [`NeighborLookup`] and [`FluidTransfer`] over its own cells, keeps
//! neighbor connectivity in sync as blocks come and go, and advances every
//! pipe once per [`step`](PipeGrid::step) in a fixed node order.
//!
//! Pipe tanks live beside the nodes in a [`SecondaryMap`] so that a node can
//! be borrowed mutably while its transfer touches other tanks.

use std::collections::BTreeMap;

use log::{debug, trace};
use serde::{Deserialize, Serialize};
use slotmap::{SecondaryMap, SlotMap};

use crate::Ticks;
use crate::container::{FluidStack, FluidTank};
use crate::event::PipeEvent;
use crate::flow::FlowOutcome;
use crate::grid::{Direction, DirectionSet, GridPosition};
use crate::id::{NodeId, PipeTypeId, SourceTypeId};
use crate::node::PipeNode;
use crate::registry::PipeCatalog;
use crate::world::{
    ContainerView, FluidTransfer, Medium, NeighborLookup, Neighborhood, Occupant, SourceView,
    WrenchTool,
};

// ---------------------------------------------------------------------------
// Cell contents
// ---------------------------------------------------------------------------

/// A pump or similar block that induces pressure in adjacent pipes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PressureSource {
    pub source_type: SourceTypeId,
    pub medium: Medium,
    pub induced_pressure: u32,
    /// A pipe whose neighbor in direction `d` is this source is fed when
    /// this set contains `d`.
    pub outputs: DirectionSet,
}

impl PressureSource {
    pub fn view(&self) -> SourceView {
        SourceView {
            medium: self.medium,
            induced_pressure: self.induced_pressure,
            outputs: self.outputs,
        }
    }
}

/// A tank or machine that accepts fluid but does not move it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlainContainer {
    pub medium: Medium,
    pub tank: FluidTank,
}

#[derive(Debug, Clone)]
pub(crate) enum Cell {
    Pipe(NodeId),
    Source(PressureSource),
    Container(PlainContainer),
}

/// Errors from grid mutations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    #[error("position {0:?} is occupied")]
    Occupied(GridPosition),
    #[error("nothing is placed at {0:?}")]
    NotPlaced(GridPosition),
    #[error("block at {0:?} is not a pipe")]
    NotAPipe(GridPosition),
    #[error("block at {0:?} is not a pressure source")]
    NotASource(GridPosition),
    #[error("block at {0:?} has no tank")]
    NoTank(GridPosition),
    #[error("unknown pipe type {0:?}")]
    UnknownPipeType(PipeTypeId),
    #[error("unknown source type {0:?}")]
    UnknownSourceType(SourceTypeId),
}

// ---------------------------------------------------------------------------
// PipeGrid
// ---------------------------------------------------------------------------

/// Host world for pipe nodes.
#[derive(Debug)]
pub struct PipeGrid {
    pub(crate) catalog: PipeCatalog,
    pub(crate) cells: BTreeMap<GridPosition, Cell>,
    pub(crate) nodes: SlotMap<NodeId, PipeNode>,
    pub(crate) tanks: SecondaryMap<NodeId, FluidTank>,
    pub(crate) tick: Ticks,
    pub(crate) events: Vec<PipeEvent>,
}

impl PipeGrid {
    pub fn new(catalog: PipeCatalog) -> Self {
        Self {
            catalog,
            cells: BTreeMap::new(),
            nodes: SlotMap::with_key(),
            tanks: SecondaryMap::new(),
            tick: 0,
            events: Vec::new(),
        }
    }

    pub fn catalog(&self) -> &PipeCatalog {
        &self.catalog
    }

    /// Number of completed steps.
    pub fn tick(&self) -> Ticks {
        self.tick
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, id: NodeId) -> Option<&PipeNode> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &PipeNode)> {
        self.nodes.iter()
    }

    pub fn node_id_at(&self, position: GridPosition) -> Option<NodeId> {
        match self.cells.get(&position) {
            Some(&Cell::Pipe(id)) => Some(id),
            _ => None,
        }
    }

    pub fn node_at(&self, position: GridPosition) -> Option<&PipeNode> {
        self.node_id_at(position).and_then(|id| self.nodes.get(id))
    }

    /// Pressure of the pipe at `position`, if there is one.
    pub fn pressure_at(&self, position: GridPosition) -> Option<u32> {
        self.node_at(position).map(PipeNode::pressure)
    }

    pub fn source_at(&self, position: GridPosition) -> Option<&PressureSource> {
        match self.cells.get(&position) {
            Some(Cell::Source(source)) => Some(source),
            _ => None,
        }
    }

    /// Tank of the pipe or container at `position`.
    pub fn tank_at(&self, position: GridPosition) -> Option<&FluidTank> {
        match self.cells.get(&position)? {
            Cell::Pipe(id) => self.tanks.get(*id),
            Cell::Container(container) => Some(&container.tank),
            Cell::Source(_) => None,
        }
    }

    fn tank_at_mut(&mut self, position: GridPosition) -> Option<&mut FluidTank> {
        match self.cells.get_mut(&position)? {
            Cell::Pipe(id) => self.tanks.get_mut(*id),
            Cell::Container(container) => Some(&mut container.tank),
            Cell::Source(_) => None,
        }
    }

    // -- Mutations --

    /// Place a pipe of `pipe_type` and connect it to its neighbors.
    pub fn place_pipe(
        &mut self,
        position: GridPosition,
        pipe_type: PipeTypeId,
    ) -> Result<NodeId, GridError> {
        self.ensure_vacant(position)?;
        let spec = self
            .catalog
            .pipe_spec(pipe_type)
            .ok_or(GridError::UnknownPipeType(pipe_type))?;

        let node = PipeNode::place(position, pipe_type, spec, &*self);
        let connected = node.connectivity().connected();
        let id = self.nodes.insert(node);
        self.tanks.insert(id, FluidTank::new(spec.capacity));
        self.cells.insert(position, Cell::Pipe(id));

        for direction in connected.iter() {
            self.events.push(PipeEvent::ConnectionChanged {
                node: id,
                direction,
                connected: true,
            });
        }
        debug!("placed pipe {id:?} ({pipe_type:?}) at {position:?}, connected {connected:?}");

        self.notify_neighbors(position);
        Ok(id)
    }

    /// Place a pressure source of `source_type` feeding pipes per `outputs`.
    pub fn place_source(
        &mut self,
        position: GridPosition,
        source_type: SourceTypeId,
        outputs: DirectionSet,
    ) -> Result<(), GridError> {
        self.ensure_vacant(position)?;
        let def = self
            .catalog
            .source(source_type)
            .ok_or(GridError::UnknownSourceType(source_type))?;
        let source = PressureSource {
            source_type,
            medium: def.spec.medium,
            induced_pressure: def.spec.induced_pressure,
            outputs,
        };
        self.cells.insert(position, Cell::Source(source));
        debug!("placed source {source_type:?} at {position:?}, outputs {outputs:?}");

        self.notify_neighbors(position);
        Ok(())
    }

    /// Place a plain container with an empty tank.
    pub fn place_container(
        &mut self,
        position: GridPosition,
        medium: Medium,
        capacity: u32,
    ) -> Result<(), GridError> {
        self.ensure_vacant(position)?;
        self.cells.insert(
            position,
            Cell::Container(PlainContainer {
                medium,
                tank: FluidTank::new(capacity),
            }),
        );
        debug!("placed {medium:?} container at {position:?}, capacity {capacity}");

        self.notify_neighbors(position);
        Ok(())
    }

    /// Remove whatever occupies `position`. Neighboring pipes drop their
    /// connection toward it unless that face is overridden.
    pub fn remove(&mut self, position: GridPosition) -> Result<(), GridError> {
        let cell = self
            .cells
            .remove(&position)
            .ok_or(GridError::NotPlaced(position))?;
        if let Cell::Pipe(id) = cell {
            self.nodes.remove(id);
            self.tanks.remove(id);
            debug!("removed pipe {id:?} at {position:?}");
        } else {
            debug!("removed block at {position:?}");
        }

        self.notify_neighbors(position);
        Ok(())
    }

    /// Toggle one face of the pipe at `position` by hand.
    ///
    /// Returns the new connection state of that face.
    pub fn wrench<T: WrenchTool + ?Sized>(
        &mut self,
        position: GridPosition,
        direction: Direction,
        tool: &mut T,
    ) -> Result<bool, GridError> {
        let id = self.pipe_id(position)?;
        let node = self
            .nodes
            .get_mut(id)
            .ok_or(GridError::NotAPipe(position))?;
        let connected = node.on_wrench(direction, tool);
        self.events.push(PipeEvent::ConnectionChanged {
            node: id,
            direction,
            connected,
        });
        debug!("wrenched {id:?} {direction:?} -> connected={connected}");
        Ok(connected)
    }

    /// Return a wrenched face to automatic control and recheck it.
    pub fn release_override(
        &mut self,
        position: GridPosition,
        direction: Direction,
    ) -> Result<(), GridError> {
        let id = self.pipe_id(position)?;
        let neighbor = self.occupant(position.offset(direction));
        if let Some(node) = self.nodes.get_mut(id) {
            let mut connectivity = *node.connectivity();
            connectivity.release(direction);
            node.set_connectivity(connectivity);
            if node.recheck(direction, &neighbor) {
                self.events.push(PipeEvent::ConnectionChanged {
                    node: id,
                    direction,
                    connected: node.is_connected(direction),
                });
            }
        }
        Ok(())
    }

    /// Reorient a pressure source.
    pub fn set_source_outputs(
        &mut self,
        position: GridPosition,
        outputs: DirectionSet,
    ) -> Result<(), GridError> {
        match self.cells.get_mut(&position) {
            Some(Cell::Source(source)) => {
                source.outputs = outputs;
                Ok(())
            }
            Some(_) => Err(GridError::NotASource(position)),
            None => Err(GridError::NotPlaced(position)),
        }
    }

    /// Put fluid into the pipe or container at `position`. Returns the
    /// accepted amount.
    pub fn insert_fluid(
        &mut self,
        position: GridPosition,
        stack: FluidStack,
    ) -> Result<u32, GridError> {
        if !self.cells.contains_key(&position) {
            return Err(GridError::NotPlaced(position));
        }
        let tank = self
            .tank_at_mut(position)
            .ok_or(GridError::NoTank(position))?;
        Ok(tank.insert(stack))
    }

    /// Take up to `max` units out of the pipe or container at `position`.
    pub fn extract_fluid(
        &mut self,
        position: GridPosition,
        max: u32,
    ) -> Result<Option<FluidStack>, GridError> {
        if !self.cells.contains_key(&position) {
            return Err(GridError::NotPlaced(position));
        }
        let tank = self
            .tank_at_mut(position)
            .ok_or(GridError::NoTank(position))?;
        Ok(tank.extract(max))
    }

    fn ensure_vacant(&self, position: GridPosition) -> Result<(), GridError> {
        if self.cells.contains_key(&position) {
            Err(GridError::Occupied(position))
        } else {
            Ok(())
        }
    }

    fn pipe_id(&self, position: GridPosition) -> Result<NodeId, GridError> {
        match self.cells.get(&position) {
            Some(&Cell::Pipe(id)) => Ok(id),
            Some(_) => Err(GridError::NotAPipe(position)),
            None => Err(GridError::NotPlaced(position)),
        }
    }

    /// Recheck every neighboring pipe's face toward `position`.
    fn notify_neighbors(&mut self, position: GridPosition) {
        let occupant = self.occupant(position);
        for (direction, neighbor_pos) in position.neighbors() {
            let Some(&Cell::Pipe(id)) = self.cells.get(&neighbor_pos) else {
                continue;
            };
            let face = direction.opposite();
            let Some(node) = self.nodes.get_mut(id) else {
                continue;
            };
            if node.recheck(face, &occupant) {
                self.events.push(PipeEvent::ConnectionChanged {
                    node: id,
                    direction: face,
                    connected: node.is_connected(face),
                });
            }
        }
    }

    // -- Tick --

    /// Advance every pipe by one tick and drain the event buffer.
    pub fn step(&mut self) -> Vec<PipeEvent> {
        let ids: Vec<NodeId> = self.nodes.keys().collect();
        for id in ids {
            self.tick_node(id);
        }
        self.tick += 1;
        std::mem::take(&mut self.events)
    }

    /// Events buffered by mutations since the last step.
    pub fn drain_events(&mut self) -> Vec<PipeEvent> {
        std::mem::take(&mut self.events)
    }

    fn tick_node(&mut self, id: NodeId) {
        let Some(position) = self.nodes.get(id).map(PipeNode::position) else {
            return;
        };
        let hood = Neighborhood::gather(&*self, position);
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        let tick = self.tick;

        let before = node.pressure();
        let after = node.update_pressure(&hood);
        if before == 0 && after > 0 {
            self.events.push(PipeEvent::PressureGained {
                node: id,
                pressure: after,
                tick,
            });
        } else if before > 0 && after == 0 {
            self.events.push(PipeEvent::PressureLost { node: id, tick });
        }

        let mut transfer = TankTransfer {
            from: id,
            medium: node.spec().medium,
            hood: &hood,
            cells: &mut self.cells,
            tanks: &mut self.tanks,
        };
        match node.tick_flow(&mut transfer) {
            FlowOutcome::Moved { direction, amount } => {
                trace!("{id:?} moved {amount} {direction:?} at tick {tick}");
                self.events.push(PipeEvent::FluidTransferred {
                    node: id,
                    direction,
                    amount,
                    tick,
                });
            }
            FlowOutcome::Blocked => {
                trace!("{id:?} found no acceptor at tick {tick}");
                self.events.push(PipeEvent::FlowBlocked { node: id, tick });
            }
            FlowOutcome::Idle | FlowOutcome::Cooling => {}
        }
    }
}

impl NeighborLookup for PipeGrid {
    fn occupant(&self, position: GridPosition) -> Occupant {
        match self.cells.get(&position) {
            Some(&Cell::Pipe(id)) => self
                .nodes
                .get(id)
                .map_or(Occupant::Empty, |node| Occupant::Pipe(node.view())),
            Some(Cell::Source(source)) => Occupant::Source(source.view()),
            Some(Cell::Container(container)) => Occupant::Container(ContainerView {
                medium: container.medium,
            }),
            None => Occupant::Empty,
        }
    }
}

impl FluidTransfer for PipeGrid {
    fn try_transfer(&mut self, from: GridPosition, direction: Direction, max_amount: u32) -> u32 {
        let Some(&Cell::Pipe(id)) = self.cells.get(&from) else {
            return 0;
        };
        let Some(medium) = self.nodes.get(id).map(|n| n.spec().medium) else {
            return 0;
        };
        let hood = Neighborhood::gather(&*self, from);
        TankTransfer {
            from: id,
            medium,
            hood: &hood,
            cells: &mut self.cells,
            tanks: &mut self.tanks,
        }
        .try_transfer(from, direction, max_amount)
    }
}

// ---------------------------------------------------------------------------
// TankTransfer
// ---------------------------------------------------------------------------

/// Moves fluid out of one pipe's tank using a neighborhood snapshot taken
/// before the node was borrowed.
struct TankTransfer<'a> {
    from: NodeId,
    medium: Medium,
    hood: &'a Neighborhood,
    cells: &'a mut BTreeMap<GridPosition, Cell>,
    tanks: &'a mut SecondaryMap<NodeId, FluidTank>,
}

impl TankTransfer<'_> {
    /// Whether the occupant in `direction` takes fluid from us at all.
    fn target_accepts(&self, direction: Direction) -> bool {
        match self.hood.get(direction) {
            Occupant::Pipe(pipe) => {
                pipe.medium == self.medium && pipe.connections.contains(direction.opposite())
            }
            Occupant::Container(container) => container.medium == self.medium,
            Occupant::Source(_) | Occupant::Empty => false,
        }
    }
}

impl FluidTransfer for TankTransfer<'_> {
    fn try_transfer(&mut self, from: GridPosition, direction: Direction, max_amount: u32) -> u32 {
        if !self.target_accepts(direction) {
            return 0;
        }
        let Some(stack) = self.tanks.get(self.from).and_then(FluidTank::contents) else {
            return 0;
        };
        let offer = FluidStack::new(stack.kind, stack.amount.min(max_amount));
        let target = from.offset(direction);

        let accepted = match self.cells.get(&target) {
            Some(&Cell::Pipe(to)) if to != self.from => {
                self.tanks.get(to).map_or(0, |t| t.simulate_insert(offer))
            }
            Some(Cell::Container(container)) => container.tank.simulate_insert(offer),
            _ => 0,
        };
        if accepted == 0 {
            return 0;
        }

        let Some(moved) = self.tanks.get_mut(self.from).and_then(|t| t.extract(accepted)) else {
            return 0;
        };
        let inserted = match self.cells.get_mut(&target) {
            Some(Cell::Pipe(to)) => self.tanks.get_mut(*to).map_or(0, |t| t.insert(moved)),
            Some(Cell::Container(container)) => container.tank.insert(moved),
            _ => 0,
        };
        debug_assert_eq!(inserted, moved.amount, "simulated insert disagreed with insert");
        inserted
    }
}
