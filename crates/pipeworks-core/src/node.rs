//! A single pipe segment: connectivity, pressure and flow scheduling.
//!
//! Each tick a host calls [`PipeNode::tick`] (or the two halves
//! [`update_pressure`](PipeNode::update_pressure) and
//! [`tick_flow`](PipeNode::tick_flow) separately). A node with zero pressure
//! does nothing after the pressure update; its cooldown does not advance.

use serde::{Deserialize, Serialize};

use crate::connectivity::Connectivity;
use crate::flow::{FlowOutcome, FlowState};
use crate::grid::{Direction, GridPosition};
use crate::id::PipeTypeId;
use crate::pressure;
use crate::registry::PipeSpec;
use crate::world::{FluidTransfer, NeighborLookup, Neighborhood, Occupant, PipeView, WrenchTool};

// ---------------------------------------------------------------------------
// PipeRecord
// ---------------------------------------------------------------------------

/// Persisted per-node state. Every field round-trips verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipeRecord {
    pub max_pressure: u32,
    pub flow_per_tick: u32,
    pub cooldown: u32,
    pub transfer_cooldown: u32,
    pub direction_index: u32,
    pub pressure: u32,
}

impl PipeRecord {
    /// Whether the record can be restored without breaking node invariants.
    pub fn is_valid(&self) -> bool {
        (self.direction_index as usize) < Direction::COUNT
            && self.transfer_cooldown > 0
            && self.cooldown < self.transfer_cooldown
            && self.pressure <= self.max_pressure
    }
}

// ---------------------------------------------------------------------------
// PipeNode
// ---------------------------------------------------------------------------

/// Result of a full node tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeTick {
    pub pressure: u32,
    pub flow: FlowOutcome,
}

/// One pipe segment in the grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipeNode {
    position: GridPosition,
    pipe_type: PipeTypeId,
    spec: PipeSpec,
    connectivity: Connectivity,
    pressure: u32,
    flow: FlowState,
}

impl PipeNode {
    /// A node with no connections. Hosts normally use [`PipeNode::place`].
    pub fn new(position: GridPosition, pipe_type: PipeTypeId, spec: PipeSpec) -> Self {
        Self {
            position,
            pipe_type,
            spec,
            connectivity: Connectivity::new(),
            pressure: 0,
            flow: FlowState::new(),
        }
    }

    /// A node whose connectivity is computed against its current neighbors.
    pub fn place<L: NeighborLookup + ?Sized>(
        position: GridPosition,
        pipe_type: PipeTypeId,
        spec: PipeSpec,
        lookup: &L,
    ) -> Self {
        let mut node = Self::new(position, pipe_type, spec);
        node.connectivity = Connectivity::compute(&spec.medium, lookup, position);
        node
    }

    pub fn position(&self) -> GridPosition {
        self.position
    }

    pub fn pipe_type(&self) -> PipeTypeId {
        self.pipe_type
    }

    pub fn spec(&self) -> &PipeSpec {
        &self.spec
    }

    pub fn pressure(&self) -> u32 {
        self.pressure
    }

    pub fn cooldown(&self) -> u32 {
        self.flow.cooldown
    }

    pub fn rotation_index(&self) -> u8 {
        self.flow.rotation_index
    }

    pub fn connectivity(&self) -> &Connectivity {
        &self.connectivity
    }

    pub fn set_connectivity(&mut self, connectivity: Connectivity) {
        self.connectivity = connectivity;
    }

    pub fn is_connected(&self, direction: Direction) -> bool {
        self.connectivity.is_connected(direction)
    }

    /// How this node looks to its neighbors.
    pub fn view(&self) -> PipeView {
        PipeView {
            medium: self.spec.medium,
            pressure: self.pressure,
            connections: self.connectivity.connected(),
        }
    }

    // -- Connectivity --

    /// Automatic recheck of one face after the neighbor there changed.
    pub fn recheck(&mut self, direction: Direction, neighbor: &Occupant) -> bool {
        self.connectivity.recheck(&self.spec.medium, direction, neighbor)
    }

    /// Tool interaction on one face. Returns the new connection state.
    pub fn on_wrench<T: WrenchTool + ?Sized>(&mut self, direction: Direction, tool: &mut T) -> bool {
        self.connectivity.wrench(direction, tool)
    }

    // -- Tick --

    /// Recompute pressure from the six neighbors. Returns the new value.
    pub fn update_pressure(&mut self, hood: &Neighborhood) -> u32 {
        self.pressure = pressure::evaluate(self.spec.max_pressure, &self.connectivity, hood);
        debug_assert!(self.pressure <= self.spec.max_pressure);
        self.pressure
    }

    /// Run the flow scheduler. Does nothing while pressure is zero.
    pub fn tick_flow<T: FluidTransfer + ?Sized>(&mut self, transfer: &mut T) -> FlowOutcome {
        if self.pressure == 0 {
            return FlowOutcome::Idle;
        }
        self.flow.tick(
            self.spec.transfer_cooldown,
            self.spec.flow_per_tick,
            self.connectivity.connected(),
            self.position,
            transfer,
        )
    }

    /// Pressure update followed by the flow scheduler.
    pub fn tick<L, T>(&mut self, lookup: &L, transfer: &mut T) -> NodeTick
    where
        L: NeighborLookup + ?Sized,
        T: FluidTransfer + ?Sized,
    {
        let hood = Neighborhood::gather(lookup, self.position);
        let pressure = self.update_pressure(&hood);
        let flow = self.tick_flow(transfer);
        NodeTick { pressure, flow }
    }

    // -- Persistence --

    pub fn serialize(&self) -> PipeRecord {
        PipeRecord {
            max_pressure: self.spec.max_pressure,
            flow_per_tick: self.spec.flow_per_tick,
            cooldown: self.flow.cooldown,
            transfer_cooldown: self.spec.transfer_cooldown,
            direction_index: u32::from(self.flow.rotation_index),
            pressure: self.pressure,
        }
    }

    /// Restore every record field verbatim. The next pressure update
    /// corrects `pressure` regardless of what was stored.
    pub fn deserialize(&mut self, record: &PipeRecord) {
        debug_assert!(record.is_valid(), "restoring invalid pipe record {record:?}");
        self.spec.max_pressure = record.max_pressure;
        self.spec.flow_per_tick = record.flow_per_tick;
        self.spec.transfer_cooldown = record.transfer_cooldown;
        self.flow.cooldown = record.cooldown;
        self.flow.rotation_index = (record.direction_index % Direction::COUNT as u32) as u8;
        self.pressure = record.pressure;
    }
}
