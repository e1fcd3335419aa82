//! Events reported by a [`PipeGrid`](crate::network::PipeGrid).
//!
//! Mutations (placement, removal, wrenching) and ticks push events into a
//! buffer that [`PipeGrid::step`](crate::network::PipeGrid::step) drains.
//! Pressure events fire only on transitions, not every tick.

use crate::Ticks;
use crate::grid::Direction;
use crate::id::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipeEvent {
    /// A scheduled scan moved fluid out of `node`.
    FluidTransferred {
        node: NodeId,
        direction: Direction,
        amount: u32,
        tick: Ticks,
    },
    /// The cooldown rolled over but no neighbor accepted anything.
    FlowBlocked { node: NodeId, tick: Ticks },
    /// A face of `node` was connected or disconnected.
    ConnectionChanged {
        node: NodeId,
        direction: Direction,
        connected: bool,
    },
    /// `node` went from zero to positive pressure.
    PressureGained {
        node: NodeId,
        pressure: u32,
        tick: Ticks,
    },
    /// `node` dropped to zero pressure.
    PressureLost { node: NodeId, tick: Ticks },
}

/// Discriminant tag for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipeEventKind {
    FluidTransferred,
    FlowBlocked,
    ConnectionChanged,
    PressureGained,
    PressureLost,
}

impl PipeEvent {
    pub fn kind(&self) -> PipeEventKind {
        match self {
            PipeEvent::FluidTransferred { .. } => PipeEventKind::FluidTransferred,
            PipeEvent::FlowBlocked { .. } => PipeEventKind::FlowBlocked,
            PipeEvent::ConnectionChanged { .. } => PipeEventKind::ConnectionChanged,
            PipeEvent::PressureGained { .. } => PipeEventKind::PressureGained,
            PipeEvent::PressureLost { .. } => PipeEventKind::PressureLost,
        }
    }

    /// The node the event concerns.
    pub fn node(&self) -> NodeId {
        match *self {
            PipeEvent::FluidTransferred { node, .. }
            | PipeEvent::FlowBlocked { node, .. }
            | PipeEvent::ConnectionChanged { node, .. }
            | PipeEvent::PressureGained { node, .. }
            | PipeEvent::PressureLost { node, .. } => node,
        }
    }
}
