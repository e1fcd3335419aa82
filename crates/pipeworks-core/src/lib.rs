//! Pipeworks Core -- pressure-driven fluid pipes for voxel worlds.
//!
//! Each pipe segment is a [`node::PipeNode`] that owns three pieces of
//! behavior, each usable on its own:
//!
//! - **Connectivity** ([`connectivity`]): per-face connection flags computed
//!   from neighbors, plus a manual override set by a wrench that automatic
//!   rechecks never undo.
//! - **Pressure** ([`pressure`]): recomputed every tick as the strongest
//!   neighbor contribution. A source feeding a connected face contributes its
//!   induced pressure; a neighboring pipe contributes its pressure minus one.
//!   The result is capped at the tier's maximum.
//! - **Flow** ([`flow`]): a cooldown counter that, when it rolls over, scans
//!   connected faces in rotating order and moves up to `flow_per_tick` units
//!   into the first neighbor that accepts any.
//!
//! # Tick Order
//!
//! A host calls [`node::PipeNode::update_pressure`] and then
//! [`node::PipeNode::tick_flow`] once per tick. A node with zero pressure
//! stops after the pressure update.
//!
//! # Host Seams
//!
//! The node never touches the world directly. It reads neighbors through
//! [`world::NeighborLookup`], moves fluid through [`world::FluidTransfer`]
//! and wears tools through [`world::WrenchTool`]. [`network::PipeGrid`] is a
//! complete sparse-grid host built on those traits, with events
//! ([`event::PipeEvent`]) and bitcode snapshots ([`serialize`]).
//!
//! # Key Types
//!
//! - [`network::PipeGrid`] -- reference host world.
//! - [`node::PipeNode`] / [`node::PipeRecord`] -- node state and its
//!   persisted form.
//! - [`registry::PipeCatalog`] -- immutable pipe tiers and pump types.
//! - [`container::FluidTank`] -- single-fluid bounded storage.

pub mod connectivity;
pub mod container;
pub mod event;
pub mod flow;
pub mod grid;
pub mod id;
pub mod network;
pub mod node;
pub mod pressure;
pub mod registry;
pub mod serialize;
pub mod world;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

/// Simulation tick counter.
pub type Ticks = u64;
