//! Binary snapshots of a [`PipeGrid`].
//!
//! Snapshots are `bitcode` payloads behind a versioned header. Node ids are
//! not stored; pipes are written in step order and re-inserted in that order
//! on load, so the restored grid ticks its nodes in the same sequence.
//! Connectivity (including wrench overrides) and every [`PipeRecord`] field
//! are restored verbatim, never recomputed.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::Ticks;
use crate::connectivity::Connectivity;
use crate::container::FluidTank;
use crate::grid::{DirectionSet, GridPosition};
use crate::id::{PipeTypeId, SourceTypeId};
use crate::network::{Cell, PipeGrid, PlainContainer, PressureSource};
use crate::node::{PipeNode, PipeRecord};
use crate::registry::PipeCatalog;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic number identifying a pipe grid snapshot.
pub const SNAPSHOT_MAGIC: u32 = 0x9197_0001;

/// Current format version. Increment when breaking the wire format.
pub const FORMAT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    #[error("bitcode encoding failed: {0}")]
    Encode(String),
}

#[derive(Debug, thiserror::Error)]
pub enum DeserializeError {
    #[error("invalid magic number: expected 0x{:08X}, got 0x{:08X}", SNAPSHOT_MAGIC, .0)]
    InvalidMagic(u32),
    #[error("unsupported format version: expected {}, got {}", FORMAT_VERSION, .0)]
    UnsupportedVersion(u32),
    #[error("snapshot from future version {0} (this build supports up to {FORMAT_VERSION})")]
    FutureVersion(u32),
    #[error("bitcode decoding failed: {0}")]
    Decode(String),
    #[error("invalid pipe record at {0:?}")]
    InvalidRecord(GridPosition),
    #[error("two blocks stored at {0:?}")]
    DuplicatePosition(GridPosition),
    #[error("unknown pipe type {0:?}")]
    UnknownPipeType(PipeTypeId),
    #[error("unknown source type {0:?}")]
    UnknownSourceType(SourceTypeId),
}

// ---------------------------------------------------------------------------
// Snapshot header
// ---------------------------------------------------------------------------

/// Header prepended to every snapshot, checked before the body is used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotHeader {
    pub magic: u32,
    pub version: u32,
    /// Grid tick when the snapshot was taken.
    pub tick: Ticks,
}

impl SnapshotHeader {
    pub fn new(tick: Ticks) -> Self {
        Self {
            magic: SNAPSHOT_MAGIC,
            version: FORMAT_VERSION,
            tick,
        }
    }

    pub fn validate(&self) -> Result<(), DeserializeError> {
        if self.magic != SNAPSHOT_MAGIC {
            return Err(DeserializeError::InvalidMagic(self.magic));
        }
        if self.version > FORMAT_VERSION {
            return Err(DeserializeError::FutureVersion(self.version));
        }
        if self.version < FORMAT_VERSION {
            return Err(DeserializeError::UnsupportedVersion(self.version));
        }
        Ok(())
    }
}

/// Decode only as far as the header. bitcode has no partial decode, so the
/// whole payload is parsed.
pub fn read_snapshot_header(data: &[u8]) -> Result<SnapshotHeader, DeserializeError> {
    let snapshot: GridSnapshot =
        bitcode::deserialize(data).map_err(|e| DeserializeError::Decode(e.to_string()))?;
    Ok(snapshot.header)
}

// ---------------------------------------------------------------------------
// Snapshot body
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
struct PipeEntry {
    position: GridPosition,
    pipe_type: PipeTypeId,
    connected: DirectionSet,
    overridden: DirectionSet,
    record: PipeRecord,
    tank: FluidTank,
}

#[derive(Debug, Serialize, Deserialize)]
struct SourceEntry {
    position: GridPosition,
    source: PressureSource,
}

#[derive(Debug, Serialize, Deserialize)]
struct ContainerEntry {
    position: GridPosition,
    container: PlainContainer,
}

#[derive(Debug, Serialize, Deserialize)]
struct GridSnapshot {
    header: SnapshotHeader,
    pipes: Vec<PipeEntry>,
    sources: Vec<SourceEntry>,
    containers: Vec<ContainerEntry>,
}

// ---------------------------------------------------------------------------
// PipeGrid serialization
// ---------------------------------------------------------------------------

impl PipeGrid {
    /// Encode the grid. Buffered events are not part of the snapshot.
    pub fn serialize(&self) -> Result<Vec<u8>, SerializeError> {
        let pipes = self
            .nodes
            .iter()
            .map(|(id, node)| PipeEntry {
                position: node.position(),
                pipe_type: node.pipe_type(),
                connected: node.connectivity().connected(),
                overridden: node.connectivity().overridden(),
                record: node.serialize(),
                tank: self.tanks.get(id).cloned().unwrap_or_default(),
            })
            .collect();

        let mut sources = Vec::new();
        let mut containers = Vec::new();
        for (&position, cell) in &self.cells {
            match cell {
                Cell::Pipe(_) => {}
                Cell::Source(source) => sources.push(SourceEntry {
                    position,
                    source: source.clone(),
                }),
                Cell::Container(container) => containers.push(ContainerEntry {
                    position,
                    container: container.clone(),
                }),
            }
        }

        let snapshot = GridSnapshot {
            header: SnapshotHeader::new(self.tick),
            pipes,
            sources,
            containers,
        };
        bitcode::serialize(&snapshot).map_err(|e| SerializeError::Encode(e.to_string()))
    }

    /// Rebuild a grid from `data`, resolving pipe and source types against
    /// `catalog`.
    pub fn deserialize(data: &[u8], catalog: PipeCatalog) -> Result<Self, DeserializeError> {
        let snapshot: GridSnapshot =
            bitcode::deserialize(data).map_err(|e| DeserializeError::Decode(e.to_string()))?;
        snapshot.header.validate()?;

        let mut grid = PipeGrid::new(catalog);
        grid.tick = snapshot.header.tick;

        for entry in snapshot.pipes {
            if grid.cells.contains_key(&entry.position) {
                return Err(DeserializeError::DuplicatePosition(entry.position));
            }
            if !entry.record.is_valid() {
                return Err(DeserializeError::InvalidRecord(entry.position));
            }
            let spec = grid
                .catalog
                .pipe_spec(entry.pipe_type)
                .ok_or(DeserializeError::UnknownPipeType(entry.pipe_type))?;

            let mut node = PipeNode::new(entry.position, entry.pipe_type, spec);
            node.set_connectivity(Connectivity::from_parts(entry.connected, entry.overridden));
            node.deserialize(&entry.record);

            let id = grid.nodes.insert(node);
            grid.tanks.insert(id, entry.tank);
            grid.cells.insert(entry.position, Cell::Pipe(id));
        }

        for entry in snapshot.sources {
            if grid.catalog.source(entry.source.source_type).is_none() {
                return Err(DeserializeError::UnknownSourceType(
                    entry.source.source_type,
                ));
            }
            if grid
                .cells
                .insert(entry.position, Cell::Source(entry.source))
                .is_some()
            {
                return Err(DeserializeError::DuplicatePosition(entry.position));
            }
        }

        for entry in snapshot.containers {
            if grid
                .cells
                .insert(entry.position, Cell::Container(entry.container))
                .is_some()
            {
                return Err(DeserializeError::DuplicatePosition(entry.position));
            }
        }

        debug!(
            "loaded snapshot at tick {}: {} pipes, {} cells",
            grid.tick,
            grid.nodes.len(),
            grid.cells.len()
        );
        Ok(grid)
    }
}
