//! Catalog of pipe tiers and pressure source types.
//!
//! Tunables are per type, not per instance. A [`CatalogBuilder`] collects
//! definitions and validates them once; the resulting [`PipeCatalog`] is
//! immutable.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::id::{PipeTypeId, SourceTypeId};
use crate::world::Medium;

/// Tunables shared by every pipe of one tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipeSpec {
    pub medium: Medium,
    /// Upper bound on a pipe's pressure.
    pub max_pressure: u32,
    /// Units moved by one successful transfer.
    pub flow_per_tick: u32,
    /// Ticks between flow attempts. At least one.
    pub transfer_cooldown: u32,
    /// Tank capacity of each pipe segment.
    pub capacity: u32,
}

/// Tunables shared by every source of one type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpec {
    pub medium: Medium,
    pub induced_pressure: u32,
}

#[derive(Debug, Clone)]
pub struct PipeTypeDef {
    pub name: String,
    pub spec: PipeSpec,
}

#[derive(Debug, Clone)]
pub struct SourceTypeDef {
    pub name: String,
    pub spec: SourceSpec,
}

/// Errors raised while building a catalog.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("duplicate name: {0}")]
    DuplicateName(String),
    #[error("pipe type '{name}' has transfer_cooldown 0; it must be at least 1")]
    ZeroCooldown { name: String },
    #[error("pipe type '{name}' has flow_per_tick 0")]
    ZeroFlow { name: String },
    #[error("pipe type '{name}' has flow_per_tick {flow} above capacity {capacity}")]
    FlowExceedsCapacity {
        name: String,
        flow: u32,
        capacity: u32,
    },
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Collects pipe and source definitions before freezing them.
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    pipes: Vec<PipeTypeDef>,
    sources: Vec<SourceTypeDef>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_pipe(&mut self, name: &str, spec: PipeSpec) -> PipeTypeId {
        let id = PipeTypeId(self.pipes.len() as u32);
        self.pipes.push(PipeTypeDef {
            name: name.to_string(),
            spec,
        });
        id
    }

    pub fn register_source(&mut self, name: &str, spec: SourceSpec) -> SourceTypeId {
        let id = SourceTypeId(self.sources.len() as u32);
        self.sources.push(SourceTypeDef {
            name: name.to_string(),
            spec,
        });
        id
    }

    /// Validate every definition and freeze the catalog.
    pub fn build(self) -> Result<PipeCatalog, CatalogError> {
        for def in &self.pipes {
            validate_pipe(def)?;
        }
        let dup = first_duplicate(self.pipes.iter().map(|d| d.name.as_str()))
            .or_else(|| first_duplicate(self.sources.iter().map(|d| d.name.as_str())));
        if let Some(name) = dup {
            return Err(CatalogError::DuplicateName(name.to_string()));
        }
        Ok(self.freeze())
    }

    fn freeze(self) -> PipeCatalog {
        let pipe_names = self
            .pipes
            .iter()
            .enumerate()
            .map(|(i, d)| (d.name.clone(), PipeTypeId(i as u32)))
            .collect();
        let source_names = self
            .sources
            .iter()
            .enumerate()
            .map(|(i, d)| (d.name.clone(), SourceTypeId(i as u32)))
            .collect();
        PipeCatalog {
            pipes: self.pipes,
            pipe_names,
            sources: self.sources,
            source_names,
        }
    }
}

fn first_duplicate<'a>(mut names: impl Iterator<Item = &'a str>) -> Option<&'a str> {
    let mut seen = HashSet::new();
    names.find(|n| !seen.insert(*n))
}

fn validate_pipe(def: &PipeTypeDef) -> Result<(), CatalogError> {
    let spec = &def.spec;
    if spec.transfer_cooldown == 0 {
        return Err(CatalogError::ZeroCooldown {
            name: def.name.clone(),
        });
    }
    if spec.flow_per_tick == 0 {
        return Err(CatalogError::ZeroFlow {
            name: def.name.clone(),
        });
    }
    if spec.flow_per_tick > spec.capacity {
        return Err(CatalogError::FlowExceedsCapacity {
            name: def.name.clone(),
            flow: spec.flow_per_tick,
            capacity: spec.capacity,
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// PipeCatalog
// ---------------------------------------------------------------------------

/// Immutable lookup of pipe tiers and source types.
#[derive(Debug, Clone)]
pub struct PipeCatalog {
    pipes: Vec<PipeTypeDef>,
    pipe_names: HashMap<String, PipeTypeId>,
    sources: Vec<SourceTypeDef>,
    source_names: HashMap<String, SourceTypeId>,
}

impl PipeCatalog {
    /// Fluid pipe tiers and a pump, usable without any data files.
    pub fn builtin() -> Self {
        let mut b = CatalogBuilder::new();
        for (name, max_pressure, flow_per_tick, transfer_cooldown, capacity) in [
            ("copper_fluid_pipe", 8, 50, 10, 500),
            ("iron_fluid_pipe", 16, 100, 8, 1000),
            ("gold_fluid_pipe", 32, 200, 5, 2000),
            ("diamond_fluid_pipe", 64, 400, 2, 4000),
        ] {
            b.register_pipe(
                name,
                PipeSpec {
                    medium: Medium::Fluid,
                    max_pressure,
                    flow_per_tick,
                    transfer_cooldown,
                    capacity,
                },
            );
        }
        b.register_source(
            "fluid_pump",
            SourceSpec {
                medium: Medium::Fluid,
                induced_pressure: 16,
            },
        );
        b.register_source(
            "high_pressure_pump",
            SourceSpec {
                medium: Medium::Fluid,
                induced_pressure: 48,
            },
        );
        // Constant definitions above are valid.
        b.freeze()
    }

    pub fn pipe(&self, id: PipeTypeId) -> Option<&PipeTypeDef> {
        self.pipes.get(id.0 as usize)
    }

    pub fn pipe_spec(&self, id: PipeTypeId) -> Option<PipeSpec> {
        self.pipe(id).map(|def| def.spec)
    }

    pub fn pipe_id(&self, name: &str) -> Option<PipeTypeId> {
        self.pipe_names.get(name).copied()
    }

    pub fn source(&self, id: SourceTypeId) -> Option<&SourceTypeDef> {
        self.sources.get(id.0 as usize)
    }

    pub fn source_id(&self, name: &str) -> Option<SourceTypeId> {
        self.source_names.get(name).copied()
    }

    pub fn pipe_count(&self) -> usize {
        self.pipes.len()
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }
}
