//! Serde data file structs for pipe and pump definitions.
//!
//! These are the on-disk shapes. The loader turns them into catalog specs.

use pipeworks_core::registry::{PipeSpec, SourceSpec};
use pipeworks_core::world::Medium;
use serde::Deserialize;

/// The medium a pipe or pump carries. Defaults to fluid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediumData {
    #[default]
    Fluid,
    Item,
}

impl From<MediumData> for Medium {
    fn from(value: MediumData) -> Self {
        match value {
            MediumData::Fluid => Medium::Fluid,
            MediumData::Item => Medium::Item,
        }
    }
}

// ===========================================================================
// Pipes
// ===========================================================================

/// A pipe tier definition.
#[derive(Debug, Clone, Deserialize)]
pub struct PipeData {
    pub name: String,
    #[serde(default)]
    pub medium: MediumData,
    pub max_pressure: u32,
    pub flow_per_tick: u32,
    pub transfer_cooldown: u32,
    pub capacity: u32,
}

impl PipeData {
    pub fn spec(&self) -> PipeSpec {
        PipeSpec {
            medium: self.medium.into(),
            max_pressure: self.max_pressure,
            flow_per_tick: self.flow_per_tick,
            transfer_cooldown: self.transfer_cooldown,
            capacity: self.capacity,
        }
    }
}

// ===========================================================================
// Pumps
// ===========================================================================

/// A pressure source definition.
#[derive(Debug, Clone, Deserialize)]
pub struct PumpData {
    pub name: String,
    #[serde(default)]
    pub medium: MediumData,
    pub induced_pressure: u32,
}

impl PumpData {
    pub fn spec(&self) -> SourceSpec {
        SourceSpec {
            medium: self.medium.into(),
            induced_pressure: self.induced_pressure,
        }
    }
}
