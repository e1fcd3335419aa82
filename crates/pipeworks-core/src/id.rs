use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Identifies a pipe node placed in a [`PipeGrid`](crate::network::PipeGrid).
    pub struct NodeId;
}

/// Identifies a fluid kind (water, lava, oil...). Cheap to copy and compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FluidKindId(pub u32);

/// Identifies a pipe tier in the [`PipeCatalog`](crate::registry::PipeCatalog).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PipeTypeId(pub u32);

/// Identifies a pressure source type (pump) in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SourceTypeId(pub u32);
