//! Data-driven pipe catalogs.
//!
//! Loads pipe tiers and pump types from `pipes.{ron,toml,json}` and an
//! optional `pumps.{ron,toml,json}` in a directory and freezes them into a
//! [`PipeCatalog`](pipeworks_core::registry::PipeCatalog).

pub mod loader;
pub mod schema;

pub use loader::{DataLoadError, load_catalog};
