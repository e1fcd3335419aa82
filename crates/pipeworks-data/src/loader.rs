//! Catalog loading: finds data files, parses them and builds a catalog.
//!
//! Format is chosen by extension (RON/TOML/JSON). Having the same base name
//! in two formats is an error rather than a silent preference.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use log::debug;
use pipeworks_core::registry::{CatalogBuilder, CatalogError, PipeCatalog};
use serde::de::DeserializeOwned;

use crate::schema::{PipeData, PumpData};

// ===========================================================================
// Errors
// ===========================================================================

#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// A required data file was not found in the given directory.
    #[error("required file '{file}' not found in {dir}")]
    MissingRequired { file: &'static str, dir: PathBuf },

    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// Two files with the same base name but different formats exist.
    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    #[error("duplicate name '{name}' in {file}")]
    DuplicateName { file: PathBuf, name: String },

    /// The definitions parsed but do not form a valid catalog.
    #[error("invalid definitions in {file}: {source}")]
    Invalid {
        file: PathBuf,
        #[source]
        source: CatalogError,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ===========================================================================
// File discovery
// ===========================================================================

/// Look for `{base_name}.ron`, `.toml` or `.json` in `dir`.
///
/// Returns `Ok(None)` when none exist and `ConflictingFormats` when more
/// than one does.
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let mut found: Option<PathBuf> = None;

    for ext in ["ron", "toml", "json"] {
        let candidate = dir.join(format!("{base_name}.{ext}"));
        if candidate.exists() {
            if let Some(existing) = found {
                return Err(DataLoadError::ConflictingFormats {
                    a: existing,
                    b: candidate,
                });
            }
            found = Some(candidate);
        }
    }

    Ok(found)
}

/// Like [`find_data_file`], but a missing file is an error.
pub fn require_data_file(dir: &Path, base_name: &'static str) -> Result<PathBuf, DataLoadError> {
    find_data_file(dir, base_name)?.ok_or_else(|| DataLoadError::MissingRequired {
        file: base_name,
        dir: dir.to_path_buf(),
    })
}

// ===========================================================================
// Deserialization
// ===========================================================================

fn parse_error(path: &Path, detail: impl ToString) -> DataLoadError {
    DataLoadError::Parse {
        file: path.to_path_buf(),
        detail: detail.to_string(),
    }
}

/// Read a file and deserialize it according to its extension.
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;

    match format {
        Format::Ron => ron::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Json => serde_json::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Toml => toml::from_str(&content).map_err(|e| parse_error(path, e)),
    }
}

/// Deserialize a list. TOML has no top-level arrays, so there the list is
/// read from the array of tables under `toml_key`.
pub fn deserialize_list<T: DeserializeOwned>(
    path: &Path,
    toml_key: &str,
) -> Result<Vec<T>, DataLoadError> {
    if detect_format(path)? != Format::Toml {
        return deserialize_file(path);
    }

    let table: toml::Value = deserialize_file(path)?;
    let array = table
        .get(toml_key)
        .ok_or_else(|| parse_error(path, format!("missing key '{toml_key}' in TOML file")))?
        .clone();
    array
        .try_into()
        .map_err(|e: toml::de::Error| parse_error(path, e))
}

fn check_unique<'a>(
    names: impl IntoIterator<Item = &'a str>,
    file: &Path,
) -> Result<(), DataLoadError> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(DataLoadError::DuplicateName {
                file: file.to_path_buf(),
                name: name.to_string(),
            });
        }
    }
    Ok(())
}

// ===========================================================================
// Catalog pipeline
// ===========================================================================

/// Load `pipes.*` (required) and `pumps.*` (optional) from `dir`.
pub fn load_catalog(dir: &Path) -> Result<PipeCatalog, DataLoadError> {
    let pipes_path = require_data_file(dir, "pipes")?;
    let pipes: Vec<PipeData> = deserialize_list(&pipes_path, "pipes")?;
    check_unique(pipes.iter().map(|p| p.name.as_str()), &pipes_path)?;

    let pumps_path = find_data_file(dir, "pumps")?;
    let pumps: Vec<PumpData> = match &pumps_path {
        Some(path) => deserialize_list(path, "pumps")?,
        None => Vec::new(),
    };
    if let Some(path) = &pumps_path {
        check_unique(pumps.iter().map(|p| p.name.as_str()), path)?;
    }

    let mut builder = CatalogBuilder::new();
    for pipe in &pipes {
        builder.register_pipe(&pipe.name, pipe.spec());
    }
    for pump in &pumps {
        builder.register_source(&pump.name, pump.spec());
    }
    let catalog = builder.build().map_err(|source| DataLoadError::Invalid {
        file: pipes_path.clone(),
        source,
    })?;

    debug!(
        "loaded {} pipe types and {} pump types from {}",
        catalog.pipe_count(),
        catalog.source_count(),
        dir.display()
    );
    Ok(catalog)
}

// ===========================================================================
// Tests
// ===========================================================================
