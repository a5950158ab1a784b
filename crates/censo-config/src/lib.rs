//! # censo-config
//!
//! Loading of the facility topology document and of captured record files.
//!
//! This crate provides:
//! - Topology parsing from JSON or TOML (format detected from the extension)
//! - Structural validation of the loaded topology
//! - Record file parsing (see [`records`])
//!
//! ## Example
//!
//! ```rust
//! use censo_config::parse_topology_json;
//!
//! let input = r#"{
//!     "PAMC": {
//!         "blocks": {
//!             "A": { "alas": { "12": { "name": "ALA 12", "description": "", "celas": ["1", "2"] } } }
//!         }
//!     }
//! }"#;
//!
//! let topology = parse_topology_json(input).unwrap();
//! assert_eq!(topology.unit("PAMC").unwrap().blocks["A"].wings["12"].cells.len(), 2);
//! ```

pub mod records;

pub use records::{load_records, parse_records_json, RecordSet};

use censo_core::{Topology, TopologyError};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration loading error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),
}

/// Supported document formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Json,
    Toml,
}

/// Detect document format from extension
pub fn detect_format(path: &Path) -> FileFormat {
    match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => FileFormat::Toml,
        _ => FileFormat::Json,
    }
}

/// Parse and validate a topology from JSON
pub fn parse_topology_json(input: &str) -> Result<Topology, ConfigError> {
    let topology: Topology = serde_json::from_str(input)?;
    topology.validate()?;
    Ok(topology)
}

/// Parse and validate a topology from TOML
pub fn parse_topology_toml(input: &str) -> Result<Topology, ConfigError> {
    let topology: Topology = toml::from_str(input)?;
    topology.validate()?;
    Ok(topology)
}

/// Load a topology file (format detected from extension)
pub fn load_topology(path: &Path) -> Result<Topology, ConfigError> {
    let content = read(path)?;
    match detect_format(path) {
        FileFormat::Toml => parse_topology_toml(&content),
        FileFormat::Json => parse_topology_json(&content),
    }
}

pub(crate) fn read(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })
}
