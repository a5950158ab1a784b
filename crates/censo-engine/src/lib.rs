//! # censo-engine
//!
//! Turns captured location records into occupancy counts.
//!
//! This crate provides:
//! - Record classification against a unit topology ([`mapper`])
//! - Occupancy aggregation into block → wing → cell counts ([`aggregate`])
//!
//! ## Example
//!
//! ```rust
//! use censo_core::{Block, CollectingEmitter, RawRecord, UnitTopology, Wing};
//! use censo_engine::{aggregate, classify_all};
//!
//! let unit = UnitTopology::new().block(
//!     "A",
//!     Block::new().wing("12", Wing::new("ALA 12").cells(["1", "2", "3"])),
//! );
//! let records = vec![
//!     RawRecord::new("12", "1", "100", "JOSE"),
//!     RawRecord::new("12", "1", "101", "JOAO"),
//!     RawRecord::new("99", "1", "102", "PEDRO"),
//! ];
//!
//! let mut emitter = CollectingEmitter::new();
//! let classification = classify_all("PAMC", &unit, &records, &mut emitter);
//! assert_eq!(classification.rejected, 1);
//!
//! let counts = aggregate(&classification.records);
//! assert_eq!(counts.get("A", "12", "1"), 2);
//! ```

pub mod aggregate;
pub mod mapper;

pub use aggregate::aggregate;
pub use mapper::{classify, classify_all, Classification};
