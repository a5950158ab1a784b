//! # censo-core
//!
//! Core domain model for the censo report engine.
//!
//! This crate provides:
//! - Facility topology: `Topology`, `UnitTopology`, `Block`, `Wing`, summary configuration
//! - Record types: `RawRecord`, `ClassifiedRecord`
//! - The nested occupancy count: `OccupancyCount`
//! - Diagnostics (`Diagnostic`, `DiagnosticEmitter`) and error types
//! - The rotating shift calendar used for headers and file names
//!
//! ## Example
//!
//! ```rust
//! use censo_core::{Block, Topology, UnitTopology, Wing};
//!
//! let unit = UnitTopology::new().block(
//!     "A",
//!     Block::new().wing("12", Wing::new("ALA 12").cells(["1", "2", "3"])),
//! );
//! let topology = Topology::new().with_unit("PAMC", unit);
//!
//! assert!(topology.unit("PAMC").is_ok());
//! assert!(topology.unit("CPBV").is_err());
//! ```

pub mod diagnostics;
pub mod shift;

pub use diagnostics::{CollectingEmitter, Diagnostic, DiagnosticCode, DiagnosticEmitter, Severity};
pub use shift::Shift;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

// ============================================================================
// Type Aliases
// ============================================================================

/// Facility unit code (e.g. "PAMC")
pub type UnitCode = String;

/// Block code within a unit (e.g. "A", "Carceragem")
pub type BlockCode = String;

/// Wing code within a block (e.g. "12", "TRIAGEM")
pub type WingCode = String;

/// Cell label within a wing (e.g. "3")
pub type CellLabel = String;

// ============================================================================
// Topology
// ============================================================================

/// Static description of every configured unit, keyed by unit code.
///
/// Document order is preserved: it decides block order in the Control sheet and
/// the first-match tie-break used by record classification.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Topology {
    pub units: IndexMap<UnitCode, UnitTopology>,
}

impl Topology {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a unit (builder style)
    pub fn with_unit(mut self, code: impl Into<UnitCode>, unit: UnitTopology) -> Self {
        self.units.insert(code.into(), unit);
        self
    }

    /// Look up a unit, failing with `UnknownUnit` when it is not configured
    pub fn unit(&self, code: &str) -> Result<&UnitTopology, TopologyError> {
        self.units
            .get(code)
            .ok_or_else(|| TopologyError::UnknownUnit(code.to_string()))
    }

    /// Configured unit codes in document order
    pub fn unit_codes(&self) -> impl Iterator<Item = &str> {
        self.units.keys().map(String::as_str)
    }

    /// Validate every unit
    pub fn validate(&self) -> Result<(), TopologyError> {
        for (code, unit) in &self.units {
            unit.validate(code)?;
        }
        Ok(())
    }
}

/// Topology of one facility unit
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UnitTopology {
    pub blocks: IndexMap<BlockCode, Block>,
    #[serde(default)]
    pub summary: SummaryConfig,
}

impl UnitTopology {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a block (builder style)
    pub fn block(mut self, code: impl Into<BlockCode>, block: Block) -> Self {
        self.blocks.insert(code.into(), block);
        self
    }

    /// Set the summary configuration (builder style)
    pub fn summary(mut self, summary: SummaryConfig) -> Self {
        self.summary = summary;
        self
    }

    /// Blocks laid out as Control/SEI grids, in document order
    pub fn housing_blocks(&self) -> impl Iterator<Item = (&BlockCode, &Block)> {
        self.blocks
            .iter()
            .filter(|(_, block)| block.kind == BlockKind::Housing)
    }

    /// Look up a wing by block and wing code
    pub fn wing(&self, block: &str, wing: &str) -> Option<&Wing> {
        self.blocks.get(block).and_then(|b| b.wings.get(wing))
    }

    /// Check structural invariants of the unit.
    ///
    /// Cell labels must be unique within a wing, folded wings must name a
    /// non-folded sibling, and aggregate lines must reference existing wings.
    pub fn validate(&self, unit: &str) -> Result<(), TopologyError> {
        for (block_code, block) in &self.blocks {
            for (wing_code, wing) in &block.wings {
                let mut seen = HashSet::new();
                for cell in &wing.cells {
                    if !seen.insert(cell.as_str()) {
                        return Err(TopologyError::DuplicateCell {
                            unit: unit.to_string(),
                            block: block_code.clone(),
                            wing: wing_code.clone(),
                            cell: cell.clone(),
                        });
                    }
                }

                if let Some(parent) = &wing.fold_into {
                    match block.wings.get(parent) {
                        Some(parent_wing) if !parent_wing.is_folded() => {}
                        Some(_) => {
                            return Err(TopologyError::Invalid(format!(
                                "unit {unit}: wing {block_code}/{wing_code} folds into {parent}, which is itself folded"
                            )))
                        }
                        None => {
                            return Err(TopologyError::UnknownFoldParent {
                                unit: unit.to_string(),
                                block: block_code.clone(),
                                wing: wing_code.clone(),
                                parent: parent.clone(),
                            })
                        }
                    }
                }
            }
        }

        for section in &self.summary.sections {
            for line in &section.lines {
                for source in &line.sum {
                    if self.wing(&source.block, &source.wing).is_none() {
                        return Err(TopologyError::UnknownAggregateSource {
                            unit: unit.to_string(),
                            line: line.label.clone(),
                            block: source.block.clone(),
                            wing: source.wing.clone(),
                        });
                    }
                }
            }
        }

        Ok(())
    }
}

/// How a block participates in the report layouts
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    /// Laid out as per-wing cell grids
    #[default]
    Housing,
    /// Never laid out; its wings only feed aggregate summary lines
    Virtual,
}

/// A top-level facility division
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Display name; defaults to "Bloco <code>"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub kind: BlockKind,
    #[serde(rename = "alas", default)]
    pub wings: IndexMap<WingCode, Wing>,
}

impl Block {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the display name
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Mark the block as virtual (not laid out)
    pub fn virtual_block(mut self) -> Self {
        self.kind = BlockKind::Virtual;
        self
    }

    /// Add a wing (builder style)
    pub fn wing(mut self, code: impl Into<WingCode>, wing: Wing) -> Self {
        self.wings.insert(code.into(), wing);
        self
    }

    /// Display name, falling back to "Bloco <code>"
    pub fn display_name(&self, code: &str) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("Bloco {code}"))
    }

    /// Wings that get their own sub-grid (everything not folded into a parent)
    pub fn grid_wings(&self) -> impl Iterator<Item = (&WingCode, &Wing)> {
        self.wings.iter().filter(|(_, wing)| !wing.is_folded())
    }

    /// Wings folded into the given parent, in document order
    pub fn folded_into<'a>(&'a self, parent: &'a str) -> impl Iterator<Item = (&'a WingCode, &'a Wing)> + 'a {
        self.wings
            .iter()
            .filter(move |(_, wing)| wing.fold_into.as_deref() == Some(parent))
    }

    /// All folded wings of the block, in document order
    pub fn folded_wings(&self) -> impl Iterator<Item = (&WingCode, &Wing)> {
        self.wings.iter().filter(|(_, wing)| wing.is_folded())
    }
}

/// A subdivision of a block holding an ordered list of cells
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wing {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Ordered cell labels; empty means open admission
    #[serde(rename = "celas", default)]
    pub cells: Vec<CellLabel>,
    /// Parent wing this remission/overflow wing is folded into
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fold_into: Option<WingCode>,
    /// Short label for the folded slot (e.g. "REM.1")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Wing {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn cells<I, S>(mut self, cells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<CellLabel>,
    {
        self.cells = cells.into_iter().map(Into::into).collect();
        self
    }

    pub fn fold_into(mut self, parent: impl Into<WingCode>) -> Self {
        self.fold_into = Some(parent.into());
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Whether any cell value is admitted
    pub fn is_open(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn is_folded(&self) -> bool {
        self.fold_into.is_some()
    }

    /// Whether a record with this cell label belongs to the wing
    pub fn accepts(&self, cell: &str) -> bool {
        self.is_open() || self.cells.iter().any(|c| c == cell)
    }

    /// Label written next to a folded slot
    pub fn slot_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }
}

// ============================================================================
// Summary configuration
// ============================================================================

/// Control label-column lines beyond the per-block lines
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryConfig {
    #[serde(default)]
    pub sections: Vec<SummarySection>,
    /// Manual lines written after the sections, outside every total
    #[serde(default)]
    pub trailer: Vec<String>,
}

impl SummaryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn section(mut self, section: SummarySection) -> Self {
        self.sections.push(section);
        self
    }

    pub fn trailer<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.trailer = labels.into_iter().map(Into::into).collect();
        self
    }
}

/// Which grand total a section's subtotal feeds
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionScope {
    /// Counted in TOTAL INTERNO
    #[default]
    Internal,
    /// Added to TOTAL INTERNO in TOTAL GERAL
    External,
}

/// A titled group of label-column lines closed by a total line
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SummarySection {
    /// Label of the total line (e.g. "Total Carceragem")
    pub title: String,
    #[serde(default)]
    pub scope: SectionScope,
    #[serde(default)]
    pub lines: Vec<SummaryLine>,
}

impl SummarySection {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            scope: SectionScope::Internal,
            lines: Vec::new(),
        }
    }

    pub fn external(mut self) -> Self {
        self.scope = SectionScope::External;
        self
    }

    pub fn line(mut self, line: SummaryLine) -> Self {
        self.lines.push(line);
        self
    }
}

/// One label-column line: a virtual aggregate when `sum` is non-empty, otherwise
/// a manual line left for the operator
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryLine {
    pub label: String,
    /// Wings whose counts are summed across all their cells
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sum: Vec<WingRef>,
    /// Whether the line is included in its section total
    #[serde(default = "default_true")]
    pub counted: bool,
}

fn default_true() -> bool {
    true
}

impl SummaryLine {
    pub fn manual(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            sum: Vec::new(),
            counted: true,
        }
    }

    pub fn aggregate(label: impl Into<String>, sources: Vec<WingRef>) -> Self {
        Self {
            label: label.into(),
            sum: sources,
            counted: true,
        }
    }

    pub fn uncounted(mut self) -> Self {
        self.counted = false;
        self
    }

    pub fn is_aggregate(&self) -> bool {
        !self.sum.is_empty()
    }
}

/// Reference to a wing inside a unit
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WingRef {
    pub block: BlockCode,
    pub wing: WingCode,
}

impl WingRef {
    pub fn new(block: impl Into<BlockCode>, wing: impl Into<WingCode>) -> Self {
        Self {
            block: block.into(),
            wing: wing.into(),
        }
    }
}

// ============================================================================
// Records
// ============================================================================

/// A location record as captured from the portal, before classification
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    pub wing: String,
    pub cell: String,
    pub code: String,
    pub name: String,
}

impl RawRecord {
    pub fn new(
        wing: impl Into<String>,
        cell: impl Into<String>,
        code: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            wing: wing.into(),
            cell: cell.into(),
            code: code.into(),
            name: name.into(),
        }
    }

    /// Build a record from the portal's location text (e.g. `"ALA: PRIS/DOM/1"`).
    ///
    /// Whitespace and the `ALA:` marker are removed, then the text is split on the
    /// last `/`: wing names may themselves contain `/`. Text without any `/` is
    /// taken as a wing with an empty cell.
    pub fn from_location(location: &str, code: impl Into<String>, name: impl Into<String>) -> Self {
        let compact: String = location.chars().filter(|c| !c.is_whitespace()).collect();
        let compact = compact.replace("ALA:", "");
        let (wing, cell) = match compact.rfind('/') {
            Some(idx) => (&compact[..idx], &compact[idx + 1..]),
            None => (compact.as_str(), ""),
        };
        Self::new(wing, cell, code, name)
    }

    /// Parse one listing entry of the portal's roll-call page.
    ///
    /// The entry text has five lines: a marked code, three ignored lines and the
    /// location. The first two characters of the code are the marker.
    pub fn from_listing_entry(entry: &str, name: &str) -> Option<Self> {
        let compact = entry.replace(' ', "");
        let lines: Vec<&str> = compact.trim().lines().map(str::trim).collect();
        let [code, _, _, _, location] = lines.as_slice() else {
            return None;
        };
        let code: String = code.chars().skip(2).collect();
        Some(Self::from_location(location, code, name.trim()))
    }
}

/// A record resolved against the topology
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClassifiedRecord {
    pub block: BlockCode,
    pub wing: WingCode,
    pub cell: CellLabel,
    pub code: String,
    pub name: String,
}

// ============================================================================
// Occupancy
// ============================================================================

/// Headcount per block → wing → cell.
///
/// Cells without records are absent; every accessor reads absence as zero.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct OccupancyCount {
    blocks: BTreeMap<BlockCode, BTreeMap<WingCode, BTreeMap<CellLabel, u32>>>,
}

impl OccupancyCount {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one occupant of the given cell
    pub fn add(&mut self, block: &str, wing: &str, cell: &str) {
        *self
            .blocks
            .entry(block.to_string())
            .or_default()
            .entry(wing.to_string())
            .or_default()
            .entry(cell.to_string())
            .or_default() += 1;
    }

    pub fn add_record(&mut self, record: &ClassifiedRecord) {
        self.add(&record.block, &record.wing, &record.cell);
    }

    /// Headcount of one cell (zero when absent)
    pub fn get(&self, block: &str, wing: &str, cell: &str) -> u32 {
        self.wing(block, wing)
            .and_then(|cells| cells.get(cell))
            .copied()
            .unwrap_or(0)
    }

    /// Per-cell counts of one wing
    pub fn wing(&self, block: &str, wing: &str) -> Option<&BTreeMap<CellLabel, u32>> {
        self.blocks.get(block).and_then(|wings| wings.get(wing))
    }

    /// Flat sum across every cell of a wing
    pub fn wing_total(&self, block: &str, wing: &str) -> u32 {
        self.wing(block, wing)
            .map(|cells| cells.values().sum())
            .unwrap_or(0)
    }

    /// Total headcount
    pub fn total(&self) -> u32 {
        self.iter().map(|(_, _, _, count)| count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Iterate `(block, wing, cell, count)` in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &str, u32)> {
        self.blocks.iter().flat_map(|(block, wings)| {
            wings.iter().flat_map(move |(wing, cells)| {
                cells
                    .iter()
                    .map(move |(cell, count)| (block.as_str(), wing.as_str(), cell.as_str(), *count))
            })
        })
    }

    /// The nested mapping itself
    pub fn blocks(&self) -> &BTreeMap<BlockCode, BTreeMap<WingCode, BTreeMap<CellLabel, u32>>> {
        &self.blocks
    }
}

impl<'a> FromIterator<&'a ClassifiedRecord> for OccupancyCount {
    fn from_iter<T: IntoIterator<Item = &'a ClassifiedRecord>>(iter: T) -> Self {
        let mut counts = Self::new();
        for record in iter {
            counts.add_record(record);
        }
        counts
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Topology lookup and validation error
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("Unit not configured: {0}")]
    UnknownUnit(UnitCode),

    #[error("Duplicate cell '{cell}' in wing {block}/{wing} of unit {unit}")]
    DuplicateCell {
        unit: UnitCode,
        block: BlockCode,
        wing: WingCode,
        cell: CellLabel,
    },

    #[error("Wing {block}/{wing} of unit {unit} folds into unknown wing '{parent}'")]
    UnknownFoldParent {
        unit: UnitCode,
        block: BlockCode,
        wing: WingCode,
        parent: WingCode,
    },

    #[error("Summary line '{line}' of unit {unit} sums unknown wing {block}/{wing}")]
    UnknownAggregateSource {
        unit: UnitCode,
        line: String,
        block: BlockCode,
        wing: WingCode,
    },

    #[error("Invalid topology: {0}")]
    Invalid(String),
}

/// Rendering error
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Format error: {0}")]
    Format(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

// ============================================================================
// Tests
// ============================================================================
