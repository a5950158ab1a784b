//! Layout templates
//!
//! A template is a sheet with its static labels, merges and styles already in place,
//! plus an index of writable slots. Each slot carries the rule the filler applies to
//! it, so the builders own all geometry and the filler owns all values.

pub mod control;
pub mod sei;

pub use sei::{SeiForm, SeiRegion};

use crate::grid::{CellRef, Sheet};
use censo_core::{
    BlockCode, CellLabel, DiagnosticEmitter, Topology, TopologyError, WingCode, WingRef,
};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Which of the two report layouts a template implements
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SheetKind {
    Control,
    Sei,
}

impl SheetKind {
    /// Worksheet name for a unit
    pub fn sheet_name(self, unit: &str) -> String {
        match self {
            SheetKind::Control => format!("{unit} CONTROLE"),
            SheetKind::Sei => format!("{unit} SEI"),
        }
    }
}

/// Semantic key of a slot
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SlotKey {
    /// Headcount of one configured cell
    Cell {
        block: BlockCode,
        wing: WingCode,
        cell: CellLabel,
    },
    /// Total row of a wing sub-grid
    WingTotal { block: BlockCode, wing: WingCode },
    /// Flat total of a wing folded under its parent
    Folded { block: BlockCode, wing: WingCode },
    /// Value cell of a label-column line
    Line(String),
    /// Total line closing a block or summary section
    SectionTotal(String),
    InternalTotal,
    GeneralTotal,
    /// Mirrored quantity on the SEI form
    FormQuantity(CellRef),
    /// Column total of an SEI region
    ColumnTotal { region: String, col: u16 },
    /// `TOTAL <region>` line of the SEI form
    RegionTotal(String),
    /// The SEI line referencing the Control sheet
    CrossSheet,
    /// SEI `TOTAL GERAL`
    SeiGeneralTotal,
}

/// What the filler writes into a slot
#[derive(Clone, Debug, PartialEq)]
pub enum SlotRule {
    /// Literal headcount of one cell
    Count {
        block: BlockCode,
        wing: WingCode,
        cell: CellLabel,
    },
    /// Literal flat sum over every cell of the given wings
    FlatSum(Vec<WingRef>),
    /// `=SUM(...)` over the given cells
    Sum(Vec<CellRef>),
    /// `=SUM(first:last)` over a rectangle
    SumRange(CellRef, CellRef),
    /// `=<cell>`
    Reference(CellRef),
    /// Left blank for the operator
    Manual,
    /// Copied by value from the Control sheet
    Mirror,
    /// `=SUM('<control>'!...)` over the Control lines whose label starts with the prefix
    CrossSheet { line_prefix: String },
}

/// A writable address and how it is filled
#[derive(Clone, Debug, PartialEq)]
pub struct Slot {
    pub at: CellRef,
    pub rule: SlotRule,
}

/// Options shared by both builders
#[derive(Clone, Debug)]
pub struct BuildOptions {
    /// Report date printed in the Control header
    pub date: NaiveDate,
    /// Printed SEI form geometry
    pub form: SeiForm,
}

impl BuildOptions {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            form: SeiForm::standard(),
        }
    }

    pub fn form(mut self, form: SeiForm) -> Self {
        self.form = form;
        self
    }
}

/// A sheet grid with its slot index
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutTemplate {
    pub kind: SheetKind,
    pub unit: String,
    pub sheet: Sheet,
    slots: BTreeMap<SlotKey, Slot>,
    by_address: BTreeMap<CellRef, SlotKey>,
    pub(crate) filled: bool,
}

impl LayoutTemplate {
    pub(crate) fn new(kind: SheetKind, unit: &str) -> Self {
        Self {
            kind,
            unit: unit.to_string(),
            sheet: Sheet::new(kind.sheet_name(unit)),
            slots: BTreeMap::new(),
            by_address: BTreeMap::new(),
            filled: false,
        }
    }

    /// Build the template of `kind` for one unit
    pub fn build(
        topology: &Topology,
        unit: &str,
        kind: SheetKind,
        options: &BuildOptions,
        emitter: &mut dyn DiagnosticEmitter,
    ) -> Result<Self, TopologyError> {
        let unit_topology = topology.unit(unit)?;
        Ok(match kind {
            SheetKind::Control => control::build(unit, unit_topology, options.date, emitter),
            SheetKind::Sei => sei::build(unit, unit_topology, &options.form, emitter),
        })
    }

    /// Register a slot. Returns false when the key or address is already taken.
    pub(crate) fn reserve(&mut self, key: SlotKey, at: CellRef, rule: SlotRule) -> bool {
        if self.slots.contains_key(&key) || self.by_address.contains_key(&at) {
            return false;
        }
        self.by_address.insert(at, key.clone());
        self.slots.insert(key, Slot { at, rule });
        true
    }

    pub fn slot(&self, key: &SlotKey) -> Option<&Slot> {
        self.slots.get(key)
    }

    /// Address of a slot
    pub fn address(&self, key: &SlotKey) -> Option<CellRef> {
        self.slots.get(key).map(|slot| slot.at)
    }

    /// Slot key registered at an address
    pub fn key_at(&self, at: CellRef) -> Option<&SlotKey> {
        self.by_address.get(&at)
    }

    pub fn slots(&self) -> impl Iterator<Item = (&SlotKey, &Slot)> {
        self.slots.iter()
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Number of per-cell slots of one wing
    pub fn cell_slot_count(&self, block: &str, wing: &str) -> usize {
        self.slots
            .keys()
            .filter(|key| {
                matches!(key, SlotKey::Cell { block: b, wing: w, .. } if b == block && w == wing)
            })
            .count()
    }

    /// Address of a label-column line by its label
    pub fn line(&self, label: &str) -> Option<CellRef> {
        self.address(&SlotKey::Line(label.to_string()))
    }

    pub fn is_filled(&self) -> bool {
        self.filled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sheet_names() {
        assert_eq!(SheetKind::Control.sheet_name("PAMC"), "PAMC CONTROLE");
        assert_eq!(SheetKind::Sei.sheet_name("PAMC"), "PAMC SEI");
    }

    #[test]
    fn reserve_rejects_duplicates() {
        let mut template = LayoutTemplate::new(SheetKind::Control, "PAMC");
        let at = CellRef::new(3, 2);
        assert!(template.reserve(SlotKey::InternalTotal, at, SlotRule::Manual));
        assert!(!template.reserve(SlotKey::InternalTotal, CellRef::new(4, 2), SlotRule::Manual));
        assert!(!template.reserve(SlotKey::GeneralTotal, at, SlotRule::Manual));
        assert_eq!(template.key_at(at), Some(&SlotKey::InternalTotal));
        assert_eq!(template.slot_count(), 1);
    }
}
