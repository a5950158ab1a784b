//! Control → SEI cell correspondence
//!
//! The only hand-written address table in the crate. It pairs every QTD cell of
//! the standard SEI form with the Control cell printed at the same position: the
//! Control grid's wing columns for Bloco A land on the form's first region, those of
//! Bloco B on the second. Pairs whose Control side is not a slot (form rows below a
//! wing's last cell) are legal and simply skipped when filling.

use crate::grid::CellRef;

/// Bloco A: Control QTD columns D, F, H, J, L → SEI B, D, F, H, J
const BAND_A_COLUMNS: [(u16, u16); 5] = [(4, 2), (6, 4), (8, 6), (10, 8), (12, 10)];

/// Bloco B: Control QTD columns O, Q, S, U, W, Y, AA → SEI B, D, F, H, J, L, N
const BAND_B_COLUMNS: [(u16, u16); 7] = [
    (15, 2),
    (17, 4),
    (19, 6),
    (21, 8),
    (23, 10),
    (25, 12),
    (27, 14),
];

/// One mirrored pair
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MappingPair {
    pub sei: CellRef,
    pub control: CellRef,
}

/// Ordered list of (SEI, Control) address pairs
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CrossSheetMapping {
    pairs: Vec<MappingPair>,
}

impl CrossSheetMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mapping for the standard form and the standard two-block Control grid
    pub fn standard() -> Self {
        Self::new()
            .band(5, 32, 6, &BAND_A_COLUMNS)
            .band(5, 28, 42, &BAND_B_COLUMNS)
    }

    /// Add a rectangular band: Control rows `first..=last` map row by row onto
    /// SEI rows starting at `sei_first`, for each (Control column, SEI column).
    pub fn band(mut self, first: u32, last: u32, sei_first: u32, columns: &[(u16, u16)]) -> Self {
        for row in first..=last {
            let sei_row = sei_first + (row - first);
            for &(control_col, sei_col) in columns {
                self.pairs.push(MappingPair {
                    sei: CellRef::new(sei_row, sei_col),
                    control: CellRef::new(row, control_col),
                });
            }
        }
        self
    }

    /// Build from explicit `(sei, control)` pairs
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (CellRef, CellRef)>,
    {
        Self {
            pairs: pairs
                .into_iter()
                .map(|(sei, control)| MappingPair { sei, control })
                .collect(),
        }
    }

    pub fn pairs(&self) -> &[MappingPair] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// SEI address mirroring a Control address
    pub fn sei_for(&self, control: CellRef) -> Option<CellRef> {
        self.pairs
            .iter()
            .find(|pair| pair.control == control)
            .map(|pair| pair.sei)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(address: &str) -> CellRef {
        CellRef::parse(address).unwrap()
    }

    #[test]
    fn standard_size() {
        assert_eq!(CrossSheetMapping::standard().len(), 28 * 5 + 24 * 7);
    }

    #[test]
    fn standard_corners() {
        let mapping = CrossSheetMapping::standard();
        assert_eq!(mapping.sei_for(at("D5")), Some(at("B6")));
        assert_eq!(mapping.sei_for(at("L32")), Some(at("J33")));
        assert_eq!(mapping.sei_for(at("O5")), Some(at("B42")));
        assert_eq!(mapping.sei_for(at("O13")), Some(at("B50")));
        assert_eq!(mapping.sei_for(at("AA28")), Some(at("N65")));
        // Wing total rows are never mirrored.
        assert_eq!(mapping.sei_for(at("D33")), None);
    }

    #[test]
    fn from_pairs_keeps_order() {
        let mapping = CrossSheetMapping::from_pairs([(at("B6"), at("D5")), (at("B7"), at("D6"))]);
        assert_eq!(mapping.pairs()[1].sei, at("B7"));
        assert_eq!(mapping.pairs()[1].control, at("D6"));
    }
}
