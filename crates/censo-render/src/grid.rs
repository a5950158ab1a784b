//! In-memory sheet model
//!
//! Every address here is 1-indexed, the way the sheets are described and
//! printed: `CellRef::new(1, 1)` is `A1`. Conversion to the writer's 0-indexed
//! coordinates happens only in [`crate::excel`].

use std::collections::BTreeMap;
use std::fmt;

// ============================================================================
// Addresses
// ============================================================================

/// A 1-indexed cell address
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellRef {
    pub row: u32,
    pub col: u16,
}

impl CellRef {
    pub const fn new(row: u32, col: u16) -> Self {
        Self { row, col }
    }

    /// Parse an A1-style address (`"AA13"`)
    pub fn parse(address: &str) -> Option<Self> {
        let split = address.find(|c: char| c.is_ascii_digit())?;
        let (letters, digits) = address.split_at(split);
        let col = letter_to_col(letters)?;
        let row: u32 = digits.parse().ok()?;
        (row > 0).then_some(Self { row, col })
    }

    /// Same column, `n` rows down
    pub fn down(self, n: u32) -> Self {
        Self::new(self.row + n, self.col)
    }

    /// Same row, `n` columns right
    pub fn right(self, n: u16) -> Self {
        Self::new(self.row, self.col + n)
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", col_to_letter(self.col), self.row)
    }
}

/// Convert a 1-indexed column number to its letter (1 → A, 27 → AA)
pub fn col_to_letter(col: u16) -> String {
    let mut result = String::new();
    let mut n = u32::from(col.max(1)) - 1;
    loop {
        result.insert(0, (b'A' + (n % 26) as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    result
}

/// Convert column letters to a 1-indexed column number
pub fn letter_to_col(letters: &str) -> Option<u16> {
    if letters.is_empty() {
        return None;
    }
    let mut col: u32 = 0;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        col = col * 26 + u32::from(c.to_ascii_uppercase() as u8 - b'A' + 1);
    }
    u16::try_from(col).ok()
}

/// `=SUM(...)` over the given cells.
///
/// Runs of consecutive rows in one column collapse into a range, so wing cells
/// read `=SUM(D5:D7)` and scattered subtotals read `=SUM(B8,B18,B24)`. An optional
/// sheet name prefixes every operand.
pub fn sum_formula(sheet: Option<&str>, cells: &[CellRef]) -> String {
    let prefix = sheet.map(|s| format!("'{s}'!")).unwrap_or_default();
    let mut operands = Vec::new();
    let mut i = 0;
    while i < cells.len() {
        let start = cells[i];
        let mut end = start;
        while i + 1 < cells.len() && cells[i + 1] == end.down(1) {
            end = cells[i + 1];
            i += 1;
        }
        if start == end {
            operands.push(format!("{prefix}{start}"));
        } else {
            operands.push(format!("{prefix}{start}:{end}"));
        }
        i += 1;
    }
    format!("=SUM({})", operands.join(","))
}

// ============================================================================
// Cells
// ============================================================================

/// Content of one cell
#[derive(Clone, Debug, Default, PartialEq)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Formula(String),
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_formula(&self) -> Option<&str> {
        match self {
            Self::Formula(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// Solid fills used by the report sheets
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Fill {
    /// Block titles, column headers, subtotals
    Gray,
    /// Cell label columns
    Blue,
    /// Total rows
    Yellow,
    /// Header and operator-maintained lines
    Purple,
}

impl Fill {
    pub fn rgb(self) -> u32 {
        match self {
            Fill::Gray => 0xC0C0C0,
            Fill::Blue => 0x00B0F0,
            Fill::Yellow => 0xFFFF00,
            Fill::Purple => 0xD9D9F3,
        }
    }
}

/// Visual style of one cell
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Style {
    pub fill: Option<Fill>,
    pub bold: bool,
    pub border: bool,
    pub centered: bool,
}

impl Style {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fill(mut self, fill: Fill) -> Self {
        self.fill = Some(fill);
        self
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn bordered(mut self) -> Self {
        self.border = true;
        self
    }

    pub fn centered(mut self) -> Self {
        self.centered = true;
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Cell {
    pub value: CellValue,
    pub style: Style,
}

/// A merged rectangular region
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MergedRange {
    pub first: CellRef,
    pub last: CellRef,
}

impl MergedRange {
    pub fn contains(&self, at: CellRef) -> bool {
        (self.first.row..=self.last.row).contains(&at.row)
            && (self.first.col..=self.last.col).contains(&at.col)
    }
}

/// Sheet-wide font
#[derive(Clone, Debug, PartialEq)]
pub struct Font {
    pub name: String,
    pub size: f64,
}

// ============================================================================
// Sheet
// ============================================================================

static EMPTY: CellValue = CellValue::Empty;

/// A named worksheet: sparse cells, merges and column widths
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Sheet {
    pub name: String,
    cells: BTreeMap<CellRef, Cell>,
    merges: Vec<MergedRange>,
    column_widths: BTreeMap<u16, f64>,
    font: Option<Font>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Write a value and style
    pub fn write(&mut self, at: CellRef, value: CellValue, style: Style) {
        self.cells.insert(at, Cell { value, style });
    }

    /// Replace the value, keeping the current style
    pub fn set_value(&mut self, at: CellRef, value: CellValue) {
        self.cells.entry(at).or_default().value = value;
    }

    /// Replace the style, keeping the current value
    pub fn set_style(&mut self, at: CellRef, style: Style) {
        self.cells.entry(at).or_default().style = style;
    }

    /// Add a thin border to every cell of a rectangle
    pub fn border_range(&mut self, first: CellRef, last: CellRef) {
        for row in first.row..=last.row {
            for col in first.col..=last.col {
                self.cells.entry(CellRef::new(row, col)).or_default().style.border = true;
            }
        }
    }

    /// Merge a rectangle; a single cell is not a merge and is ignored
    pub fn merge(&mut self, first: CellRef, last: CellRef) {
        if first == last {
            return;
        }
        self.merges.push(MergedRange { first, last });
    }

    pub fn set_column_width(&mut self, col: u16, width: f64) {
        self.column_widths.insert(col, width);
    }

    pub fn set_font(&mut self, name: impl Into<String>, size: f64) {
        self.font = Some(Font {
            name: name.into(),
            size,
        });
    }

    pub fn value(&self, at: CellRef) -> &CellValue {
        self.cells.get(&at).map(|c| &c.value).unwrap_or(&EMPTY)
    }

    pub fn style(&self, at: CellRef) -> Style {
        self.cells.get(&at).map(|c| c.style).unwrap_or_default()
    }

    pub fn cells(&self) -> impl Iterator<Item = (CellRef, &Cell)> {
        self.cells.iter().map(|(at, cell)| (*at, cell))
    }

    pub fn merges(&self) -> &[MergedRange] {
        &self.merges
    }

    /// Merged region starting at `at`, if any
    pub fn merge_at(&self, at: CellRef) -> Option<&MergedRange> {
        self.merges.iter().find(|m| m.first == at)
    }

    /// Whether `at` lies inside a merge without being its top-left cell
    pub fn is_merge_interior(&self, at: CellRef) -> bool {
        self.merges.iter().any(|m| m.first != at && m.contains(at))
    }

    pub fn column_widths(&self) -> impl Iterator<Item = (u16, f64)> + '_ {
        self.column_widths.iter().map(|(col, width)| (*col, *width))
    }

    pub fn font(&self) -> Option<&Font> {
        self.font.as_ref()
    }

    /// Last row holding any cell
    pub fn last_row(&self) -> u32 {
        self.cells.keys().map(|at| at.row).max().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_letters() {
        assert_eq!(col_to_letter(1), "A");
        assert_eq!(col_to_letter(26), "Z");
        assert_eq!(col_to_letter(27), "AA");
        assert_eq!(col_to_letter(52), "AZ");
        assert_eq!(col_to_letter(53), "BA");
        assert_eq!(letter_to_col("AA"), Some(27));
        assert_eq!(letter_to_col("n"), Some(14));
        assert_eq!(letter_to_col(""), None);
    }

    #[test]
    fn parse_and_display_addresses() {
        let at = CellRef::parse("AA13").unwrap();
        assert_eq!(at, CellRef::new(13, 27));
        assert_eq!(at.to_string(), "AA13");
        assert!(CellRef::parse("13").is_none());
        assert!(CellRef::parse("B").is_none());
        assert!(CellRef::parse("B0").is_none());
    }

    #[test]
    fn sum_formula_collapses_runs() {
        let d = |row| CellRef::new(row, 4);
        assert_eq!(sum_formula(None, &[d(5), d(6), d(7)]), "=SUM(D5:D7)");
        assert_eq!(
            sum_formula(None, &[CellRef::new(8, 2), CellRef::new(18, 2), CellRef::new(24, 2)]),
            "=SUM(B8,B18,B24)"
        );
        assert_eq!(
            sum_formula(Some("PAMC CONTROLE"), &[CellRef::new(19, 2), CellRef::new(20, 2)]),
            "=SUM('PAMC CONTROLE'!B19:B20)"
        );
    }

    #[test]
    fn set_value_keeps_style() {
        let mut sheet = Sheet::new("S");
        let at = CellRef::new(5, 4);
        sheet.write(at, CellValue::Empty, Style::new().bordered());
        sheet.set_value(at, CellValue::Number(2.0));
        assert_eq!(sheet.value(at).as_number(), Some(2.0));
        assert!(sheet.style(at).border);
        assert!(sheet.value(CellRef::new(99, 1)).is_empty());
    }

    #[test]
    fn merge_interior() {
        let mut sheet = Sheet::new("S");
        sheet.merge(CellRef::new(1, 1), CellRef::new(1, 2));
        assert!(sheet.merge_at(CellRef::new(1, 1)).is_some());
        assert!(sheet.is_merge_interior(CellRef::new(1, 2)));
        assert!(!sheet.is_merge_interior(CellRef::new(1, 1)));
        assert!(!sheet.is_merge_interior(CellRef::new(2, 2)));
    }
}
