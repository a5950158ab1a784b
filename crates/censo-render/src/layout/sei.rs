//! SEI sheet layout
//!
//! The SEI sheet reproduces a printed form whose geometry is fixed: regions of
//! (CELA, QTD) column pairs with a set number of data rows, column totals, a region
//! total line and a two-line footer. Only the cell labels come from the topology.
//! Quantities are never computed here; they are mirrored from the Control sheet.

use super::{LayoutTemplate, SheetKind, SlotKey, SlotRule};
use crate::grid::{CellRef, CellValue, Fill, Style};
use censo_core::{
    Block, Diagnostic, DiagnosticCode, DiagnosticEmitter, UnitTopology, Wing, WingCode,
};

/// One titled region of the form
#[derive(Clone, Debug, PartialEq)]
pub struct SeiRegion {
    /// Short name used in `TOTAL <name>` (e.g. "A")
    pub name: String,
    /// Title printed across the three title rows
    pub title: String,
    /// First title row
    pub first_row: u32,
    /// Wing codes, one (CELA, QTD) pair each, left to right
    pub wings: Vec<WingCode>,
    /// Number of data rows under the column headers
    pub data_rows: u32,
}

impl SeiRegion {
    pub fn new<I, S>(name: &str, first_row: u32, data_rows: u32, wings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<WingCode>,
    {
        Self {
            name: name.to_string(),
            title: format!("Bloco {name}"),
            first_row,
            wings: wings.into_iter().map(Into::into).collect(),
            data_rows,
        }
    }

    pub fn header_row(&self) -> u32 {
        self.first_row + 3
    }

    pub fn data_first_row(&self) -> u32 {
        self.first_row + 5
    }

    pub fn data_last_row(&self) -> u32 {
        self.data_first_row() + self.data_rows - 1
    }

    /// Row of the per-column totals
    pub fn totals_row(&self) -> u32 {
        self.data_last_row() + 1
    }

    /// Row of `TOTAL <name>`
    pub fn total_line_row(&self) -> u32 {
        self.totals_row() + 1
    }

    pub fn last_col(&self) -> u16 {
        (self.wings.len() as u16 * 2).max(2)
    }
}

/// Geometry of the printed SEI form
#[derive(Clone, Debug, PartialEq)]
pub struct SeiForm {
    pub regions: Vec<SeiRegion>,
    /// Label of the footer line summing Control lines
    pub cross_sheet_label: String,
    /// Control lines whose label starts with this prefix feed the footer line
    pub cross_sheet_prefix: String,
    pub font_name: String,
    pub font_size: f64,
    /// Width of the first region's columns
    pub column_width: f64,
}

impl SeiForm {
    /// The standard form: Bloco A (wings 12–16, 28 rows) and Bloco B (wings 01–07,
    /// 24 rows), footer on rows 68 and 69
    pub fn standard() -> Self {
        Self {
            regions: vec![
                SeiRegion::new("A", 1, 28, ["12", "13", "14", "15", "16"]),
                SeiRegion::new("B", 37, 24, ["01", "02", "03", "04", "05", "06", "07"]),
            ],
            cross_sheet_label: "TRIAGEM".into(),
            cross_sheet_prefix: "Triagem".into(),
            font_name: "Arial".into(),
            font_size: 10.0,
            column_width: 8.0,
        }
    }

    /// Row of the cross-sheet footer line
    pub fn footer_row(&self) -> u32 {
        self.regions
            .iter()
            .map(SeiRegion::total_line_row)
            .max()
            .unwrap_or(0)
            + 1
    }

    pub fn last_col(&self) -> u16 {
        self.regions.iter().map(SeiRegion::last_col).max().unwrap_or(2)
    }
}

impl Default for SeiForm {
    fn default() -> Self {
        Self::standard()
    }
}

/// Build the SEI template of one unit
pub fn build(
    unit_code: &str,
    unit: &UnitTopology,
    form: &SeiForm,
    emitter: &mut dyn DiagnosticEmitter,
) -> LayoutTemplate {
    let mut template = LayoutTemplate::new(SheetKind::Sei, unit_code);
    let mut region_totals = Vec::new();

    for region in &form.regions {
        region_totals.push(build_region(&mut template, unit_code, unit, region, emitter));
    }

    let last_col = form.last_col();
    let footer_row = form.footer_row();
    let centered = Style::new().centered();

    let cross_at = CellRef::new(footer_row, 2);
    template.sheet.write(
        CellRef::new(footer_row, 1),
        CellValue::text(&form.cross_sheet_label),
        centered,
    );
    template.sheet.merge(cross_at, CellRef::new(footer_row, last_col));
    template.sheet.write(cross_at, CellValue::Empty, centered);
    template.reserve(
        SlotKey::CrossSheet,
        cross_at,
        SlotRule::CrossSheet {
            line_prefix: form.cross_sheet_prefix.clone(),
        },
    );

    let general_at = CellRef::new(footer_row + 1, 2);
    template.sheet.write(
        CellRef::new(footer_row + 1, 1),
        CellValue::text("TOTAL GERAL"),
        centered,
    );
    template.sheet.merge(general_at, CellRef::new(footer_row + 1, last_col));
    template.sheet.write(general_at, CellValue::Empty, centered);
    region_totals.push(cross_at);
    template.reserve(SlotKey::SeiGeneralTotal, general_at, SlotRule::Sum(region_totals));

    // Borders: each region down to its total line, the last one through the footer.
    let last_region = form.regions.len().saturating_sub(1);
    for (i, region) in form.regions.iter().enumerate() {
        let last_row = if i == last_region {
            footer_row + 1
        } else {
            region.total_line_row()
        };
        template.sheet.border_range(
            CellRef::new(region.first_row, 1),
            CellRef::new(last_row, region.last_col()),
        );
    }

    let first_width = form.regions.first().map(SeiRegion::last_col).unwrap_or(0);
    for col in 1..=first_width {
        template.sheet.set_column_width(col, form.column_width);
    }
    template.sheet.set_font(&form.font_name, form.font_size);

    tracing::debug!(
        unit = unit_code,
        slots = template.slot_count(),
        "built SEI template"
    );
    template
}

/// First housing block declaring the wing
fn find_wing<'a>(unit: &'a UnitTopology, code: &str) -> Option<(&'a Block, &'a Wing)> {
    unit.housing_blocks()
        .find_map(|(_, block)| block.wings.get(code).map(|wing| (block, wing)))
}

fn build_region(
    template: &mut LayoutTemplate,
    unit_code: &str,
    unit: &UnitTopology,
    region: &SeiRegion,
    emitter: &mut dyn DiagnosticEmitter,
) -> CellRef {
    let bold = Style::new().bold().centered();
    let centered = Style::new().centered();
    let label = Style::new().fill(Fill::Blue).centered();
    let last_col = region.last_col();

    let title_at = CellRef::new(region.first_row, 1);
    template.sheet.write(
        title_at,
        CellValue::text(&region.title),
        Style::new().fill(Fill::Gray).bold().centered(),
    );
    template
        .sheet
        .merge(title_at, CellRef::new(region.first_row + 2, last_col));

    let mut column_totals = Vec::new();
    for (i, wing_code) in region.wings.iter().enumerate() {
        let cela_col = 1 + 2 * i as u16;
        let qtd_col = cela_col + 1;

        let header_at = CellRef::new(region.header_row(), cela_col);
        template
            .sheet
            .write(header_at, CellValue::text(format!("Ala {wing_code}")), bold);
        template.sheet.merge(header_at, header_at.right(1));
        template
            .sheet
            .write(header_at.down(1), CellValue::text("CELA"), centered);
        template
            .sheet
            .write(header_at.down(1).right(1), CellValue::text("QTD"), centered);

        for row in region.data_first_row()..=region.data_last_row() {
            let at = CellRef::new(row, qtd_col);
            template.sheet.write(at, CellValue::Empty, centered);
            template.reserve(SlotKey::FormQuantity(at), at, SlotRule::Mirror);
        }

        write_cell_labels(template, unit_code, unit, region, wing_code, cela_col, label, emitter);

        let total_at = CellRef::new(region.totals_row(), qtd_col);
        template
            .sheet
            .write(total_at, CellValue::Empty, Style::new().fill(Fill::Yellow).centered());
        template.reserve(
            SlotKey::ColumnTotal {
                region: region.name.clone(),
                col: qtd_col,
            },
            total_at,
            SlotRule::SumRange(
                CellRef::new(region.data_first_row(), qtd_col),
                CellRef::new(region.data_last_row(), qtd_col),
            ),
        );
        column_totals.push(total_at);
    }

    let line_row = region.total_line_row();
    let total_at = CellRef::new(line_row, 2);
    template.sheet.write(
        CellRef::new(line_row, 1),
        CellValue::text(format!("TOTAL {}", region.name)),
        centered,
    );
    template.sheet.write(total_at, CellValue::Empty, centered);
    template.sheet.merge(total_at, CellRef::new(line_row, last_col));
    template.reserve(
        SlotKey::RegionTotal(region.name.clone()),
        total_at,
        SlotRule::SumRange(
            CellRef::new(region.totals_row(), 2),
            CellRef::new(region.totals_row(), last_col),
        ),
    );
    total_at
}

fn write_cell_labels(
    template: &mut LayoutTemplate,
    unit_code: &str,
    unit: &UnitTopology,
    region: &SeiRegion,
    wing_code: &str,
    col: u16,
    style: Style,
    emitter: &mut dyn DiagnosticEmitter,
) {
    let Some((block, wing)) = find_wing(unit, wing_code) else {
        emitter.emit(
            Diagnostic::new(
                DiagnosticCode::W004FormDrift,
                format!("SEI form wing '{wing_code}' is not configured"),
            )
            .with_unit(unit_code)
            .with_note(format!("column {} of region {} left without labels", col, region.name)),
        );
        return;
    };

    let first = region.data_first_row();
    let folded_first = first + wing.cells.len() as u32 + 2;
    let mut labels: Vec<(u32, &str)> = wing
        .cells
        .iter()
        .enumerate()
        .map(|(i, cell)| (first + i as u32, cell.as_str()))
        .collect();
    labels.extend(
        block
            .folded_into(wing_code)
            .enumerate()
            .map(|(k, (_, folded))| (folded_first + k as u32, folded.slot_label())),
    );

    let mut overflow = 0;
    for (row, text) in labels {
        if row > region.data_last_row() {
            overflow += 1;
            continue;
        }
        template.sheet.write(CellRef::new(row, col), CellValue::text(text), style);
    }

    if overflow > 0 {
        emitter.emit(
            Diagnostic::new(
                DiagnosticCode::W004FormDrift,
                format!(
                    "wing '{wing_code}' does not fit region {} of the SEI form",
                    region.name
                ),
            )
            .with_unit(unit_code)
            .with_note(format!(
                "{overflow} label(s) beyond the form's {} data rows",
                region.data_rows
            )),
        );
    }
}
