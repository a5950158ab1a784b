//! Control sheet layout
//!
//! ```text
//!      A              B     C     D     E     F      M   N     O
//!  1  [  date      ]       [       BLOCO A        ]     [  BLOCO B ...
//!  2  [  shift     ]       [ ALA 12  ][ ALA 13  ]       [ ALA 01  ]
//!  3  ALA 12         =D33  [ desc    ][ desc    ]       [ desc    ]
//!  4  ...                  CELA  QTD  CELA  QTD         CELA  QTD
//!  5                       1     n    1     n           1     n
//!  ..                      ...                          ...
//!  13                                                   REM.1 n      <- folded wing
//!  33                            SUM        SUM               SUM    <- wing totals
//! ```
//!
//! Column A holds one line per wing, per-block totals, the configured summary
//! sections, the trailer lines and the two grand totals. The cell grid starts in
//! column C: one (CELA, QTD) pair per wing, blocks separated by a narrow blank
//! column. All addresses are generated in a single pass over the topology.

use super::{LayoutTemplate, SheetKind, SlotKey, SlotRule};
use crate::grid::{CellRef, CellValue, Fill, Style};
use censo_core::shift::header_date;
use censo_core::{
    Diagnostic, DiagnosticCode, DiagnosticEmitter, SectionScope, Shift, UnitTopology, WingRef,
};
use chrono::NaiveDate;
use std::collections::HashMap;

const LABEL_COL: u16 = 1;
const VALUE_COL: u16 = 2;
const FIRST_LINE_ROW: u32 = 3;
const GRID_FIRST_COL: u16 = 3;
const DATA_FIRST_ROW: u32 = 5;
/// Wing totals never sit above this row
const MIN_TOTAL_ROW: u32 = 33;
const LABEL_WIDTH: f64 = 20.0;
const SEPARATOR_WIDTH: f64 = 3.0;

/// Build the Control template of one unit
pub fn build(
    unit_code: &str,
    unit: &UnitTopology,
    date: NaiveDate,
    emitter: &mut dyn DiagnosticEmitter,
) -> LayoutTemplate {
    let mut template = LayoutTemplate::new(SheetKind::Control, unit_code);

    write_header(&mut template, date);
    let anchors = build_grid(&mut template, unit);
    build_label_column(&mut template, unit_code, unit, &anchors, emitter);

    tracing::debug!(
        unit = unit_code,
        slots = template.slot_count(),
        "built control template"
    );
    template
}

fn write_header(template: &mut LayoutTemplate, date: NaiveDate) {
    let style = Style::new().fill(Fill::Purple).bold().centered().bordered();
    let sheet = &mut template.sheet;

    let date_at = CellRef::new(1, LABEL_COL);
    sheet.write(date_at, CellValue::text(header_date(date)), style);
    sheet.merge(date_at, date_at.right(1));

    let shift_at = CellRef::new(2, LABEL_COL);
    sheet.write(shift_at, CellValue::text(Shift::on(date).as_str()), style);
    sheet.merge(shift_at, shift_at.right(1));
}

/// Addresses the label column refers to
#[derive(Default)]
struct GridAnchors {
    wing_totals: HashMap<WingRef, CellRef>,
    folded: HashMap<WingRef, CellRef>,
}

fn build_grid(template: &mut LayoutTemplate, unit: &UnitTopology) -> GridAnchors {
    let mut anchors = GridAnchors::default();
    let mut wing_columns: Vec<(WingRef, u16, Vec<CellRef>)> = Vec::new();
    let mut last_row = DATA_FIRST_ROW - 1;
    let mut col = GRID_FIRST_COL;

    let header = Style::new().bold().centered().bordered();
    let plain = Style::new().centered().bordered();
    let label = Style::new().fill(Fill::Blue).centered().bordered();
    let quantity = Style::new().centered().bordered();

    for (block_code, block) in unit.housing_blocks() {
        if block.grid_wings().next().is_none() {
            continue;
        }
        if col > GRID_FIRST_COL {
            template.sheet.set_column_width(col, SEPARATOR_WIDTH);
            col += 1;
        }
        let block_first_col = col;

        for (wing_code, wing) in block.grid_wings() {
            let cela_col = col;
            let qtd_col = col + 1;
            let sheet = &mut template.sheet;

            let name_at = CellRef::new(2, cela_col);
            sheet.write(name_at, CellValue::text(&wing.name), header);
            sheet.merge(name_at, name_at.right(1));

            let description_at = CellRef::new(3, cela_col);
            sheet.write(description_at, CellValue::text(&wing.description), plain);
            sheet.merge(description_at, description_at.right(1));

            let columns_style = Style::new().fill(Fill::Gray).bold().centered().bordered();
            sheet.write(CellRef::new(4, cela_col), CellValue::text("CELA"), columns_style);
            sheet.write(CellRef::new(4, qtd_col), CellValue::text("QTD"), columns_style);

            let mut cells = Vec::with_capacity(wing.cells.len());
            for (i, cell) in wing.cells.iter().enumerate() {
                let row = DATA_FIRST_ROW + i as u32;
                let at = CellRef::new(row, qtd_col);
                template.sheet.write(CellRef::new(row, cela_col), CellValue::text(cell), label);
                template.sheet.write(at, CellValue::Empty, quantity);
                template.reserve(
                    SlotKey::Cell {
                        block: block_code.clone(),
                        wing: wing_code.clone(),
                        cell: cell.clone(),
                    },
                    at,
                    SlotRule::Count {
                        block: block_code.clone(),
                        wing: wing_code.clone(),
                        cell: cell.clone(),
                    },
                );
                cells.push(at);
                last_row = last_row.max(row);
            }

            // Folded wings sit two rows below the parent's last cell.
            let folded_first = DATA_FIRST_ROW + wing.cells.len() as u32 + 2;
            for (k, (folded_code, folded)) in block.folded_into(wing_code).enumerate() {
                let row = folded_first + k as u32;
                let at = CellRef::new(row, qtd_col);
                let folded_ref = WingRef::new(block_code.clone(), folded_code.clone());
                template
                    .sheet
                    .write(CellRef::new(row, cela_col), CellValue::text(folded.slot_label()), label);
                template.sheet.write(at, CellValue::Empty, quantity);
                template.reserve(
                    SlotKey::Folded {
                        block: block_code.clone(),
                        wing: folded_code.clone(),
                    },
                    at,
                    SlotRule::FlatSum(vec![folded_ref.clone()]),
                );
                anchors.folded.insert(folded_ref, at);
                last_row = last_row.max(row);
            }

            wing_columns.push((WingRef::new(block_code.clone(), wing_code.clone()), qtd_col, cells));
            col += 2;
        }

        let title_at = CellRef::new(1, block_first_col);
        template.sheet.write(
            title_at,
            CellValue::text(block.display_name(block_code).to_uppercase()),
            Style::new().fill(Fill::Gray).bold().centered().bordered(),
        );
        template.sheet.merge(title_at, CellRef::new(1, col - 1));
    }

    let total_row = MIN_TOTAL_ROW.max(last_row + 1);
    let total_style = Style::new().fill(Fill::Yellow).bold().centered().bordered();
    for (wing_ref, qtd_col, cells) in wing_columns {
        let at = CellRef::new(total_row, qtd_col);
        // Open wings have no per-cell rows; their total is the flat count.
        let rule = if cells.is_empty() {
            SlotRule::FlatSum(vec![wing_ref.clone()])
        } else {
            SlotRule::Sum(cells)
        };
        template.sheet.write(at, CellValue::Empty, total_style);
        template.reserve(
            SlotKey::WingTotal {
                block: wing_ref.block.clone(),
                wing: wing_ref.wing.clone(),
            },
            at,
            rule,
        );
        anchors.wing_totals.insert(wing_ref, at);
    }

    anchors
}

/// Writes label-column lines top to bottom
struct LineWriter<'a, 'e> {
    template: &'a mut LayoutTemplate,
    unit_code: &'a str,
    emitter: &'e mut dyn DiagnosticEmitter,
    row: u32,
}

impl LineWriter<'_, '_> {
    fn push(&mut self, key: SlotKey, label: &str, rule: SlotRule, style: Style) -> Option<CellRef> {
        let label_at = CellRef::new(self.row, LABEL_COL);
        let at = CellRef::new(self.row, VALUE_COL);
        self.row += 1;

        self.template.sheet.write(label_at, CellValue::text(label), style);
        self.template.sheet.write(at, CellValue::Empty, Style::new().centered().bordered());
        if self.template.reserve(key, at, rule) {
            Some(at)
        } else {
            self.emitter.emit(
                Diagnostic::new(
                    DiagnosticCode::W002TemplateDrift,
                    format!("duplicate Control line '{label}' left without a value"),
                )
                .with_unit(self.unit_code)
                .with_hint("give every wing, summary line and section a distinct label"),
            );
            None
        }
    }

    fn line(&mut self, label: &str, rule: SlotRule, fill: Fill) -> Option<CellRef> {
        let style = Style::new().fill(fill).centered().bordered();
        self.push(SlotKey::Line(label.to_string()), label, rule, style)
    }

    fn total(&mut self, key: SlotKey, label: &str, parts: Vec<CellRef>) -> Option<CellRef> {
        let style = Style::new().fill(Fill::Yellow).bold().centered().bordered();
        self.push(key, label, SlotRule::Sum(parts), style)
    }
}

fn build_label_column(
    template: &mut LayoutTemplate,
    unit_code: &str,
    unit: &UnitTopology,
    anchors: &GridAnchors,
    emitter: &mut dyn DiagnosticEmitter,
) {
    let mut writer = LineWriter {
        template,
        unit_code,
        emitter,
        row: FIRST_LINE_ROW,
    };
    let mut internal = Vec::new();
    let mut external = Vec::new();

    for (block_code, block) in unit.housing_blocks() {
        let mut lines = Vec::new();
        for (wing_code, wing) in block.folded_wings() {
            let wing_ref = WingRef::new(block_code.clone(), wing_code.clone());
            if let Some(&folded_at) = anchors.folded.get(&wing_ref) {
                lines.extend(writer.line(&wing.name, SlotRule::Reference(folded_at), Fill::Blue));
            }
        }
        for (wing_code, wing) in block.grid_wings() {
            let wing_ref = WingRef::new(block_code.clone(), wing_code.clone());
            if let Some(&total_at) = anchors.wing_totals.get(&wing_ref) {
                lines.extend(writer.line(&wing.name, SlotRule::Reference(total_at), Fill::Blue));
            }
        }
        if lines.is_empty() {
            continue;
        }
        let title = format!("Total {}", block.display_name(block_code));
        internal.extend(writer.total(SlotKey::SectionTotal(title.clone()), &title, lines));
    }

    for section in &unit.summary.sections {
        let mut counted = Vec::new();
        for line in &section.lines {
            let rule = if line.is_aggregate() {
                SlotRule::FlatSum(line.sum.clone())
            } else {
                SlotRule::Manual
            };
            let fill = if line.counted { Fill::Blue } else { Fill::Purple };
            let at = writer.line(&line.label, rule, fill);
            if line.counted {
                counted.extend(at);
            }
        }
        let total = writer.total(
            SlotKey::SectionTotal(section.title.clone()),
            &section.title,
            counted,
        );
        match section.scope {
            SectionScope::Internal => internal.extend(total),
            SectionScope::External => external.extend(total),
        }
    }

    for label in &unit.summary.trailer {
        writer.line(label, SlotRule::Manual, Fill::Purple);
    }

    writer.row += 1;
    let internal_at = writer.total(SlotKey::InternalTotal, "TOTAL INTERNO", internal);
    external.extend(internal_at);
    writer.total(SlotKey::GeneralTotal, "TOTAL GERAL", external);

    let last_row = writer.row - 1;
    let sheet = &mut template.sheet;
    sheet.border_range(CellRef::new(1, LABEL_COL), CellRef::new(last_row, VALUE_COL));
    sheet.set_column_width(LABEL_COL, LABEL_WIDTH);
}
