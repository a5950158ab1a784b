//! XLSX output
//!
//! Writes filled templates into a workbook, one worksheet per template, in the
//! order given. The sheet model is 1-indexed; this module is the only place that
//! converts to the writer's 0-indexed rows and columns.
//!
//! Formulas are written as formulas, never as cached results: the workbook is
//! recalculated when opened, so operator edits to manual lines flow into every total.

use crate::grid::{CellValue, Sheet, Style};
use crate::layout::LayoutTemplate;
use censo_core::RenderError;
use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook, Worksheet};
use std::collections::HashMap;
use std::path::Path;

/// Excel workbook renderer
#[derive(Clone, Debug, Default)]
pub struct ExcelRenderer {
    /// Font applied to sheets that do not set their own
    pub default_font: Option<String>,
}

impl ExcelRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the font used by sheets without a sheet-wide font
    pub fn default_font(mut self, name: impl Into<String>) -> Self {
        self.default_font = Some(name.into());
        self
    }

    /// Generate workbook bytes
    pub fn render_to_bytes(&self, templates: &[&LayoutTemplate]) -> Result<Vec<u8>, RenderError> {
        if templates.is_empty() {
            return Err(RenderError::InvalidData("no sheets to write".into()));
        }

        let mut workbook = Workbook::new();
        for template in templates {
            let worksheet = workbook.add_worksheet();
            self.write_sheet(worksheet, &template.sheet)?;
        }

        workbook
            .save_to_buffer()
            .map_err(|e| RenderError::Format(format!("Failed to create Excel: {e}")))
    }

    /// Write the workbook to a file
    pub fn save(&self, templates: &[&LayoutTemplate], path: &Path) -> Result<(), RenderError> {
        let bytes = self.render_to_bytes(templates)?;
        std::fs::write(path, bytes)?;
        tracing::info!(path = %path.display(), sheets = templates.len(), "saved workbook");
        Ok(())
    }

    fn write_sheet(&self, worksheet: &mut Worksheet, sheet: &Sheet) -> Result<(), RenderError> {
        worksheet
            .set_name(&sheet.name)
            .map_err(|e| RenderError::Format(e.to_string()))?;

        let mut formats = FormatCache::new(self.font_for(sheet));

        for merged in sheet.merges() {
            let (value, style) = sheet
                .cells()
                .find(|(at, _)| *at == merged.first)
                .map(|(_, cell)| (cell.value.clone(), cell.style))
                .unwrap_or_default();
            let format = formats.get(style);
            let text = value.as_text().unwrap_or("");
            worksheet
                .merge_range(
                    merged.first.row - 1,
                    merged.first.col - 1,
                    merged.last.row - 1,
                    merged.last.col - 1,
                    text,
                    format,
                )
                .map_err(|e| RenderError::Format(e.to_string()))?;
            if !matches!(value, CellValue::Text(_) | CellValue::Empty) {
                write_value(worksheet, merged.first.row - 1, merged.first.col - 1, &value, format)?;
            }
        }

        for (at, cell) in sheet.cells() {
            if sheet.merge_at(at).is_some() || sheet.is_merge_interior(at) {
                continue;
            }
            let format = formats.get(cell.style);
            write_value(worksheet, at.row - 1, at.col - 1, &cell.value, format)?;
        }

        for (col, width) in sheet.column_widths() {
            worksheet.set_column_width(col - 1, width).ok();
        }

        Ok(())
    }

    fn font_for<'a>(&'a self, sheet: &'a Sheet) -> Option<(&'a str, f64)> {
        match sheet.font() {
            Some(font) => Some((font.name.as_str(), font.size)),
            None => self.default_font.as_deref().map(|name| (name, 11.0)),
        }
    }
}

fn write_value(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: &CellValue,
    format: &Format,
) -> Result<(), RenderError> {
    let result = match value {
        CellValue::Empty => worksheet.write_blank(row, col, format),
        CellValue::Text(text) => worksheet.write_string_with_format(row, col, text, format),
        CellValue::Number(n) => worksheet.write_number_with_format(row, col, *n, format),
        CellValue::Formula(formula) => {
            worksheet.write_formula_with_format(row, col, formula.as_str(), format)
        }
    };
    result
        .map(|_| ())
        .map_err(|e| RenderError::Format(e.to_string()))
}

/// One `Format` per distinct cell style of a sheet
struct FormatCache<'a> {
    font: Option<(&'a str, f64)>,
    formats: HashMap<Style, Format>,
}

impl<'a> FormatCache<'a> {
    fn new(font: Option<(&'a str, f64)>) -> Self {
        Self {
            font,
            formats: HashMap::new(),
        }
    }

    fn get(&mut self, style: Style) -> &Format {
        let font = self.font;
        self.formats
            .entry(style)
            .or_insert_with(|| create_format(style, font))
    }
}

fn create_format(style: Style, font: Option<(&str, f64)>) -> Format {
    let mut format = Format::new();
    if let Some((name, size)) = font {
        format = format.set_font_name(name).set_font_size(size);
    }
    if let Some(fill) = style.fill {
        format = format.set_background_color(fill.rgb());
    }
    if style.bold {
        format = format.set_bold();
    }
    if style.border {
        format = format.set_border(FormatBorder::Thin);
    }
    if style.centered {
        format = format
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter);
    }
    format
}
