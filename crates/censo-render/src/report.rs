//! Census report orchestration
//!
//! Runs the whole pipeline per unit (classify, aggregate, build both layouts, fill
//! Control, mirror into SEI) and collects the filled sheets into a [`ReportBook`]
//! ready to be written.

use crate::excel::ExcelRenderer;
use crate::fill::{fill_control, fill_sei};
use crate::layout::{control, sei, LayoutTemplate, SeiForm};
use crate::mapping::CrossSheetMapping;
use censo_core::shift::report_file_name;
use censo_core::{
    Diagnostic, DiagnosticCode, DiagnosticEmitter, RawRecord, RenderError, Shift, Topology,
};
use censo_engine::{aggregate, classify_all};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

/// Report configuration
#[derive(Clone, Debug)]
pub struct CensusReport {
    pub date: NaiveDate,
    pub form: SeiForm,
    pub mapping: CrossSheetMapping,
    pub renderer: ExcelRenderer,
}

impl CensusReport {
    /// Report for the given date with the standard SEI form
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            form: SeiForm::standard(),
            mapping: CrossSheetMapping::standard(),
            renderer: ExcelRenderer::new(),
        }
    }

    pub fn form(mut self, form: SeiForm) -> Self {
        self.form = form;
        self
    }

    pub fn mapping(mut self, mapping: CrossSheetMapping) -> Self {
        self.mapping = mapping;
        self
    }

    pub fn renderer(mut self, renderer: ExcelRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    /// Run the pipeline for every `(unit, records)` pair, in order.
    ///
    /// Unconfigured units (`E001`) and units without any classified record (`W005`)
    /// are skipped; when nothing is left `E003` is emitted and the book is empty.
    pub fn build<'r, I>(
        &self,
        topology: &Topology,
        units: I,
        emitter: &mut dyn DiagnosticEmitter,
    ) -> Result<ReportBook, RenderError>
    where
        I: IntoIterator<Item = (&'r str, &'r [RawRecord])>,
    {
        let mut book = ReportBook {
            date: self.date,
            renderer: self.renderer.clone(),
            units: Vec::new(),
        };

        for (unit_code, records) in units {
            let unit = match topology.unit(unit_code) {
                Ok(unit) => unit,
                Err(e) => {
                    emitter.emit(
                        Diagnostic::new(DiagnosticCode::E001UnknownUnit, e.to_string())
                            .with_unit(unit_code)
                            .with_hint("add the unit to the topology document or drop it from the run"),
                    );
                    continue;
                }
            };

            let classification = classify_all(unit_code, unit, records, emitter);
            if classification.records.is_empty() {
                emitter.emit(
                    Diagnostic::new(
                        DiagnosticCode::W005EmptyUnit,
                        format!("no record of {unit_code} matched the topology; unit skipped"),
                    )
                    .with_unit(unit_code)
                    .with_note(format!("{} record(s) read", records.len())),
                );
                continue;
            }

            let counts = aggregate(&classification.records);
            let mut control_sheet = control::build(unit_code, unit, self.date, emitter);
            let mut sei_sheet = sei::build(unit_code, unit, &self.form, emitter);
            fill_control(&mut control_sheet, &counts, emitter)?;
            fill_sei(&mut sei_sheet, &control_sheet, &self.mapping, emitter)?;

            let summary = UnitSummary {
                unit: unit_code.to_string(),
                records: records.len(),
                accepted: classification.accepted(),
                rejected: classification.rejected,
                occupants: counts.total(),
            };
            emitter.emit(
                Diagnostic::new(DiagnosticCode::I001UnitSummary, summary.to_string())
                    .with_unit(unit_code),
            );
            tracing::debug!(unit = unit_code, occupants = summary.occupants, "unit done");

            book.units.push(UnitReport {
                summary,
                control: control_sheet,
                sei: sei_sheet,
            });
        }

        if book.units.is_empty() {
            emitter.emit(
                Diagnostic::new(DiagnosticCode::E003NoReportData, "no unit produced report data")
                    .with_hint("check the unit codes and the record file"),
            );
        }

        Ok(book)
    }
}

/// Per-unit counters
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnitSummary {
    pub unit: String,
    pub records: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub occupants: u32,
}

impl std::fmt::Display for UnitSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} record(s), {} counted, {} dropped",
            self.unit, self.records, self.accepted, self.rejected
        )
    }
}

/// Filled sheets of one unit
#[derive(Clone, Debug)]
pub struct UnitReport {
    pub summary: UnitSummary,
    pub control: LayoutTemplate,
    pub sei: LayoutTemplate,
}

/// Filled sheets of every processed unit
#[derive(Clone, Debug)]
pub struct ReportBook {
    pub date: NaiveDate,
    renderer: ExcelRenderer,
    pub units: Vec<UnitReport>,
}

impl ReportBook {
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn shift(&self) -> Shift {
        Shift::on(self.date)
    }

    /// Default workbook name for the report date
    pub fn file_name(&self) -> String {
        report_file_name(self.date)
    }

    /// Sheets in workbook order: each unit's Control sheet followed by its SEI sheet
    pub fn sheets(&self) -> Vec<&LayoutTemplate> {
        self.units
            .iter()
            .flat_map(|unit| [&unit.control, &unit.sei])
            .collect()
    }

    pub fn render_to_bytes(&self) -> Result<Vec<u8>, RenderError> {
        self.renderer.render_to_bytes(&self.sheets())
    }

    /// Write the workbook to an explicit path
    pub fn save_as(&self, path: &Path) -> Result<(), RenderError> {
        self.renderer.save(&self.sheets(), path)
    }

    /// Write the workbook under its default name into `dir`
    pub fn save(&self, dir: &Path) -> Result<PathBuf, RenderError> {
        let path = dir.join(self.file_name());
        self.save_as(&path)?;
        Ok(path)
    }
}
