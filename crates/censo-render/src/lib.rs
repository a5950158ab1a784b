//! # censo-render
//!
//! Report layouts and workbook output for censo.
//!
//! This crate provides:
//! - A 1-indexed sheet model ([`grid`])
//! - Control and SEI layout template builders ([`layout`])
//! - The hand-authored Control → SEI address table ([`mapping`])
//! - The report filler writing counts, totals and mirrored values ([`fill`])
//! - XLSX output through `rust_xlsxwriter` ([`excel`])
//! - Per-run orchestration ([`report`])
//!
//! ## Example
//!
//! ```rust,ignore
//! use censo_render::CensusReport;
//!
//! let report = CensusReport::new(date);
//! let book = report.build(&topology, [("PAMC", records.as_slice())], &mut emitter)?;
//! let path = book.save(Path::new("."))?;
//! ```

pub mod excel;
pub mod fill;
pub mod grid;
pub mod layout;
pub mod mapping;
pub mod report;

pub use excel::ExcelRenderer;
pub use fill::{fill_control, fill_sei};
pub use grid::{CellRef, CellValue, Fill, Sheet, Style};
pub use layout::{BuildOptions, LayoutTemplate, SeiForm, SeiRegion, SheetKind, SlotKey, SlotRule};
pub use mapping::CrossSheetMapping;
pub use report::{CensusReport, ReportBook, UnitReport, UnitSummary};
