//! End-to-end report runs writing real workbooks

use censo_config::parse_topology_json;
use censo_core::{CollectingEmitter, DiagnosticCode, RawRecord, Topology};
use censo_render::{CensusReport, CellRef};
use chrono::NaiveDate;
use tempfile::tempdir;

const UNITS: &str = include_str!("../../../config/units.json");

fn topology() -> Topology {
    parse_topology_json(UNITS).unwrap()
}

fn records() -> Vec<RawRecord> {
    vec![
        RawRecord::new("12", "1", "100", "JOSE"),
        RawRecord::new("12", "2", "101", "JOAO"),
        RawRecord::from_location("ALA: PRIS/DOM/1", "102", "PEDRO"),
        RawRecord::from_location("ALA: TRIAGEM/3", "103", "PAULO"),
        RawRecord::new("99", "1", "104", "MARCOS"),
    ]
}

fn report() -> CensusReport {
    CensusReport::new(NaiveDate::from_ymd_opt(2024, 1, 3).unwrap())
}

#[test]
fn report_is_saved_under_shift_name() {
    let dir = tempdir().unwrap();
    let records = records();
    let mut emitter = CollectingEmitter::new();

    let book = report()
        .build(&topology(), [("PAMC", records.as_slice())], &mut emitter)
        .unwrap();
    let path = book.save(dir.path()).unwrap();

    assert_eq!(path.file_name().unwrap(), "Contagem-ALFA-03-01-2024.xlsx");
    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(&bytes[..2], b"PK");

    let names: Vec<&str> = book.sheets().iter().map(|t| t.sheet.name.as_str()).collect();
    assert_eq!(names, vec!["PAMC CONTROLE", "PAMC SEI"]);

    let summary = &book.units[0].summary;
    assert_eq!((summary.accepted, summary.rejected, summary.occupants), (4, 1, 4));
    assert_eq!(emitter.count(DiagnosticCode::W001UnresolvedRecord), 1);
    assert_eq!(emitter.count(DiagnosticCode::I001UnitSummary), 1);

    let control = &book.units[0].control;
    let externals = control.sheet.value(CellRef::parse("B27").unwrap());
    assert_eq!(externals.as_number(), Some(1.0));
}

#[test]
fn unknown_and_empty_units_are_skipped() {
    let records = records();
    let unresolved = vec![RawRecord::new("99", "1", "1", "X")];
    let mut emitter = CollectingEmitter::new();

    let book = report()
        .build(
            &topology(),
            [
                ("CPBV", records.as_slice()),
                ("PAMC", unresolved.as_slice()),
            ],
            &mut emitter,
        )
        .unwrap();

    assert!(book.is_empty());
    assert_eq!(emitter.count(DiagnosticCode::E001UnknownUnit), 1);
    assert_eq!(emitter.count(DiagnosticCode::W005EmptyUnit), 1);
    assert_eq!(emitter.count(DiagnosticCode::E003NoReportData), 1);
    assert!(book.render_to_bytes().is_err());
}

#[test]
fn unwritable_directory_is_an_io_error() {
    let records = records();
    let mut emitter = CollectingEmitter::new();
    let book = report()
        .build(&topology(), [("PAMC", records.as_slice())], &mut emitter)
        .unwrap();

    let err = book
        .save(std::path::Path::new("/nonexistent/censo/output"))
        .unwrap_err();
    assert!(matches!(err, censo_core::RenderError::Io(_)));
}
