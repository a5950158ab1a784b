//! Mirroring the Control sheet into the SEI form

use censo_config::parse_topology_json;
use censo_core::{CollectingEmitter, DiagnosticCode, OccupancyCount, RenderError, Topology};
use censo_render::layout::{control, sei};
use censo_render::{fill_control, fill_sei, CellRef, CrossSheetMapping, LayoutTemplate, SeiForm};
use chrono::NaiveDate;
use pretty_assertions::assert_eq;

const UNITS: &str = include_str!("../../../config/units.json");

fn at(address: &str) -> CellRef {
    CellRef::parse(address).unwrap()
}

fn counts() -> OccupancyCount {
    let mut counts = OccupancyCount::new();
    for (block, wing, cell, n) in [
        ("A", "12", "1", 3),
        ("A", "16", "8", 2),
        ("B", "01", "6", 4),
        ("B", "07", "8", 1),
        ("B", "REMIÇÃO01", "1", 2),
        ("Carceragem", "TRIAGEM", "1", 5),
    ] {
        for _ in 0..n {
            counts.add(block, wing, cell);
        }
    }
    counts
}

fn templates(emitter: &mut CollectingEmitter) -> (LayoutTemplate, LayoutTemplate) {
    let topology: Topology = parse_topology_json(UNITS).unwrap();
    let unit = topology.unit("PAMC").unwrap();
    let date = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
    (
        control::build("PAMC", unit, date, emitter),
        sei::build("PAMC", unit, &SeiForm::standard(), emitter),
    )
}

fn filled(mapping: &CrossSheetMapping) -> (LayoutTemplate, LayoutTemplate, CollectingEmitter) {
    let mut emitter = CollectingEmitter::new();
    let (mut control_sheet, mut sei_sheet) = templates(&mut emitter);
    fill_control(&mut control_sheet, &counts(), &mut emitter).unwrap();
    fill_sei(&mut sei_sheet, &control_sheet, mapping, &mut emitter).unwrap();
    (control_sheet, sei_sheet, emitter)
}

#[test]
fn mirrored_values_equal_control_values() {
    let mapping = CrossSheetMapping::standard();
    let (control_sheet, sei_sheet, emitter) = filled(&mapping);
    assert!(emitter.diagnostics.is_empty(), "{:?}", emitter.diagnostics);

    for pair in mapping.pairs() {
        if control_sheet.key_at(pair.control).is_some() {
            assert_eq!(
                sei_sheet.sheet.value(pair.sei),
                control_sheet.sheet.value(pair.control),
                "{} <- {}",
                pair.sei,
                pair.control
            );
        }
    }

    assert_eq!(sei_sheet.sheet.value(at("B6")).as_number(), Some(3.0));
    assert_eq!(sei_sheet.sheet.value(at("J13")).as_number(), Some(2.0));
    assert_eq!(sei_sheet.sheet.value(at("B47")).as_number(), Some(4.0));
    assert_eq!(sei_sheet.sheet.value(at("B50")).as_number(), Some(2.0));
    assert_eq!(sei_sheet.sheet.value(at("N49")).as_number(), Some(1.0));
    // Form rows below a wing's last cell stay blank.
    assert!(sei_sheet.sheet.value(at("B48")).is_empty());
}

#[test]
fn totals_and_cross_sheet_reference() {
    let (_, sei_sheet, _) = filled(&CrossSheetMapping::standard());
    let formula = |address: &str| sei_sheet.sheet.value(at(address)).as_formula().map(str::to_string);

    assert_eq!(formula("B34").as_deref(), Some("=SUM(B6:B33)"));
    assert_eq!(formula("J34").as_deref(), Some("=SUM(J6:J33)"));
    assert_eq!(formula("B35").as_deref(), Some("=SUM(B34:J34)"));
    assert_eq!(formula("N66").as_deref(), Some("=SUM(N42:N65)"));
    assert_eq!(formula("B67").as_deref(), Some("=SUM(B66:N66)"));
    assert_eq!(formula("B68").as_deref(), Some("=SUM('PAMC CONTROLE'!B19:B21)"));
    assert_eq!(formula("B69").as_deref(), Some("=SUM(B35,B67:B68)"));
    assert_eq!(sei_sheet.sheet.value(at("A35")).as_text(), Some("TOTAL A"));
}

#[test]
fn sei_requires_filled_control() {
    let mut emitter = CollectingEmitter::new();
    let (control_sheet, mut sei_sheet) = templates(&mut emitter);
    let err = fill_sei(
        &mut sei_sheet,
        &control_sheet,
        &CrossSheetMapping::standard(),
        &mut emitter,
    )
    .unwrap_err();
    assert!(matches!(err, RenderError::InvalidData(_)));
    assert!(!sei_sheet.is_filled());
}

#[test]
fn unmirrored_control_slot_is_reported() {
    // Drop the Bloco B band: every B cell and folded slot loses its counterpart.
    let mapping = CrossSheetMapping::new().band(5, 32, 6, &[(4, 2), (6, 4), (8, 6), (10, 8), (12, 10)]);
    let (_, _, emitter) = filled(&mapping);

    // 6 + 6 * 8 cells in wings 01..07 plus the two folded slots.
    assert_eq!(emitter.count(DiagnosticCode::W003UnmirroredSlot), 56);
}

#[test]
fn pair_onto_label_cell_is_template_drift() {
    let mapping = CrossSheetMapping::standard().band(5, 5, 6, &[(4, 1)]);
    let (_, sei_sheet, emitter) = filled(&mapping);

    assert_eq!(emitter.count(DiagnosticCode::W002TemplateDrift), 1);
    assert_eq!(sei_sheet.sheet.value(at("A6")).as_text(), Some("1"));
}
