//! Report filling
//!
//! Applies each slot's rule to a built template. Per-cell and flat-sum slots get
//! literal numbers; every total is a live `SUM` formula so edits made by the
//! operator in the workbook propagate. The SEI sheet receives Control values by
//! value through the cross-sheet mapping, plus a single live reference back to the
//! Control sheet for the triage lines.

use crate::grid::{sum_formula, CellRef, CellValue};
use crate::layout::{LayoutTemplate, SheetKind, SlotKey, SlotRule};
use crate::mapping::CrossSheetMapping;
use censo_core::{
    Diagnostic, DiagnosticCode, DiagnosticEmitter, OccupancyCount, RenderError, WingRef,
};
use std::collections::HashSet;

/// Value of a rule that does not depend on another sheet
fn evaluate(rule: &SlotRule, counts: Option<&OccupancyCount>) -> Option<CellValue> {
    match rule {
        SlotRule::Count { block, wing, cell } => {
            counts.map(|c| CellValue::Number(f64::from(c.get(block, wing, cell))))
        }
        SlotRule::FlatSum(wings) => counts.map(|c| {
            let total: u32 = wings.iter().map(|w| c.wing_total(&w.block, &w.wing)).sum();
            CellValue::Number(f64::from(total))
        }),
        SlotRule::Sum(cells) if cells.is_empty() => Some(CellValue::Number(0.0)),
        SlotRule::Sum(cells) => Some(CellValue::Formula(sum_formula(None, cells))),
        SlotRule::SumRange(first, last) => Some(CellValue::Formula(format!("=SUM({first}:{last})"))),
        SlotRule::Reference(at) => Some(CellValue::Formula(format!("={at}"))),
        SlotRule::Manual | SlotRule::Mirror | SlotRule::CrossSheet { .. } => None,
    }
}

fn expect_kind(template: &LayoutTemplate, kind: SheetKind) -> Result<(), RenderError> {
    if template.kind == kind {
        Ok(())
    } else {
        Err(RenderError::InvalidData(format!(
            "sheet '{}' is not a {:?} template",
            template.sheet.name, kind
        )))
    }
}

/// Fill a Control template from occupancy counts.
///
/// Count keys without a slot (a wing missing from the layout, a virtual wing no
/// summary line sums) are reported as `W002` and left out of the sheet.
pub fn fill_control(
    template: &mut LayoutTemplate,
    counts: &OccupancyCount,
    emitter: &mut dyn DiagnosticEmitter,
) -> Result<(), RenderError> {
    expect_kind(template, SheetKind::Control)?;

    let writes: Vec<(CellRef, CellValue)> = template
        .slots()
        .filter_map(|(_, slot)| evaluate(&slot.rule, Some(counts)).map(|value| (slot.at, value)))
        .collect();
    for (at, value) in writes {
        template.sheet.set_value(at, value);
    }

    report_unplaced_counts(template, counts, emitter);
    template.filled = true;

    tracing::debug!(unit = %template.unit, total = counts.total(), "filled control sheet");
    Ok(())
}

fn report_unplaced_counts(
    template: &LayoutTemplate,
    counts: &OccupancyCount,
    emitter: &mut dyn DiagnosticEmitter,
) {
    let mut cells = HashSet::new();
    let mut wings = HashSet::new();
    for (_, slot) in template.slots() {
        match &slot.rule {
            SlotRule::Count { block, wing, cell } => {
                cells.insert((block.as_str(), wing.as_str(), cell.as_str()));
            }
            SlotRule::FlatSum(sources) => wings.extend(sources.iter().cloned()),
            _ => {}
        }
    }

    for (block, wing, cell, count) in counts.iter() {
        if cells.contains(&(block, wing, cell)) || wings.contains(&WingRef::new(block, wing)) {
            continue;
        }
        emitter.emit(
            Diagnostic::new(
                DiagnosticCode::W002TemplateDrift,
                format!("no Control slot for {block}/{wing}/{cell}"),
            )
            .with_unit(template.unit.as_str())
            .with_note(format!("{count} occupant(s) not shown in the sheet")),
        );
    }
}

/// Fill an SEI template from a filled Control template.
///
/// Mapping pairs whose Control side is not a slot are skipped. Pairs landing on an
/// SEI cell that is not a form quantity are reported as `W002`; Control cell slots
/// no pair mirrors are reported as `W003`. Drift never aborts the fill.
pub fn fill_sei(
    sei: &mut LayoutTemplate,
    control: &LayoutTemplate,
    mapping: &CrossSheetMapping,
    emitter: &mut dyn DiagnosticEmitter,
) -> Result<(), RenderError> {
    expect_kind(sei, SheetKind::Sei)?;
    expect_kind(control, SheetKind::Control)?;
    if !control.is_filled() {
        return Err(RenderError::InvalidData(format!(
            "sheet '{}' must be filled before '{}'",
            control.sheet.name, sei.sheet.name
        )));
    }

    let mut mirrored = HashSet::new();
    for pair in mapping.pairs() {
        if control.key_at(pair.control).is_none() {
            continue;
        }
        let writable = sei
            .key_at(pair.sei)
            .and_then(|key| sei.slot(key))
            .is_some_and(|slot| slot.rule == SlotRule::Mirror);
        if !writable {
            emitter.emit(
                Diagnostic::new(
                    DiagnosticCode::W002TemplateDrift,
                    format!("SEI cell {} is not a form quantity", pair.sei),
                )
                .with_unit(sei.unit.as_str())
                .with_note(format!("mapped from Control cell {}", pair.control)),
            );
            continue;
        }

        match control.sheet.value(pair.control) {
            CellValue::Formula(_) => emitter.emit(
                Diagnostic::new(
                    DiagnosticCode::W002TemplateDrift,
                    format!("Control cell {} holds a formula and cannot be copied", pair.control),
                )
                .with_unit(sei.unit.as_str()),
            ),
            value => {
                sei.sheet.set_value(pair.sei, value.clone());
                mirrored.insert(pair.control);
            }
        }
    }

    for (key, slot) in control.slots() {
        if matches!(key, SlotKey::Cell { .. } | SlotKey::Folded { .. }) && !mirrored.contains(&slot.at) {
            emitter.emit(
                Diagnostic::new(
                    DiagnosticCode::W003UnmirroredSlot,
                    format!("Control cell {} has no SEI counterpart", slot.at),
                )
                .with_unit(control.unit.as_str())
                .with_note(describe(key)),
            );
        }
    }

    let mut writes: Vec<(CellRef, CellValue)> = Vec::new();
    for (_, slot) in sei.slots() {
        if let SlotRule::CrossSheet { line_prefix } = &slot.rule {
            writes.push((slot.at, cross_sheet_value(control, line_prefix, emitter)));
        } else if let Some(value) = evaluate(&slot.rule, None) {
            writes.push((slot.at, value));
        }
    }
    for (at, value) in writes {
        sei.sheet.set_value(at, value);
    }
    sei.filled = true;

    tracing::debug!(unit = %sei.unit, mirrored = mirrored.len(), "filled SEI sheet");
    Ok(())
}

fn cross_sheet_value(
    control: &LayoutTemplate,
    prefix: &str,
    emitter: &mut dyn DiagnosticEmitter,
) -> CellValue {
    let prefix = prefix.to_lowercase();
    let mut lines: Vec<CellRef> = control
        .slots()
        .filter_map(|(key, slot)| match key {
            SlotKey::Line(label) if label.to_lowercase().starts_with(&prefix) => Some(slot.at),
            _ => None,
        })
        .collect();
    lines.sort();

    if lines.is_empty() {
        emitter.emit(
            Diagnostic::new(
                DiagnosticCode::W004FormDrift,
                format!("no Control line starts with '{prefix}'"),
            )
            .with_unit(control.unit.as_str())
            .with_hint("add the triage lines to a summary section of the topology"),
        );
        return CellValue::Number(0.0);
    }
    CellValue::Formula(sum_formula(Some(&control.sheet.name), &lines))
}

fn describe(key: &SlotKey) -> String {
    match key {
        SlotKey::Cell { block, wing, cell } => format!("cell {block}/{wing}/{cell}"),
        SlotKey::Folded { block, wing } => format!("folded wing {block}/{wing}"),
        other => format!("{other:?}"),
    }
}
