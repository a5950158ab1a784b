//! Record classification
//!
//! A raw (wing, cell) pair resolves against the unit topology by walking blocks in
//! document order. The first block declaring the wing decides: an open wing admits
//! any cell, otherwise the cell must be listed. A cell rejected by that block is not
//! retried against later blocks declaring the same wing.

use std::collections::BTreeMap;

use censo_core::{
    ClassifiedRecord, Diagnostic, DiagnosticCode, DiagnosticEmitter, RawRecord, UnitTopology,
};

/// Resolve one record against a unit topology.
///
/// Returns `None` when no block declares the wing, or when the first block that
/// does has a cell list not containing `cell`.
pub fn classify(
    unit: &UnitTopology,
    wing: &str,
    cell: &str,
    code: &str,
    name: &str,
) -> Option<ClassifiedRecord> {
    let (block_code, block) = unit
        .blocks
        .iter()
        .find(|(_, block)| block.wings.contains_key(wing))?;
    let configured = block.wings.get(wing)?;

    configured.accepts(cell).then(|| ClassifiedRecord {
        block: block_code.clone(),
        wing: wing.to_string(),
        cell: cell.to_string(),
        code: code.to_string(),
        name: name.to_string(),
    })
}

/// Outcome of classifying a batch of records
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Classification {
    /// Records that resolved, in input order
    pub records: Vec<ClassifiedRecord>,
    /// Number of records dropped as unresolvable
    pub rejected: usize,
}

impl Classification {
    pub fn accepted(&self) -> usize {
        self.records.len()
    }
}

/// Classify a batch of records for one unit.
///
/// Unresolvable records are dropped and counted; one `W001` warning is emitted per
/// distinct (wing, cell) pair, carrying the number of records it covered.
pub fn classify_all(
    unit_code: &str,
    unit: &UnitTopology,
    records: &[RawRecord],
    emitter: &mut dyn DiagnosticEmitter,
) -> Classification {
    let mut classification = Classification::default();
    let mut unresolved: BTreeMap<(&str, &str), usize> = BTreeMap::new();

    for record in records {
        match classify(unit, &record.wing, &record.cell, &record.code, &record.name) {
            Some(classified) => classification.records.push(classified),
            None => {
                classification.rejected += 1;
                *unresolved
                    .entry((record.wing.as_str(), record.cell.as_str()))
                    .or_default() += 1;
            }
        }
    }

    for ((wing, cell), count) in unresolved {
        let known_wing = unit.blocks.values().any(|b| b.wings.contains_key(wing));
        let mut diagnostic = Diagnostic::new(
            DiagnosticCode::W001UnresolvedRecord,
            format!("location '{wing}/{cell}' does not match the topology"),
        )
        .with_unit(unit_code)
        .with_note(format!("{count} record(s) dropped"));
        diagnostic = if known_wing {
            diagnostic.with_hint(format!("add cell '{cell}' to wing '{wing}' if it is a real cell"))
        } else {
            diagnostic.with_hint(format!("wing '{wing}' is not configured for this unit"))
        };
        emitter.emit(diagnostic);
    }

    tracing::debug!(
        unit = unit_code,
        accepted = classification.accepted(),
        rejected = classification.rejected,
        "classified records"
    );

    classification
}

#[cfg(test)]
mod tests {
    use super::*;
    use censo_core::{Block, CollectingEmitter, Wing};

    fn unit() -> UnitTopology {
        UnitTopology::new()
            .block(
                "A",
                Block::new().wing("12", Wing::new("ALA 12").cells(["1", "2", "3"])),
            )
            .block(
                "Carceragem",
                Block::new().virtual_block().wing("TRIAGEM", Wing::new("TRIAGEM")),
            )
    }

    #[test]
    fn listed_cell_resolves() {
        let record = classify(&unit(), "12", "2", "100", "JOSE").unwrap();
        assert_eq!(record.block, "A");
        assert_eq!(record.wing, "12");
        assert_eq!(record.cell, "2");
        assert_eq!(record.code, "100");
        assert_eq!(record.name, "JOSE");
    }

    #[test]
    fn unlisted_cell_is_rejected() {
        assert!(classify(&unit(), "12", "9", "100", "JOSE").is_none());
    }

    #[test]
    fn open_wing_accepts_any_cell() {
        let record = classify(&unit(), "TRIAGEM", "17", "100", "JOSE").unwrap();
        assert_eq!(record.block, "Carceragem");
    }

    #[test]
    fn unknown_wing_is_rejected() {
        assert!(classify(&unit(), "99", "1", "100", "JOSE").is_none());
    }

    #[test]
    fn classify_is_pure() {
        let unit = unit();
        let first = classify(&unit, "12", "1", "100", "JOSE");
        let second = classify(&unit, "12", "1", "100", "JOSE");
        assert_eq!(first, second);
    }

    #[test]
    fn batch_counts_rejections_and_groups_warnings() {
        let records = vec![
            RawRecord::new("12", "1", "1", "A"),
            RawRecord::new("99", "1", "2", "B"),
            RawRecord::new("99", "1", "3", "C"),
            RawRecord::new("12", "7", "4", "D"),
        ];
        let mut emitter = CollectingEmitter::new();
        let classification = classify_all("PAMC", &unit(), &records, &mut emitter);

        assert_eq!(classification.accepted(), 1);
        assert_eq!(classification.rejected, 3);

        let warnings = emitter.with_code(DiagnosticCode::W001UnresolvedRecord);
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].message.contains("12/7"));
        assert!(warnings[1].message.contains("99/1"));
        assert_eq!(warnings[1].notes, vec!["2 record(s) dropped".to_string()]);
        assert_eq!(warnings[1].unit.as_deref(), Some("PAMC"));
    }
}
