//! Record classification against a loaded topology

use censo_config::parse_topology_json;
use censo_core::{CollectingEmitter, DiagnosticCode, RawRecord, Topology};
use censo_engine::{aggregate, classify, classify_all};
use pretty_assertions::assert_eq;

fn topology() -> Topology {
    parse_topology_json(
        r#"{
        "PAMC": {
            "blocks": {
                "A": {
                    "alas": {
                        "12": { "name": "ALA 12", "celas": ["1", "2", "3"] },
                        "SHARED": { "name": "SHARED", "celas": ["1"] }
                    }
                },
                "B": {
                    "alas": {
                        "01": { "name": "ALA 01", "celas": ["1", "2"] },
                        "SHARED": { "name": "SHARED", "celas": ["1", "2"] }
                    }
                },
                "Carceragem": {
                    "kind": "virtual",
                    "alas": { "TRIAGEM": { "name": "TRIAGEM", "celas": [] } }
                }
            }
        }
    }"#,
    )
    .unwrap()
}

#[test]
fn first_block_declaring_the_wing_wins() {
    let topology = topology();
    let unit = topology.unit("PAMC").unwrap();

    let record = classify(unit, "SHARED", "1", "1", "X").unwrap();
    assert_eq!(record.block, "A");
}

#[test]
fn no_fall_through_to_later_blocks() {
    let topology = topology();
    let unit = topology.unit("PAMC").unwrap();

    // Cell 2 is listed under B/SHARED, but A declares the wing first.
    assert!(classify(unit, "SHARED", "2", "1", "X").is_none());
}

#[test]
fn unknown_wing_is_dropped_and_counted() {
    let topology = topology();
    let unit = topology.unit("PAMC").unwrap();
    let records = vec![
        RawRecord::new("12", "1", "1", "A"),
        RawRecord::new("99", "1", "2", "B"),
    ];

    let mut emitter = CollectingEmitter::new();
    let classification = classify_all("PAMC", unit, &records, &mut emitter);
    assert_eq!(classification.rejected, 1);
    assert_eq!(emitter.count(DiagnosticCode::W001UnresolvedRecord), 1);
    assert!(emitter.diagnostics[0].hints[0].contains("not configured"));

    let counts = aggregate(&classification.records);
    assert!(counts.blocks().values().all(|wings| !wings.contains_key("99")));
    assert_eq!(counts.total(), 1);
}

#[test]
fn location_text_records_resolve() {
    let topology = topology();
    let unit = topology.unit("PAMC").unwrap();
    let records = vec![
        RawRecord::from_location("ALA: 12/3", "1", "A"),
        RawRecord::from_location("ALA: TRIAGEM/7", "2", "B"),
    ];

    let mut emitter = CollectingEmitter::new();
    let classification = classify_all("PAMC", unit, &records, &mut emitter);
    assert_eq!(classification.rejected, 0);
    assert!(emitter.diagnostics.is_empty());

    let blocks: Vec<&str> = classification
        .records
        .iter()
        .map(|r| r.block.as_str())
        .collect();
    assert_eq!(blocks, vec!["A", "Carceragem"]);
}
