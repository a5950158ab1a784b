//! Captured record files
//!
//! The portal scraper hands over its capture as a JSON object keyed by unit code.
//! Each entry is either pre-split or carries the raw location text:
//!
//! ```json
//! {
//!   "PAMC": [
//!     { "wing": "12", "cell": "3", "code": "12345", "name": "JOSE DA SILVA" },
//!     { "location": "ALA: PRIS/DOM/1", "code": "67890", "name": "JOAO SOUZA" }
//!   ]
//! }
//! ```

use crate::{read, ConfigError};
use censo_core::{RawRecord, UnitCode};
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::Path;

/// Raw records per unit, in capture order
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecordSet {
    pub units: IndexMap<UnitCode, Vec<RawRecord>>,
}

impl RecordSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_unit(mut self, unit: impl Into<UnitCode>, records: Vec<RawRecord>) -> Self {
        self.units.insert(unit.into(), records);
        self
    }

    /// Records of one unit (empty when the unit was not captured)
    pub fn unit(&self, unit: &str) -> &[RawRecord] {
        self.units.get(unit).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn unit_codes(&self) -> impl Iterator<Item = &str> {
        self.units.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.units.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Deserialize)]
struct RecordEntry {
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    wing: Option<String>,
    #[serde(default)]
    cell: Option<String>,
    #[serde(default)]
    code: String,
    #[serde(default)]
    name: String,
}

impl RecordEntry {
    fn into_record(self, unit: &str, index: usize) -> Result<RawRecord, ConfigError> {
        if let Some(location) = self.location {
            return Ok(RawRecord::from_location(&location, self.code, self.name));
        }
        match self.wing {
            Some(wing) => Ok(RawRecord::new(
                wing.trim(),
                self.cell.unwrap_or_default().trim(),
                self.code,
                self.name,
            )),
            None => Err(ConfigError::InvalidRecord(format!(
                "unit {unit}, entry {index}: expected `location` or `wing`"
            ))),
        }
    }
}

/// Parse a record file from JSON
pub fn parse_records_json(input: &str) -> Result<RecordSet, ConfigError> {
    let raw: IndexMap<UnitCode, Vec<RecordEntry>> = serde_json::from_str(input)?;
    let mut set = RecordSet::new();
    for (unit, entries) in raw {
        let records = entries
            .into_iter()
            .enumerate()
            .map(|(index, entry)| entry.into_record(&unit, index))
            .collect::<Result<Vec<_>, _>>()?;
        set.units.insert(unit, records);
    }
    Ok(set)
}

/// Load a record file
pub fn load_records(path: &Path) -> Result<RecordSet, ConfigError> {
    parse_records_json(&read(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_mixed_entries() {
        let input = r#"{
            "PAMC": [
                { "wing": "12", "cell": "3", "code": "1", "name": "A" },
                { "location": "ALA: PRIS/DOM/1", "code": "2", "name": "B" }
            ],
            "CPBV": []
        }"#;
        let set = parse_records_json(input).unwrap();

        assert_eq!(set.unit_codes().collect::<Vec<_>>(), vec!["PAMC", "CPBV"]);
        assert_eq!(set.len(), 2);
        assert_eq!(set.unit("PAMC")[0], RawRecord::new("12", "3", "1", "A"));
        assert_eq!(set.unit("PAMC")[1].wing, "PRIS/DOM");
        assert_eq!(set.unit("PAMC")[1].cell, "1");
        assert!(set.unit("CPBV").is_empty());
        assert!(set.unit("UPRRO").is_empty());
    }

    #[test]
    fn entry_without_location_or_wing_fails() {
        let input = r#"{ "PAMC": [ { "code": "1", "name": "A" } ] }"#;
        let err = parse_records_json(input).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRecord(ref msg) if msg.contains("entry 0")));
    }

    #[test]
    fn load_records_from_file() {
        use std::io::Write;
        let mut temp_file = tempfile::NamedTempFile::with_suffix(".json").unwrap();
        writeln!(temp_file, r#"{{ "PAMC": [ {{ "wing": "01", "cell": "2" }} ] }}"#).unwrap();

        let set = load_records(temp_file.path()).unwrap();
        assert_eq!(set.unit("PAMC")[0].wing, "01");
        assert_eq!(set.unit("PAMC")[0].code, "");
    }
}
