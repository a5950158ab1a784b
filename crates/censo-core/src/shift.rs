//! Rotating duty shifts
//!
//! Guard teams rotate on a four-day cycle: ALFA, BRAVO, CHARLIE, DELTA. The cycle is
//! anchored at 2024-01-01, which was a CHARLIE day. The shift label appears in the
//! Control sheet header and in the report file name.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A duty shift
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Shift {
    Alfa,
    Bravo,
    Charlie,
    Delta,
}

impl Shift {
    /// Cycle order
    pub const ALL: [Shift; 4] = [Shift::Alfa, Shift::Bravo, Shift::Charlie, Shift::Delta];

    /// Anchor date of the cycle
    pub fn anchor() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).expect("2024-01-01 is a valid date")
    }

    /// Shift on duty at the given date
    pub fn on(date: NaiveDate) -> Self {
        let days = (date - Self::anchor()).num_days();
        // The anchor day is CHARLIE, index 2 of the cycle.
        let index = (days + 2).rem_euclid(4) as usize;
        Self::ALL[index]
    }

    /// Shift taking over the next day
    pub fn next(self) -> Self {
        let index = Self::ALL.iter().position(|s| *s == self).unwrap_or(0);
        Self::ALL[(index + 1) % 4]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Shift::Alfa => "ALFA",
            Shift::Bravo => "BRAVO",
            Shift::Charlie => "CHARLIE",
            Shift::Delta => "DELTA",
        }
    }
}

impl fmt::Display for Shift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Default report file name: `Contagem-<SHIFT>-<dd-mm-YYYY>.xlsx`
pub fn report_file_name(date: NaiveDate) -> String {
    format!("Contagem-{}-{}.xlsx", Shift::on(date), date.format("%d-%m-%Y"))
}

/// Date as printed in the Control sheet header
pub fn header_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}
