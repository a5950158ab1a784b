//! Occupancy aggregation
//!
//! Counts are always per cell. Flat sums over a wing (triage lanes, external
//! custody categories, folded remission wings) are decided when the report is
//! filled, not here.

use censo_core::{ClassifiedRecord, OccupancyCount};

/// Group classified records by (block, wing, cell) and count each group.
///
/// The result depends only on the multiset of records: input order is irrelevant
/// and repeated records simply add up.
pub fn aggregate<'a, I>(records: I) -> OccupancyCount
where
    I: IntoIterator<Item = &'a ClassifiedRecord>,
{
    let counts: OccupancyCount = records.into_iter().collect();
    tracing::debug!(total = counts.total(), "aggregated occupancy");
    counts
}
