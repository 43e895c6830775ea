//! Distance ranking.

use std::cmp::Ordering;

use crate::types::location::PoiRecord;

/// Orders candidates nearest first.
#[derive(Debug, Default, Clone, Copy)]
pub struct DistanceRanker;

impl DistanceRanker {
    /// Sort ascending by `distance_km`, ties broken by `source_key`.
    ///
    /// Total and idempotent: ranking an already-ranked list is a no-op.
    pub fn rank(&self, mut records: Vec<PoiRecord>) -> Vec<PoiRecord> {
        records.sort_by(compare);
        records
    }
}

fn compare(a: &PoiRecord, b: &PoiRecord) -> Ordering {
    a.distance_km
        .total_cmp(&b.distance_km)
        .then_with(|| a.source_key.cmp(&b.source_key))
}
