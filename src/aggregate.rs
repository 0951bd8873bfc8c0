use std::collections::HashSet;

use tracing::debug;

use crate::parser::extract::{Extractor, DECISION, SEASON, SEASON_IN_TEXT};
use crate::record::{AggregatedRecord, DetailRecord, RowMetadata};

/// Combine listing metadata with its detail record. Detail values win; listing
/// values fill whatever the detail page did not carry.
pub fn merge(meta: RowMetadata, detail: DetailRecord) -> AggregatedRecord {
    let decision = detail
        .decision
        .or_else(|| meta.decision.as_deref().and_then(|d| DECISION.extract(d)));
    let season = detail
        .season
        .or_else(|| meta.season.as_deref().and_then(|s| SEASON.extract(s)))
        .or_else(|| SEASON_IN_TEXT.extract(&meta.row_text));

    AggregatedRecord {
        key: meta.key,
        detail_url: meta.detail_url,
        institution: detail.institution.or(meta.institution),
        program: detail.program.or(meta.program),
        degree_type: detail.degree_type,
        origin: detail.origin,
        decision,
        season,
        added_on: meta.added_on,
        notification_date: detail.notification_date,
        notification_method: detail.notification_method,
        gre_total: detail.gre_total,
        gre_verbal: detail.gre_verbal,
        gre_aw: detail.gre_aw,
        gpa: detail.gpa,
        notes: detail.notes,
    }
}

/// Ordered, key-deduplicated record store. The first record seen for a key wins.
#[derive(Debug, Default)]
pub struct Aggregator {
    seen: HashSet<String>,
    records: Vec<AggregatedRecord>,
    duplicates: usize,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when the key was already accepted.
    pub fn accept(&mut self, record: AggregatedRecord) -> bool {
        if !self.seen.insert(record.key.clone()) {
            self.duplicates += 1;
            debug!(key = %record.key, "duplicate entry skipped");
            return false;
        }
        self.records.push(record);
        true
    }

    pub fn extend<I>(&mut self, records: I) -> usize
    where
        I: IntoIterator<Item = AggregatedRecord>,
    {
        let mut added = 0;
        for record in records {
            if self.accept(record) {
                added += 1;
            }
        }
        added
    }

    pub fn records(&self) -> &[AggregatedRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    pub fn into_records(self) -> Vec<AggregatedRecord> {
        self.records
    }
}
