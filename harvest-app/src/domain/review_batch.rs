use super::{DedupKey, DedupStrategy, ReviewRecord};
use std::collections::HashSet;

/// Ordered, duplicate-free accumulator for one crawl.
///
/// Insertion order is encounter order and is the record's ordinal in the
/// final output.
#[derive(Debug, Default)]
pub struct ReviewBatch {
    strategy: DedupStrategy,
    records: Vec<ReviewRecord>,
    seen: HashSet<DedupKey>,
}

impl ReviewBatch {
    pub fn new(strategy: DedupStrategy) -> Self {
        Self {
            strategy,
            records: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// Appends the record if it is usable and unseen. Returns whether it was
    /// appended.
    pub fn offer(&mut self, record: ReviewRecord) -> bool {
        if !record.is_usable() {
            return false;
        }

        let key = DedupKey::for_record(&record, self.strategy);
        if !self.seen.insert(key) {
            return false;
        }

        self.records.push(record);
        true
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[ReviewRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<ReviewRecord> {
        self.records
    }
}
