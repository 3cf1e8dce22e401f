use crate::model::ArchivalRecord;
use std::collections::VecDeque;

/// How many completed moves stay on screen.
pub const HISTORY_CAPACITY: usize = 5;

/// The most recent completed moves, oldest first. Older records are dropped for good.
#[derive(Debug, Clone, Default)]
pub struct RecentHistory {
    records: VecDeque<ArchivalRecord>,
}

impl RecentHistory {
    pub fn push(&mut self, record: ArchivalRecord) {
        if self.records.len() == HISTORY_CAPACITY {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ArchivalRecord> {
        self.records.iter()
    }
}
