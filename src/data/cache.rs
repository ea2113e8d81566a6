//! Process-lifetime cache of scraped rating records, one entry per name key.
//!
//! Stores `Arc<RatingRecord>` so hits hand out the stored record without
//! copying it. Entries are never evicted or refreshed.

use crate::data::names::NameKey;
use crate::data::rating::RatingRecord;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

#[derive(Clone, Default)]
pub struct RatingCache {
    entries: Arc<DashMap<NameKey, Arc<RatingRecord>>>,
}

impl RatingCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &NameKey) -> Option<Arc<RatingRecord>> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    /// Store a record, replacing any previous entry for the same key.
    pub fn insert(&self, key: NameKey, record: RatingRecord) -> Arc<RatingRecord> {
        let record = Arc::new(record);
        debug!(name = %key, values = record.len(), "rating cached");
        self.entries.insert(key, record.clone());
        record
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
