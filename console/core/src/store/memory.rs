//! In-Memory Store
//!
//! Keeps call records in process. Used for `--offline` runs and tests;
//! nothing survives a restart.

use async_trait::async_trait;
use parking_lot::Mutex;

use super::traits::CallStore;
use crate::call::{CallDirection, CallRecord, NewCallRecord, RecordId};
use crate::error::StoreError;

/// Call records held in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Vec<CallRecord>>,
}

impl MemoryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-filled with `records`
    #[must_use]
    pub fn with_records(records: Vec<CallRecord>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }

    /// Copy of every stored record, in insertion order
    #[must_use]
    pub fn snapshot(&self) -> Vec<CallRecord> {
        self.records.lock().clone()
    }

    /// Number of stored records
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Whether the store is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

#[async_trait]
impl CallStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn health_check(&self) -> bool {
        true
    }

    async fn insert(&self, record: NewCallRecord) -> Result<CallRecord, StoreError> {
        let stored = record.into_record(RecordId::new(uuid::Uuid::new_v4().to_string()));
        self.records.lock().push(stored.clone());
        Ok(stored)
    }

    async fn update_duration(&self, id: &RecordId, duration: &str) -> Result<(), StoreError> {
        let mut records = self.records.lock();
        let record = records
            .iter_mut()
            .find(|r| &r.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        record.duration = duration.to_string();
        Ok(())
    }

    async fn latest_for_number(
        &self,
        phone_number: &str,
        directions: &[CallDirection],
    ) -> Result<Option<CallRecord>, StoreError> {
        let records = self.records.lock();
        // Later inserts win ties on start_time
        let latest = records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.phone_number == phone_number && directions.contains(&r.direction))
            .max_by_key(|(i, r)| (r.start_time, *i))
            .map(|(_, r)| r.clone());
        Ok(latest)
    }

    async fn recent(&self, limit: usize) -> Result<Vec<CallRecord>, StoreError> {
        let mut records = self.records.lock().clone();
        records.reverse();
        // Stable sort keeps newest-inserted first among equal start times
        records.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        records.truncate(limit);
        Ok(records)
    }
}
