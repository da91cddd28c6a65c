//! Call Store Trait
//!
//! The query surface the console needs from a record store: insert a
//! record, back-fill a duration, find the latest record for a number, and
//! list recent records.

use async_trait::async_trait;

use crate::call::{CallDirection, CallRecord, NewCallRecord, RecordId};
use crate::error::StoreError;

/// Record store backing the call history
///
/// Implement this trait to keep call records somewhere else.
#[async_trait]
pub trait CallStore: Send + Sync {
    /// Store name for logs (e.g., "rest", "memory")
    fn name(&self) -> &str;

    /// Check if the store is reachable
    async fn health_check(&self) -> bool;

    /// Insert a record and return it with its assigned id
    async fn insert(&self, record: NewCallRecord) -> Result<CallRecord, StoreError>;

    /// Set the duration of an existing record
    async fn update_duration(&self, id: &RecordId, duration: &str) -> Result<(), StoreError>;

    /// Most recent record for `phone_number` whose direction is in `directions`
    async fn latest_for_number(
        &self,
        phone_number: &str,
        directions: &[CallDirection],
    ) -> Result<Option<CallRecord>, StoreError>;

    /// Up to `limit` records, newest first
    async fn recent(&self, limit: usize) -> Result<Vec<CallRecord>, StoreError>;
}

#[async_trait]
impl<T: CallStore + ?Sized> CallStore for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn health_check(&self) -> bool {
        (**self).health_check().await
    }

    async fn insert(&self, record: NewCallRecord) -> Result<CallRecord, StoreError> {
        (**self).insert(record).await
    }

    async fn update_duration(&self, id: &RecordId, duration: &str) -> Result<(), StoreError> {
        (**self).update_duration(id, duration).await
    }

    async fn latest_for_number(
        &self,
        phone_number: &str,
        directions: &[CallDirection],
    ) -> Result<Option<CallRecord>, StoreError> {
        (**self).latest_for_number(phone_number, directions).await
    }

    async fn recent(&self, limit: usize) -> Result<Vec<CallRecord>, StoreError> {
        (**self).recent(limit).await
    }
}
