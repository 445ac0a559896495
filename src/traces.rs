//! Read/count/mark-read facade over the persisted trace store

use std::sync::Arc;

use serde_json::json;
use tracing::debug;

use crate::error::{TrackerError, TrackerResult};
use crate::model::LocationTrace;
use crate::transport::Transport;

/// Narrow facade over the native trace store.
///
/// The store itself is opaque; every operation is one transport call and
/// traces come back in store order, never reordered client-side.
pub struct TraceRepository {
    transport: Arc<dyn Transport>,
}

impl TraceRepository {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// All persisted traces
    pub async fn all_traces(&self) -> TrackerResult<Vec<LocationTrace>> {
        self.fetch("getLocationTraces").await
    }

    /// Traces not yet marked as read
    pub async fn unread_traces(&self) -> TrackerResult<Vec<LocationTrace>> {
        self.fetch("getUnreadLocationTraces").await
    }

    /// Total number of persisted traces
    pub async fn trace_count(&self) -> TrackerResult<i64> {
        self.count("getLocationTracesCount").await
    }

    /// Number of traces not yet marked as read
    pub async fn unread_trace_count(&self) -> TrackerResult<i64> {
        self.count("getUnreadLocationTracesCount").await
    }

    /// Path of the backing store, for external tooling; opaque
    pub async fn storage_path(&self) -> TrackerResult<String> {
        let payload = self
            .transport
            .invoke("getSqliteDatabasePath", json!([]))
            .await?;
        payload
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| TrackerError::Decode(format!("storage path is not a string: {payload}")))
    }

    /// Mark the given trace ids as read, in one batch request.
    ///
    /// Marking an already-read or nonexistent id is the store's problem
    /// and never fails the batch.
    pub async fn mark_as_read(&self, ids: &[i64]) -> TrackerResult<()> {
        debug!(count = ids.len(), "marking traces as read");
        self.transport.invoke("markAsRead", json!([ids])).await?;
        Ok(())
    }

    async fn fetch(&self, request: &str) -> TrackerResult<Vec<LocationTrace>> {
        let payload = self.transport.invoke(request, json!([])).await?;
        let rows = payload.as_array().ok_or_else(|| {
            TrackerError::Decode(format!("`{request}` did not return a sequence"))
        })?;
        rows.iter().map(LocationTrace::from_wire).collect()
    }

    async fn count(&self, request: &str) -> TrackerResult<i64> {
        let payload = self.transport.invoke(request, json!([])).await?;
        payload
            .as_i64()
            .or_else(|| payload.as_f64().map(|raw| raw as i64))
            .ok_or_else(|| {
                TrackerError::Decode(format!("`{request}` did not return a count: {payload}"))
            })
    }
}
