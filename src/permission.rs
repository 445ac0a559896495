//! Permission coordinator: state stream and the check-then-wait protocol

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::sync::broadcast;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::PermissionConfig;
use crate::error::{TrackerError, TrackerResult};
use crate::model::PermissionState;
use crate::transport::Transport;

/// Exposes the native permission state as a stream and drives the
/// request-then-wait acquisition protocol
pub struct PermissionCoordinator {
    transport: Arc<dyn Transport>,
    config: PermissionConfig,
}

impl PermissionCoordinator {
    pub fn new(transport: Arc<dyn Transport>, config: PermissionConfig) -> Self {
        Self { transport, config }
    }

    /// Stream of permission state changes.
    ///
    /// An unrecognized wire code is delivered as a decode error for that
    /// event, not swallowed.
    pub fn permission_state_stream(&self) -> PermissionStateStream {
        PermissionStateStream {
            rx: self.transport.subscribe_permission(),
        }
    }

    /// Acquire background location permission, waiting at most the
    /// configured timeout per state observation
    pub async fn request_permission(&self) -> TrackerResult<PermissionState> {
        self.request_permission_with_timeout(Duration::from_millis(self.config.request_timeout_ms))
            .await
    }

    /// Check-then-wait acquisition protocol:
    ///
    /// 1. Await the current state; if already granted, return it without
    ///    prompting the user.
    /// 2. Fire the native permission request (its direct result is not
    ///    authoritative).
    /// 3. Await two further states and return the second. The first may
    ///    be a replay of the pre-request state on some delivery
    ///    implementations.
    ///
    /// The subscription is opened before the request is fired, so no
    /// post-request state can be missed regardless of how the call and
    /// the stream interleave.
    pub async fn request_permission_with_timeout(
        &self,
        limit: Duration,
    ) -> TrackerResult<PermissionState> {
        let mut stream = self.permission_state_stream();

        let current = Self::next_state(&mut stream, limit).await?;
        if current == PermissionState::Granted {
            debug!("permission already granted, skipping native request");
            return Ok(current);
        }

        self.transport
            .invoke("requestPermission", json!([]))
            .await?;

        // Skip one: the first post-request state may predate the request
        let _ = Self::next_state(&mut stream, limit).await?;
        let resolved = Self::next_state(&mut stream, limit).await?;

        info!(state = ?resolved, "permission request resolved");
        Ok(resolved)
    }

    async fn next_state(
        stream: &mut PermissionStateStream,
        limit: Duration,
    ) -> TrackerResult<PermissionState> {
        match timeout(limit, stream.next()).await {
            Ok(Some(state)) => state,
            Ok(None) => Err(TrackerError::PermissionStreamClosed),
            Err(_) => Err(TrackerError::PermissionTimeout(limit)),
        }
    }
}

/// Broadcast-backed stream of decoded permission states
pub struct PermissionStateStream {
    rx: broadcast::Receiver<Value>,
}

impl PermissionStateStream {
    /// Next state, or `None` once the channel closes
    pub async fn next(&mut self) -> Option<TrackerResult<PermissionState>> {
        loop {
            match self.rx.recv().await {
                Ok(payload) => return Some(PermissionState::from_wire(&payload)),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "permission subscriber lagged, skipped events");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
