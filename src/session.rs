//! Session controller: owns the active strategy and the tracking stream

use std::sync::Arc;

use serde_json::{json, Value};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use crate::error::{TrackerError, TrackerResult};
use crate::strategy::Strategy;
use crate::transport::Transport;

/// Controls the single native tracking session.
///
/// There is exactly one active tracking session per native side; this
/// controller remembers the last *attempted* strategy so a later stop can
/// revert the same mode with the same parameters.
pub struct SessionController {
    transport: Arc<dyn Transport>,

    /// Last strategy handed to the native side, including rejected
    /// attempts. Mutation is serialized by the mutex.
    last_invoked: Mutex<Option<Strategy>>,
}

impl SessionController {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            last_invoked: Mutex::new(None),
        }
    }

    /// Invoke a strategy and record it as last-attempted.
    ///
    /// The strategy is recorded whenever the call itself succeeds, even
    /// when the native side rejects it with `false`: a subsequent stop
    /// must target whatever was last attempted. A transport error
    /// propagates and records nothing.
    pub async fn start_tracking(&self, strategy: Strategy) -> TrackerResult<bool> {
        let mut last = self.last_invoked.lock().await;
        let accepted = strategy.invoke(self.transport.as_ref()).await?;
        *last = Some(strategy);

        info!(
            request = strategy.request_name(),
            accepted, "tracking start requested"
        );
        Ok(accepted)
    }

    /// Request that tracking stop.
    ///
    /// Reverts the last-attempted strategy, or sends the generic revert
    /// when none was attempted in this process lifetime (tracking may
    /// survive a previous process run). Always returns `true`: the
    /// contract is "stop was requested", and the true state is observed
    /// on the tracking stream.
    pub async fn stop_tracking(&self) -> bool {
        let last = *self.last_invoked.lock().await;
        let outcome = match last {
            Some(strategy) => {
                debug!(request = strategy.stop_request_name(), "reverting strategy");
                strategy.revert(self.transport.as_ref()).await
            }
            None => {
                debug!("no strategy attempted in this process, reverting generically");
                self.transport
                    .invoke("revertActiveStrategy", json!([]))
                    .await
                    .map(|_| ())
            }
        };

        if let Err(err) = outcome {
            warn!(%err, "stop request rejected by transport");
        }
        true
    }

    /// Stream of tracking-active transitions.
    ///
    /// Multi-subscriber; late subscribers see only future transitions.
    pub fn tracking_state_stream(&self) -> TrackingStateStream {
        TrackingStateStream {
            rx: self.transport.subscribe_tracking(),
        }
    }
}

/// Broadcast-backed stream of tracking-active transitions
pub struct TrackingStateStream {
    rx: broadcast::Receiver<Value>,
}

impl TrackingStateStream {
    /// Next transition, or `None` once the channel closes.
    ///
    /// A malformed payload is delivered as a decode error for that event.
    pub async fn next(&mut self) -> Option<TrackerResult<bool>> {
        loop {
            match self.rx.recv().await {
                Ok(payload) => {
                    return Some(payload.as_bool().ok_or_else(|| {
                        TrackerError::Decode(format!("tracking payload is not a bool: {payload}"))
                    }))
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "tracking subscriber lagged, skipped events");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
