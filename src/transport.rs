//! Transport boundary to the native platform layer

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::debug;

use crate::error::{TrackerError, TrackerResult};

/// Broadcast capacity for the two native event channels
const CHANNEL_CAPACITY: usize = 64;

/// Abstract call/event boundary to the native platform layer.
///
/// One request/response primitive plus two independent broadcast
/// subscriptions. Subscribers see only events published after they
/// subscribe.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request with positional args and await the native result
    async fn invoke(&self, request: &str, args: Value) -> TrackerResult<Value>;

    /// Subscribe to tracking-active transitions
    fn subscribe_tracking(&self) -> broadcast::Receiver<Value>;

    /// Subscribe to permission state changes
    fn subscribe_permission(&self) -> broadcast::Receiver<Value>;
}

/// In-memory transport for tests and host-side simulation.
///
/// Responses are scripted per request name; unscripted requests answer
/// `null`. Individual requests can be made to fail to exercise
/// transport-error paths. Every call is recorded.
pub struct InProcessTransport {
    /// Scripted responses by request name, consumed front to back
    responses: Mutex<HashMap<String, VecDeque<Value>>>,

    /// Requests that fail with a transport error
    failures: Mutex<HashSet<String>>,

    /// Log of every invocation
    calls: Mutex<Vec<(String, Value)>>,

    tracking_tx: broadcast::Sender<Value>,
    permission_tx: broadcast::Sender<Value>,
}

impl InProcessTransport {
    pub fn new() -> Self {
        let (tracking_tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        let (permission_tx, _) = broadcast::channel(CHANNEL_CAPACITY);

        Self {
            responses: Mutex::new(HashMap::new()),
            failures: Mutex::new(HashSet::new()),
            calls: Mutex::new(Vec::new()),
            tracking_tx,
            permission_tx,
        }
    }

    /// Queue a response for the next call to `request`
    pub fn enqueue_response(&self, request: &str, response: Value) {
        if let Ok(mut responses) = self.responses.lock() {
            responses
                .entry(request.to_string())
                .or_default()
                .push_back(response);
        }
    }

    /// Make every call to `request` fail with a transport error
    pub fn fail_request(&self, request: &str) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.insert(request.to_string());
        }
    }

    /// All invocations recorded so far, in call order
    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    /// Publish a tracking-active transition to subscribers
    pub fn emit_tracking(&self, active: bool) {
        // No receivers is fine; the event is simply dropped
        let _ = self.tracking_tx.send(Value::Bool(active));
    }

    /// Publish a raw permission wire code to subscribers
    pub fn emit_permission_code(&self, code: i64) {
        let _ = self.permission_tx.send(Value::from(code));
    }
}

impl Default for InProcessTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for InProcessTransport {
    async fn invoke(&self, request: &str, args: Value) -> TrackerResult<Value> {
        debug!(request, %args, "in-process invoke");

        if let Ok(mut calls) = self.calls.lock() {
            calls.push((request.to_string(), args));
        }

        let failed = self
            .failures
            .lock()
            .map(|failures| failures.contains(request))
            .unwrap_or(false);
        if failed {
            return Err(TrackerError::Transport(format!(
                "native call `{request}` failed"
            )));
        }

        let scripted = self
            .responses
            .lock()
            .ok()
            .and_then(|mut responses| responses.get_mut(request).and_then(VecDeque::pop_front));

        Ok(scripted.unwrap_or(Value::Null))
    }

    fn subscribe_tracking(&self) -> broadcast::Receiver<Value> {
        self.tracking_tx.subscribe()
    }

    fn subscribe_permission(&self) -> broadcast::Receiver<Value> {
        self.permission_tx.subscribe()
    }
}
