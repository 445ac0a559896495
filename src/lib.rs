//! geotrace - background location tracking session core
//!
//! Manages background location tracking sessions against a native
//! platform layer reached through an abstract transport:
//! - picks and invokes a platform-appropriate tracking strategy, and
//!   reverts the last-attempted one on stop
//! - acquires background location permission without racing "current
//!   state" against "state after the user acted"
//! - reads, counts, and marks persisted location traces
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                  LOCATION TRACKER                    │
//! │                                                      │
//! │  ┌───────────┐  ┌─────────────┐  ┌──────────────┐   │
//! │  │  Session  │  │ Permission  │  │    Trace     │   │
//! │  │Controller │  │ Coordinator │  │  Repository  │   │
//! │  └─────┬─────┘  └──────┬──────┘  └──────┬───────┘   │
//! │        └───────────────┼────────────────┘           │
//! │                  ┌─────▼─────┐                      │
//! │                  │ Transport │  invoke + 2 streams  │
//! │                  └───────────┘                      │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use geotrace::{LocationTracker, Platform, TrackerConfig};
//!
//! let tracker = LocationTracker::new(transport, TrackerConfig::default());
//!
//! // Permission first, then tracking
//! let state = tracker.permissions().request_permission().await?;
//! let accepted = tracker.start_default_tracking(Platform::Android).await?;
//!
//! // Observe transitions
//! let mut states = tracker.session().tracking_state_stream();
//! while let Some(active) = states.next().await { /* ... */ }
//!
//! // Drain the store
//! let unread = tracker.traces().unread_traces().await?;
//! tracker.traces().mark_as_read(&unread.iter().map(|t| t.id).collect::<Vec<_>>()).await?;
//! ```

pub mod config;
pub mod error;
pub mod model;
pub mod permission;
pub mod session;
pub mod strategy;
pub mod traces;
pub mod transport;

pub use config::{PermissionConfig, SessionConfig, TrackerConfig};
pub use error::{TrackerError, TrackerResult};
pub use model::{
    AndroidLocationData, IosLocationData, LocationTrace, PermissionState, PlatformData,
};
pub use permission::{PermissionCoordinator, PermissionStateStream};
pub use session::{SessionController, TrackingStateStream};
pub use strategy::{Accuracy, AndroidStrategy, IosStrategy, Platform, Strategy};
pub use traces::TraceRepository;
pub use transport::{InProcessTransport, Transport};

use std::sync::Arc;

/// The main tracker facade.
///
/// Wires one session controller, permission coordinator, and trace
/// repository over a shared transport. Construction performs no I/O.
pub struct LocationTracker {
    /// Configuration
    config: TrackerConfig,

    /// Session controller
    session: SessionController,

    /// Permission coordinator
    permissions: PermissionCoordinator,

    /// Trace repository
    traces: TraceRepository,
}

impl LocationTracker {
    /// Create a tracker over the given transport
    pub fn new(transport: Arc<dyn Transport>, config: TrackerConfig) -> Self {
        let session = SessionController::new(transport.clone());
        let permissions = PermissionCoordinator::new(transport.clone(), config.permission.clone());
        let traces = TraceRepository::new(transport);

        Self {
            config,
            session,
            permissions,
            traces,
        }
    }

    /// The session controller
    pub fn session(&self) -> &SessionController {
        &self.session
    }

    /// The permission coordinator
    pub fn permissions(&self) -> &PermissionCoordinator {
        &self.permissions
    }

    /// The trace repository
    pub fn traces(&self) -> &TraceRepository {
        &self.traces
    }

    /// Start tracking with the configured default strategy for a platform
    pub async fn start_default_tracking(&self, platform: Platform) -> TrackerResult<bool> {
        let strategy = Strategy::default_for(platform, &self.config.session)?;
        self.session.start_tracking(strategy).await
    }
}
