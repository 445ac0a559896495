//! Error types for the tracking core

use std::time::Duration;

use thiserror::Error;

/// Result type for tracker operations
pub type TrackerResult<T> = Result<T, TrackerError>;

/// Errors that can occur in the tracking core
#[derive(Error, Debug)]
pub enum TrackerError {
    /// The native channel call or subscription itself failed
    #[error("Transport error: {0}")]
    Transport(String),

    /// A wire payload could not be mapped to the data model
    #[error("Decode error: {0}")]
    Decode(String),

    /// The permission stream produced no state within the configured window
    #[error("Timed out after {0:?} waiting for a permission state")]
    PermissionTimeout(Duration),

    /// The permission stream closed before a state was delivered
    #[error("Permission stream closed before a state was delivered")]
    PermissionStreamClosed,
}
