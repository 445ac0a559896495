//! Tracking strategies: platform-partitioned start/stop request pairs
//!
//! A strategy is a stateless description of one native tracking mode.
//! Invoking it starts a native session; reverting it sends the matching
//! stop request. The two platform families are never interchangeable.

use std::time::Duration;

use serde_json::{json, Value};

use crate::config::SessionConfig;
use crate::error::{TrackerError, TrackerResult};
use crate::transport::Transport;

/// Runtime platform selecting which strategy family applies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Android,
    Ios,
}

/// Desired accuracy tier for iOS strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Accuracy {
    Best = 1,
    Kilometer = 2,
    #[default]
    HundredMeters = 3,
    ThreeKilometers = 4,
    NearestTenMeters = 5,
}

impl Accuracy {
    /// Wire value for this tier
    pub fn tier(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Accuracy {
    type Error = TrackerError;

    fn try_from(tier: u8) -> Result<Self, Self::Error> {
        match tier {
            1 => Ok(Accuracy::Best),
            2 => Ok(Accuracy::Kilometer),
            3 => Ok(Accuracy::HundredMeters),
            4 => Ok(Accuracy::ThreeKilometers),
            5 => Ok(Accuracy::NearestTenMeters),
            other => Err(TrackerError::Decode(format!(
                "unknown accuracy tier: {other}"
            ))),
        }
    }
}

/// Android tracking modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AndroidStrategy {
    /// Poll for a position on a fixed interval
    Periodic { interval: Duration },
    /// Receive positions through a system broadcast on a fixed interval
    Broadcast { interval: Duration },
}

/// iOS tracking modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IosStrategy {
    /// Wake on significant location changes only
    SignificantLocationChange { accuracy: Accuracy },
    /// Continuous location updates
    LocationChange { accuracy: Accuracy },
}

/// A named, parameterized mode of requesting location updates, with
/// matched start/stop requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Android(AndroidStrategy),
    Ios(IosStrategy),
}

impl Strategy {
    /// The platform family this strategy belongs to
    pub fn platform(&self) -> Platform {
        match self {
            Strategy::Android(_) => Platform::Android,
            Strategy::Ios(_) => Platform::Ios,
        }
    }

    /// Wire name of the start request
    pub fn request_name(&self) -> &'static str {
        match self {
            Strategy::Android(AndroidStrategy::Periodic { .. }) => "start/android:periodic",
            Strategy::Android(AndroidStrategy::Broadcast { .. }) => "start/android:broadcast",
            Strategy::Ios(IosStrategy::SignificantLocationChange { .. }) => {
                "start/ios:significant-location-change"
            }
            Strategy::Ios(IosStrategy::LocationChange { .. }) => "start/ios:location-change",
        }
    }

    /// Wire name of the matching stop request
    pub fn stop_request_name(&self) -> &'static str {
        match self {
            Strategy::Android(AndroidStrategy::Periodic { .. }) => "stop/android:periodic",
            Strategy::Android(AndroidStrategy::Broadcast { .. }) => "stop/android:broadcast",
            Strategy::Ios(IosStrategy::SignificantLocationChange { .. }) => {
                "stop/ios:significant-location-change"
            }
            Strategy::Ios(IosStrategy::LocationChange { .. }) => "stop/ios:location-change",
        }
    }

    /// Positional start parameters: interval in milliseconds for Android
    /// modes, accuracy tier for iOS modes
    pub fn args(&self) -> Value {
        match self {
            Strategy::Android(
                AndroidStrategy::Periodic { interval } | AndroidStrategy::Broadcast { interval },
            ) => json!([interval.as_millis() as u64]),
            Strategy::Ios(
                IosStrategy::SignificantLocationChange { accuracy }
                | IosStrategy::LocationChange { accuracy },
            ) => json!([accuracy.tier()]),
        }
    }

    /// Send the start request.
    ///
    /// A `false` result is a normal rejection by the native side, not an
    /// error; a transport failure propagates as `Err`.
    pub async fn invoke(&self, transport: &dyn Transport) -> TrackerResult<bool> {
        let response = transport.invoke(self.request_name(), self.args()).await?;
        response.as_bool().ok_or_else(|| {
            TrackerError::Decode(format!(
                "`{}` did not return a bool: {response}",
                self.request_name()
            ))
        })
    }

    /// Send the matching stop request
    pub async fn revert(&self, transport: &dyn Transport) -> TrackerResult<()> {
        transport
            .invoke(self.stop_request_name(), json!([]))
            .await?;
        Ok(())
    }

    /// Default strategy for a platform, built from configuration
    pub fn default_for(platform: Platform, config: &SessionConfig) -> TrackerResult<Strategy> {
        match platform {
            Platform::Android => Ok(Strategy::Android(AndroidStrategy::Periodic {
                interval: Duration::from_millis(config.default_interval_ms),
            })),
            Platform::Ios => Ok(Strategy::Ios(IosStrategy::LocationChange {
                accuracy: Accuracy::try_from(config.default_accuracy_tier)?,
            })),
        }
    }
}
