//! Location trace and permission state data model
//!
//! Traces are constructed only by decoding a wire payload. All numeric
//! fields may arrive as floating-point on the wire even when semantically
//! integral; integral fields truncate toward zero on decode.

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{TrackerError, TrackerResult};

/// Wire keys that only the Android native layer produces
const ANDROID_ONLY_KEYS: [&str; 3] = ["provider", "courseAccuracy", "speedAccuracy"];

/// One persisted location sample
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationTrace {
    /// Monotonically increasing id assigned by the store; the sole key
    /// for mark-as-read operations
    pub id: i64,

    /// Latitude in degrees
    pub latitude: f64,

    /// Longitude in degrees
    pub longitude: f64,

    /// Altitude in meters; `None` when the native layer did not report one
    /// (a raw value of exactly 0.0 means "not reported", not sea level)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,

    /// Speed in m/s
    pub speed: f64,

    /// Course in degrees from north
    pub course: f64,

    /// Horizontal accuracy in meters
    pub accuracy: f64,

    /// Vertical accuracy in meters
    pub vertical_accuracy: f64,

    /// Sample time, epoch milliseconds
    pub time: i64,

    /// How many times this record has been retrieved; incremented by the
    /// store on every read-style fetch
    pub read_count: i64,

    /// Platform-specific extension data
    #[serde(flatten)]
    pub platform: PlatformData,
}

/// Platform extension slot; exactly one variant is populated per trace
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PlatformData {
    Android(AndroidLocationData),
    Ios(IosLocationData),
}

/// Fields only the Android native layer reports
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AndroidLocationData {
    /// Course accuracy in degrees
    pub course_accuracy: f64,

    /// Speed accuracy in m/s
    pub speed_accuracy: f64,

    /// Name of the location provider that produced the sample
    pub provider: String,
}

/// Fields only the iOS native layer reports
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IosLocationData {
    /// Building floor, when the OS resolved one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logical_floor: Option<i64>,
}

impl LocationTrace {
    /// Decode a trace from its wire payload.
    ///
    /// The platform extension is selected by key presence: any
    /// Android-only key selects the Android slot, otherwise the iOS slot.
    pub fn from_wire(payload: &Value) -> TrackerResult<Self> {
        let map = payload
            .as_object()
            .ok_or_else(|| TrackerError::Decode(format!("trace payload is not a map: {payload}")))?;

        let platform = if ANDROID_ONLY_KEYS.iter().any(|key| map.contains_key(*key)) {
            PlatformData::Android(AndroidLocationData {
                course_accuracy: require_f64(map, "courseAccuracy")?,
                speed_accuracy: require_f64(map, "speedAccuracy")?,
                provider: require_str(map, "provider")?,
            })
        } else {
            PlatformData::Ios(IosLocationData {
                logical_floor: map
                    .get("logicalFloor")
                    .and_then(Value::as_f64)
                    .map(|floor| floor as i64),
            })
        };

        Ok(Self {
            id: require_f64(map, "id")? as i64,
            latitude: require_f64(map, "latitude")?,
            longitude: require_f64(map, "longitude")?,
            altitude: map
                .get("altitude")
                .and_then(Value::as_f64)
                .filter(|raw| *raw != 0.0),
            speed: require_f64(map, "speed")?,
            course: require_f64(map, "course")?,
            accuracy: require_f64(map, "accuracy")?,
            vertical_accuracy: require_f64(map, "verticalAccuracy")?,
            time: require_f64(map, "time")? as i64,
            read_count: require_f64(map, "readCount")? as i64,
            platform,
        })
    }

    /// Sample time as a UTC timestamp
    pub fn timestamp(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.time)
            .single()
            .unwrap_or_default()
    }
}

fn require_f64(map: &Map<String, Value>, key: &str) -> TrackerResult<f64> {
    map.get(key)
        .and_then(Value::as_f64)
        .ok_or_else(|| TrackerError::Decode(format!("trace field `{key}` missing or not numeric")))
}

fn require_str(map: &Map<String, Value>, key: &str) -> TrackerResult<String> {
    map.get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| TrackerError::Decode(format!("trace field `{key}` missing or not a string")))
}

/// OS-level authorization for background location access
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionState {
    /// Full access granted
    Granted,
    /// Foreground-only grant; produced only on platforms that distinguish it
    Partial,
    /// Access denied
    Denied,
}

impl PermissionState {
    /// Map a native wire code to a permission state.
    ///
    /// Unknown codes are a decode error, never a silent default.
    pub fn from_code(code: i64) -> TrackerResult<Self> {
        match code {
            1 => Ok(PermissionState::Granted),
            2 => Ok(PermissionState::Partial),
            3 => Ok(PermissionState::Denied),
            other => Err(TrackerError::Decode(format!(
                "unknown permission code: {other}"
            ))),
        }
    }

    /// Decode a permission state from its wire payload
    pub fn from_wire(payload: &Value) -> TrackerResult<Self> {
        let code = payload
            .as_i64()
            .or_else(|| payload.as_f64().map(|raw| raw as i64))
            .ok_or_else(|| {
                TrackerError::Decode(format!("permission payload is not numeric: {payload}"))
            })?;
        Self::from_code(code)
    }
}
