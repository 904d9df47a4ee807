//! Route entity types and the decoded activity tree they are built from.
//!
//! The decoded types mirror what a FIT decoder hands over: every field is
//! optional because devices omit whatever they did not record. The route
//! types are the canonical, storable shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Store-assigned numeric key of a persisted route.
pub type RouteId = i64;

/// Sport recorded when neither the session nor the activity names one.
pub const UNKNOWN_SPORT: &str = "unknown";

// ============================================================================
// Decoded Activity (decoder output)
// ============================================================================

/// One raw sample from the decoder's `record` messages.
///
/// Coordinates are in degrees, distances in kilometres and speeds in km/h.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecodedRecord {
    pub position_lat: Option<f64>,
    pub position_long: Option<f64>,
    pub timestamp: Option<DateTime<Utc>>,
    pub altitude: Option<f64>,
    pub heart_rate: Option<f64>,
    pub cadence: Option<f64>,
    pub speed: Option<f64>,
    pub power: Option<f64>,
    pub temperature: Option<f64>,
    pub distance: Option<f64>,
}

/// Session-level totals as reported by the device.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecodedSession {
    pub sport: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub total_distance: Option<f64>,
    pub total_elapsed_time: Option<f64>,
    pub total_timer_time: Option<f64>,
    pub avg_speed: Option<f64>,
    pub max_speed: Option<f64>,
    pub avg_heart_rate: Option<f64>,
    pub max_heart_rate: Option<f64>,
    pub avg_cadence: Option<f64>,
    pub max_cadence: Option<f64>,
    pub avg_power: Option<f64>,
    pub max_power: Option<f64>,
    pub total_calories: Option<f64>,
    pub total_ascent: Option<f64>,
    pub total_descent: Option<f64>,
}

/// Per-lap totals as reported by the device.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecodedLap {
    pub start_time: Option<DateTime<Utc>>,
    pub total_distance: Option<f64>,
    pub total_elapsed_time: Option<f64>,
    pub avg_speed: Option<f64>,
    pub max_speed: Option<f64>,
    pub avg_heart_rate: Option<f64>,
    pub max_heart_rate: Option<f64>,
    pub avg_cadence: Option<f64>,
    pub avg_power: Option<f64>,
}

/// Activity-level metadata, used as a fallback for session fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityMetadata {
    pub sport: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

/// Full decoder output for one activity file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecodedActivity {
    #[serde(default)]
    pub sessions: Vec<DecodedSession>,
    #[serde(default)]
    pub records: Vec<DecodedRecord>,
    #[serde(default)]
    pub laps: Vec<DecodedLap>,
    #[serde(default)]
    pub metadata: ActivityMetadata,
}

// ============================================================================
// Route Entity
// ============================================================================

/// A GPS sample belonging to a route. `lat`/`lng` are always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutePoint {
    pub lat: f64,
    pub lng: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heart_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cadence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
}

impl RoutePoint {
    /// Create a point with only coordinates set.
    pub fn new(lat: f64, lng: f64) -> Self {
        Self {
            lat,
            lng,
            timestamp: None,
            altitude: None,
            heart_rate: None,
            cadence: None,
            speed: None,
            power: None,
            temperature: None,
            distance: None,
        }
    }

    /// Whether every numeric field that is set holds a finite value.
    pub fn is_finite(&self) -> bool {
        all_finite(&[
            Some(self.lat),
            Some(self.lng),
            self.altitude,
            self.heart_rate,
            self.cadence,
            self.speed,
            self.power,
            self.temperature,
            self.distance,
        ])
    }
}

/// Whole-route aggregate metrics.
///
/// The first block of fields is always present (zero when the device did
/// not report it). The optional block is only set when the source had a value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RouteSummary {
    pub sport: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    /// Kilometres
    pub total_distance: f64,
    /// Elapsed seconds
    pub total_time: f64,
    /// Timer (moving) seconds
    pub total_moving_time: f64,
    /// km/h
    pub avg_speed: f64,
    /// km/h
    pub max_speed: f64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_heart_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_heart_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_cadence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_cadence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_power: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_power: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_calories: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_ascent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_descent: Option<f64>,
}

impl Default for RouteSummary {
    fn default() -> Self {
        Self {
            sport: UNKNOWN_SPORT.to_string(),
            start_time: None,
            total_distance: 0.0,
            total_time: 0.0,
            total_moving_time: 0.0,
            avg_speed: 0.0,
            max_speed: 0.0,
            avg_heart_rate: None,
            max_heart_rate: None,
            avg_cadence: None,
            max_cadence: None,
            avg_power: None,
            max_power: None,
            total_calories: None,
            total_ascent: None,
            total_descent: None,
        }
    }
}

impl RouteSummary {
    /// Whether every numeric field that is set holds a finite value.
    pub fn is_finite(&self) -> bool {
        all_finite(&[
            Some(self.total_distance),
            Some(self.total_time),
            Some(self.total_moving_time),
            Some(self.avg_speed),
            Some(self.max_speed),
            self.avg_heart_rate,
            self.max_heart_rate,
            self.avg_cadence,
            self.max_cadence,
            self.avg_power,
            self.max_power,
            self.total_calories,
            self.total_ascent,
            self.total_descent,
        ])
    }
}

/// Per-lap summary. Fields pass through from the decoder as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RouteLap {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_distance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_speed: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_speed: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_heart_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_heart_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_cadence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_power: Option<f64>,
}

impl RouteLap {
    /// Whether every numeric field that is set holds a finite value.
    pub fn is_finite(&self) -> bool {
        all_finite(&[
            self.total_distance,
            self.total_time,
            self.avg_speed,
            self.max_speed,
            self.avg_heart_rate,
            self.max_heart_rate,
            self.avg_cadence,
            self.avg_power,
        ])
    }
}

/// Structurer output: a route candidate that has not been stored yet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredRoute {
    pub summary: RouteSummary,
    pub points: Vec<RoutePoint>,
    pub laps: Vec<RouteLap>,
}

impl StructuredRoute {
    /// A candidate with no GPS points must never be persisted.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// A persisted route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub id: RouteId,
    /// User-facing display name. Never empty.
    pub label: String,
    pub summary: RouteSummary,
    pub points: Vec<RoutePoint>,
    pub laps: Vec<RouteLap>,
}

impl Route {
    /// Attach a store id and label to a structured candidate.
    pub fn from_structured(id: RouteId, label: impl Into<String>, route: StructuredRoute) -> Self {
        Self {
            id,
            label: label.into(),
            summary: route.summary,
            points: route.points,
            laps: route.laps,
        }
    }

    /// Drop the id and label, keeping the content.
    pub fn into_structured(self) -> StructuredRoute {
        StructuredRoute {
            summary: self.summary,
            points: self.points,
            laps: self.laps,
        }
    }
}

fn all_finite(values: &[Option<f64>]) -> bool {
    values.iter().flatten().all(|v| v.is_finite())
}
