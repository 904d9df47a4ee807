//! Chart series extracted from a route's points.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::RoutePoint;

/// Elevation at a point along the route.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElevationSample {
    pub distance: Option<f64>,
    pub elevation: f64,
}

/// A metric (heart rate, power) at a point along the route.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    pub distance: Option<f64>,
    pub value: f64,
    pub timestamp: Option<DateTime<Utc>>,
}

/// Elevation profile over the points that carry altitude.
pub fn elevation_profile(points: &[RoutePoint]) -> Vec<ElevationSample> {
    points
        .iter()
        .filter_map(|p| {
            p.altitude.map(|elevation| ElevationSample {
                distance: p.distance,
                elevation,
            })
        })
        .collect()
}

/// Heart rate over the points that carry it.
pub fn heart_rate_series(points: &[RoutePoint]) -> Vec<MetricSample> {
    metric_series(points, |p| p.heart_rate)
}

/// Power over the points that carry it.
pub fn power_series(points: &[RoutePoint]) -> Vec<MetricSample> {
    metric_series(points, |p| p.power)
}

fn metric_series(points: &[RoutePoint], metric: impl Fn(&RoutePoint) -> Option<f64>) -> Vec<MetricSample> {
    points
        .iter()
        .filter_map(|p| {
            metric(p).map(|value| MetricSample {
                distance: p.distance,
                value,
                timestamp: p.timestamp,
            })
        })
        .collect()
}

/// Format a duration in seconds as `HH:MM`. Hours are not wrapped at 24.
pub fn format_hhmm(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds as u64
    } else {
        0
    };
    format!("{:02}:{:02}", total / 3600, (total % 3600) / 60)
}
