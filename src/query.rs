//! Search criteria and collection statistics.
//!
//! These work on plain route slices so the store and any in-memory consumer
//! filter and aggregate the same way.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::Route;

/// Optional filters for [`crate::RouteStore::search`]. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchCriteria {
    /// Exact match on `summary.sport`
    pub sport: Option<String>,
    /// Lower bound on `summary.totalDistance` (inclusive)
    pub min_distance: Option<f64>,
    /// Upper bound on `summary.totalDistance` (inclusive)
    pub max_distance: Option<f64>,
    /// Earliest `summary.startTime` (inclusive)
    pub start_date: Option<DateTime<Utc>>,
    /// Latest `summary.startTime` (inclusive)
    pub end_date: Option<DateTime<Utc>>,
    /// Case-insensitive substring of the label
    pub name: Option<String>,
}

impl SearchCriteria {
    /// Check whether a route satisfies every set criterion.
    pub fn matches(&self, route: &Route) -> bool {
        let summary = &route.summary;

        if let Some(sport) = &self.sport {
            if summary.sport != *sport {
                return false;
            }
        }
        if let Some(min) = self.min_distance {
            if summary.total_distance < min {
                return false;
            }
        }
        if let Some(max) = self.max_distance {
            if summary.total_distance > max {
                return false;
            }
        }
        if self.start_date.is_some() || self.end_date.is_some() {
            let Some(start_time) = summary.start_time else {
                return false;
            };
            if self.start_date.is_some_and(|start| start_time < start) {
                return false;
            }
            if self.end_date.is_some_and(|end| start_time > end) {
                return false;
            }
        }
        if let Some(name) = &self.name {
            if !route.label.to_lowercase().contains(&name.to_lowercase()) {
                return false;
            }
        }
        true
    }

    /// Keep only the routes that match.
    pub fn filter(&self, routes: Vec<Route>) -> Vec<Route> {
        routes.into_iter().filter(|r| self.matches(r)).collect()
    }
}

/// True if the route's start time lies in the closed interval `[start, end]`.
pub fn starts_within(route: &Route, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    route
        .summary
        .start_time
        .is_some_and(|t| start <= t && t <= end)
}

/// Aggregate totals over a route collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteStats {
    pub total_routes: u64,
    /// Kilometres
    pub total_distance: f64,
    /// Seconds
    pub total_moving_time: f64,
    pub total_calories: f64,
}

impl RouteStats {
    /// Fold one route's totals in. Absent calories count as zero.
    pub fn accumulate(&mut self, distance: f64, moving_time: f64, calories: Option<f64>) {
        self.total_routes += 1;
        self.total_distance += distance;
        self.total_moving_time += moving_time;
        self.total_calories += calories.unwrap_or(0.0);
    }

    /// Compute stats over a slice of routes.
    pub fn from_routes(routes: &[Route]) -> Self {
        let mut stats = Self::default();
        for route in routes {
            stats.accumulate(
                route.summary.total_distance,
                route.summary.total_moving_time,
                route.summary.total_calories,
            );
        }
        stats
    }
}

/// Sort routes newest first. Routes without a start time go last.
pub fn sort_newest_first(routes: &mut [Route]) {
    routes.sort_by(|a, b| match (a.summary.start_time, b.summary.start_time) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}
