//! # Record Structurer
//!
//! Turns one decoded activity into a storable [`StructuredRoute`].
//!
//! Summary fields follow a fixed defaulting table:
//!
//! | Field | Source | When absent |
//! |---|---|---|
//! | `sport` | session, then activity metadata | `"unknown"` |
//! | `startTime` | session, then activity timestamp | absent |
//! | `totalDistance`, `totalTime`, `totalMovingTime`, `avgSpeed`, `maxSpeed` | session | `0` |
//! | heart rate, cadence, power, calories, ascent, descent | session | absent |
//!
//! NaN and infinite inputs are treated as absent everywhere, so a structured
//! route only ever carries finite numbers.
//!
//! Only the first session is read. Structuring never fails; an activity with
//! no usable GPS samples yields a route with empty `points`, which the caller
//! must reject before saving.

use crate::types::{
    ActivityMetadata, DecodedActivity, DecodedLap, DecodedRecord, DecodedSession, RouteLap,
    RoutePoint, RouteSummary, StructuredRoute, UNKNOWN_SPORT,
};

/// Structure a decoded activity into a route candidate.
///
/// # Example
/// ```
/// use bikeroutes::{structure_activity, DecodedActivity, DecodedRecord};
///
/// let activity = DecodedActivity {
///     records: vec![
///         DecodedRecord { position_lat: Some(51.5), position_long: Some(-0.12), ..Default::default() },
///         DecodedRecord { position_lat: Some(51.6), ..Default::default() },
///     ],
///     ..Default::default()
/// };
///
/// let route = structure_activity(&activity);
/// assert_eq!(route.points.len(), 1);
/// assert_eq!(route.summary.sport, "unknown");
/// ```
pub fn structure_activity(activity: &DecodedActivity) -> StructuredRoute {
    let points: Vec<RoutePoint> = activity.records.iter().filter_map(record_to_point).collect();

    let dropped = activity.records.len() - points.len();
    if dropped > 0 {
        log::debug!(
            "[Structurer] Dropped {} of {} records without coordinates",
            dropped,
            activity.records.len()
        );
    }

    StructuredRoute {
        summary: build_summary(activity.sessions.first(), &activity.metadata),
        points,
        laps: activity.laps.iter().map(lap_from_decoded).collect(),
    }
}

/// Map a decoded record to a point. Records missing either coordinate are dropped.
fn record_to_point(record: &DecodedRecord) -> Option<RoutePoint> {
    let lat = finite(record.position_lat)?;
    let lng = finite(record.position_long)?;

    Some(RoutePoint {
        lat,
        lng,
        timestamp: record.timestamp,
        altitude: finite(record.altitude),
        heart_rate: finite(record.heart_rate),
        cadence: finite(record.cadence),
        speed: finite(record.speed),
        power: finite(record.power),
        temperature: finite(record.temperature),
        distance: finite(record.distance),
    })
}

fn build_summary(session: Option<&DecodedSession>, metadata: &ActivityMetadata) -> RouteSummary {
    let empty = DecodedSession::default();
    let session = session.unwrap_or(&empty);

    let sport = non_empty(session.sport.as_deref())
        .or_else(|| non_empty(metadata.sport.as_deref()))
        .unwrap_or(UNKNOWN_SPORT)
        .to_string();

    RouteSummary {
        sport,
        start_time: session.start_time.or(metadata.timestamp),
        total_distance: finite(session.total_distance).unwrap_or(0.0),
        total_time: finite(session.total_elapsed_time).unwrap_or(0.0),
        total_moving_time: finite(session.total_timer_time).unwrap_or(0.0),
        avg_speed: finite(session.avg_speed).unwrap_or(0.0),
        max_speed: finite(session.max_speed).unwrap_or(0.0),
        avg_heart_rate: finite(session.avg_heart_rate),
        max_heart_rate: finite(session.max_heart_rate),
        avg_cadence: finite(session.avg_cadence),
        max_cadence: finite(session.max_cadence),
        avg_power: finite(session.avg_power),
        max_power: finite(session.max_power),
        total_calories: finite(session.total_calories),
        total_ascent: finite(session.total_ascent),
        total_descent: finite(session.total_descent),
    }
}

fn lap_from_decoded(lap: &DecodedLap) -> RouteLap {
    RouteLap {
        start_time: lap.start_time,
        total_distance: finite(lap.total_distance),
        total_time: finite(lap.total_elapsed_time),
        avg_speed: finite(lap.avg_speed),
        max_speed: finite(lap.max_speed),
        avg_heart_rate: finite(lap.avg_heart_rate),
        max_heart_rate: finite(lap.max_heart_rate),
        avg_cadence: finite(lap.avg_cadence),
        avg_power: finite(lap.avg_power),
    }
}

/// NaN and infinities count as absent.
fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}
