//! Adapter from `fitparser` message records to [`DecodedActivity`].
//!
//! `fitparser` does the wire-format work. This module picks the `record`,
//! `session`, `lap` and `activity` messages and normalizes units so the
//! structurer sees degrees, kilometres and km/h:
//!
//! - positions: semicircles → degrees
//! - distances: m → km (ascent/descent stay in metres)
//! - speeds: m/s → km/h
//!
//! `enhanced_*` fields win over their 16-bit counterparts when both exist.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use fitparser::profile::MesgNum;
use fitparser::{FitDataField, FitDataRecord, Value};

use crate::error::{Result, RouteStoreError};
use crate::types::{
    ActivityMetadata, DecodedActivity, DecodedLap, DecodedRecord, DecodedSession,
};

const SEMICIRCLES_TO_DEGREES: f64 = 180.0 / 2_147_483_648.0;

/// Decode a FIT file into the activity tree.
pub fn decode_fit(bytes: &[u8]) -> Result<DecodedActivity> {
    let messages = fitparser::from_bytes(bytes)
        .map_err(|e| RouteStoreError::parse(format!("FIT decode failed: {}", e)))?;
    let activity = activity_from_messages(&messages);

    log::debug!(
        "[Fit] Decoded {} messages: {} records, {} sessions, {} laps",
        messages.len(),
        activity.records.len(),
        activity.sessions.len(),
        activity.laps.len()
    );
    Ok(activity)
}

fn activity_from_messages(messages: &[FitDataRecord]) -> DecodedActivity {
    let mut activity = DecodedActivity::default();

    for message in messages {
        let fields = Fields::new(message.fields());
        match message.kind() {
            MesgNum::Record => activity.records.push(fields.record()),
            MesgNum::Session => activity.sessions.push(fields.session()),
            MesgNum::Lap => activity.laps.push(fields.lap()),
            MesgNum::Activity => activity.metadata = fields.metadata(),
            _ => {}
        }
    }

    activity
}

/// Name-indexed view over one message's fields.
struct Fields<'a> {
    by_name: HashMap<&'a str, &'a FitDataField>,
}

impl<'a> Fields<'a> {
    fn new(fields: &'a [FitDataField]) -> Self {
        Self {
            by_name: fields.iter().map(|f| (f.name(), f)).collect(),
        }
    }

    fn number(&self, name: &str) -> Option<f64> {
        self.by_name.get(name).and_then(|f| value_as_f64(f.value()))
    }

    /// First present value among `names`.
    fn first_number(&self, names: &[&str]) -> Option<f64> {
        names.iter().find_map(|name| self.number(name))
    }

    fn units(&self, name: &str) -> Option<&str> {
        self.by_name.get(name).map(|f| f.units())
    }

    fn timestamp(&self, name: &str) -> Option<DateTime<Utc>> {
        match self.by_name.get(name)?.value() {
            Value::Timestamp(ts) => Some(ts.with_timezone(&Utc)),
            _ => None,
        }
    }

    fn text(&self, name: &str) -> Option<String> {
        match self.by_name.get(name)?.value() {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            _ => None,
        }
    }

    fn degrees(&self, name: &str) -> Option<f64> {
        let raw = self.number(name)?;
        match self.units(name) {
            Some("semicircles") => Some(raw * SEMICIRCLES_TO_DEGREES),
            _ => Some(raw),
        }
    }

    fn kilometres(&self, name: &str) -> Option<f64> {
        let raw = self.number(name)?;
        match self.units(name) {
            Some("km") => Some(raw),
            _ => Some(raw / 1000.0),
        }
    }

    /// Speed in km/h, preferring `enhanced_<name>`.
    fn kmh(&self, name: &str) -> Option<f64> {
        let enhanced = format!("enhanced_{}", name);
        let field = if self.by_name.contains_key(enhanced.as_str()) {
            enhanced.as_str()
        } else {
            name
        };
        let raw = self.number(field)?;
        match self.units(field) {
            Some("km/h") => Some(raw),
            _ => Some(raw * 3.6),
        }
    }

    fn record(&self) -> DecodedRecord {
        DecodedRecord {
            position_lat: self.degrees("position_lat"),
            position_long: self.degrees("position_long"),
            timestamp: self.timestamp("timestamp"),
            altitude: self.first_number(&["enhanced_altitude", "altitude"]),
            heart_rate: self.number("heart_rate"),
            cadence: self.number("cadence"),
            speed: self.kmh("speed"),
            power: self.number("power"),
            temperature: self.number("temperature"),
            distance: self.kilometres("distance"),
        }
    }

    fn session(&self) -> DecodedSession {
        DecodedSession {
            sport: self.text("sport"),
            start_time: self.timestamp("start_time"),
            total_distance: self.kilometres("total_distance"),
            total_elapsed_time: self.number("total_elapsed_time"),
            total_timer_time: self.number("total_timer_time"),
            avg_speed: self.kmh("avg_speed"),
            max_speed: self.kmh("max_speed"),
            avg_heart_rate: self.number("avg_heart_rate"),
            max_heart_rate: self.number("max_heart_rate"),
            avg_cadence: self.number("avg_cadence"),
            max_cadence: self.number("max_cadence"),
            avg_power: self.number("avg_power"),
            max_power: self.number("max_power"),
            total_calories: self.number("total_calories"),
            total_ascent: self.number("total_ascent"),
            total_descent: self.number("total_descent"),
        }
    }

    fn lap(&self) -> DecodedLap {
        DecodedLap {
            start_time: self.timestamp("start_time"),
            total_distance: self.kilometres("total_distance"),
            total_elapsed_time: self.number("total_elapsed_time"),
            avg_speed: self.kmh("avg_speed"),
            max_speed: self.kmh("max_speed"),
            avg_heart_rate: self.number("avg_heart_rate"),
            max_heart_rate: self.number("max_heart_rate"),
            avg_cadence: self.number("avg_cadence"),
            avg_power: self.number("avg_power"),
        }
    }

    fn metadata(&self) -> ActivityMetadata {
        ActivityMetadata {
            sport: self.text("sport"),
            timestamp: self.timestamp("timestamp"),
        }
    }
}

/// Numeric view of a field value. Strings, arrays and invalid markers are `None`.
fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Byte(v) | Value::Enum(v) | Value::UInt8(v) | Value::UInt8z(v) => Some(f64::from(*v)),
        Value::SInt8(v) => Some(f64::from(*v)),
        Value::SInt16(v) => Some(f64::from(*v)),
        Value::UInt16(v) | Value::UInt16z(v) => Some(f64::from(*v)),
        Value::SInt32(v) => Some(f64::from(*v)),
        Value::UInt32(v) | Value::UInt32z(v) => Some(f64::from(*v)),
        Value::SInt64(v) => Some(*v as f64),
        Value::UInt64(v) | Value::UInt64z(v) => Some(*v as f64),
        Value::Float32(v) => Some(f64::from(*v)),
        Value::Float64(v) => Some(*v),
        _ => None,
    }
    .filter(|v| v.is_finite())
}
