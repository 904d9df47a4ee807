//! # Import/Export Codec
//!
//! Moves the whole route collection through an indented JSON snapshot.
//!
//! A snapshot is an array of routes, each with `id`, `label`, `summary`,
//! `points` and `laps`. On import the `id` is ignored and every record is
//! saved through [`RouteStore::save`], so imported rows look exactly like
//! ingested ones.
//!
//! [`import`] is not all-or-nothing: a snapshot that fails to parse inserts
//! nothing, but a record that fails to save leaves the records before it
//! committed. [`import_atomic`] is the transactional alternative.

use serde::Deserialize;

use crate::error::{Result, RouteStoreError};
use crate::persistence::RouteStore;
use crate::types::{RouteLap, RoutePoint, RouteSummary, StructuredRoute};

/// One route as read from a snapshot. The original id is discarded.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotRecord {
    /// Older snapshots carry the display name as `name`.
    #[serde(default, alias = "name")]
    pub label: Option<String>,
    #[serde(default)]
    pub summary: RouteSummary,
    #[serde(default)]
    pub points: Vec<RoutePoint>,
    #[serde(default)]
    pub laps: Vec<RouteLap>,
}

impl SnapshotRecord {
    fn into_parts(self) -> (StructuredRoute, Option<String>) {
        (
            StructuredRoute {
                summary: self.summary,
                points: self.points,
                laps: self.laps,
            },
            self.label,
        )
    }
}

/// Serialize every stored route to an indented JSON snapshot.
pub async fn export(store: &RouteStore) -> Result<String> {
    let routes = store.get_all().await?;
    let snapshot = serde_json::to_string_pretty(&routes)
        .map_err(|e| RouteStoreError::encoding(format!("snapshot: {}", e)))?;
    log::info!("[Snapshot] Exported {} routes", routes.len());
    Ok(snapshot)
}

/// Parse a snapshot without touching any store.
pub fn parse_snapshot(snapshot: &str) -> Result<Vec<SnapshotRecord>> {
    serde_json::from_str(snapshot)
        .map_err(|e| RouteStoreError::parse(format!("invalid snapshot: {}", e)))
}

/// Insert every snapshot record, one at a time, in snapshot order.
///
/// Returns the number of routes inserted. If a record fails to save, the
/// error is returned and the routes inserted before it stay committed.
pub async fn import(store: &RouteStore, snapshot: &str) -> Result<usize> {
    let records = parse_snapshot(snapshot)?;
    let total = records.len();
    let mut count = 0;

    for record in records {
        let (route, label) = record.into_parts();
        let label = store.config().label_or_default(label.as_deref());
        if let Err(e) = store.save(route, &label).await {
            log::warn!(
                "[Snapshot] Import stopped at record {} of {}: {} ({} routes committed)",
                count + 1,
                total,
                e,
                count
            );
            return Err(e);
        }
        count += 1;
    }

    log::info!("[Snapshot] Imported {} routes", count);
    Ok(count)
}

/// Insert every snapshot record in one transaction. Any failure inserts nothing.
pub async fn import_atomic(store: &RouteStore, snapshot: &str) -> Result<usize> {
    let records = parse_snapshot(snapshot)?;
    let entries: Vec<(StructuredRoute, String)> = records
        .into_iter()
        .map(|record| {
            let (route, label) = record.into_parts();
            let label = store.config().label_or_default(label.as_deref());
            (route, label)
        })
        .collect();

    let ids = store.save_all_atomic(entries).await?;
    log::info!("[Snapshot] Imported {} routes atomically", ids.len());
    Ok(ids.len())
}
