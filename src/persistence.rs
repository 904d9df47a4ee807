//! # Route Store
//!
//! SQLite-backed persistence for [`Route`] entities.
//!
//! All routes live in a single `routes` table keyed by an auto-incrementing
//! id. Summary totals used for filtering and stats are mirrored into columns;
//! the full summary is stored as JSON and the point/lap sequences as
//! MessagePack blobs.
//!
//! ## Handles and transactions
//!
//! [`RouteStore`] is a cheap clonable handle over one shared connection.
//! Each operation is `async`, runs its SQLite work on the blocking pool and
//! holds the connection for exactly one statement or transaction. There is
//! no lock spanning operations, so [`RouteStore::update_label`] (read, then
//! write) can race with another rename of the same id. The row write itself
//! is atomic, so the stored label is always one of the competing inputs.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Params, Row};

use crate::config::StoreConfig;
use crate::error::{OptionExt, Result, RouteStoreError};
use crate::query::{self, RouteStats, SearchCriteria};
use crate::types::{Route, RouteId, RouteLap, RoutePoint, RouteSummary, StructuredRoute};

const ROUTE_COLUMNS: &str = "id, label, summary, points, laps";

// ============================================================================
// Store Handle
// ============================================================================

struct StoreInner {
    /// `None` once the store has been closed.
    conn: Mutex<Option<Connection>>,
    config: StoreConfig,
}

/// Handle to an open route store.
///
/// Clones share the same connection. Dropping the last clone closes it;
/// [`RouteStore::close`] closes it early for every clone.
#[derive(Clone)]
pub struct RouteStore {
    inner: Arc<StoreInner>,
}

impl std::fmt::Debug for RouteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteStore")
            .field("path", &self.inner.config.path)
            .finish_non_exhaustive()
    }
}

impl RouteStore {
    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Open the database described by `config` and make sure the schema exists.
    ///
    /// Any failure here is reported as [`RouteStoreError::StorageUnavailable`].
    pub async fn open(config: StoreConfig) -> Result<Self> {
        let path = config.path.clone();
        let busy_timeout = Duration::from_millis(config.busy_timeout_ms);

        let conn = tokio::task::spawn_blocking(move || open_connection(path.as_deref(), busy_timeout))
            .await
            .map_err(|e| RouteStoreError::storage_unavailable(format!("open task failed: {}", e)))??;

        let store = Self {
            inner: Arc::new(StoreInner {
                conn: Mutex::new(Some(conn)),
                config,
            }),
        };

        store.init().await.map_err(|e| {
            if e.is_fatal() {
                e
            } else {
                RouteStoreError::storage_unavailable(format!("schema creation failed: {}", e))
            }
        })?;

        log::info!(
            "[RouteStore] Opened {}",
            store
                .inner
                .config
                .path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| ":memory:".to_string())
        );

        Ok(store)
    }

    /// Open a private in-memory store (for testing).
    pub async fn in_memory() -> Result<Self> {
        Self::open(StoreConfig::in_memory()).await
    }

    /// Create the `routes` table if it does not exist. Safe to call repeatedly.
    pub async fn init(&self) -> Result<()> {
        self.run(|conn| {
            conn.execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS routes (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    label TEXT NOT NULL,
                    sport TEXT NOT NULL,
                    start_time INTEGER,           -- Unix millis, NULL when unknown
                    total_distance REAL NOT NULL DEFAULT 0,
                    total_moving_time REAL NOT NULL DEFAULT 0,
                    total_calories REAL,
                    summary TEXT NOT NULL,        -- RouteSummary as JSON
                    points BLOB NOT NULL,         -- Vec<RoutePoint> as MessagePack
                    laps BLOB NOT NULL,           -- Vec<RouteLap> as MessagePack
                    point_count INTEGER NOT NULL,
                    created_at INTEGER DEFAULT (strftime('%s', 'now'))
                );

                CREATE INDEX IF NOT EXISTS idx_routes_start_time ON routes(start_time);
                CREATE INDEX IF NOT EXISTS idx_routes_sport ON routes(sport);
                "#,
            )?;
            Ok(())
        })
        .await
    }

    /// Release the connection. Every later operation on any clone fails with
    /// [`RouteStoreError::StorageUnavailable`].
    pub async fn close(&self) -> Result<()> {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || {
            let mut guard = inner
                .conn
                .lock()
                .map_err(|_| RouteStoreError::storage_unavailable("connection lock poisoned"))?;
            if let Some(conn) = guard.take() {
                conn.close()
                    .map_err(|(_, e)| RouteStoreError::storage_unavailable(format!("close failed: {}", e)))?;
                log::info!("[RouteStore] Closed");
            }
            Ok(())
        })
        .await
        .map_err(|e| RouteStoreError::storage_unavailable(format!("close task failed: {}", e)))?
    }

    /// Whether the handle still holds a connection.
    pub fn is_open(&self) -> bool {
        self.inner
            .conn
            .lock()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }

    /// Configuration the store was opened with.
    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    /// Run one unit of SQLite work on the blocking pool.
    async fn run<T, F>(&self, work: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || {
            let mut guard = inner
                .conn
                .lock()
                .map_err(|_| RouteStoreError::storage_unavailable("connection lock poisoned"))?;
            let conn = guard
                .as_mut()
                .ok_or_else(|| RouteStoreError::storage_unavailable("store has been closed"))?;
            work(conn)
        })
        .await
        .map_err(|e| RouteStoreError::storage_unavailable(format!("store task failed: {}", e)))?
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Persist a structured route under `label` and return its new id.
    pub async fn save(&self, route: StructuredRoute, label: &str) -> Result<RouteId> {
        let label = validate_label(label)?;
        let encoded = EncodedRoute::encode(&route.summary, &route.points, &route.laps)?;
        let point_count = route.points.len();

        let id = self
            .run(move |conn| insert_encoded(conn, &encoded, &label))
            .await?;

        log::info!("[RouteStore] Saved route {} ({} points)", id, point_count);
        Ok(id)
    }

    /// Persist every route in one transaction. Either all are stored or none.
    pub async fn save_all_atomic(&self, routes: Vec<(StructuredRoute, String)>) -> Result<Vec<RouteId>> {
        let encoded = routes
            .iter()
            .map(|(route, label)| -> Result<(EncodedRoute, String)> {
                Ok((
                    EncodedRoute::encode(&route.summary, &route.points, &route.laps)?,
                    validate_label(label)?,
                ))
            })
            .collect::<Result<Vec<_>>>()?;

        let ids = self
            .run(move |conn| {
                let tx = conn.transaction()?;
                let mut ids = Vec::with_capacity(encoded.len());
                for (route, label) in &encoded {
                    ids.push(insert_encoded(&tx, route, label)?);
                }
                tx.commit()?;
                Ok(ids)
            })
            .await?;

        log::info!("[RouteStore] Saved {} routes in one transaction", ids.len());
        Ok(ids)
    }

    /// Remove a route. Removing an id that does not exist is not an error.
    pub async fn delete(&self, id: RouteId) -> Result<()> {
        let removed = self
            .run(move |conn| Ok(conn.execute("DELETE FROM routes WHERE id = ?", params![id])?))
            .await?;
        if removed > 0 {
            log::info!("[RouteStore] Deleted route {}", id);
        } else {
            log::debug!("[RouteStore] Delete of missing route {} ignored", id);
        }
        Ok(())
    }

    /// Replace a route's label.
    ///
    /// Reads the route, changes the label and writes the whole row back.
    /// Concurrent renames of the same id are not serialized; the last write wins.
    pub async fn update_label(&self, id: RouteId, new_label: &str) -> Result<()> {
        let label = validate_label(new_label)?;

        let mut route = self.get_by_id(id).await?;
        route.label = label;

        let encoded = EncodedRoute::encode(&route.summary, &route.points, &route.laps)?;
        let updated = self
            .run(move |conn| update_encoded(conn, route.id, &encoded, &route.label))
            .await?;
        if updated == 0 {
            return Err(RouteStoreError::NotFound { id });
        }

        log::info!("[RouteStore] Renamed route {}", id);
        Ok(())
    }

    /// Replace a route's label only if it still equals `expected`.
    ///
    /// Returns `Ok(false)` when the stored label has changed in the meantime.
    pub async fn update_label_if(&self, id: RouteId, expected: &str, new_label: &str) -> Result<bool> {
        let label = validate_label(new_label)?;
        let expected = expected.to_string();

        let swapped = self
            .run(move |conn| {
                let tx = conn.transaction()?;
                let updated = tx.execute(
                    "UPDATE routes SET label = ?3 WHERE id = ?1 AND label = ?2",
                    params![id, expected, label],
                )?;
                if updated == 0 {
                    let exists: bool = tx.query_row(
                        "SELECT EXISTS(SELECT 1 FROM routes WHERE id = ?)",
                        params![id],
                        |row| row.get(0),
                    )?;
                    if !exists {
                        return Err(RouteStoreError::NotFound { id });
                    }
                }
                tx.commit()?;
                Ok(updated > 0)
            })
            .await?;

        if !swapped {
            log::debug!("[RouteStore] Rename of route {} skipped: label changed", id);
        }
        Ok(swapped)
    }

    /// Remove every route. Ids are not reused afterwards.
    pub async fn clear_all(&self) -> Result<()> {
        let removed = self
            .run(|conn| Ok(conn.execute("DELETE FROM routes", [])?))
            .await?;
        log::info!("[RouteStore] Cleared {} routes", removed);
        Ok(())
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Every stored route, in id order.
    pub async fn get_all(&self) -> Result<Vec<Route>> {
        self.run(|conn| {
            query_routes(
                conn,
                &format!("SELECT {} FROM routes ORDER BY id", ROUTE_COLUMNS),
                [],
            )
        })
        .await
    }

    /// One route by id, or [`RouteStoreError::NotFound`].
    pub async fn get_by_id(&self, id: RouteId) -> Result<Route> {
        let routes = self
            .run(move |conn| {
                query_routes(
                    conn,
                    &format!("SELECT {} FROM routes WHERE id = ?", ROUTE_COLUMNS),
                    params![id],
                )
            })
            .await?;
        routes.into_iter().next().ok_or_not_found(id)
    }

    /// Routes whose start time lies in `[start, end]`. Routes with no start
    /// time never match.
    pub async fn get_by_date_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<Route>> {
        if start > end {
            log::debug!("[RouteStore] Empty date range {} > {}", start, end);
            return Ok(Vec::new());
        }

        // Millisecond column narrows the scan; the exact bound is checked on the decoded summary.
        let (lo, hi) = (start.timestamp_millis(), end.timestamp_millis());
        let candidates = self
            .run(move |conn| {
                query_routes(
                    conn,
                    &format!(
                        "SELECT {} FROM routes WHERE start_time BETWEEN ?1 AND ?2 ORDER BY start_time, id",
                        ROUTE_COLUMNS
                    ),
                    params![lo, hi],
                )
            })
            .await?;

        Ok(candidates
            .into_iter()
            .filter(|route| query::starts_within(route, start, end))
            .collect())
    }

    /// Routes matching every set criterion.
    pub async fn search(&self, criteria: &SearchCriteria) -> Result<Vec<Route>> {
        let routes = self.get_all().await?;
        Ok(criteria.filter(routes))
    }

    /// Every route, newest start time first.
    pub async fn get_sorted_by_date(&self) -> Result<Vec<Route>> {
        let mut routes = self.get_all().await?;
        query::sort_newest_first(&mut routes);
        Ok(routes)
    }

    /// Number of stored routes.
    pub async fn count(&self) -> Result<u64> {
        self.run(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM routes", [], |row| row.get(0))?;
            Ok(count as u64)
        })
        .await
    }

    /// Totals over the whole collection. All zero when the store is empty.
    pub async fn get_stats(&self) -> Result<RouteStats> {
        self.run(|conn| {
            let mut stmt = conn.prepare(
                "SELECT total_distance, total_moving_time, total_calories FROM routes ORDER BY id",
            )?;
            let mut rows = stmt.query([])?;

            let mut stats = RouteStats::default();
            while let Some(row) = rows.next()? {
                stats.accumulate(row.get(0)?, row.get(1)?, row.get(2)?);
            }
            Ok(stats)
        })
        .await
    }
}

// ============================================================================
// Row Encoding
// ============================================================================

/// A route serialized into column values, ready for insert/update.
struct EncodedRoute {
    sport: String,
    start_time: Option<i64>,
    total_distance: f64,
    total_moving_time: f64,
    total_calories: Option<f64>,
    summary: String,
    points: Vec<u8>,
    laps: Vec<u8>,
    point_count: i64,
}

impl EncodedRoute {
    /// Rejects routes without points and any NaN or infinite number, which
    /// the JSON summary and snapshots cannot represent.
    fn encode(summary: &RouteSummary, points: &[RoutePoint], laps: &[RouteLap]) -> Result<Self> {
        if points.is_empty() {
            return Err(RouteStoreError::validation("route has no GPS points"));
        }
        if !summary.is_finite() {
            return Err(RouteStoreError::validation("summary has a non-finite value"));
        }
        if let Some(i) = points.iter().position(|p| !p.is_finite()) {
            return Err(RouteStoreError::validation(format!("point {} has a non-finite value", i)));
        }
        if let Some(i) = laps.iter().position(|l| !l.is_finite()) {
            return Err(RouteStoreError::validation(format!("lap {} has a non-finite value", i)));
        }

        Ok(Self {
            sport: summary.sport.clone(),
            start_time: summary.start_time.map(|t| t.timestamp_millis()),
            total_distance: summary.total_distance,
            total_moving_time: summary.total_moving_time,
            total_calories: summary.total_calories,
            summary: serde_json::to_string(summary)
                .map_err(|e| RouteStoreError::encoding(format!("summary: {}", e)))?,
            points: rmp_serde::to_vec_named(points)
                .map_err(|e| RouteStoreError::encoding(format!("points: {}", e)))?,
            laps: rmp_serde::to_vec_named(laps)
                .map_err(|e| RouteStoreError::encoding(format!("laps: {}", e)))?,
            point_count: points.len() as i64,
        })
    }
}

/// Raw column values of one `routes` row.
struct StoredRow {
    id: RouteId,
    label: String,
    summary: String,
    points: Vec<u8>,
    laps: Vec<u8>,
}

impl StoredRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            label: row.get(1)?,
            summary: row.get(2)?,
            points: row.get(3)?,
            laps: row.get(4)?,
        })
    }

    fn decode(self) -> Result<Route> {
        let summary: RouteSummary = serde_json::from_str(&self.summary)
            .map_err(|e| RouteStoreError::encoding(format!("route {} summary: {}", self.id, e)))?;
        let points: Vec<RoutePoint> = rmp_serde::from_slice(&self.points)
            .map_err(|e| RouteStoreError::encoding(format!("route {} points: {}", self.id, e)))?;
        let laps: Vec<RouteLap> = rmp_serde::from_slice(&self.laps)
            .map_err(|e| RouteStoreError::encoding(format!("route {} laps: {}", self.id, e)))?;

        Ok(Route {
            id: self.id,
            label: self.label,
            summary,
            points,
            laps,
        })
    }
}

fn open_connection(path: Option<&Path>, busy_timeout: Duration) -> Result<Connection> {
    let conn = match path {
        Some(path) => Connection::open(path),
        None => Connection::open_in_memory(),
    }
    .map_err(|e| RouteStoreError::storage_unavailable(format!("cannot open database: {}", e)))?;

    conn.busy_timeout(busy_timeout)
        .map_err(|e| RouteStoreError::storage_unavailable(format!("cannot configure database: {}", e)))?;

    Ok(conn)
}

fn validate_label(label: &str) -> Result<String> {
    let label = label.trim();
    if label.is_empty() {
        return Err(RouteStoreError::validation("label must not be empty"));
    }
    Ok(label.to_string())
}

fn insert_encoded(conn: &Connection, route: &EncodedRoute, label: &str) -> Result<RouteId> {
    conn.execute(
        "INSERT INTO routes (label, sport, start_time, total_distance, total_moving_time,
                             total_calories, summary, points, laps, point_count)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        params![
            label,
            route.sport,
            route.start_time,
            route.total_distance,
            route.total_moving_time,
            route.total_calories,
            route.summary,
            route.points,
            route.laps,
            route.point_count
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn update_encoded(conn: &Connection, id: RouteId, route: &EncodedRoute, label: &str) -> Result<usize> {
    Ok(conn.execute(
        "UPDATE routes SET label = ?2, sport = ?3, start_time = ?4, total_distance = ?5,
                           total_moving_time = ?6, total_calories = ?7, summary = ?8,
                           points = ?9, laps = ?10, point_count = ?11
         WHERE id = ?1",
        params![
            id,
            label,
            route.sport,
            route.start_time,
            route.total_distance,
            route.total_moving_time,
            route.total_calories,
            route.summary,
            route.points,
            route.laps,
            route.point_count
        ],
    )?)
}

fn query_routes<P: Params>(conn: &Connection, sql: &str, params: P) -> Result<Vec<Route>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, StoredRow::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    rows.into_iter().map(StoredRow::decode).collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_route(distance: f64, start_hour: Option<u32>) -> StructuredRoute {
        let points = (0..5)
            .map(|i| {
                let mut p = RoutePoint::new(51.5074 + i as f64 * 0.001, -0.1278 + i as f64 * 0.0005);
                p.altitude = Some(20.0 + i as f64);
                p
            })
            .collect();

        StructuredRoute {
            summary: RouteSummary {
                sport: "cycling".to_string(),
                start_time: start_hour.map(|h| Utc.with_ymd_and_hms(2024, 3, 2, h, 0, 0).unwrap()),
                total_distance: distance,
                total_moving_time: 1200.0,
                total_calories: Some(300.0),
                ..Default::default()
            },
            points,
            laps: vec![RouteLap {
                total_distance: Some(distance),
                ..Default::default()
            }],
        }
    }

    #[tokio::test]
    async fn test_create_store() {
        let store = RouteStore::in_memory().await.unwrap();
        assert!(store.is_open());
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_init_is_idempotent() {
        let store = RouteStore::in_memory().await.unwrap();
        store.save(sample_route(5.0, Some(8)), "a").await.unwrap();
        store.init().await.unwrap();
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_save_and_get() {
        let store = RouteStore::in_memory().await.unwrap();
        let route = sample_route(12.5, Some(9));
        let id = store.save(route.clone(), "Thames loop").await.unwrap();

        let stored = store.get_by_id(id).await.unwrap();
        assert_eq!(stored.id, id);
        assert_eq!(stored.label, "Thames loop");
        assert_eq!(stored.clone().into_structured(), route);
    }

    #[tokio::test]
    async fn test_save_rejects_empty_points_and_label() {
        let store = RouteStore::in_memory().await.unwrap();

        let mut empty = sample_route(1.0, None);
        empty.points.clear();
        let err = store.save(empty, "x").await.unwrap_err();
        assert!(err.is_validation());

        let err = store.save(sample_route(1.0, None), "   ").await.unwrap_err();
        assert!(err.is_validation());

        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_non_finite_route_is_rejected_and_store_stays_readable() {
        let store = RouteStore::in_memory().await.unwrap();
        store.save(sample_route(4.0, Some(7)), "good").await.unwrap();

        let mut bad = sample_route(5.0, Some(8));
        bad.summary.max_speed = f64::INFINITY;
        assert!(store.save(bad, "inf max speed").await.unwrap_err().is_validation());

        let mut bad = sample_route(5.0, Some(8));
        bad.summary.avg_heart_rate = Some(f64::NAN);
        assert!(store.save(bad, "nan heart rate").await.unwrap_err().is_validation());

        let mut bad = sample_route(5.0, Some(8));
        bad.points[2].altitude = Some(f64::NEG_INFINITY);
        assert!(store.save(bad, "bad point").await.unwrap_err().is_validation());

        let mut bad = sample_route(5.0, Some(8));
        bad.laps[0].total_distance = Some(f64::NAN);
        assert!(store
            .save_all_atomic(vec![(bad, "bad lap".to_string())])
            .await
            .unwrap_err()
            .is_validation());

        let all = store.get_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].label, "good");
        assert_eq!(store.get_sorted_by_date().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_summary_floats_round_trip_exactly() {
        let store = RouteStore::in_memory().await.unwrap();
        let mut route = sample_route(118.017_933_438_838_41, Some(6));
        route.summary.total_time = 0.1 + 0.2;
        route.summary.avg_speed = 100.0 / 3.0;
        route.summary.max_speed = std::f64::consts::PI * 17.0;
        route.summary.total_moving_time = 2.0_f64.sqrt() * 1000.0;
        route.summary.total_calories = Some(1.0 / 7.0 * 4000.0);
        route.summary.total_ascent = Some(std::f64::consts::E * 123.0);
        let id = store.save(route.clone(), "precise").await.unwrap();

        let stored = store.get_by_id(id).await.unwrap();
        assert_eq!(stored.summary.total_distance.to_bits(), route.summary.total_distance.to_bits());
        assert_eq!(stored.summary.total_time.to_bits(), (0.1_f64 + 0.2).to_bits());
        assert_eq!(stored.into_structured(), route);

        let stats = store.get_stats().await.unwrap();
        assert_eq!(stats, RouteStats::from_routes(&store.get_all().await.unwrap()));
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let store = RouteStore::in_memory().await.unwrap();
        let err = store.get_by_id(99).await.unwrap_err();
        assert!(matches!(err, RouteStoreError::NotFound { id: 99 }));
    }

    #[tokio::test]
    async fn test_delete_missing_is_noop() {
        let store = RouteStore::in_memory().await.unwrap();
        store.delete(12345).await.unwrap();
    }

    #[tokio::test]
    async fn test_ids_not_reused_after_delete_or_clear() {
        let store = RouteStore::in_memory().await.unwrap();
        let a = store.save(sample_route(1.0, None), "a").await.unwrap();
        store.delete(a).await.unwrap();
        let b = store.save(sample_route(1.0, None), "b").await.unwrap();
        assert!(b > a);

        store.clear_all().await.unwrap();
        let c = store.save(sample_route(1.0, None), "c").await.unwrap();
        assert!(c > b);
    }

    #[tokio::test]
    async fn test_update_label_visible_through_label_field() {
        let store = RouteStore::in_memory().await.unwrap();
        let id = store.save(sample_route(3.0, None), "ride.fit").await.unwrap();

        store.update_label(id, "Sunday climb").await.unwrap();

        assert_eq!(store.get_by_id(id).await.unwrap().label, "Sunday climb");
        let all = store.get_all().await.unwrap();
        assert_eq!(all[0].label, "Sunday climb");
    }

    #[tokio::test]
    async fn test_update_label_missing_is_not_found() {
        let store = RouteStore::in_memory().await.unwrap();
        let err = store.update_label(4, "x").await.unwrap_err();
        assert!(matches!(err, RouteStoreError::NotFound { id: 4 }));
    }

    #[tokio::test]
    async fn test_update_label_if() {
        let store = RouteStore::in_memory().await.unwrap();
        let id = store.save(sample_route(3.0, None), "first").await.unwrap();

        assert!(!store.update_label_if(id, "other", "second").await.unwrap());
        assert_eq!(store.get_by_id(id).await.unwrap().label, "first");

        assert!(store.update_label_if(id, "first", "second").await.unwrap());
        assert_eq!(store.get_by_id(id).await.unwrap().label, "second");

        let err = store.update_label_if(77, "a", "b").await.unwrap_err();
        assert!(matches!(err, RouteStoreError::NotFound { id: 77 }));
    }

    #[tokio::test]
    async fn test_date_range_is_closed() {
        let store = RouteStore::in_memory().await.unwrap();
        let early = store.save(sample_route(1.0, Some(6)), "early").await.unwrap();
        let mid = store.save(sample_route(1.0, Some(9)), "mid").await.unwrap();
        let late = store.save(sample_route(1.0, Some(12)), "late").await.unwrap();
        store.save(sample_route(1.0, Some(15)), "after").await.unwrap();
        store.save(sample_route(1.0, None), "undated").await.unwrap();

        let start = Utc.with_ymd_and_hms(2024, 3, 2, 6, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 3, 2, 12, 0, 0).unwrap();
        let ids: Vec<RouteId> = store
            .get_by_date_range(start, end)
            .await
            .unwrap()
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![early, mid, late]);

        assert!(store.get_by_date_range(end, start).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_date_range_respects_sub_millisecond_bounds() {
        let store = RouteStore::in_memory().await.unwrap();
        let mut route = sample_route(1.0, None);
        let t = Utc.with_ymd_and_hms(2024, 3, 2, 6, 0, 0).unwrap() + chrono::Duration::microseconds(500);
        route.summary.start_time = Some(t);
        store.save(route, "precise").await.unwrap();

        let just_after = t + chrono::Duration::microseconds(100);
        assert!(store
            .get_by_date_range(just_after, just_after + chrono::Duration::hours(1))
            .await
            .unwrap()
            .is_empty());
        assert_eq!(store.get_by_date_range(t, t).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_stats() {
        let store = RouteStore::in_memory().await.unwrap();
        assert_eq!(store.get_stats().await.unwrap(), RouteStats::default());

        store.save(sample_route(10.0, None), "a").await.unwrap();
        let mut no_calories = sample_route(2.5, None);
        no_calories.summary.total_calories = None;
        store.save(no_calories, "b").await.unwrap();

        let stats = store.get_stats().await.unwrap();
        assert_eq!(stats.total_routes, 2);
        assert_eq!(stats.total_distance, 12.5);
        assert_eq!(stats.total_moving_time, 2400.0);
        assert_eq!(stats.total_calories, 300.0);
    }

    #[tokio::test]
    async fn test_search_and_sorted() {
        let store = RouteStore::in_memory().await.unwrap();
        store.save(sample_route(50.0, Some(7)), "Long Ride").await.unwrap();
        store.save(sample_route(5.0, Some(10)), "short spin").await.unwrap();

        let hits = store
            .search(&SearchCriteria {
                name: Some("ride".to_string()),
                min_distance: Some(20.0),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].label, "Long Ride");

        let sorted = store.get_sorted_by_date().await.unwrap();
        assert_eq!(sorted[0].label, "short spin");
    }

    #[tokio::test]
    async fn test_save_all_atomic_rolls_back_on_invalid_entry() {
        let store = RouteStore::in_memory().await.unwrap();
        let mut bad = sample_route(1.0, None);
        bad.points.clear();

        let err = store
            .save_all_atomic(vec![
                (sample_route(1.0, None), "ok".to_string()),
                (bad, "bad".to_string()),
            ])
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(store.count().await.unwrap(), 0);

        let ids = store
            .save_all_atomic(vec![
                (sample_route(1.0, None), "a".to_string()),
                (sample_route(2.0, None), "b".to_string()),
            ])
            .await
            .unwrap();
        assert_eq!(ids.len(), 2);
        assert!(ids[0] < ids[1]);
    }

    #[tokio::test]
    async fn test_closed_store_is_unavailable() {
        let store = RouteStore::in_memory().await.unwrap();
        let other = store.clone();
        store.close().await.unwrap();

        assert!(!other.is_open());
        let err = other.get_all().await.unwrap_err();
        assert!(err.is_fatal());
    }
}
