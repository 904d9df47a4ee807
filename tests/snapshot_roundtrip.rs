//! Snapshot export/import integration tests.
//!
//! Run with: `cargo test --test snapshot_roundtrip`

use bikeroutes::{
    export, import, import_atomic, snapshot::parse_snapshot, RouteLap, RoutePoint, RouteStore,
    RouteStoreError, RouteSummary, StructuredRoute,
};
use chrono::{TimeZone, Utc};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn route(distance: f64, day: u32) -> StructuredRoute {
    let points = (0..4)
        .map(|i| {
            let mut p = RoutePoint::new(45.9 + i as f64 * 0.01, 6.1);
            p.altitude = Some(400.0 + i as f64 * 10.0);
            p.power = if i % 2 == 0 { Some(200.0) } else { None };
            p.timestamp = Some(Utc.with_ymd_and_hms(2024, 8, day, 7, i, 0).unwrap());
            p
        })
        .collect();

    StructuredRoute {
        summary: RouteSummary {
            sport: "cycling".to_string(),
            start_time: Some(Utc.with_ymd_and_hms(2024, 8, day, 7, 0, 0).unwrap()),
            total_distance: distance,
            total_time: 3900.0,
            total_moving_time: 3600.0,
            avg_speed: 25.0,
            max_speed: 61.2,
            avg_heart_rate: Some(142.0),
            total_ascent: Some(1100.0),
            ..Default::default()
        },
        points,
        laps: vec![
            RouteLap {
                total_distance: Some(distance / 2.0),
                avg_power: Some(215.0),
                ..Default::default()
            },
            RouteLap::default(),
        ],
    }
}

#[tokio::test]
async fn test_export_import_into_empty_store() {
    init_logging();
    let source = RouteStore::in_memory().await.unwrap();
    source.save(route(42.0, 1), "Annecy loop").await.unwrap();
    source.save(route(88.5, 2), "Col de la Forclaz").await.unwrap();
    source.save(route(12.0, 3), "Recovery").await.unwrap();

    let snapshot = export(&source).await.unwrap();
    assert!(snapshot.contains('\n'), "snapshot should be indented");
    assert!(snapshot.contains("\"totalDistance\""));

    let destination = RouteStore::in_memory().await.unwrap();
    // Offset the destination's id sequence so the ids cannot line up by accident.
    let placeholder = destination.save(route(1.0, 4), "placeholder").await.unwrap();
    destination.delete(placeholder).await.unwrap();

    let count = import(&destination, &snapshot).await.unwrap();
    assert_eq!(count, 3);

    let original = source.get_all().await.unwrap();
    let restored = destination.get_all().await.unwrap();
    assert_eq!(restored.len(), original.len());

    for (a, b) in original.iter().zip(restored.iter()) {
        assert_ne!(a.id, b.id);
        assert_eq!(a.label, b.label);
        assert_eq!(a.summary, b.summary);
        assert_eq!(a.points, b.points);
        assert_eq!(a.laps, b.laps);
    }
}

#[tokio::test]
async fn test_full_precision_values_survive_export_import() {
    let source = RouteStore::in_memory().await.unwrap();
    for i in 0..8u32 {
        let mut r = route(118.017_933_438_838_41 * (i as f64 + 1.0) / 3.0, i + 1);
        r.summary.total_time = 0.1 + 0.2 + i as f64;
        r.summary.avg_speed = r.summary.total_distance / r.summary.total_time * 3600.0;
        r.summary.total_calories = Some(std::f64::consts::E * 311.0 / (i as f64 + 1.0));
        r.points[1].altitude = Some(1.0 / 3.0 + i as f64);
        r.laps[0].avg_speed = Some(std::f64::consts::PI * 9.0);
        source.save(r, &format!("precise-{}", i)).await.unwrap();
    }

    let snapshot = export(&source).await.unwrap();
    let destination = RouteStore::in_memory().await.unwrap();
    assert_eq!(import(&destination, &snapshot).await.unwrap(), 8);

    let original = source.get_all().await.unwrap();
    let restored = destination.get_all().await.unwrap();
    for (a, b) in original.iter().zip(restored.iter()) {
        assert_eq!(a.summary, b.summary);
        assert_eq!(a.points, b.points);
        assert_eq!(a.laps, b.laps);
    }
    assert_eq!(
        source.get_stats().await.unwrap(),
        destination.get_stats().await.unwrap()
    );
}

#[tokio::test]
async fn test_snapshot_carries_ids() {
    let store = RouteStore::in_memory().await.unwrap();
    let id = store.save(route(5.0, 1), "one").await.unwrap();

    let snapshot = export(&store).await.unwrap();
    let json: serde_json::Value = serde_json::from_str(&snapshot).unwrap();
    assert_eq!(json[0]["id"], id);
    assert_eq!(json[0]["label"], "one");
    assert_eq!(json[0]["points"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_import_into_same_store_assigns_fresh_ids() {
    let store = RouteStore::in_memory().await.unwrap();
    let first = store.save(route(5.0, 1), "one").await.unwrap();

    let snapshot = export(&store).await.unwrap();
    assert_eq!(import(&store, &snapshot).await.unwrap(), 1);

    let all = store.get_all().await.unwrap();
    assert_eq!(all.len(), 2);
    assert!(all[1].id > first);
}

const SNAPSHOT_WITH_BAD_SECOND_RECORD: &str = r#"[
    {"id": 1, "label": "first", "summary": {"sport": "cycling", "totalDistance": 10.0},
     "points": [{"lat": 45.0, "lng": 6.0}], "laps": []},
    {"id": 2, "label": "no gps", "summary": {"sport": "cycling"}, "points": [], "laps": []},
    {"id": 3, "label": "third", "summary": {"sport": "cycling"},
     "points": [{"lat": 45.1, "lng": 6.1}], "laps": []}
]"#;

#[tokio::test]
async fn test_import_keeps_records_committed_before_a_failure() {
    init_logging();
    let store = RouteStore::in_memory().await.unwrap();

    let err = import(&store, SNAPSHOT_WITH_BAD_SECOND_RECORD).await.unwrap_err();
    assert!(err.is_validation());

    let all = store.get_all().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].label, "first");
}

#[tokio::test]
async fn test_import_atomic_commits_nothing_on_failure() {
    let store = RouteStore::in_memory().await.unwrap();

    let err = import_atomic(&store, SNAPSHOT_WITH_BAD_SECOND_RECORD).await.unwrap_err();
    assert!(err.is_validation());
    assert_eq!(store.count().await.unwrap(), 0);

    let source = RouteStore::in_memory().await.unwrap();
    source.save(route(30.0, 5), "a").await.unwrap();
    source.save(route(31.0, 6), "b").await.unwrap();
    let snapshot = export(&source).await.unwrap();

    assert_eq!(import_atomic(&store, &snapshot).await.unwrap(), 2);
    assert_eq!(store.count().await.unwrap(), 2);
}

#[tokio::test]
async fn test_unparseable_snapshot_aborts_whole_import() {
    let store = RouteStore::in_memory().await.unwrap();
    let truncated = &SNAPSHOT_WITH_BAD_SECOND_RECORD[..60];

    let err = import(&store, truncated).await.unwrap_err();
    assert!(matches!(err, RouteStoreError::ParseFailure { .. }));
    assert_eq!(store.count().await.unwrap(), 0);
}

#[test]
fn test_legacy_name_field_is_read_as_label() {
    let records = parse_snapshot(r#"[{"name": "Old export", "points": [{"lat": 1, "lng": 2}]}]"#).unwrap();
    assert_eq!(records[0].label.as_deref(), Some("Old export"));
}
