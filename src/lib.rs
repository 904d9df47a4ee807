//! # Bike Routes
//!
//! Route persistence and analytics core for recorded cycling activities.
//!
//! This library provides:
//! - Structuring of decoded activity files into canonical routes
//! - A SQLite-backed route store with range queries, search and stats
//! - JSON snapshot export/import of the whole collection
//!
//! ## Features
//!
//! - **`persistence`** - Route store, snapshot codec and ingestion pipeline (default)
//! - **`fit`** - Decode FIT files with `fitparser` (default)
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use bikeroutes::{structure_activity, DecodedActivity, DecodedRecord, DecodedSession};
//!
//! let activity = DecodedActivity {
//!     records: vec![
//!         DecodedRecord { position_lat: Some(51.5074), position_long: Some(-0.1278), ..Default::default() },
//!         DecodedRecord { position_lat: Some(51.5080), position_long: Some(-0.1290), ..Default::default() },
//!     ],
//!     sessions: vec![DecodedSession {
//!         sport: Some("cycling".to_string()),
//!         total_distance: Some(10.5),
//!         ..Default::default()
//!     }],
//!     ..Default::default()
//! };
//!
//! let route = structure_activity(&activity);
//! assert_eq!(route.points.len(), 2);
//! assert_eq!(route.summary.total_distance, 10.5);
//! assert!(route.summary.total_calories.is_none());
//! ```

// Unified error handling
pub mod error;
pub use error::{OptionExt, Result, RouteStoreError};

// Route entity and decoded activity types
pub mod types;
pub use types::{
    ActivityMetadata, DecodedActivity, DecodedLap, DecodedRecord, DecodedSession, Route, RouteId,
    RouteLap, RoutePoint, RouteSummary, StructuredRoute, UNKNOWN_SPORT,
};

// Decoded activity -> route candidate
pub mod structurer;
pub use structurer::structure_activity;

// Search criteria and collection stats
pub mod query;
pub use query::{RouteStats, SearchCriteria};

// Chart series helpers
pub mod series;
pub use series::{elevation_profile, format_hhmm, heart_rate_series, power_series};

// Store configuration
pub mod config;
pub use config::{StoreConfig, DEFAULT_LABEL};

// FIT decoding adapter
#[cfg(feature = "fit")]
pub mod fit;
#[cfg(feature = "fit")]
pub use fit::decode_fit;

// SQLite route store
#[cfg(feature = "persistence")]
pub mod persistence;
#[cfg(feature = "persistence")]
pub use persistence::RouteStore;

// Snapshot export/import
#[cfg(feature = "persistence")]
pub mod snapshot;
#[cfg(feature = "persistence")]
pub use snapshot::{export, import, import_atomic};

// Ingestion pipeline
#[cfg(feature = "persistence")]
pub mod ingest;
#[cfg(feature = "persistence")]
pub use ingest::{ingest_activity, ingest_files_with, IngestFile, IngestOutcome, IngestReport, Notice};
#[cfg(all(feature = "persistence", feature = "fit"))]
pub use ingest::ingest_fit_files;
