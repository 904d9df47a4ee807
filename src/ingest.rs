//! Ingestion pipeline: decoded activity → validated route → store.
//!
//! Files are processed one after another. A file that fails to decode or
//! has no GPS samples is reported on its own and does not stop the batch.

use serde::{Deserialize, Serialize};

use crate::error::{Result, RouteStoreError};
use crate::persistence::RouteStore;
use crate::structurer::structure_activity;
use crate::types::{DecodedActivity, RouteId, StructuredRoute};

/// A raw activity file handed over by the file picker.
#[derive(Debug, Clone)]
pub struct IngestFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl IngestFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

/// What happened to one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum IngestOutcome {
    /// Stored under `id`.
    Saved { id: RouteId, label: String },
    /// Decoded fine but had no GPS samples; nothing was stored.
    Empty,
    /// Decoding or storage failed.
    Failed { message: String },
}

/// Severity of the notification shown for an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Notice {
    Success,
    Warning,
    Error,
}

/// Outcome of ingesting one named file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    pub file_name: String,
    pub outcome: IngestOutcome,
}

impl IngestReport {
    /// Notification severity and message for the presentation layer.
    pub fn notification(&self) -> (Notice, String) {
        match &self.outcome {
            IngestOutcome::Saved { label, .. } => (Notice::Success, format!("Saved \"{}\"", label)),
            IngestOutcome::Empty => (
                Notice::Warning,
                format!("{}: no GPS data found, file skipped", self.file_name),
            ),
            IngestOutcome::Failed { message } => {
                (Notice::Error, format!("{}: {}", self.file_name, message))
            }
        }
    }
}

/// Derive a display label: the file name, else the start time, else the
/// configured default.
pub fn derive_label(store: &RouteStore, route: &StructuredRoute, file_name: &str) -> String {
    let file_name = file_name.trim();
    if !file_name.is_empty() {
        return file_name.to_string();
    }
    let from_time = route
        .summary
        .start_time
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string());
    store.config().label_or_default(from_time.as_deref())
}

/// Structure, validate and save one decoded activity.
///
/// Returns [`RouteStoreError::ValidationFailure`] without touching the store
/// when the activity has no GPS samples.
pub async fn ingest_activity(
    store: &RouteStore,
    activity: &DecodedActivity,
    file_name: &str,
) -> Result<RouteId> {
    let (id, _) = save_structured(store, structure_activity(activity), file_name).await?;
    Ok(id)
}

async fn save_structured(
    store: &RouteStore,
    route: StructuredRoute,
    file_name: &str,
) -> Result<(RouteId, String)> {
    if route.is_empty() {
        return Err(RouteStoreError::validation(format!(
            "{} has no GPS samples",
            if file_name.trim().is_empty() { "activity" } else { file_name }
        )));
    }

    let label = derive_label(store, &route, file_name);
    let id = store.save(route, &label).await?;
    Ok((id, label))
}

/// Ingest a batch of files with a caller-supplied decoder.
pub async fn ingest_files_with<D>(store: &RouteStore, files: Vec<IngestFile>, decode: D) -> Vec<IngestReport>
where
    D: Fn(&[u8]) -> Result<DecodedActivity>,
{
    let mut reports = Vec::with_capacity(files.len());

    for file in files {
        let outcome = match decode(&file.bytes) {
            Ok(activity) => {
                let route = structure_activity(&activity);
                if route.is_empty() {
                    IngestOutcome::Empty
                } else {
                    match save_structured(store, route, &file.name).await {
                        Ok((id, label)) => IngestOutcome::Saved { id, label },
                        Err(e) => IngestOutcome::Failed {
                            message: e.to_string(),
                        },
                    }
                }
            }
            Err(e) => IngestOutcome::Failed {
                message: e.to_string(),
            },
        };

        match &outcome {
            IngestOutcome::Saved { id, .. } => log::info!("[Ingest] {} -> route {}", file.name, id),
            IngestOutcome::Empty => log::warn!("[Ingest] {} has no GPS samples, skipped", file.name),
            IngestOutcome::Failed { message } => log::warn!("[Ingest] {} failed: {}", file.name, message),
        }

        reports.push(IngestReport {
            file_name: file.name,
            outcome,
        });
    }

    reports
}

/// Ingest a batch of FIT files.
#[cfg(feature = "fit")]
pub async fn ingest_fit_files(store: &RouteStore, files: Vec<IngestFile>) -> Vec<IngestReport> {
    ingest_files_with(store, files, crate::fit::decode_fit).await
}
