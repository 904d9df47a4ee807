//! Unified error handling for the route store.
//!
//! Every fallible operation in the crate returns [`RouteStoreError`]. Engine
//! failures are carried through unmodified so callers can tell a locked or
//! corrupt database apart from a missing route.

use thiserror::Error;

use crate::RouteId;

/// Unified error type for route store operations.
#[derive(Debug, Error)]
pub enum RouteStoreError {
    /// The embedded engine could not be opened, or the handle was closed.
    /// Every later operation on the same handle fails the same way.
    #[error("Storage unavailable: {message}")]
    StorageUnavailable { message: String },

    /// A lookup or rename referenced an id absent from the collection.
    #[error("Route {id} not found")]
    NotFound { id: RouteId },

    /// A decoded activity or snapshot could not be interpreted.
    #[error("Parse failure: {message}")]
    ParseFailure { message: String },

    /// A route or label failed validation before reaching storage.
    #[error("Validation failure: {message}")]
    ValidationFailure { message: String },

    /// Read/write failure reported by SQLite.
    #[cfg(feature = "persistence")]
    #[error("Engine error: {0}")]
    Engine(#[from] rusqlite::Error),

    /// Point or lap blob could not be encoded or decoded.
    #[error("Encoding error: {message}")]
    Encoding { message: String },
}

impl RouteStoreError {
    pub(crate) fn storage_unavailable(message: impl Into<String>) -> Self {
        RouteStoreError::StorageUnavailable {
            message: message.into(),
        }
    }

    pub(crate) fn parse(message: impl Into<String>) -> Self {
        RouteStoreError::ParseFailure {
            message: message.into(),
        }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        RouteStoreError::ValidationFailure {
            message: message.into(),
        }
    }

    pub(crate) fn encoding(message: impl Into<String>) -> Self {
        RouteStoreError::Encoding {
            message: message.into(),
        }
    }

    /// True when the store handle can no longer serve any operation.
    pub fn is_fatal(&self) -> bool {
        matches!(self, RouteStoreError::StorageUnavailable { .. })
    }

    /// True when input was refused before reaching storage: no usable GPS
    /// samples, an empty label or a non-finite number.
    pub fn is_validation(&self) -> bool {
        matches!(self, RouteStoreError::ValidationFailure { .. })
    }
}

/// Result type alias for route store operations.
pub type Result<T> = std::result::Result<T, RouteStoreError>;

/// Extension trait for converting Option to RouteStoreError.
pub trait OptionExt<T> {
    /// Convert Option to Result with a not-found error for `id`.
    fn ok_or_not_found(self, id: RouteId) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found(self, id: RouteId) -> Result<T> {
        self.ok_or(RouteStoreError::NotFound { id })
    }
}
