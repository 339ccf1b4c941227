//! Error types for the oil_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Reasons the Lifecycle Engine refuses a field update.
///
/// Every rejection is recoverable: the record is left exactly as it was
/// before the attempted edit.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum Rejection {
    /// Mileage text is not a finite, non-negative number
    #[error("mileage must be a non-negative number, got {0:?}")]
    InvalidMileage(String),

    /// Consumed mileage would go down; the caller must confirm first
    #[error("consumed mileage would decrease from {from} to {to}; confirmation required")]
    RequiresConfirmation { from: f64, to: f64 },

    /// Total minus consumed would fall below the residual floor
    #[error("remaining mileage {diff} km would fall below the -2000 km floor")]
    BelowMinimumResidual { diff: f64 },

    /// Date text is not a `YYYY-MM-DD` calendar date
    #[error("date must be formatted YYYY-MM-DD, got {0:?}")]
    InvalidDate(String),
}

/// Core error type for oil_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Field name outside the editable set
    #[error("Unknown field: {0}")]
    UnknownField(String),

    /// Oil kind other than black or gear
    #[error("Unknown oil kind: {0}")]
    UnknownOilKind(String),

    /// No record with the given key
    #[error("Record not found: {0}")]
    RecordNotFound(String),

    /// The engine refused an edit
    #[error("Update rejected: {0}")]
    Rejected(#[from] Rejection),

    /// The state file changed on disk since it was loaded
    #[error("State file was modified concurrently (loaded revision {expected}, found {found}); reload and retry")]
    Conflict { expected: u64, found: u64 },

    /// State file error
    #[error("State error: {0}")]
    State(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
