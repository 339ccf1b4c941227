#![forbid(unsafe_code)]

//! Core domain model and business logic for fleet lubricant tracking.
//!
//! This crate provides:
//! - Domain types (oil kinds, record keys, lubricant records)
//! - Lifecycle engine (edit validation, remaining-distance recompute, date cascade)
//! - Severity classification and row emphasis
//! - Fleet-wide alert scan
//! - Record store and fleet state persistence
//! - JSON/CSV export

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod engine;
pub mod severity;
pub mod alerts;
pub mod store;
pub mod state;
pub mod export;

// Re-export commonly used types
pub use error::{Error, Rejection, Result};
pub use types::*;
pub use config::Config;
pub use engine::{next_service_after, validate_and_apply};
pub use severity::{classify, row_emphasis};
pub use alerts::{scan_alerts, AlertReport};
pub use store::RecordStore;
pub use state::FleetState;
pub use export::ExportFormat;
