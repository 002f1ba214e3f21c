//! Domain layer for the upgrade supervisor
//!
//! This module contains the upgrade model, the run verdict types, and the
//! ports through which external collaborators are consumed.

pub mod errors;
pub mod models;
pub mod ports;

// Re-export error types for convenient access
pub use errors::{BackupError, MarkerError, RunError, SupervisorError};
