//! Error types for Schemata operations.
//!
//! [`SchemataError`] wraps the per-concern errors at the crate boundary.

use std::io;

use thiserror::Error;

use schemata_core::schema::SchemaError;

use crate::store::StoreError;

/// The main error type for Schemata operations.
#[derive(Debug, Error)]
pub enum SchemataError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Configuration error: {0}")]
    Config(String),

    /// Changes applied to the canvas that the store rejected.
    #[error("{} change(s) could not be saved: {}", .0.len(), .0.join("; "))]
    Unsaved(Vec<String>),

    #[error("Export error: {0}")]
    Export(Box<dyn std::error::Error + Send + Sync>),
}

impl From<crate::export::Error> for SchemataError {
    fn from(error: crate::export::Error) -> Self {
        Self::Export(Box::new(error))
    }
}
