//! Error handling for dashboard loading and aggregation.
//!
//! Structural problems (missing sheets, missing columns, empty sources) are
//! surfaced through these types. Data-quality problems such as unparseable
//! numbers or dates never become errors; they are defaulted during coercion.

use thiserror::Error;

/// Failures reported by a record source adapter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    #[error("Authentication failed: {reason}")]
    AuthFailure { reason: String },

    #[error("Fetch failed: {reason}")]
    Unknown { reason: String },
}

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("Record source unavailable: {reason}")]
    SourceUnavailable { reason: String },

    #[error("Named resource not found: {resource}")]
    ResourceNotFound { resource: String },

    #[error("Required column missing after header normalization: {column}")]
    MissingColumn { column: String },

    #[error("No records remain after filtering")]
    EmptyResult,

    #[error(transparent)]
    Fetch(FetchError),

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),
}

impl From<FetchError> for DashboardError {
    fn from(error: FetchError) -> Self {
        match error {
            FetchError::NotFound { resource } => Self::ResourceNotFound { resource },
            other => Self::Fetch(other),
        }
    }
}

impl DashboardError {
    pub fn missing_column(column: impl Into<String>) -> Self {
        Self::MissingColumn {
            column: column.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;
