//! Order Dashboard Library
//!
//! Loads the production order sheet, cleans it and computes the numbers the
//! order-tracking dashboard shows.
//!
//! This library provides tools for:
//! - Fetching the raw sheet from a synced workbook export, or a built-in sample
//! - Normalizing a messy header row (blank columns, duplicate labels, ragged rows)
//! - Coercing weights and dates leniently, never failing on bad cells
//! - Deriving pending weight, late percentage and lead time per order
//! - Filtering by order-date and due-date windows
//! - Summarising by person, remark, item and purity, plus grand totals
//! - Handing tables to polars for CSV or Parquet export

pub mod aggregate;
pub mod cache;
pub mod cli;
pub mod coercion;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod filter;
pub mod frame;
pub mod header;
pub mod metrics;
pub mod models;
pub mod source;

// Re-export commonly used types
pub use config::{ColumnLabels, DashboardConfig};
pub use dashboard::{Dashboard, DashboardView};
pub use error::{DashboardError, FetchError, Result};
pub use frame::ExportFormat;
pub use models::{
    DateField, DateWindow, DateWindows, GroupDimension, GroupSummary, Notice, OrderRecord, Totals,
};
pub use source::{FixtureSource, RecordSource, WorkbookExportSource};
