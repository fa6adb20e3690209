//! Configuration management and validation.
//!
//! Describes where the order sheet lives, which row holds the header, how
//! sheet labels map onto logical fields, and how long a loaded table stays
//! cached.

use crate::error::{DashboardError, Result};
use crate::models::Field;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_SPREADSHEET: &str = "PRODUCTION_ORDER_STATUS_REPORT";
pub const DEFAULT_WORKSHEET: &str = "ORDER_SHEET";

/// Sheet labels for each logical field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnLabels {
    pub person: String,
    pub order_no: String,
    pub item: String,
    pub purity: String,
    pub order_weight: String,
    pub on_time: String,
    pub late: String,
    pub reason: String,
    pub order_date: String,
    pub due_date: String,
}

impl Default for ColumnLabels {
    fn default() -> Self {
        Self {
            person: "CONT.PERSON".to_string(),
            order_no: "ORD NO".to_string(),
            item: "ITEM NAME".to_string(),
            purity: "PURITY".to_string(),
            order_weight: "ORD WT".to_string(),
            on_time: "ON_TIME DEL".to_string(),
            late: "LATE_DEL".to_string(),
            reason: "LATE DELIVERY REASON".to_string(),
            order_date: "ORD DATE".to_string(),
            due_date: "DUE DATE".to_string(),
        }
    }
}

impl ColumnLabels {
    pub fn label(&self, field: Field) -> &str {
        match field {
            Field::Person => &self.person,
            Field::OrderNo => &self.order_no,
            Field::Item => &self.item,
            Field::Purity => &self.purity,
            Field::OrderWeight => &self.order_weight,
            Field::OnTime => &self.on_time,
            Field::Late => &self.late,
            Field::Reason => &self.reason,
            Field::OrderDate => &self.order_date,
            Field::DueDate => &self.due_date,
        }
    }

    /// Whether a normalized header label names `field`
    pub fn matches(&self, field: Field, header: &str) -> bool {
        self.label(field).trim().eq_ignore_ascii_case(header.trim())
    }
}

/// Global configuration for the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Spreadsheet (workbook) name
    pub spreadsheet: String,

    /// Worksheet holding the order rows
    pub worksheet: String,

    /// Zero-based index of the header row; rows above it are discarded
    pub header_row: usize,

    /// Service-account key used by the live source
    pub credentials_path: Option<PathBuf>,

    /// Directory holding synced workbook exports
    pub workbook_dir: Option<PathBuf>,

    /// Seconds a loaded table stays cached
    pub cache_ttl_secs: u64,

    /// Sheet labels for each logical field
    pub columns: ColumnLabels,

    /// chrono formats tried in order when parsing date cells
    pub date_formats: Vec<String>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            spreadsheet: DEFAULT_SPREADSHEET.to_string(),
            worksheet: DEFAULT_WORKSHEET.to_string(),
            header_row: 1,
            credentials_path: default_credentials_path(),
            workbook_dir: None,
            cache_ttl_secs: 600,
            columns: ColumnLabels::default(),
            date_formats: default_date_formats(),
        }
    }
}

/// Day-first formats first, then ISO-style year-first ones.
///
/// `%Y` forms only match a four-digit year (see [`crate::coercion::parse_date`]),
/// so `05-01-25` falls through to the matching `%y` form.
pub fn default_date_formats() -> Vec<String> {
    [
        "%d-%m-%Y", "%d/%m/%Y", "%d.%m.%Y", "%d-%m-%y", "%d/%m/%y", "%d.%m.%y", "%d-%b-%Y",
        "%d-%b-%y", "%d %b %Y", "%Y-%m-%d", "%Y/%m/%d",
    ]
    .iter()
    .map(|f| f.to_string())
    .collect()
}

/// `<config dir>/order-dashboard/key.json`, when a config dir exists
fn default_credentials_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("order-dashboard").join("key.json"))
}

impl DashboardConfig {
    /// Load a JSON configuration file; absent fields take their defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        debug!("Loaded configuration from {}", path.display());
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.spreadsheet.trim().is_empty() {
            return Err(DashboardError::configuration("spreadsheet name is empty"));
        }
        if self.worksheet.trim().is_empty() {
            return Err(DashboardError::configuration("worksheet name is empty"));
        }
        if self.cache_ttl_secs == 0 {
            return Err(DashboardError::configuration(
                "cache_ttl_secs must be greater than zero",
            ));
        }
        if self.date_formats.is_empty() {
            return Err(DashboardError::configuration("no date formats configured"));
        }
        Ok(())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn with_spreadsheet(mut self, spreadsheet: impl Into<String>) -> Self {
        self.spreadsheet = spreadsheet.into();
        self
    }

    pub fn with_worksheet(mut self, worksheet: impl Into<String>) -> Self {
        self.worksheet = worksheet.into();
        self
    }

    pub fn with_header_row(mut self, header_row: usize) -> Self {
        self.header_row = header_row;
        self
    }

    pub fn with_credentials(mut self, path: impl Into<PathBuf>) -> Self {
        self.credentials_path = Some(path.into());
        self
    }

    pub fn without_credentials(mut self) -> Self {
        self.credentials_path = None;
        self
    }

    pub fn with_workbook_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.workbook_dir = Some(dir.into());
        self
    }

    pub fn with_cache_ttl_secs(mut self, secs: u64) -> Self {
        self.cache_ttl_secs = secs;
        self
    }

    pub fn with_columns(mut self, columns: ColumnLabels) -> Self {
        self.columns = columns;
        self
    }
}
