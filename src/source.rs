//! Record source adapters.
//!
//! A source hands back the raw sheet as a grid of text cells. The live
//! adapter reads the synced export of a named worksheet after checking the
//! service-account credentials; the fixture adapter serves an embedded
//! sample laid out exactly like the production sheet. Which one runs is
//! decided once, by [`select_source`], when the dashboard is built.

use crate::config::DashboardConfig;
use crate::error::{DashboardError, FetchError};
use crate::header::Grid;
use crate::models::Notice;
use polars::prelude::*;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Provider of raw sheet rows
pub trait RecordSource: Send + Sync {
    /// Fetch every cell of the sheet, row-major
    fn fetch(&self) -> std::result::Result<Grid, FetchError>;

    /// Stable description of what is fetched; used as the cache token
    fn describe(&self) -> String;
}

/// Embedded sample of the order sheet: a title row, the header row, then orders
#[rustfmt::skip]
const FIXTURE_ROWS: &[&[&str]] = &[
    &["PRODUCTION ORDER STATUS", "", "", "", "", "", "", "", "", "", "", ""],
    &[
        "CONT.PERSON",
        "ORD NO",
        "ORD DATE",
        "DUE DATE",
        "ITEM NAME",
        "PURITY",
        "ORD WT",
        "ON_TIME DEL",
        "LATE_DEL",
        "LATE DELIVERY REASON",
        "",
        "ORD WT",
    ],
    &["John", "PO-1001", "02-01-2025", "12-01-2025", "Chain", "22K", "1000", "800", "50", "Stone delay", "", "1000"],
    &["John", "PO-1002", "05-01-2025", "20-01-2025", "Ring", "18K", "250", "250", "0", "", "", "250"],
    &["John", "PO-1003", "", "20-01-2025", "Bangle", "22K", "600", "300", "100", "Casting rework", "", "600"],
    &["Asha", "PO-1004", "03-01-2025", "18-01-2025", "Chain", "22K", "1,200", "900", "400", "Stone delay", "", "1200"],
    &["Asha", "PO-1005", "10-01-2025", "17-01-2025", "Pendant", "18K", "150.5", "150.5", "0", "", "", "150.5"],
    &["Asha", "PO-1006", "15-01-2025", "30-01-2025", "Ring", "14K", "0", "0", "0", "Cancelled", "", "0"],
    &["Ravi", "PO-1007", "06-01-2025", "21-01-2025", "Bangle", "22K", "900", "450", "300", "Casting rework", "", "900"],
    &["Ravi", "PO-1008", "08-01-2025", "not set", "Chain", "18K", "n/a", "", "", "", "", ""],
    &["Meena", "PO-1009", "12-01-2025", "02-02-2025", "Earring", "22K", "320 g", "120", "200", "Polishing", "", "320"],
    &["Meena", "PO-1010", "20-01-2025", "05-02-2025", "Chain", "22K", "500", "0", "0", "", "", "500"],
    &["", "", "", "", "", "", "", "", "", "", "", ""],
];

/// Serves the embedded sample sheet
#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureSource;

impl RecordSource for FixtureSource {
    fn fetch(&self) -> std::result::Result<Grid, FetchError> {
        debug!("Serving {} fixture rows", FIXTURE_ROWS.len());
        Ok(FIXTURE_ROWS
            .iter()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect())
    }

    fn describe(&self) -> String {
        "fixture".to_string()
    }
}

/// Fields a service-account key must carry
#[derive(Debug, Deserialize)]
struct ServiceAccountKey {
    client_email: String,
    private_key: String,
}

/// Reads `<workbook_dir>/<spreadsheet>/<worksheet>.csv` after validating credentials
#[derive(Debug, Clone)]
pub struct WorkbookExportSource {
    credentials_path: PathBuf,
    workbook_dir: PathBuf,
    spreadsheet: String,
    worksheet: String,
}

impl WorkbookExportSource {
    pub fn new(
        credentials_path: impl Into<PathBuf>,
        workbook_dir: impl Into<PathBuf>,
        spreadsheet: impl Into<String>,
        worksheet: impl Into<String>,
    ) -> Self {
        Self {
            credentials_path: credentials_path.into(),
            workbook_dir: workbook_dir.into(),
            spreadsheet: spreadsheet.into(),
            worksheet: worksheet.into(),
        }
    }

    pub fn worksheet_path(&self) -> PathBuf {
        self.workbook_dir
            .join(&self.spreadsheet)
            .join(format!("{}.csv", self.worksheet))
    }

    fn authorize(&self) -> std::result::Result<String, FetchError> {
        let content = std::fs::read_to_string(&self.credentials_path).map_err(|e| {
            FetchError::AuthFailure {
                reason: format!(
                    "cannot read credentials {}: {}",
                    self.credentials_path.display(),
                    e
                ),
            }
        })?;

        let key: ServiceAccountKey =
            serde_json::from_str(&content).map_err(|e| FetchError::AuthFailure {
                reason: format!("malformed service account key: {}", e),
            })?;

        if key.client_email.trim().is_empty() || key.private_key.trim().is_empty() {
            return Err(FetchError::AuthFailure {
                reason: "service account key has empty client_email or private_key".to_string(),
            });
        }

        Ok(key.client_email)
    }
}

impl RecordSource for WorkbookExportSource {
    fn fetch(&self) -> std::result::Result<Grid, FetchError> {
        let account = self.authorize()?;
        debug!("Authorized as {}", account);

        let spreadsheet_dir = self.workbook_dir.join(&self.spreadsheet);
        if !spreadsheet_dir.is_dir() {
            return Err(FetchError::NotFound {
                resource: format!("spreadsheet '{}'", self.spreadsheet),
            });
        }

        let path = self.worksheet_path();
        if !path.is_file() {
            return Err(FetchError::NotFound {
                resource: format!("worksheet '{}' in '{}'", self.worksheet, self.spreadsheet),
            });
        }

        let grid = read_text_grid(&path).map_err(|e| FetchError::Unknown {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        info!("Fetched {} rows from {}", grid.len(), path.display());
        Ok(grid)
    }

    fn describe(&self) -> String {
        format!("workbook:{}/{}", self.spreadsheet, self.worksheet)
    }
}

/// Field count of the widest record, honoring quoted commas and newlines
fn widest_record(text: &str) -> usize {
    let mut widest = 0;
    let mut fields = 1;
    let mut in_quotes = false;
    let mut blank_line = true;

    for c in text.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                blank_line = false;
            }
            ',' if !in_quotes => {
                fields += 1;
                blank_line = false;
            }
            '\n' if !in_quotes => {
                if !blank_line {
                    widest = widest.max(fields);
                }
                fields = 1;
                blank_line = true;
            }
            '\r' => {}
            _ => blank_line = false,
        }
    }
    if !blank_line {
        widest = widest.max(fields);
    }
    widest
}

/// Read a header-less CSV with every cell kept as text; nulls become blanks.
///
/// The schema is as wide as the widest record, so a short title row does not
/// narrow the rows below it.
pub fn read_text_grid(path: &Path) -> PolarsResult<Grid> {
    let bytes = std::fs::read(path)?;
    let width = widest_record(&String::from_utf8_lossy(&bytes));
    if width == 0 {
        return Ok(Vec::new());
    }

    let schema = Schema::from_iter(
        (1..=width).map(|i| (PlSmallStr::from(format!("column_{}", i)), DataType::String)),
    );
    let df = CsvReadOptions::default()
        .with_has_header(false)
        .with_schema(Some(Arc::new(schema)))
        .with_parse_options(CsvParseOptions::default().with_truncate_ragged_lines(true))
        .into_reader_with_file_handle(std::io::Cursor::new(bytes))
        .finish()?;

    let columns = df
        .get_columns()
        .iter()
        .map(|column| column.str().map(|values| values.into_iter().collect::<Vec<_>>()))
        .collect::<PolarsResult<Vec<_>>>()?;

    Ok((0..df.height())
        .map(|row| {
            columns
                .iter()
                .map(|values| values[row].unwrap_or("").to_string())
                .collect()
        })
        .collect())
}

/// Pick the live source when it is configured, otherwise the fixture.
///
/// The returned notice explains a fallback to the fixture.
pub fn select_source(config: &DashboardConfig) -> (Box<dyn RecordSource>, Option<Notice>) {
    let reason = match (&config.credentials_path, &config.workbook_dir) {
        (None, _) => "no credentials configured".to_string(),
        (Some(path), _) if !path.is_file() => {
            format!("credentials not found at {}", path.display())
        }
        (Some(_), None) => "no workbook directory configured".to_string(),
        (Some(credentials), Some(workbook_dir)) => {
            info!("Using workbook export source in {}", workbook_dir.display());
            return (
                Box::new(WorkbookExportSource::new(
                    credentials,
                    workbook_dir,
                    &config.spreadsheet,
                    &config.worksheet,
                )),
                None,
            );
        }
    };

    let unavailable = DashboardError::SourceUnavailable { reason };
    warn!("{}, using fixture data", unavailable);
    (
        Box::new(FixtureSource),
        Some(Notice::SourceFallback {
            reason: unavailable.to_string(),
        }),
    )
}
