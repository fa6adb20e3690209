//! Command-line interface components.

use crate::coercion::parse_date;
use crate::config::DashboardConfig;
use crate::error::{DashboardError, Result};
use crate::frame::ExportFormat;
use crate::models::{DateField, DateWindow, DateWindows};
use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "order_dashboard")]
#[command(about = "Summarise the production order sheet: pending weight, late deliveries and lead times")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Args {
    /// JSON configuration file; command-line flags override its values
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Service-account key for the live workbook source
    #[arg(long, value_name = "FILE", env = "ORDER_DASHBOARD_CREDENTIALS")]
    pub credentials: Option<PathBuf>,

    /// Directory holding synced workbook exports (<dir>/<spreadsheet>/<worksheet>.csv)
    #[arg(long, value_name = "DIR", env = "ORDER_DASHBOARD_WORKBOOK_DIR")]
    pub workbook_dir: Option<PathBuf>,

    /// Spreadsheet name
    #[arg(long)]
    pub spreadsheet: Option<String>,

    /// Worksheet name
    #[arg(long)]
    pub worksheet: Option<String>,

    /// Zero-based row holding the column labels
    #[arg(long, value_name = "N")]
    pub header_row: Option<usize>,

    /// Earliest order date to include (YYYY-MM-DD or DD-MM-YYYY)
    #[arg(long, value_name = "DATE", value_parser = parse_cli_date)]
    pub order_from: Option<NaiveDate>,

    /// Latest order date to include, inclusive
    #[arg(long, value_name = "DATE", value_parser = parse_cli_date)]
    pub order_to: Option<NaiveDate>,

    /// Earliest due date to include
    #[arg(long, value_name = "DATE", value_parser = parse_cli_date)]
    pub due_from: Option<NaiveDate>,

    /// Latest due date to include, inclusive
    #[arg(long, value_name = "DATE", value_parser = parse_cli_date)]
    pub due_to: Option<NaiveDate>,

    /// Write every dashboard table into this directory
    #[arg(long, value_name = "DIR")]
    pub export: Option<PathBuf>,

    /// Format of exported tables
    #[arg(long, value_enum, default_value_t = ExportFormat::Csv)]
    pub export_format: ExportFormat,

    /// Print the dashboard view as JSON instead of tables
    #[arg(long)]
    pub json: bool,

    /// Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Parse a date given on the command line
pub fn parse_cli_date(value: &str) -> std::result::Result<NaiveDate, String> {
    let value = value.trim();
    parse_date(value, &["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y"])
        .ok_or_else(|| format!("'{}' is not a date (expected YYYY-MM-DD or DD-MM-YYYY)", value))
}

/// Combine an optional bound pair with the observed range of a column.
///
/// No bounds leaves the column unfiltered, so records with unknown dates stay
/// in the view. A single bound takes the other end from the observed range.
fn resolve_window(
    observed: Option<DateWindow>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Option<DateWindow> {
    match (from, to, observed) {
        (None, None, _) => None,
        (Some(start), Some(end), _) => Some(DateWindow::new(start, end)),
        (Some(start), None, Some(o)) => Some(DateWindow::new(start, o.end)),
        (None, Some(end), Some(o)) => Some(DateWindow::new(o.start, end)),
        (_, _, None) => None,
    }
}

impl Args {
    /// Determine the appropriate log level based on verbosity flags
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }

    /// Default `EnvFilter` directive when `RUST_LOG` is unset
    pub fn log_directive(&self) -> String {
        format!("order_dashboard={}", self.get_log_level())
    }

    /// Quiet and JSON runs log compactly without timestamps
    pub fn compact_logs(&self) -> bool {
        self.quiet || self.json
    }

    /// Check if we should show the progress spinner
    pub fn show_progress(&self) -> bool {
        !self.quiet && !self.json
    }

    /// Load configuration: file (or defaults), then flags
    pub fn load_config(&self) -> Result<DashboardConfig> {
        let mut config = match &self.config {
            Some(path) => DashboardConfig::from_json_file(path)?,
            None => DashboardConfig::default(),
        };

        if let Some(path) = &self.credentials {
            config = config.with_credentials(path);
        }
        if let Some(dir) = &self.workbook_dir {
            config = config.with_workbook_dir(dir);
        }
        if let Some(spreadsheet) = &self.spreadsheet {
            config = config.with_spreadsheet(spreadsheet);
        }
        if let Some(worksheet) = &self.worksheet {
            config = config.with_worksheet(worksheet);
        }
        if let Some(header_row) = self.header_row {
            config = config.with_header_row(header_row);
        }

        config.validate()?;
        Ok(config)
    }

    /// Selected windows; a half-open pair is closed with the observed range
    pub fn date_windows(&self, observed: &DateWindows) -> Result<DateWindows> {
        let bounds = [
            (DateField::OrderDate, self.order_from, self.order_to),
            (DateField::DueDate, self.due_from, self.due_to),
        ];

        let mut windows = DateWindows::default();
        for (field, from, to) in bounds {
            let window = resolve_window(observed.get(field), from, to);
            if let Some(w) = window.filter(|w| w.start > w.end) {
                return Err(DashboardError::configuration(format!(
                    "{} window starts {} after it ends {}",
                    field, w.start, w.end
                )));
            }
            match field {
                DateField::OrderDate => windows.order_date = window,
                DateField::DueDate => windows.due_date = window,
            }
        }
        Ok(windows)
    }
}
