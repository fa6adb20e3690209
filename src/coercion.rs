//! Type coercion from normalized text cells into order records.
//!
//! Numeric cells are stripped down to digits, a decimal point and a leading
//! minus sign; anything unparseable becomes zero. Date cells are parsed with
//! the configured day-first formats; anything unparseable becomes `None`.

use crate::config::{ColumnLabels, DashboardConfig};
use crate::header::NormalizedTable;
use crate::models::{ColumnSet, Field, Notice, OrderRecord};
use chrono::{Datelike, NaiveDate};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::{debug, warn};

static NON_NUMERIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^0-9.]").expect("numeric cleaning pattern is valid")
});

/// Parse a numeric cell, defaulting to zero
pub fn clean_numeric(raw: &str) -> f64 {
    let trimmed = raw.trim();
    let digits = NON_NUMERIC.replace_all(trimmed, "");
    if digits.is_empty() {
        return 0.0;
    }

    let value = if trimmed.starts_with('-') {
        format!("-{}", digits).parse::<f64>()
    } else {
        digits.parse::<f64>()
    };

    value.ok().filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// chrono's `%Y` takes any digit count; require the year token to be four digits
fn has_full_year(text: &str, format: &str, date: NaiveDate) -> bool {
    !format.contains("%Y")
        || text
            .split(|c: char| !c.is_ascii_alphanumeric())
            .any(|token| token.len() == 4 && token.parse::<i32>() == Ok(date.year()))
}

/// Parse a date cell; blank or unrecognised values are `None`.
///
/// Formats are tried in order and the first match wins.
pub fn parse_date<S: AsRef<str>>(raw: &str, formats: &[S]) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let try_formats = |text: &str| {
        formats.iter().find_map(|f| {
            let f: &str = f.as_ref();
            NaiveDate::parse_from_str(text, f)
                .ok()
                .filter(|date| has_full_year(text, f, *date))
        })
    };

    try_formats(trimmed).or_else(|| {
        // Drop a trailing time component such as "2025-01-20 00:00:00"
        let date_part = trimmed.split([' ', 'T']).next()?;
        if date_part.len() < trimmed.len() {
            try_formats(date_part)
        } else {
            None
        }
    })
}

/// Locate every logical field in the normalized header
pub fn resolve_columns(table: &NormalizedTable, labels: &ColumnLabels) -> HashMap<Field, usize> {
    Field::ALL
        .into_iter()
        .filter_map(|field| {
            table
                .column_index(|header| labels.matches(field, header))
                .map(|index| (field, index))
        })
        .collect()
}

/// Coerce normalized rows into records, reporting each absent column.
///
/// Derived metrics are left unset; see [`crate::metrics::derive_metrics`].
pub fn coerce_table(
    table: &NormalizedTable,
    config: &DashboardConfig,
) -> (Vec<OrderRecord>, ColumnSet, Vec<Notice>) {
    let positions = resolve_columns(table, &config.columns);
    let columns: ColumnSet = positions.keys().copied().collect();

    let notices: Vec<Notice> = columns
        .missing()
        .into_iter()
        .map(|field| {
            let column = config.columns.label(field).to_string();
            warn!("Column '{}' not found in sheet header", column);
            Notice::MissingColumn {
                column,
                skipped: field
                    .dependent_outputs()
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            }
        })
        .collect();

    let records: Vec<OrderRecord> = table
        .rows
        .iter()
        .map(|row| {
            let text = |field: Field| {
                positions
                    .get(&field)
                    .and_then(|&i| row.get(i))
                    .map(|s| s.trim())
                    .unwrap_or("")
            };
            let number = |field: Field| clean_numeric(text(field));
            let date = |field: Field| parse_date(text(field), &config.date_formats);

            let reason = text(Field::Reason);
            OrderRecord {
                person: text(Field::Person).to_string(),
                order_no: text(Field::OrderNo).to_string(),
                item: text(Field::Item).to_string(),
                purity: text(Field::Purity).to_string(),
                order_weight: number(Field::OrderWeight),
                on_time: number(Field::OnTime),
                late: number(Field::Late),
                reason: (!reason.is_empty()).then(|| reason.to_string()),
                order_date: date(Field::OrderDate),
                due_date: date(Field::DueDate),
                ..Default::default()
            }
        })
        .collect();

    debug!(
        "Coerced {} records, {} of {} fields present",
        records.len(),
        Field::ALL.len() - notices.len(),
        Field::ALL.len()
    );

    (records, columns, notices)
}
