//! Date range filtering over the working record set.
//!
//! Each date column is filtered independently. A column with no valid dates
//! anywhere in the set cannot be filtered, so its window is ignored and a
//! notice is raised instead.

use crate::models::{DateField, DateWindow, DateWindows, Notice, OrderRecord};
use chrono::NaiveDate;
use tracing::{debug, warn};

/// Records passing the windows plus any informational notices
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterOutcome {
    pub records: Vec<OrderRecord>,
    pub notices: Vec<Notice>,
}

/// Earliest and latest valid date in a column
pub fn observed_range(records: &[OrderRecord], field: DateField) -> Option<DateWindow> {
    let dates = records.iter().filter_map(|r| r.date(field));
    let (min, max) = dates.fold(None, |acc: Option<(NaiveDate, NaiveDate)>, d| match acc {
        None => Some((d, d)),
        Some((lo, hi)) => Some((lo.min(d), hi.max(d))),
    })?;
    Some(DateWindow::new(min, max))
}

/// Windows spanning every observed date, the default selection
pub fn full_windows(records: &[OrderRecord]) -> DateWindows {
    DateWindows {
        order_date: observed_range(records, DateField::OrderDate),
        due_date: observed_range(records, DateField::DueDate),
    }
}

/// Keep records whose dates fall inside every active window.
///
/// The source slice is left untouched; passing records are cloned.
pub fn apply_date_windows(records: &[OrderRecord], windows: &DateWindows) -> FilterOutcome {
    let mut notices = Vec::new();
    let mut active: Vec<(DateField, DateWindow)> = Vec::new();

    for field in DateField::ALL {
        let Some(window) = windows.get(field) else {
            continue;
        };
        if records.iter().any(|r| r.date(field).is_some()) {
            active.push((field, window));
        } else {
            warn!("No valid dates in {}, filter disabled", field);
            notices.push(Notice::DateFilterDisabled { field });
        }
    }

    let filtered: Vec<OrderRecord> = records
        .iter()
        .filter(|record| {
            active.iter().all(|(field, window)| {
                record
                    .date(*field)
                    .is_some_and(|date| window.contains(date))
            })
        })
        .cloned()
        .collect();

    debug!(
        "Date filter kept {} of {} records ({} active windows)",
        filtered.len(),
        records.len(),
        active.len()
    );

    if filtered.is_empty() && !records.is_empty() {
        notices.push(Notice::EmptyResult);
    }

    FilterOutcome {
        records: filtered,
        notices,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(order_no: &str, order: Option<NaiveDate>, due: Option<NaiveDate>) -> OrderRecord {
        OrderRecord {
            order_no: order_no.to_string(),
            order_date: order,
            due_date: due,
            ..Default::default()
        }
    }

    fn sample() -> Vec<OrderRecord> {
        vec![
            record("1", Some(date(2025, 1, 1)), Some(date(2025, 1, 10))),
            record("2", Some(date(2025, 1, 15)), Some(date(2025, 1, 31))),
            record("3", Some(date(2025, 2, 3)), Some(date(2025, 2, 20))),
        ]
    }

    fn order_numbers(outcome: &FilterOutcome) -> Vec<&str> {
        outcome.records.iter().map(|r| r.order_no.as_str()).collect()
    }

    #[test]
    fn test_full_range_is_identity() {
        let records = sample();

        let outcome = apply_date_windows(&records, &full_windows(&records));

        assert_eq!(outcome.records, records);
        assert!(outcome.notices.is_empty());
    }

    #[test]
    fn test_end_day_is_inclusive() {
        let records = sample();
        let windows =
            DateWindows::default().with_due_date(DateWindow::new(date(2025, 1, 1), date(2025, 1, 31)));

        let outcome = apply_date_windows(&records, &windows);

        assert_eq!(order_numbers(&outcome), vec!["1", "2"]);
    }

    #[test]
    fn test_windows_combine() {
        let records = sample();
        let windows = DateWindows::default()
            .with_order_date(DateWindow::new(date(2025, 1, 10), date(2025, 2, 28)))
            .with_due_date(DateWindow::new(date(2025, 1, 1), date(2025, 1, 31)));

        let outcome = apply_date_windows(&records, &windows);

        assert_eq!(order_numbers(&outcome), vec!["2"]);
    }

    #[test]
    fn test_null_dates_fail_active_window() {
        let mut records = sample();
        records.push(record("4", None, Some(date(2025, 1, 5))));
        let windows = DateWindows::default()
            .with_order_date(DateWindow::new(date(2024, 1, 1), date(2026, 1, 1)));

        let outcome = apply_date_windows(&records, &windows);

        assert_eq!(order_numbers(&outcome), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_column_without_dates_disables_filter() {
        let records = vec![record("1", None, None), record("2", None, None)];
        let windows = DateWindows::default()
            .with_order_date(DateWindow::new(date(2025, 1, 1), date(2025, 1, 2)));

        let outcome = apply_date_windows(&records, &windows);

        assert_eq!(outcome.records.len(), 2);
        assert_eq!(
            outcome.notices,
            vec![Notice::DateFilterDisabled {
                field: DateField::OrderDate
            }]
        );
        assert_eq!(observed_range(&records, DateField::OrderDate), None);
    }

    #[test]
    fn test_empty_result_notice() {
        let records = sample();
        let windows = DateWindows::default()
            .with_order_date(DateWindow::new(date(2030, 1, 1), date(2030, 12, 31)));

        let outcome = apply_date_windows(&records, &windows);

        assert!(outcome.records.is_empty());
        assert_eq!(outcome.notices, vec![Notice::EmptyResult]);
    }

    #[test]
    fn test_observed_range() {
        let records = sample();

        assert_eq!(
            observed_range(&records, DateField::DueDate),
            Some(DateWindow::new(date(2025, 1, 10), date(2025, 2, 20)))
        );
    }
}
