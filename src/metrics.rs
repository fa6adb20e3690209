//! Derived per-record metrics: pending weight, late percentage and lead time.

use crate::models::{ColumnSet, Field, OrderRecord};
use chrono::NaiveDate;
use tracing::debug;

/// Undelivered weight, floored at zero so over-deliveries never go negative
pub fn pending(order_weight: f64, on_time: f64, late: f64) -> f64 {
    (order_weight - on_time - late).max(0.0)
}

/// Late weight as a percentage of order weight; zero for zero-weight orders
pub fn late_percent(late: f64, order_weight: f64) -> f64 {
    if order_weight > 0.0 {
        late / order_weight * 100.0
    } else {
        0.0
    }
}

/// Whole days from order to due date; unknown when either date is missing
pub fn lead_time_days(order_date: Option<NaiveDate>, due_date: Option<NaiveDate>) -> Option<i64> {
    Some((due_date? - order_date?).num_days())
}

/// Fill the derived fields of every record.
///
/// A metric whose source columns are absent stays `None` for all records.
pub fn derive_metrics(records: &mut [OrderRecord], columns: &ColumnSet) {
    let weights = columns.has_all(&Field::WEIGHTS);
    let dates = columns.has_all(&[Field::OrderDate, Field::DueDate]);

    for record in records.iter_mut() {
        if weights {
            record.pending = Some(pending(record.order_weight, record.on_time, record.late));
            record.late_percent = Some(late_percent(record.late, record.order_weight));
        }
        if dates {
            record.lead_time_days = lead_time_days(record.order_date, record.due_date);
        }
    }

    debug!(
        "Derived metrics for {} records (weights: {}, lead time: {})",
        records.len(),
        weights,
        dates
    );
}
