//! Grouping and aggregation over filtered order records.
//!
//! Group and grand-total late percentages are ratios of summed weights.
//! Every output that depends on an absent column returns
//! [`DashboardError::MissingColumn`] rather than a zero-filled result.

use crate::error::{DashboardError, Result};
use crate::metrics::{late_percent, lead_time_days, pending};
use crate::models::{
    ColumnSet, Field, GroupDimension, GroupSummary, LeadTimeSummary, OrderLine, OrderRecord,
    PersonDrilldown, ReasonCount, RemarkOrders, Totals,
};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::debug;

fn require(columns: &ColumnSet, fields: &[Field]) -> Result<()> {
    match columns.first_missing(fields) {
        Some(field) => Err(DashboardError::missing_column(field.key())),
        None => Ok(()),
    }
}

/// Sum the weights of `records` without checking column presence
pub fn sum_totals<'a>(records: impl IntoIterator<Item = &'a OrderRecord>) -> Totals {
    let mut totals = records.into_iter().fold(Totals::default(), |mut acc, r| {
        acc.record_count += 1;
        acc.order_weight += r.order_weight;
        acc.on_time += r.on_time;
        acc.late += r.late;
        acc.pending += pending(r.order_weight, r.on_time, r.late);
        acc
    });
    totals.late_percent = late_percent(totals.late, totals.order_weight);
    totals
}

/// Totals over every record, independent of any grouping
pub fn grand_total(records: &[OrderRecord], columns: &ColumnSet) -> Result<Totals> {
    require(columns, &Field::WEIGHTS)?;
    Ok(sum_totals(records))
}

fn group_records(
    records: &[OrderRecord],
    dimension: GroupDimension,
) -> BTreeMap<&str, Vec<&OrderRecord>> {
    let mut groups: BTreeMap<&str, Vec<&OrderRecord>> = BTreeMap::new();
    for record in records {
        if let Some(key) = record.group_key(dimension) {
            groups.entry(key).or_default().push(record);
        }
    }
    groups
}

/// Per-group totals sorted ascending by key.
///
/// Blank reasons form no group; blank persons, items and purities do.
pub fn summarize_by(
    records: &[OrderRecord],
    columns: &ColumnSet,
    dimension: GroupDimension,
) -> Result<Vec<GroupSummary>> {
    require(columns, &[dimension.field()])?;
    require(columns, &Field::WEIGHTS)?;

    let summaries: Vec<GroupSummary> = group_records(records, dimension)
        .into_iter()
        .map(|(key, members)| GroupSummary {
            key: key.to_string(),
            totals: sum_totals(members),
        })
        .collect();

    debug!(
        "Summarized {} records into {} {} groups",
        records.len(),
        summaries.len(),
        dimension
    );
    Ok(summaries)
}

/// Lead-time statistics per item, longest mean first.
///
/// Only records with a known lead time contribute; items without one sort last.
pub fn lead_time_by_item(
    records: &[OrderRecord],
    columns: &ColumnSet,
) -> Result<Vec<LeadTimeSummary>> {
    require(columns, &[Field::Item, Field::OrderDate, Field::DueDate])?;

    let mut summaries: Vec<LeadTimeSummary> = group_records(records, GroupDimension::Item)
        .into_iter()
        .map(|(item, members)| {
            let days: Vec<i64> = members
                .iter()
                .filter_map(|r| lead_time_days(r.order_date, r.due_date))
                .collect();
            let mean_days = (!days.is_empty())
                .then(|| days.iter().sum::<i64>() as f64 / days.len() as f64);
            LeadTimeSummary {
                item: item.to_string(),
                orders_with_lead_time: days.len(),
                min_days: days.iter().min().copied(),
                max_days: days.iter().max().copied(),
                mean_days,
            }
        })
        .collect();

    summaries.sort_by(|a, b| match (a.mean_days, b.mean_days) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });

    Ok(summaries)
}

/// Frequency of each non-blank delivery reason, most frequent first
pub fn reason_counts(records: &[OrderRecord], columns: &ColumnSet) -> Result<Vec<ReasonCount>> {
    require(columns, &[Field::Reason])?;

    let mut counts: Vec<ReasonCount> = group_records(records, GroupDimension::Reason)
        .into_iter()
        .map(|(reason, members)| ReasonCount {
            reason: reason.to_string(),
            count: members.len(),
        })
        .collect();

    // Stable sort keeps reasons with equal counts in ascending order
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    Ok(counts)
}

/// Person -> remark -> order lines, with totals over all of a person's records
pub fn person_drilldown(
    records: &[OrderRecord],
    columns: &ColumnSet,
) -> Result<Vec<PersonDrilldown>> {
    require(columns, &[Field::Person, Field::OrderNo, Field::Reason])?;
    require(columns, &Field::WEIGHTS)?;

    let drilldown = group_records(records, GroupDimension::Person)
        .into_iter()
        .map(|(person, members)| {
            let mut by_reason: BTreeMap<&str, Vec<OrderLine>> = BTreeMap::new();
            for record in members.iter().copied() {
                if let Some(reason) = record.reason.as_deref() {
                    by_reason.entry(reason).or_default().push(OrderLine {
                        order_no: record.order_no.clone(),
                        order_weight: record.order_weight,
                        on_time: record.on_time,
                        late: record.late,
                    });
                }
            }

            PersonDrilldown {
                person: person.to_string(),
                remarks: by_reason
                    .into_iter()
                    .map(|(reason, orders)| RemarkOrders {
                        reason: reason.to_string(),
                        orders,
                    })
                    .collect(),
                totals: sum_totals(members),
            }
        })
        .collect();

    Ok(drilldown)
}
