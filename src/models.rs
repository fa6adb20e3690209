//! Core data structures for order tracking records and their summaries.
//!
//! Defines the logical sheet fields, cleaned order records, group summaries,
//! date windows and the informational notices produced alongside results.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Logical columns the dashboard reads from the order sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Field {
    Person,
    OrderNo,
    Item,
    Purity,
    OrderWeight,
    OnTime,
    Late,
    Reason,
    OrderDate,
    DueDate,
}

impl Field {
    pub const ALL: [Field; 10] = [
        Field::Person,
        Field::OrderNo,
        Field::Item,
        Field::Purity,
        Field::OrderWeight,
        Field::OnTime,
        Field::Late,
        Field::Reason,
        Field::OrderDate,
        Field::DueDate,
    ];

    /// Fields needed for pending, late percentage and every weight summary
    pub const WEIGHTS: [Field; 3] = [Field::OrderWeight, Field::OnTime, Field::Late];

    /// Column name used in exported frames
    pub fn key(&self) -> &'static str {
        match self {
            Field::Person => "person",
            Field::OrderNo => "order_no",
            Field::Item => "item",
            Field::Purity => "purity",
            Field::OrderWeight => "order_weight",
            Field::OnTime => "on_time",
            Field::Late => "late",
            Field::Reason => "reason",
            Field::OrderDate => "order_date",
            Field::DueDate => "due_date",
        }
    }

    pub fn is_numeric(&self) -> bool {
        Self::WEIGHTS.contains(self)
    }

    pub fn is_date(&self) -> bool {
        matches!(self, Field::OrderDate | Field::DueDate)
    }

    /// Outputs that cannot be produced when this field is absent
    pub fn dependent_outputs(&self) -> &'static [&'static str] {
        match self {
            Field::Person => &["person summary", "person drilldown"],
            Field::OrderNo => &["person drilldown order numbers"],
            Field::Item => &["item summary", "lead time by item"],
            Field::Purity => &["purity summary"],
            Field::OrderWeight | Field::OnTime | Field::Late => &[
                "pending",
                "late percent",
                "group summaries",
                "grand total",
                "person drilldown",
            ],
            Field::Reason => &["reason summary", "reason counts", "person drilldown"],
            Field::OrderDate | Field::DueDate => &["lead time", "date filter"],
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Set of logical fields found in the normalized header
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSet {
    present: BTreeSet<Field>,
}

impl ColumnSet {
    pub fn all() -> Self {
        Self {
            present: Field::ALL.into_iter().collect(),
        }
    }

    pub fn insert(&mut self, field: Field) {
        self.present.insert(field);
    }

    pub fn has(&self, field: Field) -> bool {
        self.present.contains(&field)
    }

    pub fn has_all(&self, fields: &[Field]) -> bool {
        fields.iter().all(|f| self.has(*f))
    }

    /// First field of `fields` that is absent
    pub fn first_missing(&self, fields: &[Field]) -> Option<Field> {
        fields.iter().copied().find(|f| !self.has(*f))
    }

    pub fn missing(&self) -> Vec<Field> {
        Field::ALL.into_iter().filter(|f| !self.has(*f)).collect()
    }
}

impl FromIterator<Field> for ColumnSet {
    fn from_iter<I: IntoIterator<Item = Field>>(iter: I) -> Self {
        Self {
            present: iter.into_iter().collect(),
        }
    }
}

/// One cleaned order row with its derived metrics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub person: String,
    pub order_no: String,
    pub item: String,
    pub purity: String,
    pub order_weight: f64,
    pub on_time: f64,
    pub late: f64,
    /// Blank reasons are `None`
    pub reason: Option<String>,
    pub order_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub pending: Option<f64>,
    pub late_percent: Option<f64>,
    pub lead_time_days: Option<i64>,
}

impl OrderRecord {
    pub fn date(&self, field: DateField) -> Option<NaiveDate> {
        match field {
            DateField::OrderDate => self.order_date,
            DateField::DueDate => self.due_date,
        }
    }

    /// Grouping key for a dimension; `None` only for a blank reason
    pub fn group_key(&self, dimension: GroupDimension) -> Option<&str> {
        match dimension {
            GroupDimension::Person => Some(&self.person),
            GroupDimension::Reason => self.reason.as_deref(),
            GroupDimension::Item => Some(&self.item),
            GroupDimension::Purity => Some(&self.purity),
        }
    }
}

/// Date columns that can be filtered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DateField {
    OrderDate,
    DueDate,
}

impl DateField {
    pub const ALL: [DateField; 2] = [DateField::OrderDate, DateField::DueDate];

    pub fn field(&self) -> Field {
        match self {
            DateField::OrderDate => Field::OrderDate,
            DateField::DueDate => Field::DueDate,
        }
    }
}

impl fmt::Display for DateField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.field().fmt(f)
    }
}

/// Dimensions the aggregation engine groups by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GroupDimension {
    Person,
    Reason,
    Item,
    Purity,
}

impl GroupDimension {
    pub const ALL: [GroupDimension; 4] = [
        GroupDimension::Person,
        GroupDimension::Reason,
        GroupDimension::Item,
        GroupDimension::Purity,
    ];

    pub fn field(&self) -> Field {
        match self {
            GroupDimension::Person => Field::Person,
            GroupDimension::Reason => Field::Reason,
            GroupDimension::Item => Field::Item,
            GroupDimension::Purity => Field::Purity,
        }
    }
}

impl fmt::Display for GroupDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.field().fmt(f)
    }
}

/// Summed weights over a set of records.
///
/// `late_percent` is the ratio of the summed late weight to the summed order
/// weight, not the mean of the per-record percentages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub record_count: usize,
    pub order_weight: f64,
    pub on_time: f64,
    pub late: f64,
    pub pending: f64,
    pub late_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSummary {
    pub key: String,
    pub totals: Totals,
}

/// Lead-time statistics for one item; `None` when no member has a lead time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadTimeSummary {
    pub item: String,
    pub orders_with_lead_time: usize,
    pub min_days: Option<i64>,
    pub max_days: Option<i64>,
    pub mean_days: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReasonCount {
    pub reason: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub order_no: String,
    pub order_weight: f64,
    pub on_time: f64,
    pub late: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemarkOrders {
    pub reason: String,
    pub orders: Vec<OrderLine>,
}

/// Person -> remark -> orders breakdown with the person's totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonDrilldown {
    pub person: String,
    pub remarks: Vec<RemarkOrders>,
    pub totals: Totals,
}

/// Inclusive calendar window; the whole `end` day is inside the window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        if date < self.start {
            return false;
        }
        match self.end.succ_opt() {
            Some(exclusive_end) => date < exclusive_end,
            None => date <= self.end,
        }
    }
}

/// Selected windows for both date columns; `None` leaves a column unfiltered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindows {
    pub order_date: Option<DateWindow>,
    pub due_date: Option<DateWindow>,
}

impl DateWindows {
    pub fn get(&self, field: DateField) -> Option<DateWindow> {
        match field {
            DateField::OrderDate => self.order_date,
            DateField::DueDate => self.due_date,
        }
    }

    pub fn with_order_date(mut self, window: DateWindow) -> Self {
        self.order_date = Some(window);
        self
    }

    pub fn with_due_date(mut self, window: DateWindow) -> Self {
        self.due_date = Some(window);
        self
    }
}

/// Informational states surfaced with results; none of them is fatal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Notice {
    SourceFallback { reason: String },
    EmptySource { rows: usize, header_row: usize },
    MissingColumn { column: String, skipped: Vec<String> },
    DateFilterDisabled { field: DateField },
    EmptyResult,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::SourceFallback { reason } => {
                write!(f, "Using built-in sample data: {}", reason)
            }
            Notice::EmptySource { rows, header_row } => write!(
                f,
                "Source has {} rows, no data below header row {}",
                rows, header_row
            ),
            Notice::MissingColumn { column, skipped } => write!(
                f,
                "Column '{}' not found; skipped: {}",
                column,
                skipped.join(", ")
            ),
            Notice::DateFilterDisabled { field } => {
                write!(f, "No valid dates in {}; filter disabled", field)
            }
            Notice::EmptyResult => f.write_str("No records match the selected date ranges"),
        }
    }
}

/// Normalized, coerced and derived record set for one load cycle
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreparedTable {
    pub headers: Vec<String>,
    pub records: Vec<OrderRecord>,
    pub columns: ColumnSet,
    pub notices: Vec<Notice>,
}
