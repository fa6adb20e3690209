//! Dashboard orchestration: load, cache and summarise order records.
//!
//! A load cycle fetches the sheet, normalizes the header, coerces cells and
//! derives metrics; the resulting [`PreparedTable`] is cached per source.
//! Every [`Dashboard::view`] call filters that table by date windows and
//! recomputes all summaries from scratch without touching the cached table.

use crate::aggregate::{
    grand_total, lead_time_by_item, person_drilldown, reason_counts, summarize_by,
};
use crate::cache::TableCache;
use crate::coercion::coerce_table;
use crate::config::DashboardConfig;
use crate::error::{DashboardError, Result};
use crate::filter::{apply_date_windows, full_windows};
use crate::header::normalize_header;
use crate::metrics::derive_metrics;
use crate::models::{
    DateWindows, GroupDimension, GroupSummary, LeadTimeSummary, Notice, OrderRecord,
    PersonDrilldown, PreparedTable, ReasonCount, Totals,
};
use crate::source::{RecordSource, select_source};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Everything the presentation layer renders for one filter selection.
///
/// A `None` output could not be computed because a column it depends on
/// is missing; the matching notice explains which.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardView {
    pub windows: DateWindows,
    pub records: Vec<OrderRecord>,
    pub by_person: Option<Vec<GroupSummary>>,
    pub by_reason: Option<Vec<GroupSummary>>,
    pub by_item: Option<Vec<GroupSummary>>,
    pub by_purity: Option<Vec<GroupSummary>>,
    pub grand_total: Option<Totals>,
    pub lead_time_by_item: Option<Vec<LeadTimeSummary>>,
    pub reason_counts: Option<Vec<ReasonCount>>,
    pub drilldown: Option<Vec<PersonDrilldown>>,
    pub notices: Vec<Notice>,
}

impl DashboardView {
    pub fn summaries(&self, dimension: GroupDimension) -> Option<&[GroupSummary]> {
        match dimension {
            GroupDimension::Person => self.by_person.as_deref(),
            GroupDimension::Reason => self.by_reason.as_deref(),
            GroupDimension::Item => self.by_item.as_deref(),
            GroupDimension::Purity => self.by_purity.as_deref(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Keep the value, or log why an output was skipped
fn skip_missing<T>(output: &str, result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(DashboardError::MissingColumn { column }) => {
            debug!("Skipping {}: column '{}' missing", output, column);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Prepare a raw grid: normalize, coerce and derive
pub fn prepare_grid(grid: &[Vec<String>], config: &DashboardConfig) -> PreparedTable {
    let table = normalize_header(grid, config.header_row);
    if table.is_empty() || table.rows.is_empty() {
        warn!(
            "Source has {} rows, nothing below header row {}",
            grid.len(),
            config.header_row
        );
        return PreparedTable {
            headers: table.headers,
            notices: vec![Notice::EmptySource {
                rows: grid.len(),
                header_row: config.header_row,
            }],
            ..Default::default()
        };
    }

    let (mut records, columns, notices) = coerce_table(&table, config);
    derive_metrics(&mut records, &columns);

    PreparedTable {
        headers: table.headers,
        records,
        columns,
        notices,
    }
}

/// Main entry point for loading and summarising order data
pub struct Dashboard {
    source: Box<dyn RecordSource>,
    config: DashboardConfig,
    cache: TableCache,
    source_notices: Vec<Notice>,
}

impl std::fmt::Debug for Dashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dashboard")
            .field("source", &self.source.describe())
            .field("config", &self.config)
            .field("cache", &self.cache)
            .finish()
    }
}

impl Dashboard {
    /// Build a dashboard over an explicit source
    pub fn new(source: Box<dyn RecordSource>, config: DashboardConfig) -> Self {
        let cache = TableCache::new(config.cache_ttl());
        Self {
            source,
            config,
            cache,
            source_notices: Vec::new(),
        }
    }

    /// Build a dashboard over whichever source the configuration supports
    pub fn from_config(config: DashboardConfig) -> Result<Self> {
        config.validate()?;
        let (source, notice) = select_source(&config);
        let mut dashboard = Self::new(source, config);
        dashboard.source_notices.extend(notice);
        Ok(dashboard)
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn source_description(&self) -> String {
        self.source.describe()
    }

    /// Return the cached table, loading it on a miss
    pub fn load(&self) -> Result<Arc<PreparedTable>> {
        let token = self.source.describe();
        if let Some(table) = self.cache.get(&token) {
            return Ok(table);
        }

        let start_time = Instant::now();
        let grid = self.source.fetch()?;
        let mut table = prepare_grid(&grid, &self.config);
        let mut notices = self.source_notices.clone();
        notices.append(&mut table.notices);
        table.notices = notices;

        info!(
            "Loaded {} records from {} in {}ms",
            table.records.len(),
            token,
            start_time.elapsed().as_millis()
        );

        let table = Arc::new(table);
        self.cache.insert(token, Arc::clone(&table));
        Ok(table)
    }

    /// Drop the cached table and load again
    pub fn refresh(&self) -> Result<Arc<PreparedTable>> {
        self.cache.invalidate(&self.source.describe());
        self.load()
    }

    /// Filter by `windows` and compute every summary
    pub fn view(&self, windows: &DateWindows) -> Result<DashboardView> {
        let table = self.load()?;
        build_view(&table, windows)
    }

    /// View over the full observed date ranges
    pub fn full_view(&self) -> Result<DashboardView> {
        let table = self.load()?;
        build_view(&table, &full_windows(&table.records))
    }
}

/// Filter a prepared table and aggregate the surviving records
pub fn build_view(table: &PreparedTable, windows: &DateWindows) -> Result<DashboardView> {
    let outcome = apply_date_windows(&table.records, windows);
    let records = outcome.records;
    let columns = &table.columns;

    let mut notices = table.notices.clone();
    notices.extend(outcome.notices);

    let view = DashboardView {
        windows: *windows,
        by_person: skip_missing(
            "person summary",
            summarize_by(&records, columns, GroupDimension::Person),
        )?,
        by_reason: skip_missing(
            "reason summary",
            summarize_by(&records, columns, GroupDimension::Reason),
        )?,
        by_item: skip_missing(
            "item summary",
            summarize_by(&records, columns, GroupDimension::Item),
        )?,
        by_purity: skip_missing(
            "purity summary",
            summarize_by(&records, columns, GroupDimension::Purity),
        )?,
        grand_total: skip_missing("grand total", grand_total(&records, columns))?,
        lead_time_by_item: skip_missing("lead time", lead_time_by_item(&records, columns))?,
        reason_counts: skip_missing("reason counts", reason_counts(&records, columns))?,
        drilldown: skip_missing("drilldown", person_drilldown(&records, columns))?,
        records,
        notices,
    };

    debug!(
        "Built view: {} records, {} notices",
        view.records.len(),
        view.notices.len()
    );
    Ok(view)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::header::Grid;
    use crate::models::{DateField, DateWindow, Field};
    use crate::source::FixtureSource;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Source that counts fetches and serves a fixed grid or error
    struct CountingSource {
        fetches: Arc<AtomicUsize>,
        result: std::result::Result<Grid, FetchError>,
    }

    impl RecordSource for CountingSource {
        fn fetch(&self) -> std::result::Result<Grid, FetchError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }

        fn describe(&self) -> String {
            "counting".to_string()
        }
    }

    fn grid(rows: &[&[&str]]) -> Grid {
        rows.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    fn fixture_dashboard() -> Dashboard {
        Dashboard::new(Box::new(FixtureSource), DashboardConfig::default())
    }

    #[test]
    fn test_fixture_view_totals() {
        let view = fixture_dashboard().full_view().unwrap();

        // PO-1003 has no order date and PO-1008 no due date
        assert_eq!(view.records.len(), 8);
        let total = view.grand_total.unwrap();
        assert_eq!(total.record_count, 8);
        assert!(view.records.iter().all(|r| r.pending.unwrap() >= 0.0));
    }

    #[test]
    fn test_unfiltered_view_keeps_every_record() {
        let view = fixture_dashboard().view(&DateWindows::default()).unwrap();

        assert_eq!(view.records.len(), 10);
        let persons: Vec<&str> = view
            .by_person
            .as_ref()
            .unwrap()
            .iter()
            .map(|g| g.key.as_str())
            .collect();
        assert_eq!(persons, vec!["Asha", "John", "Meena", "Ravi"]);

        let reasons = view.summaries(GroupDimension::Reason).unwrap();
        assert!(reasons.iter().all(|g| !g.key.is_empty()));
    }

    #[test]
    fn test_load_is_cached_until_refresh() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let source = CountingSource {
            fetches: Arc::clone(&fetches),
            result: Ok(grid(&[&["t"], &["ORD WT"], &["5"]])),
        };
        let dashboard = Dashboard::new(Box::new(source), DashboardConfig::default());

        dashboard.load().unwrap();
        dashboard.view(&DateWindows::default()).unwrap();
        assert_eq!(fetches.load(Ordering::SeqCst), 1);

        dashboard.refresh().unwrap();
        assert_eq!(fetches.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_not_found_halts_processing() {
        let source = CountingSource {
            fetches: Arc::new(AtomicUsize::new(0)),
            result: Err(FetchError::NotFound {
                resource: "worksheet 'ORDER_SHEET'".to_string(),
            }),
        };
        let dashboard = Dashboard::new(Box::new(source), DashboardConfig::default());

        assert!(matches!(
            dashboard.view(&DateWindows::default()),
            Err(DashboardError::ResourceNotFound { .. })
        ));
    }

    #[test]
    fn test_short_grid_reports_empty_source() {
        let table = prepare_grid(&grid(&[&["only a title"]]), &DashboardConfig::default());

        assert!(table.records.is_empty());
        assert_eq!(
            table.notices,
            vec![Notice::EmptySource {
                rows: 1,
                header_row: 1
            }]
        );
    }

    #[test]
    fn test_missing_columns_skip_dependent_outputs() {
        let raw = grid(&[
            &["title", ""],
            &["CONT.PERSON", "ITEM NAME"],
            &["John", "Chain"],
        ]);
        let table = prepare_grid(&raw, &DashboardConfig::default());

        let view = build_view(&table, &DateWindows::default()).unwrap();

        assert_eq!(view.records.len(), 1);
        assert_eq!(view.records[0].pending, None);
        assert!(view.by_person.is_none());
        assert!(view.grand_total.is_none());
        assert!(view.lead_time_by_item.is_none());
        assert!(view.notices.iter().any(|n| matches!(
            n,
            Notice::MissingColumn { column, .. } if column == "ORD WT"
        )));
        assert!(!table.columns.has(Field::OrderWeight));
    }

    #[test]
    fn test_filter_change_recomputes_summaries() {
        let dashboard = fixture_dashboard();
        let windows = DateWindows::default()
            .with_order_date(DateWindow::new(date(2025, 1, 1), date(2025, 1, 5)));

        let view = dashboard.view(&windows).unwrap();

        let orders: Vec<&str> = view.records.iter().map(|r| r.order_no.as_str()).collect();
        assert_eq!(orders, vec!["PO-1001", "PO-1002", "PO-1004"]);
        assert_eq!(view.grand_total.unwrap().order_weight, 2450.0);
        assert_eq!(view.windows.get(DateField::OrderDate), windows.order_date);

        let cached = dashboard.load().unwrap();
        assert_eq!(cached.records.len(), 10);
    }

    #[test]
    fn test_from_config_falls_back_to_fixture() {
        let config = DashboardConfig::default().without_credentials();

        let dashboard = Dashboard::from_config(config).unwrap();
        let table = dashboard.load().unwrap();

        assert_eq!(dashboard.source_description(), "fixture");
        assert!(matches!(
            table.notices.first(),
            Some(Notice::SourceFallback { .. })
        ));
    }
}
