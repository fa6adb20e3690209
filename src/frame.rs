//! Polars DataFrame views of dashboard outputs and file export.
//!
//! Tables handed to the presentation layer are plain DataFrames: undefined
//! metrics and unknown dates are nulls, never zeros.

use crate::dashboard::DashboardView;
use crate::error::Result;
use crate::models::{GroupDimension, GroupSummary, LeadTimeSummary, OrderRecord, ReasonCount, Totals};
use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File format for exported tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ExportFormat {
    #[default]
    Csv,
    Parquet,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Parquet => "parquet",
        }
    }
}

/// Cleaned and derived record table
pub fn records_frame(records: &[OrderRecord]) -> Result<DataFrame> {
    let text = |f: fn(&OrderRecord) -> &str| records.iter().map(f).collect::<Vec<&str>>();
    let number = |f: fn(&OrderRecord) -> f64| records.iter().map(f).collect::<Vec<f64>>();

    let df = DataFrame::new(vec![
        Column::new("person".into(), text(|r| &r.person)),
        Column::new("order_no".into(), text(|r| &r.order_no)),
        Column::new("item".into(), text(|r| &r.item)),
        Column::new("purity".into(), text(|r| &r.purity)),
        Column::new(
            "order_date".into(),
            records.iter().map(|r| r.order_date).collect::<Vec<_>>(),
        ),
        Column::new(
            "due_date".into(),
            records.iter().map(|r| r.due_date).collect::<Vec<_>>(),
        ),
        Column::new("order_weight".into(), number(|r| r.order_weight)),
        Column::new("on_time".into(), number(|r| r.on_time)),
        Column::new("late".into(), number(|r| r.late)),
        Column::new(
            "pending".into(),
            records.iter().map(|r| r.pending).collect::<Vec<_>>(),
        ),
        Column::new(
            "late_percent".into(),
            records.iter().map(|r| r.late_percent).collect::<Vec<_>>(),
        ),
        Column::new(
            "reason".into(),
            records.iter().map(|r| r.reason.as_deref()).collect::<Vec<_>>(),
        ),
        Column::new(
            "lead_time_days".into(),
            records.iter().map(|r| r.lead_time_days).collect::<Vec<_>>(),
        ),
    ])?;
    Ok(df)
}

fn totals_columns(totals: &[Totals]) -> Vec<Column> {
    let number = |f: fn(&Totals) -> f64| totals.iter().map(f).collect::<Vec<f64>>();
    vec![
        Column::new(
            "records".into(),
            totals.iter().map(|t| t.record_count as u64).collect::<Vec<_>>(),
        ),
        Column::new("order_weight".into(), number(|t| t.order_weight)),
        Column::new("on_time".into(), number(|t| t.on_time)),
        Column::new("late".into(), number(|t| t.late)),
        Column::new("pending".into(), number(|t| t.pending)),
        Column::new("late_percent".into(), number(|t| t.late_percent)),
    ]
}

/// Per-group totals keyed by the dimension name
pub fn summary_frame(dimension: GroupDimension, summaries: &[GroupSummary]) -> Result<DataFrame> {
    let keys: Vec<&str> = summaries.iter().map(|s| s.key.as_str()).collect();
    let totals: Vec<Totals> = summaries.iter().map(|s| s.totals).collect();

    let mut columns = vec![Column::new(dimension.field().key().into(), keys)];
    columns.extend(totals_columns(&totals));
    Ok(DataFrame::new(columns)?)
}

/// Single grand-total row
pub fn totals_frame(totals: &Totals) -> Result<DataFrame> {
    Ok(DataFrame::new(totals_columns(std::slice::from_ref(totals)))?)
}

pub fn lead_time_frame(summaries: &[LeadTimeSummary]) -> Result<DataFrame> {
    let df = DataFrame::new(vec![
        Column::new(
            "item".into(),
            summaries.iter().map(|s| s.item.as_str()).collect::<Vec<_>>(),
        ),
        Column::new(
            "orders".into(),
            summaries
                .iter()
                .map(|s| s.orders_with_lead_time as u64)
                .collect::<Vec<_>>(),
        ),
        Column::new(
            "min_days".into(),
            summaries.iter().map(|s| s.min_days).collect::<Vec<_>>(),
        ),
        Column::new(
            "max_days".into(),
            summaries.iter().map(|s| s.max_days).collect::<Vec<_>>(),
        ),
        Column::new(
            "mean_days".into(),
            summaries.iter().map(|s| s.mean_days).collect::<Vec<_>>(),
        ),
    ])?;
    Ok(df)
}

pub fn reason_counts_frame(counts: &[ReasonCount]) -> Result<DataFrame> {
    let df = DataFrame::new(vec![
        Column::new(
            "reason".into(),
            counts.iter().map(|c| c.reason.as_str()).collect::<Vec<_>>(),
        ),
        Column::new(
            "count".into(),
            counts.iter().map(|c| c.count as u64).collect::<Vec<_>>(),
        ),
    ])?;
    Ok(df)
}

/// Every table of a view, named for export; skipped outputs are absent
pub fn view_frames(view: &DashboardView) -> Result<Vec<(&'static str, DataFrame)>> {
    let mut frames = vec![("records", records_frame(&view.records)?)];

    for (name, dimension) in [
        ("by_person", GroupDimension::Person),
        ("by_reason", GroupDimension::Reason),
        ("by_item", GroupDimension::Item),
        ("by_purity", GroupDimension::Purity),
    ] {
        if let Some(summaries) = view.summaries(dimension) {
            frames.push((name, summary_frame(dimension, summaries)?));
        }
    }
    if let Some(totals) = &view.grand_total {
        frames.push(("grand_total", totals_frame(totals)?));
    }
    if let Some(lead_times) = &view.lead_time_by_item {
        frames.push(("lead_time_by_item", lead_time_frame(lead_times)?));
    }
    if let Some(counts) = &view.reason_counts {
        frames.push(("reason_counts", reason_counts_frame(counts)?));
    }

    Ok(frames)
}

fn write_frame(df: &mut DataFrame, path: &Path, format: ExportFormat) -> Result<()> {
    let file = File::create(path)?;
    match format {
        ExportFormat::Csv => {
            CsvWriter::new(file).include_header(true).finish(df)?;
        }
        ExportFormat::Parquet => {
            ParquetWriter::new(file)
                .with_compression(ParquetCompression::Snappy)
                .finish(df)?;
        }
    }
    debug!("Wrote {} rows to {}", df.height(), path.display());
    Ok(())
}

/// Write every table of `view` into `output_dir`, returning the written paths
pub fn export_view(
    view: &DashboardView,
    output_dir: &Path,
    format: ExportFormat,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)?;

    let mut written = Vec::new();
    for (name, mut df) in view_frames(view)? {
        let path = output_dir.join(format!("{}.{}", name, format.extension()));
        write_frame(&mut df, &path, format)?;
        written.push(path);
    }

    info!(
        "Exported {} tables to {}",
        written.len(),
        output_dir.display()
    );
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::summarize_by;
    use crate::config::DashboardConfig;
    use crate::dashboard::{Dashboard, build_view};
    use crate::models::{ColumnSet, DateWindows};
    use crate::source::FixtureSource;
    use tempfile::TempDir;

    fn fixture_view() -> DashboardView {
        Dashboard::new(Box::new(FixtureSource), DashboardConfig::default())
            .view(&DateWindows::default())
            .unwrap()
    }

    #[test]
    fn test_records_frame_keeps_nulls() {
        let view = fixture_view();

        let df = records_frame(&view.records).unwrap();

        assert_eq!(df.height(), view.records.len());
        assert_eq!(df.width(), 13);
        let unknown_order_dates = view.records.iter().filter(|r| r.order_date.is_none()).count();
        assert_eq!(df.column("order_date").unwrap().null_count(), unknown_order_dates);
        assert_eq!(df.column("lead_time_days").unwrap().null_count(), 2);
    }

    #[test]
    fn test_person_totals_match_polars_group_by() {
        let view = fixture_view();
        let df = records_frame(&view.records).unwrap();

        let grouped = df
            .lazy()
            .group_by([col("person")])
            .agg([col("order_weight").sum(), col("pending").sum()])
            .sort(["person"], SortMultipleOptions::default())
            .collect()
            .unwrap();

        let summaries =
            summarize_by(&view.records, &ColumnSet::all(), GroupDimension::Person).unwrap();
        let weights: Vec<Option<f64>> = grouped
            .column("order_weight")
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .collect();
        let pending: Vec<Option<f64>> = grouped
            .column("pending")
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .collect();

        assert_eq!(grouped.height(), summaries.len());
        for (i, summary) in summaries.iter().enumerate() {
            assert!((weights[i].unwrap() - summary.totals.order_weight).abs() < 1e-9);
            assert!((pending[i].unwrap() - summary.totals.pending).abs() < 1e-9);
        }
    }

    #[test]
    fn test_export_view_writes_every_table() {
        let temp_dir = TempDir::new().unwrap();
        let view = fixture_view();

        let written = export_view(&view, temp_dir.path(), ExportFormat::Csv).unwrap();

        assert_eq!(written.len(), 8);
        let totals = std::fs::read_to_string(temp_dir.path().join("grand_total.csv")).unwrap();
        assert!(totals.starts_with("records,order_weight,on_time,late,pending,late_percent"));
    }

    #[test]
    fn test_export_parquet() {
        let temp_dir = TempDir::new().unwrap();
        let view = fixture_view();

        let written = export_view(&view, temp_dir.path(), ExportFormat::Parquet).unwrap();

        assert!(written.iter().all(|p| p.extension().unwrap() == "parquet"));
        assert!(std::fs::metadata(&written[0]).unwrap().len() > 0);
    }

    #[test]
    fn test_skipped_outputs_are_not_exported() {
        let raw: Vec<Vec<String>> = vec![
            vec!["t".to_string()],
            vec!["CONT.PERSON".to_string()],
            vec!["John".to_string()],
        ];
        let table = crate::dashboard::prepare_grid(&raw, &DashboardConfig::default());
        let view = build_view(&table, &DateWindows::default()).unwrap();

        let names: Vec<&str> = view_frames(&view)
            .unwrap()
            .into_iter()
            .map(|(name, _)| name)
            .collect();

        assert_eq!(names, vec!["records"]);
    }
}
