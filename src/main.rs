use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use indicatif::{HumanDuration, ProgressBar, ProgressStyle};
use order_dashboard::cli::Args;
use order_dashboard::filter::full_windows;
use order_dashboard::frame::export_view;
use order_dashboard::models::{GroupSummary, LeadTimeSummary, ReasonCount, Totals};
use order_dashboard::{Dashboard, DashboardView, GroupDimension};
use std::process;
use std::time::{Duration, Instant};
use tracing::debug;

fn main() {
    let args = Args::parse();
    setup_logging(&args);

    if let Err(error) = run(&args) {
        eprintln!("{} {:#}", "Error:".bright_red().bold(), error);
        process::exit(1);
    }
}

/// Install the stderr subscriber; `RUST_LOG` overrides the flag-derived level
fn setup_logging(args: &Args) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_directive()));
    let layer = fmt::layer().with_target(false).with_writer(std::io::stderr);
    let subscriber = tracing_subscriber::registry().with(filter);

    if args.compact_logs() {
        subscriber.with(layer.compact().without_time()).init();
    } else {
        subscriber.with(layer.with_timer(fmt::time::uptime())).init();
    }

    debug!("Logging initialized: {}", args.log_directive());
}

fn run(args: &Args) -> Result<()> {
    let start_time = Instant::now();
    let config = args.load_config().context("Failed to load configuration")?;
    let dashboard = Dashboard::from_config(config).context("Failed to set up dashboard")?;

    let spinner = args.show_progress().then(|| {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(format!("Loading {}...", dashboard.source_description()));
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    });

    let loaded = dashboard.load();
    if let Some(pb) = &spinner {
        pb.finish_and_clear();
    }
    let table = loaded.with_context(|| {
        format!("Failed to load orders from {}", dashboard.source_description())
    })?;

    let windows = args.date_windows(&full_windows(&table.records))?;
    let view = dashboard.view(&windows)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        print_report(&dashboard, &view);
    }

    if let Some(dir) = &args.export {
        let written = export_view(&view, dir, args.export_format)
            .with_context(|| format!("Failed to export tables to {}", dir.display()))?;
        if !args.quiet && !args.json {
            println!(
                "\n{} {} tables to {}",
                "Exported".bright_green().bold(),
                written.len(),
                dir.display()
            );
        }
    }

    debug!("Finished in {}", HumanDuration(start_time.elapsed()));
    Ok(())
}

fn print_report(dashboard: &Dashboard, view: &DashboardView) {
    println!("{}", "Order Dashboard".bright_green().bold());
    println!(
        "Source: {}   Records: {}",
        dashboard.source_description().bright_cyan(),
        view.records.len().to_string().bright_white().bold()
    );
    for (label, window) in [
        ("Order date", view.windows.order_date),
        ("Due date", view.windows.due_date),
    ] {
        match window {
            Some(w) => println!("{}: {} to {}", label, w.start, w.end),
            None => println!("{}: {}", label, "unfiltered".bright_black()),
        }
    }

    if !view.notices.is_empty() {
        println!();
        for notice in &view.notices {
            println!("{} {}", "!".bright_yellow().bold(), notice);
        }
    }

    if let Some(total) = &view.grand_total {
        println!("\n{}", "Grand Total".bright_green().bold());
        print_totals_header("");
        print_totals_row("All orders", total);
    }

    for (title, dimension) in [
        ("By Person", GroupDimension::Person),
        ("By Remark", GroupDimension::Reason),
        ("By Item", GroupDimension::Item),
        ("By Purity", GroupDimension::Purity),
    ] {
        if let Some(summaries) = view.summaries(dimension) {
            print_summary_table(title, dimension, summaries);
        }
    }

    if let Some(lead_times) = &view.lead_time_by_item {
        print_lead_times(lead_times);
    }
    if let Some(counts) = &view.reason_counts {
        print_reason_counts(counts);
    }
}

fn print_totals_header(key: &str) {
    println!(
        "{}",
        format!(
            "{:<20} {:>7} {:>12} {:>12} {:>12} {:>12} {:>8}",
            key, "Orders", "Order Wt", "On Time", "Late", "Pending", "Late %"
        )
        .bright_white()
        .bold()
    );
}

fn print_totals_row(key: &str, totals: &Totals) {
    println!(
        "{:<20} {:>7} {:>12.2} {:>12.2} {:>12.2} {:>12.2} {:>8.2}",
        key,
        totals.record_count,
        totals.order_weight,
        totals.on_time,
        totals.late,
        totals.pending,
        totals.late_percent
    );
}

fn print_summary_table(title: &str, dimension: GroupDimension, summaries: &[GroupSummary]) {
    println!("\n{}", title.bright_green().bold());
    if summaries.is_empty() {
        println!("  {}", "no rows".bright_black());
        return;
    }
    print_totals_header(&dimension.to_string());
    for summary in summaries {
        print_totals_row(&summary.key, &summary.totals);
    }
}

fn print_lead_times(lead_times: &[LeadTimeSummary]) {
    println!("\n{}", "Lead Time by Item (days)".bright_green().bold());
    println!(
        "{}",
        format!(
            "{:<20} {:>7} {:>6} {:>6} {:>8}",
            "Item", "Orders", "Min", "Max", "Mean"
        )
        .bright_white()
        .bold()
    );
    let or_dash = |v: Option<String>| v.unwrap_or_else(|| "-".to_string());
    for row in lead_times {
        println!(
            "{:<20} {:>7} {:>6} {:>6} {:>8}",
            row.item,
            row.orders_with_lead_time,
            or_dash(row.min_days.map(|d| d.to_string())),
            or_dash(row.max_days.map(|d| d.to_string())),
            or_dash(row.mean_days.map(|d| format!("{:.1}", d)))
        );
    }
}

fn print_reason_counts(counts: &[ReasonCount]) {
    println!("\n{}", "Remark Counts".bright_green().bold());
    for count in counts {
        println!(
            "  {:<30} {}",
            count.reason,
            count.count.to_string().bright_yellow().bold()
        );
    }
}
