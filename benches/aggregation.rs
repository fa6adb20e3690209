use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use order_dashboard::DashboardConfig;
use order_dashboard::dashboard::{build_view, prepare_grid};
use order_dashboard::filter::full_windows;
use order_dashboard::header::Grid;

const PERSONS: [&str; 6] = ["John", "Asha", "Ravi", "Meena", "Kiran", "Sara"];
const ITEMS: [&str; 5] = ["Chain", "Ring", "Bangle", "Pendant", "Earring"];
const PURITIES: [&str; 3] = ["22K", "18K", "14K"];
const REASONS: [&str; 4] = ["", "Stone delay", "Casting rework", "Polishing"];

/// Sheet laid out like production: title row, header row, then orders
fn synthetic_grid(rows: usize) -> Grid {
    let mut grid: Grid = vec![
        vec!["PRODUCTION ORDER STATUS".to_string()],
        [
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
        ]
        .iter()
        .map(|s| s.to_string())
        .collect(),
    ];

    for i in 0..rows {
        let weight = 100 + (i % 900);
        grid.push(vec![
            PERSONS[i % PERSONS.len()].to_string(),
            format!("PO-{}", i),
            format!("{:02}-{:02}-2025", 1 + i % 28, 1 + i % 6),
            format!("{:02}-{:02}-2025", 1 + (i + 9) % 28, 7 + i % 6),
            ITEMS[i % ITEMS.len()].to_string(),
            PURITIES[i % PURITIES.len()].to_string(),
            format!("{},{:03}", weight / 1000, weight % 1000),
            (weight / 2).to_string(),
            (weight / 5).to_string(),
            REASONS[i % REASONS.len()].to_string(),
        ]);
    }
    grid
}

fn bench_prepare(c: &mut Criterion) {
    let config = DashboardConfig::default();
    let mut group = c.benchmark_group("prepare_grid");

    for rows in [1_000usize, 10_000] {
        let grid = synthetic_grid(rows);
        group.throughput(Throughput::Elements(rows as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &grid, |b, grid| {
            b.iter(|| prepare_grid(black_box(grid), &config))
        });
    }
    group.finish();
}

fn bench_view(c: &mut Criterion) {
    let config = DashboardConfig::default();
    let mut group = c.benchmark_group("build_view");

    for rows in [1_000usize, 10_000] {
        let table = prepare_grid(&synthetic_grid(rows), &config);
        let windows = full_windows(&table.records);
        group.throughput(Throughput::Elements(rows as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &table, |b, table| {
            b.iter(|| build_view(black_box(table), &windows).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_prepare, bench_view);
criterion_main!(benches);
