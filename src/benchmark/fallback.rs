use super::{BenchmarkTable, SectorBenchmark};
use std::sync::LazyLock;

/// Hand-authored sector reference values: PE, PB, ROE (%), DebtEquity, PS.
const SECTOR_BENCHMARKS: &[(&str, [f64; 5])] = &[
    ("Financial Services", [15.0, 1.5, 10.0, 50.0, 2.0]),
    ("Basic Materials", [20.0, 2.0, 12.0, 30.0, 1.5]),
    ("Healthcare", [25.0, 3.0, 15.0, 20.0, 3.0]),
    ("Real Estate", [18.0, 1.2, 8.0, 60.0, 4.0]),
    ("Industrials", [20.0, 2.0, 12.0, 35.0, 1.5]),
    ("Energy", [15.0, 1.5, 10.0, 40.0, 1.0]),
    ("Consumer Defensive", [22.0, 3.0, 14.0, 30.0, 2.0]),
    ("Consumer Cyclical", [25.0, 3.0, 15.0, 25.0, 2.0]),
    ("Communication Services", [23.0, 2.5, 12.0, 20.0, 2.0]),
    ("Utilities", [16.0, 1.5, 8.0, 50.0, 1.5]),
    ("Technology", [30.0, 4.0, 18.0, 10.0, 4.0]),
];

static FALLBACK: LazyLock<BenchmarkTable> = LazyLock::new(|| {
    SECTOR_BENCHMARKS
        .iter()
        .map(|&(sector, [pe, pb, roe, de, ps])| {
            let bench = SectorBenchmark {
                pe: Some(pe),
                pb: Some(pb),
                roe: Some(roe),
                debt_equity: Some(de),
                ps: Some(ps),
                sample_size: 0,
            };
            (sector.to_string(), bench)
        })
        .collect()
});

/// The process-wide static table.
pub fn fallback_table() -> &'static BenchmarkTable {
    &FALLBACK
}
