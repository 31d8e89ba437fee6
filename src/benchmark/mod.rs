//! Sector benchmarks.
//!
//! The dynamic table is the per-sector median of every metric over a pool
//! of large-cap tickers. It may be partial: a sector with no PE values at
//! all has no PE benchmark. The [`resolver`] fills those gaps from the
//! static [`fallback`] table.

pub mod fallback;
pub mod resolver;

use crate::fetcher::fetch_records;
use crate::models::{Metric, MetricRecord};
use crate::source::SharedSource;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

pub use self::fallback::fallback_table;
pub use self::resolver::{BenchmarkResolver, BenchmarkRow, BenchmarkSource};

/// Reference values for one sector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectorBenchmark {
    #[serde(rename = "PE")]
    pub pe: Option<f64>,
    #[serde(rename = "PB")]
    pub pb: Option<f64>,
    #[serde(rename = "ROE")]
    pub roe: Option<f64>,
    #[serde(rename = "DebtEquity")]
    pub debt_equity: Option<f64>,
    #[serde(rename = "PS")]
    pub ps: Option<f64>,
    /// Records behind the medians. Zero for hand-authored values.
    pub sample_size: usize,
}

impl SectorBenchmark {
    pub fn get(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Pe => self.pe,
            Metric::Pb => self.pb,
            Metric::Roe => self.roe,
            Metric::DebtEquity => self.debt_equity,
            Metric::Ps => self.ps,
        }
    }

    fn set(&mut self, metric: Metric, value: Option<f64>) {
        let slot = match metric {
            Metric::Pe => &mut self.pe,
            Metric::Pb => &mut self.pb,
            Metric::Roe => &mut self.roe,
            Metric::DebtEquity => &mut self.debt_equity,
            Metric::Ps => &mut self.ps,
        };
        *slot = value;
    }
}

/// Sector name → benchmarks. Ordered so output is stable.
pub type BenchmarkTable = BTreeMap<String, SectorBenchmark>;

/// Middle value; mean of the two middles for an even count.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some(sorted[mid])
    } else {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    }
}

/// Group by sector and take the median of every metric's present values.
pub fn aggregate(records: &[MetricRecord]) -> BenchmarkTable {
    let mut groups: BTreeMap<&str, Vec<&MetricRecord>> = BTreeMap::new();
    for r in records {
        groups.entry(r.sector.as_str()).or_default().push(r);
    }

    groups
        .into_iter()
        .map(|(sector, members)| {
            let mut bench = SectorBenchmark {
                sample_size: members.len(),
                ..Default::default()
            };
            for metric in Metric::ALL {
                let values: Vec<f64> = members.iter().filter_map(|r| r.metric(metric)).collect();
                bench.set(metric, median(&values));
            }
            (sector.to_string(), bench)
        })
        .collect()
}

/// Fetch every ticker and aggregate what came back. Failures are skipped.
pub async fn compute_benchmarks(
    source: &SharedSource,
    tickers: &[String],
    suffix: &str,
    concurrency: usize,
) -> BenchmarkTable {
    let outcome = fetch_records(source, tickers, suffix, concurrency).await;
    info!(
        "Benchmark pool: {} fetched, {} failed",
        outcome.records.len(),
        outcome.failures.len()
    );
    let table = aggregate(&outcome.records);
    info!("Dynamic benchmarks cover {} sectors", table.len());
    table
}
