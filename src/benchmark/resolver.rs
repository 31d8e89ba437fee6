use super::{fallback_table, BenchmarkTable};
use crate::models::Metric;
use serde::Serialize;
use std::collections::BTreeSet;

/// Which tier a resolved benchmark came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BenchmarkSource {
    Dynamic,
    Fallback,
}

/// Two-tier lookup: dynamic median first, static table second.
#[derive(Debug, Clone)]
pub struct BenchmarkResolver {
    dynamic: BenchmarkTable,
    fallback: &'static BenchmarkTable,
}

/// One line of the per-sector benchmark view.
#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkRow {
    pub sector: String,
    pub sample_size: usize,
    pub values: Vec<(Metric, Option<f64>, Option<BenchmarkSource>)>,
}

impl BenchmarkResolver {
    pub fn new(dynamic: BenchmarkTable) -> Self {
        Self::with_fallback(dynamic, fallback_table())
    }

    pub fn with_fallback(dynamic: BenchmarkTable, fallback: &'static BenchmarkTable) -> Self {
        Self { dynamic, fallback }
    }

    pub fn static_only() -> Self {
        Self::new(BenchmarkTable::new())
    }

    pub fn resolve(&self, sector: &str, metric: Metric) -> Option<f64> {
        self.lookup(sector, metric).map(|(v, _)| v)
    }

    pub fn provenance(&self, sector: &str, metric: Metric) -> Option<BenchmarkSource> {
        self.lookup(sector, metric).map(|(_, s)| s)
    }

    fn lookup(&self, sector: &str, metric: Metric) -> Option<(f64, BenchmarkSource)> {
        let dynamic = self.dynamic.get(sector).and_then(|b| b.get(metric));
        if let Some(v) = dynamic {
            return Some((v, BenchmarkSource::Dynamic));
        }
        self.fallback
            .get(sector)
            .and_then(|b| b.get(metric))
            .map(|v| (v, BenchmarkSource::Fallback))
    }

    /// Resolved values for every sector known to either table.
    pub fn rows(&self) -> Vec<BenchmarkRow> {
        let sectors: BTreeSet<&String> = self.dynamic.keys().chain(self.fallback.keys()).collect();
        sectors
            .into_iter()
            .map(|sector| BenchmarkRow {
                sector: sector.clone(),
                sample_size: self.dynamic.get(sector).map_or(0, |b| b.sample_size),
                values: Metric::ALL
                    .iter()
                    .map(|&m| {
                        let hit = self.lookup(sector, m);
                        (m, hit.map(|(v, _)| v), hit.map(|(_, s)| s))
                    })
                    .collect(),
            })
            .collect()
    }
}
