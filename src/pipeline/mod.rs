//! Pipeline orchestrator: ties source → ranking → benchmarks → scoring together.
//!
//! ## One run
//!
//!   1. Fetch a MetricRecord for every focus ticker (failures are skipped).
//!   2. Rank the benchmark universe by market cap and keep the top `pool_size`.
//!   3. Fetch the pool and take per-sector medians → dynamic benchmark table.
//!   4. Score each focus record against dynamic-then-fallback benchmarks.
//!
//! Every run is recomputed from scratch. Only the fetch cache (if enabled)
//! carries anything over between runs.

use crate::benchmark::{compute_benchmarks, BenchmarkResolver, BenchmarkSource};
use crate::cache::CachedSource;
use crate::config::{AppConfig, PoolSize};
use crate::fetcher::fetch_records;
use crate::loader::{default_benchmark_universe, load_ticker_list};
use crate::models::{Light, Metric, MetricRecord, TrendSignal};
use crate::ranker::top_n_by_market_cap;
use crate::scoring::{score_trend, score_value, traffic_light};
use crate::source::{SharedSource, YahooSource};
use crate::utils::Timer;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Per-run choices, overriding the config defaults.
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub pool_size: PoolSize,
    pub dynamic_benchmarks: bool,
}

impl RunOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            pool_size: config.pipeline.pool_size,
            dynamic_benchmarks: config.pipeline.dynamic_benchmarks,
        }
    }
}

/// One metric cell: the stock's value, its resolved benchmark and the color.
#[derive(Debug, Clone, Serialize)]
pub struct MetricCell {
    pub metric: Metric,
    pub value: Option<f64>,
    pub benchmark: Option<f64>,
    pub benchmark_source: Option<BenchmarkSource>,
    pub light: Option<Light>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardRow {
    pub record: MetricRecord,
    pub trend: TrendSignal,
    pub value: u8,
    pub cells: Vec<MetricCell>,
}

impl DashboardRow {
    pub fn score(record: MetricRecord, resolver: &BenchmarkResolver) -> Self {
        let trend = score_trend(record.price, record.moving_average_200d);
        let value = score_value(&record, resolver);
        let cells = Metric::ALL
            .iter()
            .map(|&metric| {
                let v = record.metric(metric);
                let benchmark = resolver.resolve(&record.sector, metric);
                MetricCell {
                    metric,
                    value: v,
                    benchmark,
                    benchmark_source: resolver.provenance(&record.sector, metric),
                    light: traffic_light(v, benchmark, metric.direction()),
                }
            })
            .collect();

        Self {
            record,
            trend,
            value,
            cells,
        }
    }

    pub fn cell(&self, metric: Metric) -> Option<&MetricCell> {
        self.cells.iter().find(|c| c.metric == metric)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunStats {
    pub focus_requested: usize,
    pub focus_fetched: usize,
    pub focus_failed: usize,
    pub pool_requested: usize,
    pub pool_ranked: usize,
    pub dynamic_sectors: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardReport {
    pub generated_at: DateTime<Utc>,
    pub pool_size: PoolSize,
    pub rows: Vec<DashboardRow>,
    pub stats: RunStats,
    #[serde(skip)]
    pub resolver: BenchmarkResolver,
}

pub struct Pipeline {
    config: AppConfig,
    source: SharedSource,
    cache: Option<Arc<CachedSource>>,
}

impl Pipeline {
    pub fn new(config: AppConfig, source: SharedSource) -> Self {
        Self {
            config,
            source,
            cache: None,
        }
    }

    /// Yahoo-backed pipeline, memoized when the cache is enabled.
    pub fn from_config(config: AppConfig) -> Result<Self> {
        let yahoo: SharedSource = Arc::new(
            YahooSource::new(&config.source).context("Failed to build market-data client")?,
        );
        if !config.cache.enabled {
            return Ok(Self::new(config, yahoo));
        }

        let cache = Arc::new(CachedSource::new(
            yahoo,
            Duration::from_secs(config.cache.ttl_secs),
        ));
        Ok(Self {
            config,
            source: cache.clone(),
            cache: Some(cache),
        })
    }

    pub fn source(&self) -> &SharedSource {
        &self.source
    }

    fn suffix(&self) -> &str {
        &self.config.universe.exchange_suffix
    }

    fn concurrency(&self) -> usize {
        self.config.pipeline.concurrency
    }

    fn benchmark_universe(&self) -> Result<Vec<String>> {
        match &self.config.universe.benchmark_csv {
            Some(path) => load_ticker_list(path),
            None => Ok(default_benchmark_universe()),
        }
    }

    /// Top `pool_size` of the benchmark universe by market cap.
    pub async fn rank_pool(&self, pool_size: PoolSize) -> Result<Vec<(String, f64)>> {
        let universe = self.benchmark_universe()?;
        let _t = Timer::start(format!("Ranking {} tickers by market cap", universe.len()));
        Ok(top_n_by_market_cap(
            &self.source,
            &universe,
            pool_size.count(),
            self.suffix(),
            self.concurrency(),
        )
        .await)
    }

    /// Build the two-tier resolver. Never fails: an unreadable universe or an
    /// empty dynamic table just means every lookup uses the static one.
    pub async fn benchmarks(&self, options: RunOptions) -> (BenchmarkResolver, RunStats) {
        let mut stats = RunStats {
            pool_requested: options.pool_size.count(),
            ..Default::default()
        };

        if !options.dynamic_benchmarks {
            info!("Dynamic benchmarks disabled, using static sector table");
            return (BenchmarkResolver::static_only(), stats);
        }

        let pool = match self.rank_pool(options.pool_size).await {
            Ok(pool) => pool,
            Err(e) => {
                warn!("{:#}; using static sector table", e);
                return (BenchmarkResolver::static_only(), stats);
            }
        };
        stats.pool_ranked = pool.len();
        let pool: Vec<String> = pool.into_iter().map(|(t, _)| t).collect();

        let dynamic = {
            let _t = Timer::start(format!("Benchmarking top {} pool", pool.len()));
            compute_benchmarks(&self.source, &pool, self.suffix(), self.concurrency()).await
        };

        if dynamic.is_empty() {
            warn!("No dynamic benchmarks could be computed, using static sector table");
        }
        stats.dynamic_sectors = dynamic.len();
        (BenchmarkResolver::new(dynamic), stats)
    }

    pub async fn run(&self, options: RunOptions) -> Result<DashboardReport> {
        let _t = Timer::start("Dashboard run");
        if let Some(cache) = &self.cache {
            cache.purge_expired();
            debug!("{} cached responses carried over", cache.len());
        }
        let focus = &self.config.universe.focus;

        info!("=== Step 1: Fetching {} focus tickers ===", focus.len());
        let outcome = fetch_records(&self.source, focus, self.suffix(), self.concurrency()).await;
        if outcome.records.is_empty() {
            info!("No stock data fetched for the focus list");
        }

        info!("=== Step 2: Resolving sector benchmarks ===");
        let (resolver, mut stats) = self.benchmarks(options).await;
        stats.focus_requested = focus.len();
        stats.focus_fetched = outcome.records.len();
        stats.focus_failed = outcome.failures.len();

        info!("=== Step 3: Scoring ===");
        let rows: Vec<DashboardRow> = outcome
            .records
            .into_iter()
            .map(|r| DashboardRow::score(r, &resolver))
            .collect();

        info!(
            "=== Done: {} rows | {} failed | {} dynamic sectors ===",
            rows.len(),
            stats.focus_failed,
            stats.dynamic_sectors
        );

        Ok(DashboardReport {
            generated_at: Utc::now(),
            pool_size: options.pool_size,
            rows,
            stats,
            resolver,
        })
    }
}
