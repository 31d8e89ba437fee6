//! Per-ticker fetching.
//!
//! Every lookup is one attempt. A failure only drops that ticker; it is
//! logged as a warning and handed back to the caller.

use crate::error::{FetchError, FetchFailure};
use crate::models::MetricRecord;
use crate::source::cleaner::{normalise_ticker, snapshot_to_record};
use crate::source::SharedSource;
use chrono::Utc;
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{error, warn};

/// Records that came back, and the tickers that did not.
#[derive(Debug, Default)]
pub struct FetchOutcome {
    pub records: Vec<MetricRecord>,
    pub failures: Vec<FetchFailure>,
}

pub async fn fetch_metric_record(
    source: &SharedSource,
    ticker: &str,
    suffix: &str,
) -> Result<MetricRecord, FetchFailure> {
    let symbol = normalise_ticker(ticker, suffix);
    if symbol.is_empty() {
        return Err(FetchFailure::new(ticker, FetchError::InvalidTicker(ticker.to_string())));
    }

    let snapshot = source
        .fetch_snapshot(&symbol)
        .await
        .map_err(|e| FetchFailure::new(&symbol, e))?;

    Ok(snapshot_to_record(&symbol, &snapshot, Utc::now()))
}

/// Normalize, drop blanks and duplicates, keep first-seen order.
pub fn unique_tickers(tickers: &[String], suffix: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    tickers
        .iter()
        .map(|t| normalise_ticker(t, suffix))
        .filter(|t| !t.is_empty() && seen.insert(t.clone()))
        .collect()
}

/// Run `task` for every ticker with at most `concurrency` in flight.
/// Results come back in input order whatever the completion order.
async fn for_each_bounded<T, F, Fut>(
    tickers: Vec<String>,
    concurrency: usize,
    task: F,
) -> Vec<(String, Option<T>)>
where
    T: Send + 'static,
    F: Fn(String) -> Fut,
    Fut: Future<Output = T> + Send + 'static,
{
    let sem = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut handles: Vec<(String, JoinHandle<Option<T>>)> = Vec::with_capacity(tickers.len());

    for ticker in tickers {
        let sem = Arc::clone(&sem);
        let fut = task(ticker.clone());
        let handle = tokio::spawn(async move {
            let _permit = sem.acquire_owned().await.ok()?;
            Some(fut.await)
        });
        handles.push((ticker, handle));
    }

    let mut out = Vec::with_capacity(handles.len());
    for (ticker, handle) in handles {
        match handle.await {
            Ok(v) => out.push((ticker, v)),
            Err(e) => {
                error!("Task panic for {}: {}", ticker, e);
                out.push((ticker, None));
            }
        }
    }
    out
}

pub async fn fetch_records(
    source: &SharedSource,
    tickers: &[String],
    suffix: &str,
    concurrency: usize,
) -> FetchOutcome {
    let symbols = unique_tickers(tickers, suffix);

    let results = for_each_bounded(symbols, concurrency, |ticker| {
        let source = Arc::clone(source);
        let suffix = suffix.to_string();
        async move { fetch_metric_record(&source, &ticker, &suffix).await }
    })
    .await;

    let mut outcome = FetchOutcome::default();
    for (ticker, result) in results {
        match result {
            Some(Ok(record)) => outcome.records.push(record),
            Some(Err(failure)) => {
                warn!("{:#}", failure);
                outcome.failures.push(failure);
            }
            None => outcome.failures.push(FetchFailure::new(
                ticker,
                FetchError::NotFound("fetch task did not complete".into()),
            )),
        }
    }
    outcome
}

/// Market cap per ticker. A failed lookup counts as "no value".
pub async fn fetch_market_caps(
    source: &SharedSource,
    tickers: &[String],
    suffix: &str,
    concurrency: usize,
) -> Vec<(String, Option<f64>)> {
    let symbols = unique_tickers(tickers, suffix);

    let results = for_each_bounded(symbols, concurrency, |ticker| {
        let source = Arc::clone(source);
        async move { source.fetch_market_cap(&ticker).await }
    })
    .await;

    results
        .into_iter()
        .map(|(ticker, result)| match result {
            Some(Ok(cap)) => (ticker, cap.filter(|c| c.is_finite())),
            Some(Err(e)) => {
                warn!("market cap for {}: {}", ticker, e);
                (ticker, None)
            }
            None => (ticker, None),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::testing::{snapshot, MockSource};

    fn source() -> SharedSource {
        Arc::new(
            MockSource::default()
                .with_snapshot("BHP.AX", snapshot("Basic Materials", Some(11.0), None, Some(0.2), None, None))
                .with_snapshot("CBA.AX", snapshot("Financial Services", Some(24.0), None, None, None, None))
                .with_cap("BHP.AX", Some(2.2e11))
                .with_cap("CBA.AX", None),
        )
    }

    #[tokio::test]
    async fn test_fetch_metric_record_normalises_ticker() {
        let rec = fetch_metric_record(&source(), "bhp", ".AX").await.unwrap();
        assert_eq!(rec.ticker, "BHP.AX");
        assert_eq!(rec.sector, "Basic Materials");
        assert!((rec.return_on_equity.unwrap() - 20.0).abs() < 1e-9);
        assert_eq!(rec.moving_average_200d, Some(10.0));
    }

    #[tokio::test]
    async fn test_fetch_failure_records_reason() {
        let err = fetch_metric_record(&source(), "zzz", ".AX").await.unwrap_err();
        assert_eq!(err.ticker, "ZZZ.AX");
        assert!(matches!(err.error, FetchError::NotFound(_)));

        let err = fetch_metric_record(&source(), "  ", ".AX").await.unwrap_err();
        assert!(matches!(err.error, FetchError::InvalidTicker(_)));
    }

    #[tokio::test]
    async fn test_fetch_records_skips_failures_and_keeps_order() {
        let tickers: Vec<String> = ["CBA", "nope", "BHP.AX", "cba.ax"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let out = fetch_records(&source(), &tickers, ".AX", 2).await;

        let got: Vec<&str> = out.records.iter().map(|r| r.ticker.as_str()).collect();
        assert_eq!(got, vec!["CBA.AX", "BHP.AX"]);
        assert_eq!(out.failures.len(), 1);
        assert_eq!(out.failures[0].ticker, "NOPE.AX");
    }

    #[tokio::test]
    async fn test_fetch_records_empty_universe() {
        let out = fetch_records(&source(), &[], ".AX", 4).await;
        assert!(out.records.is_empty());
        assert!(out.failures.is_empty());
    }

    #[tokio::test]
    async fn test_market_cap_failure_becomes_none() {
        let tickers = vec!["BHP".to_string(), "CBA".to_string(), "XXX".to_string()];
        let caps = fetch_market_caps(&source(), &tickers, ".AX", 0).await;
        assert_eq!(
            caps,
            vec![
                ("BHP.AX".to_string(), Some(2.2e11)),
                ("CBA.AX".to_string(), None),
                ("XXX.AX".to_string(), None),
            ]
        );
    }
}
