use crate::fetcher::fetch_market_caps;
use crate::source::SharedSource;
use std::cmp::Ordering;
use tracing::info;

/// Top `n` tickers by market cap, largest first.
///
/// Tickers without a cap are dropped, not ranked last. Equal caps are
/// ordered by ticker so the result never depends on input order.
pub fn rank_by_market_cap(caps: Vec<(String, Option<f64>)>, n: usize) -> Vec<(String, f64)> {
    let mut ranked: Vec<(String, f64)> = caps
        .into_iter()
        .filter_map(|(t, cap)| cap.filter(|c| c.is_finite()).map(|c| (t, c)))
        .collect();

    ranked.sort_by(|(ta, a), (tb, b)| match b.total_cmp(a) {
        Ordering::Equal => ta.cmp(tb),
        ord => ord,
    });
    ranked.truncate(n);
    ranked
}

pub async fn top_n_by_market_cap(
    source: &SharedSource,
    tickers: &[String],
    n: usize,
    suffix: &str,
    concurrency: usize,
) -> Vec<(String, f64)> {
    let caps = fetch_market_caps(source, tickers, suffix, concurrency).await;
    let total = caps.len();
    let ranked = rank_by_market_cap(caps, n);
    info!("Ranked {} of {} tickers by market cap (asked for {})", ranked.len(), total, n);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::testing::MockSource;
    use std::sync::Arc;

    fn caps(items: &[(&str, Option<f64>)]) -> Vec<(String, Option<f64>)> {
        items.iter().map(|(t, c)| (t.to_string(), *c)).collect()
    }

    fn names(ranked: &[(String, f64)]) -> Vec<&str> {
        ranked.iter().map(|(t, _)| t.as_str()).collect()
    }

    #[test]
    fn test_undefined_caps_are_dropped() {
        let input = caps(&[("A", Some(100.0)), ("B", None), ("C", Some(50.0)), ("D", Some(200.0))]);
        assert_eq!(names(&rank_by_market_cap(input, 2)), vec!["D", "A"]);
    }

    #[test]
    fn test_fewer_than_n_is_not_an_error() {
        let input = caps(&[("A", Some(1.0)), ("B", None)]);
        assert_eq!(names(&rank_by_market_cap(input, 100)), vec!["A"]);
        assert!(rank_by_market_cap(Vec::new(), 5).is_empty());
    }

    #[test]
    fn test_ties_break_by_ticker() {
        let forward = caps(&[("ZZZ", Some(10.0)), ("AAA", Some(10.0)), ("MMM", Some(20.0))]);
        let mut backward = forward.clone();
        backward.reverse();
        assert_eq!(names(&rank_by_market_cap(forward, 3)), vec!["MMM", "AAA", "ZZZ"]);
        assert_eq!(names(&rank_by_market_cap(backward, 3)), vec!["MMM", "AAA", "ZZZ"]);
    }

    #[tokio::test]
    async fn test_top_n_skips_failed_lookups() {
        let source: SharedSource = Arc::new(
            MockSource::default()
                .with_cap("A.AX", Some(100.0))
                .with_cap("B.AX", None)
                .with_cap("C.AX", Some(50.0))
                .with_cap("D.AX", Some(200.0)),
        );
        let tickers: Vec<String> = ["A", "B", "C", "D", "E"].iter().map(|s| s.to_string()).collect();
        let top = top_n_by_market_cap(&source, &tickers, 2, ".AX", 3).await;
        assert_eq!(top, vec![("D.AX".to_string(), 200.0), ("A.AX".to_string(), 100.0)]);
    }
}
