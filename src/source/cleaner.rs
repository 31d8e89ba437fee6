use crate::models::{MetricRecord, RawSnapshot, UNKNOWN_SECTOR};
use chrono::{DateTime, Utc};

/// Closes needed before a 200-day average is defined.
pub const MA_WINDOW: usize = 200;

// ── Tickers ───────────────────────────────────────────────────────────────────

/// Canonical exchange-qualified form.
/// "bhp" → "BHP.AX" | " cba.ax " → "CBA.AX"
pub fn normalise_ticker(raw: &str, suffix: &str) -> String {
    let symbol = raw.trim().to_uppercase();
    let suffix = suffix.trim().to_uppercase();
    if symbol.is_empty() || suffix.is_empty() || symbol.ends_with(&suffix) {
        symbol
    } else {
        format!("{}{}", symbol, suffix)
    }
}

// ── Numbers ───────────────────────────────────────────────────────────────────

/// NaN and ±inf are "no value".
pub fn finite(v: Option<f64>) -> Option<f64> {
    v.filter(|x| x.is_finite())
}

/// Simple moving average of the last `window` closes, or `None` if history is short.
pub fn moving_average(closes: &[f64], window: usize) -> Option<f64> {
    if window == 0 || closes.len() < window {
        return None;
    }
    let tail = &closes[closes.len() - window..];
    Some(tail.iter().sum::<f64>() / window as f64)
}

/// 0.153 → 15.3. Absence stays absence.
pub fn fraction_to_percent(v: Option<f64>) -> Option<f64> {
    finite(v).map(|x| x * 100.0)
}

fn clean_sector(s: Option<&str>) -> String {
    match s.map(str::trim) {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => UNKNOWN_SECTOR.to_string(),
    }
}

// ── Snapshot → MetricRecord ───────────────────────────────────────────────────

pub fn snapshot_to_record(
    ticker: &str,
    snapshot: &RawSnapshot,
    fetched_at: DateTime<Utc>,
) -> MetricRecord {
    let closes: Vec<f64> = snapshot
        .closes
        .iter()
        .copied()
        .filter(|c| c.is_finite())
        .collect();

    MetricRecord {
        ticker: ticker.to_string(),
        sector: clean_sector(snapshot.sector.as_deref()),
        price: finite(snapshot.price),
        moving_average_200d: moving_average(&closes, MA_WINDOW),
        pe_ratio: finite(snapshot.trailing_pe),
        price_to_book: finite(snapshot.price_to_book),
        return_on_equity: fraction_to_percent(snapshot.return_on_equity),
        debt_to_equity: finite(snapshot.debt_to_equity),
        price_to_sales: finite(snapshot.price_to_sales),
        fetched_at,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalise_ticker() {
        assert_eq!(normalise_ticker("bhp", ".AX"), "BHP.AX");
        assert_eq!(normalise_ticker(" cba.ax ", ".AX"), "CBA.AX");
        assert_eq!(normalise_ticker("WES.AX", ".ax"), "WES.AX");
        assert_eq!(normalise_ticker("", ".AX"), "");
    }

    #[test]
    fn test_moving_average_needs_full_window() {
        let closes: Vec<f64> = (1..=199).map(|i| i as f64).collect();
        assert_eq!(moving_average(&closes, MA_WINDOW), None);

        let closes: Vec<f64> = (1..=250).map(|i| i as f64).collect();
        // last 200 closes are 51..=250
        assert_eq!(moving_average(&closes, MA_WINDOW), Some(150.5));
    }

    #[test]
    fn test_roe_scaled_only_when_present() {
        assert_eq!(fraction_to_percent(Some(0.25)), Some(25.0));
        assert_eq!(fraction_to_percent(Some(0.0)), Some(0.0));
        assert_eq!(fraction_to_percent(None), None);
        assert_eq!(fraction_to_percent(Some(f64::NAN)), None);
    }

    #[test]
    fn test_snapshot_to_record_keeps_missing_values_missing() {
        let snap = RawSnapshot {
            price: Some(42.0),
            closes: vec![40.0; 10],
            sector: Some("  ".into()),
            trailing_pe: None,
            price_to_book: Some(f64::INFINITY),
            return_on_equity: Some(0.12),
            debt_to_equity: Some(35.0),
            price_to_sales: None,
        };
        let rec = snapshot_to_record("XYZ.AX", &snap, Utc::now());

        assert_eq!(rec.sector, UNKNOWN_SECTOR);
        assert_eq!(rec.price, Some(42.0));
        assert_eq!(rec.moving_average_200d, None);
        assert_eq!(rec.pe_ratio, None);
        assert_eq!(rec.price_to_book, None);
        assert!((rec.return_on_equity.unwrap() - 12.0).abs() < 1e-9);
        assert_eq!(rec.debt_to_equity, Some(35.0));
        assert_eq!(rec.price_to_sales, None);
    }
}
