use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const UNKNOWN_SECTOR: &str = "Unknown";

// ── Metrics ───────────────────────────────────────────────────────────────────

/// Whether a smaller or larger value is the favourable one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    LowerIsBetter,
    HigherIsBetter,
}

/// The five benchmarked ratios.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Metric {
    #[serde(rename = "PE")]
    Pe,
    #[serde(rename = "PB")]
    Pb,
    #[serde(rename = "ROE")]
    Roe,
    #[serde(rename = "DebtEquity")]
    DebtEquity,
    #[serde(rename = "PS")]
    Ps,
}

impl Metric {
    pub const ALL: [Metric; 5] = [
        Metric::Pe,
        Metric::Pb,
        Metric::Roe,
        Metric::DebtEquity,
        Metric::Ps,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Metric::Pe => "PE",
            Metric::Pb => "PB",
            Metric::Roe => "ROE",
            Metric::DebtEquity => "DebtEquity",
            Metric::Ps => "PS",
        }
    }

    pub fn direction(self) -> Direction {
        match self {
            Metric::Roe => Direction::HigherIsBetter,
            _ => Direction::LowerIsBetter,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Metric::Pe => "Price-to-Earnings: lower than sector benchmark is better value.",
            Metric::Pb => "Price-to-Book: lower than sector benchmark is better value.",
            Metric::Roe => {
                "Return on Equity: higher than sector benchmark indicates stronger profitability."
            }
            Metric::DebtEquity => {
                "Debt/Equity: lower than benchmark indicates a stronger balance sheet."
            }
            Metric::Ps => "Price-to-Sales: lower than benchmark is cheaper relative to revenue.",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ── Metric record ─────────────────────────────────────────────────────────────

/// One normalized snapshot per ticker. `None` means the service gave no value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricRecord {
    pub ticker: String,
    pub sector: String,
    pub price: Option<f64>,
    pub moving_average_200d: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub price_to_book: Option<f64>,
    /// Percent, not fraction.
    pub return_on_equity: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub price_to_sales: Option<f64>,
    pub fetched_at: DateTime<Utc>,
}

impl MetricRecord {
    pub fn metric(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Pe => self.pe_ratio,
            Metric::Pb => self.price_to_book,
            Metric::Roe => self.return_on_equity,
            Metric::DebtEquity => self.debt_to_equity,
            Metric::Ps => self.price_to_sales,
        }
    }
}

// ── Raw service payload ───────────────────────────────────────────────────────

/// What the market-data service hands back for one ticker, before cleaning.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSnapshot {
    pub price: Option<f64>,
    /// Daily closes, oldest first.
    pub closes: Vec<f64>,
    pub sector: Option<String>,
    pub trailing_pe: Option<f64>,
    pub price_to_book: Option<f64>,
    /// Fraction as reported (0.15 = 15%).
    pub return_on_equity: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub price_to_sales: Option<f64>,
}

// ── Signals ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendSignal {
    Green,
    Yellow,
    Red,
    /// Price or moving average missing.
    Gray,
}

impl fmt::Display for TrendSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TrendSignal::Green => "green",
            TrendSignal::Yellow => "yellow",
            TrendSignal::Red => "red",
            TrendSignal::Gray => "gray",
        };
        f.write_str(s)
    }
}

/// Traffic-light color of a single metric cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Light {
    Green,
    Yellow,
    Red,
}
