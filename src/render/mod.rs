//! Plain-terminal rendering of a [`DashboardReport`].
//!
//! Every function returns a `String`; printing is left to the caller.

use crate::benchmark::{BenchmarkResolver, BenchmarkRow, BenchmarkSource};
use crate::config::DisplayOptions;
use crate::models::{Light, Metric, MetricRecord, TrendSignal};
use crate::pipeline::DashboardReport;
use crate::utils::{fmt_market_cap, fmt_opt, MISSING};
use anyhow::Result;
use crossterm::style::{Color, Stylize};
use serde::Serialize;
use std::fmt::Write;

const RULE: &str = "─────────────────────────────────────────────────────────────────────────────────────────────";

/// How a table should be drawn.
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    pub display: DisplayOptions,
    pub color: bool,
}

impl DisplayOptions {
    pub fn shows(&self, metric: Metric) -> bool {
        match metric {
            Metric::Pe => self.pe,
            Metric::Pb => self.pb,
            Metric::Roe => self.roe,
            Metric::DebtEquity => self.debt_equity,
            Metric::Ps => self.ps,
        }
    }
}

fn light_color(light: Light) -> Color {
    match light {
        Light::Green => Color::Green,
        Light::Yellow => Color::Yellow,
        Light::Red => Color::Red,
    }
}

fn trend_light(trend: TrendSignal) -> Option<Light> {
    match trend {
        TrendSignal::Green => Some(Light::Green),
        TrendSignal::Yellow => Some(Light::Yellow),
        TrendSignal::Red => Some(Light::Red),
        TrendSignal::Gray => None,
    }
}

/// Pad first, then color, so escape codes never break alignment.
fn cell(text: &str, width: usize, light: Option<Light>, color: bool) -> String {
    let padded = format!("{:>width$}", text, width = width);
    match light {
        Some(l) if color => padded.with(light_color(l)).to_string(),
        _ => padded,
    }
}

fn metric_decimals(metric: Metric) -> usize {
    match metric {
        Metric::Roe | Metric::DebtEquity => 1,
        _ => 2,
    }
}

fn visible_metrics(display: &DisplayOptions) -> Vec<Metric> {
    Metric::ALL.into_iter().filter(|m| display.shows(*m)).collect()
}

pub fn render_dashboard(report: &DashboardReport, opts: RenderOptions) -> String {
    let metrics = visible_metrics(&opts.display);
    let mut out = String::new();

    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(
        out,
        "  ASX Price Dashboard — {} (benchmark pool: top {})",
        report.generated_at.format("%Y-%m-%d %H:%M UTC"),
        report.pool_size
    );
    let _ = writeln!(out, "{}", RULE);

    if report.rows.is_empty() {
        let _ = writeln!(out, "  No stock data available.");
        return out;
    }

    let mut header = format!("{:<8} {:<24} {:>9}", "Ticker", "Sector", "Price");
    for m in &metrics {
        let _ = write!(header, " {:>10}", m.label());
    }
    if opts.display.trend {
        let _ = write!(header, " {:>7}", "Trend");
    }
    let _ = write!(header, " {:>5}", "Value");
    let _ = writeln!(out, "{}", header);

    for row in &report.rows {
        let sector: String = row.record.sector.chars().take(24).collect();
        let mut line = format!(
            "{:<8} {:<24} {:>9}",
            row.record.ticker,
            sector,
            fmt_opt(row.record.price, 2)
        );
        for m in &metrics {
            let (text, light) = match row.cell(*m) {
                Some(c) => (fmt_opt(c.value, metric_decimals(*m)), c.light),
                None => (MISSING.to_string(), None),
            };
            let _ = write!(line, " {}", cell(&text, 10, light, opts.color));
        }
        if opts.display.trend {
            let _ = write!(
                line,
                " {}",
                cell(&row.trend.to_string(), 7, trend_light(row.trend), opts.color)
            );
        }
        let _ = write!(line, " {:>5}", row.value);
        let _ = writeln!(out, "{}", line);
    }

    let s = &report.stats;
    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(
        out,
        "  {} of {} tickers fetched, {} failed | {} sectors benchmarked from {} pooled tickers",
        s.focus_fetched, s.focus_requested, s.focus_failed, s.dynamic_sectors, s.pool_ranked
    );
    out
}

/// Per-sector benchmark view. `*` marks a value taken from the static table.
pub fn render_benchmarks(resolver: &BenchmarkResolver) -> String {
    let mut out = String::new();
    let mut header = format!("{:<24} {:>4}", "Sector", "n");
    for m in Metric::ALL {
        let _ = write!(header, " {:>11}", m.label());
    }
    let _ = writeln!(out, "{}", header);

    for row in resolver.rows() {
        let mut line = format!("{:<24} {:>4}", row.sector, row.sample_size);
        for (metric, value, source) in &row.values {
            let mark = if *source == Some(BenchmarkSource::Fallback) { "*" } else { " " };
            let text = format!("{}{}", fmt_opt(*value, metric_decimals(*metric)), mark);
            let _ = write!(line, " {:>11}", text);
        }
        let _ = writeln!(out, "{}", line);
    }
    let _ = writeln!(out, "  * static fallback value");
    out
}

pub fn render_rationale() -> String {
    let mut out = String::from("Rationale:\n");
    for m in Metric::ALL {
        let _ = writeln!(out, "  - {:<10} {}", m.label(), m.description());
    }
    let _ = writeln!(
        out,
        "  - {:<10} Price vs 200-day MA: above = green, within 10% below = yellow, further below = red.",
        "Trend"
    );
    let _ = writeln!(
        out,
        "  - {:<10} Count of green metrics plus a green trend (0-6).",
        "Value"
    );
    let _ = writeln!(
        out,
        "  Lower-is-better: green at or under 80% of benchmark, yellow up to benchmark, red above.\n  ROE: green at or over 120% of benchmark, yellow down to benchmark, red below."
    );
    out
}

pub fn render_records(records: &[MetricRecord]) -> String {
    let mut out = String::new();
    for r in records {
        let _ = writeln!(out, "{} ({})", r.ticker, r.sector);
        let _ = writeln!(out, "  Price      : {}", fmt_opt(r.price, 2));
        let _ = writeln!(out, "  200d MA    : {}", fmt_opt(r.moving_average_200d, 2));
        for m in Metric::ALL {
            let _ = writeln!(out, "  {:<11}: {}", m.label(), fmt_opt(r.metric(m), metric_decimals(m)));
        }
    }
    out
}

pub fn render_ranking(ranked: &[(String, f64)]) -> String {
    let mut out = String::new();
    for (i, (ticker, cap)) in ranked.iter().enumerate() {
        let _ = writeln!(out, "{:>4}. {:<10} {:>10}", i + 1, ticker, fmt_market_cap(*cap));
    }
    out
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    report: &'a DashboardReport,
    benchmarks: Vec<BenchmarkRow>,
}

pub fn render_json(report: &DashboardReport) -> Result<String> {
    let out = JsonOutput {
        report,
        benchmarks: report.resolver.rows(),
    };
    Ok(serde_json::to_string_pretty(&out)?)
}
