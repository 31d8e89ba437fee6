//! Yahoo Finance JSON payloads.
//!
//! Numeric fields arrive as `{"raw": 12.3, "fmt": "12.30"}`, as `{}` when the
//! value is unknown, and occasionally as `{"raw": "Infinity"}`. All of those
//! except a finite number map to `None`.

use crate::error::FetchError;
use serde::Deserialize;
use serde_json::Value;

// ── Shared ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    description: String,
}

impl ApiError {
    fn into_fetch_error(self) -> FetchError {
        FetchError::NotFound(format!("{}: {}", self.code, self.description))
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawValue {
    #[serde(default)]
    raw: Option<Value>,
}

impl RawValue {
    fn value(&self) -> Option<f64> {
        self.raw.as_ref()?.as_f64().filter(|v| v.is_finite())
    }
}

fn raw(v: &Option<RawValue>) -> Option<f64> {
    v.as_ref().and_then(RawValue::value)
}

// ── Chart (price history) ─────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: ChartMeta,
    #[serde(default)]
    indicators: Indicators,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    #[serde(default)]
    regular_market_price: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteIndicator>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteIndicator {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartData {
    pub price: Option<f64>,
    /// Oldest first, null bars dropped.
    pub closes: Vec<f64>,
}

pub fn parse_chart(body: &str) -> Result<ChartData, FetchError> {
    let env: ChartEnvelope =
        serde_json::from_str(body).map_err(|e| FetchError::Malformed(e.to_string()))?;

    if let Some(err) = env.chart.error {
        return Err(err.into_fetch_error());
    }

    let result = env
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| FetchError::NotFound("empty chart result".into()))?;

    let closes = result
        .indicators
        .quote
        .into_iter()
        .next()
        .map(|q| q.close.into_iter().flatten().filter(|c| c.is_finite()).collect())
        .unwrap_or_default();

    Ok(ChartData {
        price: result.meta.regular_market_price.filter(|p| p.is_finite()),
        closes,
    })
}

// ── Quote summary (fundamentals) ──────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct SummaryEnvelope {
    #[serde(rename = "quoteSummary")]
    quote_summary: SummaryBody,
}

#[derive(Debug, Deserialize)]
struct SummaryBody {
    #[serde(default)]
    result: Option<Vec<SummaryResult>>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryResult {
    #[serde(default)]
    asset_profile: Option<AssetProfile>,
    #[serde(default)]
    summary_detail: Option<SummaryDetail>,
    #[serde(default)]
    default_key_statistics: Option<KeyStatistics>,
    #[serde(default)]
    financial_data: Option<FinancialData>,
    #[serde(default)]
    price: Option<PriceModule>,
}

#[derive(Debug, Default, Deserialize)]
struct AssetProfile {
    #[serde(default)]
    sector: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SummaryDetail {
    #[serde(default, rename = "trailingPE")]
    trailing_pe: Option<RawValue>,
    #[serde(default, rename = "priceToSalesTrailing12Months")]
    price_to_sales: Option<RawValue>,
    #[serde(default, rename = "marketCap")]
    market_cap: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KeyStatistics {
    #[serde(default)]
    price_to_book: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FinancialData {
    #[serde(default)]
    return_on_equity: Option<RawValue>,
    #[serde(default)]
    debt_to_equity: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceModule {
    #[serde(default)]
    regular_market_price: Option<RawValue>,
    #[serde(default)]
    market_cap: Option<RawValue>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fundamentals {
    pub sector: Option<String>,
    pub price: Option<f64>,
    pub trailing_pe: Option<f64>,
    pub price_to_book: Option<f64>,
    pub return_on_equity: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub price_to_sales: Option<f64>,
    pub market_cap: Option<f64>,
}

pub fn parse_summary(body: &str) -> Result<Fundamentals, FetchError> {
    let env: SummaryEnvelope =
        serde_json::from_str(body).map_err(|e| FetchError::Malformed(e.to_string()))?;

    if let Some(err) = env.quote_summary.error {
        return Err(err.into_fetch_error());
    }

    let r = env
        .quote_summary
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| FetchError::NotFound("empty quoteSummary result".into()))?;

    let detail = r.summary_detail.unwrap_or_default();
    let stats = r.default_key_statistics.unwrap_or_default();
    let fin = r.financial_data.unwrap_or_default();
    let price = r.price.unwrap_or_default();

    Ok(Fundamentals {
        sector: r.asset_profile.and_then(|p| p.sector),
        price: raw(&price.regular_market_price),
        trailing_pe: raw(&detail.trailing_pe),
        price_to_book: raw(&stats.price_to_book),
        return_on_equity: raw(&fin.return_on_equity),
        debt_to_equity: raw(&fin.debt_to_equity),
        price_to_sales: raw(&detail.price_to_sales),
        market_cap: raw(&price.market_cap).or_else(|| raw(&detail.market_cap)),
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
