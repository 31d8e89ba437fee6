pub mod cleaner;
pub mod http_client;
pub mod parsers;

use crate::config::SourceConfig;
use crate::error::FetchError;
use crate::models::RawSnapshot;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use url::Url;

use self::http_client::HttpClient;
use self::parsers::{parse_chart, parse_summary};

const SNAPSHOT_MODULES: &str =
    "assetProfile,summaryDetail,defaultKeyStatistics,financialData,price";
const MARKET_CAP_MODULES: &str = "price,summaryDetail";

// ── Source trait ──────────────────────────────────────────────────────────────

/// Swappable market-data service. Tickers passed in are already normalized.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    async fn fetch_snapshot(&self, ticker: &str) -> Result<RawSnapshot, FetchError>;

    /// `Ok(None)` when the service knows the ticker but reports no capitalization.
    async fn fetch_market_cap(&self, ticker: &str) -> Result<Option<f64>, FetchError>;
}

pub type SharedSource = Arc<dyn MarketDataSource>;

// ── Yahoo Finance ─────────────────────────────────────────────────────────────

/// Session crumb. `Pending` means the next summary request handshakes first.
#[derive(Debug, Default)]
enum Crumb {
    #[default]
    Pending,
    Ready(String),
    Unavailable,
}

pub struct YahooSource {
    client: HttpClient,
    config: SourceConfig,
    crumb: Mutex<Crumb>,
}

impl YahooSource {
    pub fn new(config: &SourceConfig) -> Result<Self, FetchError> {
        Ok(Self {
            client: HttpClient::new(config)?,
            config: config.clone(),
            crumb: Mutex::new(Crumb::Pending),
        })
    }

    fn parse_url(base: &str, ticker: &str) -> Result<Url, FetchError> {
        let joined = format!("{}/{}", base.trim_end_matches('/'), ticker);
        Url::parse(&joined).map_err(|e| FetchError::InvalidTicker(format!("{ticker}: {e}")))
    }

    /// e.g. BHP.AX → .../v8/finance/chart/BHP.AX?range=2y&interval=1d
    fn chart_url(&self, ticker: &str) -> Result<Url, FetchError> {
        let mut url = Self::parse_url(&self.config.chart_url, ticker)?;
        url.query_pairs_mut()
            .append_pair("range", &self.config.history_range)
            .append_pair("interval", "1d");
        Ok(url)
    }

    fn summary_url(&self, ticker: &str, modules: &str, crumb: Option<&str>) -> Result<Url, FetchError> {
        let mut url = Self::parse_url(&self.config.summary_url, ticker)?;
        {
            let mut q = url.query_pairs_mut();
            q.append_pair("modules", modules);
            if let Some(c) = crumb {
                q.append_pair("crumb", c);
            }
        }
        Ok(url)
    }

    /// Crumb handshake, done once per session. A failed handshake is
    /// remembered as "no crumb" and requests go out without one.
    async fn crumb(&self) -> Option<String> {
        if !self.config.use_crumb {
            return None;
        }
        let mut state = self.crumb.lock().await;
        if matches!(*state, Crumb::Pending) {
            *state = match self.fetch_crumb().await {
                Ok(c) => Crumb::Ready(c),
                Err(e) => {
                    warn!("Crumb handshake failed, continuing without: {}", e);
                    Crumb::Unavailable
                }
            };
        }
        match &*state {
            Crumb::Ready(c) => Some(c.clone()),
            _ => None,
        }
    }

    /// A 401 means the session cookie or crumb went stale. The failing
    /// request is not retried; the next one handshakes again.
    async fn expire_crumb(&self, ticker: &str) {
        if !self.config.use_crumb {
            return;
        }
        warn!(
            "{}: session rejected (HTTP 401), crumb expired and will be renewed",
            ticker
        );
        *self.crumb.lock().await = Crumb::Pending;
    }

    async fn fetch_crumb(&self) -> Result<String, FetchError> {
        let cookie_url = Url::parse(&self.config.cookie_url)
            .map_err(|e| FetchError::Malformed(format!("cookie_url: {e}")))?;
        let crumb_url = Url::parse(&self.config.crumb_url)
            .map_err(|e| FetchError::Malformed(format!("crumb_url: {e}")))?;

        self.client.touch(&cookie_url).await?;
        let crumb = self.client.get_text(&crumb_url).await?.trim().to_string();
        if crumb.is_empty() || crumb.contains('<') {
            return Err(FetchError::Malformed("unexpected crumb body".into()));
        }
        debug!("Obtained crumb");
        Ok(crumb)
    }

    async fn fetch_fundamentals(
        &self,
        ticker: &str,
        modules: &str,
    ) -> Result<parsers::Fundamentals, FetchError> {
        let crumb = self.crumb().await;
        let url = self.summary_url(ticker, modules, crumb.as_deref())?;
        let body = match self.client.get_text(&url).await {
            Err(FetchError::Status(401)) => {
                self.expire_crumb(ticker).await;
                return Err(FetchError::Status(401));
            }
            other => other?,
        };
        parse_summary(&body)
    }
}

#[async_trait]
impl MarketDataSource for YahooSource {
    async fn fetch_snapshot(&self, ticker: &str) -> Result<RawSnapshot, FetchError> {
        let fundamentals = self.fetch_fundamentals(ticker, SNAPSHOT_MODULES).await?;

        let body = self.client.get_text(&self.chart_url(ticker)?).await?;
        let chart = parse_chart(&body)?;
        debug!(
            "{}: {} closes, sector={:?}",
            ticker,
            chart.closes.len(),
            fundamentals.sector
        );

        Ok(RawSnapshot {
            price: fundamentals.price.or(chart.price),
            closes: chart.closes,
            sector: fundamentals.sector,
            trailing_pe: fundamentals.trailing_pe,
            price_to_book: fundamentals.price_to_book,
            return_on_equity: fundamentals.return_on_equity,
            debt_to_equity: fundamentals.debt_to_equity,
            price_to_sales: fundamentals.price_to_sales,
        })
    }

    async fn fetch_market_cap(&self, ticker: &str) -> Result<Option<f64>, FetchError> {
        let fundamentals = self.fetch_fundamentals(ticker, MARKET_CAP_MODULES).await?;
        Ok(fundamentals.market_cap)
    }
}

// ── Test double ───────────────────────────────────────────────────────────────


#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[test]
    fn test_urls_are_ticker_scoped() {
        let src = YahooSource::new(&SourceConfig::default()).unwrap();

        let chart = src.chart_url("BHP.AX").unwrap();
        assert!(chart.path().ends_with("/v8/finance/chart/BHP.AX"));
        assert_eq!(chart.query(), Some("range=2y&interval=1d"));

        let summary = src.summary_url("CBA.AX", MARKET_CAP_MODULES, Some("ab/c")).unwrap();
        assert!(summary.path().ends_with("/quoteSummary/CBA.AX"));
        assert!(summary.query().unwrap().contains("crumb=ab%2Fc"));
    }

    /// Local HTTP stub: every quoteSummary call is rejected with 401, the
    /// crumb endpoint counts how often it is asked.
    async fn stale_session_server(crumb_hits: Arc<AtomicUsize>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let Ok((mut sock, _)) = listener.accept().await else { return };
                let crumb_hits = crumb_hits.clone();
                tokio::spawn(async move {
                    let mut buf = Vec::new();
                    let mut chunk = [0u8; 1024];
                    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                        match sock.read(&mut chunk).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => buf.extend_from_slice(&chunk[..n]),
                        }
                    }
                    let request = String::from_utf8_lossy(&buf);
                    let (status, body) = if request.starts_with("GET /getcrumb") {
                        crumb_hits.fetch_add(1, Ordering::SeqCst);
                        ("200 OK", "crumb123")
                    } else if request.starts_with("GET /quoteSummary") {
                        ("401 Unauthorized", "{}")
                    } else {
                        ("200 OK", "")
                    };
                    let resp = format!(
                        "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                        body.len()
                    );
                    let _ = sock.write_all(resp.as_bytes()).await;
                });
            }
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_unauthorized_response_renews_crumb() {
        let crumb_hits = Arc::new(AtomicUsize::new(0));
        let base = stale_session_server(crumb_hits.clone()).await;
        let config = SourceConfig {
            summary_url: format!("{base}/quoteSummary"),
            cookie_url: format!("{base}/cookie"),
            crumb_url: format!("{base}/getcrumb"),
            request_delay_ms: 0,
            jitter_ms: 0,
            timeout_secs: 5,
            ..SourceConfig::default()
        };
        let src = YahooSource::new(&config).unwrap();

        let first = src.fetch_market_cap("BHP.AX").await;
        assert!(matches!(first, Err(FetchError::Status(401))));
        assert_eq!(crumb_hits.load(Ordering::SeqCst), 1);

        let second = src.fetch_market_cap("CBA.AX").await;
        assert!(matches!(second, Err(FetchError::Status(401))));
        assert_eq!(crumb_hits.load(Ordering::SeqCst), 2);
    }
}
