use crate::config::SourceConfig;
use crate::error::FetchError;
use rand::Rng;
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;
use url::Url;

pub struct HttpClient {
    inner: reqwest::Client,
    config: SourceConfig,
}

impl HttpClient {
    pub fn new(config: &SourceConfig) -> Result<Self, FetchError> {
        let inner = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            // The crumb is only honoured together with the session cookie
            .cookie_store(true)
            .build()?;

        Ok(Self {
            inner,
            config: config.clone(),
        })
    }

    /// Fetch a URL as text. One attempt, no retry.
    pub async fn get_text(&self, url: &Url) -> Result<String, FetchError> {
        self.polite_delay().await;
        debug!("GET {}", url);

        let resp = self.inner.get(url.clone()).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        Ok(resp.text().await?)
    }

    /// Visit a page only for its cookies; the status is irrelevant.
    pub async fn touch(&self, url: &Url) -> Result<(), FetchError> {
        debug!("GET {} (cookies)", url);
        self.inner.get(url.clone()).send().await?;
        Ok(())
    }

    /// Sleep for the configured delay + random jitter.
    async fn polite_delay(&self) {
        let jitter = rand::thread_rng().gen_range(0..=self.config.jitter_ms);
        let total = Duration::from_millis(self.config.request_delay_ms + jitter);
        if !total.is_zero() {
            sleep(total).await;
        }
    }
}
