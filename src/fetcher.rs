use crate::error::FetchError;
use crate::metrics::{PROXY_FALLBACKS, UPSTREAM_RETRIES};
use crate::proxy_health::ProxyHealthCache;
use crate::retry;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ORIGIN, REFERER, USER_AGENT};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{info, warn};

const DIRECT_TIMEOUT: Duration = Duration::from_secs(10);
// Proxy timeout a bit shorter, the caller has already waited through retries
const PROXY_TIMEOUT: Duration = Duration::from_secs(8);
const BASE_RETRY_DELAY: Duration = Duration::from_millis(1000);

// The upstream blocks obvious bots, so requests pretend to come from the
// upstream's own web frontend
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36";
const UPSTREAM_REFERER: &str = "https://movie.douban.com/";
const UPSTREAM_ORIGIN: &str = "https://movie.douban.com";

fn emulation_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    headers.insert(REFERER, HeaderValue::from_static(UPSTREAM_REFERER));
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("application/json, text/plain, */*"),
    );
    headers.insert(ORIGIN, HeaderValue::from_static(UPSTREAM_ORIGIN));
    headers
}

// Fetches JSON from the canonical upstream: direct attempts with backoff
// first, then a single shot through the first healthy proxy mirror.
pub struct UpstreamFetcher {
    client: reqwest::Client,
    upstream_base: String,
    proxy_health: ProxyHealthCache,
    headers: HeaderMap,
    max_retries: u32,
    base_retry_delay: Duration,
    direct_timeout: Duration,
    proxy_timeout: Duration,
}

impl UpstreamFetcher {
    pub fn new(
        client: reqwest::Client,
        upstream_base: String,
        proxy_health: ProxyHealthCache,
        max_retries: u32,
    ) -> Self {
        Self {
            client,
            upstream_base: upstream_base.trim_end_matches('/').to_string(),
            proxy_health,
            headers: emulation_headers(),
            max_retries,
            base_retry_delay: BASE_RETRY_DELAY,
            direct_timeout: DIRECT_TIMEOUT,
            proxy_timeout: PROXY_TIMEOUT,
        }
    }

    // Tighten timings for tests
    pub fn with_timings(
        mut self,
        base_retry_delay: Duration,
        direct_timeout: Duration,
        proxy_timeout: Duration,
    ) -> Self {
        self.base_retry_delay = base_retry_delay;
        self.direct_timeout = direct_timeout;
        self.proxy_timeout = proxy_timeout;
        self
    }

    pub fn upstream_base(&self) -> &str {
        &self.upstream_base
    }

    async fn attempt<T: DeserializeOwned>(
        &self,
        url: &str,
        timeout: Duration,
        via_proxy: bool,
    ) -> Result<T, FetchError> {
        let result = self
            .client
            .get(url)
            .headers(self.headers.clone())
            .timeout(timeout)
            .send()
            .await;

        let response = match result {
            Ok(res) => res,
            Err(err) if err.is_timeout() => return Err(FetchError::Timeout),
            Err(err) if via_proxy => return Err(FetchError::ProxyNetwork(err.to_string())),
            Err(err) => return Err(FetchError::Network(err.to_string())),
        };

        let status = response.status();
        if !status.is_success() {
            return Err(if via_proxy {
                FetchError::ProxyStatus(status.as_u16())
            } else {
                FetchError::HttpStatus(status.as_u16())
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|err| FetchError::Decode(err.to_string()))
    }

    pub async fn fetch_data<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        // Direct phase: attempts 0..=max_retries with capped backoff
        let direct = retry::retry(self.max_retries, self.base_retry_delay, |attempt| {
            if attempt > 0 {
                UPSTREAM_RETRIES.inc();
            }
            info!(
                attempt = attempt + 1,
                total = self.max_retries + 1,
                url,
                "direct upstream attempt"
            );
            self.attempt::<T>(url, self.direct_timeout, false)
        })
        .await;

        let direct_err = match direct {
            Ok(value) => {
                info!(url, "direct upstream attempt succeeded");
                return Ok(value);
            }
            Err(err) => err,
        };
        warn!(url, "direct attempts exhausted: {direct_err}");

        // The host rewrite only works when the canonical base is a literal
        // prefix of the request URL
        let Some(path) = url.strip_prefix(&self.upstream_base) else {
            warn!(
                url,
                upstream = %self.upstream_base,
                "url is not under the upstream base, skipping proxy fallback"
            );
            return Err(direct_err);
        };

        // Proxy phase: exactly one attempt through the first healthy mirror
        let Some(proxy) = self.proxy_health.select_healthy_proxy().await else {
            warn!("no healthy proxy available");
            return Err(direct_err);
        };

        let proxy_url = format!("{proxy}{path}");
        info!(%proxy_url, "falling back to proxy");
        PROXY_FALLBACKS.inc();

        match self.attempt::<T>(&proxy_url, self.proxy_timeout, true).await {
            Ok(value) => {
                info!(%proxy_url, "proxy attempt succeeded");
                Ok(value)
            }
            Err(proxy_err) => {
                warn!(%proxy_url, "proxy attempt failed: {proxy_err}");
                Err(proxy_err)
            }
        }
    }
}
