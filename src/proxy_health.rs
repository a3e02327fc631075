use dashmap::DashMap;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

// Probe results are trusted for 5 minutes before re-checking
const FRESHNESS_WINDOW: Duration = Duration::from_secs(300);
// Probe timeout (kept short, a slow proxy is as good as a dead one)
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);
// Cheapest request the mirrors answer: one row of the hot-movie listing
const PROBE_PATH: &str = "/rexxar/api/v2/subject/recent_hot/movie?start=0&limit=1";

struct HealthRecord {
    healthy: bool,
    last_check: Instant,
}

// Time-boxed liveness cache for the fixed proxy list
pub struct ProxyHealthCache {
    client: reqwest::Client,
    proxies: Vec<String>,
    records: DashMap<String, HealthRecord>,
    freshness: Duration,
}

impl ProxyHealthCache {
    pub fn new(client: reqwest::Client, proxies: Vec<String>) -> Self {
        Self {
            client,
            proxies,
            records: DashMap::new(),
            freshness: FRESHNESS_WINDOW,
        }
    }

    // Shrink the cache window, used to force re-probing in tests
    pub fn with_freshness(mut self, freshness: Duration) -> Self {
        self.freshness = freshness;
        self
    }

    pub fn proxies(&self) -> &[String] {
        &self.proxies
    }

    // Cached answer if fresh, otherwise a HEAD probe. Never fails: probe
    // errors are recorded as unhealthy and the caller gets a plain bool.
    pub async fn is_healthy(&self, proxy: &str) -> bool {
        if let Some(record) = self.records.get(proxy) {
            if record.last_check.elapsed() < self.freshness {
                debug!(proxy, healthy = record.healthy, "using cached proxy health");
                return record.healthy;
            }
        }

        let probe_url = format!("{proxy}{PROBE_PATH}");
        let healthy = match self
            .client
            .head(&probe_url)
            .timeout(PROBE_TIMEOUT)
            .send()
            .await
        {
            Ok(res) => res.status().is_success(),
            Err(err) => {
                warn!(proxy, "health probe failed: {err}");
                false
            }
        };

        self.records.insert(
            proxy.to_string(),
            HealthRecord {
                healthy,
                last_check: Instant::now(),
            },
        );
        info!(proxy, healthy, "proxy health probed");
        healthy
    }

    // First healthy proxy in declared order, no load balancing
    pub async fn select_healthy_proxy(&self) -> Option<String> {
        for proxy in &self.proxies {
            if self.is_healthy(proxy).await {
                return Some(proxy.clone());
            }
        }
        None
    }
}
