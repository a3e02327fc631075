use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::{debug, info};

// Per-route rate limit policy
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub window_ms: i64,
    pub max_requests: u32,
    pub message: String,
}

impl RateLimitConfig {
    pub fn new(window_ms: i64, max_requests: u32, message: &str) -> Self {
        Self {
            window_ms,
            max_requests,
            message: message.to_string(),
        }
    }
}

// Rate limit entry - tracks requests per client identifier
struct RateLimitRecord {
    count: u32,
    reset_time: i64, // epoch millis
}

// Outcome of an admission check, also drives the X-RateLimit-* headers
pub struct RateLimitResult {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_time: i64,
}

// Fixed-window rate limiter. Bursts straddling a window boundary can pass up
// to 2x max_requests, that is the accepted tradeoff of the algorithm.
pub struct RateLimiter {
    records: DashMap<String, RateLimitRecord>,
    default_config: RateLimitConfig,
    routes: Vec<(String, RateLimitConfig)>,
}

impl RateLimiter {
    pub fn new(default_config: RateLimitConfig) -> Self {
        Self {
            records: DashMap::new(),
            default_config,
            routes: Vec::new(),
        }
    }

    // Register a route-specific policy, matched by exact path
    pub fn with_route(mut self, path: &str, config: RateLimitConfig) -> Self {
        self.routes.push((path.to_string(), config));
        self
    }

    pub fn config_for(&self, path: &str) -> &RateLimitConfig {
        self.routes
            .iter()
            .find(|(route, _)| route == path)
            .map(|(_, config)| config)
            .unwrap_or(&self.default_config)
    }

    pub fn check(&self, identifier: &str, config: &RateLimitConfig) -> RateLimitResult {
        let now = Utc::now().timestamp_millis();

        let mut entry = self
            .records
            .entry(identifier.to_string())
            .or_insert_with(|| RateLimitRecord {
                count: 0,
                reset_time: now + config.window_ms,
            });

        // Window expired? Start a fresh one
        if now > entry.reset_time {
            entry.count = 1;
            entry.reset_time = now + config.window_ms;
            return RateLimitResult {
                allowed: true,
                remaining: config.max_requests.saturating_sub(1),
                reset_time: entry.reset_time,
            };
        }

        if entry.count >= config.max_requests {
            return RateLimitResult {
                allowed: false,
                remaining: 0,
                reset_time: entry.reset_time,
            };
        }

        entry.count += 1;
        RateLimitResult {
            allowed: true,
            remaining: config.max_requests - entry.count,
            reset_time: entry.reset_time,
        }
    }

    // Drop records whose window has passed, so the map does not grow forever
    pub fn evict_expired(&self) {
        let now = Utc::now().timestamp_millis();
        let before = self.records.len();
        self.records.retain(|_, record| now <= record.reset_time);
        let evicted = before - self.records.len();
        if evicted > 0 {
            debug!(evicted, "evicted expired rate limit records");
        }
    }

    #[cfg(test)]
    fn tracked_clients(&self) -> usize {
        self.records.len()
    }
}

// Periodic sweep of expired rate limit records
pub async fn eviction_sweeper(limiter: Arc<RateLimiter>, period: Duration) {
    let mut ticker = interval(period);
    info!("rate limit eviction sweeper started (period: {:?})", period);

    loop {
        ticker.tick().await;
        limiter.evict_expired();
    }
}
