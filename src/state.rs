use crate::fetcher::UpstreamFetcher;
use crate::rate_limit::RateLimiter;
use std::sync::Arc;

// app's shared state
pub struct AppState {
    pub fetcher: UpstreamFetcher,
    pub rate_limiter: Arc<RateLimiter>,
    pub cache_ttl: u64,     // Cache-Control max-age in seconds
    pub expose_errors: bool, // include raw errors in responses (debugging)
}
