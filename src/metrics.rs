use lazy_static::lazy_static;
use prometheus::{register_counter, register_histogram, Counter, Histogram};

lazy_static! {
    pub static ref REQUEST_TOTAL: Counter =
        register_counter!("douban_requests_total", "Total number of requests").unwrap();
    pub static ref REQUEST_LATENCY: Histogram = register_histogram!(
        "douban_request_latency_seconds",
        "Request latency in seconds"
    )
    .unwrap();
    pub static ref UPSTREAM_RETRIES: Counter = register_counter!(
        "douban_upstream_retries_total",
        "Direct upstream attempts beyond the first"
    )
    .unwrap();
    pub static ref PROXY_FALLBACKS: Counter = register_counter!(
        "douban_proxy_fallbacks_total",
        "Requests that fell back to a proxy mirror"
    )
    .unwrap();
    pub static ref RATE_LIMITED_TOTAL: Counter = register_counter!(
        "douban_rate_limited_total",
        "Requests rejected by the rate limiter"
    )
    .unwrap();
}
