use clap::Parser;
use douban_gateway::config::Args;
use douban_gateway::fetcher::UpstreamFetcher;
use douban_gateway::proxy_health::ProxyHealthCache;
use douban_gateway::rate_limit::{self, RateLimitConfig, RateLimiter};
use douban_gateway::{app, AppState};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

// How often expired rate limit records get swept
const EVICTION_PERIOD: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // parse cli arguments
    let args = Args::parse();
    let proxies = args.proxy_list();

    let client = reqwest::Client::new();
    let proxy_health = ProxyHealthCache::new(client.clone(), proxies.clone());
    let fetcher = UpstreamFetcher::new(
        client,
        args.upstream.clone(),
        proxy_health,
        args.max_retries,
    );

    let rate_limiter = Arc::new(
        RateLimiter::new(RateLimitConfig::new(
            (args.rate_window * 1000) as i64,
            args.rate_limit,
            "Too many requests, please slow down",
        ))
        .with_route(
            "/api/douban/categories",
            RateLimitConfig::new(60_000, 30, "Too many category requests, try again shortly"),
        ),
    );

    // background sweep so the rate limit map does not grow forever
    tokio::spawn(rate_limit::eviction_sweeper(
        rate_limiter.clone(),
        EVICTION_PERIOD,
    ));

    let state = Arc::new(AppState {
        fetcher,
        rate_limiter,
        cache_ttl: args.cache_ttl,
        expose_errors: args.expose_errors,
    });

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind listener");

    info!("gateway running on http://localhost:{}", args.port);
    info!("upstream: {}", args.upstream);
    info!("proxy mirrors: {}", proxies.join(", "));
    info!(
        "rate limit: {} requests per {} seconds (default route)",
        args.rate_limit, args.rate_window
    );

    axum::serve(listener, app(state))
        .await
        .expect("server error");
}
