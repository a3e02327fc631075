use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use douban_gateway::error::FetchError;
use douban_gateway::fetcher::UpstreamFetcher;
use douban_gateway::proxy_health::ProxyHealthCache;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

const PROBE_ROUTE: &str = "/rexxar/api/v2/subject/recent_hot/movie";
const DATA_ROUTE: &str = "/rexxar/api/v2/subject/recent_hot/tv";

fn payload() -> Value {
    json!({
        "total": 1,
        "items": [{
            "id": "42",
            "title": "Proxied",
            "card_subtitle": "2021 / drama",
            "pic": {"large": "l.jpg", "normal": "n.jpg"},
            "rating": {"value": 8.0}
        }]
    })
}

async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

// Upstream stub serving DATA_ROUTE with a fixed status, counting hits
async fn spawn_upstream(status: StatusCode, hits: Arc<AtomicUsize>) -> String {
    let app = Router::new().route(
        DATA_ROUTE,
        get(move || {
            let hits = hits.clone();
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
                if status.is_success() {
                    (status, Json(payload())).into_response()
                } else {
                    status.into_response()
                }
            }
        }),
    );
    spawn(app).await
}

// Proxy stub: always answers the health probe, serves DATA_ROUTE with `status`
async fn spawn_proxy(status: StatusCode, hits: Arc<AtomicUsize>) -> String {
    let app = Router::new()
        .route(PROBE_ROUTE, get(|| async { StatusCode::OK }))
        .route(
            DATA_ROUTE,
            get(move || {
                let hits = hits.clone();
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    if status.is_success() {
                        (status, Json(payload())).into_response()
                    } else {
                        status.into_response()
                    }
                }
            }),
        );
    spawn(app).await
}

fn fetcher(upstream: &str, proxies: Vec<String>, max_retries: u32) -> UpstreamFetcher {
    let client = reqwest::Client::new();
    let health = ProxyHealthCache::new(client.clone(), proxies);
    UpstreamFetcher::new(client, upstream.to_string(), health, max_retries).with_timings(
        Duration::from_millis(1),
        Duration::from_secs(2),
        Duration::from_secs(2),
    )
}

#[tokio::test]
async fn direct_success_needs_a_single_attempt() {
    let hits = Arc::new(AtomicUsize::new(0));
    let upstream = spawn_upstream(StatusCode::OK, hits.clone()).await;
    let fetcher = fetcher(&upstream, vec![], 3);

    let url = format!("{upstream}{DATA_ROUTE}?start=0&limit=20");
    let data: Value = fetcher.fetch_data(&url).await.unwrap();
    assert_eq!(data["total"], 1);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn exhausted_direct_attempts_fall_back_to_proxy() {
    let direct_hits = Arc::new(AtomicUsize::new(0));
    let proxy_hits = Arc::new(AtomicUsize::new(0));
    let upstream = spawn_upstream(StatusCode::INTERNAL_SERVER_ERROR, direct_hits.clone()).await;
    let proxy = spawn_proxy(StatusCode::OK, proxy_hits.clone()).await;
    let fetcher = fetcher(&upstream, vec![proxy], 2);

    let url = format!("{upstream}{DATA_ROUTE}?start=0&limit=20");
    let data: Value = fetcher.fetch_data(&url).await.unwrap();

    assert_eq!(data["items"][0]["title"], "Proxied");
    // exactly max_retries + 1 direct attempts, then a single proxy attempt
    assert_eq!(direct_hits.load(Ordering::SeqCst), 3);
    assert_eq!(proxy_hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn no_healthy_proxy_propagates_the_direct_error() {
    let direct_hits = Arc::new(AtomicUsize::new(0));
    let upstream = spawn_upstream(StatusCode::INTERNAL_SERVER_ERROR, direct_hits.clone()).await;
    let fetcher = fetcher(&upstream, vec!["http://127.0.0.1:9".to_string()], 1);

    let url = format!("{upstream}{DATA_ROUTE}");
    let err = fetcher.fetch_data::<Value>(&url).await.unwrap_err();

    assert!(matches!(err, FetchError::HttpStatus(500)));
    assert_eq!(direct_hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn failing_proxy_attempt_surfaces_a_proxy_error() {
    let direct_hits = Arc::new(AtomicUsize::new(0));
    let proxy_hits = Arc::new(AtomicUsize::new(0));
    let upstream = spawn_upstream(StatusCode::FORBIDDEN, direct_hits).await;
    let proxy = spawn_proxy(StatusCode::BAD_GATEWAY, proxy_hits.clone()).await;
    let fetcher = fetcher(&upstream, vec![proxy], 0);

    let url = format!("{upstream}{DATA_ROUTE}");
    let err = fetcher.fetch_data::<Value>(&url).await.unwrap_err();

    assert!(matches!(err, FetchError::ProxyStatus(502)));
    assert_eq!(proxy_hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn direct_timeout_recovers_through_the_proxy() {
    let proxy_hits = Arc::new(AtomicUsize::new(0));
    let slow = Router::new().route(
        DATA_ROUTE,
        get(|| async {
            tokio::time::sleep(Duration::from_millis(500)).await;
            Json(payload())
        }),
    );
    let upstream = spawn(slow).await;
    let proxy = spawn_proxy(StatusCode::OK, proxy_hits.clone()).await;

    let client = reqwest::Client::new();
    let health = ProxyHealthCache::new(client.clone(), vec![proxy]);
    let fetcher = UpstreamFetcher::new(client, upstream.clone(), health, 0).with_timings(
        Duration::from_millis(1),
        Duration::from_millis(100),
        Duration::from_secs(2),
    );

    let url = format!("{upstream}{DATA_ROUTE}?start=0&limit=20");
    let data: Value = fetcher.fetch_data(&url).await.unwrap();
    assert_eq!(data["items"][0]["title"], "Proxied");
    assert_eq!(proxy_hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn url_outside_the_upstream_base_skips_the_proxy_phase() {
    let direct_hits = Arc::new(AtomicUsize::new(0));
    let proxy_hits = Arc::new(AtomicUsize::new(0));
    let upstream = spawn_upstream(StatusCode::NOT_FOUND, direct_hits).await;
    let proxy = spawn_proxy(StatusCode::OK, proxy_hits.clone()).await;

    // fetcher believes the canonical base is elsewhere, so the host rewrite
    // precondition fails and the direct error must propagate untouched
    let fetcher = fetcher("https://example.invalid", vec![proxy], 0);
    let url = format!("{upstream}{DATA_ROUTE}");
    let err = fetcher.fetch_data::<Value>(&url).await.unwrap_err();

    assert!(matches!(err, FetchError::HttpStatus(404)));
    assert_eq!(proxy_hits.load(Ordering::SeqCst), 0);
}
