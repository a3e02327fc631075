use crate::metrics::RATE_LIMITED_TOTAL;
use crate::state::AppState;
use axum::extract::{Request, State};
use axum::http::header::HeaderValue;
use axum::http::{HeaderMap, HeaderName, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::warn;

// Baseline hardening headers, stamped on every response that passes through
const SECURITY_HEADERS: &[(&str, &str)] = &[
    ("x-frame-options", "DENY"),
    ("x-content-type-options", "nosniff"),
    ("referrer-policy", "origin-when-cross-origin"),
    ("x-xss-protection", "1; mode=block"),
];

// Client identifier: forwarded IP plus a short User-Agent digest, so distinct
// browsers behind one NAT get separate counters. Advisory, not unforgeable.
pub fn client_identifier(headers: &HeaderMap) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty());
    let real_ip = headers
        .get("x-real-ip")
        .and_then(|value| value.to_str().ok());
    let ip = forwarded.or(real_ip).unwrap_or("unknown");

    let user_agent = headers
        .get("user-agent")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");
    let mut hasher = Sha256::new();
    hasher.update(user_agent);
    let digest = format!("{:x}", hasher.finalize());

    format!("{ip}:{}", &digest[..16])
}

fn set_rate_limit_headers(headers: &mut HeaderMap, limit: u32, remaining: u32, reset_time: i64) {
    headers.insert(
        HeaderName::from_static("x-ratelimit-limit"),
        HeaderValue::from(limit),
    );
    headers.insert(
        HeaderName::from_static("x-ratelimit-remaining"),
        HeaderValue::from(remaining),
    );
    headers.insert(
        HeaderName::from_static("x-ratelimit-reset"),
        HeaderValue::from(reset_time),
    );
}

fn set_security_headers(headers: &mut HeaderMap) {
    for (name, value) in SECURITY_HEADERS {
        headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }
}

// Admission check in front of the API routes: resolve the route policy,
// check the client's window, reject with 429 or pass through, and stamp
// the X-RateLimit-* headers either way.
pub async fn security_middleware(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    let path = req.uri().path().to_string();
    let client_id = client_identifier(req.headers());
    let config = state.rate_limiter.config_for(&path);
    let result = state.rate_limiter.check(&client_id, config);

    if !result.allowed {
        RATE_LIMITED_TOTAL.inc();
        warn!(%path, %client_id, "rate limit exceeded");

        let mut response = (
            StatusCode::TOO_MANY_REQUESTS,
            Json(serde_json::json!({ "error": config.message })),
        )
            .into_response();
        set_rate_limit_headers(
            response.headers_mut(),
            config.max_requests,
            0,
            result.reset_time,
        );
        set_security_headers(response.headers_mut());
        return response;
    }

    let limit = config.max_requests;
    let mut response = next.run(req).await;
    set_rate_limit_headers(
        response.headers_mut(),
        limit,
        result.remaining,
        result.reset_time,
    );
    set_security_headers(response.headers_mut());
    response
}
