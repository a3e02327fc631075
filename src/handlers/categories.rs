use crate::error::FetchError;
use crate::metrics::{REQUEST_LATENCY, REQUEST_TOTAL};
use crate::models::{CategoryApiResponse, CategoryResult, ErrorResponse, VideoItem};
use crate::state::AppState;
use axum::extract::{Query, State};
use axum::http::header::{HeaderName, HeaderValue, CACHE_CONTROL};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::error;

#[derive(Deserialize, Debug)]
pub struct CategoryQuery {
    kind: Option<String>,
    category: Option<String>,
    #[serde(rename = "type")]
    type_: Option<String>,
    limit: Option<u32>,
    start: Option<u32>,
}

fn bad_request(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "error": message })),
    )
        .into_response()
}

fn fetch_failure(err: &FetchError, expose_errors: bool) -> Response {
    let classified = err.classify();
    let body = ErrorResponse {
        error: classified.message.to_string(),
        error_type: classified.error_type,
        details: expose_errors.then(|| err.to_string()),
        retry_suggested: classified.retry_suggested,
    };
    (classified.status, Json(body)).into_response()
}

pub async fn categories_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CategoryQuery>,
) -> Response {
    REQUEST_TOTAL.inc();
    let start_time = Instant::now();

    let kind = query.kind.as_deref().unwrap_or("movie");
    if !["movie", "tv"].contains(&kind) {
        return bad_request("kind must be movie or tv");
    }
    let (Some(category), Some(type_)) = (query.category.as_deref(), query.type_.as_deref()) else {
        return bad_request("missing required parameter: category or type");
    };
    let limit = query.limit.unwrap_or(20);
    if !(1..=100).contains(&limit) {
        return bad_request("limit must be between 1 and 100");
    }
    let start = query.start.unwrap_or(0);

    let url = format!(
        "{}/rexxar/api/v2/subject/recent_hot/{kind}?start={start}&limit={limit}&category={category}&type={type_}",
        state.fetcher.upstream_base()
    );

    let data = match state.fetcher.fetch_data::<CategoryApiResponse>(&url).await {
        Ok(data) => data,
        Err(err) => {
            error!(kind, category, content_type = type_, "category fetch failed: {err}");
            return fetch_failure(&err, state.expose_errors);
        }
    };

    let list: Vec<VideoItem> = data.items.into_iter().map(VideoItem::from).collect();
    let body = CategoryResult {
        code: 200,
        message: "ok".to_string(),
        list,
    };

    let max_age = state.cache_ttl;
    let mut response = Json(body).into_response();
    if let Ok(value) = HeaderValue::from_str(&format!(
        "public, max-age={max_age}, s-maxage={max_age}"
    )) {
        response.headers_mut().insert(CACHE_CONTROL, value);
    }
    if let Ok(value) = HeaderValue::from_str(&format!("public, s-maxage={max_age}")) {
        response
            .headers_mut()
            .insert(HeaderName::from_static("cdn-cache-control"), value);
    }

    REQUEST_LATENCY.observe(start_time.elapsed().as_secs_f64());
    response
}
