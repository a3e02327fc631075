use axum::http::StatusCode;
use thiserror::Error;

// Errors surfaced by the upstream fetcher. Handlers classify these into
// user-facing responses instead of sniffing message strings.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("upstream HTTP error: status {0}")]
    HttpStatus(u16),

    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    #[error("proxy HTTP error: status {0}")]
    ProxyStatus(u16),

    #[error("proxy request failed: {0}")]
    ProxyNetwork(String),

    #[error("failed to decode upstream response: {0}")]
    Decode(String),
}

// User-facing classification of a fetch failure
pub struct Classified {
    pub status: StatusCode,
    pub error_type: &'static str,
    pub message: &'static str,
    pub retry_suggested: bool,
}

impl FetchError {
    pub fn classify(&self) -> Classified {
        match self {
            FetchError::HttpStatus(429) => Classified {
                status: StatusCode::TOO_MANY_REQUESTS,
                error_type: "rate_limit",
                message: "Upstream is rate limiting us, please wait a moment and retry",
                retry_suggested: false,
            },
            FetchError::HttpStatus(403) => Classified {
                status: StatusCode::FORBIDDEN,
                error_type: "access_denied",
                message: "Upstream denied access, trying alternative routes",
                retry_suggested: false,
            },
            FetchError::HttpStatus(404) => Classified {
                status: StatusCode::NOT_FOUND,
                error_type: "not_found",
                message: "No data found, check the category parameters",
                retry_suggested: false,
            },
            FetchError::Timeout => Classified {
                status: StatusCode::REQUEST_TIMEOUT,
                error_type: "timeout",
                message: "Connection timed out, retrying over another route",
                retry_suggested: true,
            },
            FetchError::Network(_) => Classified {
                status: StatusCode::SERVICE_UNAVAILABLE,
                error_type: "network_error",
                message: "Network error, falling back to alternative connection",
                retry_suggested: true,
            },
            FetchError::ProxyStatus(_) | FetchError::ProxyNetwork(_) => Classified {
                status: StatusCode::BAD_GATEWAY,
                error_type: "proxy_error",
                message: "Proxy is temporarily unavailable, please retry",
                retry_suggested: true,
            },
            FetchError::HttpStatus(_) | FetchError::Decode(_) => Classified {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                error_type: "unknown_error",
                message: "Failed to fetch upstream data, please retry later",
                retry_suggested: false,
            },
        }
    }
}
