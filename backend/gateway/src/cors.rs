//! Cross-origin policy.
//!
//! `tower-http`'s [`CorsLayer`] decorates responses for allowed origins. It
//! does not refuse anything by itself, so [`origin_guard`] runs in front of it:
//! requests from unlisted origins are rejected before reaching any handler,
//! and successful preflights are answered with `204 No Content`.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{debug, warn};

use crate::error::GatewayError;

/// Local frontend dev server origins.
pub const DEFAULT_ALLOWED_ORIGINS: [&str; 3] = [
    "http://localhost:5173",
    "http://127.0.0.1:5173",
    "https://127.0.0.1:5173",
];

pub const ALLOWED_METHODS: [Method; 6] = [
    Method::OPTIONS,
    Method::GET,
    Method::PUT,
    Method::PATCH,
    Method::POST,
    Method::DELETE,
];

#[derive(Debug, Clone)]
pub struct CorsPolicy {
    origins: Vec<HeaderValue>,
}

impl Default for CorsPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_ALLOWED_ORIGINS)
    }
}

impl CorsPolicy {
    /// Origins that are not valid header values are skipped.
    pub fn new<I, S>(origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let origins = origins
            .into_iter()
            .filter_map(|origin| {
                let origin = origin.as_ref().trim();
                match HeaderValue::from_str(origin) {
                    Ok(_) if origin == "*" => {
                        // credentials are allowed, so a wildcard is never valid
                        warn!("Ignoring wildcard CORS origin");
                        None
                    }
                    Ok(value) if !origin.is_empty() => Some(value),
                    Ok(_) => None,
                    Err(_) => {
                        warn!(origin = %origin, "Ignoring invalid CORS origin");
                        None
                    }
                }
            })
            .collect();
        Self { origins }
    }

    pub fn origins(&self) -> &[HeaderValue] {
        &self.origins
    }

    pub fn allows(&self, origin: &HeaderValue) -> bool {
        self.origins.iter().any(|allowed| allowed == origin)
    }

    /// Response-decorating layer for allowed origins.
    pub fn layer(&self) -> CorsLayer {
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(self.origins.iter().cloned()))
            .allow_methods(ALLOWED_METHODS)
            .allow_headers([
                header::CONTENT_TYPE,
                HeaderName::from_static("x-requested-with"),
                header::AUTHORIZATION,
            ])
            .allow_credentials(true)
    }
}

/// Reject requests from unlisted origins and give preflights a 204.
///
/// Requests without an `Origin` header always pass.
pub async fn origin_guard(
    State(policy): State<Arc<CorsPolicy>>,
    request: Request,
    next: Next,
) -> Response {
    if let Some(origin) = request.headers().get(header::ORIGIN) {
        if !policy.allows(origin) {
            let origin = String::from_utf8_lossy(origin.as_bytes()).into_owned();
            warn!(origin = %origin, path = %request.uri().path(), "Rejected cross-origin request");
            return GatewayError::CorsRejection(origin).into_response();
        }
    }

    let preflight = request.method() == Method::OPTIONS
        && request
            .headers()
            .contains_key(header::ACCESS_CONTROL_REQUEST_METHOD);

    let mut response = next.run(request).await;
    if preflight && response.status().is_success() {
        debug!("Answered CORS preflight");
        *response.status_mut() = StatusCode::NO_CONTENT;
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_allows_dev_hosts() {
        let policy = CorsPolicy::default();
        assert!(policy.allows(&HeaderValue::from_static("http://localhost:5173")));
        assert!(policy.allows(&HeaderValue::from_static("https://127.0.0.1:5173")));
        assert!(!policy.allows(&HeaderValue::from_static("https://localhost:5173")));
        assert!(!policy.allows(&HeaderValue::from_static("https://evil.example")));
    }

    #[test]
    fn skips_blank_and_invalid_origins() {
        let policy = CorsPolicy::new(["https://app.example", " ", "bad\norigin", "*"]);
        assert_eq!(policy.origins().len(), 1);
        assert!(policy.allows(&HeaderValue::from_static("https://app.example")));
    }
}
