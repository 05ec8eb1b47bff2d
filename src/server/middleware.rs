use axum::extract::{ConnectInfo, Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::net::SocketAddr;
use std::sync::Arc;

use super::rate_limit::{RateDecision, RateLimiter};
use crate::classify::ApiError;

/// Accepted `Host` header patterns
#[derive(Debug, Clone)]
pub struct HostAllowlist {
    patterns: Vec<String>,
}

impl HostAllowlist {
    pub fn new(patterns: &[String]) -> Self {
        Self {
            patterns: patterns.iter().map(|p| p.trim().to_lowercase()).collect(),
        }
    }

    pub fn allows_any(&self) -> bool {
        self.patterns.iter().any(|p| p == "*")
    }

    /// Check a host header value; the port is ignored
    pub fn allows(&self, host: &str) -> bool {
        if self.allows_any() {
            return true;
        }

        let host = strip_port(host).to_lowercase();
        self.patterns.iter().any(|pattern| match pattern.strip_prefix("*.") {
            Some(domain) => host
                .strip_suffix(domain)
                .is_some_and(|rest| rest.ends_with('.')),
            None => *pattern == host,
        })
    }
}

fn strip_port(host: &str) -> &str {
    if host.starts_with('[') {
        // IPv6 literal
        return host.find(']').map_or(host, |end| &host[..=end]);
    }
    host.split(':').next().unwrap_or(host)
}

/// Reject requests whose host is not on the allowlist
pub async fn check_host(
    State(allowlist): State<Arc<HostAllowlist>>,
    request: Request,
    next: Next,
) -> Response {
    if allowlist.allows_any() {
        return next.run(request).await;
    }

    let host = request
        .headers()
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .or_else(|| request.uri().host())
        .unwrap_or("");

    if !allowlist.allows(host) {
        tracing::warn!("Rejected request with host header {:?}", host);
        return (StatusCode::BAD_REQUEST, "Invalid host header").into_response();
    }

    next.run(request).await
}

/// Rate-limit budget for a single route
#[derive(Debug, Clone)]
pub struct RouteLimit {
    pub limiter: Arc<RateLimiter>,
    pub route: &'static str,
    pub limit: u32,
}

/// Count the request against the client's budget before it reaches a handler
pub async fn rate_limit(
    State(budget): State<RouteLimit>,
    request: Request,
    next: Next,
) -> Response {
    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "anonymous".to_string());

    match budget
        .limiter
        .check_and_consume(&client, budget.route, budget.limit)
    {
        RateDecision::Allowed => next.run(request).await,
        RateDecision::Denied { retry_after } => {
            tracing::warn!(
                "Rate limit exceeded for {} on {} (retry in {:?})",
                client,
                budget.route,
                retry_after
            );
            ApiError::rate_limited(budget.limit, budget.limiter.window(), retry_after)
                .into_response()
        }
    }
}
