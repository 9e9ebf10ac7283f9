//! Per-client rate limiting for the authentication endpoints.

#![allow(missing_docs)]

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use grievance_common::AppError;
use tokio::sync::RwLock;

/// Fixed-window limit.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    /// Maximum requests per window.
    pub max_requests: u32,
    /// Window length in seconds.
    pub window_secs: u64,
}

impl RateLimitConfig {
    /// Create a new rate limit config.
    #[must_use]
    pub const fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window_secs,
        }
    }
}

/// Default limits.
pub mod limits {
    use super::RateLimitConfig;

    /// OTP and login endpoints.
    pub const AUTH: RateLimitConfig = RateLimitConfig::new(10, 300);
}

#[derive(Debug, Clone)]
struct RateLimitState {
    count: u32,
    window_start: Instant,
}

impl RateLimitState {
    fn new() -> Self {
        Self {
            count: 0,
            window_start: Instant::now(),
        }
    }
}

/// In-memory fixed-window rate limiter keyed by client.
#[derive(Clone, Default)]
pub struct ApiRateLimiter {
    states: Arc<RwLock<HashMap<String, RateLimitState>>>,
}

impl ApiRateLimiter {
    /// Create a new rate limiter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a request is allowed and record it.
    pub async fn check(&self, key: &str, config: &RateLimitConfig) -> RateLimitResult {
        let mut states = self.states.write().await;
        let now = Instant::now();
        let window = Duration::from_secs(config.window_secs);

        let state = states
            .entry(key.to_string())
            .or_insert_with(RateLimitState::new);

        if now.duration_since(state.window_start) >= window {
            state.count = 0;
            state.window_start = now;
        }

        let reset = window
            .saturating_sub(now.duration_since(state.window_start))
            .as_secs();

        if state.count >= config.max_requests {
            return RateLimitResult::Limited {
                retry_after: reset.max(1),
                limit: config.max_requests,
            };
        }

        state.count += 1;
        RateLimitResult::Allowed {
            remaining: config.max_requests.saturating_sub(state.count),
            limit: config.max_requests,
            reset,
        }
    }

    /// Drop keys whose window ended long ago.
    pub async fn cleanup(&self, window_secs: u64) {
        let mut states = self.states.write().await;
        let now = Instant::now();
        let max_age = Duration::from_secs(window_secs * 2);

        states.retain(|_, state| now.duration_since(state.window_start) < max_age);
    }

    /// Number of tracked keys.
    pub async fn key_count(&self) -> usize {
        self.states.read().await.len()
    }
}

/// Rate limit check result.
#[derive(Debug, Clone)]
pub enum RateLimitResult {
    Allowed {
        remaining: u32,
        limit: u32,
        /// Seconds until the window resets.
        reset: u64,
    },
    Limited {
        retry_after: u64,
        limit: u32,
    },
}

/// Limiter plus the limit it enforces, used as middleware state.
#[derive(Clone)]
pub struct RateLimiterState {
    pub limiter: ApiRateLimiter,
    pub config: RateLimitConfig,
    /// Whether forwarding headers identify the client.
    pub trust_proxy_headers: bool,
}

impl Default for RateLimiterState {
    fn default() -> Self {
        Self::new(limits::AUTH)
    }
}

impl RateLimiterState {
    /// Create a limiter enforcing `config`.
    #[must_use]
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            limiter: ApiRateLimiter::new(),
            config,
            trust_proxy_headers: false,
        }
    }

    /// Key clients on forwarding headers set by a trusted proxy.
    #[must_use]
    pub const fn trust_proxy_headers(mut self, trust: bool) -> Self {
        self.trust_proxy_headers = trust;
        self
    }
}

/// Client address. Forwarding headers are only consulted when trusted;
/// otherwise the socket peer is used.
fn extract_client_ip(req: &Request<Body>, trust_proxy_headers: bool) -> Option<IpAddr> {
    if !trust_proxy_headers {
        return peer_ip(req);
    }

    if let Some(xff) = req.headers().get("x-forwarded-for")
        && let Ok(xff) = xff.to_str()
        && let Some(first) = xff.split(',').next()
        && let Ok(ip) = first.trim().parse::<IpAddr>()
    {
        return Some(ip);
    }

    if let Some(real_ip) = req.headers().get("x-real-ip")
        && let Ok(real_ip) = real_ip.to_str()
        && let Ok(ip) = real_ip.trim().parse::<IpAddr>()
    {
        return Some(ip);
    }

    peer_ip(req)
}

fn peer_ip(req: &Request<Body>) -> Option<IpAddr> {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
}

/// Per-IP rate limiting middleware.
pub async fn rate_limit_middleware(
    State(state): State<RateLimiterState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let key = extract_client_ip(&req, state.trust_proxy_headers)
        .map_or_else(|| "unknown".to_string(), |ip| format!("ip:{ip}"));

    match state.limiter.check(&key, &state.config).await {
        RateLimitResult::Allowed {
            remaining,
            limit,
            reset,
        } => {
            let mut response = next.run(req).await;

            let headers = response.headers_mut();
            headers.insert("X-RateLimit-Limit", limit.into());
            headers.insert("X-RateLimit-Remaining", remaining.into());
            headers.insert("X-RateLimit-Reset", reset.into());

            response
        }
        RateLimitResult::Limited { retry_after, .. } => {
            tracing::debug!(client = %key, retry_after, "Rate limited");
            let mut response = AppError::RateLimited.into_response();
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, retry_after.into());
            response
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_allows_up_to_limit() {
        let limiter = ApiRateLimiter::new();
        let config = RateLimitConfig::new(5, 60);

        for _ in 0..5 {
            assert!(matches!(
                limiter.check("ip:10.0.0.1", &config).await,
                RateLimitResult::Allowed { .. }
            ));
        }
    }

    #[tokio::test]
    async fn test_blocks_after_limit() {
        let limiter = ApiRateLimiter::new();
        let config = RateLimitConfig::new(3, 60);

        for _ in 0..3 {
            limiter.check("ip:10.0.0.1", &config).await;
        }

        match limiter.check("ip:10.0.0.1", &config).await {
            RateLimitResult::Limited { retry_after, limit } => {
                assert!(retry_after > 0);
                assert_eq!(limit, 3);
            }
            RateLimitResult::Allowed { .. } => panic!("Expected Limited"),
        }
    }

    #[tokio::test]
    async fn test_separate_clients() {
        let limiter = ApiRateLimiter::new();
        let config = RateLimitConfig::new(2, 60);

        limiter.check("ip:10.0.0.1", &config).await;
        limiter.check("ip:10.0.0.1", &config).await;

        assert!(matches!(
            limiter.check("ip:10.0.0.2", &config).await,
            RateLimitResult::Allowed { .. }
        ));
    }

    #[tokio::test]
    async fn test_remaining_and_reset() {
        let limiter = ApiRateLimiter::new();
        let config = RateLimitConfig::new(10, 60);

        match limiter.check("ip:10.0.0.1", &config).await {
            RateLimitResult::Allowed {
                remaining,
                limit,
                reset,
            } => {
                assert_eq!(limit, 10);
                assert_eq!(remaining, 9);
                assert!(reset <= 60);
            }
            RateLimitResult::Limited { .. } => panic!("Expected Allowed"),
        }
    }

    #[tokio::test]
    async fn test_cleanup_keeps_live_windows() {
        let limiter = ApiRateLimiter::new();
        let config = RateLimitConfig::new(10, 60);

        limiter.check("ip:10.0.0.1", &config).await;
        limiter.check("ip:10.0.0.2", &config).await;
        limiter.cleanup(config.window_secs).await;

        assert_eq!(limiter.key_count().await, 2);
    }

    fn forwarded_request(peer: &str, forwarded_for: &str) -> Request<Body> {
        let mut req = Request::builder()
            .header("x-forwarded-for", forwarded_for)
            .header("x-real-ip", forwarded_for)
            .body(Body::empty())
            .unwrap();
        let peer: SocketAddr = peer.parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(peer));
        req
    }

    #[test]
    fn test_client_ip_from_forwarded_header_when_trusted() {
        let req = forwarded_request("10.0.0.1:443", "203.0.113.7, 10.0.0.1");

        assert_eq!(
            extract_client_ip(&req, true),
            Some("203.0.113.7".parse().unwrap())
        );
    }

    #[test]
    fn test_forwarded_header_ignored_by_default() {
        let req = forwarded_request("198.51.100.9:51000", "203.0.113.7");

        assert_eq!(
            extract_client_ip(&req, false),
            Some("198.51.100.9".parse().unwrap())
        );
        assert!(!RateLimiterState::default().trust_proxy_headers);
    }

    #[test]
    fn test_no_peer_and_untrusted_header() {
        let req = Request::builder()
            .header("x-forwarded-for", "203.0.113.7")
            .body(Body::empty())
            .unwrap();

        assert_eq!(extract_client_ip(&req, false), None);
    }
}
