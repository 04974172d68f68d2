use std::{
    collections::HashMap,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header::AUTHORIZATION, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use subtle::ConstantTimeEq;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Newtype wrapping a request ID string, stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Bearer-token auth settings used by middleware.
#[derive(Debug, Clone)]
pub struct AuthState {
    api_keys: Arc<Vec<String>>,
    pub enabled: bool,
}

impl AuthState {
    /// Builds auth config from an explicit key list. Auth is disabled when
    /// the list is empty.
    #[must_use]
    pub fn new(api_keys: Vec<String>) -> Self {
        let enabled = !api_keys.is_empty();
        Self {
            api_keys: Arc::new(api_keys),
            enabled,
        }
    }

    /// Builds auth config from `HAVENMAP_API_KEYS` (comma-separated bearer tokens).
    ///
    /// In development, empty/missing keys disable auth for local iteration.
    /// In non-development envs, empty/missing keys fail startup.
    ///
    /// # Errors
    ///
    /// Returns an error when no keys are configured outside development.
    pub fn from_env(is_development: bool) -> anyhow::Result<Self> {
        let raw = std::env::var("HAVENMAP_API_KEYS").unwrap_or_default();
        let keys: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToOwned::to_owned)
            .collect();

        if keys.is_empty() {
            if is_development {
                tracing::warn!(
                    "HAVENMAP_API_KEYS not set; bearer auth disabled in development environment"
                );
                return Ok(Self::new(Vec::new()));
            }

            anyhow::bail!(
                "HAVENMAP_API_KEYS is required outside development; provide comma-separated bearer tokens"
            );
        }

        Ok(Self::new(keys))
    }

    fn allows(&self, token: &str) -> bool {
        // Constant-time comparison against every configured key, so timing
        // never narrows down a partially correct token.
        self.api_keys
            .iter()
            .fold(false, |found, key| {
                found | bool::from(key.as_bytes().ct_eq(token.as_bytes()))
            })
    }
}

#[derive(Debug, Clone, Copy)]
struct RateLimitWindow {
    started_at: Instant,
    count: usize,
}

/// The verdict for one request against its client's current window.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: usize,
    pub remaining: usize,
    pub reset_secs: u64,
}

/// Sliding fixed-window limiter keyed by client IP.
#[derive(Debug, Clone)]
pub struct RateLimitState {
    max_requests: usize,
    window: Duration,
    windows: Arc<Mutex<HashMap<IpAddr, RateLimitWindow>>>,
}

impl RateLimitState {
    #[must_use]
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            windows: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Records one request from `ip` and decides whether it fits the budget.
    pub async fn check(&self, ip: IpAddr) -> RateLimitDecision {
        let mut windows = self.windows.lock().await;

        // Expired windows are dead weight; drop them while we hold the lock.
        let window_len = self.window;
        windows.retain(|_, w| w.started_at.elapsed() < window_len);

        // The retain above already evicted this client's window if it had
        // expired, so any entry found here is live.
        let window = windows.entry(ip).or_insert(RateLimitWindow {
            started_at: Instant::now(),
            count: 0,
        });

        let allowed = window.count < self.max_requests;
        if allowed {
            window.count += 1;
        }

        let reset_secs = self
            .window
            .saturating_sub(window.started_at.elapsed())
            .as_secs();

        RateLimitDecision {
            allowed,
            limit: self.max_requests,
            remaining: self.max_requests.saturating_sub(window.count),
            reset_secs,
        }
    }
}

#[derive(Debug, Serialize)]
struct MiddlewareErrorBody {
    error: MiddlewareError,
}

#[derive(Debug, Serialize)]
struct MiddlewareError {
    code: &'static str,
    message: &'static str,
}

/// Axum middleware that extracts or generates a request ID.
///
/// If the incoming request has an `x-request-id` header, that value is used.
/// Otherwise a new `UUIDv4` is generated. The ID is:
/// - Inserted into request extensions as [`RequestId`]
/// - Set on the response as the `x-request-id` header
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;

    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert("x-request-id", val);
    }

    res
}

/// Middleware enforcing Bearer token auth when enabled.
pub async fn require_bearer_auth(
    State(auth): State<AuthState>,
    req: Request,
    next: Next,
) -> Response {
    if !auth.enabled {
        return next.run(req).await;
    }

    let token = extract_bearer_token(req.headers().get(AUTHORIZATION));

    match token {
        Some(token) if auth.allows(token) => next.run(req).await,
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(MiddlewareErrorBody {
                error: MiddlewareError {
                    code: "unauthorized",
                    message: "missing or invalid bearer token",
                },
            }),
        )
            .into_response(),
    }
}

/// Middleware enforcing the per-IP request budget.
///
/// Every response passing through carries `X-RateLimit-Limit`,
/// `X-RateLimit-Remaining`, and `X-RateLimit-Reset` headers; exceedances get
/// a `429` with the same headers.
pub async fn enforce_rate_limit(
    State(rate_limit): State<RateLimitState>,
    req: Request,
    next: Next,
) -> Response {
    let ip = client_ip(&req);
    let decision = rate_limit.check(ip).await;

    let mut res = if decision.allowed {
        next.run(req).await
    } else {
        tracing::debug!(%ip, "rate limit exceeded");
        (
            StatusCode::TOO_MANY_REQUESTS,
            Json(MiddlewareErrorBody {
                error: MiddlewareError {
                    code: "rate_limited",
                    message: "rate limit exceeded",
                },
            }),
        )
            .into_response()
    };

    let headers = res.headers_mut();
    if let Ok(val) = HeaderValue::from_str(&decision.limit.to_string()) {
        headers.insert("x-ratelimit-limit", val);
    }
    if let Ok(val) = HeaderValue::from_str(&decision.remaining.to_string()) {
        headers.insert("x-ratelimit-remaining", val);
    }
    if let Ok(val) = HeaderValue::from_str(&decision.reset_secs.to_string()) {
        headers.insert("x-ratelimit-reset", val);
    }

    res
}

/// Best-effort client IP: `X-Forwarded-For`'s first hop when present (the
/// expected deployment is behind a proxy), else the socket peer address.
fn client_ip(req: &Request) -> IpAddr {
    let forwarded = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|v| v.trim().parse::<IpAddr>().ok());

    forwarded.unwrap_or_else(|| {
        req.extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED), |info| info.0.ip())
    })
}

fn extract_bearer_token(value: Option<&HeaderValue>) -> Option<&str> {
    value
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_bearer_token_accepts_valid_header() {
        let header = HeaderValue::from_static("Bearer test-token");
        assert_eq!(extract_bearer_token(Some(&header)), Some("test-token"));
    }

    #[test]
    fn extract_bearer_token_rejects_non_bearer_header() {
        let header = HeaderValue::from_static("Basic abc123");
        assert_eq!(extract_bearer_token(Some(&header)), None);
    }

    #[test]
    fn auth_state_with_no_keys_is_disabled() {
        let state = AuthState::new(Vec::new());
        assert!(!state.enabled);
    }

    #[test]
    fn auth_state_allows_configured_keys_only() {
        let state = AuthState::new(vec!["alpha".to_string(), "beta".to_string()]);
        assert!(state.enabled);
        assert!(state.allows("alpha"));
        assert!(state.allows("beta"));
        assert!(!state.allows("gamma"));
        assert!(!state.allows("alph"));
    }

    #[tokio::test]
    async fn rate_limit_budget_is_per_ip() {
        let state = RateLimitState::new(2, Duration::from_secs(60));
        let a: IpAddr = "10.0.0.1".parse().unwrap();
        let b: IpAddr = "10.0.0.2".parse().unwrap();

        assert!(state.check(a).await.allowed);
        assert!(state.check(a).await.allowed);
        let third = state.check(a).await;
        assert!(!third.allowed);
        assert_eq!(third.remaining, 0);

        // A different client has its own budget.
        assert!(state.check(b).await.allowed);
    }

    #[tokio::test]
    async fn rate_limit_reports_remaining_and_reset() {
        let state = RateLimitState::new(5, Duration::from_secs(10));
        let ip: IpAddr = "192.168.1.9".parse().unwrap();

        let first = state.check(ip).await;
        assert!(first.allowed);
        assert_eq!(first.limit, 5);
        assert_eq!(first.remaining, 4);
        assert!(first.reset_secs <= 10);
    }

    #[tokio::test]
    async fn rate_limit_window_resets_after_expiry() {
        let state = RateLimitState::new(1, Duration::from_millis(20));
        let ip: IpAddr = "10.1.1.1".parse().unwrap();

        assert!(state.check(ip).await.allowed);
        assert!(!state.check(ip).await.allowed);

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(state.check(ip).await.allowed);
    }
}
