//! Rate limiting — fixed per-client request windows.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use dashmap::DashMap;
use tracing::warn;

use mintgate_core::clock::Clock;

use crate::error::AppError;

/// One rate-limit rule: at most `max_requests` per `window_secs`, with
/// the message returned when a client runs over.
#[derive(Debug, Clone, Copy)]
pub struct RatePolicy {
    pub max_requests: u32,
    pub window_secs: i64,
    pub message: &'static str,
}

impl RatePolicy {
    /// Ceiling shared by every route: 100 requests per 15 minutes.
    pub fn global() -> Self {
        Self {
            max_requests: 100,
            window_secs: 15 * 60,
            message: "Too many requests from this IP, please try again later.",
        }
    }

    /// Budget for the deployment routes: 5 attempts per hour.
    pub fn deploy() -> Self {
        Self {
            max_requests: 5,
            window_secs: 60 * 60,
            message: "Too many deployment attempts. Please wait an hour before trying again.",
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started_at: i64,
    count: u32,
}

/// Counts requests per client over fixed windows.
///
/// State is process-local, like the in-memory nonce registry: windows
/// reset on restart, and replicas do not share budgets.
pub struct RateLimiter {
    policy: RatePolicy,
    clock: Arc<dyn Clock>,
    windows: DashMap<String, Window>,
}

impl RateLimiter {
    pub fn new(policy: RatePolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            policy,
            clock,
            windows: DashMap::new(),
        }
    }

    /// Count one request from `client`, rejecting it once the budget for
    /// the live window is spent.
    pub fn check(&self, client: &str) -> Result<(), AppError> {
        let now = self.clock.now().timestamp();

        // Drop lapsed windows before the lookup so the map only ever
        // holds live ones.
        self.windows
            .retain(|_, window| now.saturating_sub(window.started_at) < self.policy.window_secs);

        let mut window = self.windows.entry(client.to_owned()).or_insert(Window {
            started_at: now,
            count: 0,
        });
        if window.count >= self.policy.max_requests {
            warn!(
                client,
                count = window.count,
                max = self.policy.max_requests,
                "rate limit exceeded"
            );
            return Err(AppError::RateLimited(self.policy.message.to_owned()));
        }
        window.count += 1;
        Ok(())
    }

    /// Number of clients with a live window.
    pub fn tracked_clients(&self) -> usize {
        self.windows.len()
    }
}

/// Axum middleware: rejects requests with `429 Too Many Requests` once
/// the client's budget for the current window is spent.
pub async fn enforce(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    limiter.check(&client_key(&request))?;
    Ok(next.run(request).await)
}

/// Budget key for a request: the first `X-Forwarded-For` hop when a
/// proxy supplies one, else the peer address.
fn client_key(request: &Request) -> String {
    let forwarded = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|hop| !hop.is_empty());
    if let Some(hop) = forwarded {
        return hop.to_owned();
    }
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_owned())
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use chrono::{DateTime, Duration, Utc};

    use mintgate_core::clock::ManualClock;

    use super::*;

    const NOW: i64 = 1_700_000_000;

    fn limiter(max_requests: u32, window_secs: i64) -> (RateLimiter, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(
            DateTime::<Utc>::from_timestamp(NOW, 0).unwrap(),
        ));
        let limiter = RateLimiter::new(
            RatePolicy {
                max_requests,
                window_secs,
                message: "slow down",
            },
            Arc::clone(&clock) as Arc<dyn Clock>,
        );
        (limiter, clock)
    }

    #[test]
    fn allows_up_to_the_budget_then_rejects() {
        let (limiter, _clock) = limiter(3, 60);
        for _ in 0..3 {
            assert!(limiter.check("10.0.0.1").is_ok());
        }
        let err = limiter.check("10.0.0.1").unwrap_err();
        assert!(matches!(err, AppError::RateLimited(_)));
    }

    #[test]
    fn budget_resets_when_the_window_lapses() {
        let (limiter, clock) = limiter(2, 60);
        assert!(limiter.check("10.0.0.1").is_ok());
        assert!(limiter.check("10.0.0.1").is_ok());
        assert!(limiter.check("10.0.0.1").is_err());

        clock.advance(Duration::seconds(60));
        assert!(limiter.check("10.0.0.1").is_ok());
    }

    #[test]
    fn clients_are_budgeted_independently() {
        let (limiter, _clock) = limiter(1, 60);
        assert!(limiter.check("10.0.0.1").is_ok());
        assert!(limiter.check("10.0.0.2").is_ok());
        assert!(limiter.check("10.0.0.1").is_err());
    }

    #[test]
    fn lapsed_windows_are_swept() {
        let (limiter, clock) = limiter(5, 60);
        assert!(limiter.check("10.0.0.1").is_ok());
        assert!(limiter.check("10.0.0.2").is_ok());
        assert_eq!(limiter.tracked_clients(), 2);

        clock.advance(Duration::seconds(60));
        assert!(limiter.check("10.0.0.3").is_ok());
        assert_eq!(limiter.tracked_clients(), 1);
    }

    #[test]
    fn forwarded_header_wins_over_peer_address() {
        let request = axum::http::Request::builder()
            .header("x-forwarded-for", "203.0.113.9, 10.0.0.1")
            .body(Body::empty())
            .unwrap();
        assert_eq!(client_key(&request), "203.0.113.9");
    }

    #[test]
    fn peer_address_is_used_without_a_proxy() {
        let mut request = axum::http::Request::builder().body(Body::empty()).unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 8080))));
        assert_eq!(client_key(&request), "127.0.0.1");
    }

    #[test]
    fn missing_client_identity_shares_one_bucket() {
        let request = axum::http::Request::builder().body(Body::empty()).unwrap();
        assert_eq!(client_key(&request), "unknown");
    }
}
