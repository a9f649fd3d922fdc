//! Fixed-window request rate limiting, keyed by client IP.
//!
//! The counter store is injected rather than module-level state: a single
//! instance uses the in-memory map; a multi-instance deployment can swap
//! in a shared implementation behind the same trait. Counts are
//! approximate and reset on process restart.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::Json;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Counter storage for the fixed-window limiter.
pub trait RateLimitStore: Send + Sync {
    /// Record a hit for `key` at `now` and return the count within the
    /// current window, including this hit.
    fn hit(&self, key: &str, now: Instant) -> u32;
}

/// In-memory window counters for a single-instance deployment.
pub struct InMemoryRateLimitStore {
    window: Duration,
    counters: Mutex<HashMap<String, (Instant, u32)>>,
}

impl InMemoryRateLimitStore {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            counters: Mutex::new(HashMap::new()),
        }
    }
}

impl RateLimitStore for InMemoryRateLimitStore {
    fn hit(&self, key: &str, now: Instant) -> u32 {
        let mut counters = self.counters.lock().expect("rate-limit map poisoned");
        let entry = counters.entry(key.to_string()).or_insert((now, 0));
        if now.duration_since(entry.0) >= self.window {
            // New window
            *entry = (now, 0);
        }
        entry.1 += 1;
        entry.1
    }
}

/// Fixed-window limiter over an injected counter store.
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn RateLimitStore>,
    limit: u32,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn RateLimitStore>, limit: u32) -> Self {
        Self { store, limit }
    }

    /// Whether a request under `key` is within the window's budget.
    pub fn allow(&self, key: &str) -> bool {
        self.store.hit(key, Instant::now()) <= self.limit
    }
}

/// Axum middleware: reject over-limit clients with a 429.
pub async fn rate_limit_middleware(
    State(limiter): State<RateLimiter>,
    request: Request,
    next: Next,
) -> Response {
    let key = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    if limiter.allow(&key) {
        next.run(request).await
    } else {
        tracing::warn!(client = %key, "Rate limit exceeded");
        (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({"error": "rate_limited"})),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_within_a_window() {
        let store = InMemoryRateLimitStore::new(Duration::from_secs(900));
        let now = Instant::now();
        assert_eq!(store.hit("1.2.3.4", now), 1);
        assert_eq!(store.hit("1.2.3.4", now), 2);
        // Separate keys count separately
        assert_eq!(store.hit("5.6.7.8", now), 1);
    }

    #[test]
    fn window_expiry_resets_the_count() {
        let store = InMemoryRateLimitStore::new(Duration::from_secs(900));
        let start = Instant::now();
        for _ in 0..5 {
            store.hit("1.2.3.4", start);
        }
        let later = start + Duration::from_secs(901);
        assert_eq!(store.hit("1.2.3.4", later), 1);
    }

    #[test]
    fn limiter_allows_up_to_the_cap() {
        let store = Arc::new(InMemoryRateLimitStore::new(Duration::from_secs(900)));
        let limiter = RateLimiter::new(store, 100);
        for _ in 0..100 {
            assert!(limiter.allow("1.2.3.4"));
        }
        // Request 101 in the same window is rejected
        assert!(!limiter.allow("1.2.3.4"));
    }
}
