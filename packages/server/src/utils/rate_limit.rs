use std::net::IpAddr;
use std::time::{Duration, Instant};

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use dashmap::DashMap;
use tracing::{debug, warn};

use crate::config::RateLimitConfig;
use crate::error::AppError;
use crate::extractors::client::client_ip;
use crate::state::AppState;

#[derive(Debug, Clone)]
struct TokenBucket {
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    fn full(capacity: f64, now: Instant) -> Self {
        Self {
            tokens: capacity,
            last_refill: now,
        }
    }

    fn refill(&mut self, capacity: f64, rate: f64, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * rate).min(capacity);
        self.last_refill = now;
    }
}

/// Per-client token buckets keyed by IP address.
pub struct RateLimiter {
    buckets: DashMap<IpAddr, TokenBucket>,
    rate: f64,
    capacity: f64,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            buckets: DashMap::new(),
            rate: config.requests_per_second,
            capacity: f64::from(config.burst.max(1)),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.rate > 0.0
    }

    /// Take one token for `ip`. On rejection returns the whole seconds until
    /// a token is available again.
    pub fn check(&self, ip: IpAddr) -> Result<(), u64> {
        self.check_at(ip, Instant::now())
    }

    fn check_at(&self, ip: IpAddr, now: Instant) -> Result<(), u64> {
        if !self.is_enabled() {
            return Ok(());
        }

        let mut bucket = self
            .buckets
            .entry(ip)
            .or_insert_with(|| TokenBucket::full(self.capacity, now));
        bucket.refill(self.capacity, self.rate, now);

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            Ok(())
        } else {
            let wait = (1.0 - bucket.tokens) / self.rate;
            Err(wait.ceil().max(1.0) as u64)
        }
    }

    /// Drop buckets untouched for longer than `idle`. Returns how many were removed.
    pub fn cleanup(&self, idle: Duration) -> usize {
        self.cleanup_at(idle, Instant::now())
    }

    fn cleanup_at(&self, idle: Duration, now: Instant) -> usize {
        let before = self.buckets.len();
        self.buckets
            .retain(|_, b| now.saturating_duration_since(b.last_refill) < idle);
        before - self.buckets.len()
    }

    pub fn tracked_clients(&self) -> usize {
        self.buckets.len()
    }
}

/// Spawn the periodic pruning of idle buckets.
pub fn spawn_cleanup(limiter: std::sync::Arc<RateLimiter>, interval: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = limiter.cleanup(interval);
            if removed > 0 {
                debug!(removed, remaining = limiter.tracked_clients(), "Pruned idle rate limit buckets");
            }
        }
    });
}

/// Middleware rejecting clients that exhausted their bucket with `429`.
pub async fn rate_limit(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let trusted_proxies = state.config.rate_limit.trusted_proxies;
    if let Some(ip) = client_ip(req.headers(), req.extensions(), trusted_proxies)
        && let Err(retry_after) = state.rate_limiter.check(ip)
    {
        warn!(%ip, retry_after, "Rate limit exceeded");
        return Err(AppError::RateLimited { retry_after });
    }
    Ok(next.run(req).await)
}
