//! Token-bucket rate limiting for polite fetching.
//!
//! Wraps any [`Fetcher`] implementation with a requests-per-second ceiling
//! and a bounded burst. One [`RateLimitedFetcher`] owns one [`RateBucket`];
//! clones share it. Requests issued through the same bucket never overlap:
//! the bucket lock is held until the inner request completes.
//!
//! # Example
//!
//! ```rust,no_run
//! use par_core::throttle::RateLimitedFetcher;
//!
//! # use par_core::models::{FetchRequest, FetchResult};
//! # use par_core::traits::Fetcher;
//! # #[derive(Clone)] struct MyFetcher;
//! # impl Fetcher for MyFetcher {
//! #     async fn fetch(&self, _: &FetchRequest) -> Result<FetchResult, par_core::error::AppError> { todo!() }
//! # }
//! // At most 0.8 requests per second, no burst beyond a single request.
//! let fetcher = RateLimitedFetcher::new(MyFetcher, 0.8, 1);
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use crate::error::AppError;
use crate::models::{FetchRequest, FetchResult};
use crate::traits::Fetcher;

/// Token bucket: `capacity` tokens, refilled continuously at `refill_per_sec`.
#[derive(Debug, Clone)]
pub struct RateBucket {
    tokens: f64,
    capacity: f64,
    refill_per_sec: f64,
    last_refill: Instant,
}

impl RateBucket {
    /// A full bucket. `refill_per_sec` must be positive and `capacity` at least 1.
    pub fn new(refill_per_sec: f64, capacity: u32) -> Self {
        Self::starting_at(refill_per_sec, capacity, Instant::now())
    }

    pub fn starting_at(refill_per_sec: f64, capacity: u32, now: Instant) -> Self {
        let capacity = f64::from(capacity.max(1));
        Self {
            tokens: capacity,
            capacity,
            refill_per_sec,
            last_refill: now,
        }
    }

    pub fn tokens(&self) -> f64 {
        self.tokens
    }

    fn refill(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        self.last_refill = now;
    }

    /// Take one token at `now`, or return how long until one is available.
    pub fn try_acquire_at(&mut self, now: Instant) -> Result<(), Duration> {
        self.refill(now);
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            Ok(())
        } else {
            let missing = 1.0 - self.tokens;
            let wait = missing / self.refill_per_sec;
            Err(Duration::try_from_secs_f64(wait).unwrap_or(Duration::MAX))
        }
    }
}

/// A [`Fetcher`] wrapper that acquires a bucket token before every request.
#[derive(Clone)]
pub struct RateLimitedFetcher<F> {
    inner: F,
    bucket: Arc<Mutex<RateBucket>>,
}

impl<F: Fetcher> RateLimitedFetcher<F> {
    pub fn new(inner: F, requests_per_second: f64, burst: u32) -> Self {
        Self {
            inner,
            bucket: Arc::new(Mutex::new(RateBucket::new(requests_per_second, burst))),
        }
    }
}

impl<F: Fetcher> Fetcher for RateLimitedFetcher<F> {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResult, AppError> {
        // Held across the request so calls through one bucket stay sequential.
        let mut bucket = self.bucket.lock().await;

        while let Err(wait) = bucket.try_acquire_at(Instant::now()) {
            tracing::debug!(
                url = %request.url,
                sleep_ms = %wait.as_millis(),
                "Waiting for rate limit token"
            );
            tokio::time::sleep(wait).await;
        }

        let result = self.inner.fetch(request).await;
        drop(bucket);
        result
    }
}
