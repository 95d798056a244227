use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::debug;
use wharf_http::protocol::{Request, Response};

use crate::error::{Error, HttpException};
use crate::handler::RequestHandler;
use crate::middleware::Middleware;

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: usize,
}

#[derive(Debug)]
struct Windows {
    by_client: HashMap<Option<IpAddr>, Window>,
    last_sweep: Instant,
}

/// Fixed window request counter per client IP, answering 429 past the limit.
///
/// Requests without a known client address share one bucket.
#[derive(Debug)]
pub struct RateLimit {
    max_requests: usize,
    window: Duration,
    windows: Mutex<Windows>,
}

impl RateLimit {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        let windows = Windows { by_client: HashMap::new(), last_sweep: Instant::now() };
        Self { max_requests, window, windows: Mutex::new(windows) }
    }

    /// Counts one request from `client` and tells whether it is allowed.
    ///
    /// Expired windows of other clients are dropped at most once per window.
    fn acquire(&self, client: Option<IpAddr>, now: Instant) -> bool {
        let mut windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);
        if now.saturating_duration_since(windows.last_sweep) >= self.window {
            windows.by_client.retain(|_, w| now.saturating_duration_since(w.started) < self.window);
            windows.last_sweep = now;
        }

        let window = windows.by_client.entry(client).or_insert(Window { started: now, count: 0 });
        if now.saturating_duration_since(window.started) >= self.window {
            *window = Window { started: now, count: 0 };
        }
        window.count += 1;
        window.count <= self.max_requests
    }
}

impl Default for RateLimit {
    fn default() -> Self {
        Self::new(100, Duration::from_secs(60))
    }
}

#[async_trait]
impl Middleware for RateLimit {
    async fn handle(&self, req: Request, next: &dyn RequestHandler) -> Result<Response, Error> {
        let client = req.client_addr().map(|addr| addr.ip());
        if !self.acquire(client, Instant::now()) {
            debug!(client = ?client, "rate limit exceeded");
            return Err(HttpException::too_many_requests(format!(
                "Too many requests. Limit is {} per {} seconds.",
                self.max_requests,
                self.window.as_secs()
            ))
            .into());
        }
        next.invoke(req).await
    }
}
