//! Rate limiting for the reload endpoints.
//!
//! Every forced reload hits the spreadsheet service, so clients get a small
//! per-minute budget. Clients are told apart by their peer address; the
//! `X-Forwarded-For`/`X-Real-IP` headers only count when the limiter is told
//! it sits behind a trusted proxy.

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use std::{
    collections::HashMap,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

/// Simple in-memory rate limiter using sliding window.
#[derive(Clone, Debug)]
pub struct RateLimiter {
    /// Maximum requests allowed per window
    max_requests: u32,
    window: Duration,
    /// Take the client address from proxy headers.
    trust_forwarded: bool,
    /// Request times per IP
    requests: Arc<Mutex<HashMap<IpAddr, Vec<Instant>>>>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            trust_forwarded: false,
            requests: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn per_minute(max_requests: u32) -> Self {
        Self::new(max_requests, Duration::from_secs(60))
    }

    /// Only enable behind a reverse proxy that overwrites the forwarding
    /// headers, otherwise clients can pick their own bucket.
    pub fn trust_forwarded_headers(mut self, trust: bool) -> Self {
        self.trust_forwarded = trust;
        self
    }

    /// Returns true if allowed, false if rate limited.
    pub fn check(&self, ip: IpAddr) -> bool {
        let now = Instant::now();

        let mut requests = self.requests.lock().expect("rate limiter lock poisoned");
        let entry = requests.entry(ip).or_default();

        entry.retain(|&t| now.duration_since(t) < self.window);

        if entry.len() < self.max_requests as usize {
            entry.push(now);
            true
        } else {
            false
        }
    }

    /// Drop clients with no requests inside the window.
    pub fn cleanup(&self) {
        let now = Instant::now();
        let mut requests = self.requests.lock().expect("rate limiter lock poisoned");

        requests.retain(|_, timestamps| {
            timestamps.retain(|&t| now.duration_since(t) < self.window);
            !timestamps.is_empty()
        });
    }

    pub fn tracked_clients(&self) -> usize {
        self.requests.lock().expect("rate limiter lock poisoned").len()
    }
}

pub async fn rate_limit_middleware(
    State(rate_limiter): State<RateLimiter>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let ip = extract_client_ip(&request, rate_limiter.trust_forwarded);

    if rate_limiter.check(ip) {
        Ok(next.run(request).await)
    } else {
        tracing::warn!("Reload rate limit exceeded for IP: {}", ip);
        Err(StatusCode::TOO_MANY_REQUESTS)
    }
}

/// Client IP: proxy headers when trusted, then the peer address, then localhost.
fn extract_client_ip(request: &Request<Body>, trust_forwarded: bool) -> IpAddr {
    if trust_forwarded {
        if let Some(ip) = forwarded_ip(request) {
            return ip;
        }
    }

    if let Some(ConnectInfo(addr)) = request.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip();
    }

    IpAddr::V4(Ipv4Addr::LOCALHOST)
}

fn forwarded_ip(request: &Request<Body>) -> Option<IpAddr> {
    if let Some(forwarded) = request.headers().get("X-Forwarded-For") {
        if let Ok(value) = forwarded.to_str() {
            if let Some(ip_str) = value.split(',').next() {
                if let Ok(ip) = ip_str.trim().parse() {
                    return Some(ip);
                }
            }
        }
    }

    if let Some(real_ip) = request.headers().get("X-Real-IP") {
        if let Ok(value) = real_ip.to_str() {
            if let Ok(ip) = value.trim().parse() {
                return Some(ip);
            }
        }
    }

    None
}
