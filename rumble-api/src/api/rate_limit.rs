//! Per-client request quotas
//!
//! Two keyed limiters: one over every `/api/v1` route and a stricter one
//! over uploads. Clients are keyed by peer address, falling back to the
//! first `X-Forwarded-For` hop.

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use rumble_common::config::RateLimitConfig;
use std::{net::SocketAddr, num::NonZeroU32, sync::Arc, time::Duration};
use tracing::warn;

use crate::{error::ApiError, AppState};

/// Key used when the client address cannot be determined
const UNKNOWN_CLIENT: &str = "unknown";

#[derive(Clone)]
pub struct RateLimiters {
    api: Arc<DefaultKeyedRateLimiter<String>>,
    upload: Arc<DefaultKeyedRateLimiter<String>>,
}

impl RateLimiters {
    /// Build both limiters; zero counts or windows are rejected
    pub fn new(config: &RateLimitConfig) -> rumble_common::Result<Self> {
        let api = quota(config.api_requests, config.api_window())?;
        let upload = quota(config.upload_requests, config.upload_window())?;
        Ok(Self {
            api: Arc::new(RateLimiter::keyed(api)),
            upload: Arc::new(RateLimiter::keyed(upload)),
        })
    }

    /// Drop state for clients whose quota has fully replenished
    pub fn retain_recent(&self) {
        self.api.retain_recent();
        self.upload.retain_recent();
    }

    /// Number of clients currently tracked (api, upload)
    pub fn tracked_clients(&self) -> (usize, usize) {
        (self.api.len(), self.upload.len())
    }
}

/// `requests` per `window`, all available as an initial burst
fn quota(requests: u32, window: Duration) -> rumble_common::Result<Quota> {
    let burst = NonZeroU32::new(requests).ok_or_else(|| {
        rumble_common::Error::Config("rate limit request count must be non-zero".to_string())
    })?;
    let quota = Quota::with_period(window / requests).ok_or_else(|| {
        rumble_common::Error::Config("rate limit window must be non-zero".to_string())
    })?;
    Ok(quota.allow_burst(burst))
}

/// Client identity for rate limiting
pub fn client_key(request: &Request) -> String {
    if let Some(ConnectInfo(addr)) = request.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }

    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|hop| !hop.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

/// General quota over every `/api/v1` route
pub async fn api_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let key = client_key(&request);
    if state.rate_limits.api.check_key(&key).is_err() {
        warn!(client = %key, "API rate limit exceeded");
        return Err(ApiError::RateLimited);
    }
    Ok(next.run(request).await)
}

/// Upload quota, checked in addition to the general one
pub async fn upload_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let key = client_key(&request);
    if state.rate_limits.upload.check_key(&key).is_err() {
        warn!(client = %key, "Upload rate limit exceeded");
        return Err(ApiError::UploadRateLimited);
    }
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request_with(forwarded: Option<&str>) -> Request {
        let mut builder = axum::http::Request::builder().uri("/api/v1/songs");
        if let Some(value) = forwarded {
            builder = builder.header("x-forwarded-for", value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_client_key_prefers_peer_address() {
        let mut request = request_with(Some("203.0.113.9"));
        let addr: SocketAddr = "198.51.100.7:40000".parse().unwrap();
        request.extensions_mut().insert(ConnectInfo(addr));
        assert_eq!(client_key(&request), "198.51.100.7");
    }

    #[test]
    fn test_client_key_uses_first_forwarded_hop() {
        let request = request_with(Some("203.0.113.9, 10.0.0.1"));
        assert_eq!(client_key(&request), "203.0.113.9");
    }

    #[test]
    fn test_client_key_unknown() {
        assert_eq!(client_key(&request_with(None)), UNKNOWN_CLIENT);
        assert_eq!(client_key(&request_with(Some(""))), UNKNOWN_CLIENT);
    }

    #[test]
    fn test_limiter_enforces_burst() {
        let config = RateLimitConfig {
            api_requests: 3,
            api_window_secs: 60,
            upload_requests: 1,
            upload_window_secs: 60,
        };
        let limits = RateLimiters::new(&config).unwrap();
        let key = "client".to_string();

        for _ in 0..3 {
            assert!(limits.api.check_key(&key).is_ok());
        }
        assert!(limits.api.check_key(&key).is_err());

        assert!(limits.upload.check_key(&key).is_ok());
        assert!(limits.upload.check_key(&key).is_err());

        // Other clients have their own budget
        assert!(limits.api.check_key(&"other".to_string()).is_ok());
        assert_eq!(limits.tracked_clients(), (2, 1));
    }

    #[test]
    fn test_zero_quota_rejected() {
        let config = RateLimitConfig {
            api_requests: 0,
            ..RateLimitConfig::default()
        };
        assert!(RateLimiters::new(&config).is_err());
    }
}
