//! Per-client rate limiting built atop `governor`.
//!
//! Counters are keyed by client identity (API-key header value, falling back
//! to the source address) and bounded by a configured window. State lives
//! behind the [`RateLimitStore`] trait so tests substitute an isolated store
//! with a deterministic clock; the in-memory implementation wraps a keyed
//! `governor` limiter, whose per-key state keeps identities from blocking
//! each other.
use std::{net::IpAddr, num::NonZeroU32, sync::Arc, time::Duration};

use axum::http::{HeaderName, StatusCode};
use governor::{
    Quota, RateLimiter,
    clock::{Clock, DefaultClock},
    middleware::NoOpMiddleware,
    state::keyed::DefaultKeyedStateStore,
};

use crate::{
    config::models::RateLimitConfig,
    core::error::json_error,
    policy::{Policy, PolicyDecision, RequestContext},
};

/// Client identity a rate-limit counter is keyed by.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum ClientId {
    ApiKey(String),
    Address(IpAddr),
}

impl ClientId {
    /// Derive the identity: API key header first, then source address. A
    /// request exposing neither has no identity (and is admitted).
    pub fn from_parts(api_key: Option<&str>, addr: Option<std::net::SocketAddr>) -> Option<Self> {
        if let Some(key) = api_key {
            return Some(ClientId::ApiKey(key.to_string()));
        }
        addr.map(|a| ClientId::Address(a.ip()))
    }
}

/// Storage interface for window-bounded per-identity counters.
pub trait RateLimitStore: Send + Sync {
    /// Record one request for `id`; `false` once the window threshold is
    /// exceeded. Exactly one consultation per request.
    fn check(&self, id: &ClientId) -> bool;
}

/// In-memory store: one keyed `governor` limiter, generic over the clock so
/// tests drive time explicitly.
pub struct MemoryRateStore<C: Clock = DefaultClock> {
    limiter: RateLimiter<
        ClientId,
        DefaultKeyedStateStore<ClientId>,
        C,
        NoOpMiddleware<<C as Clock>::Instant>,
    >,
}

fn window_quota(requests: u32, window: Duration) -> Result<Quota, String> {
    let burst = NonZeroU32::new(requests)
        .ok_or_else(|| "rate limit 'requests' must be greater than 0".to_string())?;
    Quota::with_period(window)
        .ok_or_else(|| format!("invalid rate-limit window: {window:?}"))
        .map(|quota| quota.allow_burst(burst))
}

impl MemoryRateStore<DefaultClock> {
    pub fn new(requests: u32, window: Duration) -> Result<Self, String> {
        Ok(Self {
            limiter: RateLimiter::keyed(window_quota(requests, window)?),
        })
    }
}

impl<C: Clock + Clone> MemoryRateStore<C> {
    /// Store with an injected clock, for deterministic tests. The limiter
    /// owns its clock, so the caller's copy stays usable for advancing time.
    pub fn with_clock(requests: u32, window: Duration, clock: &C) -> Result<Self, String> {
        Ok(Self {
            limiter: RateLimiter::new(
                window_quota(requests, window)?,
                DefaultKeyedStateStore::default(),
                clock.clone(),
            ),
        })
    }
}

impl<C: Clock + Send + Sync + 'static> RateLimitStore for MemoryRateStore<C>
where
    <C as Clock>::Instant: Send + Sync,
{
    fn check(&self, id: &ClientId) -> bool {
        self.limiter.check_key(id).is_ok()
    }
}

/// Rate limit policy over an injected store.
pub struct RateLimitPolicy {
    store: Arc<dyn RateLimitStore>,
    api_key_header: HeaderName,
}

impl RateLimitPolicy {
    pub fn new(config: &RateLimitConfig) -> Result<Self, String> {
        let window = humantime::parse_duration(&config.period)
            .map_err(|e| format!("invalid rate-limit period '{}': {e}", config.period))?;
        let store = Arc::new(MemoryRateStore::new(config.requests, window)?);
        Self::with_store(store, &config.api_key_header)
    }

    pub fn with_store(
        store: Arc<dyn RateLimitStore>,
        api_key_header: &str,
    ) -> Result<Self, String> {
        let api_key_header = HeaderName::from_bytes(api_key_header.as_bytes())
            .map_err(|e| format!("invalid api key header '{api_key_header}': {e}"))?;
        Ok(Self {
            store,
            api_key_header,
        })
    }
}

impl Policy for RateLimitPolicy {
    fn name(&self) -> &'static str {
        "rate_limit"
    }

    fn apply(&self, ctx: &mut RequestContext<'_>) -> PolicyDecision {
        let api_key = ctx
            .request
            .headers()
            .get(&self.api_key_header)
            .and_then(|value| value.to_str().ok());

        // No derivable identity: admit (missing-key policy is allow).
        let Some(id) = ClientId::from_parts(api_key, ctx.client_addr) else {
            return PolicyDecision::Continue;
        };

        if self.store.check(&id) {
            PolicyDecision::Continue
        } else {
            tracing::debug!(identity = ?id, "rate limit exceeded");
            PolicyDecision::ShortCircuit(json_error(
                StatusCode::TOO_MANY_REQUESTS,
                "Too many requests",
            ))
        }
    }
}
