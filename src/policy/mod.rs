//! The request policy chain.
//!
//! Policies are ordered request interceptors executed before any forwarding
//! work. Each inspects (and may annotate) the inbound request and either lets
//! the pipeline continue or short-circuits with a ready response; the first
//! short-circuit wins and skips every later policy and pipeline stage.
pub mod access_log;
pub mod auth;
pub mod cors;
pub mod rate_limit;

use std::{net::SocketAddr, sync::Arc};

use axum::{body::Body as AxumBody, response::Response};
use hyper::Request;

pub use access_log::AccessLogPolicy;
pub use auth::{AuthGatePolicy, Principal};
pub use cors::OriginPolicy;
pub use rate_limit::{ClientId, MemoryRateStore, RateLimitPolicy, RateLimitStore};

use crate::core::router::RouteRule;

/// Outcome of one policy application.
pub enum PolicyDecision {
    Continue,
    ShortCircuit(Response),
}

/// Everything a policy may inspect or annotate for a single request.
pub struct RequestContext<'a> {
    pub request: &'a mut Request<AxumBody>,
    pub client_addr: Option<SocketAddr>,
    /// The rule the router matched, when any. Route-scoped policies (the auth
    /// gate) consult it; unmatched requests still traverse the chain so the
    /// 404 is produced after policy enforcement.
    pub route: Option<&'a RouteRule>,
}

/// One request interceptor.
pub trait Policy: Send + Sync {
    fn name(&self) -> &'static str;
    fn apply(&self, ctx: &mut RequestContext<'_>) -> PolicyDecision;
}

/// Fixed, declaration-ordered set of policies.
pub struct PolicyChain {
    policies: Vec<Arc<dyn Policy>>,
}

impl PolicyChain {
    pub fn new(policies: Vec<Arc<dyn Policy>>) -> Self {
        Self { policies }
    }

    /// Run the chain in declared order; the first short-circuit stops it.
    pub fn apply(&self, ctx: &mut RequestContext<'_>) -> PolicyDecision {
        for policy in &self.policies {
            if let PolicyDecision::ShortCircuit(response) = policy.apply(ctx) {
                tracing::debug!(
                    policy = policy.name(),
                    path = %ctx.request.uri().path(),
                    "request short-circuited by policy"
                );
                return PolicyDecision::ShortCircuit(response);
            }
        }
        PolicyDecision::Continue
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::http::StatusCode;

    use super::*;
    use crate::core::error::json_error;

    struct Counting {
        calls: AtomicUsize,
        short_circuit: bool,
    }

    impl Policy for Counting {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn apply(&self, _ctx: &mut RequestContext<'_>) -> PolicyDecision {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.short_circuit {
                PolicyDecision::ShortCircuit(json_error(StatusCode::FORBIDDEN, "stop"))
            } else {
                PolicyDecision::Continue
            }
        }
    }

    fn request() -> Request<AxumBody> {
        Request::builder()
            .uri("/anything")
            .body(AxumBody::empty())
            .unwrap()
    }

    #[test]
    fn first_short_circuit_stops_the_chain() {
        let first = Arc::new(Counting {
            calls: AtomicUsize::new(0),
            short_circuit: true,
        });
        let second = Arc::new(Counting {
            calls: AtomicUsize::new(0),
            short_circuit: false,
        });
        let chain = PolicyChain::new(vec![first.clone(), second.clone()]);

        let mut req = request();
        let mut ctx = RequestContext {
            request: &mut req,
            client_addr: None,
            route: None,
        };
        let decision = chain.apply(&mut ctx);

        assert!(matches!(decision, PolicyDecision::ShortCircuit(_)));
        assert_eq!(first.calls.load(Ordering::SeqCst), 1);
        assert_eq!(second.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn all_policies_run_on_continue() {
        let first = Arc::new(Counting {
            calls: AtomicUsize::new(0),
            short_circuit: false,
        });
        let second = Arc::new(Counting {
            calls: AtomicUsize::new(0),
            short_circuit: false,
        });
        let chain = PolicyChain::new(vec![first.clone(), second.clone()]);

        let mut req = request();
        let mut ctx = RequestContext {
            request: &mut req,
            client_addr: None,
            route: None,
        };
        assert!(matches!(chain.apply(&mut ctx), PolicyDecision::Continue));
        assert_eq!(first.calls.load(Ordering::SeqCst), 1);
        assert_eq!(second.calls.load(Ordering::SeqCst), 1);
    }
}
