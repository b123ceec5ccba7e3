//! Access logging: record method, path and timestamp to the append-only
//! tracing sink. Never short-circuits; logging must never block or fail the
//! request.
use crate::policy::{Policy, PolicyDecision, RequestContext};

pub struct AccessLogPolicy;

impl Policy for AccessLogPolicy {
    fn name(&self) -> &'static str {
        "access_log"
    }

    fn apply(&self, ctx: &mut RequestContext<'_>) -> PolicyDecision {
        tracing::info!(
            http.method = %ctx.request.method(),
            http.path = %ctx.request.uri().path(),
            timestamp = %chrono::Utc::now().to_rfc3339(),
            "incoming request"
        );
        PolicyDecision::Continue
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body as AxumBody;
    use hyper::Request;

    use super::*;

    #[test]
    fn always_continues() {
        let mut req = Request::builder()
            .method("POST")
            .uri("/payments/checkout")
            .body(AxumBody::empty())
            .unwrap();
        let mut ctx = RequestContext {
            request: &mut req,
            client_addr: None,
            route: None,
        };
        assert!(matches!(
            AccessLogPolicy.apply(&mut ctx),
            PolicyDecision::Continue
        ));
    }
}
