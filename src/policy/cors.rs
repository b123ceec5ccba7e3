//! Origin policy: permissive CORS headers and preflight short-circuiting.
use axum::{
    body::Body,
    http::{HeaderValue, Method, StatusCode},
    response::Response,
};

use crate::{
    config::models::CorsConfig,
    policy::{Policy, PolicyDecision, RequestContext},
};

/// Static origin policy. Allowed methods and headers are enumerated at
/// construction; the wildcard origin is the default configuration.
pub struct OriginPolicy {
    allowed_origin: HeaderValue,
    allowed_methods: HeaderValue,
    allowed_headers: HeaderValue,
}

impl OriginPolicy {
    pub fn new(config: &CorsConfig) -> Self {
        let to_value = |joined: String| {
            HeaderValue::from_str(&joined).unwrap_or_else(|_| HeaderValue::from_static("*"))
        };
        Self {
            allowed_origin: to_value(config.allowed_origin.clone()),
            allowed_methods: to_value(config.allowed_methods.join(", ")),
            allowed_headers: to_value(config.allowed_headers.join(", ")),
        }
    }

    /// Attach the configured `Access-Control-Allow-*` headers to an outgoing
    /// response. Applied to every reply the gateway writes, short-circuits
    /// included.
    pub fn decorate(&self, response: &mut Response) {
        let headers = response.headers_mut();
        headers.insert("Access-Control-Allow-Origin", self.allowed_origin.clone());
        headers.insert("Access-Control-Allow-Methods", self.allowed_methods.clone());
        headers.insert("Access-Control-Allow-Headers", self.allowed_headers.clone());
    }

    fn preflight_response(&self) -> Response {
        let mut response = Response::builder()
            .status(StatusCode::NO_CONTENT)
            .body(Body::empty())
            .unwrap_or_else(|_| Response::new(Body::empty()));
        self.decorate(&mut response);
        response
    }
}

impl Policy for OriginPolicy {
    fn name(&self) -> &'static str {
        "origin"
    }

    fn apply(&self, ctx: &mut RequestContext<'_>) -> PolicyDecision {
        if ctx.request.method() == Method::OPTIONS {
            return PolicyDecision::ShortCircuit(self.preflight_response());
        }
        PolicyDecision::Continue
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body as AxumBody;
    use hyper::Request;

    use super::*;

    fn policy() -> OriginPolicy {
        OriginPolicy::new(&CorsConfig::default())
    }

    fn apply(policy: &OriginPolicy, method: Method) -> PolicyDecision {
        let mut req = Request::builder()
            .method(method)
            .uri("/users/1")
            .body(AxumBody::empty())
            .unwrap();
        let mut ctx = RequestContext {
            request: &mut req,
            client_addr: None,
            route: None,
        };
        policy.apply(&mut ctx)
    }

    #[test]
    fn preflight_short_circuits_with_allowed_methods() {
        match apply(&policy(), Method::OPTIONS) {
            PolicyDecision::ShortCircuit(response) => {
                assert_eq!(response.status(), StatusCode::NO_CONTENT);
                let methods = response
                    .headers()
                    .get("Access-Control-Allow-Methods")
                    .unwrap()
                    .to_str()
                    .unwrap();
                assert!(methods.contains("OPTIONS"));
                assert_eq!(
                    response.headers().get("Access-Control-Allow-Origin").unwrap(),
                    "*"
                );
            }
            PolicyDecision::Continue => panic!("preflight must short-circuit"),
        }
    }

    #[test]
    fn non_preflight_continues() {
        assert!(matches!(
            apply(&policy(), Method::GET),
            PolicyDecision::Continue
        ));
        assert!(matches!(
            apply(&policy(), Method::DELETE),
            PolicyDecision::Continue
        ));
    }

    #[test]
    fn decorate_sets_cors_headers() {
        let mut response = Response::new(Body::empty());
        policy().decorate(&mut response);
        assert_eq!(
            response.headers().get("Access-Control-Allow-Origin").unwrap(),
            "*"
        );
        assert!(response.headers().contains_key("Access-Control-Allow-Headers"));
    }
}
