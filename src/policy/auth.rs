//! Auth gate: local, synchronous bearer-token verification.
//!
//! Only enforced on routes whose rule requires it. Credentials are verified
//! against the shared secret (HS256) with an expiry check; no remote calls.
//! On success the decoded principal is attached to the request extensions for
//! downstream use.
use axum::http::{StatusCode, header};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

use crate::{
    core::error::json_error,
    policy::{Policy, PolicyDecision, RequestContext},
};

/// Claims carried by gateway credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub exp: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<usize>,
}

/// Authenticated principal attached to admitted requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: String,
}

pub struct AuthGatePolicy {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl AuthGatePolicy {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    fn verify(&self, token: &str) -> Result<Principal, jsonwebtoken::errors::Error> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(Principal {
            user_id: data.claims.user_id,
        })
    }
}

impl Policy for AuthGatePolicy {
    fn name(&self) -> &'static str {
        "auth_gate"
    }

    fn apply(&self, ctx: &mut RequestContext<'_>) -> PolicyDecision {
        let requires_auth = ctx.route.is_some_and(|rule| rule.require_auth);
        if !requires_auth {
            return PolicyDecision::Continue;
        }

        let token = ctx
            .request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "));

        let Some(token) = token else {
            return PolicyDecision::ShortCircuit(json_error(
                StatusCode::UNAUTHORIZED,
                "Missing bearer token",
            ));
        };

        match self.verify(token) {
            Ok(principal) => {
                ctx.request.extensions_mut().insert(principal);
                PolicyDecision::Continue
            }
            Err(error) => {
                tracing::debug!(%error, "credential verification failed");
                PolicyDecision::ShortCircuit(json_error(
                    StatusCode::UNAUTHORIZED,
                    "Invalid or expired token",
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::{SystemTime, UNIX_EPOCH};

    use axum::body::Body as AxumBody;
    use hyper::Request;
    use jsonwebtoken::{EncodingKey, Header, encode};

    use super::*;
    use crate::core::router::RouteRule;

    const SECRET: &str = "test-secret";

    fn token(secret: &str, expires_in_secs: i64) -> String {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs() as i64;
        let claims = Claims {
            user_id: "user-1".to_string(),
            exp: (now + expires_in_secs).max(0) as usize,
            iat: Some(now as usize),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn apply(policy: &AuthGatePolicy, auth_header: Option<String>, gated: bool) -> PolicyDecision {
        let mut builder = Request::builder().uri("/users/1");
        if let Some(value) = auth_header {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        let mut req = builder.body(AxumBody::empty()).unwrap();
        let rule = RouteRule::new("/users", "user-service", gated);
        let mut ctx = RequestContext {
            request: &mut req,
            client_addr: None,
            route: Some(&rule),
        };
        let decision = policy.apply(&mut ctx);
        // Principal lands in the extensions only on success.
        if matches!(decision, PolicyDecision::Continue) && gated {
            assert!(req.extensions().get::<Principal>().is_some());
        }
        decision
    }

    #[test]
    fn valid_token_attaches_principal() {
        let policy = AuthGatePolicy::new(SECRET);
        let decision = apply(&policy, Some(format!("Bearer {}", token(SECRET, 3600))), true);
        assert!(matches!(decision, PolicyDecision::Continue));
    }

    #[test]
    fn missing_token_is_unauthorized() {
        let policy = AuthGatePolicy::new(SECRET);
        match apply(&policy, None, true) {
            PolicyDecision::ShortCircuit(response) => {
                assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            }
            PolicyDecision::Continue => panic!("missing credential must be rejected"),
        }
    }

    #[test]
    fn wrong_secret_is_unauthorized() {
        let policy = AuthGatePolicy::new(SECRET);
        let forged = token("other-secret", 3600);
        assert!(matches!(
            apply(&policy, Some(format!("Bearer {forged}")), true),
            PolicyDecision::ShortCircuit(_)
        ));
    }

    #[test]
    fn expired_token_is_unauthorized() {
        let policy = AuthGatePolicy::new(SECRET);
        let expired = token(SECRET, -3600);
        assert!(matches!(
            apply(&policy, Some(format!("Bearer {expired}")), true),
            PolicyDecision::ShortCircuit(_)
        ));
    }

    #[test]
    fn ungated_routes_skip_verification() {
        let policy = AuthGatePolicy::new(SECRET);
        assert!(matches!(
            apply(&policy, None, false),
            PolicyDecision::Continue
        ));
    }
}
