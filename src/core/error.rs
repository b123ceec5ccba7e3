//! Gateway error taxonomy and its mapping to HTTP responses.
//!
//! Every error is converted to a well-formed HTTP response with a JSON body
//! carrying a human-readable `message` field at the gateway boundary; nothing
//! here propagates as a process crash.
use axum::{
    body::Body,
    http::{StatusCode, header},
    response::Response,
};
use thiserror::Error;

/// Request-scoped failures produced by the dispatch pipeline.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum GatewayError {
    #[error("no route matches path '{0}'")]
    RouteNotFound(String),

    #[error("service '{0}' has no live instances")]
    NoInstances(String),

    #[error("service registry unavailable: {0}")]
    DiscoveryUnavailable(String),

    #[error("backend transport failure: {0}")]
    TransportFailure(String),

    #[error("backend did not respond within {0} seconds")]
    GatewayTimeout(u64),

    #[error("event publish failed: {0}")]
    PublishFailure(String),
}

impl GatewayError {
    /// HTTP status the error maps to at the boundary.
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::RouteNotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::NoInstances(_) | GatewayError::DiscoveryUnavailable(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            GatewayError::TransportFailure(_) => StatusCode::BAD_GATEWAY,
            GatewayError::GatewayTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            GatewayError::PublishFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn into_response(self) -> Response {
        json_error(self.status(), &self.to_string())
    }
}

/// Build a JSON error reply: `{"message": "..."}` with the given status.
pub fn json_error(status: StatusCode, message: &str) -> Response {
    json_reply(status, &serde_json::json!({ "message": message }))
}

/// Build a JSON reply with an arbitrary payload.
pub fn json_reply(status: StatusCode, payload: &serde_json::Value) -> Response {
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap_or_else(|_| Response::new(Body::from(payload.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_expected_statuses() {
        assert_eq!(
            GatewayError::RouteNotFound("/x".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            GatewayError::NoInstances("svc".into()).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            GatewayError::DiscoveryUnavailable("down".into()).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            GatewayError::TransportFailure("refused".into()).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            GatewayError::GatewayTimeout(30).status(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            GatewayError::PublishFailure("broker".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn error_responses_carry_a_json_message() {
        let response = GatewayError::RouteNotFound("/nowhere".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }
}
