use std::{net::SocketAddr, sync::Arc};

use axum::{
    body::Body as AxumBody,
    http::{Method, StatusCode},
};
use http_body_util::BodyExt;
use hyper::{Request, Response};

use crate::{
    core::{
        GatewayService,
        error::{json_error, json_reply},
    },
    ports::publisher::EventPublisher,
};

/// Top-level HTTP handler. Owns the two gateway-local endpoints (liveness
/// and admin publish) and hands everything else to the proxy pipeline.
#[derive(Clone)]
pub struct HttpHandler {
    gateway: Arc<GatewayService>,
    publisher: Arc<dyn EventPublisher>,
}

impl HttpHandler {
    pub fn new(gateway: Arc<GatewayService>, publisher: Arc<dyn EventPublisher>) -> Self {
        Self { gateway, publisher }
    }

    pub async fn handle_request(
        &self,
        req: Request<AxumBody>,
        client_addr: Option<SocketAddr>,
    ) -> Response<AxumBody> {
        match (req.method(), req.uri().path()) {
            (&Method::GET, "/health") => liveness_reply(),
            (&Method::POST, "/publish") => self.handle_publish(req).await,
            _ => self.gateway.dispatch(req, client_addr).await,
        }
    }

    /// Admin publish endpoint: accepts `{"queue": "...", "message": ...}` and
    /// hands the message to the broker. A 200 acknowledges acceptance for
    /// delivery only.
    async fn handle_publish(&self, req: Request<AxumBody>) -> Response<AxumBody> {
        let bytes: bytes::Bytes = match req.into_body().collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) => {
                tracing::debug!(error = %e, "failed to read publish request body");
                return json_error(StatusCode::BAD_REQUEST, "unreadable request body");
            }
        };

        let payload: serde_json::Value = match serde_json::from_slice(&bytes) {
            Ok(value) => value,
            Err(_) => return json_error(StatusCode::BAD_REQUEST, "body must be valid JSON"),
        };

        // A null message or an empty queue name counts as missing.
        let (Some(queue), Some(message)) = (
            payload
                .get("queue")
                .and_then(|q| q.as_str())
                .filter(|q| !q.is_empty()),
            payload.get("message").filter(|m| !m.is_null()),
        ) else {
            return json_error(StatusCode::BAD_REQUEST, "queue and message are required");
        };

        match self.publisher.publish(queue, message).await {
            Ok(()) => json_reply(
                StatusCode::OK,
                &serde_json::json!({ "message": "Message published", "queue": queue }),
            ),
            Err(e) => {
                tracing::error!(queue, error = %e, "publish failed");
                json_error(StatusCode::INTERNAL_SERVER_ERROR, "failed to publish message")
            }
        }
    }
}

fn liveness_reply() -> Response<AxumBody> {
    json_reply(StatusCode::OK, &serde_json::json!({ "status": "ok" }))
}
