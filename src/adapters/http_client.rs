use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body as AxumBody;
use hyper::{Request, Response, Version, header, header::HeaderValue};
use hyper_util::{
    client::legacy::{Client, connect::HttpConnector},
    rt::TokioExecutor,
};
use tokio::time::timeout;

use crate::ports::http_client::{HttpClient, HttpClientError, HttpClientResult};

/// Hyper-based forwarding client (HTTP/1.1 towards backends).
///
/// Responsibilities:
/// * Sets the `Host` header from the outgoing URI authority
/// * Enforces the per-request forwarding deadline
/// * Converts between Hyper body and Axum body types
///
/// Backend responses are relayed as-is; any status the backend produces is a
/// successful send from this adapter's point of view.
pub struct HttpClientAdapter {
    client: Client<HttpConnector, AxumBody>,
    forward_timeout: Duration,
}

impl HttpClientAdapter {
    pub fn new(forward_timeout_secs: u64) -> Self {
        let client = Client::builder(TokioExecutor::new()).build::<_, AxumBody>(HttpConnector::new());
        Self {
            client,
            forward_timeout: Duration::from_secs(forward_timeout_secs),
        }
    }
}

#[async_trait]
impl HttpClient for HttpClientAdapter {
    async fn send_request(
        &self,
        mut req: Request<AxumBody>,
    ) -> HttpClientResult<Response<AxumBody>> {
        let backend_authority = req
            .uri()
            .authority()
            .map(|a| a.to_string())
            .ok_or_else(|| {
                HttpClientError::InvalidRequest("outgoing URI has no authority".to_string())
            })?;

        let span = tracing::info_span!(
            "backend_request",
            backend.authority = %backend_authority,
            http.method = %req.method(),
            http.path = %req.uri().path(),
            http.status_code = tracing::field::Empty,
        );
        let _enter = span.enter();

        match HeaderValue::from_str(&backend_authority) {
            Ok(host) => {
                req.headers_mut().insert(header::HOST, host);
            }
            Err(e) => {
                return Err(HttpClientError::InvalidRequest(format!(
                    "backend authority is not a valid Host header: {e}"
                )));
            }
        }

        let (mut parts, body) = req.into_parts();
        parts.version = Version::HTTP_11;
        let outgoing = Request::from_parts(parts, body);

        let timeout_secs = self.forward_timeout.as_secs();
        match timeout(self.forward_timeout, self.client.request(outgoing)).await {
            Ok(Ok(response)) => {
                tracing::Span::current().record("http.status_code", response.status().as_u16());

                let (mut parts, hyper_body) = response.into_parts();
                // The body is re-framed on the way back out; stale framing
                // headers from the backend would corrupt the relay.
                parts.headers.remove(header::TRANSFER_ENCODING);
                Ok(Response::from_parts(parts, AxumBody::new(hyper_body)))
            }
            Ok(Err(e)) => {
                tracing::warn!(backend = %backend_authority, error = %e, "backend request failed");
                Err(HttpClientError::ConnectionError(format!(
                    "request to {backend_authority} failed: {e}"
                )))
            }
            Err(_) => {
                tracing::warn!(
                    backend = %backend_authority,
                    timeout_secs,
                    "backend request exceeded forwarding deadline"
                );
                Err(HttpClientError::Timeout(timeout_secs))
            }
        }
    }
}
