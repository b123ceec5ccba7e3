//! Core gateway orchestration.
//!
//! `GatewayService` runs the per-request pipeline: policy chain → route
//! lookup → discovery → instance selection → forwarding → verbatim relay.
//! Each request executes independently; the only shared mutable state is the
//! rate-limit store inside the policy chain. Construct with
//! [`GatewayService::new`] by passing the configuration and the discovery /
//! HTTP client ports.
use std::{net::SocketAddr, sync::Arc};

use axum::{body::Body as AxumBody, http::header, response::Response};
use eyre::{Result, eyre};
use hyper::{Request, Uri};
use tracing::Instrument;
use uuid::Uuid;

use crate::{
    config::models::GatewayConfig,
    core::{
        error::GatewayError,
        load_balancer::RandomBalancer,
        router::{RouteRule, RouteTable},
    },
    policy::{
        AccessLogPolicy, AuthGatePolicy, OriginPolicy, Policy, PolicyChain, PolicyDecision,
        RateLimitPolicy, RequestContext,
    },
    ports::{
        discovery::{Discovery, ServiceInstance},
        http_client::{HttpClient, HttpClientError},
    },
};

pub struct GatewayService {
    routes: RouteTable,
    policies: PolicyChain,
    origin: Arc<OriginPolicy>,
    discovery: Arc<dyn Discovery>,
    balancer: RandomBalancer,
    http_client: Arc<dyn HttpClient>,
}

impl GatewayService {
    /// Build the service with the baseline policy chain in declared order:
    /// origin, rate limit, auth gate, access log.
    pub fn new(
        config: &GatewayConfig,
        discovery: Arc<dyn Discovery>,
        http_client: Arc<dyn HttpClient>,
    ) -> Result<Self> {
        let origin = Arc::new(OriginPolicy::new(&config.cors));
        let rate_limit = Arc::new(RateLimitPolicy::new(&config.rate_limit).map_err(|e| eyre!(e))?);
        let auth_gate = Arc::new(AuthGatePolicy::new(&config.jwt_secret));

        let policies: Vec<Arc<dyn Policy>> = vec![
            origin.clone(),
            rate_limit,
            auth_gate,
            Arc::new(AccessLogPolicy),
        ];

        Ok(Self {
            routes: RouteTable::from_config(&config.routes),
            policies: PolicyChain::new(policies),
            origin,
            discovery,
            balancer: RandomBalancer::new(),
            http_client,
        })
    }

    /// Replace the balancer with a seeded one (deterministic selection).
    pub fn with_seeded_balancer(mut self, seed: u64) -> Self {
        self.balancer = RandomBalancer::with_seed(seed);
        self
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Full per-request pipeline. Always resolves to a response; every
    /// failure is mapped to its status at this boundary.
    pub async fn dispatch(
        &self,
        req: Request<AxumBody>,
        client_addr: Option<SocketAddr>,
    ) -> Response {
        let span = tracing::info_span!(
            "request",
            request.id = %Uuid::new_v4(),
            http.method = %req.method(),
            http.path = %req.uri().path(),
            http.status_code = tracing::field::Empty,
        );
        async move {
            let response = self.run_pipeline(req, client_addr).await;
            tracing::Span::current().record("http.status_code", response.status().as_u16());
            response
        }
        .instrument(span)
        .await
    }

    async fn run_pipeline(
        &self,
        mut req: Request<AxumBody>,
        client_addr: Option<SocketAddr>,
    ) -> Response {
        let path = req.uri().path().to_string();
        let route = self.routes.route(&path).cloned();

        let decision = {
            let mut ctx = RequestContext {
                request: &mut req,
                client_addr,
                route: route.as_ref(),
            };
            self.policies.apply(&mut ctx)
        };

        let mut response = match decision {
            PolicyDecision::ShortCircuit(response) => response,
            PolicyDecision::Continue => match route {
                None => GatewayError::RouteNotFound(path).into_response(),
                Some(rule) => match self.forward(&rule, req).await {
                    Ok(response) => response,
                    Err(error) => {
                        tracing::warn!(service = %rule.service, %error, "dispatch failed");
                        error.into_response()
                    }
                },
            },
        };

        self.origin.decorate(&mut response);
        response
    }

    /// Resolve, select and forward. Backend status codes of any kind are a
    /// successful forwarding operation; only transport failures and the
    /// per-request deadline surface as errors here.
    async fn forward(
        &self,
        rule: &RouteRule,
        req: Request<AxumBody>,
    ) -> Result<Response, GatewayError> {
        let instances = self
            .discovery
            .resolve(&rule.service)
            .await
            .map_err(|e| GatewayError::DiscoveryUnavailable(e.to_string()))?;

        let Some(instance) = self.balancer.select(&instances) else {
            return Err(GatewayError::NoInstances(rule.service.clone()));
        };

        tracing::debug!(
            service = %rule.service,
            instance = %instance.authority(),
            candidates = instances.len(),
            "selected backend instance"
        );

        let outbound = build_outbound(instance, req)?;
        match self.http_client.send_request(outbound).await {
            Ok(response) => Ok(response),
            Err(HttpClientError::Timeout(secs)) => Err(GatewayError::GatewayTimeout(secs)),
            Err(error) => Err(GatewayError::TransportFailure(error.to_string())),
        }
    }
}

/// Rewrite the request towards the chosen instance: same method, same path
/// and query, same body. The inbound `Host` header is hop-only (it names the
/// gateway, not the backend) and is stripped; the client adapter sets the
/// backend authority in its place.
fn build_outbound(
    instance: &ServiceInstance,
    mut req: Request<AxumBody>,
) -> Result<Request<AxumBody>, GatewayError> {
    let path_and_query = req
        .uri()
        .path_and_query()
        .map_or("/", |pq| pq.as_str());
    let target = format!("http://{}{}", instance.authority(), path_and_query);
    let uri: Uri = target
        .parse()
        .map_err(|e| GatewayError::TransportFailure(format!("invalid backend uri '{target}': {e}")))?;

    *req.uri_mut() = uri;
    req.headers_mut().remove(header::HOST);
    Ok(req)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outbound_uri_preserves_path_and_query() {
        let instance = ServiceInstance::new("10.1.2.3", 8081);
        let req = Request::builder()
            .method("POST")
            .uri("http://gateway.local/users/42?full=true")
            .header(header::HOST, "gateway.local")
            .header("x-custom", "kept")
            .body(AxumBody::empty())
            .unwrap();

        let outbound = build_outbound(&instance, req).unwrap();
        assert_eq!(
            outbound.uri().to_string(),
            "http://10.1.2.3:8081/users/42?full=true"
        );
        assert!(outbound.headers().get(header::HOST).is_none());
        assert_eq!(outbound.headers().get("x-custom").unwrap(), "kept");
    }

    #[test]
    fn outbound_uri_defaults_to_root_path() {
        let instance = ServiceInstance::new("backend", 9000);
        let req = Request::builder()
            .uri("http://gateway.local")
            .body(AxumBody::empty())
            .unwrap();
        let outbound = build_outbound(&instance, req).unwrap();
        assert_eq!(outbound.uri().to_string(), "http://backend:9000/");
    }
}
