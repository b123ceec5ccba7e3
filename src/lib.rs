//! Synapse - a request-routing API gateway.
//!
//! Synapse sits in front of a fleet of backend services and routes requests
//! by path prefix, resolving each logical service name against a service
//! registry at request time. It follows a **hexagonal architecture**: the
//! routing, balancing and policy logic lives in `core` and `policy`, external
//! systems (registry, backends, message broker) are reached through `ports`
//! traits implemented in `adapters`.
//!
//! # Features
//! - Longest-prefix path routing to registry-discovered services
//! - Per-request service discovery with random instance selection
//! - Policy chain: CORS decoration, keyed rate limiting, bearer-token auth
//!   gate, access logging
//! - Verbatim relay of backend responses, with a clear error taxonomy for
//!   everything that prevents one (404/503/502/504)
//! - Fire-and-forget message publishing to an AMQP broker
//! - Structured JSON tracing and environment-overlayable configuration
//!
//! # Quick Example
//! ```no_run
//! use std::sync::Arc;
//!
//! use synapse::{
//!     GatewayService, HttpHandler,
//!     adapters::{AmqpPublisher, HttpClientAdapter, RegistryDiscovery},
//! };
//!
//! # #[tokio::main] async fn main() -> eyre::Result<()> {
//! let config = synapse::config::load_config(Some("gateway.toml")).await?;
//! let discovery = Arc::new(RegistryDiscovery::new(&config.registry_url)?);
//! let client = Arc::new(HttpClientAdapter::new(config.forward_timeout_secs));
//! let publisher = Arc::new(AmqpPublisher::connect(&config.broker_url).await?);
//! let gateway = Arc::new(GatewayService::new(&config, discovery, client)?);
//! let handler = HttpHandler::new(gateway, publisher);
//! # let _ = handler; Ok(()) }
//! ```
//!
//! # Error Handling
//! Startup and configuration APIs return `eyre::Result<T>` with context
//! attached via `WrapErr`. Request-scoped failures use domain error types
//! (`GatewayError`, the port error enums) and are always mapped to HTTP
//! responses at the boundary; a bad request or a dead backend never takes
//! the process down.
pub mod config;
pub mod tracing_setup;

pub mod adapters;
pub mod core;
pub mod policy;
pub mod ports;

// Re-export the types the binary crate wires together.
pub use crate::{
    adapters::{AmqpPublisher, HttpClientAdapter, HttpHandler, RegistryDiscovery},
    core::{GatewayError, GatewayService, RouteTable},
    ports::{discovery::Discovery, http_client::HttpClient, publisher::EventPublisher},
};
