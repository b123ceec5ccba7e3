pub mod discovery;
pub mod http_client;
pub mod http_handler;
pub mod publisher;

/// Re-export commonly used types from adapters
pub use discovery::RegistryDiscovery;
pub use http_client::HttpClientAdapter;
pub use http_handler::HttpHandler;
pub use publisher::AmqpPublisher;
