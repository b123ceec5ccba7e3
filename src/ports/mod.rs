pub mod discovery;
pub mod http_client;
pub mod publisher;
