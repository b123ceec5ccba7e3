pub mod loader;
pub mod models;
pub mod validation;

pub use loader::load_config;
pub use models::{CorsConfig, GatewayConfig, RateLimitConfig, RouteRuleConfig};
pub use validation::GatewayConfigValidator;
