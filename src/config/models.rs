//! Configuration data structures for Synapse.
//!
//! These types map directly to TOML (also JSON / YAML) configuration files and
//! to `GATEWAY_*` environment variables. They are intentionally serde-friendly
//! and include defaults so that a bare deployment starts with the stock route
//! table and permissive CORS.
use serde::{Deserialize, Serialize};

fn default_listen_addr() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_registry_url() -> String {
    "http://localhost:8500/v1/catalog/service".to_string()
}

fn default_broker_url() -> String {
    "amqp://localhost:5672/%2f".to_string()
}

fn default_forward_timeout_secs() -> u64 {
    30
}

/// Top-level gateway configuration.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct GatewayConfig {
    /// Address the gateway listens on, `IP:PORT`.
    pub listen_addr: String,
    /// Base URL of the service registry; instances are fetched from
    /// `<registry_url>/<service-name>`.
    pub registry_url: String,
    /// Shared secret used to verify bearer credentials on auth-gated routes.
    pub jwt_secret: String,
    /// Per-request forwarding deadline in seconds.
    pub forward_timeout_secs: u64,
    pub rate_limit: RateLimitConfig,
    pub cors: CorsConfig,
    /// AMQP broker the administrative publish endpoint hands events to.
    pub broker_url: String,
    /// Static route table, in declaration order. Order is the tie-break for
    /// equal-length prefix matches.
    pub routes: Vec<RouteRuleConfig>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            registry_url: default_registry_url(),
            jwt_secret: String::new(),
            forward_timeout_secs: default_forward_timeout_secs(),
            rate_limit: RateLimitConfig::default(),
            cors: CorsConfig::default(),
            broker_url: default_broker_url(),
            routes: default_routes(),
        }
    }
}

/// One routing rule: requests whose path starts with `prefix` are forwarded to
/// instances of `service`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct RouteRuleConfig {
    pub prefix: String,
    pub service: String,
    /// When set, the auth gate policy must admit the request before it is
    /// forwarded.
    #[serde(default)]
    pub require_auth: bool,
}

/// The stock route table, mirroring the deployed service fleet.
pub fn default_routes() -> Vec<RouteRuleConfig> {
    let rule = |prefix: &str, service: &str, require_auth: bool| RouteRuleConfig {
        prefix: prefix.to_string(),
        service: service.to_string(),
        require_auth,
    };
    vec![
        rule("/auth", "auth-service", false),
        rule("/users", "user-service", true),
        rule("/colleges", "college-service", false),
        rule("/chat", "chatbot-gateway", false),
        rule("/applications", "application-service", false),
        rule("/alumni", "alumni-service", false),
        rule("/calendar", "calendar-service", false),
        rule("/payments", "payment-service", false),
        rule("/notifications", "notification-service", false),
        rule("/message-queue", "message-queue", false),
    ]
}

/// Per-client rate limiting configuration (fixed window semantics).
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Requests admitted per identity within one window.
    pub requests: u32,
    /// Window length, parsed by humantime (e.g. "30s", "15m", "1h").
    pub period: String,
    /// Header carrying an API-key-style identity; falls back to the source
    /// address when absent.
    pub api_key_header: String,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests: 100,
            period: "15m".to_string(),
            api_key_header: "x-api-key".to_string(),
        }
    }
}

/// Origin policy configuration. The default is the permissive wildcard setup.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct CorsConfig {
    pub allowed_origin: String,
    pub allowed_methods: Vec<String>,
    pub allowed_headers: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origin: "*".to_string(),
            allowed_methods: ["GET", "POST", "PUT", "DELETE", "OPTIONS"]
                .into_iter()
                .map(str::to_string)
                .collect(),
            allowed_headers: ["Content-Type", "Authorization"]
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }
}
