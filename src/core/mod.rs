pub mod error;
pub mod gateway;
pub mod load_balancer;
pub mod router;

pub use error::GatewayError;
pub use gateway::GatewayService;
pub use load_balancer::RandomBalancer;
pub use router::{RouteRule, RouteTable};
