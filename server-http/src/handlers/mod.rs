pub mod github;
pub mod health;

pub use github::{preflight, proxy_github, EdgeResponse};
pub use health::{health_check, HealthResponse};
