pub mod health;
pub mod market;

pub use health::{AppStartTime, HealthService, health_routes};
pub use market::{api_routes, uploads_routes};
