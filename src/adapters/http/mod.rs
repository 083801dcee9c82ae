//! HTTP adapters - application router and operational endpoints.

pub mod app;
pub mod health;

pub use app::app_router;
pub use health::{health_router, HealthResponse};
