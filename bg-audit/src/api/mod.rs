//! HTTP API handlers for bg-audit

pub mod audit;
pub mod health;

pub use audit::audit_routes;
pub use health::health_routes;
