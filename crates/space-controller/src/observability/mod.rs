//! Observability: health probes and metrics wiring.

pub mod health;

pub use health::{health_router, HealthState};
