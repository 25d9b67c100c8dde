//! # api-adapters
//!
//! HTTP surface of AI Valley. The axum router lives behind the `web-axum`
//! feature; the metrics registry is framework independent.

pub mod metrics;

#[cfg(feature = "web-axum")]
pub mod web;

pub use metrics::{GenerationKind, Metrics};

#[cfg(feature = "web-axum")]
pub use web::{router, AppState};
