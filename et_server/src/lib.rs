//! HTTP server for the esports tournament service.
//!
//! Wires the `esports_tournaments` managers into an axum router, with
//! environment-driven configuration, structured logging and Prometheus metrics.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
