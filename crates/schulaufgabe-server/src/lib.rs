//! HTTP surface for the worksheet pipeline.
//!
//! Exposes the upload, LaTeX generation, PDF compilation and PDF download
//! routes, plus Basic-auth protected Prometheus metrics.

pub mod auth;
pub mod bootstrap;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use metrics::PrometheusObserver;
pub use routes::router;
pub use state::AppState;
