//! Shared state handed to every handler.

use std::sync::Arc;

use schulaufgabe_application::SessionPipeline;

use crate::auth::MetricsCredentials;
use crate::metrics::PrometheusObserver;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: SessionPipeline,
    pub metrics: Arc<PrometheusObserver>,
    /// `None` makes the metrics endpoints answer 500.
    pub metrics_credentials: Option<MetricsCredentials>,
}

impl AppState {
    pub fn new(
        pipeline: SessionPipeline,
        metrics: Arc<PrometheusObserver>,
        metrics_credentials: Option<MetricsCredentials>,
    ) -> Self {
        Self {
            pipeline,
            metrics,
            metrics_credentials,
        }
    }
}
