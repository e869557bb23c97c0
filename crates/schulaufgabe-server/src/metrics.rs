//! Prometheus metrics for the worksheet service.
//!
//! All collectors live in a registry owned by [`PrometheusObserver`], so every
//! server instance (and every test) gets an independent set.
//!
//! `active_sessions` counts sessions with an upload whose PDF has not been
//! downloaded yet. Each session moves the gauge up once and down once, however
//! often its PDF is fetched.

use axum::extract::{MatchedPath, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use prometheus::{
    Encoder, Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts,
    Registry, TextEncoder,
};
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use schulaufgabe_core::SessionId;
use schulaufgabe_core::observer::{PipelineObserver, StageOutcome};

use crate::state::AppState;

pub struct PrometheusObserver {
    registry: Registry,
    http_requests: IntCounterVec,
    request_seconds: HistogramVec,
    uploads: IntCounter,
    latex_generations: IntCounterVec,
    latex_seconds: Histogram,
    pdf_compilations: IntCounterVec,
    pdf_seconds: Histogram,
    active_sessions: IntGauge,
    /// Sessions currently counted in `active_sessions`
    open_sessions: Mutex<HashSet<SessionId>>,
}

impl PrometheusObserver {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let http_requests = IntCounterVec::new(
            Opts::new("http_requests_total", "Total number of HTTP requests"),
            &["method", "endpoint", "status"],
        )?;
        let request_seconds = HistogramVec::new(
            HistogramOpts::new("request_processing_seconds", "Time spent processing request"),
            &["method", "endpoint"],
        )?;
        let uploads = IntCounter::new("upload_total", "Total number of file uploads")?;
        let latex_generations = IntCounterVec::new(
            Opts::new("latex_generation_total", "Total number of LaTeX generations"),
            &["status"],
        )?;
        let latex_seconds = Histogram::with_opts(HistogramOpts::new(
            "latex_generation_seconds",
            "Time spent generating LaTeX",
        ))?;
        let pdf_compilations = IntCounterVec::new(
            Opts::new("pdf_compilation_total", "Total number of PDF compilations"),
            &["status"],
        )?;
        let pdf_seconds = Histogram::with_opts(HistogramOpts::new(
            "pdf_compilation_seconds",
            "Time spent compiling PDF",
        ))?;
        let active_sessions = IntGauge::new("active_sessions", "Number of active sessions")?;

        registry.register(Box::new(http_requests.clone()))?;
        registry.register(Box::new(request_seconds.clone()))?;
        registry.register(Box::new(uploads.clone()))?;
        registry.register(Box::new(latex_generations.clone()))?;
        registry.register(Box::new(latex_seconds.clone()))?;
        registry.register(Box::new(pdf_compilations.clone()))?;
        registry.register(Box::new(pdf_seconds.clone()))?;
        registry.register(Box::new(active_sessions.clone()))?;

        Ok(Self {
            registry,
            http_requests,
            request_seconds,
            uploads,
            latex_generations,
            latex_seconds,
            pdf_compilations,
            pdf_seconds,
            active_sessions,
            open_sessions: Mutex::new(HashSet::new()),
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn observe_request(&self, method: &str, endpoint: &str, status: u16, elapsed: Duration) {
        let status = status.to_string();
        self.http_requests
            .with_label_values(&[method, endpoint, status.as_str()])
            .inc();
        self.request_seconds
            .with_label_values(&[method, endpoint])
            .observe(elapsed.as_secs_f64());
    }

    fn open_sessions(&self) -> MutexGuard<'_, HashSet<SessionId>> {
        self.open_sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Text exposition of every collector in the registry.
    pub fn render(&self) -> prometheus::Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

impl PipelineObserver for PrometheusObserver {
    fn upload_stored(&self, id: &SessionId) {
        self.uploads.inc();
        if self.open_sessions().insert(id.clone()) {
            self.active_sessions.inc();
        }
    }

    fn transcription_finished(&self, outcome: StageOutcome, elapsed: Duration) {
        self.latex_generations
            .with_label_values(&[outcome.as_str()])
            .inc();
        self.latex_seconds.observe(elapsed.as_secs_f64());
    }

    fn compilation_finished(&self, outcome: StageOutcome, elapsed: Duration) {
        self.pdf_compilations
            .with_label_values(&[outcome.as_str()])
            .inc();
        self.pdf_seconds.observe(elapsed.as_secs_f64());
    }

    fn artifact_retrieved(&self, id: &SessionId) {
        if self.open_sessions().remove(id) {
            self.active_sessions.dec();
        }
    }
}

/// Counts and times every request that matched a route.
///
/// Installed with `route_layer`, so the matched route template is used as the
/// endpoint label and unknown paths do not create new series.
pub async fn track_requests(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let endpoint = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let started = Instant::now();
    let response = next.run(request).await;

    state.metrics.observe_request(
        &method,
        &endpoint,
        response.status().as_u16(),
        started.elapsed(),
    );
    response
}
