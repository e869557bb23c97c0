//! Wires collaborators from configuration.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use schulaufgabe_application::SessionPipeline;
use schulaufgabe_core::compiler::MarkupCompiler;
use schulaufgabe_core::config::AppConfig;
use schulaufgabe_core::inference::{InferenceClient, PromptSource};
use schulaufgabe_infrastructure::{
    FilePromptSource, FsSessionStore, SchulaufgabePaths, ScratchSweeper, StaticPromptSource,
};
use schulaufgabe_interaction::{
    CompilerPool, GeminiInferenceClient, MockCompiler, MockInferenceClient, TectonicCompiler,
};

use crate::auth::MetricsCredentials;
use crate::metrics::PrometheusObserver;
use crate::state::AppState;

fn inference_client(config: &AppConfig) -> Arc<dyn InferenceClient> {
    if config.test_mode {
        return Arc::new(MockInferenceClient);
    }

    let api_key = config.inference.api_key.clone().unwrap_or_default();
    if api_key.trim().is_empty() {
        tracing::warn!("[Bootstrap] GOOGLE_API_KEY not set; LaTeX generation will fail");
    }
    Arc::new(GeminiInferenceClient::new(api_key, &config.inference.model))
}

fn prompt_source(config: &AppConfig) -> Arc<dyn PromptSource> {
    if config.test_mode {
        Arc::new(StaticPromptSource::embedded())
    } else {
        Arc::new(FilePromptSource::new(&config.inference.prompt_path))
    }
}

fn markup_compiler(config: &AppConfig) -> Arc<dyn MarkupCompiler> {
    let inner: Arc<dyn MarkupCompiler> = if config.test_mode {
        Arc::new(MockCompiler)
    } else {
        Arc::new(
            TectonicCompiler::new(&config.compiler.binary)
                .with_timeout(Duration::from_secs(config.compiler.timeout_secs)),
        )
    };
    Arc::new(CompilerPool::new(inner, config.compiler.workers))
}

fn paths(config: &AppConfig) -> SchulaufgabePaths {
    SchulaufgabePaths::new(config.storage.temp_root.clone())
}

/// Builds the handler state: pipeline, metrics registry and credentials.
pub fn build_state(config: &AppConfig) -> prometheus::Result<AppState> {
    let metrics = Arc::new(PrometheusObserver::new()?);

    let pipeline = SessionPipeline::new(
        Arc::new(FsSessionStore::new(paths(config))),
        inference_client(config),
        markup_compiler(config),
        prompt_source(config),
    )
    .with_observer(metrics.clone());

    let credentials = MetricsCredentials::from_config(&config.metrics);
    if credentials.is_none() {
        tracing::warn!("[Bootstrap] Metrics credentials not configured; /metrics will answer 500");
    }

    tracing::info!(
        test_mode = config.test_mode,
        compile_workers = config.compiler.workers,
        "[Bootstrap] Session pipeline ready"
    );
    Ok(AppState::new(pipeline, metrics, credentials))
}

/// Starts the scratch sweeper unless the TTL is zero.
pub fn spawn_sweeper(config: &AppConfig) -> Option<JoinHandle<()>> {
    if config.storage.session_ttl_secs == 0 {
        tracing::info!("[Bootstrap] Session TTL is 0; scratch sweeping disabled");
        return None;
    }

    let sweeper = ScratchSweeper::new(
        paths(config),
        Duration::from_secs(config.storage.session_ttl_secs),
    );
    let interval = Duration::from_secs(config.storage.sweep_interval_secs.max(1));
    Some(sweeper.spawn(interval))
}
