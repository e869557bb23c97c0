//! Session pipeline implementation.
//!
//! This module provides the `SessionPipeline` which drives one worksheet
//! through upload, transcription, rendering and retrieval. Every collaborator
//! is injected as a trait object so the same pipeline runs against Gemini and
//! tectonic in production and against mocks in test mode.

use schulaufgabe_core::compiler::{CompileRequest, MarkupCompiler};
use schulaufgabe_core::error::{PipelineError, Result};
use schulaufgabe_core::inference::{IMAGE_MIME_TYPE, InferenceClient, PromptSource};
use schulaufgabe_core::markup::sanitize;
use schulaufgabe_core::observer::{NoopObserver, PipelineObserver, StageOutcome};
use schulaufgabe_core::store::SessionStore;
use schulaufgabe_core::{Artifact, SessionId};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// Use case for the upload → transcribe → render → retrieve workflow.
///
/// # Thread Safety
///
/// The pipeline holds no per-session state; all of it lives in the
/// [`SessionStore`]. Sessions never share files, so concurrent requests for
/// different sessions do not interact. Concurrent renders of the same session
/// are last-writer-wins.
#[derive(Clone)]
pub struct SessionPipeline {
    /// Scratch storage for session artifacts
    store: Arc<dyn SessionStore>,
    /// Image-to-LaTeX model
    inference: Arc<dyn InferenceClient>,
    /// LaTeX-to-PDF compiler
    compiler: Arc<dyn MarkupCompiler>,
    /// Instructional prompt sent alongside every image
    prompts: Arc<dyn PromptSource>,
    /// Receives stage outcomes and timings
    observer: Arc<dyn PipelineObserver>,
}

impl SessionPipeline {
    /// Creates a new `SessionPipeline` with a no-op observer.
    pub fn new(
        store: Arc<dyn SessionStore>,
        inference: Arc<dyn InferenceClient>,
        compiler: Arc<dyn MarkupCompiler>,
        prompts: Arc<dyn PromptSource>,
    ) -> Self {
        Self {
            store,
            inference,
            compiler,
            prompts,
            observer: Arc::new(NoopObserver),
        }
    }

    /// Replaces the observer notified after each stage.
    pub fn with_observer(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// Allocates a session and stores the uploaded image as its source.
    ///
    /// The bytes are stored verbatim; no format check is made.
    pub async fn upload(&self, image: &[u8]) -> Result<SessionId> {
        let id = self.store.create_session().await?;
        self.store.store_upload(&id, image).await?;

        tracing::info!(session_id = %id, bytes = image.len(), "[Upload] Stored source image");
        self.observer.upload_stored(&id);
        Ok(id)
    }

    /// Transcribes the session's stored image into LaTeX.
    ///
    /// # Errors
    ///
    /// - `NotFound` when nothing was uploaded; the model is not called.
    /// - `Config` when the prompt cannot be loaded or no API key is configured.
    /// - `Upstream` when the model fails or returns no usable text.
    pub async fn transcribe(&self, id: &SessionId) -> Result<String> {
        let image = self.store.load_upload(id).await?;

        let started = Instant::now();
        let result = self.run_transcription(id, &image).await;
        self.observer
            .transcription_finished(StageOutcome::from_result(&result), started.elapsed());

        match &result {
            Ok(markup) => {
                tracing::info!(session_id = %id, chars = markup.len(), "[LaTeX] Transcription finished")
            }
            Err(e) => tracing::error!(session_id = %id, "[LaTeX] Transcription failed: {}", e),
        }
        result
    }

    async fn run_transcription(&self, id: &SessionId, image: &[u8]) -> Result<String> {
        let prompt = self.prompts.load_prompt().await?;

        tracing::info!(
            session_id = %id,
            model = self.inference.model(),
            "[LaTeX] Sending image to model"
        );
        let raw = self.inference.infer(image, IMAGE_MIME_TYPE, &prompt).await?;

        let markup = sanitize(&raw);
        if markup.is_empty() {
            return Err(PipelineError::upstream("No text in Gemini response"));
        }
        Ok(markup)
    }

    /// Compiles `markup` into the session's PDF and returns its path.
    ///
    /// The LaTeX source is kept when compilation fails so it can be inspected,
    /// and removed once a PDF has been produced.
    ///
    /// # Errors
    ///
    /// - `NotFound` when nothing was uploaded; no files are written and the
    ///   compiler is not called.
    /// - `CompilationFailed` with the compiler's stderr on a nonzero exit.
    /// - `ArtifactMissing` when the compiler succeeded but wrote no PDF.
    /// - `Io` for filesystem or process start failures.
    pub async fn render(&self, id: &SessionId, markup: &str) -> Result<PathBuf> {
        self.store
            .locate(id, Artifact::SourceImage)
            .await?
            .ok_or_else(|| PipelineError::not_found(Artifact::SourceImage, id.as_str()))?;

        let started = Instant::now();
        let result = self.run_render(id, markup).await;
        self.observer
            .compilation_finished(StageOutcome::from_result(&result), started.elapsed());

        match &result {
            Ok(path) => tracing::info!(session_id = %id, "[PDF] Generated {}", path.display()),
            Err(e) => tracing::error!(session_id = %id, "[PDF] Compilation failed: {}", e),
        }
        result
    }

    async fn run_render(&self, id: &SessionId, markup: &str) -> Result<PathBuf> {
        let cleaned = sanitize(markup);
        let source = self.store.write_markup(id, &cleaned).await?;
        let output_dir = self.store.scratch_dir(id).await?;

        let request = CompileRequest { source, output_dir };
        tracing::debug!(
            session_id = %id,
            compiler = self.compiler.name(),
            "[PDF] Dispatching compile job"
        );
        self.compiler.compile(&request).await?;

        if let Err(e) = self.store.remove_markup(id).await {
            tracing::warn!(session_id = %id, "[PDF] Failed to remove LaTeX source: {}", e);
        }

        match self.store.locate(id, Artifact::CompiledDocument).await? {
            Some(path) => Ok(path),
            None => {
                let expected = self
                    .store
                    .artifact_path(id, Artifact::CompiledDocument)
                    .await?;
                Err(PipelineError::ArtifactMissing {
                    path: expected.display().to_string(),
                })
            }
        }
    }

    /// Returns the path of the session's compiled PDF.
    pub async fn retrieve(&self, id: &SessionId) -> Result<PathBuf> {
        let path = self
            .store
            .locate(id, Artifact::CompiledDocument)
            .await?
            .ok_or_else(|| PipelineError::not_found(Artifact::CompiledDocument, id.as_str()))?;

        self.observer.artifact_retrieved(id);
        Ok(path)
    }
}
