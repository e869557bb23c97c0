//! Instructional prompt loading.

use async_trait::async_trait;
use std::path::PathBuf;

use schulaufgabe_core::error::{PipelineError, Result};
use schulaufgabe_core::inference::PromptSource;

/// Prompt shipped with the binary, used when no prompt file is configured.
pub const EMBEDDED_PROMPT: &str = include_str!("../../../assets/gemini_system_prompt.txt");

/// Reads the prompt from a file on every call, so edits apply without a restart.
#[derive(Debug, Clone)]
pub struct FilePromptSource {
    path: PathBuf,
}

impl FilePromptSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

#[async_trait]
impl PromptSource for FilePromptSource {
    async fn load_prompt(&self) -> Result<String> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            tracing::error!("[Prompt] Could not read prompt file {}: {}", self.path.display(), e);
            PipelineError::config(format!(
                "Prompt file error: could not read '{}': {}",
                self.path.display(),
                e
            ))
        })?;

        let prompt = content.trim();
        if prompt.is_empty() {
            return Err(PipelineError::config(format!(
                "Prompt file error: '{}' is empty",
                self.path.display()
            )));
        }

        Ok(prompt.to_string())
    }
}

/// Fixed in-memory prompt.
#[derive(Debug, Clone)]
pub struct StaticPromptSource {
    prompt: String,
}

impl StaticPromptSource {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
        }
    }

    pub fn embedded() -> Self {
        Self::new(EMBEDDED_PROMPT.trim())
    }
}

#[async_trait]
impl PromptSource for StaticPromptSource {
    async fn load_prompt(&self) -> Result<String> {
        Ok(self.prompt.clone())
    }
}
