//! TectonicCompiler - runs the `tectonic` binary against a session's LaTeX file.
//!
//! The argument set is fixed: output goes to the requested directory, logs and
//! intermediates are discarded, and SyncTeX output is disabled.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use schulaufgabe_core::compiler::{CompileOutput, CompileRequest, MarkupCompiler};
use schulaufgabe_core::config::DEFAULT_TECTONIC_PATH;
use schulaufgabe_core::error::{PipelineError, Result};

/// Compiler collaborator backed by the `tectonic` executable.
#[derive(Debug, Clone)]
pub struct TectonicCompiler {
    /// Absolute path to the executable.
    binary: PathBuf,
    /// Kill the child after this long. `None` waits indefinitely.
    timeout: Option<Duration>,
}

impl TectonicCompiler {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            timeout: None,
        }
    }

    /// Sets the compile timeout. A zero duration disables it.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = (!timeout.is_zero()).then_some(timeout);
        self
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Fixed command-line arguments for one compilation.
    pub fn arguments(source: &Path, output_dir: &Path) -> Vec<String> {
        vec![
            source.to_string_lossy().to_string(),
            "--outdir".to_string(),
            output_dir.to_string_lossy().to_string(),
            "--print".to_string(),
            "--synctex=none".to_string(),
            "--keep-logs=no".to_string(),
            "--keep-intermediates=no".to_string(),
        ]
    }

    /// Rejects paths that are not an existing file / directory before spawning.
    async fn validate(request: &CompileRequest) -> Result<()> {
        let source_ok = tokio::fs::metadata(&request.source)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);
        if !source_ok {
            return Err(PipelineError::io(format!(
                "Invalid TeX file path: {}",
                request.source.display()
            )));
        }

        let dir_ok = tokio::fs::metadata(&request.output_dir)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);
        if !dir_ok {
            return Err(PipelineError::io(format!(
                "Invalid output directory: {}",
                request.output_dir.display()
            )));
        }

        Ok(())
    }
}

impl Default for TectonicCompiler {
    fn default() -> Self {
        Self::new(DEFAULT_TECTONIC_PATH)
    }
}

#[async_trait]
impl MarkupCompiler for TectonicCompiler {
    async fn compile(&self, request: &CompileRequest) -> Result<CompileOutput> {
        Self::validate(request).await?;

        tracing::info!("[PDF] Running tectonic for {}", request.source.display());

        let child = Command::new(&self.binary)
            .args(Self::arguments(&request.source, &request.output_dir))
            .current_dir(&request.output_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                PipelineError::io(format!(
                    "Failed to start {}: {}",
                    self.binary.display(),
                    e
                ))
            })?;

        let output = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
                Ok(output) => output?,
                Err(_) => {
                    tracing::error!("[PDF] Tectonic timed out after {:?}", limit);
                    return Err(PipelineError::compilation_failed(format!(
                        "tectonic timed out after {} seconds",
                        limit.as_secs()
                    )));
                }
            },
            None => child.wait_with_output().await?,
        };

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if !output.status.success() {
            tracing::error!("[PDF] Tectonic failed ({}): {}", output.status, stderr);
            return Err(PipelineError::compilation_failed(stderr));
        }

        tracing::info!("[PDF] Tectonic stdout: {}", stdout);
        tracing::info!("[PDF] Tectonic stderr: {}", stderr);
        Ok(CompileOutput { stdout, stderr })
    }

    fn name(&self) -> &str {
        "tectonic"
    }
}
