//! Compiler collaborator seam.

use async_trait::async_trait;
use std::path::PathBuf;

use crate::error::Result;

/// One compilation job: a markup file and the directory its output goes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileRequest {
    pub source: PathBuf,
    pub output_dir: PathBuf,
}

/// Captured output of a successful compilation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Turns a markup source file into a compiled document.
///
/// Implementations write the document into `request.output_dir` under the
/// source's file stem (`output.tex` → `output.pdf`).
#[async_trait]
pub trait MarkupCompiler: Send + Sync {
    /// # Errors
    ///
    /// Returns `CompilationFailed` with the compiler's stderr on a nonzero exit,
    /// `Io` if the process cannot be started.
    async fn compile(&self, request: &CompileRequest) -> Result<CompileOutput>;

    /// Short name for logging.
    fn name(&self) -> &str;
}
