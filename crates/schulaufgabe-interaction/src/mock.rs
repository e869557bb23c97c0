//! Fixed-output collaborators for `TEST_MODE`.
//!
//! These let the whole HTTP flow run without a Gemini key or a TeX install.

use async_trait::async_trait;

use schulaufgabe_core::compiler::{CompileOutput, CompileRequest, MarkupCompiler};
use schulaufgabe_core::error::{PipelineError, Result};
use schulaufgabe_core::inference::InferenceClient;

/// LaTeX returned by [`MockInferenceClient`].
pub const MOCK_LATEX: &str = r"\documentclass{article}\usepackage{amsmath}\begin{document}\section*{Test Worksheet}\begin{enumerate}\item $2+2=4$\item $\frac{1}{2} + \frac{1}{3} = \frac{5}{6}$\end{enumerate}\end{document}";

/// Minimal valid single-page PDF written by [`MockCompiler`].
pub const MOCK_PDF: &[u8] = b"%PDF-1.5\n%Mock PDF for testing\n1 0 obj<</Type/Catalog/Pages 2 0 R>>endobj\n2 0 obj<</Type/Pages/Count 1/Kids[3 0 R]>>endobj\n3 0 obj<</Type/Page/MediaBox[0 0 595 842]/Parent 2 0 R/Resources<<>>>>endobj\nxref\n0 4\n0000000000 65535 f\n0000000017 00000 n\n0000000065 00000 n\n0000000123 00000 n\ntrailer<</Size 4/Root 1 0 R>>\nstartxref\n193\n%%EOF";

#[derive(Debug, Default, Clone, Copy)]
pub struct MockInferenceClient;

#[async_trait]
impl InferenceClient for MockInferenceClient {
    async fn infer(&self, _image: &[u8], _mime_type: &str, _prompt: &str) -> Result<String> {
        tracing::info!("[TEST MODE] Returning mock LaTeX");
        Ok(MOCK_LATEX.to_string())
    }

    fn model(&self) -> &str {
        "mock"
    }
}

/// Writes [`MOCK_PDF`] next to the source instead of running a compiler.
#[derive(Debug, Default, Clone, Copy)]
pub struct MockCompiler;

#[async_trait]
impl MarkupCompiler for MockCompiler {
    async fn compile(&self, request: &CompileRequest) -> Result<CompileOutput> {
        let stem = request
            .source
            .file_stem()
            .ok_or_else(|| PipelineError::io("Mock compiler needs a named source file"))?;
        let pdf_path = request.output_dir.join(stem).with_extension("pdf");

        tracing::info!("[TEST MODE] Skipping actual PDF compilation, creating mock PDF");
        tokio::fs::write(&pdf_path, MOCK_PDF).await?;

        Ok(CompileOutput::default())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_mock_inference_returns_document() {
        let text = MockInferenceClient.infer(b"", "image/jpeg", "p").await.unwrap();
        assert!(text.starts_with(r"\documentclass"));
    }

    #[tokio::test]
    async fn test_mock_compiler_writes_pdf_named_after_source() {
        let temp_dir = TempDir::new().unwrap();
        let request = CompileRequest {
            source: temp_dir.path().join("output.tex"),
            output_dir: temp_dir.path().to_path_buf(),
        };

        MockCompiler.compile(&request).await.unwrap();

        let pdf = std::fs::read(temp_dir.path().join("output.pdf")).unwrap();
        assert!(pdf.starts_with(b"%PDF-1.5"));
        assert!(pdf.len() > 100);
    }
}
