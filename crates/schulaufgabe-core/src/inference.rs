//! Inference collaborator seam.
//!
//! The transcription stage only ever sees this narrow interface; response
//! parsing stays inside the implementation.

use async_trait::async_trait;

use crate::error::Result;

/// MIME type sent alongside every uploaded worksheet.
pub const IMAGE_MIME_TYPE: &str = "image/jpeg";

/// A multimodal model that turns an image plus instructions into text.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Runs one inference call. No retries are attempted.
    ///
    /// # Errors
    ///
    /// Returns `Upstream` when the call fails or the response carries no text.
    async fn infer(&self, image: &[u8], mime_type: &str, prompt: &str) -> Result<String>;

    /// Model identifier, for logging.
    fn model(&self) -> &str;
}

/// Source of the fixed instructional prompt.
#[async_trait]
pub trait PromptSource: Send + Sync {
    /// # Errors
    ///
    /// Returns `Config` when the prompt cannot be read.
    async fn load_prompt(&self) -> Result<String>;
}
