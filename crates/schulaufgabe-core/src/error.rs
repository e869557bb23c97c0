//! Error types for the worksheet pipeline.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::session::Artifact;

/// A shared error type for every stage of the session pipeline.
///
/// Each variant corresponds to one failure mode of the upload → transcribe →
/// render → retrieve workflow. The HTTP layer maps these onto status codes; the
/// stages themselves never decide on a status.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineError {
    /// Session identifier is not a 36-character UUID string.
    ///
    /// Raised before any filesystem path is derived from the identifier.
    #[error("Invalid session ID format: '{0}'")]
    InvalidSessionId(String),

    /// An artifact a prior stage should have produced is absent.
    #[error("{} not found for session '{session_id}'", .artifact.label())]
    NotFound {
        artifact: Artifact,
        session_id: String,
    },

    /// Required static asset or credential missing.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The inference collaborator failed or returned unusable output.
    #[error("Gemini API error: {0}")]
    Upstream(String),

    /// The compiler exited with a nonzero status.
    ///
    /// `diagnostics` is the compiler's stderr, verbatim.
    #[error("{diagnostics}")]
    CompilationFailed { diagnostics: String },

    /// The compiler reported success but the expected output is absent.
    #[error("PDF not generated: {path}")]
    ArtifactMissing { path: String },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },
}

impl PipelineError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a NotFound error
    pub fn not_found(artifact: Artifact, session_id: impl Into<String>) -> Self {
        Self::NotFound {
            artifact,
            session_id: session_id.into(),
        }
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Upstream error
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream(message.into())
    }

    /// Creates a CompilationFailed error carrying the compiler's diagnostics
    pub fn compilation_failed(diagnostics: impl Into<String>) -> Self {
        Self::CompilationFailed {
            diagnostics: diagnostics.into(),
        }
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is an InvalidSessionId error
    pub fn is_invalid_session_id(&self) -> bool {
        matches!(self, Self::InvalidSessionId(_))
    }

    /// Check if this error belongs to the rendering stage's reportable failures.
    ///
    /// These are returned to the client as `{success: false, error}` rather than
    /// as an HTTP error status.
    pub fn is_render_failure(&self) -> bool {
        matches!(
            self,
            Self::CompilationFailed { .. } | Self::ArtifactMissing { .. }
        )
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<toml::de::Error> for PipelineError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("TOML parse error: {}", err))
    }
}

/// A type alias for `Result<T, PipelineError>`.
pub type Result<T> = std::result::Result<T, PipelineError>;
