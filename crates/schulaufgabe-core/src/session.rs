//! Session identity and the fixed artifact layout of a session directory.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{PipelineError, Result};

/// Length of the canonical hyphenated UUID form.
pub const SESSION_ID_LEN: usize = 36;

/// Identifier of one upload → transcribe → render workflow.
///
/// A `SessionId` always holds a canonical, lower-case, hyphenated UUID. The only
/// constructors are [`SessionId::new_random`] and [`SessionId::parse`], so any
/// value of this type is safe to use as a directory name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionId(String);

impl SessionId {
    /// Generates a fresh random (v4) identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Validates an untrusted identifier.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidSessionId`] when `raw` is not exactly 36
    /// characters or is not a hyphenated UUID. Path separators, `..` segments and
    /// the like never survive this check.
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.len() != SESSION_ID_LEN {
            return Err(PipelineError::InvalidSessionId(raw.to_string()));
        }

        let uuid = Uuid::parse_str(raw)
            .map_err(|_| PipelineError::InvalidSessionId(raw.to_string()))?;

        // Normalise case so that the same session always maps to the same directory.
        Ok(Self(uuid.hyphenated().to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SessionId {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for SessionId {
    type Error = PipelineError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<SessionId> for String {
    fn from(id: SessionId) -> Self {
        id.0
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The files a session directory may contain, each under a fixed name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Artifact {
    /// Raw upload bytes.
    SourceImage,
    /// Sanitized LaTeX handed to the compiler. Removed after a successful compile.
    MarkupSource,
    /// Compiled PDF, kept for retrieval.
    CompiledDocument,
}

impl Artifact {
    pub fn file_name(&self) -> &'static str {
        match self {
            Artifact::SourceImage => "input.jpg",
            Artifact::MarkupSource => "output.tex",
            Artifact::CompiledDocument => "output.pdf",
        }
    }

    /// Human-readable name used in error messages.
    pub fn label(&self) -> &'static str {
        match self {
            Artifact::SourceImage => "Image",
            Artifact::MarkupSource => "LaTeX source",
            Artifact::CompiledDocument => "PDF",
        }
    }
}
