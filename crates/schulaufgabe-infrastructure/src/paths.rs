//! Unified path management for session scratch space.
//!
//! Every session directory lives under one namespaced root inside the temp
//! directory, so unrelated temp files never collide with ours.
//!
//! ```text
//! $TMPDIR/                     # OS temp dir, or storage.temp_root
//! └── schulaufgabe/            # scratch root (SCRATCH_NAMESPACE)
//!     └── <session-id>/        # one directory per session
//!         ├── input.jpg        # uploaded worksheet photo
//!         ├── output.tex       # sanitized LaTeX (removed after compiling)
//!         └── output.pdf       # compiled document
//! ```

use std::path::{Path, PathBuf};

use schulaufgabe_core::{Artifact, SessionId};

/// Directory name that namespaces all scratch data under the temp root.
pub const SCRATCH_NAMESPACE: &str = "schulaufgabe";

/// Path layout for scratch data.
///
/// All session paths are derived from a validated [`SessionId`]; no method here
/// accepts a raw string.
#[derive(Debug, Clone)]
pub struct SchulaufgabePaths {
    scratch_root: PathBuf,
}

impl SchulaufgabePaths {
    /// Builds the layout under `temp_root`, or the OS temp dir when `None`.
    pub fn new(temp_root: Option<PathBuf>) -> Self {
        let base = temp_root.unwrap_or_else(std::env::temp_dir);
        Self {
            scratch_root: base.join(SCRATCH_NAMESPACE),
        }
    }

    /// Returns `<temp_root>/schulaufgabe`.
    pub fn scratch_root(&self) -> &Path {
        &self.scratch_root
    }

    /// Returns `<temp_root>/schulaufgabe/<id>`.
    pub fn session_dir(&self, id: &SessionId) -> PathBuf {
        self.scratch_root.join(id.as_str())
    }

    /// Returns the fixed path of one artifact inside a session directory.
    pub fn artifact_file(&self, id: &SessionId, artifact: Artifact) -> PathBuf {
        self.session_dir(id).join(artifact.file_name())
    }
}

impl Default for SchulaufgabePaths {
    fn default() -> Self {
        Self::new(None)
    }
}
