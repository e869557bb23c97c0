//! Session storage trait definition.
//!
//! This module defines the `SessionStore` trait, the abstraction over the
//! per-session scratch directories that carry a worksheet through the pipeline.

use async_trait::async_trait;
use std::path::PathBuf;

use crate::error::Result;
use crate::session::{Artifact, SessionId};

/// Trait for allocating sessions and reading/writing their artifacts.
///
/// Every session owns one directory. All reads and writes for a session are
/// confined to that directory, so implementations need no locking across
/// sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Allocates a fresh session and creates its scratch directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    async fn create_session(&self) -> Result<SessionId>;

    /// Returns the scratch directory for a session, creating it if absent.
    ///
    /// Directory creation is idempotent: an existing directory is success.
    async fn scratch_dir(&self, id: &SessionId) -> Result<PathBuf>;

    /// Validates an untrusted identifier, then resolves its scratch directory.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSessionId` before touching the filesystem when `raw` is
    /// not a 36-character UUID string.
    async fn resolve_scratch_dir(&self, raw: &str) -> Result<PathBuf> {
        let id = SessionId::parse(raw)?;
        self.scratch_dir(&id).await
    }

    /// Writes the uploaded image verbatim, overwriting any prior upload.
    async fn store_upload(&self, id: &SessionId, bytes: &[u8]) -> Result<()>;

    /// Reads the uploaded image.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when nothing has been uploaded for `id`.
    async fn load_upload(&self, id: &SessionId) -> Result<Vec<u8>>;

    /// Writes the markup source, overwriting, and returns its path.
    async fn write_markup(&self, id: &SessionId, markup: &str) -> Result<PathBuf>;

    /// Removes the markup source. Absence is not an error.
    async fn remove_markup(&self, id: &SessionId) -> Result<()>;

    /// Returns the path of an artifact whether or not it exists yet.
    async fn artifact_path(&self, id: &SessionId, artifact: Artifact) -> Result<PathBuf>;

    /// Returns the path of an artifact only if it exists as a regular file.
    async fn locate(&self, id: &SessionId, artifact: Artifact) -> Result<Option<PathBuf>>;
}
