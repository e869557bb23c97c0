//! File system-based session store.
//!
//! This module provides the `SessionStore` implementation backed by one scratch
//! directory per session under [`SchulaufgabePaths::scratch_root`].

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

use schulaufgabe_core::error::{PipelineError, Result};
use schulaufgabe_core::store::SessionStore;
use schulaufgabe_core::{Artifact, SessionId};

use crate::paths::SchulaufgabePaths;

/// File system-based session store.
///
/// Sessions are never deleted here; expired directories are removed by
/// [`crate::sweeper::ScratchSweeper`].
#[derive(Debug, Clone)]
pub struct FsSessionStore {
    paths: SchulaufgabePaths,
}

impl FsSessionStore {
    /// Creates a store rooted at the given path layout.
    pub fn new(paths: SchulaufgabePaths) -> Self {
        Self { paths }
    }

    /// Creates a store under `temp_root/schulaufgabe`.
    pub fn with_temp_root(temp_root: impl Into<PathBuf>) -> Self {
        Self::new(SchulaufgabePaths::new(Some(temp_root.into())))
    }

    pub fn paths(&self) -> &SchulaufgabePaths {
        &self.paths
    }

    /// Creates a session directory if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    async fn ensure_dir(dir: &Path) -> Result<()> {
        fs::create_dir_all(dir).await.map_err(|e| {
            PipelineError::io(format!(
                "Failed to create session directory '{}': {}",
                dir.display(),
                e
            ))
        })
    }
}

impl Default for FsSessionStore {
    fn default() -> Self {
        Self::new(SchulaufgabePaths::default())
    }
}

#[async_trait]
impl SessionStore for FsSessionStore {
    async fn create_session(&self) -> Result<SessionId> {
        let id = SessionId::new_random();
        Self::ensure_dir(&self.paths.session_dir(&id)).await?;
        tracing::debug!(session_id = %id, "[Session] Created scratch directory");
        Ok(id)
    }

    async fn scratch_dir(&self, id: &SessionId) -> Result<PathBuf> {
        let dir = self.paths.session_dir(id);
        Self::ensure_dir(&dir).await?;
        Ok(dir)
    }

    async fn store_upload(&self, id: &SessionId, bytes: &[u8]) -> Result<()> {
        self.scratch_dir(id).await?;
        let dest_path = self.paths.artifact_file(id, Artifact::SourceImage);

        fs::write(&dest_path, bytes).await.map_err(|e| {
            PipelineError::io(format!(
                "Failed to write upload to '{}': {}",
                dest_path.display(),
                e
            ))
        })?;

        tracing::info!(
            session_id = %id,
            bytes = bytes.len(),
            "[Upload] Saved uploaded file to {}",
            dest_path.display()
        );
        Ok(())
    }

    async fn load_upload(&self, id: &SessionId) -> Result<Vec<u8>> {
        let image_path = self.paths.artifact_file(id, Artifact::SourceImage);

        match fs::read(&image_path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(PipelineError::not_found(Artifact::SourceImage, id.as_str()))
            }
            Err(e) => Err(PipelineError::io(format!(
                "Failed to read upload '{}': {}",
                image_path.display(),
                e
            ))),
        }
    }

    async fn write_markup(&self, id: &SessionId, markup: &str) -> Result<PathBuf> {
        self.scratch_dir(id).await?;
        let tex_path = self.paths.artifact_file(id, Artifact::MarkupSource);

        fs::write(&tex_path, markup.trim_start()).await.map_err(|e| {
            PipelineError::io(format!(
                "Failed to write LaTeX to '{}': {}",
                tex_path.display(),
                e
            ))
        })?;

        Ok(tex_path)
    }

    async fn remove_markup(&self, id: &SessionId) -> Result<()> {
        let tex_path = self.paths.artifact_file(id, Artifact::MarkupSource);

        match fs::remove_file(&tex_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PipelineError::io(format!(
                "Failed to remove '{}': {}",
                tex_path.display(),
                e
            ))),
        }
    }

    async fn artifact_path(&self, id: &SessionId, artifact: Artifact) -> Result<PathBuf> {
        self.scratch_dir(id).await?;
        Ok(self.paths.artifact_file(id, artifact))
    }

    async fn locate(&self, id: &SessionId, artifact: Artifact) -> Result<Option<PathBuf>> {
        let path = self.paths.artifact_file(id, artifact);

        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(Some(path)),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(temp_dir: &TempDir) -> FsSessionStore {
        FsSessionStore::with_temp_root(temp_dir.path())
    }

    #[tokio::test]
    async fn test_create_session_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);

        let id = store.create_session().await.unwrap();

        assert_eq!(id.as_str().len(), 36);
        let dir = temp_dir.path().join("schulaufgabe").join(id.as_str());
        assert!(dir.is_dir());
    }

    #[tokio::test]
    async fn test_scratch_dir_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);
        let id = store.create_session().await.unwrap();

        let first = store.scratch_dir(&id).await.unwrap();
        let second = store.scratch_dir(&id).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_resolve_scratch_dir_rejects_bad_ids_without_touching_disk() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);

        for raw in ["", "short", "../../etc", "../../../../../../../../../etc/passw"] {
            let err = store.resolve_scratch_dir(raw).await.unwrap_err();
            assert!(err.is_invalid_session_id(), "accepted {:?}", raw);
        }

        assert!(!temp_dir.path().join("schulaufgabe").exists());
    }

    #[tokio::test]
    async fn test_resolve_scratch_dir_creates_for_valid_id() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);

        let dir = store
            .resolve_scratch_dir("123e4567-e89b-12d3-a456-426614174000")
            .await
            .unwrap();
        assert!(dir.is_dir());
        assert!(dir.ends_with("schulaufgabe/123e4567-e89b-12d3-a456-426614174000"));
    }

    #[tokio::test]
    async fn test_store_and_load_upload_overwrites() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);
        let id = store.create_session().await.unwrap();

        store.store_upload(&id, b"first").await.unwrap();
        store.store_upload(&id, b"second").await.unwrap();

        assert_eq!(store.load_upload(&id).await.unwrap(), b"second".to_vec());
    }

    #[tokio::test]
    async fn test_load_upload_missing_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);
        let id = store.create_session().await.unwrap();

        let err = store.load_upload(&id).await.unwrap_err();
        assert_eq!(
            err,
            PipelineError::not_found(Artifact::SourceImage, id.as_str())
        );
    }

    #[tokio::test]
    async fn test_write_and_remove_markup() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);
        let id = store.create_session().await.unwrap();

        let tex = store.write_markup(&id, "\n  \\section{A}").await.unwrap();
        assert_eq!(std::fs::read_to_string(&tex).unwrap(), "\\section{A}");
        assert!(store.locate(&id, Artifact::MarkupSource).await.unwrap().is_some());

        store.remove_markup(&id).await.unwrap();
        assert!(store.locate(&id, Artifact::MarkupSource).await.unwrap().is_none());

        // Removing twice is fine.
        store.remove_markup(&id).await.unwrap();
    }

    #[tokio::test]
    async fn test_locate_ignores_directories() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);
        let id = store.create_session().await.unwrap();

        let pdf = store
            .artifact_path(&id, Artifact::CompiledDocument)
            .await
            .unwrap();
        std::fs::create_dir(&pdf).unwrap();

        assert!(store
            .locate(&id, Artifact::CompiledDocument)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);
        let a = store.create_session().await.unwrap();
        let b = store.create_session().await.unwrap();

        store.store_upload(&a, b"A").await.unwrap();

        assert!(store.load_upload(&b).await.unwrap_err().is_not_found());
    }
}
