//! Expiry of old session directories.
//!
//! Sessions are never deleted by the pipeline itself. The sweeper removes
//! directories under the scratch root whose modification time is older than the
//! configured TTL. Entries whose name is not a session id are left alone.

use std::io::ErrorKind;
use std::time::{Duration, SystemTime};

use tokio::fs;
use tokio::task::JoinHandle;

use schulaufgabe_core::SessionId;
use schulaufgabe_core::error::Result;

use crate::paths::SchulaufgabePaths;

#[derive(Debug, Clone)]
pub struct ScratchSweeper {
    paths: SchulaufgabePaths,
    ttl: Duration,
}

impl ScratchSweeper {
    pub fn new(paths: SchulaufgabePaths, ttl: Duration) -> Self {
        Self { paths, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Removes every session directory last modified more than `ttl` before `now`.
    ///
    /// Returns the number of directories removed. A missing scratch root counts
    /// as nothing to do. Failure to remove one directory is logged and does not
    /// stop the sweep.
    pub async fn sweep_once(&self, now: SystemTime) -> Result<usize> {
        let root = self.paths.scratch_root();
        let mut entries = match fs::read_dir(root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if SessionId::parse(name).is_err() {
                continue;
            }

            let metadata = match entry.metadata().await {
                Ok(metadata) if metadata.is_dir() => metadata,
                Ok(_) => continue,
                Err(e) => {
                    tracing::warn!("[Sweeper] Could not stat {}: {}", name, e);
                    continue;
                }
            };

            let modified = metadata.modified()?;
            let age = now.duration_since(modified).unwrap_or(Duration::ZERO);
            if age <= self.ttl {
                continue;
            }

            match fs::remove_dir_all(entry.path()).await {
                Ok(()) => {
                    tracing::info!(session_id = name, age_secs = age.as_secs(), "[Sweeper] Removed expired session");
                    removed += 1;
                }
                Err(e) => tracing::warn!("[Sweeper] Could not remove session {}: {}", name, e),
            }
        }

        Ok(removed)
    }

    /// Runs [`Self::sweep_once`] every `interval` on the tokio runtime.
    pub fn spawn(self, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                match self.sweep_once(SystemTime::now()).await {
                    Ok(0) => {}
                    Ok(count) => tracing::info!("[Sweeper] Removed {} expired session(s)", count),
                    Err(e) => tracing::warn!("[Sweeper] Sweep failed: {}", e),
                }
            }
        })
    }
}
