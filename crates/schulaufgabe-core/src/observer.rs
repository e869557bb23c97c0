//! Observability seam for pipeline stages.
//!
//! Stages report what happened through an injected observer instead of
//! touching process-wide metric registries.

use std::time::Duration;

use crate::session::SessionId;

/// Result of a timed stage, used as a metric label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    Success,
    Failure,
}

impl StageOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageOutcome::Success => "success",
            StageOutcome::Failure => "failure",
        }
    }

    pub fn from_result<T, E>(result: &std::result::Result<T, E>) -> Self {
        if result.is_ok() {
            StageOutcome::Success
        } else {
            StageOutcome::Failure
        }
    }
}

/// Receiver of pipeline events. All methods default to no-ops.
pub trait PipelineObserver: Send + Sync {
    fn upload_stored(&self, _id: &SessionId) {}

    fn transcription_finished(&self, _outcome: StageOutcome, _elapsed: Duration) {}

    fn compilation_finished(&self, _outcome: StageOutcome, _elapsed: Duration) {}

    fn artifact_retrieved(&self, _id: &SessionId) {}
}

/// Observer that discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {}
