//! Bounded dispatch for compiler jobs.
//!
//! Each compilation runs on its own tokio task, and at most `workers` of them
//! run at once. Callers wait only on their own job; other sessions keep being
//! served while the pool is saturated.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Semaphore;

use schulaufgabe_core::compiler::{CompileOutput, CompileRequest, MarkupCompiler};
use schulaufgabe_core::error::{PipelineError, Result};

#[derive(Clone)]
pub struct CompilerPool {
    inner: Arc<dyn MarkupCompiler>,
    permits: Arc<Semaphore>,
    workers: usize,
}

impl CompilerPool {
    pub fn new(inner: Arc<dyn MarkupCompiler>, workers: usize) -> Self {
        let workers = workers.max(1);
        Self {
            inner,
            permits: Arc::new(Semaphore::new(workers)),
            workers,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Number of compile slots currently free.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }
}

#[async_trait]
impl MarkupCompiler for CompilerPool {
    async fn compile(&self, request: &CompileRequest) -> Result<CompileOutput> {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| PipelineError::io("Compiler pool is shut down"))?;

        let inner = Arc::clone(&self.inner);
        let request = request.clone();
        let job = tokio::spawn(async move {
            let _permit = permit;
            inner.compile(&request).await
        });

        job.await
            .map_err(|e| PipelineError::io(format!("Compiler task failed: {}", e)))?
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Records the highest number of overlapping compile calls.
    #[derive(Default)]
    struct SlowCompiler {
        running: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl MarkupCompiler for SlowCompiler {
        async fn compile(&self, _request: &CompileRequest) -> Result<CompileOutput> {
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(30)).await;
            self.running.fetch_sub(1, Ordering::SeqCst);
            Ok(CompileOutput::default())
        }

        fn name(&self) -> &str {
            "slow"
        }
    }

    struct FailingCompiler;

    #[async_trait]
    impl MarkupCompiler for FailingCompiler {
        async fn compile(&self, _request: &CompileRequest) -> Result<CompileOutput> {
            Err(PipelineError::compilation_failed("boom"))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    fn request() -> CompileRequest {
        CompileRequest {
            source: PathBuf::from("/tmp/x/output.tex"),
            output_dir: PathBuf::from("/tmp/x"),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrency_is_bounded() {
        let compiler = Arc::new(SlowCompiler::default());
        let pool = CompilerPool::new(compiler.clone(), 2);

        let jobs: Vec<_> = (0..6)
            .map(|_| {
                let pool = pool.clone();
                tokio::spawn(async move { pool.compile(&request()).await })
            })
            .collect();
        for job in jobs {
            job.await.unwrap().unwrap();
        }

        assert!(compiler.peak.load(Ordering::SeqCst) <= 2);
        assert_eq!(pool.available(), 2);
    }

    #[tokio::test]
    async fn test_errors_pass_through() {
        let pool = CompilerPool::new(Arc::new(FailingCompiler), 1);
        let err = pool.compile(&request()).await.unwrap_err();
        assert_eq!(err, PipelineError::compilation_failed("boom"));
        assert_eq!(pool.available(), 1);
        assert_eq!(pool.name(), "failing");
    }

    #[test]
    fn test_zero_workers_rounds_up() {
        let pool = CompilerPool::new(Arc::new(FailingCompiler), 0);
        assert_eq!(pool.workers(), 1);
    }
}
