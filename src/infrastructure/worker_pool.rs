// Fixed-width worker pool
// Jobs are spawned onto the runtime and gated by a semaphore; results come
// back in the order the jobs finish.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone)]
pub struct WorkerPool {
    width: usize,
    slots: Arc<Semaphore>,
}

impl WorkerPool {
    /// A pool running at most `width` jobs at once. A width of zero is
    /// treated as one.
    pub fn new(width: usize) -> Self {
        let width = width.max(1);
        Self {
            width,
            slots: Arc::new(Semaphore::new(width)),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Submit every job and hand back their completions
    pub fn submit_all<I, Fut, T>(&self, jobs: I) -> Completions<T>
    where
        I: IntoIterator<Item = Fut>,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let mut running = JoinSet::new();
        let mut submitted = 0;
        for job in jobs {
            let slots = self.slots.clone();
            running.spawn(async move {
                // The semaphore is never closed, so the permit is always granted
                let _permit = slots.acquire_owned().await.ok();
                job.await
            });
            submitted += 1;
        }
        Completions { running, submitted }
    }
}

/// Results of submitted jobs, yielded as each job finishes
pub struct Completions<T> {
    running: JoinSet<T>,
    submitted: usize,
}

impl<T: 'static> Completions<T> {
    pub fn submitted(&self) -> usize {
        self.submitted
    }

    /// Next finished job, or `None` once every job has been collected.
    /// A job that panicked surfaces as `AppError::TaskError`.
    pub async fn next(&mut self) -> Option<AppResult<T>> {
        let joined = self.running.join_next().await?;
        Some(joined.map_err(|e| AppError::TaskError(format!("Worker task failed: {}", e))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_runs_every_job() {
        let pool = WorkerPool::new(3);
        let mut completions = pool.submit_all((0..10).map(|i| async move { i * 2 }));
        assert_eq!(completions.submitted(), 10);

        let mut results = Vec::new();
        while let Some(result) = completions.next().await {
            results.push(result.unwrap());
        }
        results.sort();
        assert_eq!(results, (0..10).map(|i| i * 2).collect::<Vec<_>>());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_width_bounds_concurrency() {
        let pool = WorkerPool::new(2);
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let jobs = (0..8).map(|_| {
            let active = active.clone();
            let peak = peak.clone();
            async move {
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                active.fetch_sub(1, Ordering::SeqCst);
            }
        });

        let mut completions = pool.submit_all(jobs);
        while let Some(result) = completions.next().await {
            result.unwrap();
        }

        assert_eq!(active.load(Ordering::SeqCst), 0);
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_results_arrive_in_completion_order() {
        let pool = WorkerPool::new(4);
        let jobs = [80u64, 10].into_iter().map(|delay| async move {
            tokio::time::sleep(Duration::from_millis(delay)).await;
            delay
        });

        let mut completions = pool.submit_all(jobs);
        assert_eq!(completions.next().await.unwrap().unwrap(), 10);
        assert_eq!(completions.next().await.unwrap().unwrap(), 80);
        assert!(completions.next().await.is_none());
    }

    #[tokio::test]
    async fn test_panicking_job_is_reported() {
        let pool = WorkerPool::new(1);
        let jobs = [true, false].into_iter().map(|explode| async move {
            if explode {
                panic!("boom");
            }
            7
        });

        let mut completions = pool.submit_all(jobs);
        let mut ok = 0;
        let mut failed = 0;
        while let Some(result) = completions.next().await {
            match result {
                Ok(v) => {
                    assert_eq!(v, 7);
                    ok += 1;
                }
                Err(AppError::TaskError(_)) => failed += 1,
                Err(other) => panic!("unexpected error: {}", other),
            }
        }
        assert_eq!((ok, failed), (1, 1));
    }

    #[test]
    fn test_zero_width_is_clamped() {
        assert_eq!(WorkerPool::new(0).width(), 1);
    }
}
