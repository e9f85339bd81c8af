//! Simulated job processor.
//!
//! No real work happens: the worker flips the job to `processing`, sleeps for
//! the configured delay, then records a fabricated success result.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use relay_store::Store;

/// Default simulated processing time.
pub const DEFAULT_PROCESSING_DELAY: Duration = Duration::from_millis(100);

/// Drives one job at a time through its state machine. Cheap to clone.
#[derive(Clone)]
pub struct JobWorker {
    store: Arc<dyn Store>,
    processing_delay: Duration,
}

impl JobWorker {
    /// Create a worker with the default 100 ms processing delay.
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            processing_delay: DEFAULT_PROCESSING_DELAY,
        }
    }

    /// Override the simulated processing delay.
    pub fn with_processing_delay(mut self, delay: Duration) -> Self {
        self.processing_delay = delay;
        self
    }

    /// Process the job with `job_id`.
    ///
    /// The job is marked `processing` before this returns, so anyone reading
    /// the store after the call sees it even if the returned future has not
    /// been polled yet. The future sleeps for the processing delay and then
    /// marks the job `completed`.
    ///
    /// Unknown ids are a no-op. Running a completed job again repeats both
    /// transitions and replaces its result.
    pub fn process(&self, job_id: &str) -> impl Future<Output = ()> + Send + 'static {
        let started = self.start(job_id);
        let store = Arc::clone(&self.store);
        let delay = self.processing_delay;
        let job_id = job_id.to_owned();

        async move {
            if !started {
                return;
            }

            tokio::time::sleep(delay).await;

            let Some(job) = store.get_job(&job_id) else {
                return;
            };
            let message = job.completion_message();
            store.update_job(job.into_completed(message));

            tracing::info!(job_id = %job_id, "Job completed");
        }
    }

    /// Synchronous first step: mark the job `processing`.
    fn start(&self, job_id: &str) -> bool {
        match self.store.get_job(job_id) {
            Some(job) => {
                self.store.update_job(job.into_processing());
                tracing::debug!(job_id, "Job processing started");
                true
            }
            None => {
                tracing::debug!(job_id, "No job to process");
                false
            }
        }
    }
}
