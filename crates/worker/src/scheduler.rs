//! Polling job scheduler.
//!
//! Every tick lists the store's jobs and dispatches each pending one to the
//! [`JobWorker`] without waiting for it. The worker flips a job to
//! `processing` during dispatch, so a job is normally picked up once; nothing
//! stronger than that is guaranteed. The flip is a `get_job` followed by an
//! `update_job`, two separate lock acquisitions rather than an atomic claim.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use relay_core::job::JobStatus;
use relay_core::types::EntityId;
use relay_store::Store;
use tokio_util::sync::CancellationToken;

use crate::job_worker::JobWorker;

/// Default interval between scans.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(500);

/// Long-lived poller feeding pending jobs to a [`JobWorker`].
pub struct JobScheduler {
    store: Arc<dyn Store>,
    worker: JobWorker,
    tick_interval: Duration,
}

impl JobScheduler {
    /// Create a scheduler with the default 500 ms tick.
    pub fn new(store: Arc<dyn Store>, worker: JobWorker) -> Self {
        Self {
            store,
            worker,
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }

    /// Override the tick interval.
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// Run the scheduler loop until the cancellation token is triggered.
    ///
    /// In-flight workers are not cancelled; they finish on their own.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.tick_interval);
        tracing::info!(
            tick_interval_ms = self.tick_interval.as_millis() as u64,
            "Job scheduler started",
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Job scheduler shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    self.tick();
                }
            }
        }
    }

    /// One scan: dispatch every pending job. Returns how many were dispatched.
    pub fn tick(&self) -> usize {
        let pending: Vec<EntityId> = self
            .store
            .list_jobs()
            .into_iter()
            .filter(|job| job.status == JobStatus::Pending)
            .map(|job| job.id)
            .collect();

        if !pending.is_empty() {
            tracing::debug!(count = pending.len(), "Dispatching pending jobs");
        }

        let count = pending.len();
        for job_id in pending {
            self.dispatch(job_id);
        }
        count
    }

    /// Spawn the worker for one job and log it if the worker task fails.
    ///
    /// The worker's synchronous claim step runs on the scheduler's task, so a
    /// panic there is caught here instead of unwinding through the loop.
    fn dispatch(&self, job_id: EntityId) {
        let started = std::panic::catch_unwind(AssertUnwindSafe(|| self.worker.process(&job_id)));
        let Ok(work) = started else {
            tracing::error!(job_id = %job_id, "Failed to process job");
            return;
        };
        let task = tokio::spawn(work);

        tokio::spawn(async move {
            if let Err(e) = task.await {
                tracing::error!(job_id = %job_id, error = %e, "Failed to process job");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use relay_core::job::{Job, JobPayload, JobType};
    use relay_core::message::Message;
    use relay_store::InMemoryStore;
    use serde_json::json;

    use super::*;

    fn pending_job(id: &str) -> Job {
        let mut job = Job::new(JobType::ChatMessage, JobPayload::Opaque(json!({"n": 1})));
        job.id = id.into();
        job
    }

    fn scheduler(store: Arc<dyn Store>) -> JobScheduler {
        JobScheduler::new(Arc::clone(&store), JobWorker::new(store))
    }

    #[tokio::test(start_paused = true)]
    async fn tick_dispatches_only_pending_jobs() {
        let store = Arc::new(InMemoryStore::new());
        store.create_job(pending_job("a"));
        store.create_job(pending_job("b"));
        store.create_job(pending_job("done").into_completed("earlier".into()));

        let scheduler = scheduler(store.clone());
        assert_eq!(scheduler.tick(), 2);

        assert_eq!(store.get_job("a").unwrap().status, JobStatus::Processing);
        assert_eq!(store.get_job("b").unwrap().status, JobStatus::Processing);
        assert_eq!(
            store.get_job("done").unwrap().result.unwrap().message,
            "earlier"
        );

        // Already processing: nothing left to dispatch.
        assert_eq!(scheduler.tick(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn dispatched_jobs_complete_after_delay() {
        let store = Arc::new(InMemoryStore::new());
        store.create_job(pending_job("a"));

        scheduler(store.clone()).tick();
        tokio::time::sleep(Duration::from_millis(150)).await;

        assert_eq!(store.get_job("a").unwrap().status, JobStatus::Completed);
    }

    #[tokio::test(start_paused = true)]
    async fn run_picks_up_jobs_created_later_and_stops_on_cancel() {
        let store = Arc::new(InMemoryStore::new());
        let scheduler = scheduler(store.clone());
        let cancel = CancellationToken::new();

        let handle = tokio::spawn({
            let cancel = cancel.clone();
            async move { scheduler.run(cancel).await }
        });

        tokio::time::sleep(Duration::from_millis(200)).await;
        store.create_job(pending_job("late"));
        assert_eq!(store.get_job("late").unwrap().status, JobStatus::Pending);

        // Next tick at 500 ms, then 100 ms of processing.
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(store.get_job("late").unwrap().status, JobStatus::Completed);

        cancel.cancel();
        handle.await.unwrap();
    }

    /// Store whose write of `status` panics for one job id.
    struct PanicsOn {
        inner: InMemoryStore,
        poisoned_id: &'static str,
        status: JobStatus,
    }

    impl PanicsOn {
        fn new(poisoned_id: &'static str, status: JobStatus) -> Self {
            Self {
                inner: InMemoryStore::new(),
                poisoned_id,
                status,
            }
        }
    }

    impl Store for PanicsOn {
        fn create_job(&self, job: Job) {
            self.inner.create_job(job)
        }
        fn get_job(&self, id: &str) -> Option<Job> {
            self.inner.get_job(id)
        }
        fn update_job(&self, job: Job) {
            if job.id == self.poisoned_id && job.status == self.status {
                panic!("simulated worker failure");
            }
            self.inner.update_job(job)
        }
        fn list_jobs(&self) -> Vec<Job> {
            self.inner.list_jobs()
        }
        fn create_message(&self, message: Message) {
            self.inner.create_message(message)
        }
        fn get_message(&self, id: &str) -> Option<Message> {
            self.inner.get_message(id)
        }
        fn list_messages(&self) -> Vec<Message> {
            self.inner.list_messages()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn failing_job_does_not_affect_others_or_the_loop() {
        let store = Arc::new(PanicsOn::new("boom", JobStatus::Completed));
        store.create_job(pending_job("boom"));
        store.create_job(pending_job("fine"));

        let scheduler = scheduler(store.clone());
        assert_eq!(scheduler.tick(), 2);
        tokio::time::sleep(Duration::from_millis(150)).await;

        assert_eq!(store.get_job("fine").unwrap().status, JobStatus::Completed);
        assert_eq!(store.get_job("boom").unwrap().status, JobStatus::Processing);

        store.create_job(pending_job("after"));
        assert_eq!(scheduler.tick(), 1);
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(store.get_job("after").unwrap().status, JobStatus::Completed);
    }

    #[tokio::test(start_paused = true)]
    async fn panic_while_claiming_a_job_is_contained() {
        let store = Arc::new(PanicsOn::new("boom", JobStatus::Processing));
        store.create_job(pending_job("boom"));
        store.create_job(pending_job("fine"));

        let scheduler = scheduler(store.clone());
        assert_eq!(scheduler.tick(), 2);
        tokio::time::sleep(Duration::from_millis(150)).await;

        assert_eq!(store.get_job("fine").unwrap().status, JobStatus::Completed);
        assert_eq!(store.get_job("boom").unwrap().status, JobStatus::Pending);

        // The loop keeps going: the unclaimed job is offered again.
        let cancel = CancellationToken::new();
        let handle = tokio::spawn({
            let cancel = cancel.clone();
            async move { scheduler.run(cancel).await }
        });
        store.create_job(pending_job("after"));
        tokio::time::sleep(Duration::from_millis(700)).await;
        assert_eq!(store.get_job("after").unwrap().status, JobStatus::Completed);

        cancel.cancel();
        handle.await.unwrap();
    }
}
