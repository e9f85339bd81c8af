use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use indexmap::IndexMap;
use relay_core::job::Job;
use relay_core::message::Message;
use relay_core::types::EntityId;

use crate::Store;

/// [`Store`] backed by two lock-guarded, insertion-ordered maps.
///
/// Unbounded: entries are never evicted.
#[derive(Default)]
pub struct InMemoryStore {
    jobs: RwLock<IndexMap<EntityId, Job>>,
    messages: RwLock<IndexMap<EntityId, Message>>,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

// A panic while holding a guard cannot leave a map half-written (every
// write is a single insert), so poisoned locks are recovered.
fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

impl Store for InMemoryStore {
    fn create_job(&self, job: Job) {
        write(&self.jobs).insert(job.id.clone(), job);
    }

    fn get_job(&self, id: &str) -> Option<Job> {
        read(&self.jobs).get(id).cloned()
    }

    fn update_job(&self, job: Job) {
        let mut jobs = write(&self.jobs);
        match jobs.get_mut(&job.id) {
            Some(existing) => *existing = job,
            None => tracing::debug!(job_id = %job.id, "Dropping update for unknown job"),
        }
    }

    fn list_jobs(&self) -> Vec<Job> {
        read(&self.jobs).values().cloned().collect()
    }

    fn create_message(&self, message: Message) {
        write(&self.messages).insert(message.id.clone(), message);
    }

    fn get_message(&self, id: &str) -> Option<Message> {
        read(&self.messages).get(id).cloned()
    }

    fn list_messages(&self) -> Vec<Message> {
        let mut messages: Vec<Message> = read(&self.messages).values().cloned().collect();
        // Stable sort: ties stay in insertion order.
        messages.sort_by_key(|m| m.timestamp);
        messages
    }

    fn job_count(&self) -> usize {
        read(&self.jobs).len()
    }

    fn message_count(&self) -> usize {
        read(&self.messages).len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, Utc};
    use relay_core::job::{JobPayload, JobStatus, JobType};
    use serde_json::json;

    use super::*;

    fn job(id: &str) -> Job {
        let mut job = Job::new(JobType::ChatMessage, JobPayload::Opaque(json!({"text": "hi"})));
        job.id = id.to_string();
        job
    }

    #[test]
    fn create_then_get_returns_copy() {
        let store = InMemoryStore::new();
        store.create_job(job("job-1"));

        let mut fetched = store.get_job("job-1").expect("job should exist");
        fetched.status = JobStatus::Failed;

        assert_eq!(store.get_job("job-1").unwrap().status, JobStatus::Pending);
    }

    #[test]
    fn get_unknown_job_is_none() {
        let store = InMemoryStore::new();
        assert!(store.get_job("missing").is_none());
    }

    #[test]
    fn create_overwrites_existing_id() {
        let store = InMemoryStore::new();
        store.create_job(job("job-1"));

        let mut replacement = job("job-1");
        replacement.job_type = JobType::FileUpload;
        store.create_job(replacement);

        assert_eq!(store.job_count(), 1);
        assert_eq!(store.get_job("job-1").unwrap().job_type, JobType::FileUpload);
    }

    #[test]
    fn update_replaces_existing_job() {
        let store = InMemoryStore::new();
        store.create_job(job("job-1"));

        let updated = store.get_job("job-1").unwrap().into_processing();
        store.update_job(updated);

        assert_eq!(store.get_job("job-1").unwrap().status, JobStatus::Processing);
    }

    #[test]
    fn update_unknown_job_leaves_store_unchanged() {
        let store = InMemoryStore::new();
        store.create_job(job("job-1"));
        let before = store.list_jobs();

        store.update_job(job("ghost"));

        assert_eq!(store.list_jobs(), before);
        assert!(store.get_job("ghost").is_none());
    }

    #[test]
    fn list_jobs_keeps_insertion_order() {
        let store = InMemoryStore::new();
        for id in ["c", "a", "b"] {
            store.create_job(job(id));
        }

        let ids: Vec<_> = store.list_jobs().into_iter().map(|j| j.id).collect();
        assert_eq!(ids, ["c", "a", "b"]);
    }

    #[test]
    fn list_messages_sorts_by_timestamp() {
        let store = InMemoryStore::new();
        let t0 = Utc::now();
        let t1 = t0 + Duration::seconds(1);
        let t2 = t0 + Duration::seconds(2);

        store.create_message(Message::chat("u", "two").at(t2));
        store.create_message(Message::chat("u", "zero").at(t0));
        store.create_message(Message::chat("u", "one").at(t1));

        let contents: Vec<_> = store.list_messages().into_iter().map(|m| m.content).collect();
        assert_eq!(contents, ["zero", "one", "two"]);
    }

    #[test]
    fn equal_timestamps_keep_insertion_order() {
        let store = InMemoryStore::new();
        let t = Utc::now();

        store.create_message(Message::chat("u", "first").at(t));
        store.create_message(Message::chat("u", "second").at(t));
        store.create_message(Message::chat("u", "third").at(t));

        let contents: Vec<_> = store.list_messages().into_iter().map(|m| m.content).collect();
        assert_eq!(contents, ["first", "second", "third"]);
    }

    #[test]
    fn get_message_round_trips() {
        let store = InMemoryStore::new();
        let msg = Message::chat("user-123", "Hello");
        store.create_message(msg.clone());

        assert_eq!(store.get_message(&msg.id), Some(msg));
        assert!(store.get_message("missing").is_none());
        assert_eq!(store.message_count(), 1);
    }

    #[test]
    fn concurrent_writers_do_not_lose_entries() {
        let store = Arc::new(InMemoryStore::new());

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for i in 0..50 {
                        store.create_job(job(&format!("job-{t}-{i}")));
                        store.create_message(Message::chat(format!("user-{t}"), format!("{i}")));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.job_count(), 400);
        assert_eq!(store.message_count(), 400);
    }
}
