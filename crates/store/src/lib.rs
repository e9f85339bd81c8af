//! Storage for jobs and chat messages.
//!
//! [`Store`] is the seam every other component depends on; it is shared as
//! `Arc<dyn Store>`. [`InMemoryStore`] is the only backend: nothing survives
//! a restart.

mod memory;

pub use memory::InMemoryStore;

use relay_core::job::Job;
use relay_core::message::Message;

/// Keyed collections of jobs and messages.
///
/// Every method hands out or takes owned values, so callers can never alias
/// stored state. Each single write is atomic; there are no cross-entity
/// transactions.
pub trait Store: Send + Sync {
    /// Insert a job by id, replacing any existing job with the same id.
    fn create_job(&self, job: Job);

    /// Look up a job. Absence is a normal result.
    fn get_job(&self, id: &str) -> Option<Job>;

    /// Replace an existing job. Jobs with an unknown id are dropped silently.
    fn update_job(&self, job: Job);

    /// All jobs, in insertion order.
    fn list_jobs(&self) -> Vec<Job>;

    /// Insert a message by id, replacing any existing message with the same id.
    fn create_message(&self, message: Message);

    /// Look up a message. Absence is a normal result.
    fn get_message(&self, id: &str) -> Option<Message>;

    /// All messages ordered by timestamp; equal timestamps keep insertion order.
    fn list_messages(&self) -> Vec<Message>;

    /// Number of stored jobs.
    fn job_count(&self) -> usize {
        self.list_jobs().len()
    }

    /// Number of stored messages.
    fn message_count(&self) -> usize {
        self.list_messages().len()
    }
}
