//! Background job processing.
//!
//! - [`JobWorker`] drives a single job through `pending -> processing ->
//!   completed`.
//! - [`JobScheduler`] polls the store on a fixed tick and hands every
//!   pending job to the worker.

pub mod job_worker;
pub mod scheduler;

pub use job_worker::JobWorker;
pub use scheduler::JobScheduler;
