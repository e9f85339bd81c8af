//! `relay-client` library crate.
//!
//! Terminal chat client for the relay's WebSocket hub and job API. The
//! binary entrypoint lives in `main.rs`; the session loop, reconnect
//! policy, job polling and file handling live here so they can be tested.

pub mod backoff;
pub mod download;
pub mod error;
pub mod jobs;
pub mod render;
pub mod session;
pub mod upload;
