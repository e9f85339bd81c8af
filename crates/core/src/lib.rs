//! Domain types shared by every chat-relay crate.
//!
//! Nothing in here performs I/O. The store, worker, API and client crates
//! all build on these definitions so the JSON shapes stay identical on both
//! ends of the wire.

pub mod error;
pub mod files;
pub mod frames;
pub mod job;
pub mod message;
pub mod types;
