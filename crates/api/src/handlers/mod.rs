pub mod jobs;
pub mod messages;
