//! Terminal formatting of received messages and job updates.

use relay_core::files::format_file_size;
use relay_core::job::Job;
use relay_core::message::{Message, MessageType};

/// First eight characters of an id, as shown to the user.
pub fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

/// Render one message as a single line, e.g. `[12:00:01] alice: hi`.
///
/// Times are shown in UTC. File shares end with the short id `/save` takes.
pub fn render(message: &Message) -> String {
    let time = message.timestamp.format("%H:%M:%S");

    match (message.message_type, &message.file_data) {
        (MessageType::File, Some(file)) => format!(
            "[{time}] {} shared {} ({}, {}) #{}",
            message.user_id,
            file.file_name,
            format_file_size(file.file_size),
            file.file_type,
            short_id(&message.id),
        ),
        (MessageType::File, None) => {
            format!("[{time}] {} shared {}", message.user_id, message.content)
        }
        (MessageType::Message, _) => {
            format!("[{time}] {}: {}", message.user_id, message.content)
        }
    }
}

/// Render a job status line, e.g. `* job 1a2b3c4d: completed (file_upload)`.
pub fn render_job(job: &Job) -> String {
    let line = format!("* job {}: {} ({})", short_id(&job.id), job.status, job.job_type);
    match &job.result {
        Some(result) => format!("{line} {}", result.message),
        None => line,
    }
}
