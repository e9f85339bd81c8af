//! File-size limits and formatting for shared files.
//!
//! Files travel base64-encoded inside a single WebSocket frame, so the
//! sending side checks sizes before encoding. The server does not enforce
//! these limits.

use crate::error::CoreError;

/// Largest file a client will share: 10 MiB.
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// Format a byte count for display, e.g. `1536` -> `"1.5 KB"`.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut exponent = 0;
    let mut scaled = bytes as f64;
    while scaled >= 1024.0 && exponent < UNITS.len() - 1 {
        scaled /= 1024.0;
        exponent += 1;
    }

    let rounded = format!("{scaled:.2}");
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed} {}", UNITS[exponent])
}

/// Reject files larger than `max_size` bytes.
pub fn validate_file_size(size: u64, max_size: u64) -> Result<(), CoreError> {
    if size > max_size {
        return Err(CoreError::Validation(format!(
            "File size ({}) exceeds maximum allowed size ({})",
            format_file_size(size),
            format_file_size(max_size),
        )));
    }
    Ok(())
}

/// Reject empty files.
pub fn validate_file_not_empty(size: u64) -> Result<(), CoreError> {
    if size == 0 {
        return Err(CoreError::Validation("Cannot upload empty file".into()));
    }
    Ok(())
}
