use std::path::PathBuf;

use relay_core::error::CoreError;

/// Errors surfaced by the chat client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Every reconnect attempt allowed by the policy failed.
    #[error("Gave up after {attempts} reconnect attempts")]
    ReconnectExhausted { attempts: u32 },

    /// A file could not be read from disk.
    #[error("Failed to read {}: {source}", path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A received file could not be written to disk.
    #[error("Failed to write {}: {source}", path.display())]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The path does not name a file.
    #[error("Not a file: {}", .0.display())]
    NotAFile(PathBuf),

    /// A file failed size validation.
    #[error(transparent)]
    Validation(#[from] CoreError),

    /// The HTTP request itself failed (connection refused, bad body, etc.).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The job API answered with a non-2xx status.
    #[error("Relay API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// A received file cannot be saved as-is.
    #[error("{0}")]
    Download(&'static str),

    /// A received file's contents are not valid base64.
    #[error("Invalid file data: {0}")]
    Decode(#[from] base64::DecodeError),

    /// No received file has an id starting with the given prefix.
    #[error("No received file matches '{0}'")]
    FileNotFound(String),

    /// More than one received file has an id starting with the given prefix.
    #[error("'{0}' matches more than one received file")]
    AmbiguousFile(String),
}
