//! Turning a local file into a `file_upload` payload and a `file` frame.

use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use relay_core::files::{validate_file_not_empty, validate_file_size, MAX_FILE_SIZE};
use relay_core::frames::InboundFrame;
use relay_core::job::FileUploadPayload;

use crate::error::ClientError;

/// Read `path` into a base64-encoded upload payload.
///
/// The size is checked against [`MAX_FILE_SIZE`] before the file is read.
/// The MIME type is guessed from the extension, falling back to
/// `application/octet-stream`.
pub async fn read_payload(path: &Path) -> Result<FileUploadPayload, ClientError> {
    let read_err = |source| ClientError::ReadFile {
        path: path.to_path_buf(),
        source,
    };

    let metadata = tokio::fs::metadata(path).await.map_err(read_err)?;
    if !metadata.is_file() {
        return Err(ClientError::NotAFile(path.to_path_buf()));
    }
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| ClientError::NotAFile(path.to_path_buf()))?;

    validate_file_not_empty(metadata.len())?;
    validate_file_size(metadata.len(), MAX_FILE_SIZE)?;

    let bytes = tokio::fs::read(path).await.map_err(read_err)?;
    let file_type = mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string();

    tracing::debug!(file_name = %file_name, file_size = bytes.len(), "Encoding file");

    Ok(FileUploadPayload {
        file_name,
        file_type,
        file_size: bytes.len() as u64,
        data: STANDARD.encode(&bytes),
    })
}

/// The `file` frame sharing `payload` as `user_id`.
pub fn file_frame(user_id: &str, payload: FileUploadPayload) -> InboundFrame {
    InboundFrame::File {
        user_id: user_id.to_string(),
        file_name: payload.file_name,
        file_type: payload.file_type,
        file_size: payload.file_size,
        data: payload.data,
    }
}
