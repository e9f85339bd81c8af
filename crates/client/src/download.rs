//! Saving received files to disk.

use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use relay_core::message::{FileData, Message, MessageType};

use crate::error::ClientError;

/// Decode the contents of a received file.
///
/// Empty data and a missing name or MIME type are rejected before decoding.
pub fn decode_file(file: &FileData) -> Result<Vec<u8>, ClientError> {
    if file.data.is_empty() {
        return Err(ClientError::Download("Cannot download empty file"));
    }
    if file.file_name.is_empty() || file.file_type.is_empty() {
        return Err(ClientError::Download("File metadata is incomplete"));
    }
    Ok(STANDARD.decode(&file.data)?)
}

/// Write the file attached to `message` and return where it landed.
///
/// When `dest` is an existing directory the file keeps its shared name
/// inside it; otherwise `dest` is the target path.
pub async fn save_file(message: &Message, dest: &Path) -> Result<PathBuf, ClientError> {
    let file = message
        .file_data
        .as_ref()
        .ok_or(ClientError::Download("File data is missing"))?;
    let bytes = decode_file(file)?;

    let is_dir = tokio::fs::metadata(dest).await.is_ok_and(|m| m.is_dir());
    let target = if is_dir {
        dest.join(local_file_name(&file.file_name))
    } else {
        dest.to_path_buf()
    };

    tokio::fs::write(&target, &bytes)
        .await
        .map_err(|source| ClientError::WriteFile {
            path: target.clone(),
            source,
        })?;

    tracing::debug!(path = %target.display(), bytes = bytes.len(), "Saved file");
    Ok(target)
}

/// Last path component of a peer-supplied name.
fn local_file_name(name: &str) -> String {
    Path::new(name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "download".to_string())
}

/// File messages seen during this session, addressable by id prefix.
#[derive(Debug, Default)]
pub struct ReceivedFiles {
    files: Vec<Message>,
}

impl ReceivedFiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember `message` if it is a file share not seen before.
    pub fn record(&mut self, message: &Message) {
        if message.message_type != MessageType::File {
            return;
        }
        if self.files.iter().any(|m| m.id == message.id) {
            return;
        }
        self.files.push(message.clone());
    }

    /// The single recorded file whose id starts with `id_prefix`.
    pub fn find(&self, id_prefix: &str) -> Result<&Message, ClientError> {
        let mut matches = self.files.iter().filter(|m| m.id.starts_with(id_prefix));
        match (matches.next(), matches.next()) {
            (Some(found), None) => Ok(found),
            (None, _) => Err(ClientError::FileNotFound(id_prefix.to_string())),
            (Some(_), Some(_)) => Err(ClientError::AmbiguousFile(id_prefix.to_string())),
        }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
