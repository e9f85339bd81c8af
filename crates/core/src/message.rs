//! Chat and file-share messages.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::types::{new_id, EntityId, Timestamp};

/// Kind of a persisted [`Message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Message,
    File,
}

/// File attached to a `file` message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileData {
    pub file_name: String,
    pub file_type: String,
    pub file_size: u64,
    /// Base64-encoded file contents.
    pub data: String,
}

/// A chat or file-share event. Immutable once created.
///
/// `file_data` is present exactly when `message_type` is [`MessageType::File`];
/// use [`Message::chat`] and [`Message::file`] to keep that true.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: EntityId,
    pub user_id: String,
    pub content: String,
    #[serde(rename = "type")]
    pub message_type: MessageType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_data: Option<FileData>,
    pub timestamp: Timestamp,
}

impl Message {
    /// A plain chat message stamped with the current time.
    pub fn chat(user_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            user_id: user_id.into(),
            content: content.into(),
            message_type: MessageType::Message,
            file_data: None,
            timestamp: Utc::now(),
        }
    }

    /// A file-share message; its content is the file name.
    pub fn file(user_id: impl Into<String>, file_data: FileData) -> Self {
        Self {
            id: new_id(),
            user_id: user_id.into(),
            content: file_data.file_name.clone(),
            message_type: MessageType::File,
            file_data: Some(file_data),
            timestamp: Utc::now(),
        }
    }

    /// Override the timestamp (history imports and tests).
    pub fn at(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = timestamp;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pdf() -> FileData {
        FileData {
            file_name: "test.pdf".into(),
            file_type: "application/pdf".into(),
            file_size: 1024,
            data: "base64data".into(),
        }
    }

    #[test]
    fn chat_message_has_no_file_data() {
        let msg = Message::chat("user-123", "Hello, world!");

        assert_eq!(msg.message_type, MessageType::Message);
        assert_eq!(msg.content, "Hello, world!");
        assert_eq!(msg.user_id, "user-123");
        assert!(msg.file_data.is_none());
    }

    #[test]
    fn file_message_uses_file_name_as_content() {
        let msg = Message::file("user-123", pdf());

        assert_eq!(msg.message_type, MessageType::File);
        assert_eq!(msg.content, "test.pdf");
        assert_eq!(msg.file_data.as_ref().map(|f| f.file_size), Some(1024));
    }

    #[test]
    fn serialized_chat_message_omits_file_data() {
        let value = serde_json::to_value(Message::chat("u", "hi")).unwrap();

        assert_eq!(value["type"], "message");
        assert_eq!(value["userId"], "u");
        assert!(value.get("fileData").is_none());
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn serialized_file_message_nests_file_data() {
        let value = serde_json::to_value(Message::file("u", pdf())).unwrap();

        assert_eq!(value["type"], "file");
        assert_eq!(value["fileData"]["fileName"], "test.pdf");
        assert_eq!(value["fileData"]["fileType"], "application/pdf");
        assert_eq!(value["fileData"]["fileSize"], 1024);
    }
}
