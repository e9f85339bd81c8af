//! WebSocket wire protocol.
//!
//! Peers send [`InboundFrame`]s as JSON text frames and receive
//! [`Envelope`]s describing each broadcast message.

use serde::{Deserialize, Serialize};

use crate::message::{FileData, Message, MessageType};
use crate::types::{EntityId, Timestamp};

/// A frame sent by a peer, tagged by its `type` field.
///
/// Frames with an unrecognised tag decode to [`InboundFrame::Unknown`] and
/// are dropped by the hub.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum InboundFrame {
    #[serde(rename_all = "camelCase")]
    Chat { user_id: String, content: String },

    #[serde(rename_all = "camelCase")]
    File {
        user_id: String,
        file_name: String,
        file_type: String,
        file_size: u64,
        data: String,
    },

    #[serde(other)]
    Unknown,
}

impl InboundFrame {
    /// Decode a raw text frame.
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Build the message this frame should persist, if any.
    pub fn into_message(self) -> Option<Message> {
        match self {
            InboundFrame::Chat { user_id, content } => Some(Message::chat(user_id, content)),
            InboundFrame::File {
                user_id,
                file_name,
                file_type,
                file_size,
                data,
            } => Some(Message::file(
                user_id,
                FileData {
                    file_name,
                    file_type,
                    file_size,
                    data,
                },
            )),
            InboundFrame::Unknown => None,
        }
    }
}

/// Broadcast record sent to every connected peer for one message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub id: EntityId,
    pub user_id: String,
    pub content: String,
    #[serde(rename = "type")]
    pub message_type: MessageType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_data: Option<FileData>,
    pub timestamp: Timestamp,
}

impl From<&Message> for Envelope {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id.clone(),
            user_id: message.user_id.clone(),
            content: message.content.clone(),
            message_type: message.message_type,
            file_data: message.file_data.clone(),
            timestamp: message.timestamp,
        }
    }
}

impl From<Envelope> for Message {
    fn from(envelope: Envelope) -> Self {
        Self {
            id: envelope.id,
            user_id: envelope.user_id,
            content: envelope.content,
            message_type: envelope.message_type,
            file_data: envelope.file_data,
            timestamp: envelope.timestamp,
        }
    }
}
