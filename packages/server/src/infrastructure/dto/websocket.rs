//! WebSocket message DTOs.
//!
//! The same JSON shape is sent to clients and stored in the history log:
//!
//! ```json
//! {"event": "chat_text", "data": {"name": "alice", "data": "hi", "type": "text", "messageId": "m-1"}}
//! ```

use serde::{Deserialize, Serialize};

use crate::domain::ChatMessage;

/// One message on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageDto {
    pub event: String,
    #[serde(default)]
    pub data: UserDataDto,
}

/// The `data` object of a message.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDataDto {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

/// Encode a domain message to its JSON text form.
pub fn encode_message(message: &ChatMessage) -> Result<String, serde_json::Error> {
    serde_json::to_string(&MessageDto::from(message))
}

/// Decode JSON text (from a client or from the history log) into a domain message.
pub fn decode_message(text: &str) -> Result<ChatMessage, serde_json::Error> {
    serde_json::from_str::<MessageDto>(text).map(ChatMessage::from)
}
