//! Conversion logic between DTOs and domain entities.
//!
//! Conversion is lossless in both directions so that relayed and persisted
//! messages keep their exact JSON shape. Empty optional strings are treated as
//! absent.

use serde_json::Value;

use crate::domain::{ChatMessage, Event, MessageId, Payload, UserData};
use crate::infrastructure::dto::websocket::{MessageDto, UserDataDto};

// ========================================
// DTO → Domain Entity
// ========================================

impl From<MessageDto> for ChatMessage {
    fn from(dto: MessageDto) -> Self {
        Self {
            event: Event::from(dto.event),
            user_data: dto.data.into(),
        }
    }
}

impl From<UserDataDto> for UserData {
    fn from(dto: UserDataDto) -> Self {
        Self {
            name: dto.name,
            data: dto.data.into(),
            kind: non_empty(dto.kind),
            message_id: MessageId::parse(dto.message_id),
            file_name: non_empty(dto.file_name),
        }
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Empty,
            Value::String(text) => Self::Text(text),
            Value::Number(ref number) => match number.as_i64() {
                Some(count) => Self::Count(count),
                None => Self::Raw(value),
            },
            Value::Array(ref items) if items.iter().all(Value::is_string) => Self::List(
                items
                    .iter()
                    .filter_map(|item| item.as_str().map(str::to_string))
                    .collect(),
            ),
            other => Self::Raw(other),
        }
    }
}

// ========================================
// Domain Entity → DTO
// ========================================

impl From<&ChatMessage> for MessageDto {
    fn from(model: &ChatMessage) -> Self {
        Self {
            event: model.event.as_str().to_string(),
            data: UserDataDto::from(&model.user_data),
        }
    }
}

impl From<&UserData> for UserDataDto {
    fn from(model: &UserData) -> Self {
        Self {
            name: model.name.clone(),
            data: Value::from(&model.data),
            kind: model.kind.clone(),
            message_id: model.message_id.as_ref().map(|id| id.as_str().to_string()),
            file_name: model.file_name.clone(),
        }
    }
}

impl From<&Payload> for Value {
    fn from(payload: &Payload) -> Self {
        match payload {
            Payload::Empty => Value::Null,
            Payload::Text(text) => Value::String(text.clone()),
            Payload::List(items) => Value::Array(items.iter().cloned().map(Value::String).collect()),
            Payload::Count(count) => Value::from(*count),
            Payload::Raw(value) => value.clone(),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
