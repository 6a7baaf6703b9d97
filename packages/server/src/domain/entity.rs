//! Chat message model.
//!
//! A [`ChatMessage`] is both what travels over the wire and what is kept in
//! the history log. The event kind is a closed enum with an `Other` escape
//! hatch so that unknown kinds can be relayed untouched, and the payload is a
//! variant type instead of an untyped value.

use std::fmt;

use super::value_object::{MessageId, Username};

/// Sender name used for server-originated messages.
pub const SYSTEM_SENDER: &str = "system";

/// Text announced when a named connection goes away without `leave_room`.
pub const DISCONNECT_NOTICE: &str = "left the chat room";

/// Longest log line produced by [`ChatMessage::log_summary`], in characters.
const LOG_SUMMARY_LIMIT: usize = 500;

/// Kind of a chat-protocol message.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Event {
    OnlineCount,
    OnlineUsers,
    EnterRoom,
    LeaveRoom,
    ChatText,
    ChatPhoto,
    ChatImage,
    RecallMessage,
    GetHistory,
    /// Any kind this server does not know; relayed verbatim.
    Other(String),
}

impl Event {
    pub fn as_str(&self) -> &str {
        match self {
            Self::OnlineCount => "online_count",
            Self::OnlineUsers => "online_users",
            Self::EnterRoom => "enter_room",
            Self::LeaveRoom => "leave_room",
            Self::ChatText => "chat_text",
            Self::ChatPhoto => "chat_photo",
            Self::ChatImage => "chat_image",
            Self::RecallMessage => "recall_message",
            Self::GetHistory => "get_history",
            Self::Other(kind) => kind,
        }
    }

    /// Only chat kinds are written to the history log.
    pub fn is_chat(&self) -> bool {
        matches!(self, Self::ChatText | Self::ChatPhoto | Self::ChatImage)
    }

    /// Kinds whose string payload is user text and must be sanitized.
    pub fn carries_user_text(&self) -> bool {
        matches!(self, Self::ChatText | Self::EnterRoom | Self::LeaveRoom)
    }

    /// Kinds whose payload is binary image data (too large and noisy to log).
    pub fn carries_image(&self) -> bool {
        matches!(self, Self::ChatPhoto | Self::ChatImage)
    }
}

impl From<&str> for Event {
    fn from(value: &str) -> Self {
        match value {
            "online_count" => Self::OnlineCount,
            "online_users" => Self::OnlineUsers,
            "enter_room" => Self::EnterRoom,
            "leave_room" => Self::LeaveRoom,
            "chat_text" => Self::ChatText,
            "chat_photo" => Self::ChatPhoto,
            "chat_image" => Self::ChatImage,
            "recall_message" => Self::RecallMessage,
            "get_history" => Self::GetHistory,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for Event {
    fn from(value: String) -> Self {
        match Self::from(value.as_str()) {
            Self::Other(_) => Self::Other(value),
            known => known,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `data` field of a message.
///
/// Which variant appears depends on the event: text for chat and room
/// events, a count for `online_count`, a list for `online_users`. Anything
/// else a client sends is kept as raw JSON so it can be relayed as-is.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Payload {
    #[default]
    Empty,
    Text(String),
    List(Vec<String>),
    Count(i64),
    Raw(serde_json::Value),
}

impl Payload {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// Sender and payload of a message.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UserData {
    pub name: String,
    pub data: Payload,
    /// Message subtype chosen by the client (`text`, `image`, ...).
    pub kind: Option<String>,
    /// Client-assigned id used to target `recall_message`.
    pub message_id: Option<MessageId>,
    pub file_name: Option<String>,
}

/// One chat-protocol message.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub event: Event,
    pub user_data: UserData,
}

impl ChatMessage {
    pub fn new(event: Event, user_data: UserData) -> Self {
        Self { event, user_data }
    }

    /// A message sent by the server itself.
    pub fn system(event: Event, data: Payload) -> Self {
        Self::new(
            event,
            UserData {
                name: SYSTEM_SENDER.to_string(),
                data,
                ..UserData::default()
            },
        )
    }

    pub fn online_count(count: usize) -> Self {
        let count = i64::try_from(count).unwrap_or(i64::MAX);
        Self::system(Event::OnlineCount, Payload::Count(count))
    }

    pub fn online_users(users: &[Username]) -> Self {
        let names = users.iter().map(|u| u.as_str().to_string()).collect();
        Self::system(Event::OnlineUsers, Payload::List(names))
    }

    /// `leave_room` announced on behalf of a user whose connection dropped.
    pub fn disconnect_notice(username: &Username) -> Self {
        Self::new(
            Event::LeaveRoom,
            UserData {
                name: username.as_str().to_string(),
                data: Payload::Text(DISCONNECT_NOTICE.to_string()),
                ..UserData::default()
            },
        )
    }

    pub fn message_id(&self) -> Option<&MessageId> {
        self.user_data.message_id.as_ref()
    }

    /// One-line description suitable for logs.
    ///
    /// Image payloads are replaced by their metadata; everything else is
    /// truncated to a bounded length.
    pub fn log_summary(&self) -> String {
        let user_data = &self.user_data;

        if self.event.carries_image() {
            return format!(
                "event: {}, user: {}, type: {}, file: {}, message_id: {}",
                self.event,
                user_data.name,
                user_data.kind.as_deref().unwrap_or(""),
                user_data.file_name.as_deref().unwrap_or(""),
                user_data.message_id.as_ref().map_or("", MessageId::as_str),
            );
        }

        let full = format!("event: {}, data: {:?}", self.event, user_data);
        match full.char_indices().nth(LOG_SUMMARY_LIMIT) {
            Some((cut, _)) => format!("{}...", &full[..cut]),
            None => full,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_round_trips_known_kinds() {
        // テスト項目: 既知のイベント名は文字列と相互変換できる
        // given (前提条件):
        let names = [
            "online_count",
            "online_users",
            "enter_room",
            "leave_room",
            "chat_text",
            "chat_photo",
            "chat_image",
            "recall_message",
            "get_history",
        ];

        for name in names {
            // when (操作):
            let event = Event::from(name);

            // then (期待する結果):
            assert!(!matches!(event, Event::Other(_)), "{name} is known");
            assert_eq!(event.as_str(), name);
        }
    }

    #[test]
    fn test_unknown_event_is_preserved() {
        // テスト項目: 未知のイベント名は Other として保持される
        // given (前提条件):
        let name = "typing_indicator".to_string();

        // when (操作):
        let event = Event::from(name);

        // then (期待する結果):
        assert_eq!(event, Event::Other("typing_indicator".to_string()));
        assert_eq!(event.as_str(), "typing_indicator");
    }

    #[test]
    fn test_only_chat_kinds_are_persisted() {
        // テスト項目: 履歴に保存されるのはチャット系イベントのみ
        // given (前提条件):

        // when (操作) / then (期待する結果):
        assert!(Event::ChatText.is_chat());
        assert!(Event::ChatPhoto.is_chat());
        assert!(Event::ChatImage.is_chat());
        assert!(!Event::EnterRoom.is_chat());
        assert!(!Event::LeaveRoom.is_chat());
        assert!(!Event::RecallMessage.is_chat());
        assert!(!Event::GetHistory.is_chat());
    }

    #[test]
    fn test_online_users_message() {
        // テスト項目: online_users メッセージは system 名義でユーザー一覧を持つ
        // given (前提条件):
        let users = vec![
            Username::new("alice".to_string()).unwrap(),
            Username::new("bob".to_string()).unwrap(),
        ];

        // when (操作):
        let message = ChatMessage::online_users(&users);

        // then (期待する結果):
        assert_eq!(message.event, Event::OnlineUsers);
        assert_eq!(message.user_data.name, SYSTEM_SENDER);
        assert_eq!(
            message.user_data.data,
            Payload::List(vec!["alice".to_string(), "bob".to_string()])
        );
    }

    #[test]
    fn test_log_summary_hides_image_data() {
        // テスト項目: 画像メッセージのログには画像データが含まれない
        // given (前提条件):
        let message = ChatMessage::new(
            Event::ChatImage,
            UserData {
                name: "alice".to_string(),
                data: Payload::Text("data:image/png;base64,AAAA".to_string()),
                kind: Some("image".to_string()),
                message_id: MessageId::parse(Some("m-1".to_string())),
                file_name: Some("cat.png".to_string()),
            },
        );

        // when (操作):
        let summary = message.log_summary();

        // then (期待する結果):
        assert!(!summary.contains("base64"));
        assert!(summary.contains("cat.png"));
        assert!(summary.contains("m-1"));
    }

    #[test]
    fn test_log_summary_truncates_long_text() {
        // テスト項目: 長いテキストメッセージのログは切り詰められる
        // given (前提条件):
        let message = ChatMessage::new(
            Event::ChatText,
            UserData {
                name: "alice".to_string(),
                data: Payload::Text("あ".repeat(2000)),
                ..UserData::default()
            },
        );

        // when (操作):
        let summary = message.log_summary();

        // then (期待する結果):
        assert!(summary.ends_with("..."));
        assert_eq!(summary.chars().count(), LOG_SUMMARY_LIMIT + 3);
    }
}
