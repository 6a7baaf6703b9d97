//! ドメイン層
//!
//! チャットのメッセージモデル、値オブジェクト、エラー型、
//! および外部ストアや通知手段への依存を逆転させるための trait を定義します。

pub mod entity;
pub mod error;
pub mod message_pusher;
pub mod repository;
pub mod value_object;

pub use entity::{ChatMessage, DISCONNECT_NOTICE, Event, Payload, SYSTEM_SENDER, UserData};
pub use error::{HistoryStoreError, MessagePushError, ValueObjectError};
pub use message_pusher::{
    CLIENT_QUEUE_CAPACITY, ConnectionInfo, MessagePusher, PusherChannel, client_channel,
};
pub use repository::{HistoryStore, PresenceRepository};
#[cfg(test)]
pub use repository::MockHistoryStore;
pub use value_object::{ConnectionId, MessageId, Timestamp, Username};
