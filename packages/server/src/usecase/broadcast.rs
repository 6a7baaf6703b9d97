//! UseCase: ブロードキャスト
//!
//! - `broadcast_message`: ドメインのメッセージをエンコードして全接続に送る
//! - `PresenceBroadcaster`: 在室人数（online_count）と在室ユーザー（online_users）の通知

use std::sync::Arc;

use crate::domain::{ChatMessage, MessagePusher, PresenceRepository};
use crate::infrastructure::dto::websocket::encode_message;

/// メッセージを全接続に送信し、届いた接続数を返す
///
/// エンコードに失敗した場合はログに残して 0 を返す。
pub async fn broadcast_message(message_pusher: &dyn MessagePusher, message: &ChatMessage) -> usize {
    match encode_message(message) {
        Ok(text) => message_pusher.broadcast(&text).await,
        Err(e) => {
            tracing::error!("Failed to encode '{}' message: {}", message.event, e);
            0
        }
    }
}

/// 在室状況のブロードキャスト
///
/// 接続・切断・enter_room のたびに呼ばれる。
pub struct PresenceBroadcaster {
    presence: Arc<dyn PresenceRepository>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl PresenceBroadcaster {
    pub fn new(
        presence: Arc<dyn PresenceRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            presence,
            message_pusher,
        }
    }

    /// `online_count`（接続数）をブロードキャスト
    pub async fn broadcast_count(&self) {
        let count = self.message_pusher.count().await;
        broadcast_message(self.message_pusher.as_ref(), &ChatMessage::online_count(count)).await;
    }

    /// `online_users`（オンラインのユーザー名一覧）をブロードキャスト
    pub async fn broadcast_users(&self) {
        let users = self.presence.list_online().await;
        broadcast_message(self.message_pusher.as_ref(), &ChatMessage::online_users(&users))
            .await;
    }

    /// 両方をこの順でブロードキャスト
    pub async fn broadcast_all(&self) {
        self.broadcast_count().await;
        self.broadcast_users().await;
    }
}
