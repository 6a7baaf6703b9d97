//! UseCase: 受信イベントの振り分け
//!
//! 1 つの接続から届いたメッセージを、サニタイズしたうえでイベントの種類ごとに
//! プレゼンス・履歴・ブロードキャストへ振り分けます。
//!
//! | event | 処理 |
//! |---|---|
//! | enter_room | プレゼンス登録 → ブロードキャスト → 在室状況の通知 |
//! | leave_room | ブロードキャストのみ（プレゼンスは切断時まで残る） |
//! | chat_text / chat_photo / chat_image | 履歴に保存 → ブロードキャスト |
//! | recall_message | 履歴から取り消し → ブロードキャスト（保存しない） |
//! | get_history | 要求元にだけ履歴を再送 |
//! | その他 | そのままブロードキャスト |
//!
//! 履歴の失敗はログに残すだけで、リアルタイム配信は止めません。

use std::sync::Arc;

use hiroba_shared::sanitize::strict_sanitize;

use crate::domain::{
    ChatMessage, ConnectionId, Event, MessagePusher, Payload, PresenceRepository, Username,
};

use super::{
    broadcast::{PresenceBroadcaster, broadcast_message},
    message_history::MessageHistoryUseCase,
};

/// ユーザーが制御できるテキストからマークアップを取り除く
///
/// `name` と `file_name` は常に、`data` は chat_text / enter_room / leave_room の
/// 文字列ペイロードのときだけ対象にする。
pub fn sanitize_message(message: &mut ChatMessage) {
    let user_data = &mut message.user_data;

    user_data.name = strict_sanitize(&user_data.name);
    if let Some(file_name) = user_data.file_name.as_mut() {
        *file_name = strict_sanitize(file_name);
    }

    if message.event.carries_user_text()
        && let Payload::Text(text) = &mut user_data.data
    {
        *text = strict_sanitize(text);
    }
}

/// 受信イベント振り分けのユースケース
pub struct DispatchEventUseCase {
    presence: Arc<dyn PresenceRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    history: Arc<MessageHistoryUseCase>,
    presence_broadcaster: Arc<PresenceBroadcaster>,
}

impl DispatchEventUseCase {
    pub fn new(
        presence: Arc<dyn PresenceRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        history: Arc<MessageHistoryUseCase>,
        presence_broadcaster: Arc<PresenceBroadcaster>,
    ) -> Self {
        Self {
            presence,
            message_pusher,
            history,
            presence_broadcaster,
        }
    }

    /// `connection_id` から届いた 1 件のメッセージを処理
    pub async fn execute(&self, connection_id: &ConnectionId, mut message: ChatMessage) {
        tracing::info!(
            "Received from '{}': {}",
            connection_id,
            message.log_summary()
        );

        sanitize_message(&mut message);

        match &message.event {
            Event::EnterRoom => self.enter_room(connection_id, &message).await,
            Event::LeaveRoom => {
                self.broadcast(&message).await;
            }
            Event::ChatText | Event::ChatPhoto | Event::ChatImage => {
                if let Err(e) = self.history.cache(&message).await {
                    tracing::warn!("Failed to cache '{}' message: {}", message.event, e);
                }
                self.broadcast(&message).await;
            }
            Event::RecallMessage => {
                tracing::info!(
                    "Recall requested for message id '{}'",
                    message.message_id().map_or("", |id| id.as_str())
                );
                if let Err(e) = self.history.recall(message.message_id()).await {
                    tracing::warn!("Failed to recall message from history: {}", e);
                }
                self.broadcast(&message).await;
            }
            Event::GetHistory => match self.history.replay(connection_id).await {
                Ok(sent) => {
                    tracing::debug!("Replayed {} history message(s) to '{}'", sent, connection_id)
                }
                Err(e) => tracing::warn!("History replay to '{}' stopped: {}", connection_id, e),
            },
            Event::OnlineCount | Event::OnlineUsers | Event::Other(_) => {
                self.broadcast(&message).await;
            }
        }
    }

    async fn enter_room(&self, connection_id: &ConnectionId, message: &ChatMessage) {
        match Username::new(message.user_data.name.clone()) {
            Ok(username) => self.presence.set_user(*connection_id, username).await,
            Err(e) => tracing::warn!(
                "enter_room from '{}' without a usable name: {}",
                connection_id,
                e
            ),
        }

        self.broadcast(message).await;
        self.presence_broadcaster.broadcast_all().await;
    }

    async fn broadcast(&self, message: &ChatMessage) -> usize {
        broadcast_message(self.message_pusher.as_ref(), message).await
    }
}
