//! UseCase: 参加者切断処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DisconnectParticipantUseCase::execute() メソッド
//! - プレゼンスの解除 → 接続レジストリからの解除 → 退室通知 → 在室状況の通知
//!
//! ### なぜこのテストが必要か
//! - leave_room を送らずに切断したユーザーがオンライン一覧から消えることを保証
//! - 名前のない接続の切断では退室通知を出さないことを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：入室済みユーザーの切断、未入室の接続の切断
//! - エッジケース：同じ接続の二重切断

use std::sync::Arc;

use crate::domain::{ChatMessage, ConnectionId, MessagePusher, PresenceRepository, Username};

use super::broadcast::{PresenceBroadcaster, broadcast_message};

/// 参加者切断のユースケース
pub struct DisconnectParticipantUseCase {
    presence: Arc<dyn PresenceRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    presence_broadcaster: Arc<PresenceBroadcaster>,
}

impl DisconnectParticipantUseCase {
    pub fn new(
        presence: Arc<dyn PresenceRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        presence_broadcaster: Arc<PresenceBroadcaster>,
    ) -> Self {
        Self {
            presence,
            message_pusher,
            presence_broadcaster,
        }
    }

    /// 参加者切断を実行
    ///
    /// # Returns
    ///
    /// 接続に紐付いていたユーザー名（未入室なら `None`）
    pub async fn execute(&self, connection_id: &ConnectionId) -> Option<Username> {
        // 1. プレゼンスを解除（同名の接続が残っていればオンラインのまま）
        let username = self.presence.clear_user(connection_id).await;

        // 2. 接続レジストリから解除（ブロードキャスト中に除去済みのこともある）
        self.message_pusher.unregister_client(connection_id).await;

        // 3. 入室済みだった場合は残りの接続に退室を通知
        if let Some(username) = &username {
            broadcast_message(
                self.message_pusher.as_ref(),
                &ChatMessage::disconnect_notice(username),
            )
            .await;
        }

        // 4. 在室状況を通知
        self.presence_broadcaster.broadcast_all().await;

        tracing::info!(
            "Connection '{}' closed (user: {})",
            connection_id,
            username.as_ref().map_or("-", Username::as_str)
        );

        username
    }
}
