//! UseCase: 参加者接続処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ConnectParticipantUseCase::execute() メソッド
//! - 接続レジストリへの登録と、在室状況のブロードキャスト
//!
//! ### なぜこのテストが必要か
//! - 新しい接続を含む全員に最新の在室人数が届くことを保証
//! - 接続時刻がクロックから取られることを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：最初の接続、既存の接続がある状態での接続

use std::sync::Arc;

use hiroba_shared::time::Clock;

use crate::domain::{ConnectionId, MessagePusher, PusherChannel, Timestamp};

use super::broadcast::PresenceBroadcaster;

/// 参加者接続のユースケース
pub struct ConnectParticipantUseCase {
    /// MessagePusher（接続レジストリ）
    message_pusher: Arc<dyn MessagePusher>,
    presence_broadcaster: Arc<PresenceBroadcaster>,
    clock: Arc<dyn Clock>,
}

impl ConnectParticipantUseCase {
    pub fn new(
        message_pusher: Arc<dyn MessagePusher>,
        presence_broadcaster: Arc<PresenceBroadcaster>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            message_pusher,
            presence_broadcaster,
            clock,
        }
    }

    /// 参加者接続を実行
    ///
    /// # Arguments
    ///
    /// * `connection_id` - 新しい接続の ID
    /// * `sender` - 接続の書き込みタスクへのチャンネル
    ///
    /// # Returns
    ///
    /// 接続時刻
    pub async fn execute(&self, connection_id: ConnectionId, sender: PusherChannel) -> Timestamp {
        let connected_at = Timestamp::new(self.clock.now_millis());

        // 1. 接続レジストリに登録
        self.message_pusher
            .register_client(connection_id, sender, connected_at)
            .await;

        // 2. 新しい接続を含む全員に在室状況を通知
        self.presence_broadcaster.broadcast_all().await;

        connected_at
    }
}
