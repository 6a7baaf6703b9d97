//! UseCase: 在室状況の取得（読み取り専用）

use std::sync::Arc;

use crate::domain::{ConnectionInfo, MessagePusher, PresenceRepository, Username};

/// 接続 1 件と、紐付いたユーザー名
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSnapshot {
    pub info: ConnectionInfo,
    pub username: Option<Username>,
}

/// ある時点の在室状況
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceSnapshot {
    /// オンラインのユーザー名（名前順）
    pub online_users: Vec<Username>,
    /// 接続（接続時刻順）
    pub connections: Vec<ConnectionSnapshot>,
}

impl PresenceSnapshot {
    /// `online_count` と同じく接続数を数える
    pub fn online_count(&self) -> usize {
        self.connections.len()
    }
}

pub struct GetPresenceUseCase {
    presence: Arc<dyn PresenceRepository>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl GetPresenceUseCase {
    pub fn new(
        presence: Arc<dyn PresenceRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            presence,
            message_pusher,
        }
    }

    pub async fn execute(&self) -> PresenceSnapshot {
        let mut connections = Vec::new();
        for info in self.message_pusher.connections().await {
            let username = self.presence.username_of(&info.connection_id).await;
            connections.push(ConnectionSnapshot { info, username });
        }

        PresenceSnapshot {
            online_users: self.presence.list_online().await,
            connections,
        }
    }
}
