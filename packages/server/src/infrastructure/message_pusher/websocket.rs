//! WebSocket を使った MessagePusher 実装
//!
//! ## 責務
//!
//! - 接続中のクライアント（接続レジストリ）と、その書き込みチャンネルの管理
//! - クライアントへのメッセージ送信（push_to, broadcast）
//! - 送信に失敗した接続のレジストリからの除去
//!
//! ## 設計ノート
//!
//! WebSocket の生成は UI 層（`ui/handler/websocket.rs`）で行われます。
//! 書き込みタスクが終了するとチャンネルの受信側が破棄され、以後の送信は失敗します。
//! チャンネルは有界で、送信は `try_send` で行い待ちません。送信待ちが
//! `CLIENT_QUEUE_CAPACITY` に達した接続も、閉じた接続と同じく書き込み失敗として
//! 扱い、再送せずに登録を解除します。
//! 登録解除はロックを保持したまま `retain` で行うため、ブロードキャスト中の
//! 除去で走査が壊れることはありません。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    ConnectionId, ConnectionInfo, MessagePushError, MessagePusher, PusherChannel, Timestamp,
};

/// 登録中の接続 1 件
pub struct ClientEntry {
    pub sender: PusherChannel,
    pub connected_at: Timestamp,
}

/// WebSocket を使った MessagePusher 実装
///
/// ## 使用例
///
/// ```ignore
/// let pusher = WebSocketMessagePusher::new(Arc::new(Mutex::new(HashMap::new())));
///
/// pusher.register_client(connection_id, tx, connected_at).await;
/// let delivered = pusher.broadcast(r#"{"event":"chat_text","data":{"name":"alice","data":"hi"}}"#).await;
/// ```
pub struct WebSocketMessagePusher {
    /// 接続中のクライアント
    clients: Arc<Mutex<HashMap<ConnectionId, ClientEntry>>>,
}

impl WebSocketMessagePusher {
    pub fn new(clients: Arc<Mutex<HashMap<ConnectionId, ClientEntry>>>) -> Self {
        Self { clients }
    }
}

impl Default for WebSocketMessagePusher {
    fn default() -> Self {
        Self::new(Arc::new(Mutex::new(HashMap::new())))
    }
}

#[async_trait]
impl MessagePusher for WebSocketMessagePusher {
    async fn register_client(
        &self,
        connection_id: ConnectionId,
        sender: PusherChannel,
        connected_at: Timestamp,
    ) {
        let mut clients = self.clients.lock().await;
        clients.insert(
            connection_id,
            ClientEntry {
                sender,
                connected_at,
            },
        );
        tracing::debug!(
            "Connection '{}' registered ({} live)",
            connection_id,
            clients.len()
        );
    }

    async fn unregister_client(&self, connection_id: &ConnectionId) -> bool {
        let mut clients = self.clients.lock().await;
        let removed = clients.remove(connection_id).is_some();
        if removed {
            tracing::debug!(
                "Connection '{}' unregistered ({} live)",
                connection_id,
                clients.len()
            );
        }
        removed
    }

    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        content: &str,
    ) -> Result<(), MessagePushError> {
        let mut clients = self.clients.lock().await;

        let Some(entry) = clients.get(connection_id) else {
            return Err(MessagePushError::ClientNotFound(connection_id.to_string()));
        };

        if let Err(e) = entry.sender.try_send(content.to_string()) {
            clients.remove(connection_id);
            tracing::warn!(
                "Failed to push message to connection '{}', evicted: {}",
                connection_id,
                e
            );
            return Err(MessagePushError::PushFailed(e.to_string()));
        }

        Ok(())
    }

    async fn broadcast(&self, content: &str) -> usize {
        let mut clients = self.clients.lock().await;
        let mut delivered = 0;

        clients.retain(|connection_id, entry| match entry.sender.try_send(content.to_string()) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to broadcast to connection '{}', evicted: {}",
                    connection_id,
                    e
                );
                false
            }
        });

        tracing::debug!("Broadcasted message to {} connection(s)", delivered);
        delivered
    }

    async fn connections(&self) -> Vec<ConnectionInfo> {
        let clients = self.clients.lock().await;
        let mut connections: Vec<ConnectionInfo> = clients
            .iter()
            .map(|(connection_id, entry)| ConnectionInfo {
                connection_id: *connection_id,
                connected_at: entry.connected_at,
            })
            .collect();

        connections.sort_by_key(|info| (info.connected_at, info.connection_id));
        connections
    }

    async fn count(&self) -> usize {
        self.clients.lock().await.len()
    }
}
