//! InMemory Presence Repository 実装
//!
//! ドメイン層が定義する PresenceRepository trait の具体的な実装。
//! 接続 → ユーザー名 の対応と、ユーザー名ごとの接続数を HashMap で保持します。
//!
//! 2 つの表は 1 つの Mutex の中でまとめて更新されるため、
//! 「オンラインのユーザー = 1 つ以上の接続が紐付いているユーザー」が常に成り立ちます。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{ConnectionId, PresenceRepository, Username};

#[derive(Default)]
struct PresenceTable {
    users_by_connection: HashMap<ConnectionId, Username>,
    /// ユーザー名ごとの接続数（0 になったエントリは削除）
    connections_per_user: HashMap<Username, usize>,
}

impl PresenceTable {
    fn detach(&mut self, connection_id: &ConnectionId) -> Option<Username> {
        let username = self.users_by_connection.remove(connection_id)?;

        if let Some(count) = self.connections_per_user.get_mut(&username) {
            *count -= 1;
            if *count == 0 {
                self.connections_per_user.remove(&username);
            }
        }

        Some(username)
    }
}

/// インメモリ Presence Repository 実装
#[derive(Default)]
pub struct InMemoryPresenceRepository {
    table: Mutex<PresenceTable>,
}

impl InMemoryPresenceRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PresenceRepository for InMemoryPresenceRepository {
    async fn set_user(&self, connection_id: ConnectionId, username: Username) {
        let mut table = self.table.lock().await;

        if table.users_by_connection.get(&connection_id) == Some(&username) {
            return;
        }

        if let Some(previous) = table.detach(&connection_id) {
            tracing::debug!(
                "Connection '{}' renamed from '{}' to '{}'",
                connection_id,
                previous,
                username
            );
        }

        *table
            .connections_per_user
            .entry(username.clone())
            .or_insert(0) += 1;
        table.users_by_connection.insert(connection_id, username);
    }

    async fn clear_user(&self, connection_id: &ConnectionId) -> Option<Username> {
        let mut table = self.table.lock().await;
        table.detach(connection_id)
    }

    async fn username_of(&self, connection_id: &ConnectionId) -> Option<Username> {
        let table = self.table.lock().await;
        table.users_by_connection.get(connection_id).cloned()
    }

    async fn list_online(&self) -> Vec<Username> {
        let table = self.table.lock().await;
        let mut users: Vec<Username> = table.connections_per_user.keys().cloned().collect();
        users.sort();
        users
    }
}
