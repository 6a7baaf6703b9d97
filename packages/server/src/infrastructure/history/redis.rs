//! Redis History Store 実装
//!
//! 履歴ログを 1 つのキーの Redis リストとして保持します。先頭（LPUSH 側）が最新です。
//! リストの置き換え（取り消し後の書き直し）は MULTI/EXEC のトランザクションで行います。
//!
//! ## 接続
//!
//! 接続は最初のコマンド実行時に確立し、以後は `ConnectionManager` を使い回します。
//! `ConnectionManager` は切断時に自動で再接続するため、Redis が一時的に落ちても
//! サーバーの再起動は不要です。Redis に到達できない間の各操作は
//! `HistoryStoreError::Unavailable` になります。

use std::{future::Future, time::Duration};

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use tokio::sync::OnceCell;

use crate::domain::{HistoryStore, HistoryStoreError};

impl From<redis::RedisError> for HistoryStoreError {
    fn from(err: redis::RedisError) -> Self {
        Self::Unavailable(err.to_string())
    }
}

/// 接続確立・コマンド 1 回あたりの待ち時間の上限
const OPERATION_TIMEOUT: Duration = Duration::from_secs(2);

async fn within_timeout<T>(
    operation: impl Future<Output = Result<T, redis::RedisError>>,
) -> Result<T, HistoryStoreError> {
    match tokio::time::timeout(OPERATION_TIMEOUT, operation).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(HistoryStoreError::Unavailable(format!(
            "no response within {:?}",
            OPERATION_TIMEOUT
        ))),
    }
}

/// Redis のリストを使った HistoryStore 実装
pub struct RedisHistoryStore {
    client: redis::Client,
    key: String,
    connection: OnceCell<ConnectionManager>,
}

impl RedisHistoryStore {
    /// クライアントを作成する（この時点では接続しない）
    ///
    /// URL が不正な場合のみエラーになる。
    pub fn new(url: &str, key: impl Into<String>) -> Result<Self, HistoryStoreError> {
        let client = redis::Client::open(url)?;
        Ok(Self {
            client,
            key: key.into(),
            connection: OnceCell::new(),
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// リストをキーごと削除
    pub async fn delete(&self) -> Result<(), HistoryStoreError> {
        let mut conn = self.connection().await?;
        within_timeout(redis::cmd("DEL").arg(&self.key).query_async::<i64>(&mut conn)).await?;
        Ok(())
    }

    async fn connection(&self) -> Result<ConnectionManager, HistoryStoreError> {
        let manager = self
            .connection
            .get_or_try_init(|| within_timeout(self.client.get_connection_manager()))
            .await?;
        Ok(manager.clone())
    }
}

#[async_trait]
impl HistoryStore for RedisHistoryStore {
    async fn push_front(&self, entry: String) -> Result<(), HistoryStoreError> {
        let mut conn = self.connection().await?;
        within_timeout(
            redis::cmd("LPUSH")
                .arg(&self.key)
                .arg(entry)
                .query_async::<i64>(&mut conn),
        )
        .await?;
        Ok(())
    }

    async fn trim(&self, max_len: usize) -> Result<(), HistoryStoreError> {
        // LTRIM key 0 -1 は全件を残してしまうため、0 件指定はキーごと消す
        if max_len == 0 {
            return self.delete().await;
        }

        let mut conn = self.connection().await?;
        let stop = i64::try_from(max_len).unwrap_or(i64::MAX) - 1;
        within_timeout(
            redis::cmd("LTRIM")
                .arg(&self.key)
                .arg(0)
                .arg(stop)
                .query_async::<()>(&mut conn),
        )
        .await
    }

    async fn range_all(&self) -> Result<Vec<String>, HistoryStoreError> {
        let mut conn = self.connection().await?;
        within_timeout(
            redis::cmd("LRANGE")
                .arg(&self.key)
                .arg(0)
                .arg(-1)
                .query_async::<Vec<String>>(&mut conn),
        )
        .await
    }

    async fn replace(&self, entries: Vec<String>) -> Result<(), HistoryStoreError> {
        if entries.is_empty() {
            return self.delete().await;
        }

        // DEL と RPUSH を MULTI/EXEC で 1 回に送り、途中の状態を残さない。
        // RPUSH は末尾に積むので、先頭が最新の順序のまま渡せばそのまま再現される
        let mut conn = self.connection().await?;
        within_timeout(
            redis::pipe()
                .atomic()
                .cmd("DEL")
                .arg(&self.key)
                .ignore()
                .cmd("RPUSH")
                .arg(&self.key)
                .arg(entries)
                .ignore()
                .query_async::<()>(&mut conn),
        )
        .await
    }

    async fn ping(&self) -> Result<(), HistoryStoreError> {
        let mut conn = self.connection().await?;
        within_timeout(redis::cmd("PING").query_async::<String>(&mut conn)).await?;
        Ok(())
    }
}
