//! InMemory History Store 実装
//!
//! Redis を用意できない開発環境やテストで使う、プロセス内の履歴ログ。
//! 再起動すると履歴は失われます。

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{HistoryStore, HistoryStoreError};

/// VecDeque を使った HistoryStore 実装（先頭が最新）
#[derive(Default)]
pub struct InMemoryHistoryStore {
    entries: Mutex<VecDeque<String>>,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 既存のエントリ（先頭が最新）から作成
    pub fn with_entries(entries: impl IntoIterator<Item = String>) -> Self {
        Self {
            entries: Mutex::new(entries.into_iter().collect()),
        }
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistoryStore {
    async fn push_front(&self, entry: String) -> Result<(), HistoryStoreError> {
        self.entries.lock().await.push_front(entry);
        Ok(())
    }

    async fn trim(&self, max_len: usize) -> Result<(), HistoryStoreError> {
        self.entries.lock().await.truncate(max_len);
        Ok(())
    }

    async fn range_all(&self) -> Result<Vec<String>, HistoryStoreError> {
        Ok(self.entries.lock().await.iter().cloned().collect())
    }

    async fn replace(&self, entries: Vec<String>) -> Result<(), HistoryStoreError> {
        *self.entries.lock().await = entries.into();
        Ok(())
    }

    async fn ping(&self) -> Result<(), HistoryStoreError> {
        Ok(())
    }
}
