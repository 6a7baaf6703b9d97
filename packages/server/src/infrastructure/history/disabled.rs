//! 履歴を保持しない HistoryStore
//!
//! Redis の接続先を組み立てられなかったときに使います。すべての操作が
//! `HistoryStoreError::Unavailable` になるので、チャットの配信だけが続きます。

use async_trait::async_trait;

use crate::domain::{HistoryStore, HistoryStoreError};

pub struct DisabledHistoryStore {
    reason: String,
}

impl DisabledHistoryStore {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    fn unavailable(&self) -> HistoryStoreError {
        HistoryStoreError::Unavailable(format!("history disabled: {}", self.reason))
    }
}

#[async_trait]
impl HistoryStore for DisabledHistoryStore {
    async fn push_front(&self, _entry: String) -> Result<(), HistoryStoreError> {
        Err(self.unavailable())
    }

    async fn trim(&self, _max_len: usize) -> Result<(), HistoryStoreError> {
        Err(self.unavailable())
    }

    async fn range_all(&self) -> Result<Vec<String>, HistoryStoreError> {
        Err(self.unavailable())
    }

    async fn replace(&self, _entries: Vec<String>) -> Result<(), HistoryStoreError> {
        Err(self.unavailable())
    }

    async fn ping(&self) -> Result<(), HistoryStoreError> {
        Err(self.unavailable())
    }
}
