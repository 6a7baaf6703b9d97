//! UseCase 層のエラー型

use thiserror::Error;

use crate::domain::{HistoryStoreError, MessagePushError};

/// 履歴の再送（get_history）のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplayError {
    /// 履歴ストアを読めなかった
    #[error(transparent)]
    Store(#[from] HistoryStoreError),

    /// 要求元への送信に失敗した（残りの再送は打ち切り）
    #[error(transparent)]
    Push(#[from] MessagePushError),
}
