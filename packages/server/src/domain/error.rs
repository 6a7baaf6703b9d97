//! ドメイン層のエラー型

use thiserror::Error;

/// 値オブジェクト生成時のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("username must not be empty")]
    EmptyUsername,

    #[error("message id must not be empty")]
    EmptyMessageId,
}

/// メッセージ送信（通知）のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    /// 送信先の接続が登録されていない
    #[error("connection '{0}' not found")]
    ClientNotFound(String),

    /// 送信先の書き込み側がすでに閉じている
    #[error("failed to push message: {0}")]
    PushFailed(String),
}

/// 履歴ストアのエラー
///
/// どちらも利用側でログに記録して処理を打ち切るだけで、
/// リアルタイム配信には影響させない。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryStoreError {
    /// ストアに到達できない、またはコマンドが失敗した
    #[error("history store unavailable: {0}")]
    Unavailable(String),

    /// 履歴エントリのエンコード・デコードに失敗した
    #[error("history entry serialization failed: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for HistoryStoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
