//! Repository trait 定義
//!
//! ドメイン層が必要とするデータアクセスのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;

use super::{ConnectionId, HistoryStoreError, Username};

/// 在室ユーザー（プレゼンス）の管理
///
/// 接続 → ユーザー名、ユーザー名 → オンライン状態 の対応を保持します。
/// ユーザーは、そのユーザー名に対応する接続が 1 つ以上ある間だけオンラインです。
#[async_trait]
pub trait PresenceRepository: Send + Sync {
    /// 接続にユーザー名を紐付け、そのユーザーをオンラインにする
    ///
    /// 同じ接続が別の名前で入り直した場合は、古い名前の紐付けを外す。
    async fn set_user(&self, connection_id: ConnectionId, username: Username);

    /// 接続の紐付けを外し、外したユーザー名を返す
    ///
    /// 同じユーザー名の接続が他に残っていればオンラインのまま。
    async fn clear_user(&self, connection_id: &ConnectionId) -> Option<Username>;

    /// 接続に紐付いたユーザー名
    async fn username_of(&self, connection_id: &ConnectionId) -> Option<Username>;

    /// オンラインのユーザー名一覧（名前順）
    async fn list_online(&self) -> Vec<Username>;
}

/// 履歴ログを保持する外部の順序付きリストストア
///
/// 1 つの固定キーに対するリストで、先頭が最新です。
/// エントリはエンコード済みのメッセージ文字列で、ストアは中身を解釈しません。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// 先頭にエントリを追加
    async fn push_front(&self, entry: String) -> Result<(), HistoryStoreError>;

    /// 先頭から `max_len` 件だけ残して末尾を切り捨てる
    async fn trim(&self, max_len: usize) -> Result<(), HistoryStoreError>;

    /// 全エントリを先頭（最新）から順に取得
    async fn range_all(&self) -> Result<Vec<String>, HistoryStoreError>;

    /// リストの中身を `entries`（先頭が最新）で置き換える
    ///
    /// 置き換えは不可分で、途中で中断されても元のリストか新しいリストのどちらかが残る。
    /// `entries` が空ならリストは空になる。
    async fn replace(&self, entries: Vec<String>) -> Result<(), HistoryStoreError>;

    /// ストアへの疎通確認
    async fn ping(&self) -> Result<(), HistoryStoreError>;
}
