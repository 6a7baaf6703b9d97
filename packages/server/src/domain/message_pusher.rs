//! メッセージ通知の trait 定義
//!
//! 接続中のクライアントの登録・解除と、メッセージの個別送信・ブロードキャストを抽象化します。
//! WebSocket の生成は UI 層で行い、ここでは生成済みの送信チャンネルだけを扱います。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{ConnectionId, MessagePushError, Timestamp};

/// 1 接続あたりの送信待ちメッセージの上限
///
/// 上限に達した接続は書き込みが追いついていないものとして登録を解除する。
pub const CLIENT_QUEUE_CAPACITY: usize = 256;

/// クライアントの書き込みタスクへ JSON テキストを渡すチャンネル
pub type PusherChannel = mpsc::Sender<String>;

/// 接続 1 件分の送信チャンネルを作成
pub fn client_channel() -> (PusherChannel, mpsc::Receiver<String>) {
    mpsc::channel(CLIENT_QUEUE_CAPACITY)
}

/// 登録中の接続の情報
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionInfo {
    pub connection_id: ConnectionId,
    pub connected_at: Timestamp,
}

/// 接続レジストリ兼ブロードキャストエンジン
///
/// 送信に失敗した接続（閉じている、または送信待ちが上限に達した）は、
/// その場でレジストリから取り除かれる（再送はしない）。送信で待つことはない。
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// 接続を登録
    async fn register_client(
        &self,
        connection_id: ConnectionId,
        sender: PusherChannel,
        connected_at: Timestamp,
    );

    /// 接続の登録を解除。登録されていた場合は `true`
    async fn unregister_client(&self, connection_id: &ConnectionId) -> bool;

    /// 特定の接続にだけ送信
    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        content: &str,
    ) -> Result<(), MessagePushError>;

    /// 登録中の全接続に送信し、届いた接続数を返す
    async fn broadcast(&self, content: &str) -> usize;

    /// 登録中の接続のスナップショット
    async fn connections(&self) -> Vec<ConnectionInfo>;

    /// 登録中の接続数
    async fn count(&self) -> usize;
}
