//! 履歴ストア（HistoryStore）の実装
//!
//! - `redis`: Redis のリストを使った実装（本番用）
//! - `inmemory`: プロセス内の VecDeque を使った実装（開発・テスト用）
//! - `disabled`: 何も保持しない実装（Redis の接続先が不正なとき）

pub mod disabled;
pub mod inmemory;
pub mod redis;

pub use self::disabled::DisabledHistoryStore;
pub use self::inmemory::InMemoryHistoryStore;
pub use self::redis::RedisHistoryStore;
