//! UseCase: チャット履歴
//!
//! ## 概要
//!
//! 履歴ログ（先頭が最新、最大 `max_history` 件）への保存・取り消し・再送を扱います。
//!
//! - `cache`: 先頭に追加してから末尾を切り詰める（必ず追加 → 切り詰めの順）
//! - `recall`: 一致する message_id のエントリをすべて除き、ログを不可分に置き換える
//! - `replay`: ログを古い順に要求元の接続だけへ送る
//!
//! ## 並行性
//!
//! 複数の接続から同時に呼ばれても、cache と recall の読み書きが交差しないよう
//! 1 つの Mutex で直列化します。replay の読み出しも同じ Mutex の中で行うため、
//! 書き換え途中のログを読むことはありません。
//!
//! 接続が切れて処理中のタスクが中断されても、ログの書き換えは `HistoryStore::replace`
//! 1 回なので、取り消し対象以外のエントリが失われることはありません。
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - 上限を超えて保存したとき、最新の `max_history` 件だけが残ること
//! - 重複した message_id がすべて取り消され、残りの順序が保たれること
//! - 空の message_id ではストアに一切触れないこと（mockall）
//! - 再送が古い順で、壊れたエントリだけを飛ばすこと
//! - 複数タスクから同時に cache / recall しても、取りこぼしや上限超過がないこと
//! - 取り消し中にタスクが中断されても、ログが消えないこと

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::domain::{
    ChatMessage, ConnectionId, HistoryStore, HistoryStoreError, MessageId, MessagePusher,
};
use crate::infrastructure::dto::websocket::{decode_message, encode_message};

use super::error::ReplayError;

/// 保持する履歴の既定件数
pub const DEFAULT_MAX_HISTORY: usize = 200;

/// チャット履歴のユースケース
pub struct MessageHistoryUseCase {
    store: Arc<dyn HistoryStore>,
    message_pusher: Arc<dyn MessagePusher>,
    max_history: usize,
    /// 履歴ログに対する操作の直列化
    log_lock: Mutex<()>,
}

impl MessageHistoryUseCase {
    pub fn new(
        store: Arc<dyn HistoryStore>,
        message_pusher: Arc<dyn MessagePusher>,
        max_history: usize,
    ) -> Self {
        Self {
            store,
            message_pusher,
            max_history,
            log_lock: Mutex::new(()),
        }
    }

    /// メッセージを履歴の先頭に保存し、上限を超えた古いエントリを捨てる
    pub async fn cache(&self, message: &ChatMessage) -> Result<(), HistoryStoreError> {
        let entry = encode_message(message)?;

        let _guard = self.log_lock.lock().await;
        self.store.push_front(entry).await?;
        self.store.trim(self.max_history).await?;

        Ok(())
    }

    /// `message_id` が一致するエントリをすべて履歴から取り除き、取り除いた件数を返す
    ///
    /// id がなければ何もしない。デコードできないエントリはそのまま残す。
    /// 一致するエントリがなければログを書き換えない。
    pub async fn recall(&self, message_id: Option<&MessageId>) -> Result<usize, HistoryStoreError> {
        let Some(message_id) = message_id else {
            return Ok(0);
        };

        let _guard = self.log_lock.lock().await;
        let entries = self.store.range_all().await?;
        let total = entries.len();

        let kept: Vec<String> = entries
            .into_iter()
            .filter(|entry| !has_message_id(entry, message_id))
            .collect();

        let removed = total - kept.len();
        if removed == 0 {
            return Ok(0);
        }

        self.store.replace(kept).await?;

        tracing::debug!(
            "Recalled {} history entr{} with message id '{}'",
            removed,
            if removed == 1 { "y" } else { "ies" },
            message_id
        );
        Ok(removed)
    }

    /// 履歴を古い順に `connection_id` へ送信し、送信した件数を返す
    ///
    /// 壊れたエントリは 1 件ずつ飛ばす。送信に失敗した時点で残りは送らない。
    pub async fn replay(&self, connection_id: &ConnectionId) -> Result<usize, ReplayError> {
        let entries = {
            let _guard = self.log_lock.lock().await;
            self.store.range_all().await?
        };

        let mut sent = 0;
        for entry in entries.iter().rev() {
            if let Err(e) = decode_message(entry) {
                tracing::warn!("Skipping malformed history entry: {}", e);
                continue;
            }

            self.message_pusher.push_to(connection_id, entry).await?;
            sent += 1;
        }

        Ok(sent)
    }
}

fn has_message_id(entry: &str, message_id: &MessageId) -> bool {
    match decode_message(entry) {
        Ok(message) => message.message_id() == Some(message_id),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{Event, MockHistoryStore, Payload, Timestamp, UserData},
        infrastructure::{
            history::InMemoryHistoryStore, message_pusher::WebSocketMessagePusher,
        },
    };
    use crate::domain::client_channel;
    use async_trait::async_trait;
    use std::{collections::HashSet, time::Duration};
    use tokio::task::JoinSet;

    /// 各操作の前に `delay` だけ待つ HistoryStore（遅い Redis の代わり）
    struct SlowHistoryStore {
        inner: InMemoryHistoryStore,
        delay: Duration,
    }

    #[async_trait]
    impl HistoryStore for SlowHistoryStore {
        async fn push_front(&self, entry: String) -> Result<(), HistoryStoreError> {
            tokio::time::sleep(self.delay).await;
            self.inner.push_front(entry).await
        }

        async fn trim(&self, max_len: usize) -> Result<(), HistoryStoreError> {
            tokio::time::sleep(self.delay).await;
            self.inner.trim(max_len).await
        }

        async fn range_all(&self) -> Result<Vec<String>, HistoryStoreError> {
            tokio::time::sleep(self.delay).await;
            self.inner.range_all().await
        }

        async fn replace(&self, entries: Vec<String>) -> Result<(), HistoryStoreError> {
            tokio::time::sleep(self.delay).await;
            self.inner.replace(entries).await
        }

        async fn ping(&self) -> Result<(), HistoryStoreError> {
            Ok(())
        }
    }

    fn chat(text: &str, message_id: &str) -> ChatMessage {
        ChatMessage::new(
            Event::ChatText,
            UserData {
                name: "alice".to_string(),
                data: Payload::Text(text.to_string()),
                kind: Some("text".to_string()),
                message_id: MessageId::parse(Some(message_id.to_string())),
                file_name: None,
            },
        )
    }

    fn create_usecase(
        store: Arc<dyn HistoryStore>,
        max_history: usize,
    ) -> (MessageHistoryUseCase, Arc<WebSocketMessagePusher>) {
        let pusher = Arc::new(WebSocketMessagePusher::default());
        let usecase = MessageHistoryUseCase::new(store, pusher.clone(), max_history);
        (usecase, pusher)
    }

    async fn stored_texts(store: &InMemoryHistoryStore) -> Vec<String> {
        store
            .range_all()
            .await
            .unwrap()
            .iter()
            .map(|entry| {
                let message = decode_message(entry).unwrap();
                message.user_data.data.as_text().unwrap().to_string()
            })
            .collect()
    }

    #[tokio::test]
    async fn test_cache_keeps_only_newest_entries() {
        // テスト項目: 上限を超えて保存すると、最新の max_history 件だけが残る
        // given (前提条件):
        let store = Arc::new(InMemoryHistoryStore::new());
        let (usecase, _) = create_usecase(store.clone(), DEFAULT_MAX_HISTORY);

        // when (操作):
        for i in 0..250 {
            usecase
                .cache(&chat(&format!("m{i}"), &format!("id-{i}")))
                .await
                .unwrap();
        }

        // then (期待する結果):
        let texts = stored_texts(&store).await;
        assert_eq!(texts.len(), 200);
        assert_eq!(texts.first().map(String::as_str), Some("m249"));
        assert_eq!(texts.last().map(String::as_str), Some("m50"));
    }

    #[tokio::test]
    async fn test_recall_removes_every_match_and_keeps_order() {
        // テスト項目: 同じ message_id のエントリはすべて消え、残りの相対順序は変わらない
        // given (前提条件):
        let store = Arc::new(InMemoryHistoryStore::new());
        let (usecase, _) = create_usecase(store.clone(), DEFAULT_MAX_HISTORY);
        for (text, id) in [("first a", "a"), ("b", "b"), ("second a", "a"), ("c", "c")] {
            usecase.cache(&chat(text, id)).await.unwrap();
        }

        // when (操作):
        let target = MessageId::new("a".to_string()).unwrap();
        let removed = usecase.recall(Some(&target)).await.unwrap();

        // then (期待する結果):
        assert_eq!(removed, 2);
        // 先頭が最新なので c, b の順
        assert_eq!(stored_texts(&store).await, vec!["c", "b"]);
    }

    #[tokio::test]
    async fn test_recall_keeps_malformed_entries() {
        // テスト項目: デコードできないエントリは取り消し時もそのまま残る
        // given (前提条件):
        let store = Arc::new(InMemoryHistoryStore::with_entries([
            encode_message(&chat("x", "x")).unwrap(),
            "not json".to_string(),
            encode_message(&chat("y", "y")).unwrap(),
        ]));
        let (usecase, _) = create_usecase(store.clone(), DEFAULT_MAX_HISTORY);

        // when (操作):
        let target = MessageId::new("x".to_string()).unwrap();
        usecase.recall(Some(&target)).await.unwrap();

        // then (期待する結果):
        let entries = store.range_all().await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], "not json");
    }

    #[tokio::test]
    async fn test_recall_with_empty_id_touches_nothing() {
        // テスト項目: 空の message_id ではストアを一切呼ばない
        // given (前提条件):
        // 期待値を設定しない mock は、どのメソッドが呼ばれても panic する
        let store = MockHistoryStore::new();
        let (usecase, _) = create_usecase(Arc::new(store), DEFAULT_MAX_HISTORY);

        // when (操作):
        let removed = usecase
            .recall(MessageId::parse(Some(String::new())).as_ref())
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(removed, 0);
    }

    #[tokio::test]
    async fn test_recall_without_match_does_not_rewrite() {
        // テスト項目: 一致するエントリがなければログを置き換えない
        // given (前提条件):
        let mut store = MockHistoryStore::new();
        let entry = encode_message(&chat("hello", "keep")).unwrap();
        store
            .expect_range_all()
            .times(1)
            .returning(move || Ok(vec![entry.clone()]));
        store.expect_replace().never();
        let (usecase, _) = create_usecase(Arc::new(store), DEFAULT_MAX_HISTORY);

        // when (操作):
        let target = MessageId::new("missing".to_string()).unwrap();
        let removed = usecase.recall(Some(&target)).await.unwrap();

        // then (期待する結果):
        assert_eq!(removed, 0);
    }

    #[tokio::test]
    async fn test_recall_interrupted_midway_keeps_history() {
        // テスト項目: 取り消しの途中で接続のタスクが中断されても、対象以外のエントリは失われない
        for abort_after_ms in [5, 15, 25, 40] {
            // given (前提条件):
            // 先頭が最新なので m49 .. m0 の順に並べる
            let entries: Vec<String> = (0..50)
                .rev()
                .map(|i| encode_message(&chat(&format!("m{i}"), &format!("m{i}"))).unwrap())
                .collect();
            let store = Arc::new(SlowHistoryStore {
                inner: InMemoryHistoryStore::with_entries(entries),
                delay: Duration::from_millis(10),
            });
            let (usecase, _) = create_usecase(store.clone(), DEFAULT_MAX_HISTORY);
            let usecase = Arc::new(usecase);

            // when (操作):
            let task = tokio::spawn({
                let usecase = usecase.clone();
                async move {
                    let target = MessageId::new("m7".to_string()).unwrap();
                    usecase.recall(Some(&target)).await
                }
            });
            tokio::time::sleep(Duration::from_millis(abort_after_ms)).await;
            task.abort();
            let _ = task.await;

            // then (期待する結果):
            let ids: Vec<String> = store
                .inner
                .range_all()
                .await
                .unwrap()
                .iter()
                .filter_map(|entry| decode_message(entry).ok()?.message_id().cloned())
                .map(|id| id.as_str().to_string())
                .collect();
            assert!(
                ids.len() == 50 || ids.len() == 49,
                "history lost after abort at {abort_after_ms}ms: {} entries",
                ids.len()
            );
            for i in (0..50).filter(|i| *i != 7) {
                assert!(ids.contains(&format!("m{i}")), "m{i} lost at {abort_after_ms}ms");
            }
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_cache_and_recall_lose_nothing() {
        // テスト項目: 複数タスクからの同時 cache / recall で、取り消した id だけが消え、他は 1 件も失われない
        // given (前提条件):
        let store = Arc::new(InMemoryHistoryStore::new());
        let (usecase, _) = create_usecase(store.clone(), 1000);
        let usecase = Arc::new(usecase);
        for i in 0..20 {
            usecase
                .cache(&chat("to be recalled", &format!("r-{i}")))
                .await
                .unwrap();
        }

        // when (操作):
        let mut tasks = JoinSet::new();
        for t in 0..8 {
            let usecase = usecase.clone();
            tasks.spawn(async move {
                for i in 0..25 {
                    let id = format!("t{t}-{i}");
                    usecase.cache(&chat(&id, &id)).await.unwrap();
                    tokio::task::yield_now().await;
                }
            });
        }
        for t in 0..4 {
            let usecase = usecase.clone();
            tasks.spawn(async move {
                for i in 0..5 {
                    let target = MessageId::new(format!("r-{}", t * 5 + i)).unwrap();
                    assert_eq!(usecase.recall(Some(&target)).await.unwrap(), 1);
                    tokio::task::yield_now().await;
                }
            });
        }
        while let Some(result) = tasks.join_next().await {
            result.unwrap();
        }

        // then (期待する結果):
        let entries = store.range_all().await.unwrap();
        let ids: HashSet<String> = entries
            .iter()
            .filter_map(|entry| decode_message(entry).ok()?.message_id().cloned())
            .map(|id| id.as_str().to_string())
            .collect();
        assert_eq!(entries.len(), 200);
        assert_eq!(ids.len(), 200);
        assert!(ids.iter().all(|id| !id.starts_with("r-")));
        for t in 0..8 {
            for i in 0..25 {
                assert!(ids.contains(&format!("t{t}-{i}")));
            }
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_cache_never_exceeds_bound() {
        // テスト項目: 複数タスクから同時に保存しても、最終的な履歴はちょうど max_history 件
        // given (前提条件):
        let store = Arc::new(InMemoryHistoryStore::new());
        let (usecase, _) = create_usecase(store.clone(), 50);
        let usecase = Arc::new(usecase);

        // when (操作):
        let mut tasks = JoinSet::new();
        for t in 0..8 {
            let usecase = usecase.clone();
            tasks.spawn(async move {
                for i in 0..25 {
                    let id = format!("t{t}-{i}");
                    usecase.cache(&chat(&id, &id)).await.unwrap();
                }
            });
        }
        while let Some(result) = tasks.join_next().await {
            result.unwrap();
        }

        // then (期待する結果):
        assert_eq!(store.range_all().await.unwrap().len(), 50);
    }

    #[tokio::test]
    async fn test_cache_reports_unavailable_store() {
        // テスト項目: ストアに届かない場合はエラーを返す（trim は呼ばれない）
        // given (前提条件):
        let mut store = MockHistoryStore::new();
        store
            .expect_push_front()
            .times(1)
            .returning(|_| Err(HistoryStoreError::Unavailable("connection refused".to_string())));
        store.expect_trim().never();
        let (usecase, _) = create_usecase(Arc::new(store), DEFAULT_MAX_HISTORY);

        // when (操作):
        let result = usecase.cache(&chat("hello", "m-1")).await;

        // then (期待する結果):
        assert!(matches!(result, Err(HistoryStoreError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_replay_sends_oldest_first_to_requester_only() {
        // テスト項目: m1, m2, m3 の順に保存した履歴は m1, m2, m3 の順で要求元だけに届く
        // given (前提条件):
        let store = Arc::new(InMemoryHistoryStore::new());
        let (usecase, pusher) = create_usecase(store, DEFAULT_MAX_HISTORY);
        for (text, id) in [("m1", "1"), ("m2", "2"), ("m3", "3")] {
            usecase.cache(&chat(text, id)).await.unwrap();
        }

        let (tx, mut rx) = client_channel();
        let requester = ConnectionId::generate();
        pusher
            .register_client(requester, tx, Timestamp::new(1000))
            .await;
        let (other_tx, mut other_rx) = client_channel();
        pusher
            .register_client(ConnectionId::generate(), other_tx, Timestamp::new(1000))
            .await;

        // when (操作):
        let sent = usecase.replay(&requester).await.unwrap();

        // then (期待する結果):
        assert_eq!(sent, 3);
        for expected in ["m1", "m2", "m3"] {
            let message = decode_message(&rx.recv().await.unwrap()).unwrap();
            assert_eq!(message.user_data.data.as_text(), Some(expected));
        }
        assert!(other_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_replay_skips_malformed_entries() {
        // テスト項目: 壊れたエントリだけを飛ばして再送を続ける
        // given (前提条件):
        let store = Arc::new(InMemoryHistoryStore::with_entries([
            encode_message(&chat("new", "2")).unwrap(),
            "{broken".to_string(),
            encode_message(&chat("old", "1")).unwrap(),
        ]));
        let (usecase, pusher) = create_usecase(store, DEFAULT_MAX_HISTORY);
        let (tx, mut rx) = client_channel();
        let requester = ConnectionId::generate();
        pusher
            .register_client(requester, tx, Timestamp::new(1000))
            .await;

        // when (操作):
        let sent = usecase.replay(&requester).await.unwrap();

        // then (期待する結果):
        assert_eq!(sent, 2);
        let first = decode_message(&rx.recv().await.unwrap()).unwrap();
        let second = decode_message(&rx.recv().await.unwrap()).unwrap();
        assert_eq!(first.user_data.data.as_text(), Some("old"));
        assert_eq!(second.user_data.data.as_text(), Some("new"));
    }

    #[tokio::test]
    async fn test_replay_aborts_when_requester_is_gone() {
        // テスト項目: 要求元への送信に失敗したら残りの再送を打ち切る
        // given (前提条件):
        let store = Arc::new(InMemoryHistoryStore::new());
        let (usecase, pusher) = create_usecase(store, DEFAULT_MAX_HISTORY);
        usecase.cache(&chat("m1", "1")).await.unwrap();
        usecase.cache(&chat("m2", "2")).await.unwrap();
        let (tx, rx) = client_channel();
        let requester = ConnectionId::generate();
        pusher
            .register_client(requester, tx, Timestamp::new(1000))
            .await;
        drop(rx);

        // when (操作):
        let result = usecase.replay(&requester).await;

        // then (期待する結果):
        assert!(matches!(result, Err(ReplayError::Push(_))));
        assert_eq!(pusher.count().await, 0);
    }
}
