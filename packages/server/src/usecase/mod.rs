//! UseCase 層
//!
//! ドメイン層の trait（`MessagePusher`, `PresenceRepository`, `HistoryStore`）だけに依存し、
//! 接続・切断・イベント振り分け・履歴の各処理を組み立てます。

pub mod broadcast;
pub mod connect_participant;
pub mod disconnect_participant;
pub mod dispatch_event;
pub mod error;
pub mod get_presence;
pub mod message_history;

pub use broadcast::{PresenceBroadcaster, broadcast_message};
pub use connect_participant::ConnectParticipantUseCase;
pub use disconnect_participant::DisconnectParticipantUseCase;
pub use dispatch_event::{DispatchEventUseCase, sanitize_message};
pub use error::ReplayError;
pub use get_presence::{ConnectionSnapshot, GetPresenceUseCase, PresenceSnapshot};
pub use message_history::{DEFAULT_MAX_HISTORY, MessageHistoryUseCase};
