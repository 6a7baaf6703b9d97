//! Shared application state.

use std::sync::Arc;

use crate::usecase::{
    ConnectParticipantUseCase, DisconnectParticipantUseCase, DispatchEventUseCase,
    GetPresenceUseCase,
};

/// Shared application state
pub struct AppState {
    /// ConnectParticipantUseCase（参加者接続のユースケース）
    pub connect_participant_usecase: Arc<ConnectParticipantUseCase>,
    /// DisconnectParticipantUseCase（参加者切断のユースケース）
    pub disconnect_participant_usecase: Arc<DisconnectParticipantUseCase>,
    /// DispatchEventUseCase（受信イベント振り分けのユースケース）
    pub dispatch_event_usecase: Arc<DispatchEventUseCase>,
    /// GetPresenceUseCase（在室状況取得のユースケース）
    pub get_presence_usecase: Arc<GetPresenceUseCase>,
}
