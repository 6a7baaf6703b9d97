//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{Json, extract::State};
use hiroba_shared::time::millis_to_rfc3339;

use crate::{
    domain::Username,
    infrastructure::dto::http::{ConnectionDto, PresenceDto},
    ui::state::AppState,
};

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Current presence: online users and live connections
pub async fn get_presence(State(state): State<Arc<AppState>>) -> Json<PresenceDto> {
    let snapshot = state.get_presence_usecase.execute().await;

    // Domain Model から DTO への変換
    let presence = PresenceDto {
        online_count: snapshot.online_count(),
        online_users: snapshot
            .online_users
            .into_iter()
            .map(Username::into_string)
            .collect(),
        connections: snapshot
            .connections
            .into_iter()
            .map(|connection| ConnectionDto {
                connection_id: connection.info.connection_id.to_string(),
                connected_at: millis_to_rfc3339(connection.info.connected_at.value()),
                name: connection.username.map(Username::into_string),
            })
            .collect(),
    };

    Json(presence)
}
