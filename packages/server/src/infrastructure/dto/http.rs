//! HTTP API response DTOs.

use serde::Serialize;

/// `GET /api/presence` のレスポンス
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceDto {
    pub online_count: usize,
    pub online_users: Vec<String>,
    pub connections: Vec<ConnectionDto>,
}

/// 接続 1 件分の情報
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionDto {
    pub connection_id: String,
    /// RFC 3339 (UTC)
    pub connected_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}
