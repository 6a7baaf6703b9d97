//! Infrastructure 層
//!
//! ドメイン層の trait に対する具体的な実装（WebSocket 通知、インメモリのプレゼンス、
//! Redis / インメモリの履歴ストア）と、ワイヤーフォーマットの DTO を提供します。

pub mod config;
pub mod dto;
pub mod history;
pub mod message_pusher;
pub mod repository;
