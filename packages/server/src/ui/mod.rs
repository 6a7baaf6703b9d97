//! UI 層（axum のルーティング、WebSocket / HTTP ハンドラ、シャットダウン）

mod handler;
mod server;
mod signal;
pub mod state;

pub use handler::websocket::MAX_MESSAGE_SIZE;
pub use server::{Server, ServerError};
