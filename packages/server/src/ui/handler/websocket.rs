//! WebSocket connection handlers.

use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{
        ConnectInfo, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;

use crate::{
    domain::{ConnectionId, client_channel},
    infrastructure::dto::websocket::decode_message,
    ui::state::AppState,
};

/// 受信するメッセージ・フレームの最大サイズ（画像は data URL で送られてくる）
pub const MAX_MESSAGE_SIZE: usize = 10 * 1024 * 1024;

/// `/ws`: どのオリジンからの接続も受け付ける
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    ConnectInfo(remote_addr): ConnectInfo<SocketAddr>,
) -> impl IntoResponse {
    ws.max_message_size(MAX_MESSAGE_SIZE)
        .max_frame_size(MAX_MESSAGE_SIZE)
        .on_failed_upgrade(move |e| {
            tracing::warn!("WebSocket upgrade from {} failed: {}", remote_addr, e);
        })
        .on_upgrade(move |socket| handle_socket(socket, state, remote_addr))
}

/// Spawns a task that receives messages from the rx channel and pushes them to the WebSocket sender.
///
/// The task ends when the channel closes or a write fails. Dropping `rx` on exit makes
/// every later push to this connection fail, which evicts it from the registry.
fn pusher_loop(
    mut rx: mpsc::Receiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Err(e) = sender.send(Message::Text(msg.into())).await {
                tracing::debug!("WebSocket write failed: {}", e);
                break;
            }
        }
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, remote_addr: SocketAddr) {
    let connection_id = ConnectionId::generate();
    let (sender, mut receiver) = socket.split();
    let (tx, rx) = client_channel();

    // 登録直後の在室通知を取りこぼさないよう、書き込みタスクを先に起動する
    let mut send_task = pusher_loop(rx, sender);

    state
        .connect_participant_usecase
        .execute(connection_id, tx)
        .await;
    tracing::info!(
        "Connection '{}' opened from {}",
        connection_id,
        remote_addr
    );

    let state_clone = state.clone();

    // 1 接続のイベントは到着順に 1 件ずつ処理する
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::warn!("WebSocket read error on '{}': {}", connection_id, e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => match decode_message(text.as_str()) {
                    Ok(message) => {
                        state_clone
                            .dispatch_event_usecase
                            .execute(&connection_id, message)
                            .await;
                    }
                    Err(e) => {
                        tracing::warn!(
                            "Ignoring malformed message from '{}': {}",
                            connection_id,
                            e
                        );
                    }
                },
                Message::Binary(_) => {
                    tracing::debug!("Ignoring binary frame from '{}'", connection_id);
                }
                Message::Close(_) => {
                    tracing::info!("Connection '{}' requested close", connection_id);
                    break;
                }
                // Ping/pong is handled automatically by the WebSocket protocol
                Message::Ping(_) | Message::Pong(_) => {}
            }
        }
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => {
            recv_task.abort();
            // 処理中のイベントが止まってから切断処理に入る（在室登録と解除を交差させない）
            let _ = (&mut recv_task).await;
        }
    };

    state
        .disconnect_participant_usecase
        .execute(&connection_id)
        .await;
}
