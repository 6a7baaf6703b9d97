//! Server execution logic.

use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use axum::{Router, routing::get};
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::usecase::{
    ConnectParticipantUseCase, DisconnectParticipantUseCase, DispatchEventUseCase,
    GetPresenceUseCase,
};

use super::{
    handler::{get_presence, health_check, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// WebSocket chat server
///
/// # Example
///
/// ```ignore
/// let server = Server::new(
///     connect_participant_usecase,
///     disconnect_participant_usecase,
///     dispatch_event_usecase,
///     get_presence_usecase,
/// )
/// .with_static_dir(Some("./static".into()));
/// server.run("0.0.0.0", 8080).await?;
/// ```
pub struct Server {
    connect_participant_usecase: Arc<ConnectParticipantUseCase>,
    disconnect_participant_usecase: Arc<DisconnectParticipantUseCase>,
    dispatch_event_usecase: Arc<DispatchEventUseCase>,
    get_presence_usecase: Arc<GetPresenceUseCase>,
    /// 静的ファイルのディレクトリ（指定時のみルーターのフォールバックとして配信）
    static_dir: Option<PathBuf>,
}

impl Server {
    pub fn new(
        connect_participant_usecase: Arc<ConnectParticipantUseCase>,
        disconnect_participant_usecase: Arc<DisconnectParticipantUseCase>,
        dispatch_event_usecase: Arc<DispatchEventUseCase>,
        get_presence_usecase: Arc<GetPresenceUseCase>,
    ) -> Self {
        Self {
            connect_participant_usecase,
            disconnect_participant_usecase,
            dispatch_event_usecase,
            get_presence_usecase,
            static_dir: None,
        }
    }

    pub fn with_static_dir(mut self, static_dir: Option<PathBuf>) -> Self {
        self.static_dir = static_dir;
        self
    }

    /// Build the axum router
    pub fn router(&self) -> Router {
        let app_state = Arc::new(AppState {
            connect_participant_usecase: self.connect_participant_usecase.clone(),
            disconnect_participant_usecase: self.disconnect_participant_usecase.clone(),
            dispatch_event_usecase: self.dispatch_event_usecase.clone(),
            get_presence_usecase: self.get_presence_usecase.clone(),
        });

        let app = Router::new()
            // WebSocket エンドポイント
            .route("/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/health", get(health_check))
            .route("/api/presence", get(get_presence))
            .with_state(app_state);

        let app = match &self.static_dir {
            Some(dir) => {
                tracing::info!("Serving static files from {}", dir.display());
                app.fallback_service(ServeDir::new(dir).append_index_html_on_directories(true))
            }
            None => app,
        };

        app.layer(TraceLayer::new_for_http())
    }

    /// Serve on an already bound listener until a shutdown signal arrives
    pub async fn serve(self, listener: TcpListener) -> Result<(), ServerError> {
        let app = self.router();

        tracing::info!(
            "WebSocket chat server listening on {}",
            listener.local_addr()?
        );

        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }

    /// Bind to `host:port` and run the server
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if the address cannot be bound.
    pub async fn run(self, host: &str, port: u16) -> Result<(), ServerError> {
        let addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.clone(),
                source,
            })?;

        tracing::info!("Connect to: ws://{}/ws", addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener).await
    }
}
