//! Hiroba chat relay server.
//!
//! Relays chat events between every connected WebSocket client and keeps a
//! bounded window of recent chat history for late joiners.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin hiroba-server
//! cargo run --bin hiroba-server -- --port 3000 --history-backend memory
//! ```

use std::{path::PathBuf, sync::Arc, time::Duration};

use clap::{Parser, ValueEnum};
use hiroba_server::{
    domain::{HistoryStore, HistoryStoreError},
    infrastructure::{
        config::RedisSettings,
        history::{DisabledHistoryStore, InMemoryHistoryStore, RedisHistoryStore},
        message_pusher::WebSocketMessagePusher,
        repository::InMemoryPresenceRepository,
    },
    ui::{Server, ServerError},
    usecase::{
        ConnectParticipantUseCase, DEFAULT_MAX_HISTORY, DisconnectParticipantUseCase,
        DispatchEventUseCase, GetPresenceUseCase, MessageHistoryUseCase, PresenceBroadcaster,
    },
};
use hiroba_shared::{logger::setup_logger, time::SystemClock};

/// Startup connectivity check against the history store
const STORE_PING_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum HistoryBackend {
    /// Redis list (persists across restarts)
    Redis,
    /// In-process list (lost on restart)
    Memory,
}

#[derive(Parser, Debug)]
#[command(name = "hiroba-server")]
#[command(about = "Single-room WebSocket chat relay with Redis-backed history", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "HIROBA_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "HIROBA_PORT", default_value_t = 8080)]
    port: u16,

    /// Redis address (host:port)
    #[arg(long, env = "REDIS_ADDR")]
    redis_addr: Option<String>,

    /// Redis password
    #[arg(long, env = "REDIS_PASSWORD", hide_env_values = true)]
    redis_password: Option<String>,

    /// Redis logical database index (invalid values fall back to 0)
    #[arg(long, env = "REDIS_DB")]
    redis_db: Option<String>,

    /// Where chat history is kept
    #[arg(long, env = "HIROBA_HISTORY_BACKEND", value_enum, default_value_t = HistoryBackend::Redis)]
    history_backend: HistoryBackend,

    /// Key of the history list
    #[arg(long, env = "HIROBA_HISTORY_KEY", default_value = "chat_history")]
    history_key: String,

    /// Number of chat messages kept in history
    #[arg(long, env = "HIROBA_MAX_HISTORY", default_value_t = DEFAULT_MAX_HISTORY)]
    max_history: usize,

    /// Directory served as static files (disabled when unset)
    #[arg(long, env = "HIROBA_STATIC_DIR")]
    static_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let dotenv = dotenvy::dotenv();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    match dotenv {
        Ok(path) => tracing::info!("Loaded environment from {}", path.display()),
        Err(e) => tracing::debug!("No .env file loaded: {}", e),
    }

    let args = Args::parse();

    if let Err(e) = run(args).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), ServerError> {
    // Initialize dependencies in order:
    // 1. History store
    // 2. Repository / MessagePusher
    // 3. UseCases
    // 4. Server

    // 1. History store
    let store = create_history_store(&args).await;

    // 2. Presence repository and MessagePusher (WebSocket implementation)
    let presence = Arc::new(InMemoryPresenceRepository::new());
    let message_pusher = Arc::new(WebSocketMessagePusher::default());

    // 3. UseCases
    let presence_broadcaster = Arc::new(PresenceBroadcaster::new(
        presence.clone(),
        message_pusher.clone(),
    ));
    let history = Arc::new(MessageHistoryUseCase::new(
        store,
        message_pusher.clone(),
        args.max_history,
    ));
    let connect_participant_usecase = Arc::new(ConnectParticipantUseCase::new(
        message_pusher.clone(),
        presence_broadcaster.clone(),
        Arc::new(SystemClock),
    ));
    let disconnect_participant_usecase = Arc::new(DisconnectParticipantUseCase::new(
        presence.clone(),
        message_pusher.clone(),
        presence_broadcaster.clone(),
    ));
    let dispatch_event_usecase = Arc::new(DispatchEventUseCase::new(
        presence.clone(),
        message_pusher.clone(),
        history,
        presence_broadcaster,
    ));
    let get_presence_usecase = Arc::new(GetPresenceUseCase::new(presence, message_pusher));

    // 4. Create and run the server
    let server = Server::new(
        connect_participant_usecase,
        disconnect_participant_usecase,
        dispatch_event_usecase,
        get_presence_usecase,
    )
    .with_static_dir(args.static_dir);

    server.run(&args.host, args.port).await
}

/// 履歴ストアを作る。Redis の設定不備や疎通失敗では起動を止めない
async fn create_history_store(args: &Args) -> Arc<dyn HistoryStore> {
    match args.history_backend {
        HistoryBackend::Memory => {
            tracing::info!("Keeping chat history in memory (max {})", args.max_history);
            Arc::new(InMemoryHistoryStore::new())
        }
        HistoryBackend::Redis => {
            let settings = RedisSettings::from_raw(
                args.redis_addr.as_deref(),
                args.redis_password.as_deref(),
                args.redis_db.as_deref(),
            );
            let store = match RedisHistoryStore::new(&settings.connection_url(), &args.history_key)
            {
                Ok(store) => store,
                Err(e) => {
                    warn_store_unreachable(&settings, &e);
                    return Arc::new(DisabledHistoryStore::new(e.to_string()));
                }
            };

            // 履歴はベストエフォートなので、Redis に届かなくても起動は続ける
            let ping = tokio::time::timeout(STORE_PING_TIMEOUT, store.ping()).await;
            match ping {
                Ok(Ok(())) => tracing::info!(
                    "Connected to {} (key '{}', max {})",
                    settings.redacted(),
                    store.key(),
                    args.max_history
                ),
                Ok(Err(e)) => warn_store_unreachable(&settings, &e),
                Err(_) => warn_store_unreachable(
                    &settings,
                    &HistoryStoreError::Unavailable("ping timed out".to_string()),
                ),
            }

            Arc::new(store)
        }
    }
}

fn warn_store_unreachable(settings: &RedisSettings, error: &HistoryStoreError) {
    tracing::warn!(
        "Redis at {} is not reachable, chat history is disabled until it comes back: {}",
        settings.redacted(),
        error
    );
}
