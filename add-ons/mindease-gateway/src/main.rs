//! MindEase gateway: axum HTTP surface over the emotion pipeline and the SQLite stores.

mod handlers;
mod session;
mod store;

use axum::routing::{get, post};
use axum::Router;
use handlers::chat::{api_chat, emotion_history};
use handlers::pages::{chat_page, health, landing, session_info};
use handlers::thoughts::{list_thoughts, save_thought};
use mindease_core::{MindEaseConfig, SupportPipeline};
use std::path::PathBuf;
use std::sync::Arc;
use store::MindStore;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Clone)]
pub(crate) struct AppState {
    pub config: Arc<MindEaseConfig>,
    pub pipeline: SupportPipeline,
    pub store: MindStore,
}

fn build_app(state: AppState) -> Router {
    // Any origin may call the API, like the chat UI's dev server.
    let cors = CorsLayer::permissive();
    let static_files = ServeDir::new(&state.config.static_dir);

    Router::new()
        .route("/", get(landing))
        .route("/health", get(health))
        .route("/chat", get(chat_page))
        .route("/api/session", get(session_info))
        .route("/api/chat", post(api_chat))
        .route("/api/emotions/history", get(emotion_history))
        .route("/api/save-thought", post(save_thought))
        .route("/api/thoughts", get(list_thoughts))
        .nest_service("/static", static_files)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Console logging always; a daily rolling file too when `log_dir` is set.
/// The returned guard must live as long as the process to flush the file writer.
fn init_tracing(config: &MindEaseConfig) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let (file_layer, guard) = match config.log_dir.as_deref() {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "mindease.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();
    guard
}

#[tokio::main]
async fn main() {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[mindease-gateway] .env not loaded: {} (using system environment)", e);
    }

    let config = match MindEaseConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("[mindease-gateway] invalid configuration: {}", e);
            std::process::exit(1);
        }
    };
    let _log_guard = init_tracing(&config);

    let pipeline = match SupportPipeline::from_config(&config) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            tracing::error!("Failed to build Gemini client: {}", e);
            std::process::exit(1);
        }
    };

    let store = match MindStore::new(PathBuf::from(&config.database_path)) {
        Ok(store) => store,
        Err(e) => {
            tracing::error!("Failed to open database {}: {}", config.database_path, e);
            std::process::exit(1);
        }
    };
    tracing::info!(db = %store.path().display(), static_dir = %config.static_dir, "storage ready");

    let addr = config.bind_addr();
    let app_name = config.app_name.clone();
    let app = build_app(AppState {
        config: Arc::new(config),
        pipeline,
        store,
    });

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    tracing::info!("{} listening on {}", app_name, addr);

    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown requested (Ctrl+C received)");
        }
    }
}
