use anyhow::Result;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde_json::json;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{error, info, Level};

use standup_core::{SqliteRepository, TelegramClient};
use standup_server::config::Config;
use standup_server::dialogue::SessionStore;
use standup_server::lifecycle::{announce_loop, publish_loop, remind_loop};
use standup_server::status::StatusData;
use standup_server::updates::update_polling_loop;
use standup_server::AppState;

async fn health_check() -> Result<Json<serde_json::Value>, StatusCode> {
    Ok(Json(json!({
        "status": "healthy",
        "service": "standup-bot"
    })))
}

async fn help_handler() -> Json<serde_json::Value> {
    let version = standup_server::get_bot_version();

    Json(json!({
        "service": "standup-bot",
        "version": version,
        "description": "Collects daily standup reports from group members over Telegram",
        "endpoints": [
            {
                "path": "/health",
                "method": "GET",
                "description": "Health check endpoint",
                "authentication": "None",
                "response_format": "application/json"
            },
            {
                "path": "/help",
                "method": "GET",
                "description": "API documentation and service information",
                "authentication": "None",
                "response_format": "application/json"
            },
            {
                "path": "/status",
                "method": "GET",
                "description": "Open dialogues and stored report counts",
                "authentication": "None",
                "response_format": "application/json"
            }
        ],
        "features": [
            "Guided three-question report dialogues via /report",
            "Report cancellation via /cancel",
            "Daily announcement, reminder, and digest publication on a wall-clock schedule",
            "Reminders mention only the members who have not submitted a report",
            "Manual digest publication via /getreports (administrators only)"
        ],
        "configuration": {
            "required_env_vars": [
                "TELEGRAM_BOT_TOKEN",
                "STANDUP_GROUP_ID",
                "REPORT_THREAD_ID",
                "ALERT_THREAD_ID"
            ],
            "optional_env_vars": [
                "SCHEDULE_TIMEZONE (default: UTC)",
                "ANNOUNCE_TIME (default: 16:00)",
                "REMIND_TIME (default: 20:00)",
                "PUBLISH_TIME (default: 09:00)",
                "PROXY_URL",
                "STATE_DIR (default: current directory)",
                "PORT (default: 3000)"
            ]
        }
    }))
}

async fn status_handler(State(state): State<Arc<AppState>>) -> Response {
    let sessions = state.sessions.snapshot().await;

    let reports = match state.repository.list().await {
        Ok(reports) => reports,
        Err(e) => {
            error!("Error reading stored reports for status endpoint: {:#}", e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let version = standup_server::get_bot_version();
    let status_data = StatusData::from_snapshot(sessions, &reports, version);

    Json(status_data).into_response()
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    info!("Starting standup report bot");

    let config =
        Config::from_env().expect("Failed to load configuration from environment variables");

    let telegram = TelegramClient::new(&config.bot_token, config.proxy_url.as_deref())
        .expect("Failed to construct Telegram client");

    // Verify the token and learn our own username before serving anything.
    let me = telegram
        .get_me()
        .await
        .expect("Failed to reach the Telegram API");
    let bot_username = me
        .username
        .expect("Bot account has no username; getMe returned none");
    info!("Running as @{}", bot_username);

    let db_path = config.state_dir.join("standup-reports.db");
    info!("Using state database: {}", db_path.display());
    let sqlite_repo =
        SqliteRepository::new(&db_path).expect("Failed to initialize SQLite database");

    let app_state = Arc::new(AppState {
        config,
        telegram: Arc::new(telegram),
        repository: Arc::new(sqlite_repo),
        sessions: SessionStore::new(),
        bot_username,
    });

    let app = Router::new()
        .route("/health", get(health_check))
        .route("/help", get(help_handler))
        .route("/status", get(status_handler))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(app_state.clone());

    // Telegram ingress and the three daily workflows each get a task.
    let polling_state = app_state.clone();
    tokio::spawn(async move {
        update_polling_loop(polling_state).await;
    });

    let announce_state = app_state.clone();
    tokio::spawn(async move {
        announce_loop(announce_state).await;
    });

    let remind_state = app_state.clone();
    tokio::spawn(async move {
        remind_loop(remind_state).await;
    });

    let publish_state = app_state.clone();
    tokio::spawn(async move {
        publish_loop(publish_state).await;
    });

    let listener = TcpListener::bind(format!("0.0.0.0:{}", app_state.config.port)).await?;
    info!("Server listening on port {}", app_state.config.port);

    axum::serve(listener, app).await?;

    Ok(())
}
