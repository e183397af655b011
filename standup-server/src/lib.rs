pub mod command;
pub mod config;
pub mod dialogue;
pub mod lifecycle;
pub mod membership;
pub mod status;
pub mod updates;

use std::sync::Arc;

use standup_core::{ReportRepository, TelegramClient};

use crate::config::Config;
use crate::dialogue::SessionStore;

pub fn get_bot_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

pub struct AppState {
    pub config: Config,
    pub telegram: Arc<TelegramClient>,
    pub repository: Arc<dyn ReportRepository>,
    pub sessions: SessionStore,
    /// Username the bot runs as, from getMe at startup. Used to recognise
    /// commands addressed as `/report@BotName`.
    pub bot_username: String,
}
