pub mod render;
pub mod report;
pub mod repository;
pub mod telegram;

pub use render::*;
pub use report::*;
pub use repository::{InMemoryRepository, ReportRepository, RepositoryError, SqliteRepository};
pub use telegram::{
    ChatMemberInfo, Message, SendMessageRequest, TelegramClient, Update, User,
};
