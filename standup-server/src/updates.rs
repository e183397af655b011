//! Telegram update polling and dispatch.
//!
//! One long-polling loop fetches updates and routes each message: commands
//! drive the dialogue machine or the manual publish, free text feeds an open
//! dialogue, everything else is dropped here so the dialogue machine never
//! sees traffic it should not.

use std::sync::Arc;

use tokio::time::{sleep, Duration};
use tracing::{debug, error, info};

use standup_core::{format_message_content, Message, MessageContent, SendMessageRequest, UserId};

use crate::command::{parse_command, BotCommand, ParseResult};
use crate::dialogue::{Event, InterpreterContext};
use crate::lifecycle::run_manual_publish;
use crate::membership::is_administrator;
use crate::AppState;

/// How long each getUpdates call waits server-side for activity.
const POLL_TIMEOUT_SECS: i64 = 50;

/// Pause after a failed getUpdates call before retrying.
const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

pub async fn update_polling_loop(state: Arc<AppState>) {
    let mut offset: Option<i64> = None;

    loop {
        let updates = match state.telegram.get_updates(offset, POLL_TIMEOUT_SECS).await {
            Ok(updates) => updates,
            Err(e) => {
                error!("Error fetching updates: {:#}", e);
                sleep(POLL_RETRY_DELAY).await;
                continue;
            }
        };

        for update in updates {
            // Updates arrive in ascending order; acknowledging past the last
            // one keeps Telegram from redelivering it.
            offset = Some(update.update_id + 1);

            if let Some(message) = update.message {
                handle_message(&state, message).await;
            }
        }
    }
}

async fn handle_message(state: &Arc<AppState>, message: Message) {
    // Only the configured group is served; private chats and other groups
    // are filtered here so the dialogue machine only ever sees group traffic.
    if message.chat.id != state.config.group_id {
        debug!("Ignoring message from chat {}", message.chat.id);
        return;
    }

    // Messages without a sender (channel posts) or without text (stickers,
    // photos, membership service messages) carry nothing we handle.
    let Some(from) = message.from.as_ref() else {
        return;
    };
    let Some(text) = message.text.as_deref() else {
        return;
    };

    let user_id = UserId(from.id);
    let ctx = InterpreterContext {
        telegram: state.telegram.clone(),
        repository: state.repository.clone(),
        chat_id: message.chat.id,
        message_thread_id: message.message_thread_id,
        user_id,
    };

    match parse_command(text, &state.bot_username) {
        ParseResult::Command(BotCommand::Report) => {
            state
                .sessions
                .process_event(user_id, Event::ReportRequested, &ctx)
                .await;
        }

        ParseResult::Command(BotCommand::Cancel) => {
            state
                .sessions
                .process_event(user_id, Event::CancelRequested, &ctx)
                .await;
        }

        ParseResult::Command(BotCommand::GetReports) => {
            handle_get_reports(state, &message, user_id).await;
        }

        ParseResult::Command(BotCommand::Help) => {
            send_help(state, &message).await;
        }

        ParseResult::Unknown { attempted } => {
            debug!(
                "Ignoring unknown command /{} from user {}",
                attempted, user_id
            );
        }

        ParseResult::ForAnotherBot => {}

        ParseResult::NotACommand => {
            state
                .sessions
                .process_event(
                    user_id,
                    Event::AnswerProvided {
                        text: text.to_string(),
                    },
                    &ctx,
                )
                .await;
        }
    }
}

async fn handle_get_reports(state: &Arc<AppState>, message: &Message, user_id: UserId) {
    if !is_administrator(&state.telegram, state.config.group_id, user_id).await {
        info!("Ignoring /getreports from non-administrator {}", user_id);
        return;
    }

    if let Err(e) = run_manual_publish(state, message.chat.id, message.message_thread_id).await {
        error!("Error running manual publish: {:#}", e);
    }
}

async fn send_help(state: &Arc<AppState>, message: &Message) {
    let request = SendMessageRequest::markdown(
        message.chat.id,
        message.message_thread_id,
        format_message_content(&MessageContent::Help),
    );

    if let Err(e) = state.telegram.send_message(&request).await {
        error!("Error sending help text: {:#}", e);
    }
}

#[cfg(test)]
mod tests {
    use standup_core::{
        telegram::{Chat, User},
        InMemoryRepository, TelegramClient,
    };

    use super::*;
    use crate::config::Config;
    use crate::dialogue::SessionStore;

    const GROUP_ID: i64 = -1009000;

    // The proxy points at a closed loopback port so an unexpected send fails
    // immediately; every path exercised here returns before any send.
    fn test_state() -> Arc<AppState> {
        Arc::new(AppState {
            config: Config::for_tests(GROUP_ID),
            telegram: Arc::new(
                TelegramClient::new("123:TEST", Some("http://127.0.0.1:1")).unwrap(),
            ),
            repository: Arc::new(InMemoryRepository::new()),
            sessions: SessionStore::new(),
            bot_username: "StandupReportBot".to_string(),
        })
    }

    fn text_message(chat_id: i64, from_id: i64, text: &str) -> Message {
        Message {
            message_id: 1,
            from: Some(User {
                id: from_id,
                is_bot: false,
                first_name: "Ada".to_string(),
                last_name: None,
                username: None,
            }),
            chat: Chat { id: chat_id },
            message_thread_id: None,
            text: Some(text.to_string()),
        }
    }

    #[tokio::test]
    async fn test_commands_outside_the_group_are_ignored() {
        let state = test_state();

        handle_message(&state, text_message(12345, 1, "/report")).await;

        assert_eq!(state.sessions.get(&UserId(1)).await, None);
    }

    #[tokio::test]
    async fn test_free_text_with_no_dialogue_is_ignored() {
        let state = test_state();

        handle_message(&state, text_message(GROUP_ID, 1, "just chatting")).await;

        assert_eq!(state.sessions.get(&UserId(1)).await, None);
        assert!(state.repository.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_command_for_another_bot_is_ignored() {
        let state = test_state();

        handle_message(&state, text_message(GROUP_ID, 1, "/report@OtherBot")).await;

        assert_eq!(state.sessions.get(&UserId(1)).await, None);
    }

    #[tokio::test]
    async fn test_unknown_command_is_ignored() {
        let state = test_state();

        handle_message(&state, text_message(GROUP_ID, 1, "/start")).await;

        assert_eq!(state.sessions.get(&UserId(1)).await, None);
    }

    #[tokio::test]
    async fn test_message_without_text_is_ignored() {
        let state = test_state();
        let message = Message {
            message_id: 1,
            from: Some(User {
                id: 1,
                is_bot: false,
                first_name: "Ada".to_string(),
                last_name: None,
                username: None,
            }),
            chat: Chat { id: GROUP_ID },
            message_thread_id: None,
            text: None,
        };

        handle_message(&state, message).await;

        assert_eq!(state.sessions.get(&UserId(1)).await, None);
    }
}
