//! Effect interpreter that executes effects against real APIs.
//!
//! The interpreter is the boundary between the pure dialogue machine and the
//! impure world of I/O. It takes effects (descriptions of what to do) and
//! executes them against Telegram and the report repository.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::info;

use standup_core::{
    format_message_content, MessageContent, Report, ReportRepository, SendMessageRequest,
    TelegramClient, UserId,
};

use super::effect::Effect;

/// Context needed by the interpreter to execute effects.
///
/// Built per incoming message: the chat and thread identify where replies go,
/// and the user id is stamped onto any report committed by this dialogue.
pub struct InterpreterContext {
    pub telegram: Arc<TelegramClient>,
    pub repository: Arc<dyn ReportRepository>,
    pub chat_id: i64,
    pub message_thread_id: Option<i64>,
    pub user_id: UserId,
}

/// Execute a list of effects in order.
///
/// The first failure aborts the remaining effects. Effect order matters: a
/// report commit precedes its confirmation message, so a failed commit never
/// produces a confirmation.
pub async fn execute_effects(ctx: &InterpreterContext, effects: Vec<Effect>) -> Result<()> {
    for effect in effects {
        execute_effect(ctx, effect).await?;
    }
    Ok(())
}

async fn execute_effect(ctx: &InterpreterContext, effect: Effect) -> Result<()> {
    match effect {
        Effect::SendMessage { content } => execute_send_message(ctx, &content).await,

        Effect::CommitReport {
            tasks_today,
            blockers,
            tasks_tomorrow,
        } => execute_commit_report(ctx, tasks_today, blockers, tasks_tomorrow).await,
    }
}

async fn execute_send_message(ctx: &InterpreterContext, content: &MessageContent) -> Result<()> {
    let request = SendMessageRequest::markdown(
        ctx.chat_id,
        ctx.message_thread_id,
        format_message_content(content),
    );

    ctx.telegram
        .send_message(&request)
        .await
        .context("Failed to send dialogue message")?;

    Ok(())
}

async fn execute_commit_report(
    ctx: &InterpreterContext,
    tasks_today: String,
    blockers: String,
    tasks_tomorrow: String,
) -> Result<()> {
    let report = Report {
        user_id: ctx.user_id,
        tasks_today,
        blockers,
        tasks_tomorrow,
        created_at: Utc::now(),
    };

    ctx.repository
        .upsert(report)
        .await
        .context("Failed to store completed report")?;

    info!("Stored report for user {}", ctx.user_id);
    Ok(())
}
