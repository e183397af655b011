//! Group membership lookups.
//!
//! The Bot API has no "list all members" call, so the reporting roster is
//! the group's administrator list with bot accounts filtered out. Groups
//! using this bot promote their reporting members to admin (the usual setup
//! for small standup groups); everyone else is invisible to the lifecycle
//! workflows.

use tracing::warn;

use standup_core::{telegram::ChatMemberInfo, Member, TelegramClient, UserId};

/// List the reporting members of the standup group.
///
/// A lookup failure degrades to an empty roster so scheduled workflows can
/// still run; they treat "no members" as "nobody to remind".
pub async fn list_members(telegram: &TelegramClient, chat_id: i64) -> Vec<Member> {
    match telegram.get_chat_administrators(chat_id).await {
        Ok(administrators) => members_from_administrators(administrators),
        Err(e) => {
            warn!("Failed to list members of chat {}: {:#}", chat_id, e);
            Vec::new()
        }
    }
}

/// Resolve one user's display name for rendering.
///
/// Falls back to a placeholder name when the lookup fails: the user may have
/// left the group since submitting their report, and their report should
/// still publish.
pub async fn resolve_member(telegram: &TelegramClient, chat_id: i64, user_id: UserId) -> Member {
    match telegram.get_chat_member(chat_id, user_id.0).await {
        Ok(info) => Member::new(info.user.id, info.user.display_name()),
        Err(e) => {
            warn!(
                "Failed to resolve user {} in chat {}: {:#}",
                user_id, chat_id, e
            );
            Member::unresolved(user_id)
        }
    }
}

/// Check whether a user may run privileged commands.
///
/// Denies on lookup failure.
pub async fn is_administrator(telegram: &TelegramClient, chat_id: i64, user_id: UserId) -> bool {
    match telegram.get_chat_member(chat_id, user_id.0).await {
        Ok(info) => status_grants_admin(&info.status),
        Err(e) => {
            warn!(
                "Failed to check administrator status for user {} in chat {}: {:#}",
                user_id, chat_id, e
            );
            false
        }
    }
}

fn status_grants_admin(status: &str) -> bool {
    matches!(status, "creator" | "administrator")
}

/// Turn an administrator listing into the reporting roster: bots dropped,
/// sorted by user id so reminder mentions come out in a stable order.
fn members_from_administrators(administrators: Vec<ChatMemberInfo>) -> Vec<Member> {
    let mut members: Vec<Member> = administrators
        .into_iter()
        .filter(|info| !info.user.is_bot)
        .map(|info| Member::new(info.user.id, info.user.display_name()))
        .collect();

    members.sort_by_key(|m| m.user_id);
    members
}
