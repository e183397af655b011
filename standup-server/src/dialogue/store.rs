//! Session store for per-user report dialogues.
//!
//! This module owns the explicit user-to-dialogue mapping. Sessions are
//! deliberately in-memory only: a restart drops any half-finished dialogue,
//! and the user starts over. Completed reports live in the repository, not
//! here.

use std::collections::HashMap;

use tokio::sync::RwLock;
use tracing::{debug, error, info};

use standup_core::UserId;

use super::event::Event;
use super::interpreter::{execute_effects, InterpreterContext};
use super::state::DialogueState;
use super::transition::{transition, TransitionResult};

/// Thread-safe store for per-user dialogue state.
///
/// Invariant: only non-terminal states are ever stored. A dialogue that
/// completes or is cancelled is removed, so "no entry" means "no open
/// dialogue".
pub struct SessionStore {
    sessions: RwLock<HashMap<UserId, DialogueState>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Get the current dialogue state for a user, if one is open.
    pub async fn get(&self, user_id: &UserId) -> Option<DialogueState> {
        let sessions = self.sessions.read().await;
        sessions.get(user_id).cloned()
    }

    /// Set the dialogue state for a user.
    pub async fn set(&self, user_id: UserId, state: DialogueState) {
        let mut sessions = self.sessions.write().await;
        sessions.insert(user_id, state);
    }

    /// Remove the dialogue state for a user.
    pub async fn remove(&self, user_id: &UserId) -> Option<DialogueState> {
        let mut sessions = self.sessions.write().await;
        sessions.remove(user_id)
    }

    /// Snapshot all open dialogues (for status reporting).
    pub async fn snapshot(&self) -> Vec<(UserId, DialogueState)> {
        let sessions = self.sessions.read().await;
        sessions
            .iter()
            .map(|(user_id, state)| (*user_id, state.clone()))
            .collect()
    }

    /// Process an event for a user: transition the dialogue and execute effects.
    ///
    /// This is the main entry point for handling user activity. It:
    /// 1. Looks up the user's open dialogue (free text with no open dialogue
    ///    is silently ignored; only `ReportRequested` opens one)
    /// 2. Runs the pure transition function
    /// 3. Executes effects via the interpreter
    /// 4. Stores the new state, or removes it if the dialogue ended
    pub async fn process_event(&self, user_id: UserId, event: Event, ctx: &InterpreterContext) {
        let current = match self.get(&user_id).await {
            Some(state) => state,
            None => {
                if !matches!(event, Event::ReportRequested) {
                    debug!(
                        "Ignoring {} from user {} with no open dialogue",
                        event.log_summary(),
                        user_id
                    );
                    return;
                }
                DialogueState::AwaitingToday
            }
        };

        info!(
            "Processing event {} for user {} in stage {}",
            event.log_summary(),
            user_id,
            current.stage_name()
        );

        let TransitionResult { state, effects } = transition(current, event);

        if !effects.is_empty() {
            if let Err(e) = execute_effects(ctx, effects).await {
                error!("Effect execution failed for user {}: {:#}", user_id, e);
            }
        }

        if state.is_terminal() {
            self.remove(&user_id).await;
            info!(
                "Dialogue for user {} closed in stage {}",
                user_id,
                state.stage_name()
            );
        } else {
            self.set(user_id, state.clone()).await;
            info!(
                "Dialogue for user {} now in stage {}",
                user_id,
                state.stage_name()
            );
        }
    }
}
