//! Effects (side effects as data).
//!
//! Effects describe what should happen as a result of a dialogue transition.
//! They are pure data - the interpreter executes them against Telegram and
//! the report repository. This separation enables testing the transition
//! logic without mocking HTTP.

use standup_core::MessageContent;

/// All effects that can be produced by dialogue transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Send a message back to the user in the thread the dialogue runs in.
    SendMessage { content: MessageContent },

    /// Store the completed report, replacing any earlier report from the
    /// same user. The interpreter stamps the user id and submission time.
    CommitReport {
        tasks_today: String,
        blockers: String,
        tasks_tomorrow: String,
    },
}
