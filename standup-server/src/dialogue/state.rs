//! State types for the report collection dialogue.
//!
//! Each user who is mid-dialogue has exactly one `DialogueState`. Following
//! the principle of "make illegal states unrepresentable", the answers
//! collected so far live inside the state variant, so a dialogue can never
//! reach the confirmation step with a field missing.

/// The explicit state machine for a single user's report dialogue.
///
/// A dialogue walks through the three questions in order. The terminal
/// variants exist so the transition function can describe "this dialogue is
/// over"; the session store drops terminal dialogues rather than keeping
/// them around.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogueState {
    /// Waiting for the user's answer to "what did you work on today".
    AwaitingToday,

    /// Waiting for the user's questions/blockers.
    AwaitingBlockers { tasks_today: String },

    /// Waiting for tomorrow's plan.
    AwaitingTomorrow { tasks_today: String, blockers: String },

    /// All three answers collected and the report committed (terminal).
    Completed,

    /// The user abandoned the dialogue (terminal).
    Cancelled,
}

impl DialogueState {
    /// Returns true if this dialogue is over (Completed or Cancelled).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Short stage label for logging. Deliberately excludes the collected
    /// answers, which are member-written content.
    pub fn stage_name(&self) -> &'static str {
        match self {
            Self::AwaitingToday => "awaiting_today",
            Self::AwaitingBlockers { .. } => "awaiting_blockers",
            Self::AwaitingTomorrow { .. } => "awaiting_tomorrow",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_terminal() {
        assert!(!DialogueState::AwaitingToday.is_terminal());
        assert!(!DialogueState::AwaitingBlockers {
            tasks_today: "x".into()
        }
        .is_terminal());
        assert!(!DialogueState::AwaitingTomorrow {
            tasks_today: "x".into(),
            blockers: "y".into()
        }
        .is_terminal());
        assert!(DialogueState::Completed.is_terminal());
        assert!(DialogueState::Cancelled.is_terminal());
    }

    #[test]
    fn test_stage_name_excludes_answers() {
        let state = DialogueState::AwaitingTomorrow {
            tasks_today: "secret work".into(),
            blockers: "none".into(),
        };
        assert_eq!(state.stage_name(), "awaiting_tomorrow");
    }
}
