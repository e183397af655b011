//! Pure dialogue transition function.
//!
//! The transition function is the core of the dialogue machine. It takes the
//! current state and an event, and returns the new state and a list of
//! effects. This function has NO side effects - it is pure and deterministic.

use standup_core::MessageContent;

use super::effect::Effect;
use super::event::Event;
use super::state::DialogueState;

/// Result of a dialogue transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionResult {
    /// The new state after the transition.
    pub state: DialogueState,
    /// Effects to execute, in order.
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: DialogueState, effects: Vec<Effect>) -> Self {
        Self { state, effects }
    }

    pub fn no_change(state: DialogueState) -> Self {
        Self {
            state,
            effects: vec![],
        }
    }
}

/// Pure dialogue transition function.
///
/// Given the current state and an event, returns the new state and effects to
/// execute. All effects are returned as data; nothing here touches Telegram
/// or the repository.
pub fn transition(state: DialogueState, event: Event) -> TransitionResult {
    match (state, event) {
        // =====================================================================
        // Dialogue entry
        // =====================================================================
        // Requesting a report always starts from the first question, even
        // mid-dialogue: a second /report discards the answers collected so far.
        (_, Event::ReportRequested) => TransitionResult::new(
            DialogueState::AwaitingToday,
            vec![Effect::SendMessage {
                content: MessageContent::TodayPrompt,
            }],
        ),

        // =====================================================================
        // Collecting answers
        // =====================================================================
        (DialogueState::AwaitingToday, Event::AnswerProvided { text }) => TransitionResult::new(
            DialogueState::AwaitingBlockers { tasks_today: text },
            vec![Effect::SendMessage {
                content: MessageContent::BlockersPrompt,
            }],
        ),

        (DialogueState::AwaitingBlockers { tasks_today }, Event::AnswerProvided { text }) => {
            TransitionResult::new(
                DialogueState::AwaitingTomorrow {
                    tasks_today,
                    blockers: text,
                },
                vec![Effect::SendMessage {
                    content: MessageContent::TomorrowPrompt,
                }],
            )
        }

        // Final answer: commit the report before confirming, so a failed
        // commit never produces a confirmation message.
        (
            DialogueState::AwaitingTomorrow {
                tasks_today,
                blockers,
            },
            Event::AnswerProvided { text },
        ) => TransitionResult::new(
            DialogueState::Completed,
            vec![
                Effect::CommitReport {
                    tasks_today,
                    blockers,
                    tasks_tomorrow: text,
                },
                Effect::SendMessage {
                    content: MessageContent::ReportConfirmed,
                },
            ],
        ),

        // =====================================================================
        // Cancellation
        // =====================================================================
        (
            DialogueState::AwaitingToday
            | DialogueState::AwaitingBlockers { .. }
            | DialogueState::AwaitingTomorrow { .. },
            Event::CancelRequested,
        ) => TransitionResult::new(
            DialogueState::Cancelled,
            vec![Effect::SendMessage {
                content: MessageContent::ReportCancelled,
            }],
        ),

        // =====================================================================
        // Terminal states
        // =====================================================================
        // Terminal dialogues are removed from the session store, so these
        // arms are unreachable through normal routing; they keep the function
        // total.
        (state @ (DialogueState::Completed | DialogueState::Cancelled), _) => {
            TransitionResult::no_change(state)
        }
    }
}
