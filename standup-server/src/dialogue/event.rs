//! Events that trigger dialogue transitions.
//!
//! Events represent things the user did - commands issued, answers typed.
//! They are inputs to the pure transition function.

/// All events that can drive a report dialogue forward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// User issued the command that starts (or restarts) a report dialogue.
    ReportRequested,

    /// User sent free text while a dialogue was open; it answers the
    /// current question.
    AnswerProvided { text: String },

    /// User issued the cancel command.
    CancelRequested,
}

impl Event {
    /// Returns a summary of the event suitable for logging.
    ///
    /// Deliberately omits answer text, which is member-written content.
    pub fn log_summary(&self) -> String {
        match self {
            Event::ReportRequested => "ReportRequested".to_string(),
            Event::AnswerProvided { text } => {
                format!("AnswerProvided {{ len: {} }}", text.len())
            }
            Event::CancelRequested => "CancelRequested".to_string(),
        }
    }
}
