//! Domain types shared across the workspace.
//!
//! Keep these structs focused on the data that flows between the dialogue,
//! the repository, and the rendering layer.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Telegram user identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub i64);

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        UserId(id)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A completed daily report. At most one exists per user at any time;
/// resubmission replaces the previous record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub user_id: UserId,
    /// Free text: work completed today.
    pub tasks_today: String,
    /// Free text: open questions and blockers.
    pub blockers: String,
    /// Free text: work planned for tomorrow.
    pub tasks_tomorrow: String,
    pub created_at: DateTime<Utc>,
}

/// A group member with a resolved human-readable name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub user_id: UserId,
    pub display_name: String,
}

impl Member {
    pub fn new(user_id: impl Into<UserId>, display_name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: display_name.into(),
        }
    }

    /// Placeholder identity for a user the transport could not resolve.
    pub fn unresolved(user_id: UserId) -> Self {
        Self {
            user_id,
            display_name: format!("user {}", user_id),
        }
    }
}
