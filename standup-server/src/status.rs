//! Status types for the status endpoint.
//!
//! This module provides types for inspecting the bot's state over HTTP.

use chrono::{DateTime, Utc};
use serde::Serialize;

use standup_core::{Report, UserId};

use crate::dialogue::DialogueState;

/// Summary statistics for the status endpoint.
#[derive(Debug, Default, Serialize)]
pub struct StatusSummary {
    pub stored_reports: usize,
    pub open_dialogues: usize,
    pub awaiting_today: usize,
    pub awaiting_blockers: usize,
    pub awaiting_tomorrow: usize,
}

/// One stored report for display.
///
/// Carries only the author and submission time, never the report text; what
/// members write stays out of the status endpoint.
#[derive(Debug, Serialize)]
pub struct ReportStatusEntry {
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Full status data for rendering.
#[derive(Debug, Serialize)]
pub struct StatusData {
    pub version: String,
    pub summary: StatusSummary,
    pub reports: Vec<ReportStatusEntry>,
}

impl StatusData {
    /// Create status data from a session snapshot and the stored reports.
    pub fn from_snapshot(
        sessions: Vec<(UserId, DialogueState)>,
        reports: &[Report],
        version: String,
    ) -> Self {
        let mut summary = StatusSummary {
            stored_reports: reports.len(),
            open_dialogues: sessions.len(),
            ..Default::default()
        };

        for (_, state) in &sessions {
            match state {
                DialogueState::AwaitingToday => summary.awaiting_today += 1,
                DialogueState::AwaitingBlockers { .. } => summary.awaiting_blockers += 1,
                DialogueState::AwaitingTomorrow { .. } => summary.awaiting_tomorrow += 1,
                // Terminal states never stay in the session store.
                DialogueState::Completed | DialogueState::Cancelled => {}
            }
        }

        let reports = reports
            .iter()
            .map(|report| ReportStatusEntry {
                user_id: report.user_id.0,
                created_at: report.created_at,
            })
            .collect();

        Self {
            version,
            summary,
            reports,
        }
    }
}
