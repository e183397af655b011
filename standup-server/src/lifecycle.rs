//! Daily lifecycle workflows: announce, remind, publish.
//!
//! Each workflow runs in its own loop that sleeps until the configured
//! wall-clock time in the configured timezone, runs once, and goes back to
//! sleep. A failed run is logged and the loop moves on to the next day;
//! nothing is retried within a cycle.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use tokio::time::sleep;
use tracing::{error, info};

use standup_core::{
    format_message_content, render_digest, Member, MessageContent, Report, SendMessageRequest,
};

use crate::membership::{list_members, resolve_member};
use crate::AppState;

/// Compute the next UTC instant at which the wall clock in `tz` reads `at`.
///
/// The result is strictly after `now`, so a workflow that finishes within a
/// second still sleeps a full day rather than re-firing. DST transitions:
/// a wall time skipped by a spring-forward gap rolls over to the next day;
/// an ambiguous fall-back time resolves to its first occurrence.
pub fn next_occurrence(now: DateTime<Utc>, at: NaiveTime, tz: Tz) -> DateTime<Utc> {
    let today = now.with_timezone(&tz).date_naive();

    // Checking three days covers the case where today's occurrence already
    // passed and tomorrow's falls into a DST gap.
    for offset in 0..3 {
        let date = today + Duration::days(offset);
        if let Some(instant) = tz.from_local_datetime(&date.and_time(at)).earliest() {
            let utc = instant.with_timezone(&Utc);
            if utc > now {
                return utc;
            }
        }
    }

    now + Duration::days(1)
}

async fn sleep_until_local(at: NaiveTime, tz: Tz, workflow: &str) {
    let now = Utc::now();
    let next = next_occurrence(now, at, tz);
    info!("Next {} at {}", workflow, next);

    let wait = (next - now).to_std().unwrap_or(std::time::Duration::ZERO);
    sleep(wait).await;
}

pub async fn announce_loop(state: Arc<AppState>) {
    loop {
        sleep_until_local(
            state.config.announce_time,
            state.config.timezone,
            "announcement",
        )
        .await;

        if let Err(e) = run_announce(&state).await {
            error!("Error sending announcement: {:#}", e);
        }
    }
}

pub async fn remind_loop(state: Arc<AppState>) {
    loop {
        sleep_until_local(state.config.remind_time, state.config.timezone, "reminder").await;

        if let Err(e) = run_remind(&state).await {
            error!("Error sending reminder: {:#}", e);
        }
    }
}

pub async fn publish_loop(state: Arc<AppState>) {
    loop {
        sleep_until_local(
            state.config.publish_time,
            state.config.timezone,
            "report publication",
        )
        .await;

        if let Err(e) = run_publish(&state).await {
            error!("Error publishing reports: {:#}", e);
        }
    }
}

/// Post the daily announcement asking members to submit reports.
async fn run_announce(state: &Arc<AppState>) -> Result<()> {
    let request = SendMessageRequest::markdown(
        state.config.group_id,
        Some(state.config.alert_thread_id),
        format_message_content(&MessageContent::Announcement),
    );

    state
        .telegram
        .send_message(&request)
        .await
        .context("Failed to send announcement")?;

    Ok(())
}

/// Remind members who have not submitted a report yet.
///
/// Sends nothing when the roster is empty or everyone has already reported.
async fn run_remind(state: &Arc<AppState>) -> Result<()> {
    let members = list_members(&state.telegram, state.config.group_id).await;
    if members.is_empty() {
        info!("Member roster is empty; skipping reminder");
        return Ok(());
    }

    let reports = state
        .repository
        .list()
        .await
        .context("Failed to list reports for reminder")?;

    let pending = pending_members(members, &reports);
    if pending.is_empty() {
        info!("All members have reported; skipping reminder");
        return Ok(());
    }

    info!("Reminding {} members", pending.len());

    let request = SendMessageRequest::markdown(
        state.config.group_id,
        Some(state.config.alert_thread_id),
        format_message_content(&MessageContent::Reminder { pending }),
    );

    state
        .telegram
        .send_message(&request)
        .await
        .context("Failed to send reminder")?;

    Ok(())
}

/// Publish the digest of all stored reports to the report thread.
///
/// Reports are taken from the store in the same operation that snapshots
/// them, so a report submitted during publishing lands in the next cycle.
/// An empty store publishes nothing and only logs.
async fn run_publish(state: &Arc<AppState>) -> Result<()> {
    let reports = state
        .repository
        .take_all()
        .await
        .context("Failed to take reports for publishing")?;

    if reports.is_empty() {
        info!("No reports to publish");
        return Ok(());
    }

    let entries = resolve_entries(state, reports).await;

    let request = SendMessageRequest::markdown(
        state.config.group_id,
        Some(state.config.report_thread_id),
        render_digest(&entries),
    );

    state
        .telegram
        .send_message(&request)
        .await
        .context("Failed to publish digest")?;

    info!("Published {} reports", entries.len());
    Ok(())
}

/// Publish on demand, replying in the thread the command came from.
///
/// Unlike the scheduled publish, an empty store produces an explicit
/// "nothing found" reply where the requester can see it.
pub async fn run_manual_publish(
    state: &Arc<AppState>,
    chat_id: i64,
    message_thread_id: Option<i64>,
) -> Result<()> {
    let ack = SendMessageRequest::markdown(
        chat_id,
        message_thread_id,
        format_message_content(&MessageContent::FetchingReports),
    );
    state
        .telegram
        .send_message(&ack)
        .await
        .context("Failed to acknowledge manual publish")?;

    let reports = state
        .repository
        .take_all()
        .await
        .context("Failed to take reports for manual publish")?;

    if reports.is_empty() {
        let request = SendMessageRequest::markdown(
            chat_id,
            message_thread_id,
            format_message_content(&MessageContent::NoReportsFound),
        );
        state
            .telegram
            .send_message(&request)
            .await
            .context("Failed to send empty-store notice")?;
        return Ok(());
    }

    let entries = resolve_entries(state, reports).await;

    let request =
        SendMessageRequest::markdown(chat_id, message_thread_id, render_digest(&entries));
    state
        .telegram
        .send_message(&request)
        .await
        .context("Failed to publish digest")?;

    info!("Manually published {} reports", entries.len());
    Ok(())
}

/// Members from the roster with no stored report, in roster order.
fn pending_members(members: Vec<Member>, reports: &[Report]) -> Vec<Member> {
    let reported: HashSet<_> = reports.iter().map(|r| r.user_id).collect();
    members
        .into_iter()
        .filter(|m| !reported.contains(&m.user_id))
        .collect()
}

async fn resolve_entries(state: &Arc<AppState>, reports: Vec<Report>) -> Vec<(Member, Report)> {
    let mut entries = Vec::with_capacity(reports.len());
    for report in reports {
        let member = resolve_member(&state.telegram, state.config.group_id, report.user_id).await;
        entries.push((member, report));
    }
    entries
}
