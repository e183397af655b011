//! Rendering of all user-visible messages.
//!
//! Everything the bot says in chat is produced here, so message wording is
//! testable without a transport and identical across the scheduled and
//! manual code paths. Messages are sent with Telegram's `Markdown` parse
//! mode; mentions are inline `tg://user?id=` links, which work for members
//! without a public username.

use crate::report::{Member, Report};

/// Separator line between reports in the published digest.
pub const DIGEST_DELIMITER: &str = "----------------------------------------";

/// All messages the bot can send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageContent {
    /// First dialogue prompt, sent on /report.
    TodayPrompt,
    /// Second dialogue prompt.
    BlockersPrompt,
    /// Third dialogue prompt.
    TomorrowPrompt,
    /// Confirmation after the final answer is stored.
    ReportConfirmed,
    /// Acknowledgment of /cancel.
    ReportCancelled,
    /// Daily call for reports, sent to the alert thread.
    Announcement,
    /// Daily reminder listing members who have not submitted.
    Reminder { pending: Vec<Member> },
    /// The composite digest of all submitted reports, in submission order.
    Digest { entries: Vec<(Member, Report)> },
    /// Immediate acknowledgment of /getreports.
    FetchingReports,
    /// /getreports reply when the store is empty.
    NoReportsFound,
    /// /help reply.
    Help,
}

/// Inline mention link for a member.
pub fn mention(member: &Member) -> String {
    format!(
        "[{}](tg://user?id={})",
        member.display_name, member.user_id
    )
}

/// Format message content into the string sent to chat.
pub fn format_message_content(content: &MessageContent) -> String {
    match content {
        MessageContent::TodayPrompt => "Today I worked on (list your tasks):".to_string(),
        MessageContent::BlockersPrompt => {
            "Questions/Blockers (list any questions or blockers):".to_string()
        }
        MessageContent::TomorrowPrompt => {
            "Tomorrow I will be working on (list your tasks):".to_string()
        }
        MessageContent::ReportConfirmed => "Thank you for your report!".to_string(),
        MessageContent::ReportCancelled => "Daily report canceled.".to_string(),
        MessageContent::Announcement => "Please submit your daily tasks using /report.".to_string(),
        MessageContent::Reminder { pending } => {
            let mentions: Vec<String> = pending.iter().map(mention).collect();
            format!(
                "The following members have not submitted their daily report yet: {}. \
                 Please submit your daily tasks using /report.",
                mentions.join(", ")
            )
        }
        MessageContent::Digest { entries } => render_digest(entries),
        MessageContent::FetchingReports => "Fetching daily reports...".to_string(),
        MessageContent::NoReportsFound => "No daily reports found.".to_string(),
        MessageContent::Help => "Use /report to start your daily report.\n\
             /cancel discards a report in progress.\n\
             /getreports publishes all submitted reports immediately (administrators only)."
            .to_string(),
    }
}

/// Render the composite digest of all submitted reports.
pub fn render_digest(entries: &[(Member, Report)]) -> String {
    let mut out = String::from("Daily Reports:\n\n");
    for (i, (member, report)) in entries.iter().enumerate() {
        if i > 0 {
            out.push_str(DIGEST_DELIMITER);
            out.push_str("\n\n");
        }
        out.push_str(&format!(
            "Report from {}:\n\
             Today I worked on:\n{}\n\n\
             Questions/Blockers:\n{}\n\n\
             Tomorrow I will be working on:\n{}\n\n",
            mention(member),
            report.tasks_today,
            report.blockers,
            report.tasks_tomorrow
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::UserId;
    use chrono::Utc;

    fn test_report(user_id: i64, today: &str, blockers: &str, tomorrow: &str) -> Report {
        Report {
            user_id: UserId(user_id),
            tasks_today: today.to_string(),
            blockers: blockers.to_string(),
            tasks_tomorrow: tomorrow.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_mention_links_by_user_id() {
        let m = Member::new(123, "Alice Smith");
        assert_eq!(mention(&m), "[Alice Smith](tg://user?id=123)");
    }

    #[test]
    fn test_prompts_match_dialogue_order() {
        assert_eq!(
            format_message_content(&MessageContent::TodayPrompt),
            "Today I worked on (list your tasks):"
        );
        assert_eq!(
            format_message_content(&MessageContent::BlockersPrompt),
            "Questions/Blockers (list any questions or blockers):"
        );
        assert_eq!(
            format_message_content(&MessageContent::TomorrowPrompt),
            "Tomorrow I will be working on (list your tasks):"
        );
    }

    #[test]
    fn test_reminder_mentions_every_pending_member() {
        let content = MessageContent::Reminder {
            pending: vec![Member::new(2, "Bob"), Member::new(3, "Carol")],
        };
        let text = format_message_content(&content);
        assert!(text.contains("[Bob](tg://user?id=2)"));
        assert!(text.contains("[Carol](tg://user?id=3)"));
        assert!(text.contains("/report"));
    }

    #[test]
    fn test_digest_contains_all_fields_of_every_report() {
        let entries = vec![
            (
                Member::new(1, "Alice"),
                test_report(1, "shipped the parser", "none", "start the planner"),
            ),
            (
                Member::new(2, "Bob"),
                test_report(2, "fixed the build", "flaky CI", "review queue"),
            ),
        ];
        let text = render_digest(&entries);

        assert!(text.starts_with("Daily Reports:"));
        assert!(text.contains("[Alice](tg://user?id=1)"));
        assert!(text.contains("shipped the parser"));
        assert!(text.contains("none"));
        assert!(text.contains("start the planner"));
        assert!(text.contains("[Bob](tg://user?id=2)"));
        assert!(text.contains("fixed the build"));
        assert!(text.contains("flaky CI"));
        assert!(text.contains("review queue"));
    }

    #[test]
    fn test_digest_separates_reports_with_delimiter() {
        let entries = vec![
            (Member::new(1, "Alice"), test_report(1, "a", "b", "c")),
            (Member::new(2, "Bob"), test_report(2, "d", "e", "f")),
        ];
        let text = render_digest(&entries);
        assert_eq!(text.matches(DIGEST_DELIMITER).count(), 1);
    }

    #[test]
    fn test_single_report_digest_has_no_delimiter() {
        let entries = vec![(Member::new(1, "Alice"), test_report(1, "a", "b", "c"))];
        let text = render_digest(&entries);
        assert!(!text.contains(DIGEST_DELIMITER));
    }

    #[test]
    fn test_field_order_is_today_blockers_tomorrow() {
        let entries = vec![(
            Member::new(1, "Alice"),
            test_report(1, "TODAY_TEXT", "BLOCKER_TEXT", "TOMORROW_TEXT"),
        )];
        let text = render_digest(&entries);
        let today = text.find("TODAY_TEXT").unwrap();
        let blockers = text.find("BLOCKER_TEXT").unwrap();
        let tomorrow = text.find("TOMORROW_TEXT").unwrap();
        assert!(today < blockers);
        assert!(blockers < tomorrow);
    }
}
