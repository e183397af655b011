use anyhow::{anyhow, Context, Result};
use chrono::NaiveTime;
use chrono_tz::Tz;
use std::env;
use std::path::PathBuf;

#[derive(Clone)]
pub struct Config {
    pub bot_token: String,
    /// Group chat the bot serves. Messages from any other chat are ignored.
    pub group_id: i64,
    /// Forum topic the daily digest is published to.
    pub report_thread_id: i64,
    /// Forum topic announcements and reminders go to.
    pub alert_thread_id: i64,
    /// Timezone the daily schedule is interpreted in.
    pub timezone: Tz,
    pub announce_time: NaiveTime,
    pub remind_time: NaiveTime,
    pub publish_time: NaiveTime,
    /// Optional proxy for all Telegram API traffic.
    pub proxy_url: Option<String>,
    /// Directory for persistent state (SQLite database).
    /// Defaults to current working directory.
    pub state_dir: PathBuf,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let bot_token = env::var("TELEGRAM_BOT_TOKEN")
            .context("TELEGRAM_BOT_TOKEN environment variable is required")?;

        let group_id = env::var("STANDUP_GROUP_ID")
            .context("STANDUP_GROUP_ID environment variable is required")?
            .parse::<i64>()
            .context("STANDUP_GROUP_ID must be a valid chat id")?;

        let report_thread_id = env::var("REPORT_THREAD_ID")
            .context("REPORT_THREAD_ID environment variable is required")?
            .parse::<i64>()
            .context("REPORT_THREAD_ID must be a valid thread id")?;

        let alert_thread_id = env::var("ALERT_THREAD_ID")
            .context("ALERT_THREAD_ID environment variable is required")?
            .parse::<i64>()
            .context("ALERT_THREAD_ID must be a valid thread id")?;

        let timezone = env::var("SCHEDULE_TIMEZONE")
            .unwrap_or_else(|_| "UTC".to_string())
            .parse::<Tz>()
            .map_err(|e| anyhow!("SCHEDULE_TIMEZONE must be a valid IANA timezone name: {}", e))?;

        let announce_time =
            parse_schedule_time(&env::var("ANNOUNCE_TIME").unwrap_or_else(|_| "16:00".to_string()))
                .context("ANNOUNCE_TIME must be a valid HH:MM time")?;

        let remind_time =
            parse_schedule_time(&env::var("REMIND_TIME").unwrap_or_else(|_| "20:00".to_string()))
                .context("REMIND_TIME must be a valid HH:MM time")?;

        let publish_time =
            parse_schedule_time(&env::var("PUBLISH_TIME").unwrap_or_else(|_| "09:00".to_string()))
                .context("PUBLISH_TIME must be a valid HH:MM time")?;

        let proxy_url = env::var("PROXY_URL").ok().filter(|s| !s.trim().is_empty());

        let state_dir = env::var("STATE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."));

        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .context("PORT must be a valid number")?;

        Ok(Config {
            bot_token,
            group_id,
            report_thread_id,
            alert_thread_id,
            timezone,
            announce_time,
            remind_time,
            publish_time,
            proxy_url,
            state_dir,
            port,
        })
    }

    #[cfg(test)]
    pub(crate) fn for_tests(group_id: i64) -> Self {
        Config {
            bot_token: "123:TEST".to_string(),
            group_id,
            report_thread_id: 21,
            alert_thread_id: 22,
            timezone: chrono_tz::UTC,
            announce_time: NaiveTime::from_hms_opt(16, 0, 0).unwrap(),
            remind_time: NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
            publish_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            proxy_url: None,
            state_dir: PathBuf::from("."),
            port: 3000,
        }
    }
}

/// Parse a schedule time of day from an `HH:MM` string.
///
/// Seconds are not accepted; the schedule fires once a day and minute
/// precision is all the workflows need.
pub fn parse_schedule_time(value: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|e| anyhow!("invalid time '{}': {}", value, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_schedule_time_valid() {
        assert_eq!(
            parse_schedule_time("16:00").unwrap(),
            NaiveTime::from_hms_opt(16, 0, 0).unwrap()
        );
        assert_eq!(
            parse_schedule_time("09:30").unwrap(),
            NaiveTime::from_hms_opt(9, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_parse_schedule_time_trims_whitespace() {
        assert_eq!(
            parse_schedule_time(" 20:00 ").unwrap(),
            NaiveTime::from_hms_opt(20, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_parse_schedule_time_rejects_out_of_range() {
        assert!(parse_schedule_time("24:00").is_err());
        assert!(parse_schedule_time("16:60").is_err());
    }

    #[test]
    fn test_parse_schedule_time_rejects_garbage() {
        assert!(parse_schedule_time("").is_err());
        assert!(parse_schedule_time("4pm").is_err());
        assert!(parse_schedule_time("16").is_err());
    }

    #[test]
    fn test_parse_schedule_time_rejects_seconds() {
        assert!(parse_schedule_time("16:00:00").is_err());
    }
}
