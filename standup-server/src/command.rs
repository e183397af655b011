//! Command parsing for `/command` messages sent to the bot.

use std::fmt;

/// A recognized bot command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotCommand {
    /// Start (or restart) a report dialogue.
    Report,
    /// Abandon the current report dialogue.
    Cancel,
    /// Publish all stored reports immediately.
    GetReports,
    /// Show usage help.
    Help,
}

impl fmt::Display for BotCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BotCommand::Report => write!(f, "/report"),
            BotCommand::Cancel => write!(f, "/cancel"),
            BotCommand::GetReports => write!(f, "/getreports"),
            BotCommand::Help => write!(f, "/help"),
        }
    }
}

/// Result of parsing a message for bot commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseResult {
    /// The message is not a command at all (ordinary text).
    NotACommand,
    /// A command explicitly addressed to a different bot, e.g.
    /// `/report@SomeOtherBot`. In group chats each bot sees these and must
    /// leave them alone.
    ForAnotherBot,
    /// Leading slash but not a command we know.
    Unknown {
        /// The unrecognized command name that was attempted.
        attempted: String,
    },
    /// A valid command was found.
    Command(BotCommand),
}

/// Parse a message for bot commands.
///
/// # Command Format
///
/// Telegram clients send commands as the first word of a message:
/// `/command` or `/command@BotUsername`, optionally followed by arguments.
/// Arguments are ignored; none of our commands take any.
///
/// The command name and the `@BotUsername` suffix are both matched
/// case-insensitively. A command addressed to a different bot returns
/// `ForAnotherBot` so the caller can drop it without logging noise.
///
/// A `/` mid-message is not a command; neither is a bare `/` or `/ ` with
/// nothing attached to it.
pub fn parse_command(text: &str, bot_username: &str) -> ParseResult {
    let Some(rest) = text.strip_prefix('/') else {
        return ParseResult::NotACommand;
    };

    // First whitespace-delimited token is the command; find() returns a char
    // boundary, so slicing is UTF-8 safe.
    let token_end = rest.find(char::is_whitespace).unwrap_or(rest.len());
    let token = &rest[..token_end];

    let (name, target) = match token.split_once('@') {
        Some((name, target)) => (name, Some(target)),
        None => (token, None),
    };

    if name.is_empty() {
        return ParseResult::NotACommand;
    }

    if let Some(target) = target {
        if !target.eq_ignore_ascii_case(bot_username) {
            return ParseResult::ForAnotherBot;
        }
    }

    if name.eq_ignore_ascii_case("report") {
        ParseResult::Command(BotCommand::Report)
    } else if name.eq_ignore_ascii_case("cancel") {
        ParseResult::Command(BotCommand::Cancel)
    } else if name.eq_ignore_ascii_case("getreports") {
        ParseResult::Command(BotCommand::GetReports)
    } else if name.eq_ignore_ascii_case("help") {
        ParseResult::Command(BotCommand::Help)
    } else {
        ParseResult::Unknown {
            attempted: name.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOT: &str = "StandupReportBot";

    fn command(cmd: BotCommand) -> ParseResult {
        ParseResult::Command(cmd)
    }

    fn unknown(attempted: &str) -> ParseResult {
        ParseResult::Unknown {
            attempted: attempted.to_string(),
        }
    }

    #[test]
    fn test_parse_each_command() {
        assert_eq!(parse_command("/report", BOT), command(BotCommand::Report));
        assert_eq!(parse_command("/cancel", BOT), command(BotCommand::Cancel));
        assert_eq!(
            parse_command("/getreports", BOT),
            command(BotCommand::GetReports)
        );
        assert_eq!(parse_command("/help", BOT), command(BotCommand::Help));
    }

    #[test]
    fn test_commands_are_case_insensitive() {
        assert_eq!(parse_command("/Report", BOT), command(BotCommand::Report));
        assert_eq!(
            parse_command("/GETREPORTS", BOT),
            command(BotCommand::GetReports)
        );
    }

    #[test]
    fn test_command_addressed_to_us() {
        assert_eq!(
            parse_command("/report@StandupReportBot", BOT),
            command(BotCommand::Report)
        );
        // Username matching is case-insensitive
        assert_eq!(
            parse_command("/report@standupreportbot", BOT),
            command(BotCommand::Report)
        );
    }

    #[test]
    fn test_command_addressed_to_another_bot() {
        assert_eq!(
            parse_command("/report@SomeOtherBot", BOT),
            ParseResult::ForAnotherBot
        );
        // Even an unknown command for another bot is not our problem
        assert_eq!(
            parse_command("/settings@SomeOtherBot", BOT),
            ParseResult::ForAnotherBot
        );
    }

    #[test]
    fn test_arguments_are_ignored() {
        assert_eq!(
            parse_command("/report please", BOT),
            command(BotCommand::Report)
        );
        assert_eq!(
            parse_command("/cancel\nwith a second line", BOT),
            command(BotCommand::Cancel)
        );
    }

    #[test]
    fn test_ordinary_text_is_not_a_command() {
        assert_eq!(parse_command("worked on the parser", BOT), ParseResult::NotACommand);
        // A slash later in the message does not make it a command
        assert_eq!(
            parse_command("reviewed foo/bar", BOT),
            ParseResult::NotACommand
        );
        // Commands must start the message
        assert_eq!(parse_command(" /report", BOT), ParseResult::NotACommand);
    }

    #[test]
    fn test_bare_slash_is_not_a_command() {
        assert_eq!(parse_command("/", BOT), ParseResult::NotACommand);
        assert_eq!(parse_command("/ report", BOT), ParseResult::NotACommand);
        assert_eq!(parse_command("", BOT), ParseResult::NotACommand);
    }

    #[test]
    fn test_unknown_command() {
        assert_eq!(parse_command("/start", BOT), unknown("start"));
        assert_eq!(parse_command("/reportx", BOT), unknown("reportx"));
    }

    #[test]
    fn test_non_ascii_text_does_not_panic() {
        assert_eq!(parse_command("/日本語", BOT), unknown("日本語"));
        assert_eq!(parse_command("🔥 /report", BOT), ParseResult::NotACommand);
    }

    #[test]
    fn test_display() {
        assert_eq!(BotCommand::Report.to_string(), "/report");
        assert_eq!(BotCommand::GetReports.to_string(), "/getreports");
    }
}
