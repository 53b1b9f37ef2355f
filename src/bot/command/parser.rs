//! Defines parsers for moderation commands.

use crate::bot::command::{BotCommand, CommandPrefix};

#[derive(Debug, PartialEq)]
pub enum CommandParseError {
    MissingCommand,
    UnknownCommand(String),
    MissingArgument { command: String },
}

pub struct CommandParser {
    prefix: CommandPrefix,
    parsers: Vec<ParserFn>,
}

impl CommandParser {
    pub fn new(prefix: CommandPrefix) -> Self {
        Self {
            prefix,
            parsers: DEFAULT_PARSERS.to_vec(),
        }
    }

    /// Prefix used to invoke commands from chat.
    pub fn prefix(&self) -> CommandPrefix {
        self.prefix
    }

    /// Parses a moderation command from a chat message.
    ///
    /// Returns `None` if the message is not meant for the bot.
    pub fn parse_command(&self, text: &str) -> Option<Result<BotCommand, CommandParseError>> {
        let input = text.strip_prefix(self.prefix.as_char())?;
        let mut parts = input.split_whitespace();
        let Some(command) = parts.next() else {
            return Some(Err(CommandParseError::MissingCommand));
        };
        // Logins are matched case-insensitively.
        let argument = parts.map(str::to_lowercase).collect::<Vec<_>>().join(" ");

        for parser in &self.parsers {
            if let Some(result) = parser(command, &argument) {
                return Some(result);
            }
        }
        Some(Err(CommandParseError::UnknownCommand(command.to_string())))
    }
}

type ParseResult<T = BotCommand> = Option<Result<T, CommandParseError>>;
type ParserFn = fn(&str, &str) -> ParseResult;

const DEFAULT_PARSERS: &[ParserFn] = &[parser_ban, parser_unban];

/// Parses ".gitban <user>".
fn parser_ban(command: &str, argument: &str) -> ParseResult {
    if command != "gitban" {
        return None;
    }
    Some(require_argument(command, argument).map(BotCommand::Ban))
}

/// Parses ".gitunban <user>".
fn parser_unban(command: &str, argument: &str) -> ParseResult {
    if command != "gitunban" {
        return None;
    }
    Some(require_argument(command, argument).map(BotCommand::Unban))
}

fn require_argument(command: &str, argument: &str) -> Result<String, CommandParseError> {
    if argument.is_empty() {
        Err(CommandParseError::MissingArgument {
            command: command.to_string(),
        })
    } else {
        Ok(argument.to_string())
    }
}
