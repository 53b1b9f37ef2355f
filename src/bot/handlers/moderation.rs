use crate::bot::command::{BotCommand, CommandParseError, CommandParser};
use crate::bot::{BanList, BotState, PendingReport};
use crate::chat::{ChatMessage, MODNOTE_COMMAND};

/// Executes moderation commands posted by privileged chat users and returns the confirmation.
pub(super) fn handle_chat_message(
    parser: &CommandParser,
    state: &mut BotState,
    message: ChatMessage,
) -> Option<PendingReport> {
    if !message.is_privileged() {
        return None;
    }

    let command = match parser.parse_command(&message.text)? {
        Ok(command) => command,
        Err(CommandParseError::UnknownCommand(command)) => {
            tracing::trace!("Ignoring unknown command {command}");
            return None;
        }
        Err(CommandParseError::MissingArgument { command }) => {
            tracing::debug!("Command {command} is missing its argument");
            let prefix = parser.prefix().as_char();
            return Some(PendingReport::ready(format!(
                "{MODNOTE_COMMAND} Usage: {prefix}{command} <username>"
            )));
        }
        Err(error) => {
            tracing::warn!("Cannot parse command {:?}: {error:?}", message.text);
            return None;
        }
    };
    tracing::debug!("Command: {command:?}");

    let reply = match command {
        BotCommand::Ban(login) => command_ban(&mut state.bans, &login, message.username()),
        BotCommand::Unban(login) => command_unban(&mut state.bans, &login, message.username()),
    };
    Some(PendingReport::ready(format!("{MODNOTE_COMMAND} {reply}")))
}

fn command_ban(bans: &mut BanList, login: &str, moderator: &str) -> String {
    if !bans.ban(login) {
        return format!("'{login}' is already banned from being reported");
    }
    tracing::info!("{moderator} banned {login} from being reported");
    format!("'{login}' was banned from being reported by this bot")
}

fn command_unban(bans: &mut BanList, login: &str, moderator: &str) -> String {
    if !bans.unban(login) {
        return format!("'{login}' is already allowed to be reported");
    }
    tracing::info!("{moderator} unbanned {login}");
    format!("'{login}' was unbanned from being reported by this bot")
}
