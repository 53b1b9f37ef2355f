mod parser;
pub use parser::{CommandParseError, CommandParser};

/// Character that starts a moderation command in chat, e.g. `.` in `.gitban user`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CommandPrefix(char);

impl CommandPrefix {
    pub fn new(prefix: char) -> Self {
        Self(prefix)
    }

    pub fn as_char(&self) -> char {
        self.0
    }
}

impl Default for CommandPrefix {
    fn default() -> Self {
        Self('.')
    }
}

/// Moderation command sent by a privileged chat user.
#[derive(Debug, PartialEq)]
pub enum BotCommand {
    /// Stop reporting pull request activity of an account.
    Ban(String),
    /// Resume reporting pull request activity of an account.
    Unban(String),
}
