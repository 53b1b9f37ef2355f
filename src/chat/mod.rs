//! Connection to the chat room where activity is reported.
use async_trait::async_trait;

pub mod showdown;

/// Ranks allowed to use moderation commands.
pub const PRIVILEGED_RANKS: &[char] = &['~', '#', '*', '&', '@', '%'];

/// Chat command that displays its argument as HTML in the room.
pub const HTML_BOX_COMMAND: &str = "/addhtmlbox";
/// Chat command that leaves a note visible to room staff.
pub const MODNOTE_COMMAND: &str = "/modnote";

/// Generic chat client that the bot reports through.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Sends a single line to the room.
    ///
    /// The text is either a plain message or a command such as `/addhtmlbox <markup>`.
    async fn report(&self, text: &str) -> anyhow::Result<()>;
}

/// A line posted by a user in the chat room.
#[derive(Clone, Debug, PartialEq)]
pub struct ChatMessage {
    /// User identifier, starting with the rank symbol of the user (e.g. `@Zarel`).
    pub user: String,
    pub text: String,
}

impl ChatMessage {
    pub fn new(user: &str, text: &str) -> Self {
        Self {
            user: user.to_string(),
            text: text.to_string(),
        }
    }

    pub fn rank(&self) -> Option<char> {
        self.user.chars().next()
    }

    /// Name of the user without the rank symbol.
    pub fn username(&self) -> &str {
        match self.user.char_indices().nth(1) {
            Some((index, _)) => &self.user[index..],
            None => "",
        }
    }

    pub fn is_privileged(&self) -> bool {
        self.rank().is_some_and(|rank| PRIVILEGED_RANKS.contains(&rank))
    }
}
