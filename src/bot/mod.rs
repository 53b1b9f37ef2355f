use futures::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;

use crate::chat::ChatClient;

mod ban_list;
mod command;
mod context;
mod cooldown;
pub mod event;
mod handlers;

pub use ban_list::BanList;
pub use command::{BotCommand, CommandParseError, CommandParser, CommandPrefix};
pub use context::BotContext;
pub use cooldown::{CooldownTable, PR_NOTIFICATION_COOLDOWN};
pub use handlers::{
    handle_bot_event, EventHandler, EventRouter, PullRequestHandler, PushHandler, ReportServices,
};

/// Mutable state of the bot.
///
/// It is owned by the bot process and lent to handlers for the duration of a single event, it
/// lives only as long as the process does.
#[derive(Default)]
pub struct BotState {
    /// Accounts whose pull request activity is not reported.
    pub bans: BanList,
    /// Time of the last notification sent for each pull request.
    pub cooldowns: CooldownTable,
}

/// A single outbound chat line that may still be waiting on an asynchronous step,
/// such as shortening a URL.
pub struct PendingReport(BoxFuture<'static, anyhow::Result<String>>);

impl PendingReport {
    pub fn new<F>(future: F) -> Self
    where
        F: Future<Output = anyhow::Result<String>> + Send + 'static,
    {
        Self(Box::pin(future))
    }

    /// Report whose text is already known.
    pub fn ready(text: String) -> Self {
        Self::new(futures::future::ready(Ok(text)))
    }

    pub async fn resolve(self) -> anyhow::Result<String> {
        self.0.await
    }
}

impl std::fmt::Debug for PendingReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PendingReport")
    }
}

/// Chat client shared by the bot process and the report delivery tasks.
pub type ChatClientRef = Arc<dyn ChatClient>;
