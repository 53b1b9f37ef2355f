use crate::chat::ChatMessage;
use crate::github::{Commit, PullRequest, RepositoryId};

/// Everything the bot process reacts to arrives through a single queue as a `BotEvent`.
#[derive(Debug)]
pub enum BotEvent {
    /// An authenticated GitHub webhook.
    Webhook(WebhookEvent),
    /// A line posted in the chat room.
    Chat(ChatMessage),
}

/// Tag used to look up the handler of a webhook event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Push,
    PullRequest,
}

impl EventKind {
    /// Maps the value of the `x-github-event` header to a supported event kind.
    pub fn from_header(value: &[u8]) -> Option<Self> {
        match value {
            b"push" => Some(Self::Push),
            b"pull_request" => Some(Self::PullRequest),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub enum WebhookEvent {
    /// Commits were pushed to a branch.
    Push(PushEvent),
    /// The state of a pull request has changed.
    PullRequest(PullRequestEvent),
}

impl WebhookEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            WebhookEvent::Push(_) => EventKind::Push,
            WebhookEvent::PullRequest(_) => EventKind::PullRequest,
        }
    }

    pub fn repository(&self) -> &RepositoryId {
        match self {
            WebhookEvent::Push(payload) => &payload.repository,
            WebhookEvent::PullRequest(payload) => &payload.repository,
        }
    }
}

#[derive(Debug)]
pub struct PushEvent {
    pub repository: RepositoryId,
    /// Full git ref that was pushed, e.g. `refs/heads/master`.
    pub git_ref: String,
    pub commits: Vec<Commit>,
    pub pusher: String,
    pub compare_url: String,
    pub created: bool,
    pub forced: bool,
}

impl PushEvent {
    /// Last `/`-delimited segment of the pushed ref.
    pub fn branch(&self) -> &str {
        self.git_ref.rsplit('/').next().unwrap_or(&self.git_ref)
    }
}

#[derive(Debug)]
pub struct PullRequestEvent {
    pub repository: RepositoryId,
    /// Raw action label, e.g. `opened` or `synchronize`.
    pub action: String,
    pub pull_request: PullRequest,
    /// Login of the user who triggered the event.
    pub sender: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push_to(git_ref: &str) -> PushEvent {
        PushEvent {
            repository: RepositoryId::new("Pokemon-Showdown"),
            git_ref: git_ref.to_string(),
            commits: vec![],
            pusher: "Zarel".to_string(),
            compare_url: "https://github.com/compare".to_string(),
            created: false,
            forced: false,
        }
    }

    #[test]
    fn branch_from_heads_ref() {
        assert_eq!(push_to("refs/heads/master").branch(), "master");
    }

    #[test]
    fn branch_keeps_last_segment_only() {
        assert_eq!(push_to("refs/heads/feature/login").branch(), "login");
    }

    #[test]
    fn branch_without_slash() {
        assert_eq!(push_to("main").branch(), "main");
    }

    #[test]
    fn event_kind_from_header() {
        assert_eq!(EventKind::from_header(b"push"), Some(EventKind::Push));
        assert_eq!(
            EventKind::from_header(b"pull_request"),
            Some(EventKind::PullRequest)
        );
        assert_eq!(EventKind::from_header(b"issue_comment"), None);
    }
}
