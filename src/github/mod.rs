//! Contains definitions of common types (pull request, commit, repository name) received
//! from GitHub webhooks.
use std::fmt::{Debug, Display, Formatter};

pub mod server;
pub mod shortener;
mod webhook;

pub use webhook::{GitHubWebhook, WebhookSecret};

/// Raw identifier of a GitHub repository, as sent in webhook payloads (e.g. `Pokemon-Showdown`).
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct RepositoryId(String);

impl RepositoryId {
    pub fn new(name: &str) -> Self {
        Self(name.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for RepositoryId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CommitSha(pub String);

impl CommitSha {
    /// Abbreviated form of the SHA shown in chat reports.
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(6) {
            Some((index, _)) => &self.0[..index],
            None => &self.0,
        }
    }
}

impl From<String> for CommitSha {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for CommitSha {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for CommitSha {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PullRequestNumber(pub u64);

impl From<u64> for PullRequestNumber {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl Display for PullRequestNumber {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        <u64 as Display>::fmt(&self.0, f)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Commit {
    pub sha: CommitSha,
    pub url: String,
    pub message: String,
    pub author: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PullRequest {
    pub number: PullRequestNumber,
    pub html_url: String,
    pub title: String,
    /// Login of the user who opened the pull request.
    pub author: String,
}
