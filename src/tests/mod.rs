

use async_trait::async_trait;
use axum::http::StatusCode;
use axum::Router;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tower::ServiceExt;

use crate::bot::event::{BotEvent, PullRequestEvent, PushEvent, WebhookEvent};
use crate::bot::{BotContext, BotState, CommandParser, CommandPrefix, EventRouter, ReportServices};
use crate::chat::{ChatClient, ChatMessage};
use crate::config::RepositoryNames;
use crate::github::server::{create_app, create_bot_process, create_event_queue, ServerState};
use crate::github::shortener::UrlShortener;
use crate::github::{Commit, CommitSha, PullRequest, PullRequestNumber, RepositoryId, WebhookSecret};
use crate::utils::timing::Clock;

use webhook::{create_webhook_request, TEST_WEBHOOK_SECRET};

/// How long should we wait before we timeout a test.
const TEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);

/// Clock that only moves when told to.
#[derive(Clone)]
pub struct ManualClock(Arc<Mutex<DateTime<Utc>>>);

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Arc::new(Mutex::new(now)))
    }

    pub fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }

    pub fn advance(&self, duration: Duration) {
        *self.0.lock().unwrap() += duration;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc.with_ymd_and_hms(2023, 5, 12, 17, 30, 0).unwrap())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        ManualClock::now(self)
    }
}

/// Shortens every URL to a `git.io` link derived from its length.
pub struct MockShortener;

#[async_trait]
impl UrlShortener for MockShortener {
    async fn shorten(&self, url: &str) -> String {
        format!("https://git.io/s{}", url.len())
    }
}

/// Leaves every URL as it is, like a shortener that is down.
pub struct PassthroughShortener;

#[async_trait]
impl UrlShortener for PassthroughShortener {
    async fn shorten(&self, url: &str) -> String {
        url.to_string()
    }
}

/// Chat client that remembers everything that was reported.
#[derive(Clone, Default)]
pub struct RecordingChatClient {
    messages: Arc<Mutex<Vec<String>>>,
}

impl RecordingChatClient {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatClient for RecordingChatClient {
    async fn report(&self, text: &str) -> anyhow::Result<()> {
        self.messages.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

pub fn services() -> (ReportServices, ManualClock) {
    let clock = ManualClock::default();
    let services = ReportServices {
        repo_names: Arc::new(RepositoryNames::default()),
        shortener: Arc::new(MockShortener),
        clock: Arc::new(clock.clone()),
    };
    (services, clock)
}

/// Push of a single commit to `main` of the server repository.
pub fn push_event() -> WebhookEvent {
    WebhookEvent::Push(PushEvent {
        repository: RepositoryId::new("Pokemon-Showdown"),
        git_ref: "refs/heads/main".to_string(),
        commits: vec![Commit {
            sha: CommitSha("4f7ac9d2b1c0e8a3d6f5b4c3a2918e7d6c5b4a39".to_string()),
            url: "https://github.com/smogon/Pokemon-Showdown/commit/4f7ac9d".to_string(),
            message: "fix bug".to_string(),
            author: "Guangcong Luo".to_string(),
        }],
        pusher: "Zarel".to_string(),
        compare_url: "https://github.com/smogon/Pokemon-Showdown/compare/9b1c2d3e4f5a...4f7ac9d2b1c0"
            .to_string(),
        created: false,
        forced: false,
    })
}

/// Activity on pull request #42 of the client repository, opened by `Marty-D`.
pub fn pull_request_event(action: &str) -> WebhookEvent {
    WebhookEvent::PullRequest(PullRequestEvent {
        repository: RepositoryId::new("Pokemon-Showdown-Client"),
        action: action.to_string(),
        pull_request: PullRequest {
            number: PullRequestNumber(42),
            html_url: "https://github.com/smogon/Pokemon-Showdown-Client/pull/42".to_string(),
            title: "Add <Terastal> sprites".to_string(),
            author: "Marty-D".to_string(),
        },
        sender: "Marty-D".to_string(),
    })
}

/// Runs the whole bot (HTTP app and bot process) against mocked external services.
pub struct BotTester {
    app: Router,
    event_tx: mpsc::Sender<BotEvent>,
    chat: RecordingChatClient,
    bot: JoinHandle<()>,
}

impl BotTester {
    pub fn new() -> Self {
        let (services, _clock) = services();
        let chat = RecordingChatClient::default();
        let ctx = BotContext::new(
            CommandParser::new(CommandPrefix::default()),
            EventRouter::new(services),
            Arc::new(chat.clone()),
        );
        let (event_tx, event_rx) = create_event_queue();
        let bot_process = create_bot_process(ctx, BotState::default(), event_rx);
        let app = create_app(ServerState::new(
            event_tx.clone(),
            WebhookSecret::new(TEST_WEBHOOK_SECRET.to_string()),
        ));
        let bot = tokio::spawn(bot_process);
        Self {
            app,
            event_tx,
            chat,
            bot,
        }
    }

    pub async fn send_webhook(&mut self, event: &str, body: &str) -> StatusCode {
        let response = self
            .app
            .clone()
            .oneshot(create_webhook_request(event, body))
            .await
            .expect("Cannot send webhook request");
        response.status()
    }

    pub async fn get(&mut self, path: &str) -> StatusCode {
        let request = http::Request::get(path)
            .body(axum::body::Body::empty())
            .unwrap();
        let response = self.app.clone().oneshot(request).await.unwrap();
        response.status()
    }

    pub async fn post_chat(&mut self, user: &str, text: &str) {
        self.event_tx
            .send(BotEvent::Chat(ChatMessage::new(user, text)))
            .await
            .expect("Bot process has ended");
    }

    /// Waits until all events are handled and returns everything that was reported to chat.
    pub async fn finish(self) -> Vec<String> {
        // Close the event queue, the bot process then delivers pending reports and ends.
        drop(self.app);
        drop(self.event_tx);
        tokio::time::timeout(TEST_TIMEOUT, self.bot)
            .await
            .expect("Timed out waiting for the bot process to finish")
            .expect("Bot process panicked");
        self.chat.messages()
    }
}
