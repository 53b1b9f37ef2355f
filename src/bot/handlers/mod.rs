use std::collections::HashMap;
use std::sync::Arc;

use crate::bot::event::{BotEvent, EventKind, WebhookEvent};
use crate::bot::{BotContext, BotState, PendingReport};
use crate::config::RepositoryNames;
use crate::github::shortener::UrlShortener;
use crate::utils::timing::Clock;

mod moderation;
mod pull_request;
mod push;

pub use pull_request::PullRequestHandler;
pub use push::PushHandler;

/// Handles a single webhook event type.
///
/// Handlers run synchronously on the bot process, so they can consult and update the bot state
/// without any locking. Anything that has to wait on the network goes into the returned report.
pub trait EventHandler: Send + Sync {
    /// Returns the report that should be sent to chat, or `None` if the event is suppressed.
    fn handle(&self, state: &mut BotState, event: WebhookEvent) -> Option<PendingReport>;
}

/// External services needed to build reports.
#[derive(Clone)]
pub struct ReportServices {
    pub repo_names: Arc<RepositoryNames>,
    pub shortener: Arc<dyn UrlShortener>,
    pub clock: Arc<dyn Clock>,
}

/// Dispatches webhook events to the handler registered for their kind.
pub struct EventRouter {
    handlers: HashMap<EventKind, Box<dyn EventHandler>>,
}

impl EventRouter {
    /// Creates a router without any handlers.
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Creates a router handling pushes and pull requests.
    pub fn new(services: ReportServices) -> Self {
        Self::empty()
            .register(EventKind::Push, PushHandler::new(services.clone()))
            .register(EventKind::PullRequest, PullRequestHandler::new(services))
    }

    pub fn register<H: EventHandler + 'static>(mut self, kind: EventKind, handler: H) -> Self {
        self.handlers.insert(kind, Box::new(handler));
        self
    }

    pub fn route(&self, state: &mut BotState, event: WebhookEvent) -> Option<PendingReport> {
        let Some(handler) = self.handlers.get(&event.kind()) else {
            tracing::debug!("No handler registered for {:?} events", event.kind());
            return None;
        };
        handler.handle(state, event)
    }
}

/// Handles a single event received by the bot process.
pub fn handle_bot_event(
    event: BotEvent,
    ctx: &BotContext,
    state: &mut BotState,
) -> Option<PendingReport> {
    match event {
        BotEvent::Webhook(event) => {
            let span = tracing::info_span!(
                "Webhook",
                repo = %event.repository(),
                kind = ?event.kind()
            );
            span.in_scope(|| ctx.router.route(state, event))
        }
        BotEvent::Chat(message) => {
            let span = tracing::info_span!("Chat", user = %message.user);
            span.in_scope(|| moderation::handle_chat_message(&ctx.parser, state, message))
        }
    }
}
