use crate::bot::event::BotEvent;
use crate::bot::{handle_bot_event, BotContext, BotState, PendingReport};
use crate::github::webhook::GitHubWebhook;
use crate::github::webhook::WebhookSecret;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};
use tower::limit::ConcurrencyLimitLayer;
use tracing::{Instrument, Span};

/// Shared server state for all axum handlers.
pub struct ServerState {
    event_queue: mpsc::Sender<BotEvent>,
    webhook_secret: WebhookSecret,
}

impl ServerState {
    pub fn new(event_queue: mpsc::Sender<BotEvent>, webhook_secret: WebhookSecret) -> Self {
        Self {
            event_queue,
            webhook_secret,
        }
    }

    pub fn get_webhook_secret(&self) -> &WebhookSecret {
        &self.webhook_secret
    }
}

pub type ServerStateRef = Arc<ServerState>;

pub fn create_app(state: ServerState) -> Router {
    Router::new()
        .route("/github", post(github_webhook_handler))
        .route("/health", get(health_handler))
        .layer(ConcurrencyLimitLayer::new(100))
        .with_state(Arc::new(state))
}

async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "")
}

/// Axum handler that receives a webhook and sends it to the bot event queue.
pub async fn github_webhook_handler(
    State(state): State<ServerStateRef>,
    GitHubWebhook(event): GitHubWebhook,
) -> impl IntoResponse {
    match state.event_queue.send(BotEvent::Webhook(event)).await {
        Ok(_) => (StatusCode::OK, ""),
        Err(err) => {
            tracing::error!("Could not send webhook event: {err:?}");
            (StatusCode::INTERNAL_SERVER_ERROR, "")
        }
    }
}

/// Capacity of the queue shared by the webhook server, the chat connection and the bot process.
const EVENT_QUEUE_CAPACITY: usize = 1024;

/// Creates the queue through which every [`BotEvent`] reaches the bot process.
pub fn create_event_queue() -> (mpsc::Sender<BotEvent>, mpsc::Receiver<BotEvent>) {
    mpsc::channel(EVENT_QUEUE_CAPACITY)
}

pub type BotProcess = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Creates a future with the bot process that continuously receives webhook events and chat
/// messages from `event_rx` and reacts to them. It ends once every sender of the queue is gone.
///
/// The process is the only owner of `state`, so every ban list and cooldown table access happens
/// sequentially, in the order in which the events were received.
pub fn create_bot_process(
    ctx: BotContext,
    state: BotState,
    event_rx: mpsc::Receiver<BotEvent>,
) -> BotProcess {
    Box::pin(consume_events(Arc::new(ctx), state, event_rx))
}

type DeliveryResult = (Span, anyhow::Result<()>);

async fn consume_events(
    ctx: Arc<BotContext>,
    mut state: BotState,
    mut event_rx: mpsc::Receiver<BotEvent>,
) {
    // Reports wait for URL shortening and chat delivery here, so that a slow external call
    // does not block the handling of further events.
    let mut reports: JoinSet<DeliveryResult> = JoinSet::new();

    loop {
        tokio::select! {
            event = event_rx.recv() => {
                let Some(event) = event else {
                    break;
                };

                let span = tracing::info_span!("BotEvent");
                tracing::debug!("Received event: {event:#?}");
                let report = span.in_scope(|| handle_bot_event(event, &ctx, &mut state));
                if let Some(report) = report {
                    let ctx = ctx.clone();
                    let task_span = span.clone();
                    reports.spawn(
                        async move { (task_span, deliver_report(&ctx, report).await) }
                            .instrument(span),
                    );
                }
            }
            Some(result) = reports.join_next(), if !reports.is_empty() => {
                handle_delivery(result);
            }
        }
    }

    // The queue was closed, finish all reports that are still in flight.
    while let Some(result) = reports.join_next().await {
        handle_delivery(result);
    }
}

async fn deliver_report(ctx: &BotContext, report: PendingReport) -> anyhow::Result<()> {
    let text = report.resolve().await?;
    ctx.chat.report(&text).await
}

fn handle_delivery(result: Result<DeliveryResult, JoinError>) {
    match result {
        Ok((_, Ok(()))) => {}
        Ok((span, Err(error))) => handle_root_error(span, error),
        Err(error) => {
            #[cfg(test)]
            {
                if error.is_panic() {
                    std::panic::resume_unwind(error.into_panic());
                }
            }
            tracing::error!("Report delivery task failed: {error:?}");
        }
    }
}

#[allow(unused_variables)]
fn handle_root_error(span: Span, error: anyhow::Error) {
    // In tests, we want to panic on all errors.
    #[cfg(test)]
    {
        panic!("Report delivery failed: {error:?}");
    }
    #[cfg(not(test))]
    {
        use crate::utils::logging::LogError;
        span.log_error(error);
    }
}
