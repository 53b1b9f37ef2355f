use askama::Template;

use crate::bot::event::{PullRequestEvent, WebhookEvent};
use crate::bot::handlers::{EventHandler, ReportServices};
use crate::bot::{BotState, PendingReport};
use crate::chat::HTML_BOX_COMMAND;
use crate::templates::PullRequestTemplate;

/// Reports pull request activity.
///
/// Activity of banned users and label changes are never reported, and each pull request is
/// reported at most once per cooldown window.
pub struct PullRequestHandler {
    services: ReportServices,
}

impl PullRequestHandler {
    pub fn new(services: ReportServices) -> Self {
        Self { services }
    }
}

impl EventHandler for PullRequestHandler {
    fn handle(&self, state: &mut BotState, event: WebhookEvent) -> Option<PendingReport> {
        let WebhookEvent::PullRequest(payload) = event else {
            return None;
        };
        let pr = &payload.pull_request;

        if state.bans.contains(&payload.sender) || state.bans.contains(&pr.author) {
            tracing::debug!(
                "Ignoring activity on PR #{} because {} or {} is banned",
                pr.number,
                payload.sender,
                pr.author
            );
            return None;
        }

        let Some(action) = describe_action(&payload.action).map(str::to_string) else {
            tracing::trace!("Ignoring {} action on PR #{}", payload.action, pr.number);
            return None;
        };

        // The cooldown is claimed before the report is built, so that a second event for the
        // same pull request arriving in the meantime is already suppressed.
        let now = self.services.clock.now();
        if !state.cooldowns.try_notify(pr.number, now) {
            tracing::debug!("Ignoring {action} on PR #{}, it is cooling down", pr.number);
            return None;
        }

        let services = self.services.clone();
        Some(PendingReport::new(async move {
            let url = services
                .shortener
                .shorten(&payload.pull_request.html_url)
                .await;
            format_pull_request(
                services.repo_names.display_name(&payload.repository),
                &payload,
                &action,
                &url,
            )
        }))
    }
}

/// Describes what happened to the pull request, or returns `None` for actions that are not
/// worth reporting.
fn describe_action(action: &str) -> Option<&str> {
    match action {
        "synchronize" => Some("updated"),
        "review_requested" => Some("requested a review for"),
        // Nobody cares about labels
        "labeled" | "unlabeled" => None,
        action => Some(action),
    }
}

fn format_pull_request(
    repo: &str,
    payload: &PullRequestEvent,
    action: &str,
    url: &str,
) -> anyhow::Result<String> {
    let markup = PullRequestTemplate {
        repo,
        sender: &payload.sender,
        action,
        url,
        number: payload.pull_request.number.0,
        title: &payload.pull_request.title,
    }
    .render()?;
    Ok(format!("{HTML_BOX_COMMAND} {markup}"))
}
