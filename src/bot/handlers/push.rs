use askama::Template;
use itertools::Itertools;

use crate::bot::event::{PushEvent, WebhookEvent};
use crate::bot::handlers::{EventHandler, ReportServices};
use crate::bot::{BotState, PendingReport};
use crate::chat::HTML_BOX_COMMAND;
use crate::config::RepositoryNames;
use crate::templates::{CommitLineTemplate, PushAction, PushHeaderTemplate, LINE_BREAK};
use crate::utils::text::{pluralize, summarize_commit_message};

/// Reports every push, together with a line for each pushed commit.
pub struct PushHandler {
    services: ReportServices,
}

impl PushHandler {
    pub fn new(services: ReportServices) -> Self {
        Self { services }
    }
}

impl EventHandler for PushHandler {
    fn handle(&self, _state: &mut BotState, event: WebhookEvent) -> Option<PendingReport> {
        let WebhookEvent::Push(payload) = event else {
            return None;
        };
        tracing::debug!(
            "Reporting push of {} commit(s) to {}",
            payload.commits.len(),
            payload.git_ref
        );

        let services = self.services.clone();
        Some(PendingReport::new(async move {
            let compare_url = services.shortener.shorten(&payload.compare_url).await;
            format_push(&services.repo_names, &payload, &compare_url)
        }))
    }
}

fn format_push(
    names: &RepositoryNames,
    payload: &PushEvent,
    compare_url: &str,
) -> anyhow::Result<String> {
    let repo = names.display_name(&payload.repository);
    let branch = payload.branch();
    let count = payload.commits.len();

    let header = PushHeaderTemplate {
        repo,
        pusher: &payload.pusher,
        action: PushAction::new(payload.created, payload.forced),
        count,
        commits: &pluralize("commit", count),
        branch,
        url: compare_url,
    }
    .render();

    let commits = payload.commits.iter().map(|commit| {
        CommitLineTemplate {
            repo,
            branch,
            url: &commit.url,
            sha: commit.sha.short(),
            author: &commit.author,
            message: &summarize_commit_message(&commit.message),
        }
        .render()
    });

    let markup = itertools::process_results(std::iter::once(header).chain(commits), |mut lines| {
        lines.join(LINE_BREAK)
    })?;
    Ok(format!("{HTML_BOX_COMMAND} {markup}"))
}
