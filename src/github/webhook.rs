use crate::bot::event::{EventKind, PullRequestEvent, PushEvent, WebhookEvent};
use crate::github::server::ServerStateRef;
use crate::github::{Commit, CommitSha, PullRequest, PullRequestNumber, RepositoryId};
use axum::async_trait;
use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;

/// Maximum accepted size of a webhook body. Large pushes can carry a lot of commit data.
const MAX_WEBHOOK_BODY_SIZE: usize = 25 * 1024 * 1024;

#[derive(serde::Deserialize, Debug)]
struct WebhookRepository {
    name: String,
}

#[derive(serde::Deserialize, Debug)]
struct WebhookUser {
    login: String,
}

#[derive(serde::Deserialize, Debug)]
struct WebhookCommitAuthor {
    name: String,
}

#[derive(serde::Deserialize, Debug)]
struct WebhookCommit {
    id: String,
    url: String,
    message: String,
    author: WebhookCommitAuthor,
}

#[derive(serde::Deserialize, Debug)]
struct WebhookPusher {
    name: String,
}

#[derive(serde::Deserialize, Debug)]
struct WebhookPush {
    #[serde(rename = "ref")]
    git_ref: String,
    #[serde(default)]
    commits: Vec<WebhookCommit>,
    pusher: WebhookPusher,
    compare: String,
    #[serde(default)]
    created: bool,
    #[serde(default)]
    forced: bool,
    repository: WebhookRepository,
}

#[derive(serde::Deserialize, Debug)]
struct WebhookPullRequestInner {
    number: u64,
    html_url: String,
    title: String,
    user: WebhookUser,
}

#[derive(serde::Deserialize, Debug)]
struct WebhookPullRequest {
    action: String,
    pull_request: WebhookPullRequestInner,
    sender: WebhookUser,
    repository: WebhookRepository,
}

impl From<WebhookPush> for PushEvent {
    fn from(payload: WebhookPush) -> Self {
        PushEvent {
            repository: RepositoryId::new(&payload.repository.name),
            git_ref: payload.git_ref,
            commits: payload
                .commits
                .into_iter()
                .map(|commit| Commit {
                    sha: CommitSha(commit.id),
                    url: commit.url,
                    message: commit.message,
                    author: commit.author.name,
                })
                .collect(),
            pusher: payload.pusher.name,
            compare_url: payload.compare,
            created: payload.created,
            forced: payload.forced,
        }
    }
}

impl From<WebhookPullRequest> for PullRequestEvent {
    fn from(payload: WebhookPullRequest) -> Self {
        PullRequestEvent {
            repository: RepositoryId::new(&payload.repository.name),
            action: payload.action,
            pull_request: PullRequest {
                number: PullRequestNumber(payload.pull_request.number),
                html_url: payload.pull_request.html_url,
                title: payload.pull_request.title,
                author: payload.pull_request.user.login,
            },
            sender: payload.sender.login,
        }
    }
}

/// axum extractor for GitHub webhook events.
#[derive(Debug)]
pub struct GitHubWebhook(pub WebhookEvent);

/// Extracts a webhook event from a HTTP request.
#[async_trait]
impl FromRequest<ServerStateRef> for GitHubWebhook {
    type Rejection = StatusCode;

    async fn from_request(
        request: Request,
        state: &ServerStateRef,
    ) -> Result<Self, Self::Rejection> {
        let (parts, body) = request.into_parts();

        // Eagerly load body
        let body: Bytes = axum::body::to_bytes(body, MAX_WEBHOOK_BODY_SIZE)
            .await
            .map_err(|error| {
                tracing::error!("Parsing webhook body failed: {error:?}");
                StatusCode::BAD_REQUEST
            })?;

        // Verify that the request is valid
        if !verify_gh_signature(&parts.headers, &body, state.get_webhook_secret()) {
            tracing::error!("Webhook request failed, could not authenticate webhook");
            return Err(StatusCode::BAD_REQUEST);
        }

        // Parse webhook content
        match parse_webhook_event(&parts.headers, &body) {
            Ok(Some(event)) => Ok(GitHubWebhook(event)),
            Ok(None) => Err(StatusCode::OK),
            Err(error) => {
                tracing::error!("Cannot parse webhook event: {error:?}");
                Err(StatusCode::BAD_REQUEST)
            }
        }
    }
}

fn parse_webhook_event(
    headers: &HeaderMap<HeaderValue>,
    body: &[u8],
) -> anyhow::Result<Option<WebhookEvent>> {
    let Some(event_type) = headers.get("x-github-event") else {
        return Err(anyhow::anyhow!("x-github-event header not found"));
    };

    match EventKind::from_header(event_type.as_bytes()) {
        Some(EventKind::Push) => {
            let payload: WebhookPush = serde_json::from_slice(body)?;
            Ok(Some(WebhookEvent::Push(payload.into())))
        }
        Some(EventKind::PullRequest) => {
            let payload: WebhookPullRequest = serde_json::from_slice(body)?;
            Ok(Some(WebhookEvent::PullRequest(payload.into())))
        }
        None => {
            tracing::debug!("Ignoring unknown event type {:?}", event_type.to_str());
            Ok(None)
        }
    }
}

type HmacSha256 = Hmac<Sha256>;

/// Verifies that the request is properly signed by GitHub with SHA-256 and the passed `secret`.
fn verify_gh_signature(
    headers: &HeaderMap<HeaderValue>,
    body: &[u8],
    secret: &WebhookSecret,
) -> bool {
    let Some(signature) = headers.get("x-hub-signature-256").map(|v| v.as_bytes()) else {
        return false;
    };
    let Some(signature) = signature
        .get(b"sha256=".len()..)
        .and_then(|v| hex::decode(v).ok())
    else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(secret.expose().as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&signature).is_ok()
}

/// Wrapper for a secret which is zeroed on drop and can be exposed only through the [`WebhookSecret::expose`] method.
pub struct WebhookSecret(SecretString);

impl WebhookSecret {
    pub fn new(secret: String) -> Self {
        Self(secret.into())
    }

    pub fn expose(&self) -> &str {
        self.0.expose_secret().as_str()
    }
}

#[cfg(test)]
mod tests {
    use axum::extract::FromRequest;
    use axum::http::StatusCode;
    use tokio::sync::mpsc;

    use crate::bot::event::WebhookEvent;
    use crate::github::server::{ServerState, ServerStateRef};
    use crate::github::webhook::WebhookSecret;
    use crate::github::{CommitSha, GitHubWebhook, PullRequestNumber};
    use crate::tests::io::load_test_file;
    use crate::tests::webhook::{create_webhook_request, TEST_WEBHOOK_SECRET};

    #[tokio::test]
    async fn test_push() {
        let Ok(GitHubWebhook(WebhookEvent::Push(push))) =
            check_webhook("webhook/push.json", "push").await
        else {
            panic!("Expected a push event");
        };
        assert_eq!(push.repository.as_str(), "Pokemon-Showdown");
        assert_eq!(push.branch(), "master");
        assert_eq!(push.pusher, "Zarel");
        assert!(!push.created);
        assert!(!push.forced);
        assert_eq!(push.commits.len(), 2);
        assert_eq!(
            push.commits[0].sha,
            CommitSha("4f7ac9d2b1c0e8a3d6f5b4c3a2918e7d6c5b4a39".to_string())
        );
        assert_eq!(push.commits[0].author, "Guangcong Luo");
        assert_eq!(push.commits[1].message, "Fix Struggle PP\n\nStruggle never uses PP.");
    }

    #[tokio::test]
    async fn test_pull_request() {
        let Ok(GitHubWebhook(WebhookEvent::PullRequest(pr))) =
            check_webhook("webhook/pull-request-opened.json", "pull_request").await
        else {
            panic!("Expected a pull request event");
        };
        assert_eq!(pr.repository.as_str(), "Pokemon-Showdown-Client");
        assert_eq!(pr.action, "opened");
        assert_eq!(pr.sender, "Marty-D");
        assert_eq!(pr.pull_request.number, PullRequestNumber(1234));
        assert_eq!(pr.pull_request.author, "Marty-D");
        assert_eq!(pr.pull_request.title, "Add <Terastal> sprites");
    }

    #[tokio::test]
    async fn test_unknown_event() {
        assert_eq!(
            check_webhook("webhook/pull-request-opened.json", "issue_comment")
                .await
                .unwrap_err(),
            StatusCode::OK
        );
    }

    #[tokio::test]
    async fn test_malformed_payload() {
        assert_eq!(
            check_webhook("webhook/push.json", "pull_request")
                .await
                .unwrap_err(),
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn test_wrong_signature() {
        let body = load_test_file("webhook/push.json");
        let mut request = create_webhook_request("push", &body);
        request.headers_mut().insert(
            "x-hub-signature-256",
            "sha256=0000000000000000000000000000000000000000000000000000000000000000"
                .parse()
                .unwrap(),
        );
        assert_eq!(
            GitHubWebhook::from_request(request, &server_state())
                .await
                .unwrap_err(),
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn test_missing_signature() {
        let body = load_test_file("webhook/push.json");
        let mut request = create_webhook_request("push", &body);
        request.headers_mut().remove("x-hub-signature-256");
        assert_eq!(
            GitHubWebhook::from_request(request, &server_state())
                .await
                .unwrap_err(),
            StatusCode::BAD_REQUEST
        );
    }

    fn server_state() -> ServerStateRef {
        let (tx, _) = mpsc::channel(1024);
        ServerStateRef::new(ServerState::new(
            tx,
            WebhookSecret::new(TEST_WEBHOOK_SECRET.to_string()),
        ))
    }

    async fn check_webhook(file: &str, event: &str) -> Result<GitHubWebhook, StatusCode> {
        let body = load_test_file(file);
        let request = create_webhook_request(event, &body);
        GitHubWebhook::from_request(request, &server_state()).await
    }
}
