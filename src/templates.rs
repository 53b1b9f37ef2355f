//! Chat markup for activity reports.
//!
//! All templates are rendered with HTML escaping, only the fixed action markup of a push is
//! inserted verbatim.
use askama::Template;

/// Separator between lines of a single chat report.
pub const LINE_BREAK: &str = "<br>";

#[derive(Template)]
#[template(
    source = r#"[<font color='FF00FF'>{{ repo }}</font>] <font color='909090'>{{ pusher }}</font> {{ action|safe }} <b>{{ count }}</b> new {{ commits }} to <font color='800080'>{{ branch }}</font>: <a href="{{ url }}">{{ url }}</a>"#,
    ext = "html"
)]
pub struct PushHeaderTemplate<'a> {
    pub repo: &'a str,
    pub pusher: &'a str,
    pub action: PushAction,
    pub count: usize,
    /// `commit` or `commits`.
    pub commits: &'a str,
    pub branch: &'a str,
    pub url: &'a str,
}

#[derive(Template)]
#[template(
    source = r#"<font color='FF00FF'>{{ repo }}</font>/<font color='800080'>{{ branch }}</font> <a href="{{ url }}"><font color='606060'>{{ sha }}</font></a> <font color='909090'>{{ author }}</font>: {{ message }}"#,
    ext = "html"
)]
pub struct CommitLineTemplate<'a> {
    pub repo: &'a str,
    pub branch: &'a str,
    pub url: &'a str,
    pub sha: &'a str,
    pub author: &'a str,
    pub message: &'a str,
}

#[derive(Template)]
#[template(
    source = r#"[<font color='FF00FF'>{{ repo }}</font>] <font color='909090'>{{ sender }}</font> {{ action }} pull request <a href="{{ url }}">#{{ number }}</a>: {{ title }}"#,
    ext = "html"
)]
pub struct PullRequestTemplate<'a> {
    pub repo: &'a str,
    pub sender: &'a str,
    pub action: &'a str,
    pub url: &'a str,
    pub number: u64,
    pub title: &'a str,
}

/// How the commits got to the branch.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PushAction {
    Pushed,
    PushedNewBranch,
    ForcePushed,
}

impl PushAction {
    pub fn new(created: bool, forced: bool) -> Self {
        if created {
            PushAction::PushedNewBranch
        } else if forced {
            PushAction::ForcePushed
        } else {
            PushAction::Pushed
        }
    }
}

impl std::fmt::Display for PushAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            PushAction::Pushed => "pushed",
            PushAction::PushedNewBranch => r#"pushed <font color="red">in new branch</font>"#,
            PushAction::ForcePushed => r#"<font color="red">force-pushed</font>"#,
        })
    }
}
