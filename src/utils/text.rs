use std::borrow::Cow;

/// Pluralizes a piece of text.
pub fn pluralize(base: &str, count: usize) -> Cow<'_, str> {
    if count == 1 {
        base.into()
    } else {
        format!("{base}s").into()
    }
}

/// Shortens a commit message to its first non-empty line.
///
/// An ellipsis is appended whenever something else in the message was cut off, even if it is
/// only whitespace.
pub fn summarize_commit_message(message: &str) -> Cow<'_, str> {
    let summary = message
        .split(['\n', '\r', '\u{2028}', '\u{2029}'])
        .find(|line| !line.is_empty())
        .unwrap_or_default();
    if summary == message {
        summary.into()
    } else {
        format!("{summary}…").into()
    }
}
