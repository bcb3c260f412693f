/// Markup stripping and result excerpts.
use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use tracing::warn;

/// Length of the excerpt when the query does not occur in the text.
pub const SNIPPET_MAX_CHARS: usize = 150;
/// Characters kept before a match.
pub const SNIPPET_CONTEXT_BEFORE: usize = 50;
/// Characters kept after the end of a match.
pub const SNIPPET_CONTEXT_AFTER: usize = 100;

pub const ELLIPSIS: &str = "...";
pub const HIGHLIGHT_OPEN: &str = "<mark>";
pub const HIGHLIGHT_CLOSE: &str = "</mark>";

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));
static SPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Remove every `<...>` segment, collapse whitespace runs to one space, trim.
pub fn strip_html(html: &str) -> String {
    let without_tags = TAG_RE.replace_all(html, " ");
    SPACE_RE.replace_all(&without_tags, " ").trim().to_string()
}

/// Excerpt of `content` around the first case-insensitive occurrence of
/// `query`, with every occurrence wrapped in `<mark>`.
///
/// Without an occurrence, the first `SNIPPET_MAX_CHARS` characters are
/// returned, followed by `...` when truncated. Offsets count characters.
pub fn extract_snippet(content: &str, query: &str) -> String {
    let plain: Vec<char> = strip_html(content).chars().collect();
    let needle: Vec<char> = query.chars().map(fold_char).collect();

    let Some(index) = find_folded(&plain, &needle) else {
        let mut head: String = plain.iter().take(SNIPPET_MAX_CHARS).collect();
        if plain.len() > SNIPPET_MAX_CHARS {
            head.push_str(ELLIPSIS);
        }
        return head;
    };

    let start = index.saturating_sub(SNIPPET_CONTEXT_BEFORE);
    let end = (index + needle.len() + SNIPPET_CONTEXT_AFTER).min(plain.len());

    let mut snippet = String::new();
    if start > 0 {
        snippet.push_str(ELLIPSIS);
    }
    snippet.extend(&plain[start..end]);
    if end < plain.len() {
        snippet.push_str(ELLIPSIS);
    }

    highlight(&snippet, query)
}

/// Wrap every case-insensitive occurrence of `query` in `<mark>`, keeping the
/// original casing of the text.
pub fn highlight(text: &str, query: &str) -> String {
    if query.is_empty() {
        return text.to_string();
    }
    let pattern = RegexBuilder::new(&regex::escape(query))
        .case_insensitive(true)
        .build();
    match pattern {
        Ok(re) => re
            .replace_all(text, format!("{HIGHLIGHT_OPEN}$0{HIGHLIGHT_CLOSE}").as_str())
            .into_owned(),
        Err(e) => {
            warn!(error = %e, query, "failed to build highlight pattern");
            text.to_string()
        }
    }
}

/// One-to-one lowercase mapping so character offsets stay aligned.
fn fold_char(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

fn find_folded(haystack: &[char], needle: &[char]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window.iter().zip(needle).all(|(h, n)| fold_char(*h) == *n))
}
