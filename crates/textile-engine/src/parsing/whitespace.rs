use std::sync::LazyLock;

use regex::{Captures, Regex};

static LINE_ENDINGS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\r\n?").unwrap());
static BLANK_LINES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^[ \t]*\n").unwrap());
static NEWLINE_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());
static BARE_AMPERSAND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&([#a-zA-Z0-9]+;)?").unwrap());

/// Normalises raw input before block splitting.
///
/// Line endings, a leading byte order mark, `\x1A` and NUL bytes are always
/// dealt with. Unless `strict` is set, whitespace-only lines are emptied, runs
/// of blank lines collapse to one and leading blank lines are dropped.
pub fn clean(text: &str, strict: bool) -> String {
    let text = text.strip_prefix('\u{FEFF}').unwrap_or(text);
    let text = text.replace(['\u{1A}', '\0'], "");
    let mut text = LINE_ENDINGS.replace_all(&text, "\n").into_owned();

    if !strict {
        text = BLANK_LINES.replace_all(&text, "\n").into_owned();
        text = NEWLINE_RUNS.replace_all(&text, "\n\n").into_owned();
        text = text.trim_start_matches('\n').to_string();
    }
    text
}

/// Escapes ampersands that do not already start an entity reference.
pub fn encode_bare_ampersands(text: &str) -> String {
    BARE_AMPERSAND
        .replace_all(text, |caps: &Captures| match caps.get(1) {
            Some(entity) => format!("&{}", entity.as_str()),
            None => "&amp;".to_string(),
        })
        .into_owned()
}
