//! Callback-driven replacement with emulated look-around.
//!
//! `regex` has neither look-behind nor look-ahead. Patterns used with
//! [`rewrite`] express a look-ahead as a named `ahead` group: it has to match,
//! but the replaced region stops where it starts and the next search resumes
//! there, so the characters stay available to the following match. Look-behind
//! conditions are checked by the callback, which receives the character
//! preceding the match in the original text.

use regex::{Captures, Regex};

/// Name of the capture group treated as a zero-width look-ahead.
pub const AHEAD: &str = "ahead";

/// Replaces every accepted, non-overlapping match of `re` in `text`.
///
/// The callback returns `None` to reject a match; scanning then resumes one
/// character after the rejected match's start, as a backtracking engine would
/// when an assertion fails.
pub fn rewrite<F>(re: &Regex, text: &str, mut replace: F) -> String
where
    F: FnMut(&Captures<'_>, Option<char>) -> Option<String>,
{
    let mut out = String::with_capacity(text.len());
    let mut copied = 0;
    let mut at = 0;

    while at <= text.len() {
        let Some(caps) = re.captures_at(text, at) else {
            break;
        };
        let Some(whole) = caps.get(0) else {
            break;
        };
        let start = whole.start();
        let end = caps.name(AHEAD).map_or(whole.end(), |ahead| ahead.start());
        let prev = text[..start].chars().next_back();

        match replace(&caps, prev) {
            Some(replacement) => {
                out.push_str(&text[copied..start]);
                out.push_str(&replacement);
                copied = end;
                at = if end > start {
                    end
                } else {
                    next_char_boundary(text, start)
                };
            }
            None => at = next_char_boundary(text, start),
        }
    }

    out.push_str(&text[copied..]);
    out
}

/// Expands `$1`..`$9` in `template` from `caps`; missing groups expand to nothing.
pub fn expand(template: &str, caps: &Captures<'_>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '$' {
            if let Some(digit) = chars.peek().and_then(|d| d.to_digit(10)).filter(|&d| d > 0) {
                chars.next();
                out.push_str(caps.get(digit as usize).map_or("", |m| m.as_str()));
                continue;
            }
        }
        out.push(c);
    }
    out
}

fn next_char_boundary(text: &str, from: usize) -> usize {
    text[from..]
        .chars()
        .next()
        .map_or(text.len() + 1, |c| from + c.len_utf8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn ahead_group_is_left_for_the_next_match() {
        // Each `a` must be followed by `b`, which the next match may start with.
        let re = Regex::new(r"(?P<x>[ab])(?P<ahead>b)").unwrap();
        let out = rewrite(&re, "abbb", |caps, _| Some(format!("[{}]", &caps["x"])));
        assert_eq!(out, "[a][b][b]b");
    }

    #[test]
    fn rejected_match_resumes_one_char_later() {
        let re = Regex::new(r"\*\w+\*").unwrap();
        let out = rewrite(&re, "x*no* *yes*", |caps, prev| {
            prev.is_none_or(char::is_whitespace)
                .then(|| format!("<{}>", &caps[0]))
        });
        assert_eq!(out, "x*no* <*yes*>");
    }

    #[test]
    fn previous_char_comes_from_the_original_text() {
        let re = Regex::new(r"b").unwrap();
        let mut seen = Vec::new();
        rewrite(&re, "ébb", |_, prev| {
            seen.push(prev);
            Some("X".to_string())
        });
        assert_eq!(seen, vec![Some('é'), Some('b')]);
    }

    #[test]
    fn zero_width_matches_do_not_loop() {
        let re = Regex::new(r"x*").unwrap();
        let out = rewrite(&re, "ab", |_, _| Some("-".to_string()));
        assert_eq!(out, "-a-b-");
    }

    #[test]
    fn expand_substitutes_numbered_groups() {
        let re = Regex::new(r"(\w)'(\w)").unwrap();
        let caps = re.captures("it's").unwrap();
        assert_eq!(expand("$1&#8217;$2$3", &caps), "t&#8217;s");
        assert_eq!(expand("$0 costs $", &caps), "$0 costs $");
    }
}
