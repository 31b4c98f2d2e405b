//! Inline spans: `*strong*`, `_em_`, `@code@` and the rest.
//!
//! Each definition is tried in order, one regex pass per definition over the
//! whole text, so `**` (b) must come before `*` (strong) and `__` before `_`.
//! Handlers may recurse into [`Parser::parse_spans`]; the depth counter on the
//! parse context stops scanning past the configured maximum and leaves deeper
//! markers as literal text.

use std::fmt;

use regex::{Captures, Regex};

use super::Parser;
use crate::error::TextileError;
use crate::patterns::{PATTERNS, PNCT, is_span_boundary};
use crate::rewrite::rewrite;

/// One span definition with its compiled pattern.
pub struct SpanDef {
    pub name: String,
    pub open: String,
    pub close: String,
    /// Member of the raw subset (verbatim, code) run ahead of everything else.
    pub raw: bool,
    pub enabled: bool,
    pattern: Regex,
}

impl fmt::Debug for SpanDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpanDef")
            .field("name", &self.name)
            .field("open", &self.open)
            .field("close", &self.close)
            .field("raw", &self.raw)
            .field("enabled", &self.enabled)
            .finish()
    }
}

impl SpanDef {
    fn new(name: &str, open: &str, close: &str, raw: bool) -> Result<Self, TextileError> {
        if name.is_empty() || open.is_empty() || close.is_empty() {
            return Err(TextileError::InvalidSpan);
        }
        let pattern = Regex::new(&span_pattern(open, close))
            .map_err(|source| TextileError::pattern(format!("span {name}"), source))?;
        Ok(Self {
            name: name.to_string(),
            open: open.to_string(),
            close: close.to_string(),
            raw,
            enabled: true,
            pattern,
        })
    }
}

/// The span regex for one open/close marker pair.
///
/// The pre-span look-behind and the "open marker not repeated" look-ahead are
/// not expressible here and are checked in [`Parser::apply_span`].
fn span_pattern(open: &str, close: &str) -> String {
    let open = regex::escape(open);
    let close_first = close
        .chars()
        .next()
        .map(|c| regex::escape(&c.to_string()))
        .unwrap_or_default();
    let close = regex::escape(close);
    let atts = &PATTERNS.c;
    format!(
        r"(?P<pre>[{{\[])?(?P<open>{open})(?P<atts>{atts})(?::(?P<cite>\S+))?(?P<content>[^\s{close_first}]+|\S.*?[^\s{close_first}\n])(?P<end>[{PNCT}]*)(?P<close>{close})(?:(?P<tail>[\]}}])|(?P<ahead>[[:punct:]]|\s|\))|$)"
    )
}

/// Ordered span definitions.
#[derive(Debug, Default)]
pub struct SpanSet {
    spans: Vec<SpanDef>,
}

impl SpanSet {
    /// The standard Textile spans, named after the HTML element they produce.
    pub fn standard() -> Result<Self, TextileError> {
        let mut set = SpanSet::default();
        set.define("verbatim", "==", "==", true)?;
        set.define("verbatim", "<notextile>", "</notextile>", true)?;
        set.define("code", "@", "@", true)?;
        set.define("code", "<code>", "</code>", true)?;
        for (name, marker) in [
            ("b", "**"),
            ("strong", "*"),
            ("cite", "??"),
            ("del", "-"),
            ("i", "__"),
            ("em", "_"),
            ("span", "%"),
            ("ins", "+"),
            ("sub", "~"),
            ("sup", "^"),
        ] {
            set.define(name, marker, marker, false)?;
        }
        Ok(set)
    }

    /// Appends a definition. Marker pairs are unique; names may repeat
    /// (`code` is both `@..@` and `<code>..</code>`).
    pub fn define(
        &mut self,
        name: &str,
        open: &str,
        close: &str,
        raw: bool,
    ) -> Result<(), TextileError> {
        let span = SpanDef::new(name, open, close, raw)?;
        if self.spans.iter().any(|s| s.open == open && s.close == close) {
            return Err(TextileError::DuplicateSpan {
                open: open.to_string(),
                close: close.to_string(),
            });
        }
        self.spans.push(span);
        Ok(())
    }

    /// Enables or disables every definition called `name`.
    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> Result<(), TextileError> {
        let mut found = false;
        for span in self.spans.iter_mut().filter(|s| s.name == name) {
            span.enabled = enabled;
            found = true;
        }
        if found {
            Ok(())
        } else {
            Err(TextileError::UnknownSpan(name.to_string()))
        }
    }

    /// Name of the first definition with these markers; `close` defaults to `open`.
    pub fn lookup(&self, open: &str, close: Option<&str>) -> Option<&str> {
        let close = close.unwrap_or(open);
        self.spans
            .iter()
            .find(|s| s.open == open && s.close == close)
            .map(|s| s.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &SpanDef> {
        self.spans.iter()
    }
}

/// The pieces of one matched span, handed to span handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpanMatch<'a> {
    pub name: &'a str,
    /// `{` or `[` before the span, when the span is bracketed.
    pub pre: &'a str,
    pub open: &'a str,
    pub atts: &'a str,
    pub cite: &'a str,
    pub content: &'a str,
    /// Trailing punctuation inside the close marker.
    pub end: &'a str,
    pub close: &'a str,
    /// `]` or `}` after the span.
    pub tail: &'a str,
}

impl SpanMatch<'_> {
    /// Wraps `body` in the bracket pair only when exactly one side is present,
    /// so `[*x*]` drops its brackets but `[*x*` keeps the stray one.
    pub fn bracket(&self, body: String) -> String {
        if self.pre.is_empty() != self.tail.is_empty() {
            format!("{}{body}{}", self.pre, self.tail)
        } else {
            body
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpanPass {
    Raw,
    General,
}

impl Parser<'_> {
    /// Runs every enabled, non-raw span definition over `text`.
    pub fn parse_spans(&mut self, text: &str) -> String {
        self.span_pass(text, SpanPass::General)
    }

    /// The leading pass for the raw subset (verbatim and code).
    pub fn parse_raw_spans(&mut self, text: &str) -> String {
        self.span_pass(text, SpanPass::Raw)
    }

    fn span_pass(&mut self, text: &str, pass: SpanPass) -> String {
        self.ctx.span_depth += 1;
        let max = self.textile.max_span_depth();
        let mut text = text.to_string();

        if self.ctx.span_depth <= max {
            let textile = self.textile;
            for span in textile
                .spans()
                .iter()
                .filter(|s| s.enabled && s.raw == (pass == SpanPass::Raw))
            {
                text = self.apply_span(span, &text);
            }
        } else {
            log::warn!("span depth {} exceeds {max}, leaving markers as text", self.ctx.span_depth);
        }

        self.ctx.span_depth -= 1;
        text
    }

    fn apply_span(&mut self, span: &SpanDef, text: &str) -> String {
        let generator = self.generator();
        rewrite(&span.pattern, text, |caps, prev| {
            if caps.name("pre").is_none() && !prev.is_none_or(is_span_boundary) {
                return None;
            }
            let open_end = caps.name("open").map_or(0, |m| m.end());
            if text[open_end..].starts_with(span.open.as_str()) {
                return None;
            }

            let found = span_match(&span.name, caps);
            log::trace!("span {} matched {:?}", span.name, &caps[0]);
            self.fire(&format!("span:{}", span.name), &caps[0]);

            let handler = generator
                .span_handler(&span.name)
                .unwrap_or_else(|| generator.default_span_handler());
            Some(handler(self, &found))
        })
    }
}

fn span_match<'a>(name: &'a str, caps: &Captures<'a>) -> SpanMatch<'a> {
    let group = |name: &str| caps.name(name).map_or("", |m| m.as_str());
    SpanMatch {
        name,
        pre: group("pre"),
        open: group("open"),
        atts: group("atts"),
        cite: group("cite"),
        content: group("content"),
        end: group("end"),
        close: group("close"),
        tail: group("tail"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::RenderOptions;
    use crate::textile::Textile;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn spans(textile: &Textile, text: &str) -> String {
        let options = RenderOptions::unrestricted();
        let mut parser = Parser::new(textile, &options);
        let out = parser.parse_spans(text);
        let out = parser.ctx.shelves.restore_fragments(&out);
        parser.ctx.shelves.restore_tags(&out)
    }

    #[rstest]
    #[case("*strong*", "<strong>strong</strong>")]
    #[case("**bold**", "<b>bold</b>")]
    #[case("_em_ and __i__", "<em>em</em> and <i>i</i>")]
    #[case("??cite?? -del- +ins+", "<cite>cite</cite> <del>del</del> <ins>ins</ins>")]
    #[case("x ~sub~ ^sup^ %span%", "x <sub>sub</sub> <sup>sup</sup> <span>span</span>")]
    #[case("*two words*.", "<strong>two words</strong>.")]
    #[case("*(big)classy*", r#"<strong class="big">classy</strong>"#)]
    #[case("[*bracketed*]", "<strong>bracketed</strong>")]
    #[case("*_nested_*", "<strong><em>nested</em></strong>")]
    fn standard_spans(#[case] input: &str, #[case] expected: &str) {
        let textile = Textile::new().unwrap();
        assert_eq!(spans(&textile, input), expected);
    }

    #[rstest]
    #[case("2*3*4")]
    #[case("snake_case_name")]
    #[case("a - b - c")]
    #[case("* not a span *")]
    fn markers_inside_words_or_spaced_out_stay_literal(#[case] input: &str) {
        let textile = Textile::new().unwrap();
        assert_eq!(spans(&textile, input), input);
    }

    #[test]
    fn depth_limit_leaves_inner_markers() {
        let textile = Textile::builder().max_span_depth(1).build().unwrap();
        assert_eq!(spans(&textile, "_*x*_"), "<em>*x*</em>");
    }

    #[test]
    fn depth_counter_is_balanced_after_a_pass() {
        let textile = Textile::new().unwrap();
        let options = RenderOptions::unrestricted();
        let mut parser = Parser::new(&textile, &options);
        parser.parse_spans("*a _b +c+ b_ a*");
        assert_eq!(parser.ctx.span_depth, 0);
    }

    #[test]
    fn raw_spans_are_skipped_by_the_general_pass() {
        let textile = Textile::new().unwrap();
        assert_eq!(spans(&textile, "@code@"), "@code@");
    }

    #[test]
    fn duplicate_marker_pairs_are_rejected() {
        let mut set = SpanSet::standard().unwrap();
        let err = set.define("bold", "*", "*", false).unwrap_err();
        assert!(matches!(err, TextileError::DuplicateSpan { .. }));
        assert!(matches!(
            set.define("", "!", "!", false),
            Err(TextileError::InvalidSpan)
        ));
    }

    #[test]
    fn lookup_and_toggle_by_name() {
        let mut textile = Textile::new().unwrap();
        assert_eq!(textile.lookup_span_name("**", None), Some("b"));
        assert_eq!(textile.lookup_span_name("<code>", Some("</code>")), Some("code"));
        assert_eq!(textile.lookup_span_name("!!", None), None);

        textile.disable_span("strong").unwrap();
        assert_eq!(spans(&textile, "*plain*"), "*plain*");
        assert!(textile.enable_span("nope").is_err());
    }

    #[test]
    fn custom_spans_use_the_default_handler() {
        let mut textile = Textile::new().unwrap();
        textile.define_span("mark", "!!", None).unwrap();
        assert_eq!(spans(&textile, "a !!hot!! take"), "a <mark>hot</mark> take");
    }
}
