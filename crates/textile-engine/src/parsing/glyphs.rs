//! Typographic substitution: smart quotes, dashes, ellipses, symbols and the
//! `ABBR(title)` and CAPS rules.
//!
//! Rules run in order over the text between HTML tags; tags themselves are
//! never touched. Built-in rules take their replacement from the generator's
//! [`GlyphReplacements`](crate::generator::GlyphReplacements), custom rules
//! carry their own.

use std::fmt;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::Parser;
use crate::error::TextileError;
use crate::rewrite::{AHEAD, expand, rewrite};

static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[\w/!?].*?>").unwrap());

static AMPERSAND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(#?[a-zA-Z0-9]+;)?").unwrap());

/// Extra condition on a match: segment text, captures, preceding character.
pub type GlyphGuard = fn(&str, &Captures<'_>, Option<char>) -> bool;

pub struct GlyphRule {
    pub name: String,
    re: Regex,
    /// Set for custom rules; built-in rules read the generator's template.
    replacement: Option<String>,
    guard: Option<GlyphGuard>,
}

impl fmt::Debug for GlyphRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlyphRule")
            .field("name", &self.name)
            .field("pattern", &self.re.as_str())
            .field("replacement", &self.replacement)
            .finish()
    }
}

impl GlyphRule {
    fn new(
        name: &str,
        pattern: &str,
        replacement: Option<String>,
        guard: Option<GlyphGuard>,
    ) -> Result<Self, TextileError> {
        let re = Regex::new(pattern)
            .map_err(|source| TextileError::pattern(format!("glyph {name}"), source))?;
        Ok(Self {
            name: name.to_string(),
            re,
            replacement,
            guard,
        })
    }
}

#[derive(Debug, Default)]
pub struct GlyphSet {
    rules: Vec<GlyphRule>,
}

impl GlyphSet {
    pub fn standard() -> Result<Self, TextileError> {
        let builtin: [(&str, &str, Option<GlyphGuard>); 20] = [
            ("apostrophe", r"(\w)'(\w)", None),
            ("initapostrophe", r"(\s)'(\d+\w?)\b", Some(not_quoted_year)),
            ("singleclose", r"(\S)'(?P<ahead>\s|[[:punct:]]|<|$)", None),
            ("singleopen", r"'", None),
            ("doubleclose", r#"(\S)"(?P<ahead>\s|[[:punct:]]|<|$)"#, None),
            ("doubleopen", r#"""#, None),
            ("abbr", r"\b([A-Z][A-Z0-9]{2,})\b(?:\(([^)]*)\))", None),
            ("caps", r"([A-Z]{3,})([a-z]*)(?P<ahead>\s|[[:punct:]]|<|$)", Some(caps_outside_attribute)),
            ("ellipsis", r"([^.]?)\.{3}", None),
            ("emdash", r"(\s?)--(\s?)", None),
            ("endash", r"\s-(?:\s|$)", None),
            ("dimension", r"\b(\d+)( ?)x( ?)(?P<ahead>\d)", None),
            ("trademark", r"(?i)(\b ?|\s|^)[(\[]TM[)\]]", None),
            ("registered", r"(?i)(\b ?|\s|^)[(\[]R[)\]]", None),
            ("copyright", r"(?i)(\b ?|\s|^)[(\[]C[)\]]", None),
            ("quarter", r"[(\[]1/4[)\]]", None),
            ("half", r"[(\[]1/2[)\]]", None),
            ("threequarters", r"[(\[]3/4[)\]]", None),
            ("degrees", r"[(\[]o[)\]]", None),
            ("plusminus", r"[(\[]\+/-[)\]]", None),
        ];

        let rules = builtin
            .into_iter()
            .map(|(name, pattern, guard)| GlyphRule::new(name, pattern, None, guard))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    /// Appends a custom rule, run after every existing one.
    pub fn define(
        &mut self,
        name: &str,
        pattern: &str,
        replacement: &str,
    ) -> Result<(), TextileError> {
        if name.is_empty() || pattern.is_empty() || replacement.is_empty() {
            return Err(TextileError::InvalidGlyph);
        }
        if self.rules.iter().any(|rule| rule.name == name) {
            return Err(TextileError::DuplicateGlyph(name.to_string()));
        }
        let rule = GlyphRule::new(name, pattern, Some(replacement.to_string()), None)?;
        self.rules.push(rule);
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &GlyphRule> {
        self.rules.iter()
    }
}

/// `'99` becomes an apostrophe unless the number is itself quoted (`'99'`).
fn not_quoted_year(text: &str, caps: &Captures<'_>, _prev: Option<char>) -> bool {
    let end = caps.get(0).map_or(text.len(), |m| m.end());
    let rest = &text[end..];
    let rest = rest.strip_prefix('.').unwrap_or(rest);
    !rest
        .trim_start_matches(|c: char| c.is_alphanumeric() || c == '_')
        .starts_with('\'')
}

/// CAPS must start a word and must not sit inside a quoted attribute value.
fn caps_outside_attribute(text: &str, caps: &Captures<'_>, prev: Option<char>) -> bool {
    let starts_word = prev.is_none_or(|c| c.is_whitespace() || matches!(c, '>' | '(' | ';' | '-'));
    let ahead = caps.name(AHEAD).map_or(text.len(), |m| m.start());
    let next_markup = text[ahead..].chars().find(|c| matches!(c, '"' | '>' | '<'));
    starts_word && matches!(next_markup, None | Some('<'))
}

impl Parser<'_> {
    /// Applies every glyph rule to the text outside HTML tags.
    pub fn parse_glyphs(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        for tag in HTML_TAG.find_iter(text) {
            out.push_str(&self.glyph_segment(&text[last..tag.start()]));
            out.push_str(tag.as_str());
            last = tag.end();
        }
        out.push_str(&self.glyph_segment(&text[last..]));
        out
    }

    fn glyph_segment(&self, segment: &str) -> String {
        if segment.is_empty() {
            return String::new();
        }
        let mut text = if self.generator().encodes_entities() && !self.is_restricted() {
            escape_text(segment)
        } else {
            segment.to_string()
        };

        let templates = self.textile.glyph_replacements();
        for rule in self.textile.glyphs().iter() {
            let template = match &rule.replacement {
                Some(custom) => Some(custom.as_str()),
                None => templates.get(&rule.name),
            };
            let Some(template) = template.filter(|t| !t.is_empty()) else {
                continue;
            };
            let current = text.clone();
            text = rewrite(&rule.re, &current, |caps, prev| {
                if let Some(guard) = rule.guard {
                    if !guard(&current, caps, prev) {
                        return None;
                    }
                }
                log::trace!("glyph {} matched {:?}", rule.name, &caps[0]);
                Some(expand(template, caps))
            });
        }
        text
    }
}

/// Escapes bare ampersands and angle brackets, leaving entities alone.
fn escape_text(text: &str) -> String {
    AMPERSAND
        .replace_all(text, |caps: &Captures<'_>| {
            if caps.get(1).is_some() {
                caps[0].to_string()
            } else {
                "&amp;".to_string()
            }
        })
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::OutputKind;
    use crate::options::RenderOptions;
    use crate::textile::Textile;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn glyphs(textile: &Textile, text: &str) -> String {
        let options = RenderOptions::unrestricted();
        Parser::new(textile, &options).parse_glyphs(text)
    }

    #[rstest]
    #[case("it's", "it&#8217;s")]
    #[case(r#""quoted""#, "&#8220;quoted&#8221;")]
    #[case("'single'", "&#8216;single&#8217;")]
    #[case("back in '99", "back in &#8217;99")]
    #[case("wait...", "wait&#8230;")]
    #[case("this--that", "this&#8212;that")]
    #[case("one - two", "one &#8211; two")]
    #[case("4 x 5", "4 &#215; 5")]
    #[case("2x3 but x5", "2&#215;3 but x5")]
    #[case("Brand(TM) (c) [r]", "Brand&#8482; &#169; &#174;")]
    #[case("(1/2) (1/4) (3/4) (o) (+/-)", "&#189; &#188; &#190; &#176; &#177;")]
    #[case("NASA rocks", r#"<span class="caps">NASA</span> rocks"#)]
    #[case(
        "ABC(Always Be Closing)",
        r#"<acronym title="Always Be Closing"><span class="caps">ABC</span></acronym>"#
    )]
    #[case("fish & chips", "fish &amp; chips")]
    #[case("&amp; &#169;", "&amp; &#169;")]
    fn html_glyphs(#[case] input: &str, #[case] expected: &str) {
        let textile = Textile::new().unwrap();
        assert_eq!(glyphs(&textile, input), expected);
    }

    #[test]
    fn quoted_year_keeps_its_quotes_as_quotes() {
        let textile = Textile::new().unwrap();
        assert_eq!(glyphs(&textile, " '99' "), " &#8216;99&#8217; ");
    }

    #[test]
    fn tags_are_left_alone() {
        let textile = Textile::new().unwrap();
        assert_eq!(
            glyphs(&textile, r#"<a href="it's">don't</a>"#),
            r#"<a href="it's">don&#8217;t</a>"#
        );
    }

    #[test]
    fn text_output_uses_unicode() {
        let textile = Textile::builder().output(OutputKind::Text).build().unwrap();
        assert_eq!(glyphs(&textile, r#""a" -- b... (c)"#), "“a” — b… ©");
    }

    #[test]
    fn custom_rules_run_after_the_built_ins() {
        let mut textile = Textile::new().unwrap();
        textile.define_glyph("smiley", r":\)", "&#9786;").unwrap();
        assert_eq!(glyphs(&textile, "hi :)"), "hi &#9786;");
        assert!(matches!(
            textile.define_glyph("smiley", "=>", "x"),
            Err(TextileError::DuplicateGlyph(_))
        ));
        assert!(matches!(
            textile.define_glyph("", "=>", "x"),
            Err(TextileError::InvalidGlyph)
        ));
    }
}
