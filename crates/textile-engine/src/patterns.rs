//! Regex fragments shared by every pass.
//!
//! Each field is a non-capturing fragment meant to be spliced into a larger
//! pattern with `format!`. The `regex` crate has no look-around, so the
//! alignment fragment is a plain alternation here; passes that need the
//! original boundary rules check them in their callbacks (see [`crate::rewrite`]).

use std::sync::LazyLock;

/// Punctuation allowed before a span and between span content and its close marker.
pub const PNCT: &str = r#".,"'?!;:‹›«»„“”‚‘’"#;

/// The composed attribute grammar.
#[derive(Debug, Clone)]
pub struct Patterns {
    /// Horizontal alignment and padding: `<`, `>`, `=`, `<>`, `(`, `)`.
    pub hlgn: String,
    /// Vertical alignment for rows and cells: `^`, `-`, `~`.
    pub vlgn: String,
    /// `(class#id)`
    pub clas: String,
    /// `[lang]`
    pub lnge: String,
    /// `{style}`
    pub styl: String,
    /// `\3` column span
    pub cspn: String,
    /// `/2` row span
    pub rspn: String,
    /// Any run of alignment markers.
    pub a: String,
    /// Any run of span markers.
    pub s: String,
    /// Any run of class, style, language or horizontal alignment.
    pub c: String,
    /// Class, style or language, without alignment (used by lists).
    pub lc: String,
    /// Characters allowed inside a link URL.
    pub urlch: String,
}

impl Patterns {
    fn new() -> Self {
        let hlgn = r"(?:<>|<|>|=|[()]+)".to_string();
        let vlgn = r"[\-^~]".to_string();
        let clas = r"(?:\([^)\n]+\))".to_string();
        let lnge = r"(?:\[[^\]\n]+\])".to_string();
        let styl = r"(?:\{[^}\n]+\})".to_string();
        let cspn = r"(?:\\\d+)".to_string();
        let rspn = r"(?:/\d+)".to_string();

        let a = format!("(?:{hlgn}|{vlgn})*");
        let s = format!("(?:{cspn}|{rspn})*");
        let c = format!("(?:{clas}|{styl}|{lnge}|{hlgn})*");
        let lc = format!("(?:{clas}|{styl}|{lnge})*");
        let urlch = r#"[\w"$\-_.+!*'(),";/?:@=&%#{}|\\^~\[\]`]"#.to_string();

        Self {
            hlgn,
            vlgn,
            clas,
            lnge,
            styl,
            cspn,
            rspn,
            a,
            s,
            c,
            lc,
            urlch,
        }
    }
}

pub static PATTERNS: LazyLock<Patterns> = LazyLock::new(Patterns::new);

/// True for characters that may sit directly before a span or link.
pub fn is_span_boundary(c: char) -> bool {
    c.is_whitespace() || c == '>' || c == '(' || PNCT.contains(c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    #[test]
    fn composite_fragments_compile() {
        for fragment in [
            &PATTERNS.a,
            &PATTERNS.s,
            &PATTERNS.c,
            &PATTERNS.lc,
            &PATTERNS.urlch,
        ] {
            assert!(Regex::new(fragment).is_ok(), "{fragment} should compile");
        }
    }

    #[test]
    fn attribute_fragment_matches_class_style_and_lang() {
        let re = Regex::new(&format!("^{}$", PATTERNS.c)).unwrap();
        assert!(re.is_match("(intro#top){color:red}[en]<"));
        assert!(!re.is_match("(broken\nclass)"));
    }

    #[test]
    fn span_boundaries() {
        assert!(is_span_boundary(' '));
        assert!(is_span_boundary('>'));
        assert!(is_span_boundary('“'));
        assert!(!is_span_boundary('a'));
        assert!(!is_span_boundary('_'));
    }
}
