//! Block, span and cell attribute parsing: `(class#id){style}[lang]<` and friends.
//!
//! Extraction is order-sensitive and removes what it matched as it goes, so a
//! `(class)` is not later read as padding and `{style}` braces are not read as
//! alignment.

use std::fmt::Write;
use std::sync::LazyLock;

use percent_encoding::percent_decode_str;
use regex::Regex;

use crate::patterns::PATTERNS;

static COLSPAN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\\(\d+)").unwrap());
static ROWSPAN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/(\d+)").unwrap());
static VALIGN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("({})", PATTERNS.vlgn)).unwrap());
static STYLE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{([^}]*)\}").unwrap());
static LANG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([a-zA-Z]{2}(?:-[a-zA-Z]{2})?)\]").unwrap());
static CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([-a-zA-Z0-9_.:#]+)\)").unwrap());
static PADDING_LEFT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\(+)").unwrap());
static PADDING_RIGHT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\)+)").unwrap());
static HALIGN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("({})", PATTERNS.hlgn)).unwrap());
static CLASS_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([-a-zA-Z0-9_]*)#([-a-zA-Z0-9_.:]*)$").unwrap());
static COL_SPAN_WIDTH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\\(\d+))?\s*(\d+)?").unwrap());

/// The element an attribute string belongs to; cells, rows and columns
/// understand extra syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Element {
    Block,
    Table,
    Row,
    Cell,
    Col,
}

/// Parsed attributes, ready to render in a fixed order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    pub style: Vec<String>,
    pub class: String,
    pub lang: String,
    pub id: String,
    pub colspan: String,
    pub rowspan: String,
    pub span: String,
    pub width: String,
}

impl Attributes {
    pub fn parse(input: &str, element: Element) -> Self {
        let mut attrs = Attributes::default();
        if input.is_empty() {
            return attrs;
        }
        let mut matched = input.to_string();

        if element == Element::Cell {
            if let Some(caps) = COLSPAN.captures(&matched) {
                attrs.colspan = caps[1].to_string();
            }
            if let Some(caps) = ROWSPAN.captures(&matched) {
                attrs.rowspan = caps[1].to_string();
            }
        }

        if matches!(element, Element::Cell | Element::Row) {
            if let Some(caps) = VALIGN.captures(&matched) {
                attrs
                    .style
                    .push(format!("vertical-align:{}", vertical_align(&caps[1])));
            }
        }

        if let Some(caps) = STYLE.captures(&matched) {
            attrs.style.push(caps[1].trim_end_matches(';').to_string());
            let whole = caps[0].to_string();
            matched = matched.replace(&whole, "");
        }

        if let Some(caps) = LANG.captures(&matched) {
            attrs.lang = caps[1].to_string();
            let whole = caps[0].to_string();
            matched = matched.replace(&whole, "");
        }

        if let Some(caps) = CLASS.captures(&matched) {
            attrs.class = caps[1].to_string();
            let whole = caps[0].to_string();
            matched = matched.replace(&whole, "");
        }

        if let Some(caps) = PADDING_LEFT.captures(&matched) {
            attrs.style.push(format!("padding-left:{}em", caps[1].len()));
            let whole = caps[0].to_string();
            matched = matched.replace(&whole, "");
        }

        if let Some(caps) = PADDING_RIGHT.captures(&matched) {
            attrs.style.push(format!("padding-right:{}em", caps[1].len()));
            let whole = caps[0].to_string();
            matched = matched.replace(&whole, "");
        }

        if let Some(align) = HALIGN
            .captures(&matched)
            .and_then(|caps| horizontal_align(&caps[1]))
        {
            attrs.style.push(format!("text-align:{align}"));
        }

        if let Some(caps) = CLASS_ID.captures(&attrs.class) {
            let (class, id) = (caps[1].to_string(), caps[2].to_string());
            attrs.class = class;
            attrs.id = id;
        }

        if element == Element::Col {
            if let Some(caps) = COL_SPAN_WIDTH.captures(&matched) {
                attrs.span = caps.get(1).map_or("", |m| m.as_str()).to_string();
                attrs.width = caps.get(2).map_or("", |m| m.as_str()).to_string();
            }
        }

        attrs
    }

    /// Renders as ` name="value"` pairs. Restricted output only carries `lang`.
    pub fn render(&self, include_id: bool, restricted: bool) -> String {
        let mut out = String::new();
        if restricted {
            push_attr(&mut out, "lang", &self.lang);
            return out;
        }

        push_attr(&mut out, "style", &self.style_declarations());
        push_attr(&mut out, "class", &self.class);
        push_attr(&mut out, "lang", &self.lang);
        if include_id {
            push_attr(&mut out, "id", &self.id);
        }
        push_attr(&mut out, "colspan", &self.colspan);
        push_attr(&mut out, "rowspan", &self.rowspan);
        push_attr(&mut out, "span", &self.span);
        push_attr(&mut out, "width", &self.width);
        out
    }

    fn style_declarations(&self) -> String {
        let mut joined = String::new();
        for declaration in self.style.iter().flat_map(|s| s.split(';')) {
            let declaration = declaration.trim_matches(|c| c == ';' || c == ' ');
            if !declaration.is_empty() {
                joined.push_str(declaration);
                joined.push_str("; ");
            }
        }
        joined.replace('\n', "").replace(";;", ";").trim().to_string()
    }
}

fn push_attr(out: &mut String, name: &str, value: &str) {
    if !value.is_empty() {
        let _ = write!(out, " {name}=\"{}\"", cleanse(value));
    }
}

/// Strips anything that could break out of an attribute value, including
/// percent-encoded attempts at it.
pub fn cleanse(input: &str) -> String {
    let mut decoded = input.to_string();
    loop {
        let next = percent_decode_str(&decoded).decode_utf8_lossy().into_owned();
        if next.len() == decoded.len() {
            break;
        }
        decoded = next;
    }
    decoded.replace(['"', '\'', '='], "")
}

pub fn horizontal_align(marker: &str) -> Option<&'static str> {
    match marker {
        "<" => Some("left"),
        "=" => Some("center"),
        ">" => Some("right"),
        "<>" => Some("justify"),
        _ => None,
    }
}

fn vertical_align(marker: &str) -> &'static str {
    match marker {
        "^" => "top",
        "-" => "middle",
        "~" => "bottom",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn render(input: &str, element: Element) -> String {
        Attributes::parse(input, element).render(true, false)
    }

    #[rstest]
    #[case("", "")]
    #[case("(intro)", r#" class="intro""#)]
    #[case("(intro#top)", r#" class="intro" id="top""#)]
    #[case("(#top)", r#" id="top""#)]
    #[case("{color:red}", r#" style="color:red;""#)]
    #[case("[fr]", r#" lang="fr""#)]
    #[case("[en-gb]", r#" lang="en-gb""#)]
    #[case("((", r#" style="padding-left:2em;""#)]
    #[case(")", r#" style="padding-right:1em;""#)]
    #[case("<>", r#" style="text-align:justify;""#)]
    #[case("=", r#" style="text-align:center;""#)]
    #[case(
        "(big){color:red}[de]>",
        r#" style="color:red; text-align:right;" class="big" lang="de""#
    )]
    fn block_attributes(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(render(input, Element::Block), expected);
    }

    #[test]
    fn cells_read_spans_and_vertical_alignment() {
        assert_eq!(
            render(r"\2/3^", Element::Cell),
            r#" style="vertical-align:top;" colspan="2" rowspan="3""#
        );
    }

    #[test]
    fn blocks_ignore_cell_only_syntax() {
        assert_eq!(render(r"\2", Element::Block), "");
    }

    #[test]
    fn columns_read_span_and_width() {
        assert_eq!(render(r"\3 100", Element::Col), r#" span="3" width="100""#);
        assert_eq!(render("50", Element::Col), r#" width="50""#);
    }

    #[test]
    fn id_can_be_left_out() {
        let attrs = Attributes::parse("(a#b)", Element::Block);
        assert_eq!(attrs.render(false, false), r#" class="a""#);
    }

    #[test]
    fn restricted_rendering_keeps_only_lang() {
        let attrs = Attributes::parse("(cls){color:red}[en]", Element::Block);
        assert_eq!(attrs.render(true, true), r#" lang="en""#);
    }

    #[test]
    fn cleanse_decodes_repeatedly_and_drops_quotes() {
        assert_eq!(cleanse("a%2522b"), "ab");
        assert_eq!(cleanse("x' onmouseover='y"), "x onmouseovery");
    }

    #[test]
    fn class_syntax_rejects_unsafe_characters() {
        let attrs = Attributes::parse("(a b)", Element::Block);
        assert_eq!(attrs.class, "");
    }
}
