//! XHTML output. Span names double as element names, so a custom span
//! called `mark` renders as `<mark>` without a dedicated handler.

use super::{BlockHandler, GlyphReplacements, OutputGenerator, OutputKind, SpanHandler};
use crate::attributes::{Element, horizontal_align};
use crate::parsing::Parser;
use crate::parsing::blocks::{BlockMatch, BlockParts};
use crate::parsing::breaks::tidy_paragraph_breaks;
use crate::parsing::footnotes::FootnoteRef;
use crate::parsing::images::Image;
use crate::parsing::links::Link;
use crate::parsing::spans::SpanMatch;

#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlGenerator;

impl OutputGenerator for HtmlGenerator {
    fn kind(&self) -> OutputKind {
        OutputKind::Html
    }

    fn glyph_replacements(&self) -> GlyphReplacements {
        GlyphReplacements::entities()
    }

    fn span_handler(&self, name: &str) -> Option<SpanHandler> {
        match name {
            "verbatim" => Some(verbatim_span),
            "code" => Some(code_span),
            _ => None,
        }
    }

    fn default_span_handler(&self) -> SpanHandler {
        element_span
    }

    fn block_handler(&self, root: &str) -> Option<BlockHandler> {
        match root {
            "bq" => Some(blockquote_block),
            "bc" => Some(block_code_block),
            "pre" => Some(pre_block),
            "notextile" => Some(notextile_block),
            "fn" => Some(footnote_block),
            "hr" => Some(rule_block),
            _ => None,
        }
    }

    fn default_block_handler(&self) -> BlockHandler {
        element_block
    }

    fn footnote_ref(&self, _parser: &mut Parser<'_>, footnote: &FootnoteRef<'_>) -> String {
        let backref = if footnote.backref {
            format!(r#" id="fnrev{}""#, footnote.id)
        } else {
            String::new()
        };
        let number = if footnote.link {
            format!(r##"<a href="#fn{}">{}</a>"##, footnote.id, footnote.number)
        } else {
            footnote.number.to_string()
        };
        format!(r#"<sup{backref} class="footnote">{number}</sup>"#)
    }

    fn link(&self, parser: &mut Parser<'_>, link: &Link<'_>) -> String {
        let mut atts = parser.attributes(link.atts, Element::Block, true);
        if let Some(title) = link.title {
            atts.push_str(&format!(r#" title="{}""#, parser.encode_attribute(title)));
        }
        let rel = parser.link_rel();
        let tags = parser.store_tags(format!(r#"<a href="{}"{atts}{rel}>"#, link.url), "</a>");
        format!("{}{}{}", tags.open, link.text, tags.close)
    }

    fn image(&self, parser: &mut Parser<'_>, image: &Image<'_>) -> String {
        let mut atts = parser.attributes(image.atts, Element::Block, true);
        if let Some(align) = horizontal_align(image.align) {
            atts.push_str(&format!(r#" align="{align}""#));
        }
        match image.title {
            Some(title) => {
                let title = parser.encode_attribute(title);
                atts.push_str(&format!(r#" title="{title}" alt="{title}""#));
            }
            None => atts.push_str(r#" alt="""#),
        }

        let img = format!(r#"<img src="{}"{atts} />"#, image.src);
        match image.href {
            Some(href) => {
                let rel = parser.link_rel();
                format!(r#"<a href="{href}"{rel}>{img}</a>"#)
            }
            None => img,
        }
    }

    fn tidy_line_breaks(&self, block: String) -> String {
        tidy_paragraph_breaks(&block)
    }
}

fn element_span(parser: &mut Parser<'_>, span: &SpanMatch<'_>) -> String {
    let mut atts = parser.attributes(span.atts, Element::Block, true);
    if !span.cite.is_empty() {
        atts.push_str(&format!(r#" cite="{}""#, parser.encode_attribute(span.cite)));
    }
    let content = parser.parse_spans(span.content);
    let tags = parser.store_tags(format!("<{}{atts}>", span.name), format!("</{}>", span.name));
    span.bracket(format!("{}{content}{}{}", tags.open, span.end, tags.close))
}

fn verbatim_span(parser: &mut Parser<'_>, span: &SpanMatch<'_>) -> String {
    let key = parser.shelve(format!("{}{}{}", span.atts, span.content, span.end));
    format!("{}{key}{}", span.pre, span.tail)
}

fn code_span(parser: &mut Parser<'_>, span: &SpanMatch<'_>) -> String {
    let code = format!("{}{}{}", span.atts, span.content, span.end);
    let code = parser.conditionally_encode_html(&code, true);
    let key = parser.shelve(code);
    format!("{}<code>{key}</code>{}", span.pre, span.tail)
}

fn element_block(_parser: &mut Parser<'_>, block: &BlockMatch<'_>, mut parts: BlockParts) -> BlockParts {
    if block.tag == "###" {
        return BlockParts::eaten();
    }
    parts.inner_open = format!("\t<{}{}>", block.tag, block.atts);
    parts.inner_close = format!("</{}>", block.tag);
    parts
}

/// A bare `<hr />`; any text after the dot is dropped.
fn rule_block(_parser: &mut Parser<'_>, block: &BlockMatch<'_>, _parts: BlockParts) -> BlockParts {
    BlockParts {
        inner_open: format!("\t<hr{} />", block.atts),
        ..BlockParts::default()
    }
}

fn blockquote_block(parser: &mut Parser<'_>, block: &BlockMatch<'_>, mut parts: BlockParts) -> BlockParts {
    let cite = if block.cite.is_empty() {
        String::new()
    } else {
        format!(r#" cite="{}""#, parser.shelve_url(block.cite))
    };
    parts.outer_open = format!("\t<blockquote{cite}{}>\n", block.atts);
    parts.inner_open = format!(
        "\t\t<p{}>",
        parser.attributes(block.raw_atts, Element::Block, false)
    );
    parts.inner_close = "</p>".to_string();
    parts.outer_close = "\n\t</blockquote>".to_string();
    parts
}

fn block_code_block(parser: &mut Parser<'_>, block: &BlockMatch<'_>, mut parts: BlockParts) -> BlockParts {
    parts.outer_open = format!("<pre{}>", block.atts);
    parts.inner_open = format!(
        "<code{}>",
        parser.attributes(block.raw_atts, Element::Block, false)
    );
    parts.inner_close = "</code>".to_string();
    parts.outer_close = "</pre>".to_string();
    parts.content = shelve_preformatted(parser, &parts.content);
    parts
}

fn pre_block(parser: &mut Parser<'_>, block: &BlockMatch<'_>, mut parts: BlockParts) -> BlockParts {
    parts.outer_open = format!("<pre{}>", block.atts);
    parts.outer_close = "</pre>".to_string();
    parts.content = shelve_preformatted(parser, &parts.content);
    parts
}

fn shelve_preformatted(parser: &mut Parser<'_>, content: &str) -> String {
    let content = format!("{}\n", content.trim_end_matches('\n'));
    let content = parser.conditionally_encode_html(&content, true);
    parser.shelve(content)
}

fn notextile_block(parser: &mut Parser<'_>, _block: &BlockMatch<'_>, parts: BlockParts) -> BlockParts {
    BlockParts {
        content: parser.shelve(parts.content),
        ..BlockParts::default()
    }
}

/// `fn1. text`: the paragraph gets the footnote anchor unless the author set
/// an ID, in which case the anchor moves to the `<sup>`. `fn1^.` links back
/// to the first reference.
fn footnote_block(parser: &mut Parser<'_>, block: &BlockMatch<'_>, mut parts: BlockParts) -> BlockParts {
    let number = block.tag.trim_start_matches("fn");
    let id = parser.footnote_id(number);

    let mut atts = block.atts.to_string();
    let mut sup_id = String::new();
    if atts.contains(" id=") {
        sup_id = format!(r#" id="fn{id}""#);
    } else {
        atts.push_str(&format!(r#" id="fn{id}""#));
    }
    if !atts.contains("class=") {
        atts.push_str(r#" class="footnote""#);
    }

    let backlink = if block.raw_atts.contains('^') {
        format!(r##"<a href="#fnrev{id}">{number}</a>"##)
    } else {
        number.to_string()
    };
    parts.content = format!("<sup{sup_id}>{backlink}</sup> {}", parts.content);
    parts.inner_open = format!("\t<p{atts}>");
    parts.inner_close = "</p>".to_string();
    parts
}

#[cfg(test)]
mod tests {
    use crate::options::RenderOptions;
    use crate::textile::Textile;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn html(input: &str) -> String {
        Textile::new().unwrap().render_unrestricted(input)
    }

    #[rstest]
    #[case("h1. Hello", "\t<h1>Hello</h1>")]
    #[case("p>. right", "\t<p style=\"text-align:right;\">right</p>")]
    #[case("plain text", "\t<p>plain text</p>")]
    #[case("###. hidden\n\nshown", "\t<p>shown</p>")]
    #[case("hr(x). ignored", "\t<hr class=\"x\" />")]
    #[case(
        "bq. quoted",
        "\t<blockquote>\n\t\t<p>quoted</p>\n\t</blockquote>"
    )]
    #[case("bc. a < b", "<pre><code>a &lt; b\n</code></pre>")]
    #[case("pre. keep  *this*", "<pre>keep  *this*\n</pre>")]
    #[case("notextile. *raw*", "*raw*")]
    #[case("a @x < y@ b", "\t<p>a <code>x &lt; y</code> b</p>")]
    #[case("a ==*as is*== b", "\t<p>a *as is* b</p>")]
    #[case("??Book?? and -gone-", "\t<p><cite>Book</cite> and <del>gone</del></p>")]
    fn blocks_and_spans(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(html(input), expected);
    }

    #[test]
    fn blockquote_cite_is_a_url() {
        assert_eq!(
            html("bq.:http://example.com/src quoted"),
            "\t<blockquote cite=\"http://example.com/src\">\n\t\t<p>quoted</p>\n\t</blockquote>"
        );
    }

    #[test]
    fn footnote_reference_and_definition_share_an_id() {
        let out = html("Text[1]\n\nfn1^. The note.");
        let id = out
            .split(r##"href="#fn"##)
            .nth(1)
            .and_then(|rest| rest.split('"').next())
            .unwrap()
            .to_string();
        assert!(out.contains(&format!(r#"<sup id="fnrev{id}" class="footnote">"#)));
        assert!(out.contains(&format!(r#"<p id="fn{id}" class="footnote">"#)));
        assert!(out.contains(&format!(r##"<a href="#fnrev{id}">1</a></sup> The note."##)));
    }

    #[test]
    fn unlinked_footnote_reference() {
        let out = Textile::new()
            .unwrap()
            .render("Text[2!]", &RenderOptions::unrestricted());
        assert!(out.ends_with(r#" class="footnote">2</sup></p>"#), "{out}");
    }
}
