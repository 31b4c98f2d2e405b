//! Plain-text output: markup is dropped, typography becomes Unicode and
//! headings are underlined.

use super::{BlockHandler, GlyphReplacements, OutputGenerator, OutputKind, SpanHandler};
use crate::parsing::Parser;
use crate::parsing::blocks::{BlockMatch, BlockParts};
use crate::parsing::footnotes::FootnoteRef;
use crate::parsing::images::Image;
use crate::parsing::links::Link;
use crate::parsing::spans::SpanMatch;

const RULE_WIDTH: usize = 40;

#[derive(Debug, Clone, Copy, Default)]
pub struct TextGenerator;

impl OutputGenerator for TextGenerator {
    fn kind(&self) -> OutputKind {
        OutputKind::Text
    }

    fn glyph_replacements(&self) -> GlyphReplacements {
        GlyphReplacements::unicode()
    }

    fn encodes_entities(&self) -> bool {
        false
    }

    fn span_handler(&self, name: &str) -> Option<SpanHandler> {
        match name {
            "verbatim" | "code" => Some(literal_span),
            _ => None,
        }
    }

    fn default_span_handler(&self) -> SpanHandler {
        unwrapped_span
    }

    fn block_handler(&self, root: &str) -> Option<BlockHandler> {
        match root {
            "bq" => Some(quote_block),
            "fn" => Some(footnote_block),
            "hr" => Some(rule_block),
            "h" => Some(heading_block),
            _ => None,
        }
    }

    fn default_block_handler(&self) -> BlockHandler {
        plain_block
    }

    fn footnote_ref(&self, _parser: &mut Parser<'_>, footnote: &FootnoteRef<'_>) -> String {
        format!("[{}]", footnote.number)
    }

    fn link(&self, _parser: &mut Parser<'_>, link: &Link<'_>) -> String {
        format!("{} ({})", link.text, link.url)
    }

    fn image(&self, _parser: &mut Parser<'_>, image: &Image<'_>) -> String {
        image.title.unwrap_or(image.src).to_string()
    }
}

fn unwrapped_span(parser: &mut Parser<'_>, span: &SpanMatch<'_>) -> String {
    let content = parser.parse_spans(span.content);
    span.bracket(format!("{content}{}", span.end))
}

fn literal_span(parser: &mut Parser<'_>, span: &SpanMatch<'_>) -> String {
    let key = parser.shelve(format!("{}{}", span.content, span.end));
    format!("{}{key}{}", span.pre, span.tail)
}

fn plain_block(_parser: &mut Parser<'_>, block: &BlockMatch<'_>, parts: BlockParts) -> BlockParts {
    if block.tag == "###" {
        return BlockParts::eaten();
    }
    parts
}

fn quote_block(_parser: &mut Parser<'_>, block: &BlockMatch<'_>, mut parts: BlockParts) -> BlockParts {
    parts.content = format!("  Quote: \"{}\" {}\n", parts.content, block.raw_atts);
    parts
}

fn footnote_block(_parser: &mut Parser<'_>, block: &BlockMatch<'_>, mut parts: BlockParts) -> BlockParts {
    let number = block.tag.trim_start_matches("fn");
    parts.content = format!("Footnote {number:>2}: {}", parts.content);
    parts
}

fn rule_block(parser: &mut Parser<'_>, _block: &BlockMatch<'_>, _parts: BlockParts) -> BlockParts {
    BlockParts {
        content: parser.shelve("_".repeat(RULE_WIDTH)),
        ..BlockParts::default()
    }
}

/// `h1` to `h3` are underlined with `=`, `-` and `~`; deeper levels are left bare.
fn heading_block(parser: &mut Parser<'_>, block: &BlockMatch<'_>, parts: BlockParts) -> BlockParts {
    let underline = match block.tag {
        "h1" => '=',
        "h2" => '-',
        "h3" => '~',
        _ => {
            return BlockParts {
                content: parts.content.trim().to_string(),
                ..BlockParts::default()
            };
        }
    };
    let title = parts.content.trim();
    let rule = parser.shelve(underline.to_string().repeat(title.chars().count()));
    BlockParts {
        content: format!("{title}\n{rule}"),
        ..BlockParts::default()
    }
}
