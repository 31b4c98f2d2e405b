//! The text-to-text pipeline.
//!
//! A [`Parser`] owns the per-call [`ParseContext`] and borrows the configured
//! [`Textile`]. Every pass is a method on it, so handlers can call back into
//! the pipeline (spans inside spans, paragraphs inside table cells).
//!
//! ## Modules
//!
//! - [`blocks`]: block splitting, the extended-block state machine and dispatch
//! - [`spans`]: span definitions and the recursive span pass
//! - [`glyphs`]: typographic substitution outside HTML tags
//! - [`lists`]: nested ordered, unordered and definition lists
//! - [`tables`]: tables with captions, column groups and row groups
//! - [`links`]: link references, links and URL restoration
//! - [`images`]: `!image!` markup
//! - [`footnotes`]: footnote references and their anchor IDs
//! - [`whitespace`]: input normalisation and ampersand-only encoding
//! - [`breaks`]: `<br />` insertion inside multi-line content

pub mod blocks;
pub mod breaks;
pub mod footnotes;
pub mod glyphs;
pub mod images;
pub mod links;
pub mod lists;
pub mod spans;
pub mod tables;
pub mod whitespace;

use crate::attributes::{Attributes, Element};
use crate::context::ParseContext;
use crate::generator::{OutputGenerator, OutputKind};
use crate::options::RenderOptions;
use crate::shelf::TagKeys;
use crate::textile::Textile;

pub struct Parser<'t> {
    textile: &'t Textile,
    options: &'t RenderOptions,
    ctx: ParseContext,
}

impl<'t> Parser<'t> {
    pub(crate) fn new(textile: &'t Textile, options: &'t RenderOptions) -> Self {
        Self {
            textile,
            options,
            ctx: ParseContext::new(),
        }
    }

    /// Runs the whole pipeline over one document.
    pub(crate) fn render(mut self, text: &str) -> String {
        self.fire("doc:initials", text);

        let text = if self.is_restricted() && self.generator().encodes_entities() {
            html_escape::encode_text(text).into_owned()
        } else {
            text.to_string()
        };
        let text = whitespace::clean(&text, self.options.strict_whitespace);

        let text = self.parse_blocks(&text);

        let text = self.ctx.shelves.restore_fragments(&text);
        let text = self.ctx.shelves.restore_tags(&text);
        let text = self.restore_urls(&text);

        self.fire("doc:finals", &text);
        text
    }

    /// The paragraph pipeline, run on the content of every block that is not eaten.
    pub fn graf(&mut self, text: &str) -> String {
        let mut text = text.to_string();
        if !self.is_lite() {
            text = self.parse_raw_spans(&text);
        }
        text = self.parse_refs(&text);
        text = self.parse_links(&text);
        if !self.options.suppress_images {
            text = self.parse_images(&text);
        }
        if !self.is_lite() {
            text = self.parse_tables(&text);
            text = self.parse_lists(&text);
        }
        text = self.parse_spans(&text);
        text = self.parse_footnote_refs(&text);
        text = self.parse_glyphs(&text);
        text.trim_end_matches('\n').to_string()
    }

    pub fn is_restricted(&self) -> bool {
        self.options.restricted
    }

    pub fn is_lite(&self) -> bool {
        self.options.lite
    }

    pub fn output_kind(&self) -> OutputKind {
        self.generator().kind()
    }

    /// ` rel="..."` for generated links, or nothing.
    pub fn link_rel(&self) -> String {
        match self.options.link_rel.as_deref() {
            Some(rel) if !rel.is_empty() => format!(r#" rel="{}""#, self.encode_html(rel, true)),
            _ => String::new(),
        }
    }

    pub fn shelve(&mut self, value: impl Into<String>) -> String {
        self.ctx.shelves.shelve(value)
    }

    pub fn store_tags(&mut self, open: impl Into<String>, close: impl Into<String>) -> TagKeys {
        self.ctx.shelves.store_tags(open, close)
    }

    pub fn shelve_url(&mut self, url: &str) -> String {
        self.ctx.shelves.shelve_url(url)
    }

    /// Parses and renders an attribute string for this render's mode.
    pub fn attributes(&self, raw: &str, element: Element, include_id: bool) -> String {
        Attributes::parse(raw, element).render(include_id, self.is_restricted())
    }

    /// Escapes `&`, `<`, `>` and, with `quotes`, both quote characters.
    pub fn encode_html(&self, text: &str, quotes: bool) -> String {
        if !self.generator().encodes_entities() {
            return text.to_string();
        }
        if quotes {
            html_escape::encode_quoted_attribute(text).into_owned()
        } else {
            html_escape::encode_text(text).into_owned()
        }
    }

    /// Like [`Parser::encode_html`], except in restricted mode where the input
    /// was escaped up front.
    pub fn conditionally_encode_html(&self, text: &str, quotes: bool) -> String {
        if self.is_restricted() {
            return text.to_string();
        }
        self.encode_html(text, quotes)
    }

    /// Text safe to put inside a double-quoted attribute in either mode.
    pub fn encode_attribute(&self, text: &str) -> String {
        if !self.generator().encodes_entities() {
            return text.to_string();
        }
        if self.is_restricted() {
            text.replace('"', "&quot;")
        } else {
            html_escape::encode_double_quoted_attribute(text).into_owned()
        }
    }

    pub(crate) fn generator(&self) -> &'t dyn OutputGenerator {
        self.textile.generator()
    }

    pub(crate) fn fire(&self, name: &str, payload: &str) {
        self.textile.events().fire(name, payload);
    }
}
