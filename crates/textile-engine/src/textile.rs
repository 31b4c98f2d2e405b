//! The configured converter and its builder.
//!
//! A [`Textile`] holds everything that is fixed between renders: the output
//! generator, span and glyph rules, block handlers and listeners. Rendering
//! takes `&self` and builds a fresh [`Parser`] per call, so one instance can
//! serve many threads.

use std::fmt;
use std::sync::Arc;

use crate::error::TextileError;
use crate::events::{EventBus, ParseEvent};
use crate::generator::{GlyphReplacements, HtmlGenerator, OutputGenerator, OutputKind, TextGenerator};
use crate::options::RenderOptions;
use crate::parsing::Parser;
use crate::parsing::blocks::{BlockMatch, BlockParts, BlockPatterns};
use crate::parsing::glyphs::GlyphSet;
use crate::parsing::spans::SpanSet;
use crate::parsing::whitespace;

pub const DEFAULT_MAX_SPAN_DEPTH: usize = 5;

pub type UserBlockHandler =
    Arc<dyn Fn(&mut Parser<'_>, &BlockMatch<'_>, BlockParts) -> BlockParts + Send + Sync>;

pub struct TextileBuilder {
    generator: Box<dyn OutputGenerator>,
    glyph_overrides: Vec<(String, String)>,
    max_span_depth: usize,
    base_url: String,
}

impl Default for TextileBuilder {
    fn default() -> Self {
        Self {
            generator: Box::new(HtmlGenerator),
            glyph_overrides: Vec::new(),
            max_span_depth: DEFAULT_MAX_SPAN_DEPTH,
            base_url: String::new(),
        }
    }
}

impl TextileBuilder {
    pub fn generator<G: OutputGenerator + 'static>(mut self, generator: G) -> Self {
        self.generator = Box::new(generator);
        self
    }

    /// Picks one of the bundled generators.
    pub fn output(self, kind: OutputKind) -> Self {
        match kind {
            OutputKind::Html => self.generator(HtmlGenerator),
            OutputKind::Text => self.generator(TextGenerator),
        }
    }

    /// Overrides the generator's template for one built-in glyph rule.
    pub fn glyph_replacement(mut self, name: &str, replacement: &str) -> Self {
        self.glyph_overrides
            .push((name.to_string(), replacement.to_string()));
        self
    }

    /// Nesting level beyond which spans are left as literal text.
    pub fn max_span_depth(mut self, depth: usize) -> Self {
        self.max_span_depth = depth;
        self
    }

    /// Prefix for host-relative link and image URLs.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn build(self) -> Result<Textile, TextileError> {
        let mut glyph_replacements = self.generator.glyph_replacements();
        for (name, replacement) in &self.glyph_overrides {
            if replacement.is_empty() || !glyph_replacements.set(name, replacement.as_str()) {
                return Err(TextileError::InvalidGlyph);
            }
        }

        let block_handlers = Vec::new();
        let block_patterns = BlockPatterns::build(&block_handlers)?;

        Ok(Textile {
            generator: self.generator,
            glyph_replacements,
            spans: SpanSet::standard()?,
            glyphs: GlyphSet::standard()?,
            block_handlers,
            block_patterns,
            events: EventBus::default(),
            max_span_depth: self.max_span_depth,
            base_url: self.base_url,
        })
    }
}

pub struct Textile {
    generator: Box<dyn OutputGenerator>,
    glyph_replacements: GlyphReplacements,
    spans: SpanSet,
    glyphs: GlyphSet,
    block_handlers: Vec<(String, UserBlockHandler)>,
    block_patterns: BlockPatterns,
    events: EventBus,
    max_span_depth: usize,
    base_url: String,
}

impl fmt::Debug for Textile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Textile")
            .field("output", &self.generator.kind())
            .field("spans", &self.spans)
            .field("glyphs", &self.glyphs)
            .field(
                "block_handlers",
                &self.block_handlers.iter().map(|(n, _)| n).collect::<Vec<_>>(),
            )
            .field("events", &self.events)
            .field("max_span_depth", &self.max_span_depth)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl Textile {
    pub fn builder() -> TextileBuilder {
        TextileBuilder::default()
    }

    /// An HTML converter with the standard spans, glyphs and blocks.
    pub fn new() -> Result<Self, TextileError> {
        Self::builder().build()
    }

    pub fn render(&self, text: &str, options: &RenderOptions) -> String {
        if options.encode_only {
            return whitespace::encode_bare_ampersands(text);
        }
        Parser::new(self, options).render(text)
    }

    /// Renders trusted input.
    pub fn render_unrestricted(&self, text: &str) -> String {
        self.render(text, &RenderOptions::unrestricted())
    }

    /// Renders untrusted input with the locked-down preset.
    pub fn render_restricted(&self, text: &str) -> String {
        self.render(text, &RenderOptions::restricted())
    }

    pub fn output_kind(&self) -> OutputKind {
        self.generator.kind()
    }

    /// Adds a span tried after every existing one. `close` defaults to `open`.
    pub fn define_span(
        &mut self,
        name: &str,
        open: &str,
        close: Option<&str>,
    ) -> Result<(), TextileError> {
        self.spans.define(name, open, close.unwrap_or(open), false)
    }

    /// Adds a span to the raw subset: verbatim-style spans that run as a leading
    /// pass in non-lite mode and are skipped by the general span pass.
    pub fn define_raw_span(
        &mut self,
        name: &str,
        open: &str,
        close: Option<&str>,
    ) -> Result<(), TextileError> {
        self.spans.define(name, open, close.unwrap_or(open), true)
    }

    pub fn enable_span(&mut self, name: &str) -> Result<(), TextileError> {
        self.spans.set_enabled(name, true)
    }

    pub fn disable_span(&mut self, name: &str) -> Result<(), TextileError> {
        self.spans.set_enabled(name, false)
    }

    pub fn lookup_span_name(&self, open: &str, close: Option<&str>) -> Option<&str> {
        self.spans.lookup(open, close)
    }

    /// Appends a glyph rule. The replacement may use `$1`..`$9`.
    pub fn define_glyph(
        &mut self,
        name: &str,
        pattern: &str,
        replacement: &str,
    ) -> Result<(), TextileError> {
        self.glyphs.define(name, pattern, replacement)
    }

    /// Installs a handler for a block tag family. Returns false for an empty
    /// or already registered name. Handlers are ignored in lite mode.
    pub fn register_block_handler<F>(&mut self, name: &str, handler: F) -> bool
    where
        F: Fn(&mut Parser<'_>, &BlockMatch<'_>, BlockParts) -> BlockParts + Send + Sync + 'static,
    {
        if name.is_empty() || self.block_handlers.iter().any(|(n, _)| n == name) {
            return false;
        }
        let handler: UserBlockHandler = Arc::new(handler);
        self.block_handlers.push((name.to_string(), handler));
        match BlockPatterns::build(&self.block_handlers) {
            Ok(patterns) => {
                self.block_patterns = patterns;
                true
            }
            Err(err) => {
                log::error!("block handler {name:?} rejected: {err}");
                self.block_handlers.pop();
                false
            }
        }
    }

    pub fn add_parse_listener<F>(&mut self, event: &str, listener: F) -> Result<(), TextileError>
    where
        F: Fn(&ParseEvent<'_>) + Send + Sync + 'static,
    {
        self.events.add_listener(event, listener)
    }

    pub(crate) fn generator(&self) -> &dyn OutputGenerator {
        self.generator.as_ref()
    }

    pub(crate) fn glyph_replacements(&self) -> &GlyphReplacements {
        &self.glyph_replacements
    }

    pub(crate) fn spans(&self) -> &SpanSet {
        &self.spans
    }

    pub(crate) fn glyphs(&self) -> &GlyphSet {
        &self.glyphs
    }

    pub(crate) fn block_handler(&self, root: &str) -> Option<&UserBlockHandler> {
        self.block_handlers
            .iter()
            .find(|(name, _)| name == root)
            .map(|(_, handler)| handler)
    }

    pub(crate) fn block_patterns(&self) -> &BlockPatterns {
        &self.block_patterns
    }

    pub(crate) fn events(&self) -> &EventBus {
        &self.events
    }

    pub(crate) fn max_span_depth(&self) -> usize {
        self.max_span_depth
    }

    pub(crate) fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn textile_can_be_shared_between_threads() {
        assert_send_sync::<Textile>();
    }

    #[test]
    fn duplicate_and_empty_block_handlers_are_refused() {
        let mut textile = Textile::new().unwrap();
        assert!(textile.register_block_handler("note", |_, _, parts| parts));
        assert!(!textile.register_block_handler("note", |_, _, parts| parts));
        assert!(!textile.register_block_handler("", |_, _, parts| parts));
    }

    #[test]
    fn unknown_glyph_override_fails_the_build() {
        let result = Textile::builder().glyph_replacement("sparkle", "*").build();
        assert!(matches!(result, Err(TextileError::InvalidGlyph)));
    }

    #[test]
    fn glyph_override_is_used() {
        let textile = Textile::builder()
            .glyph_replacement("ellipsis", "$1...")
            .build()
            .unwrap();
        assert_eq!(textile.render_unrestricted("Wait..."), "\t<p>Wait...</p>");
    }

    #[test]
    fn encode_only_escapes_bare_ampersands() {
        let textile = Textile::new().unwrap();
        let options = RenderOptions::unrestricted().with_encode_only(true);
        assert_eq!(
            textile.render("*a* & b &amp; c", &options),
            "*a* &amp; b &amp; c"
        );
    }
}
