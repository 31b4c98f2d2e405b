//! Output generators: the strategy that decides what markup each span, block,
//! glyph, link, image and footnote reference turns into.
//!
//! The core looks handlers up by name and falls back to the generator's
//! default handler, so a generator only spells out the cases it treats
//! specially.
//!
//! ## Modules
//!
//! - [`html`]: XHTML output, the default
//! - [`text`]: plain text with Unicode typography

pub mod html;
pub mod text;

use serde::{Deserialize, Serialize};

use crate::parsing::Parser;
use crate::parsing::blocks::{BlockMatch, BlockParts};
use crate::parsing::footnotes::FootnoteRef;
use crate::parsing::images::Image;
use crate::parsing::links::Link;
use crate::parsing::spans::SpanMatch;

pub use html::HtmlGenerator;
pub use text::TextGenerator;

pub type SpanHandler = fn(&mut Parser<'_>, &SpanMatch<'_>) -> String;
pub type BlockHandler = fn(&mut Parser<'_>, &BlockMatch<'_>, BlockParts) -> BlockParts;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    #[default]
    Html,
    Text,
}

pub trait OutputGenerator: Send + Sync {
    fn kind(&self) -> OutputKind;

    /// Replacement templates for the built-in glyph rules.
    fn glyph_replacements(&self) -> GlyphReplacements;

    /// Whether raw `&`, `<` and `>` in text are turned into entities.
    fn encodes_entities(&self) -> bool {
        true
    }

    fn span_handler(&self, name: &str) -> Option<SpanHandler>;
    fn default_span_handler(&self) -> SpanHandler;

    /// Handler for a root tag (`h` for `h1`..`h6`, `fn` for `fn12`).
    fn block_handler(&self, root: &str) -> Option<BlockHandler>;
    fn default_block_handler(&self) -> BlockHandler;

    fn footnote_ref(&self, parser: &mut Parser<'_>, footnote: &FootnoteRef<'_>) -> String;

    /// Renders the body of a link; the caller handles surrounding brackets
    /// and shelving.
    fn link(&self, parser: &mut Parser<'_>, link: &Link<'_>) -> String;

    fn image(&self, parser: &mut Parser<'_>, image: &Image<'_>) -> String;

    /// Final per-block pass over line breaks.
    fn tidy_line_breaks(&self, block: String) -> String {
        block
    }
}

/// Templates for the built-in glyph rules. `$1`..`$3` refer to the rule's
/// capture groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphReplacements {
    pub apostrophe: String,
    pub initapostrophe: String,
    pub singleclose: String,
    pub singleopen: String,
    pub doubleclose: String,
    pub doubleopen: String,
    pub abbr: String,
    pub caps: String,
    pub ellipsis: String,
    pub emdash: String,
    pub endash: String,
    pub dimension: String,
    pub trademark: String,
    pub registered: String,
    pub copyright: String,
    pub quarter: String,
    pub half: String,
    pub threequarters: String,
    pub degrees: String,
    pub plusminus: String,
}

impl GlyphReplacements {
    /// Numeric character references, as emitted by the HTML generator.
    pub fn entities() -> Self {
        Self::with_symbols(Symbols {
            apostrophe: "&#8217;",
            single_open: "&#8216;",
            double_open: "&#8220;",
            double_close: "&#8221;",
            ellipsis: "&#8230;",
            emdash: "&#8212;",
            endash: "&#8211;",
            dimension: "&#215;",
            trademark: "&#8482;",
            registered: "&#174;",
            copyright: "&#169;",
            quarter: "&#188;",
            half: "&#189;",
            threequarters: "&#190;",
            degrees: "&#176;",
            plusminus: "&#177;",
        })
        .with_markup(
            r#"<acronym title="$2">$1</acronym>"#,
            r#"<span class="caps">$1</span>$2"#,
        )
    }

    /// Literal Unicode characters, for outputs that are not markup.
    pub fn unicode() -> Self {
        Self::with_symbols(Symbols {
            apostrophe: "’",
            single_open: "‘",
            double_open: "“",
            double_close: "”",
            ellipsis: "…",
            emdash: "—",
            endash: "–",
            dimension: "×",
            trademark: "™",
            registered: "®",
            copyright: "©",
            quarter: "¼",
            half: "½",
            threequarters: "¾",
            degrees: "°",
            plusminus: "±",
        })
        .with_markup("$1 ($2)", "$1$2")
    }

    fn with_symbols(s: Symbols) -> Self {
        Self {
            apostrophe: format!("$1{}$2", s.apostrophe),
            initapostrophe: format!("$1{}$2", s.apostrophe),
            singleclose: format!("$1{}", s.apostrophe),
            singleopen: s.single_open.to_string(),
            doubleclose: format!("$1{}", s.double_close),
            doubleopen: s.double_open.to_string(),
            abbr: String::new(),
            caps: String::new(),
            ellipsis: format!("$1{}", s.ellipsis),
            emdash: format!("$1{}$2", s.emdash),
            endash: format!(" {} ", s.endash),
            dimension: format!("$1$2{}$3", s.dimension),
            trademark: format!("$1{}", s.trademark),
            registered: format!("$1{}", s.registered),
            copyright: format!("$1{}", s.copyright),
            quarter: s.quarter.to_string(),
            half: s.half.to_string(),
            threequarters: s.threequarters.to_string(),
            degrees: s.degrees.to_string(),
            plusminus: s.plusminus.to_string(),
        }
    }

    fn with_markup(mut self, abbr: &str, caps: &str) -> Self {
        self.abbr = abbr.to_string();
        self.caps = caps.to_string();
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.slot(name).map(|slot| slot.as_str())
    }

    /// Overrides one template. Returns false for an unknown glyph name.
    pub fn set(&mut self, name: &str, replacement: impl Into<String>) -> bool {
        match self.slot_mut(name) {
            Some(slot) => {
                *slot = replacement.into();
                true
            }
            None => false,
        }
    }

    fn slot(&self, name: &str) -> Option<&String> {
        Some(match name {
            "apostrophe" => &self.apostrophe,
            "initapostrophe" => &self.initapostrophe,
            "singleclose" => &self.singleclose,
            "singleopen" => &self.singleopen,
            "doubleclose" => &self.doubleclose,
            "doubleopen" => &self.doubleopen,
            "abbr" => &self.abbr,
            "caps" => &self.caps,
            "ellipsis" => &self.ellipsis,
            "emdash" => &self.emdash,
            "endash" => &self.endash,
            "dimension" => &self.dimension,
            "trademark" => &self.trademark,
            "registered" => &self.registered,
            "copyright" => &self.copyright,
            "quarter" => &self.quarter,
            "half" => &self.half,
            "threequarters" => &self.threequarters,
            "degrees" => &self.degrees,
            "plusminus" => &self.plusminus,
            _ => return None,
        })
    }

    fn slot_mut(&mut self, name: &str) -> Option<&mut String> {
        Some(match name {
            "apostrophe" => &mut self.apostrophe,
            "initapostrophe" => &mut self.initapostrophe,
            "singleclose" => &mut self.singleclose,
            "singleopen" => &mut self.singleopen,
            "doubleclose" => &mut self.doubleclose,
            "doubleopen" => &mut self.doubleopen,
            "abbr" => &mut self.abbr,
            "caps" => &mut self.caps,
            "ellipsis" => &mut self.ellipsis,
            "emdash" => &mut self.emdash,
            "endash" => &mut self.endash,
            "dimension" => &mut self.dimension,
            "trademark" => &mut self.trademark,
            "registered" => &mut self.registered,
            "copyright" => &mut self.copyright,
            "quarter" => &mut self.quarter,
            "half" => &mut self.half,
            "threequarters" => &mut self.threequarters,
            "degrees" => &mut self.degrees,
            "plusminus" => &mut self.plusminus,
            _ => return None,
        })
    }
}

impl Default for GlyphReplacements {
    fn default() -> Self {
        Self::entities()
    }
}

struct Symbols {
    apostrophe: &'static str,
    single_open: &'static str,
    double_open: &'static str,
    double_close: &'static str,
    ellipsis: &'static str,
    emdash: &'static str,
    endash: &'static str,
    dimension: &'static str,
    trademark: &'static str,
    registered: &'static str,
    copyright: &'static str,
    quarter: &'static str,
    half: &'static str,
    threequarters: &'static str,
    degrees: &'static str,
    plusminus: &'static str,
}
