//! Block-level parsing: `\n\n`-separated blocks, `tag(atts).` signatures,
//! `..` extended blocks and the handler chain that turns each block into its
//! wrappers and content.
//!
//! A block's output is assembled from five parts (see [`BlockParts`]). An
//! extended block keeps its outer close open and appends following anonymous
//! blocks to itself, each wrapped in the inner open/close only, until the next
//! signature closes it.

use std::sync::LazyLock;

use regex::Regex;

use super::Parser;
use crate::attributes::Element;
use crate::error::TextileError;
use crate::patterns::PATTERNS;
use crate::textile::UserBlockHandler;

/// Tags every non-lite render recognises.
const FULL_TAGS: &str = r"h[1-6]|p|notextile|pre|###|fn\d+|hr|bq|bc";
const LITE_TAGS: &str = "bq|p";

static RAW_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<(p|blockquote|div|form|table|ul|ol|dl|pre|h\d)\b[^>]*>").unwrap()
});
static SELF_CLOSING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<(?:hr|br)[^>]*?/>").unwrap());

/// A block signature as matched, handed to block handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockMatch<'a> {
    /// The full tag, digits included (`h2`, `fn3`).
    pub tag: &'a str,
    /// Attribute syntax as written, e.g. `(intro)>`.
    pub raw_atts: &'a str,
    /// `raw_atts` rendered for the current mode.
    pub atts: &'a str,
    pub extended: bool,
    pub cite: &'a str,
}

/// What a block handler produces. The content is run through the paragraph
/// pipeline afterwards unless `eat` is set, in which case the block is dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockParts {
    pub outer_open: String,
    pub inner_open: String,
    pub content: String,
    pub inner_close: String,
    pub outer_close: String,
    pub eat: bool,
}

impl BlockParts {
    pub fn eaten() -> Self {
        Self {
            eat: true,
            ..Self::default()
        }
    }
}

/// Compiled block signature patterns for full and lite renders.
#[derive(Debug, Clone)]
pub struct BlockPatterns {
    full: Regex,
    lite: Regex,
}

impl BlockPatterns {
    /// Builds the patterns, adding the names of registered handlers to the
    /// full tag set.
    pub fn build(handlers: &[(String, UserBlockHandler)]) -> Result<Self, TextileError> {
        let mut full = FULL_TAGS.to_string();
        for (name, _) in handlers {
            full.push('|');
            full.push_str(&regex::escape(name));
        }
        Ok(Self {
            full: compile_signature(&full)?,
            lite: compile_signature(LITE_TAGS)?,
        })
    }

    fn get(&self, lite: bool) -> &Regex {
        if lite { &self.lite } else { &self.full }
    }
}

fn compile_signature(tags: &str) -> Result<Regex, TextileError> {
    let (a, c) = (&PATTERNS.a, &PATTERNS.c);
    let pattern = format!(
        r"(?s)\A(?P<tag>{tags})(?P<atts>{a}{c})\.(?P<ext>\.?)(?::(?P<cite>\S+))?(?: (?P<content>.*)|\z)"
    );
    Regex::new(&pattern).map_err(|source| TextileError::pattern("block signature", source))
}

/// The signature in force while walking blocks; outlives one block only when
/// the block is extended.
#[derive(Debug)]
struct BlockState {
    tag: String,
    atts: String,
    cite: String,
    extended: bool,
    outer_close: String,
    eat: bool,
}

impl Default for BlockState {
    fn default() -> Self {
        Self {
            tag: "p".to_string(),
            atts: String::new(),
            cite: String::new(),
            extended: false,
            outer_close: String::new(),
            eat: false,
        }
    }
}

impl Parser<'_> {
    pub(crate) fn parse_blocks(&mut self, text: &str) -> String {
        let textile = self.textile;
        let signature = textile.block_patterns().get(self.is_lite());
        let generator = self.generator();

        let mut state = BlockState::default();
        let mut out: Vec<String> = Vec::new();

        for block in text.split("\n\n") {
            let anonymous;
            let rendered = match signature.captures(block) {
                Some(caps) => {
                    anonymous = false;
                    if state.extended {
                        log::debug!("extended {} block closed", state.tag);
                        if let Some(last) = out.last_mut() {
                            last.push_str(&state.outer_close);
                        }
                    }
                    let group = |name: &str| caps.name(name).map_or("", |m| m.as_str());
                    state.tag = group("tag").to_string();
                    state.atts = group("atts").to_string();
                    state.cite = group("cite").to_string();
                    state.extended = !self.is_lite() && group("ext") == ".";
                    if state.extended {
                        log::debug!("extended {} block opened", state.tag);
                    }

                    let parts = self.format_block(&state, group("content"));
                    let mut rendered = format!(
                        "{}{}{}{}",
                        parts.outer_open, parts.inner_open, parts.content, parts.inner_close
                    );
                    if !state.extended {
                        rendered.push_str(&parts.outer_close);
                    }
                    state.outer_close = parts.outer_close;
                    state.eat = parts.eat;
                    rendered
                }
                None if state.extended || !block.starts_with(' ') => {
                    anonymous = true;
                    let parts = self.format_block(&state, block);
                    state.outer_close = parts.outer_close;
                    state.eat = parts.eat;
                    if state.tag == "p" && !has_raw_text(&parts.content) {
                        parts.content
                    } else {
                        format!("{}{}{}", parts.inner_open, parts.content, parts.inner_close)
                    }
                }
                None => {
                    anonymous = true;
                    self.graf(block)
                }
            };

            self.fire("doc:linebreaks", &rendered);
            let rendered = generator.tidy_line_breaks(rendered);

            if state.extended && anonymous {
                if !state.eat {
                    match out.last_mut() {
                        Some(last) => {
                            last.push('\n');
                            last.push_str(&rendered);
                        }
                        None => out.push(rendered),
                    }
                }
            } else if !state.eat && !(anonymous && rendered.is_empty()) {
                out.push(rendered);
            }

            if !state.extended {
                state = BlockState::default();
            }
        }

        if state.extended {
            if let Some(last) = out.last_mut() {
                last.push_str(&state.outer_close);
            }
        }
        out.join("\n\n")
    }

    fn format_block(&mut self, state: &BlockState, content: &str) -> BlockParts {
        let atts = self.attributes(&state.atts, Element::Block, true);
        self.fire(&format!("block:{}", state.tag), content);

        let root: String = state.tag.chars().filter(|c| !c.is_ascii_digit()).collect();
        let found = BlockMatch {
            tag: &state.tag,
            raw_atts: &state.atts,
            atts: &atts,
            extended: state.extended,
            cite: &state.cite,
        };
        let parts = BlockParts {
            content: content.to_string(),
            ..BlockParts::default()
        };

        let textile = self.textile;
        let generator = self.generator();
        let user_handler = if self.is_lite() {
            None
        } else {
            textile.block_handler(&root)
        };
        let mut parts = match (user_handler, generator.block_handler(&root)) {
            (Some(handler), _) => {
                log::debug!("{} block: registered handler {root:?}", state.tag);
                handler(self, &found, parts)
            }
            (None, Some(handler)) => {
                log::debug!("{} block: {:?} handler {root:?}", state.tag, generator.kind());
                handler(self, &found, parts)
            }
            (None, None) => {
                log::debug!("{} block: default handler", state.tag);
                generator.default_block_handler()(self, &found, parts)
            }
        };

        parts.content = if parts.eat {
            String::new()
        } else {
            self.graf(&parts.content)
        };
        parts
    }
}

/// True when `text` has content outside block-level elements, i.e. it still
/// needs a paragraph around it.
pub fn has_raw_text(text: &str) -> bool {
    let mut rest = text.trim().to_string();
    let mut from = 0;
    while from <= rest.len() {
        let Some((start, open_end, name)) = RAW_BLOCK.captures_at(&rest, from).and_then(|caps| {
            let whole = caps.get(0)?;
            Some((whole.start(), whole.end(), caps[1].to_string()))
        }) else {
            break;
        };
        let close = format!("</{name}>");
        match rest[open_end..].rfind(&close) {
            Some(offset) => {
                rest.replace_range(start..open_end + offset + close.len(), "");
                from = start;
            }
            None => from = open_end,
        }
    }
    !SELF_CLOSING.replace_all(rest.trim(), "").trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::RenderOptions;
    use crate::textile::Textile;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("plain words", true)]
    #[case("<p>wrapped</p>", false)]
    #[case("\t<ul>\n\t\t<li>a</li>\n\t</ul>", false)]
    #[case("<hr />", false)]
    #[case("<div>a</div> trailing", true)]
    #[case("<p>unclosed", true)]
    #[case("", false)]
    fn raw_text_detection(#[case] input: &str, #[case] expected: bool) {
        assert_eq!(has_raw_text(input), expected);
    }

    #[test]
    fn signatures_need_a_space_or_the_end_of_the_block() {
        let patterns = BlockPatterns::build(&[]).unwrap();
        let full = patterns.get(false);
        assert!(full.is_match("h1. Title"));
        assert!(full.is_match("bc.. code"));
        assert!(full.is_match("hr."));
        assert!(full.is_match("fn12. note"));
        assert!(full.is_match("p(intro)>. text"));
        assert!(full.is_match("bq.:http://example.com quote"));
        assert!(!full.is_match("p.text"));
        assert!(!full.is_match("h7. nope"));

        let lite = patterns.get(true);
        assert!(lite.is_match("bq. quote"));
        assert!(!lite.is_match("h1. Title"));
    }

    #[test]
    fn handler_names_are_matched_literally() {
        let mut textile = Textile::new().unwrap();
        assert!(textile.register_block_handler("c++", |_, _, parts| parts));
        let caps = textile
            .block_patterns()
            .get(false)
            .captures("c++. code")
            .unwrap();
        assert_eq!(&caps["tag"], "c++");
    }

    #[test]
    fn block_events_carry_the_raw_content() {
        use std::sync::{Arc, Mutex};

        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut textile = Textile::new().unwrap();
        let sink = Arc::clone(&seen);
        textile
            .add_parse_listener("block:h2", move |event| {
                sink.lock().unwrap().push(event.payload.to_string());
            })
            .unwrap();

        let options = RenderOptions::unrestricted();
        let mut parser = Parser::new(&textile, &options);
        parser.parse_blocks("h2. *Setup*\n\nbody");
        assert_eq!(*seen.lock().unwrap(), vec!["*Setup*".to_string()]);
    }
}
