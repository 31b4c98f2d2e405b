use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use uuid::Uuid;

use super::Parser;
use crate::rewrite::rewrite;

static FOOTNOTE_REF: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[([0-9]+)(!?)\]").unwrap());

/// A `text[1]` reference, ready for the generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FootnoteRef<'a> {
    pub number: &'a str,
    /// Anchor ID shared with the matching `fn1.` definition.
    pub id: &'a str,
    /// First reference to this footnote: carries the `fnrev` back-reference target.
    pub backref: bool,
    /// False for `[1!]`, which renders the number without a link.
    pub link: bool,
}

/// Footnote number to anchor ID, created on first use by either a reference
/// or a definition so both sides agree regardless of document order.
#[derive(Debug)]
pub struct FootnoteIds {
    prefix: String,
    entries: HashMap<String, FootnoteEntry>,
}

#[derive(Debug)]
struct FootnoteEntry {
    id: String,
    referenced: bool,
}

impl Default for FootnoteIds {
    fn default() -> Self {
        let mut prefix = Uuid::new_v4().simple().to_string();
        prefix.truncate(12);
        Self {
            prefix,
            entries: HashMap::new(),
        }
    }
}

impl FootnoteIds {
    pub fn id(&mut self, number: &str) -> String {
        self.entry(number).id.clone()
    }

    /// Returns the ID and whether this is the first reference to it.
    pub fn reference(&mut self, number: &str) -> (String, bool) {
        let entry = self.entry(number);
        let first = !entry.referenced;
        entry.referenced = true;
        (entry.id.clone(), first)
    }

    fn entry(&mut self, number: &str) -> &mut FootnoteEntry {
        let prefix = &self.prefix;
        self.entries
            .entry(number.to_string())
            .or_insert_with(|| FootnoteEntry {
                id: format!("{prefix}-{number}"),
                referenced: false,
            })
    }
}

impl Parser<'_> {
    /// Anchor ID for footnote `number`, shared by references and the definition.
    pub fn footnote_id(&mut self, number: &str) -> String {
        self.ctx.footnotes.id(number)
    }

    pub fn parse_footnote_refs(&mut self, text: &str) -> String {
        let generator = self.generator();
        rewrite(&FOOTNOTE_REF, text, |caps, prev| {
            if !prev.is_some_and(|c| !c.is_whitespace()) {
                return None;
            }
            let number = &caps[1];
            self.fire("graf:fnref", number);
            let (id, backref) = self.ctx.footnotes.reference(number);
            let footnote = FootnoteRef {
                number,
                id: &id,
                backref,
                link: &caps[2] != "!",
            };
            Some(generator.footnote_ref(self, &footnote))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn ids_are_shared_and_first_reference_is_flagged() {
        let mut ids = FootnoteIds::default();
        let defined = ids.id("1");
        let (first, is_first) = ids.reference("1");
        let (again, is_first_again) = ids.reference("1");
        assert_eq!(defined, first);
        assert_eq!(first, again);
        assert!(is_first);
        assert!(!is_first_again);
        assert!(first.ends_with("-1"));
        assert_ne!(ids.id("2"), first);
    }
}
