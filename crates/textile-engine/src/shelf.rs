//! Placeholder stores that keep finished output away from later passes.
//!
//! Three independent shelves live for the length of one render:
//!
//! - fragments: finished markup (code, links, images, table cells), keyed by
//!   render token plus a counter and restored repeatedly until no key is left;
//! - tags: open/close tag pairs around span output, keyed by a fixed-width
//!   counter so the glyph pass never sees attribute text;
//! - URLs: raw link targets keyed by their SHA-1, resolved and policed on the
//!   way back out (see [`crate::parsing::links`]).

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use uuid::Uuid;

/// Upper bound on fragment restoration passes; a crafted input whose values
/// keep producing keys stops here instead of looping.
pub const MAX_RESTORE_PASSES: usize = 64;

static FRAGMENT_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"textileRef:([0-9a-f]{32}):(\d+):shelve").unwrap());
static TAG_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"textileTag:(?P<ouid>[0-9a-f]{32}):opentag(?P<on>\d{10}) ?| ?textileTag:(?P<cuid>[0-9a-f]{32}):closetag(?P<cn>\d{10})",
    )
    .unwrap()
});
pub(crate) static URL_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"urlref:([0-9a-f]{40})").unwrap());

/// Placeholder keys for one stored tag pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagKeys {
    pub open: String,
    pub close: String,
}

#[derive(Debug)]
pub struct Shelves {
    token: String,
    fragments: Vec<String>,
    tags: Vec<(String, String)>,
    urls: HashMap<String, String>,
}

impl Default for Shelves {
    fn default() -> Self {
        Self::new()
    }
}

impl Shelves {
    pub fn new() -> Self {
        Self {
            token: Uuid::new_v4().simple().to_string(),
            fragments: Vec::new(),
            tags: Vec::new(),
            urls: HashMap::new(),
        }
    }

    /// The per-render token embedded in fragment and tag keys.
    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn shelve(&mut self, value: impl Into<String>) -> String {
        self.fragments.push(value.into());
        format!("textileRef:{}:{}:shelve", self.token, self.fragments.len() - 1)
    }

    pub fn store_tags(&mut self, open: impl Into<String>, close: impl Into<String>) -> TagKeys {
        self.tags.push((open.into(), close.into()));
        let index = self.tags.len();
        TagKeys {
            open: format!("textileTag:{}:opentag{index:010} ", self.token),
            close: format!(" textileTag:{}:closetag{index:010}", self.token),
        }
    }

    /// Shelves a URL by content hash. Empty URLs are not shelved.
    pub fn shelve_url(&mut self, url: &str) -> String {
        if url.is_empty() {
            return String::new();
        }
        let hash = sha1_smol::Sha1::from(url).digest().to_string();
        self.urls.insert(hash.clone(), url.to_string());
        format!("urlref:{hash}")
    }

    pub fn url(&self, hash: &str) -> Option<&str> {
        self.urls.get(hash).map(String::as_str)
    }

    /// Substitutes fragment keys until none of ours remain.
    pub fn restore_fragments(&self, text: &str) -> String {
        let mut text = text.to_string();
        for pass in 0..MAX_RESTORE_PASSES {
            let mut replaced = false;
            let next = FRAGMENT_KEY.replace_all(&text, |caps: &Captures| {
                let value = (caps[1] == self.token)
                    .then(|| caps[2].parse::<usize>().ok())
                    .flatten()
                    .and_then(|index| self.fragments.get(index));
                match value {
                    Some(value) => {
                        replaced = true;
                        value.clone()
                    }
                    None => caps[0].to_string(),
                }
            });
            if !replaced {
                log::debug!("fragments restored after {pass} passes");
                return text;
            }
            text = next.into_owned();
        }
        log::warn!("fragment restoration stopped after {MAX_RESTORE_PASSES} passes");
        text
    }

    pub fn restore_tags(&self, text: &str) -> String {
        TAG_KEY
            .replace_all(text, |caps: &Captures| {
                let (uid, index, open) = match (caps.name("ouid"), caps.name("cuid")) {
                    (Some(uid), _) => (uid.as_str(), &caps["on"], true),
                    (None, Some(uid)) => (uid.as_str(), &caps["cn"], false),
                    _ => return caps[0].to_string(),
                };
                let pair = (uid == self.token)
                    .then(|| index.parse::<usize>().ok())
                    .flatten()
                    .and_then(|index| index.checked_sub(1))
                    .and_then(|index| self.tags.get(index));
                match pair {
                    Some((open_tag, _)) if open => open_tag.clone(),
                    Some((_, close_tag)) => close_tag.clone(),
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }
}
