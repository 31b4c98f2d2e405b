//! `"text(title)":url` links, `[name]url` link references and the final URL
//! pass that resolves references, applies the base URL and polices schemes.

use std::sync::LazyLock;

use percent_encoding::percent_decode_str;
use regex::{Captures, Regex};

use super::Parser;
use super::whitespace::encode_bare_ampersands;
use crate::patterns::{PATTERNS, is_span_boundary};
use crate::rewrite::rewrite;
use crate::shelf::URL_KEY;

static URL_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\[(.+?)\]((?:https?://|ftp://|mailto:|/)\S+?)(?P<ahead>\s|$)").unwrap()
});
static RESTRICTED_URL_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\[(.+?)\]((?:https?://|/)\S+?)(?P<ahead>\s|$)").unwrap()
});
static LINK: LazyLock<Regex> = LazyLock::new(|| {
    let (c, urlch) = (&PATTERNS.c, &PATTERNS.urlch);
    Regex::new(&format!(
        r#"(?P<pre>[{{\[])?"(?P<atts>{c})(?P<text>[^"]+?)(?:\((?P<title>[^)]+?)\))?":(?P<url>{urlch}+?)(?P<slash>/)?(?P<post>[^\w/;]*?)(?:(?P<tail>[\]}}])|(?P<ahead>\s|\))|$)"#
    ))
    .unwrap()
});
static SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([a-zA-Z][a-zA-Z0-9+.\-]*):").unwrap());

/// Schemes a restricted render lets through; anything else becomes `#`.
const RESTRICTED_SCHEMES: [&str; 4] = ["http", "https", "ftp", "mailto"];

/// A link ready for the generator. `text` has already been through the
/// image, span and glyph passes; `url` is a URL shelf key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link<'a> {
    pub atts: &'a str,
    pub text: &'a str,
    pub title: Option<&'a str>,
    pub url: &'a str,
}

impl Parser<'_> {
    /// Collects `[name]url` lines into the reference table and removes them.
    pub fn parse_refs(&mut self, text: &str) -> String {
        let pattern = if self.is_restricted() {
            &*RESTRICTED_URL_REF
        } else {
            &*URL_REF
        };
        rewrite(pattern, text, |caps, _| {
            log::debug!("link reference {:?} -> {:?}", &caps[1], &caps[2]);
            self.ctx
                .url_refs
                .insert(caps[1].to_string(), caps[2].to_string());
            Some(String::new())
        })
    }

    pub fn parse_links(&mut self, text: &str) -> String {
        let generator = self.generator();
        rewrite(&LINK, text, |caps, prev| {
            if caps.name("pre").is_none() && !prev.is_none_or(is_span_boundary) {
                return None;
            }
            let group = |name: &str| caps.name(name).map_or("", |m| m.as_str());
            let url = group("url");

            let mut body = match group("text") {
                "$" => url.to_string(),
                other => other.to_string(),
            };
            if !self.options.suppress_images {
                body = self.parse_images(&body);
            }
            body = self.parse_spans(&body);
            body = self.parse_glyphs(&body);

            let url_key = self.shelve_url(&format!("{url}{}", group("slash")));
            let link = Link {
                atts: group("atts"),
                text: body.trim(),
                title: caps.name("title").map(|m| m.as_str()),
                url: &url_key,
            };
            let mut out = generator.link(self, &link);

            let (pre, tail) = (group("pre"), group("tail"));
            let mut post = group("post");
            if pre.is_empty() != tail.is_empty() {
                out = format!("{pre}{out}{post}{tail}");
                post = "";
            }
            Some(format!("{}{post}", self.shelve(out)))
        })
    }

    /// Replaces URL shelf keys with their final, attribute-safe URLs.
    pub(crate) fn restore_urls(&self, text: &str) -> String {
        URL_KEY
            .replace_all(text, |caps: &Captures| match self.ctx.shelves.url(&caps[1]) {
                Some(url) => self.finish_url(url),
                None => caps[0].to_string(),
            })
            .into_owned()
    }

    fn finish_url(&self, url: &str) -> String {
        let url = self.ctx.url_refs.get(url).map_or(url, String::as_str);
        let url = self.relative_url(url).replace('"', "&quot;");
        if !self.is_restricted() && self.generator().encodes_entities() {
            encode_bare_ampersands(&url)
        } else {
            url
        }
    }

    /// Prefixes the base URL onto relative paths and, in restricted mode,
    /// replaces URLs with a disallowed scheme by `#`.
    fn relative_url(&self, url: &str) -> String {
        let decoded = percent_decode_str(url).decode_utf8_lossy();
        let decoded = decoded.trim();
        let (scheme, rest) = match SCHEME.captures(decoded) {
            Some(caps) => (caps[1].to_ascii_lowercase(), &decoded[caps[0].len()..]),
            None => (String::new(), decoded),
        };
        let (host, path) = match rest.strip_prefix("//") {
            Some(authority) => {
                let end = authority.find(['/', '?', '#']).unwrap_or(authority.len());
                authority.split_at(end)
            }
            None => ("", rest),
        };

        if self.is_restricted() && !scheme.is_empty() && !RESTRICTED_SCHEMES.contains(&scheme.as_str())
        {
            log::warn!("dropping link with disallowed scheme {scheme:?}");
            return "#".to_string();
        }

        let base = self.textile.base_url();
        let is_relative_path = path.starts_with(|c: char| c.is_alphanumeric() || c == '_');
        if !base.is_empty() && (scheme.is_empty() || scheme == "http") && host.is_empty() && is_relative_path
        {
            return format!("{base}{url}");
        }
        url.to_string()
    }
}
