//! `!src(title)!:href` images, with `!<` / `!=` / `!>` alignment.

use std::sync::LazyLock;

use regex::Regex;

use super::Parser;
use crate::patterns::PATTERNS;
use crate::rewrite::rewrite;

static IMAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?:[\[{{])?!(?P<align>[<=>])?(?P<atts>{})(?:\. )?(?P<url>[^\s(!]+)\s?(?:\((?P<title>[^)]+)\))?!(?::(?P<href>\S+))?(?:[\]}}]|(?P<ahead>\s)|$)",
        PATTERNS.c
    ))
    .unwrap()
});

/// An image ready for the generator; `src` and `href` are URL shelf keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Image<'a> {
    /// `<`, `=` or `>`, or empty.
    pub align: &'a str,
    pub atts: &'a str,
    pub src: &'a str,
    pub title: Option<&'a str>,
    pub href: Option<&'a str>,
}

impl Parser<'_> {
    pub fn parse_images(&mut self, text: &str) -> String {
        let generator = self.generator();
        rewrite(&IMAGE, text, |caps, _| {
            let group = |name: &str| caps.name(name).map_or("", |m| m.as_str());
            let src = self.shelve_url(group("url"));
            let href = caps.name("href").map(|m| self.shelve_url(m.as_str()));
            let image = Image {
                align: group("align"),
                atts: group("atts"),
                src: &src,
                title: caps.name("title").map(|m| m.as_str()),
                href: href.as_deref(),
            };
            let out = generator.image(self, &image);
            Some(self.shelve(out))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::RenderOptions;
    use crate::textile::Textile;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn images(text: &str) -> String {
        let textile = Textile::new().unwrap();
        let options = RenderOptions::unrestricted();
        let mut parser = Parser::new(&textile, &options);
        let out = parser.parse_images(text);
        let out = parser.ctx.shelves.restore_fragments(&out);
        parser.restore_urls(&out)
    }

    #[rstest]
    #[case("!/logo.png!", r#"<img src="/logo.png" alt="" />"#)]
    #[case(
        "!/logo.png(Our logo)!",
        r#"<img src="/logo.png" title="Our logo" alt="Our logo" />"#
    )]
    #[case("!>/r.png!", r#"<img src="/r.png" align="right" alt="" />"#)]
    #[case(
        "!(pic)/a.png!:http://example.com",
        r#"<a href="http://example.com"><img src="/a.png" class="pic" alt="" /></a>"#
    )]
    #[case("[!/a.png!]", r#"<img src="/a.png" alt="" />"#)]
    fn html_images(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(images(input), expected);
    }

    #[test]
    fn linked_images_carry_the_link_rel() {
        let textile = Textile::new().unwrap();
        let options = RenderOptions::unrestricted().with_link_rel("nofollow");
        let mut parser = Parser::new(&textile, &options);
        let out = parser.parse_images("!/a.png!:http://example.com");
        let out = parser.ctx.shelves.restore_fragments(&out);
        assert_eq!(
            parser.restore_urls(&out),
            r#"<a href="http://example.com" rel="nofollow"><img src="/a.png" alt="" /></a>"#
        );
    }

    #[test]
    fn exclamations_in_prose_are_not_images() {
        assert_eq!(images("Wow! Great!"), "Wow! Great!");
    }
}
