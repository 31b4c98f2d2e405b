//! Horizontal rules: `hr.` becomes `<hr />`, `hr(class). Title` becomes
//! `<hr class="class" title="Title" />`. Text output draws a dashed line and
//! drops attributes and titles.

use crate::generator::OutputKind;
use crate::parsing::Parser;
use crate::parsing::blocks::{BlockMatch, BlockParts};
use crate::textile::Textile;

const TEXT_RULE_WIDTH: usize = 60;

pub fn register(textile: &mut Textile) -> bool {
    textile.register_block_handler("hr", rule)
}

fn rule(parser: &mut Parser<'_>, block: &BlockMatch<'_>, parts: BlockParts) -> BlockParts {
    if parser.output_kind() == OutputKind::Text {
        return BlockParts {
            content: parser.shelve("-".repeat(TEXT_RULE_WIDTH)),
            ..BlockParts::default()
        };
    }

    let title = parts.content.trim_end();
    let mut rule = BlockParts {
        outer_open: format!("<hr{}", block.atts),
        outer_close: " />".to_string(),
        ..BlockParts::default()
    };
    if !title.is_empty() {
        let title = parser.conditionally_encode_html(title, true);
        rule.inner_open = " title=\"".to_string();
        rule.inner_close = "\"".to_string();
        rule.content = parser.shelve(title);
    }
    rule
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn with_rules(kind: OutputKind) -> Textile {
        let mut textile = Textile::builder().output(kind).build().unwrap();
        assert!(register(&mut textile));
        textile
    }

    #[test]
    fn html_rule() {
        let textile = with_rules(OutputKind::Html);
        assert_eq!(textile.render_unrestricted("hr."), "<hr />");
        assert_eq!(
            textile.render_unrestricted("hr(fancy). Part \"two\""),
            r#"<hr class="fancy" title="Part &quot;two&quot;" />"#
        );
    }

    #[test]
    fn text_rule() {
        let textile = with_rules(OutputKind::Text);
        assert_eq!(textile.render_unrestricted("hr. ignored"), "-".repeat(60));
    }

    #[test]
    fn lite_mode_ignores_the_textplug() {
        let textile = with_rules(OutputKind::Html);
        let options = crate::options::RenderOptions::unrestricted().with_lite(true);
        assert_eq!(textile.render("hr.", &options), "\t<p>hr.</p>");
    }
}
