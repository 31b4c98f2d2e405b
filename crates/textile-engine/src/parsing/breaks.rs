use std::sync::LazyLock;

use regex::{Captures, Regex};

static PARAGRAPH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<p\b([^>]*)>(.*)</p>").unwrap());

/// Adds `<br />` before each newline that ends a non-empty line, unless the
/// line already ends in a break or the next line starts with whitespace or `|`.
pub fn insert_breaks(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut lines = text.split('\n').peekable();
    while let Some(line) = lines.next() {
        out.push_str(line);
        let Some(next) = lines.peek() else {
            break;
        };
        let continues = next
            .chars()
            .next()
            .is_some_and(|c| !c.is_whitespace() && c != '|');
        if continues && !line.is_empty() && !line.ends_with("<br>") && !line.ends_with("<br />") {
            out.push_str("<br />");
        }
        out.push('\n');
    }
    out
}

/// Break insertion between the first `<p>` and the last `</p>` of a block,
/// then `<br>` normalised to `<br />`.
pub fn tidy_paragraph_breaks(block: &str) -> String {
    let tidied = PARAGRAPH.replace(block, |caps: &Captures| {
        format!("<p{}>{}</p>", &caps[1], insert_breaks(&caps[2]))
    });
    tidied.replace("<br>", "<br />")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn breaks_go_between_text_lines() {
        assert_eq!(insert_breaks("one\ntwo\nthree"), "one<br />\ntwo<br />\nthree");
    }

    #[test]
    fn existing_breaks_are_not_doubled() {
        assert_eq!(insert_breaks("one<br>\ntwo<br />\nthree"), "one<br>\ntwo<br />\nthree");
    }

    #[test]
    fn indented_pipe_and_blank_lines_get_no_break() {
        assert_eq!(insert_breaks("a\n\tb\n|c\n\nd"), "a\n\tb\n|c\n\nd");
    }

    #[test]
    fn paragraph_tidying_leaves_other_blocks_alone() {
        assert_eq!(
            tidy_paragraph_breaks("\t<p class=\"x\">a\nb</p>"),
            "\t<p class=\"x\">a<br />\nb</p>"
        );
        assert_eq!(tidy_paragraph_breaks("<pre>a\nb</pre>"), "<pre>a\nb</pre>");
        assert_eq!(tidy_paragraph_breaks("x<br>y"), "x<br />y");
    }
}
