//! Ordered (`#`), unordered (`*`) and definition (`;` term, `:` definition)
//! lists, nested by repeating the marker.

use std::sync::LazyLock;

use regex::Regex;

use super::Parser;
use super::breaks::insert_breaks;
use crate::attributes::Element;
use crate::patterns::PATTERNS;

static LIST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"(?ms)^[#*;:]+{}[ .].*\z", PATTERNS.lc)).unwrap());
static ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"(?s)^([#*;:]+)({})[ .](.*)$", PATTERNS.lc)).unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListState {
    Open,
    /// A `:` level directly under a `;` level shares its `<dl>`.
    Merged,
}

fn list_type(marker: &str) -> &'static str {
    match marker.chars().last() {
        Some('#') => "o",
        Some('*') => "u",
        _ => "d",
    }
}

fn item_tag(marker: &str) -> &'static str {
    if marker.contains(';') {
        "dt"
    } else if marker.contains(':') {
        "dd"
    } else {
        "li"
    }
}

impl Parser<'_> {
    /// Converts the list that runs from the first list line to the end of `text`.
    pub fn parse_lists(&mut self, text: &str) -> String {
        match LIST.find(text) {
            Some(list) => format!("{}{}", &text[..list.start()], self.format_list(list.as_str())),
            None => text.to_string(),
        }
    }

    fn format_list(&mut self, text: &str) -> String {
        // Lines that do not start with a marker continue the previous item.
        let mut lines: Vec<String> = Vec::new();
        for line in text.split('\n') {
            match lines.last_mut() {
                Some(previous) if !line.starts_with(['#', '*', ';', ':']) => {
                    previous.push('\n');
                    previous.push_str(line);
                }
                _ => lines.push(line.to_string()),
            }
        }

        let mut open: Vec<(String, ListState)> = Vec::new();
        let mut previous_marker = String::new();
        let mut out = Vec::with_capacity(lines.len());

        for (index, line) in lines.iter().enumerate() {
            let Some(caps) = ITEM.captures(line) else {
                out.push(line.clone());
                continue;
            };
            let marker = &caps[1];
            let content = insert_breaks(caps[3].trim());
            let item = item_tag(marker);
            let show_item = !content.is_empty();
            let next_marker = lines
                .get(index + 1)
                .and_then(|next| ITEM.captures(next))
                .map(|next| next[1].to_string())
                .unwrap_or_default();

            if previous_marker.contains(';') && marker.contains(':') {
                match open.iter_mut().find(|(m, _)| m == marker) {
                    Some(entry) => entry.1 = ListState::Merged,
                    None => open.push((marker.to_string(), ListState::Merged)),
                }
            }

            let atts = self.attributes(&caps[2], Element::Block, true);
            let mut rendered = if open.iter().any(|(m, _)| m == marker) {
                if show_item {
                    format!("\t\t<{item}{atts}>{content}")
                } else {
                    String::new()
                }
            } else {
                open.push((marker.to_string(), ListState::Open));
                let mut start = format!("\t<{}l{atts}>", list_type(marker));
                if show_item {
                    start.push_str(&format!("\n\t\t<{item}>{content}"));
                }
                start
            };

            if next_marker.len() <= marker.len() && show_item {
                rendered.push_str(&format!("</{item}>"));
            }

            while let Some((level, state)) = open.last() {
                if level.len() <= next_marker.len() {
                    break;
                }
                if *state == ListState::Open {
                    rendered.push_str(&format!("\n\t</{}l>", list_type(level)));
                    if level.len() > 1 {
                        rendered.push_str(&format!("</{item}>"));
                    }
                }
                open.pop();
            }

            previous_marker = marker.to_string();
            out.push(rendered);
        }

        out.join("\n")
    }
}
