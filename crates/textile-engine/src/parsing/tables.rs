//! Tables: an optional `table(atts). summary` line, an optional `|=. caption`
//! row, `|:` column groups, `|^.` / `|-.` / `|~.` row groups and `|_. ` header
//! cells.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::Parser;
use super::breaks::insert_breaks;
use crate::attributes::Element;
use crate::patterns::PATTERNS;

static TABLE: LazyLock<Regex> = LazyLock::new(|| {
    let (s, a, c) = (&PATTERNS.s, &PATTERNS.a, &PATTERNS.c);
    Regex::new(&format!(
        r"(?sm)^(?:table(?P<tatts>_?{s}{a}{c})\.(?P<summary>.*?)\n)?^(?P<rows>{a}{c}\.? ?\|.*?\|)\s*?\n\n"
    ))
    .unwrap()
});
static ROW_END: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)\|[^\S\n]*$").unwrap());
static CAPTION: LazyLock<Regex> = LazyLock::new(|| {
    let (s, a, c) = (&PATTERNS.s, &PATTERNS.a, &PATTERNS.c);
    Regex::new(&format!(r"(?s)^\|=({s}{a}{c})\. ([^\n]*)(.*)")).unwrap()
});
static COLGROUP: LazyLock<Regex> = LazyLock::new(|| {
    let (s, a, c) = (&PATTERNS.s, &PATTERNS.a, &PATTERNS.c);
    Regex::new(&format!(r"^\|:({s}{a}{c})\.(.*)")).unwrap()
});
static ROW_GROUP: LazyLock<Regex> = LazyLock::new(|| {
    let (s, a, c) = (&PATTERNS.s, &PATTERNS.a, &PATTERNS.c);
    Regex::new(&format!(
        r"(?s)\A(?:\|(?P<grp>[\-^~])(?P<gatts>{s}{a}{c})\.[^\S\n]*\n)?(?P<row>.*)"
    ))
    .unwrap()
});
static ROW_ATTS: LazyLock<Regex> = LazyLock::new(|| {
    let (a, c) = (&PATTERNS.a, &PATTERNS.c);
    Regex::new(&format!(r"(?s)^({a}{c}\. )(.*)")).unwrap()
});
static CELL_ATTS: LazyLock<Regex> = LazyLock::new(|| {
    let (s, a, c) = (&PATTERNS.s, &PATTERNS.a, &PATTERNS.c);
    Regex::new(&format!(r"(?s)^(_?{s}{a}{c}\. )(.*)")).unwrap()
});

fn row_group(marker: &str) -> &'static str {
    match marker {
        "^" => "head",
        "~" => "foot",
        _ => "body",
    }
}

impl Parser<'_> {
    pub fn parse_tables(&mut self, text: &str) -> String {
        let padded = format!("{text}\n\n");
        let mut out = String::with_capacity(padded.len());
        let mut last = 0;
        for caps in TABLE.captures_iter(&padded) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            out.push_str(&padded[last..whole.start()]);
            out.push_str(&self.format_table(&caps));
            last = whole.end();
        }
        out.push_str(&padded[last..]);
        out.trim_end_matches('\n').to_string()
    }

    fn format_table(&mut self, caps: &Captures<'_>) -> String {
        let tatts = self.attributes(
            caps.name("tatts").map_or("", |m| m.as_str()),
            Element::Table,
            true,
        );
        let summary = caps
            .name("summary")
            .map(|m| m.as_str().trim())
            .filter(|s| !s.is_empty())
            .map(|s| format!(r#" summary="{}""#, self.encode_attribute(s)))
            .unwrap_or_default();

        let mut caption = String::new();
        let mut colgroup = String::new();
        let mut rows = Vec::new();
        let mut last_group: Option<&'static str> = None;

        let pieces = ROW_END
            .split(caps.name("rows").map_or("", |m| m.as_str()))
            .map(str::trim_start)
            .filter(|piece| !piece.is_empty())
            .map(str::to_string)
            .collect::<Vec<_>>();

        for (index, piece) in pieces.into_iter().enumerate() {
            let mut row = piece;

            if index == 0 {
                let found = CAPTION.captures(&row).map(|cap| {
                    let atts = self.attributes(&cap[1], Element::Block, true);
                    let markup = format!("\t<caption{atts}>{}</caption>\n", cap[2].trim());
                    (markup, cap[3].trim_start().to_string())
                });
                if let Some((markup, rest)) = found {
                    caption = markup;
                    if rest.is_empty() {
                        continue;
                    }
                    row = rest;
                }
            }

            let found = COLGROUP
                .captures(&row)
                .map(|group| self.format_colgroup(&group[1], &group[2]));
            if let Some(markup) = found {
                colgroup = markup;
                match row.find('\n') {
                    Some(newline) => row = row[newline..].trim_start().to_string(),
                    None => continue,
                }
            }

            let Some(grouped) = ROW_GROUP.captures(&row) else {
                continue;
            };
            let mut group_markup = String::new();
            if let Some(marker) = grouped.name("grp") {
                let group = row_group(marker.as_str());
                if let Some(previous) = last_group {
                    group_markup.push_str(&format!("\t</t{previous}>\n"));
                }
                let gatts = self.attributes(
                    grouped.name("gatts").map_or("", |m| m.as_str()),
                    Element::Row,
                    true,
                );
                group_markup.push_str(&format!("\t<t{group}{gatts}>\n"));
                last_group = Some(group);
            }
            let body = grouped.name("row").map_or("", |m| m.as_str());
            let (ratts, body) = match ROW_ATTS.captures(body) {
                Some(attributed) => (
                    self.attributes(&attributed[1], Element::Row, true),
                    attributed[2].to_string(),
                ),
                None => (String::new(), body.to_string()),
            };

            let cells = body
                .split('|')
                .skip(1)
                .map(|cell| self.format_cell(cell))
                .collect::<Vec<_>>();
            let cell_break = if cells.is_empty() { "" } else { "\n" };
            rows.push(format!(
                "{group_markup}\t\t<tr{ratts}>\n{}{cell_break}\t\t</tr>",
                cells.join("\n")
            ));
        }

        let close_group = last_group
            .map(|group| format!("\t</t{group}>\n"))
            .unwrap_or_default();
        format!(
            "\t<table{tatts}{summary}>\n{caption}{colgroup}{}\n{close_group}\t</table>\n\n",
            rows.join("\n")
        )
    }

    fn format_colgroup(&self, group_atts: &str, columns: &str) -> String {
        let columns = columns.replace('.', "");
        let mut columns = columns.split('|');
        let first = columns.next().unwrap_or_default().trim();
        let mut out = format!(
            "\t<colgroup{}>\n",
            self.attributes(&format!("{group_atts} {first}"), Element::Col, true)
        );
        for column in columns.map(str::trim).filter(|c| !c.is_empty()) {
            out.push_str(&format!(
                "\t<col{} />\n",
                self.attributes(column, Element::Col, true)
            ));
        }
        out.push_str("\t</colgroup>\n");
        out
    }

    fn format_cell(&mut self, cell: &str) -> String {
        let tag = if cell.starts_with('_') { "th" } else { "td" };
        let (atts, content) = match CELL_ATTS.captures(cell) {
            Some(caps) => (
                self.attributes(&caps[1], Element::Cell, true),
                caps[2].to_string(),
            ),
            None => (String::new(), cell.to_string()),
        };
        let content = self.graf(&content);
        let key = self.shelve(insert_breaks(&content));
        format!("\t\t\t<{tag}{atts}>{key}</{tag}>")
    }
}
