//! First-job digest rendering, plain text or a standalone HTML page.

use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fmt::Write;

const HEADER: &str = "First jobs of the day";
const FOOTER: &str = "Reply to dispatch with any changes before 6pm.";

/// `Monday 05/05/2025`
pub fn day_heading(date: NaiveDate) -> String {
    date.format("%A %m/%d/%Y").to_string()
}

pub fn render_plain(summary: &BTreeMap<NaiveDate, Vec<String>>) -> String {
    let mut out = String::new();
    out.push_str(HEADER);
    out.push_str("\n\n");
    for (date, lines) in summary {
        out.push_str(&day_heading(*date));
        out.push('\n');
        for line in lines {
            out.push_str(line);
            out.push('\n');
        }
        out.push('\n');
    }
    out.push_str(FOOTER);
    out.push('\n');
    out
}

pub fn render_html(summary: &BTreeMap<NaiveDate, Vec<String>>) -> String {
    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>");
    out.push_str(HEADER);
    out.push_str("</title></head>\n<body>\n");
    let _ = writeln!(out, "<h1>{}</h1>", escape_html(HEADER));
    for (date, lines) in summary {
        let _ = writeln!(out, "<h2>{}</h2>\n<ul>", escape_html(&day_heading(*date)));
        for line in lines {
            let _ = writeln!(out, "  <li>{}</li>", escape_html(line));
        }
        out.push_str("</ul>\n");
    }
    let _ = writeln!(out, "<p>{}</p>", escape_html(FOOTER));
    out.push_str("</body>\n</html>\n");
    out
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
