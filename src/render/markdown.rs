//! Line-oriented Markdown to HTML conversion for generated reports.
//!
//! Supports the subset the report prompt asks for: `#`, `##` and `###`
//! headings, `- ` bullets, `1. ` numbered items, paragraphs, inline links,
//! `**bold**` and `[n]` citation markers. Input is HTML-escaped first, so
//! model output can never inject markup.

use regex::{Captures, Regex};
use std::sync::LazyLock;

static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\(((?:[^()]|\([^()]*\))+)\)").unwrap());
static BOLD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").unwrap());
static CITATION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[(\d+)\]").unwrap());
static ORDERED_ITEM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+\.\s").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Unordered,
    Ordered,
}

impl ListKind {
    fn tag(self) -> &'static str {
        match self {
            ListKind::Unordered => "ul",
            ListKind::Ordered => "ol",
        }
    }
}

/// Escape text for use in HTML content and attribute values.
pub fn escape_html(text: &str) -> String {
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

/// Apply the inline rules to an already escaped line.
///
/// Links go first so their brackets are not mistaken for citation markers.
fn inline(line: &str) -> String {
    let linked = LINK.replace_all(line, |cap: &Captures| {
        let (text, url) = (&cap[1], &cap[2]);
        let safe = ["http://", "https://", "mailto:"]
            .iter()
            .any(|scheme| url.starts_with(scheme));
        if safe {
            format!(
                r#"<a href="{}" target="_blank" rel="noopener noreferrer">{}</a>"#,
                url, text
            )
        } else {
            text.to_string()
        }
    });
    let bolded = BOLD.replace_all(&linked, "<strong>${1}</strong>");
    CITATION
        .replace_all(&bolded, r#"<sup class="cite">[${1}]</sup>"#)
        .into_owned()
}

fn open_list(html: &mut String, list: &mut Option<ListKind>, kind: ListKind) {
    if *list != Some(kind) {
        close_list(html, list);
        html.push_str(&format!("<{}>", kind.tag()));
        *list = Some(kind);
    }
}

fn close_list(html: &mut String, list: &mut Option<ListKind>) {
    if let Some(kind) = list.take() {
        html.push_str(&format!("</{}>", kind.tag()));
    }
}

/// Convert a report to an HTML fragment.
pub fn to_html(markdown: &str) -> String {
    let mut html = String::new();
    let mut list: Option<ListKind> = None;

    for raw in markdown.lines() {
        let line = inline(&escape_html(raw));
        let trimmed = line.trim();

        if let Some(text) = line.strip_prefix("# ") {
            close_list(&mut html, &mut list);
            html.push_str(&format!("<h1>{}</h1>", text));
        } else if let Some(text) = line.strip_prefix("## ") {
            close_list(&mut html, &mut list);
            html.push_str(&format!("<h2>{}</h2>", text));
        } else if let Some(text) = line.strip_prefix("### ") {
            close_list(&mut html, &mut list);
            html.push_str(&format!("<h3>{}</h3>", text));
        } else if let Some(item) = trimmed.strip_prefix("- ") {
            open_list(&mut html, &mut list, ListKind::Unordered);
            html.push_str(&format!("<li>{}</li>", item));
        } else if ORDERED_ITEM.is_match(trimmed) {
            open_list(&mut html, &mut list, ListKind::Ordered);
            html.push_str(&format!("<li>{}</li>", ORDERED_ITEM.replace(trimmed, "")));
        } else {
            close_list(&mut html, &mut list);
            if !trimmed.is_empty() {
                html.push_str(&format!("<p>{}</p>", line));
            }
        }
    }

    close_list(&mut html, &mut list);
    html
}
