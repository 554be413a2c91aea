//! Lightweight markup renderer for assistant narratives.
//!
//! Understands only what the assistant is asked to produce: `##`/`###`
//! headings, `*`/`-` bullets, `1.` numbered items, blank-line spacers and
//! `**bold**` spans. Each input line maps to exactly one [`Block`]. Parsing is
//! a single pass over the raw text, so emphasised content is never parsed
//! again and cannot be double-emphasised.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

/// An inline run of text within a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum Span {
    Text(String),
    Strong(String),
}

/// One display block; produced per input line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Block {
    Heading { level: u8, spans: Vec<Span> },
    ListItem { ordered: bool, spans: Vec<Span> },
    Paragraph { spans: Vec<Span> },
    Spacer,
}

fn bold_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\*\*.*?\*\*").expect("bold pattern is valid"))
}

fn bullet_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[*\-]\s+").expect("bullet pattern is valid"))
}

fn ordered_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d+\.\s").expect("ordered pattern is valid"))
}

/// Render `text` into display blocks. Empty input yields no blocks.
pub fn render(text: &str) -> Vec<Block> {
    if text.is_empty() {
        return Vec::new();
    }

    text.split('\n')
        .map(|line| render_line(line.strip_suffix('\r').unwrap_or(line)))
        .collect()
}

fn render_line(line: &str) -> Block {
    if let Some(rest) = line.strip_prefix("### ") {
        return Block::Heading {
            level: 3,
            spans: parse_inline(rest),
        };
    }

    if let Some(rest) = line.strip_prefix("## ") {
        return Block::Heading {
            level: 2,
            spans: parse_inline(rest),
        };
    }

    let trimmed = line.trim();

    if trimmed.starts_with("* ") || trimmed.starts_with("- ") {
        let content = bullet_pattern().replace(trimmed, "");
        return Block::ListItem {
            ordered: false,
            spans: parse_inline(&content),
        };
    }

    if ordered_pattern().is_match(trimmed) {
        let content = ordered_pattern().replace(trimmed, "");
        return Block::ListItem {
            ordered: true,
            spans: parse_inline(&content),
        };
    }

    if trimmed.is_empty() {
        return Block::Spacer;
    }

    Block::Paragraph {
        spans: parse_inline(line),
    }
}

/// Split a line into plain and bold spans, preserving order.
///
/// Delimiters are matched non-greedily, so `****` becomes an empty bold span.
pub fn parse_inline(text: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut cursor = 0;

    for found in bold_pattern().find_iter(text) {
        if found.start() > cursor {
            spans.push(Span::Text(text[cursor..found.start()].to_string()));
        }
        let inner = &found.as_str()[2..found.as_str().len() - 2];
        spans.push(Span::Strong(inner.to_string()));
        cursor = found.end();
    }

    if cursor < text.len() {
        spans.push(Span::Text(text[cursor..].to_string()));
    }

    spans
}

impl Block {
    pub fn spans(&self) -> &[Span] {
        match self {
            Block::Heading { spans, .. }
            | Block::ListItem { spans, .. }
            | Block::Paragraph { spans } => spans,
            Block::Spacer => &[],
        }
    }

    /// Concatenated span text with emphasis removed.
    pub fn plain_text(&self) -> String {
        self.spans()
            .iter()
            .map(|span| match span {
                Span::Text(text) | Span::Strong(text) => text.as_str(),
            })
            .collect()
    }
}

/// Escape text for inclusion in HTML element content or attribute values.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn spans_to_html(spans: &[Span]) -> String {
    spans
        .iter()
        .map(|span| match span {
            Span::Text(text) => escape_html(text),
            Span::Strong(text) => format!("<strong>{}</strong>", escape_html(text)),
        })
        .collect()
}

/// Serialise blocks to HTML. All text content is escaped.
pub fn to_html(blocks: &[Block]) -> String {
    blocks
        .iter()
        .map(|block| match block {
            Block::Heading { level, spans } => {
                format!("<h{level}>{}</h{level}>", spans_to_html(spans))
            }
            Block::ListItem { ordered, spans } => {
                let class = if *ordered { "list-decimal" } else { "list-disc" };
                format!("<li class=\"{class}\">{}</li>", spans_to_html(spans))
            }
            Block::Paragraph { spans } => format!("<p>{}</p>", spans_to_html(spans)),
            Block::Spacer => "<div class=\"spacer\"></div>".to_string(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn text(s: &str) -> Span {
        Span::Text(s.to_string())
    }

    fn strong(s: &str) -> Span {
        Span::Strong(s.to_string())
    }

    #[test]
    fn bold_then_plain_paragraph() {
        let blocks = render("**Bold** and *not bold*");
        assert_eq!(
            blocks,
            vec![Block::Paragraph {
                spans: vec![strong("Bold"), text(" and *not bold*")],
            }]
        );
    }

    #[test]
    fn empty_input_yields_no_blocks() {
        assert!(render("").is_empty());
    }

    #[test]
    fn classifies_each_line_in_priority_order() {
        let blocks = render("## Top picks\n### **Gangnam**\n* Jungsik\n- Mingles\n2. Onjium\n   \nEnjoy!");
        assert_eq!(
            blocks,
            vec![
                Block::Heading {
                    level: 2,
                    spans: vec![text("Top picks")],
                },
                Block::Heading {
                    level: 3,
                    spans: vec![strong("Gangnam")],
                },
                Block::ListItem {
                    ordered: false,
                    spans: vec![text("Jungsik")],
                },
                Block::ListItem {
                    ordered: false,
                    spans: vec![text("Mingles")],
                },
                Block::ListItem {
                    ordered: true,
                    spans: vec![text("Onjium")],
                },
                Block::Spacer,
                Block::Paragraph {
                    spans: vec![text("Enjoy!")],
                },
            ]
        );
    }

    #[test]
    fn indented_bullets_are_stripped() {
        let blocks = render("   * **Tosokchon** - ginseng chicken");
        assert_eq!(
            blocks,
            vec![Block::ListItem {
                ordered: false,
                spans: vec![strong("Tosokchon"), text(" - ginseng chicken")],
            }]
        );
    }

    #[test]
    fn heading_requires_prefix_at_line_start() {
        let blocks = render("  ## not a heading");
        assert!(matches!(blocks[0], Block::Paragraph { .. }));
    }

    #[test]
    fn one_block_per_line_including_trailing_newline() {
        let blocks = render("a\n\nb\n");
        assert_eq!(blocks.len(), 4);
        assert_eq!(blocks[1], Block::Spacer);
        assert_eq!(blocks[3], Block::Spacer);
    }

    #[test]
    fn adjacent_delimiters_produce_empty_strong_span() {
        let spans = parse_inline("a****b");
        assert_eq!(spans, vec![text("a"), strong(""), text("b")]);
    }

    #[test]
    fn inner_asterisks_are_not_reparsed() {
        let spans = parse_inline("**a *b* c** and **d**");
        assert_eq!(
            spans,
            vec![strong("a *b* c"), text(" and "), strong("d")]
        );
        // Rendering the plain text again yields no emphasis at all.
        let again = render(&render("**a *b* c**")[0].plain_text());
        assert_eq!(
            again,
            vec![Block::Paragraph {
                spans: vec![text("a *b* c")],
            }]
        );
    }

    #[test]
    fn unterminated_bold_stays_plain() {
        assert_eq!(parse_inline("**open"), vec![text("**open")]);
    }

    #[test]
    fn carriage_returns_are_ignored() {
        let blocks = render("## Title\r\nBody\r\n");
        assert_eq!(
            blocks[0],
            Block::Heading {
                level: 2,
                spans: vec![text("Title")],
            }
        );
        assert_eq!(blocks[1].plain_text(), "Body");
    }

    #[test]
    fn html_output_escapes_text() {
        let html = to_html(&render("**<b>** & \"q\"\n1. x<y"));
        assert_eq!(
            html,
            "<p><strong>&lt;b&gt;</strong> &amp; &quot;q&quot;</p>\n<li class=\"list-decimal\">x&lt;y</li>"
        );
    }
}
