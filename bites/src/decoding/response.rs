use std::ops::Range;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use crate::models::{CitationMetadata, DecodedResponse};

use super::validator::normalize_all;

fn fenced_json_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?s)```json\r?\n(.*?)\r?\n```").expect("fenced json pattern is valid")
    })
}

/// The first ```` ```json ```` block in a text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FencedBlock<'a> {
    /// Byte range of the whole block, delimiters included.
    pub span: Range<usize>,
    /// The text between the opening and closing delimiter lines.
    pub content: &'a str,
}

/// Locate the first fenced block tagged `json`. Later blocks are ignored.
pub fn find_fenced_json(text: &str) -> Option<FencedBlock<'_>> {
    let captures = fenced_json_pattern().captures(text)?;
    let whole = captures.get(0)?;
    let content = captures.get(1)?;

    Some(FencedBlock {
        span: whole.range(),
        content: content.as_str(),
    })
}

/// Split a raw backend reply into place records and narrative text.
///
/// - No fenced JSON block: no places, narrative is `raw_text` unchanged.
/// - Block holds a JSON array: elements are normalized into places and the
///   block is cut out of the narrative, the text on either side joined by a
///   single line break and the result trimmed.
/// - Block holds anything else: the failure is logged, no places are
///   returned, and the narrative keeps the block so nothing is lost.
///
/// `citations` is attached as given.
pub fn decode(raw_text: &str, citations: Option<CitationMetadata>) -> DecodedResponse {
    let Some(block) = find_fenced_json(raw_text) else {
        return DecodedResponse {
            place_records: Vec::new(),
            narrative_text: raw_text.to_string(),
            citations,
        };
    };

    let entries = match serde_json::from_str::<Value>(block.content) {
        Ok(Value::Array(entries)) => entries,
        Ok(other) => {
            tracing::warn!(
                response_len = raw_text.len(),
                found = if other.is_object() { "object" } else { "scalar" },
                "Embedded places JSON is not an array, keeping raw text"
            );
            return unparsed(raw_text, citations);
        }
        Err(e) => {
            tracing::warn!(
                response_len = raw_text.len(),
                block_preview = %block.content.chars().take(100).collect::<String>(),
                error = %e,
                "Failed to parse embedded places JSON, keeping raw text"
            );
            return unparsed(raw_text, citations);
        }
    };

    let place_records = normalize_all(&entries);
    if place_records.len() < entries.len() {
        tracing::debug!(
            received = entries.len(),
            kept = place_records.len(),
            "Dropped unnamed place entries"
        );
    }

    DecodedResponse {
        place_records,
        narrative_text: strip_block(raw_text, block.span),
        citations,
    }
}

fn unparsed(raw_text: &str, citations: Option<CitationMetadata>) -> DecodedResponse {
    DecodedResponse {
        place_records: Vec::new(),
        narrative_text: raw_text.to_string(),
        citations,
    }
}

fn strip_block(text: &str, span: Range<usize>) -> String {
    let before = text[..span.start].trim_end();
    let after = text[span.end..].trim_start();

    match (before.is_empty(), after.is_empty()) {
        (true, true) => String::new(),
        (true, false) => after.trim_end().to_string(),
        (false, true) => before.trim_start().to_string(),
        (false, false) => format!("{before}\n{after}").trim().to_string(),
    }
}
