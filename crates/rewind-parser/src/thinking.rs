use std::sync::LazyLock;

use regex::Regex;

static THINKING_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<thinking>(.*?)</thinking>").unwrap());

/// One segment of a text block after inline `<thinking>` extraction.
#[derive(Debug, PartialEq)]
pub(crate) enum TextSegment {
    Thinking(String),
    Text(String),
}

/// Split inline `<thinking>...</thinking>` tags out of a text block.
///
/// Each tag becomes a distinct thinking segment; the surrounding prose is
/// kept as text segments in encounter order. Empty prose between tags is
/// dropped.
pub(crate) fn split_inline_thinking(text: &str) -> Vec<TextSegment> {
    let mut segments = Vec::new();
    let mut cursor = 0;

    for captures in THINKING_TAG.captures_iter(text) {
        let whole = captures.get(0).unwrap();
        let prose = text[cursor..whole.start()].trim();
        if !prose.is_empty() {
            segments.push(TextSegment::Text(prose.to_string()));
        }
        let inner = captures.get(1).unwrap().as_str().trim();
        if !inner.is_empty() {
            segments.push(TextSegment::Thinking(inner.to_string()));
        }
        cursor = whole.end();
    }

    let rest = text[cursor..].trim();
    if !rest.is_empty() {
        segments.push(TextSegment::Text(rest.to_string()));
    }

    segments
}
